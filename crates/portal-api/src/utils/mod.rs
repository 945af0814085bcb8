pub mod ip_extraction;

pub use ip_extraction::resolve_client_address;
