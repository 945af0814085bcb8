pub mod health;
pub mod submit;
