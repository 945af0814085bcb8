//! Portal API Library
//!
//! This crate provides the HTTP handlers for the submission intake, its
//! processing pipeline and the application setup.

mod api_doc;
pub mod constants;
mod handlers;
pub mod services;
pub mod setup;
mod utils;

pub mod error;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use services::intake::{IntakeContext, IntakeService};
