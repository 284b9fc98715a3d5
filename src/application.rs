pub mod command;
pub mod error;
pub mod service;

pub use command::{AdmissionRequest, QuoteRequest, Requester};
pub use error::ApplicationError;
