//! Core quote types, stage errors and the deadline primitive

pub mod config;
pub mod deadline;
pub mod error;
pub mod log;
pub mod quote;
pub mod store;

// Re-export main types for cleaner imports
pub use error::{ClientError, PersistError, UpstreamError};
pub use quote::{Quote, QuoteProvider};
pub use store::QuoteStore;
