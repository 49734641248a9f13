pub mod error;
pub mod models;

pub use error::{OstrichError, Result};
pub use models::{CompletedProcess, Redirect};
