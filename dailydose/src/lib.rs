// Library interface for dailydose modules
// This allows tests and the binary to import modules

pub mod campaign;
pub mod error;
pub mod ingestion;
pub mod llm;
pub mod newsletter;
pub mod scheduler;
pub mod server;
pub mod template;
pub mod trimming;
pub mod workflow;

pub use error::{DispatchError, Result};
