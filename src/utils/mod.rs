// Utility functions
pub mod error;
pub mod retry;

pub use error::*;
