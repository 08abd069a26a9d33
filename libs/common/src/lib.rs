pub mod adapters;
pub mod correlation;
pub mod error;
pub mod projection;
pub mod retry;
pub mod utils;

pub use error::{AppError, Result};
