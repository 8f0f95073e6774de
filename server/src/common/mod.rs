//! Common Utilities
//!
//! Shared error handling, HTTP client construction and path resolution.

pub mod error;
pub mod http;
pub mod paths;
pub mod result;

pub use error::{AppError, ErrorCode};
pub use http::{browser_http_client, create_http_client};
pub use result::AppResult;
