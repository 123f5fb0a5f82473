//! Request/response plumbing shared by all handlers

pub mod error;
pub mod json;
pub mod response;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::{optional_body, Json};
pub use response::{ApiResponse, Pagination};
