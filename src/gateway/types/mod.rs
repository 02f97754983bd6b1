//! Gateway types module
//!
//! ## Submodules
//! - [`response`]: Response envelope, error kinds, request context

pub mod response;

// Re-export commonly used types at module root
pub use response::{
    API_VERSION, ApiError, ApiResponse, RequestContext, ResponseMeta, error_kinds, ok,
};
