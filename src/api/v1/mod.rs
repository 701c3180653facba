mod error;
mod handler;
mod router;

pub use error::{ApiError, ApiErrorCode, ApiFailure, recover_error};
pub use handler::ApiResponse;
pub use router::{ACTING_USER_HEADER, routes};
