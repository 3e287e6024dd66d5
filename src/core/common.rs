pub mod api_error;
pub mod http_client_factory;
pub mod permission;
pub mod transport;

pub use api_error::{ApiError, ApiErrorKind};
pub use permission::Permissions;
pub use transport::{ApiRequest, FBX_APP_AUTH_HEADER};
