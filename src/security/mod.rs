mod cors;
mod headers;

pub use cors::{cors_middleware, REQUESTER_ID_HEADER, REQUESTER_NAME_HEADER};
pub use headers::security_headers;
