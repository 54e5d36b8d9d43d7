pub mod identity;
pub mod request_logging;

pub use identity::Requester;
