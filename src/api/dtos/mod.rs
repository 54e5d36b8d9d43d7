pub mod match_dto;
pub mod request_dto;

pub use match_dto::*;
pub use request_dto::*;
