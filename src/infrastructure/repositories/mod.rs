mod memory_repository;
mod request_repository;
mod traits;

pub use memory_repository::InMemoryRequestRepository;
pub use request_repository::PgRequestRepository;
pub use traits::RequestRepository;
