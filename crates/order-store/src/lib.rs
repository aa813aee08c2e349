pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use common::OrderId;
pub use error::{Result, StoreError};
pub use memory::InMemoryOrderRepository;
pub use postgres::PostgresOrderRepository;
pub use repository::{OrderRepository, StatusTransition};
