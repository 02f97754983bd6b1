pub mod health;
pub mod transfer;

pub use health::{HealthResponse, health_check};
pub use transfer::{create_transfer, get_history};
