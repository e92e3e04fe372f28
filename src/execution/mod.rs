//! Order execution module
//!
//! Handles buy submission (dry-run and live modes)

mod clob;
mod types;

pub use clob::{ClobExecutor, ExecutorConfig};
pub use types::{BuyOrder, ExecutionError, OrderFill};

use async_trait::async_trait;

/// Trait for order executor implementations
#[async_trait]
pub trait OrderExecutor: Send + Sync {
    /// Buy a token for a dollar amount at the current market price
    async fn buy_market(&self, order: BuyOrder) -> Result<OrderFill, ExecutionError>;
    /// All fills recorded this session
    async fn fills(&self) -> Vec<OrderFill>;
}
