//! CLOB order executor with a dry-run mode
//!
//! In dry-run mode every buy fills synthetically at the requested price
//! and nothing leaves the process. The live path posts a market order to
//! the CLOB REST endpoint. All fills, real or synthetic, are kept for the
//! end-of-session summary.

use super::types::{BuyOrder, ExecutionError, OrderFill};
use super::OrderExecutor;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Configuration for the CLOB executor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// CLOB REST base URL
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// When true, orders fill synthetically and are never sent out
    pub dry_run: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            base_url: crate::market::CLOB_API_URL.to_string(),
            timeout: Duration::from_secs(10),
            dry_run: true,
        }
    }
}

/// Order executor backed by the Polymarket CLOB
pub struct ClobExecutor {
    config: ExecutorConfig,
    client: reqwest::Client,
    fills: Arc<RwLock<Vec<OrderFill>>>,
}

impl ClobExecutor {
    /// Create an executor with the given configuration
    pub fn new(config: ExecutorConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            config,
            client,
            fills: Arc::new(RwLock::new(vec![])),
        })
    }

    /// Create a dry-run executor with default endpoints
    pub fn dry_run() -> Self {
        Self {
            config: ExecutorConfig::default(),
            client: reqwest::Client::new(),
            fills: Arc::new(RwLock::new(vec![])),
        }
    }

    fn synthetic_fill(&self, order: &BuyOrder) -> OrderFill {
        let size = if order.price.is_zero() {
            Decimal::ZERO
        } else {
            (order.amount_usd / order.price).round_dp(2)
        };
        OrderFill {
            order_id: format!("dry-run-{}", Uuid::new_v4()),
            token_id: order.token_id.clone(),
            outcome_name: order.outcome_name.clone(),
            price: order.price,
            size,
            amount_usd: order.amount_usd,
            timestamp: Utc::now(),
        }
    }

    async fn submit_live(&self, order: &BuyOrder) -> Result<OrderFill, ExecutionError> {
        let url = format!("{}/order", self.config.base_url);
        let request = OrderRequest {
            token_id: order.token_id.clone(),
            side: "BUY".to_string(),
            amount: order.amount_usd,
            order_type: "FOK".to_string(),
        };

        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ExecutionError::Rejected(format!("{status}: {body}")));
        }

        let parsed: OrderResponse = response
            .json()
            .await
            .map_err(|e| ExecutionError::InvalidResponse(e.to_string()))?;

        if !parsed.success {
            return Err(ExecutionError::Rejected(
                parsed.error_msg.unwrap_or_else(|| "unknown".to_string()),
            ));
        }
        let order_id = parsed
            .order_id
            .ok_or_else(|| ExecutionError::InvalidResponse("missing orderID".to_string()))?;

        let size = parsed
            .making_amount
            .unwrap_or_else(|| (order.amount_usd / order.price).round_dp(2));
        Ok(OrderFill {
            order_id,
            token_id: order.token_id.clone(),
            outcome_name: order.outcome_name.clone(),
            price: order.price,
            size,
            amount_usd: order.amount_usd,
            timestamp: Utc::now(),
        })
    }
}

#[async_trait]
impl OrderExecutor for ClobExecutor {
    async fn buy_market(&self, order: BuyOrder) -> Result<OrderFill, ExecutionError> {
        let fill = if self.config.dry_run {
            let fill = self.synthetic_fill(&order);
            tracing::info!(
                outcome = %order.outcome_name,
                price = %order.price,
                amount_usd = %order.amount_usd,
                shares = %fill.size,
                "DRY RUN buy filled"
            );
            fill
        } else {
            let fill = self.submit_live(&order).await?;
            tracing::info!(
                order_id = %fill.order_id,
                outcome = %order.outcome_name,
                price = %fill.price,
                amount_usd = %fill.amount_usd,
                "Live buy filled"
            );
            fill
        };

        metrics::counter!("polymovement_orders_filled_total").increment(1);
        self.fills.write().await.push(fill.clone());
        Ok(fill)
    }

    async fn fills(&self) -> Vec<OrderFill> {
        self.fills.read().await.clone()
    }
}

/// Outbound order payload
#[derive(Debug, Serialize)]
struct OrderRequest {
    #[serde(rename = "tokenID")]
    token_id: String,
    side: String,
    amount: Decimal,
    #[serde(rename = "orderType")]
    order_type: String,
}

/// CLOB order response
#[derive(Debug, Deserialize)]
struct OrderResponse {
    #[serde(default)]
    success: bool,
    #[serde(rename = "errorMsg")]
    error_msg: Option<String>,
    #[serde(rename = "orderID")]
    order_id: Option<String>,
    #[serde(rename = "makingAmount")]
    making_amount: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_dry_run_fill() {
        let executor = ClobExecutor::dry_run();
        let order = BuyOrder {
            token_id: "yes-token".to_string(),
            outcome_name: "2.4M-2.6M".to_string(),
            price: dec!(0.25),
            amount_usd: dec!(50),
        };

        let fill = executor.buy_market(order).await.unwrap();
        assert!(fill.order_id.starts_with("dry-run-"));
        assert_eq!(fill.price, dec!(0.25));
        assert_eq!(fill.size, dec!(200)); // 50 / 0.25
        assert_eq!(fill.amount_usd, dec!(50));
    }

    #[tokio::test]
    async fn test_dry_run_records_fills() {
        let executor = ClobExecutor::dry_run();
        for i in 0..3 {
            let order = BuyOrder {
                token_id: format!("tok-{i}"),
                outcome_name: format!("bracket-{i}"),
                price: dec!(0.50),
                amount_usd: dec!(10),
            };
            executor.buy_market(order).await.unwrap();
        }
        assert_eq!(executor.fills().await.len(), 3);
    }

    #[tokio::test]
    async fn test_dry_run_zero_price() {
        let executor = ClobExecutor::dry_run();
        let order = BuyOrder {
            token_id: "tok".to_string(),
            outcome_name: "bracket".to_string(),
            price: dec!(0),
            amount_usd: dec!(10),
        };
        let fill = executor.buy_market(order).await.unwrap();
        assert_eq!(fill.size, dec!(0));
    }

    #[test]
    fn test_order_request_serialization() {
        let req = OrderRequest {
            token_id: "tok".to_string(),
            side: "BUY".to_string(),
            amount: dec!(25),
            order_type: "FOK".to_string(),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"tokenID\":\"tok\""));
        assert!(json.contains("\"orderType\":\"FOK\""));
    }
}
