//! Trading API client

use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::types::{BalanceSnapshot, Instrument, TradeSide};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Remote wallet/trading API
#[async_trait::async_trait]
pub trait TradeApi: Send + Sync {
    /// Spendable native and token balances for `address`
    async fn fetch_trade_amount(&self, address: &str) -> Result<TradeAmount>;

    /// Fiat price of one unit of native currency
    async fn fetch_native_price(&self) -> Result<Decimal>;

    /// Token metadata and fiat price
    async fn fetch_token_info(&self, address: &str) -> Result<TokenInfo>;

    /// Place an order
    async fn create_trade(&self, order: &TradeOrder) -> Result<TradeResponse>;
}

/// HTTP implementation of [`TradeApi`]
pub struct TradingApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl TradingApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Bearer token of the linked session
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.get(format!("{}{}", self.base_url, path)))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.post(format!("{}{}", self.base_url, path)))
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        if response.status().is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::Status { status, body })
        }
    }
}

#[async_trait::async_trait]
impl TradeApi for TradingApiClient {
    async fn fetch_trade_amount(&self, address: &str) -> Result<TradeAmount> {
        debug!("Fetching trade amount for {}", address);
        let response = self
            .get("/trade/amount")
            .query(&[("address", address)])
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn fetch_native_price(&self) -> Result<Decimal> {
        let response = self.get("/token/sol-price").send().await?;
        let price: NativePriceResponse = Self::read_json(response).await?;
        Ok(price.price_usd)
    }

    async fn fetch_token_info(&self, address: &str) -> Result<TokenInfo> {
        let response = self
            .get("/token/info")
            .query(&[("address", address)])
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn create_trade(&self, order: &TradeOrder) -> Result<TradeResponse> {
        let req = CreateTradingRequest::from(order);
        let response = self.post("/trade/orders").json(&req).send().await?;
        let resp: TradeResponse = Self::read_json(response).await?;
        info!(
            "Order {} {} {} -> success={}",
            req.order_trade_type, req.order_qlty, req.order_token_name, resp.success
        );
        Ok(resp)
    }
}

/// Assembles a [`BalanceSnapshot`] from the three balance/price queries
pub struct BalanceSource;

impl BalanceSource {
    pub async fn load(
        api: &dyn TradeApi,
        address: &str,
    ) -> Result<(BalanceSnapshot, Instrument)> {
        let (amount, native_price, token) = tokio::try_join!(
            api.fetch_trade_amount(address),
            api.fetch_native_price(),
            api.fetch_token_info(address),
        )?;

        let snapshot = BalanceSnapshot {
            native_balance: amount.sol_balance,
            token_balance: amount.token_balance,
            token_decimals: token.decimals,
            native_to_fiat_rate: native_price,
            token_price: token.price,
        };
        let instrument = Instrument {
            symbol: token.symbol,
            address: token.address,
        };
        Ok((snapshot, instrument))
    }
}

// Request/Response types

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Market,
}

/// Order handed to [`TradeApi::create_trade`]
#[derive(Debug, Clone, PartialEq)]
pub struct TradeOrder {
    pub side: TradeSide,
    pub order_kind: OrderKind,
    pub instrument: Instrument,
    /// Quantity × unit fiat price
    pub order_value: Decimal,
    pub quantity: Decimal,
}

impl TradeOrder {
    /// Market order for `quantity`; `None` when its value overflows
    pub fn market(
        side: TradeSide,
        instrument: Instrument,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Option<Self> {
        Some(Self {
            side,
            order_kind: OrderKind::Market,
            instrument,
            order_value: quantity.checked_mul(unit_price)?,
            quantity,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct CreateTradingRequest {
    order_trade_type: TradeSide,
    order_type: OrderKind,
    order_token_name: String,
    order_token_address: String,
    #[serde(with = "rust_decimal::serde::float")]
    order_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    order_qlty: Decimal,
}

impl From<&TradeOrder> for CreateTradingRequest {
    fn from(order: &TradeOrder) -> Self {
        Self {
            order_trade_type: order.side,
            order_type: order.order_kind,
            order_token_name: order.instrument.symbol.clone(),
            order_token_address: order.instrument.address.clone(),
            order_price: order.order_value,
            order_qlty: order.quantity,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TradeResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TradeAmount {
    pub sol_balance: Decimal,
    pub token_balance: Decimal,
}

#[derive(Debug, Deserialize)]
struct NativePriceResponse {
    #[serde(rename = "priceUSD")]
    price_usd: Decimal,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub address: String,
    pub decimals: u8,
    pub price: Decimal,
}
