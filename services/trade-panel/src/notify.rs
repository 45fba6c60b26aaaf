//! User-facing notifications and message localization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

/// Toast-style message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            severity,
            created_at: Utc::now(),
        }
    }
}

/// Sink for user-facing notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Error => tracing::error!(id = %notification.id, "{}", notification.message),
            Severity::Warning => tracing::warn!(id = %notification.id, "{}", notification.message),
            Severity::Success | Severity::Info => {
                tracing::info!(id = %notification.id, "{}", notification.message)
            }
        }
    }
}

/// Keeps every notification; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct CollectingNotifier {
    inner: Arc<Mutex<Vec<Notification>>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.lock().map(|n| n.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<Notification> {
        self.inner.lock().ok().and_then(|n| n.last().cloned())
    }

    pub fn clear(&self) {
        if let Ok(mut n) = self.inner.lock() {
            n.clear();
        }
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut n) = self.inner.lock() {
            n.push(notification);
        }
    }
}

/// Translation lookup keyed by message identifiers
pub trait Localizer: Send + Sync {
    /// Translated text, or the key itself when unknown
    fn t(&self, key: &str) -> String;
}

/// Message keys used by the panel
pub mod keys {
    pub const INSUFFICIENT_BALANCE: &str = "trading.panel.insufficient_balance";
    pub const INVALID_AMOUNT: &str = "trading.panel.invalid_amount";
    pub const SUCCESS: &str = "trading.panel.success";
    pub const ERROR: &str = "trading.panel.error";
    pub const NOT_CONNECTED: &str = "trading.panel.not_connected";
    pub const BUY: &str = "trading.panel.buy";
    pub const SELL: &str = "trading.panel.sell";
    pub const BALANCE: &str = "trading.panel.balance";
}

const ENGLISH: &[(&str, &str)] = &[
    (keys::INSUFFICIENT_BALANCE, "Insufficient balance"),
    (keys::INVALID_AMOUNT, "Please enter a valid amount"),
    (keys::SUCCESS, "Order placed successfully"),
    (keys::ERROR, "Order failed, please try again"),
    (keys::NOT_CONNECTED, "Connect your wallet to trade"),
    (keys::BUY, "Buy"),
    (keys::SELL, "Sell"),
    (keys::BALANCE, "Balance"),
];

/// In-memory dictionary for one locale
#[derive(Debug, Clone)]
pub struct Dictionary {
    locale: String,
    entries: HashMap<String, String>,
}

impl Dictionary {
    pub fn english() -> Self {
        Self {
            locale: "en".to_string(),
            entries: ENGLISH
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Load a flat `{ "key": "text" }` JSON table over the English defaults
    pub fn from_json(locale: &str, json: &str) -> anyhow::Result<Self> {
        let overrides: HashMap<String, String> = serde_json::from_str(json)?;
        let mut dict = Self::english();
        dict.locale = locale.to_string();
        dict.entries.extend(overrides);
        Ok(dict)
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::english()
    }
}

impl Localizer for Dictionary {
    fn t(&self, key: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
