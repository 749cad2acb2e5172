//! Ledger operations on `/api/transactions/`.
//!
//! Transactions are append-only from the client's perspective: there are
//! deliberately no update or delete operations here, even though the
//! backend technically exposes them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
    client::ApiClient,
    error::ApiResult,
    models::{Direction, Transaction},
};

/// A card's transaction history.
#[derive(Debug, Clone, Deserialize)]
pub struct CardTransactions {
    /// Card the history belongs to.
    pub card_uuid: Uuid,
    /// Name printed on that card.
    #[serde(default)]
    pub card_name: String,
    /// Total count, as reported by the backend.
    pub total_transactions: usize,
    /// The entries.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// Payload for a manual ledger entry.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTransaction {
    /// Card whose account the entry applies to.
    pub card_uuid: Uuid,
    /// Credit or debit.
    #[serde(rename = "type")]
    pub direction: Direction,
    /// Absolute amount.
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Operations on `/api/transactions/`.
pub struct TransactionsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> TransactionsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// History for one card.
    pub async fn by_card(&self, card_uuid: Uuid) -> ApiResult<CardTransactions> {
        self.client
            .post("/api/transactions/by_card/", &json!({ "card_uuid": card_uuid }))
            .await
    }

    /// List all transactions.
    pub async fn list(&self) -> ApiResult<Vec<Transaction>> {
        self.client.get_list("/api/transactions/").await
    }

    /// Fetch one transaction.
    pub async fn get(&self, uuid: Uuid) -> ApiResult<Transaction> {
        self.client.get(&format!("/api/transactions/{uuid}/")).await
    }

    /// Record a manual ledger entry.
    pub async fn create(&self, payload: &CreateTransaction) -> ApiResult<Transaction> {
        self.client.post("/api/transactions/", payload).await
    }
}
