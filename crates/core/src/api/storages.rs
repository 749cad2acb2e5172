//! Cold-storage operations on `/api/storages/`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
    client::ApiClient,
    error::ApiResult,
    models::{StorageEntry, Transaction},
};

/// Check-in payload. The rate is per hour; daily display figures are
/// derived client-side from the same stored value.
#[derive(Debug, Clone, Serialize)]
pub struct CreateStorage {
    /// Account the entry bills against.
    pub account_uuid: Uuid,
    /// What is being stored.
    pub commodity: String,
    /// Weight in kilograms.
    #[serde(with = "rust_decimal::serde::str")]
    pub weight: Decimal,
    /// Check-in timestamp.
    pub check_in: DateTime<Utc>,
    /// Expected check-out.
    pub estimated_check_out: DateTime<Utc>,
    /// Billing rate per hour.
    #[serde(with = "rust_decimal::serde::str")]
    pub hourly_rate: Decimal,
}

/// Response to a checkout. `total_cost` and `new_balance` are computed
/// server-side from server time and rate application; they supersede any
/// client-side estimate.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutResponse {
    /// Confirmation message.
    #[serde(default)]
    pub message: String,
    /// The entry as closed by the backend.
    pub storage: StorageEntry,
    /// Billed duration in hours.
    pub duration_hours: f64,
    /// Authoritative charge for the stay.
    #[serde(with = "rust_decimal::serde::str")]
    pub total_cost: Decimal,
    /// Authoritative account balance after the charge.
    #[serde(with = "rust_decimal::serde::str")]
    pub new_balance: Decimal,
    /// The debit the backend recorded.
    pub transaction: Transaction,
}

/// Active entries with the backend's own count.
#[derive(Debug, Clone, Deserialize)]
pub struct ActiveStorages {
    /// Number of currently active entries.
    pub total_active: usize,
    /// The entries themselves.
    #[serde(default)]
    pub storages: Vec<StorageEntry>,
}

/// Mutable storage fields, for corrections while an entry is active.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateStorage {
    /// Replacement commodity description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commodity: Option<String>,
    /// Replacement weight.
    #[serde(skip_serializing_if = "Option::is_none", with = "rust_decimal::serde::str_option")]
    pub weight: Option<Decimal>,
    /// Replacement hourly rate.
    #[serde(skip_serializing_if = "Option::is_none", with = "rust_decimal::serde::str_option")]
    pub hourly_rate: Option<Decimal>,
    /// Replacement check-out estimate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_check_out: Option<DateTime<Utc>>,
}

/// Operations on `/api/storages/`.
pub struct StoragesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> StoragesApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Check a commodity in.
    pub async fn check_in(&self, payload: &CreateStorage) -> ApiResult<StorageEntry> {
        self.client.post("/api/storages/", payload).await
    }

    /// Check an entry out. The backend computes the charge and debits the
    /// account; the response carries the authoritative figures.
    pub async fn checkout(
        &self,
        storage_uuid: Uuid,
        check_out: DateTime<Utc>,
    ) -> ApiResult<CheckoutResponse> {
        self.client
            .post(
                "/api/storages/checkout/",
                &json!({ "storage_uuid": storage_uuid, "check_out": check_out }),
            )
            .await
    }

    /// Entries billed against a card's account.
    pub async fn by_card(&self, card_uuid: Uuid) -> ApiResult<Vec<StorageEntry>> {
        self.client
            .post_list("/api/storages/by_card/", &json!({ "card_uuid": card_uuid }))
            .await
    }

    /// All entries that have not been checked out yet.
    pub async fn active(&self) -> ApiResult<ActiveStorages> {
        self.client.get("/api/storages/active/").await
    }

    /// List all entries.
    pub async fn list(&self) -> ApiResult<Vec<StorageEntry>> {
        self.client.get_list("/api/storages/").await
    }

    /// Fetch one entry.
    pub async fn get(&self, uuid: Uuid) -> ApiResult<StorageEntry> {
        self.client.get(&format!("/api/storages/{uuid}/")).await
    }

    /// Update an entry.
    pub async fn update(&self, uuid: Uuid, payload: &UpdateStorage) -> ApiResult<StorageEntry> {
        self.client
            .put(&format!("/api/storages/{uuid}/"), payload)
            .await
    }

    /// Delete an entry.
    pub async fn delete(&self, uuid: Uuid) -> ApiResult<()> {
        self.client.delete(&format!("/api/storages/{uuid}/")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;

    #[test]
    fn checkout_response_decodes_the_server_side_charge() {
        let response: CheckoutResponse = serde_json::from_value(json!({
            "message": "Checked out",
            "storage": {
                "uuid": "7f8a1c9e-1111-4222-8333-444455556666",
                "commodity": "frozen fish",
                "weight": "50",
                "check_in": "2024-05-01T10:00:00Z",
                "check_out": "2024-05-02T10:00:00Z",
                "estimated_check_out": "2024-05-02T10:00:00Z",
                "hourly_rate": "12.50"
            },
            "duration_hours": 24.0,
            "total_cost": "300.00",
            "new_balance": "1200.00",
            "transaction": {
                "uuid": "7f8a1c9e-2222-4222-8333-444455556666",
                "transaction_type": "debit",
                "amount": "300.00",
                "description": "storage checkout",
                "created": "2024-05-02T10:00:00Z"
            }
        }))
        .unwrap();
        assert_eq!(response.total_cost.to_string(), "300.00");
        assert_eq!(response.new_balance.to_string(), "1200.00");
        assert!(!response.storage.is_active());
        assert_eq!(response.transaction.direction, Direction::Debit);
    }
}
