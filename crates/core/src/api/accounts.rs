//! Account operations on `/api/accounts/`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
    client::ApiClient,
    error::ApiResult,
    models::{Account, CardInfo, StorageEntry, Transaction, UserInfo},
};

/// Full account detail including its ledger and storage history.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountDetails {
    /// Backend identifier.
    pub uuid: Uuid,
    /// Authoritative balance as of this fetch.
    #[serde(with = "rust_decimal::serde::str")]
    pub balance: Decimal,
    /// Owning user.
    #[serde(default)]
    pub user_info: Option<UserInfo>,
    /// Linked card.
    #[serde(default)]
    pub card_info: Option<CardInfo>,
    /// Ledger entries, newest first as returned by the backend.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    /// Storage history.
    #[serde(default)]
    pub storage_activities: Vec<StorageEntry>,
}

/// Mutable account fields.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateAccount {
    /// Replacement balance; administrative correction only.
    #[serde(skip_serializing_if = "Option::is_none", with = "rust_decimal::serde::str_option")]
    pub balance: Option<Decimal>,
}

/// Operations on `/api/accounts/`.
pub struct AccountsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AccountsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// List all accounts.
    pub async fn list(&self) -> ApiResult<Vec<Account>> {
        self.client.get_list("/api/accounts/").await
    }

    /// Fetch one account.
    pub async fn get(&self, uuid: Uuid) -> ApiResult<Account> {
        self.client.get(&format!("/api/accounts/{uuid}/")).await
    }

    /// Fetch the full detail view: balance plus transactions and storage.
    pub async fn details(&self, account_uuid: Uuid) -> ApiResult<AccountDetails> {
        self.client
            .post("/api/accounts/details/", &json!({ "account_uuid": account_uuid }))
            .await
    }

    /// Update account fields.
    pub async fn update(&self, uuid: Uuid, payload: &UpdateAccount) -> ApiResult<Account> {
        self.client
            .put(&format!("/api/accounts/{uuid}/"), payload)
            .await
    }

    /// Delete an account.
    pub async fn delete(&self, uuid: Uuid) -> ApiResult<()> {
        self.client.delete(&format!("/api/accounts/{uuid}/")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_decode_with_nested_collections() {
        let details: AccountDetails = serde_json::from_value(json!({
            "uuid": "7f8a1c9e-1111-4222-8333-444455556666",
            "balance": "1500.00",
            "user_info": {
                "uuid": "7f8a1c9e-2222-4222-8333-444455556666",
                "first_name": "Ada",
                "last_name": "Obi",
                "phone": "08012345678",
                "address": "12 Harbour Rd"
            },
            "card_info": {
                "uuid": "7f8a1c9e-3333-4222-8333-444455556666",
                "name_on_card": "ADA OBI",
                "is_blocked": false
            },
            "transactions": [{
                "uuid": "7f8a1c9e-4444-4222-8333-444455556666",
                "transaction_type": "credit",
                "amount": "500.00",
                "description": "top up",
                "created": "2024-05-01T10:00:00Z"
            }],
            "storage_activities": []
        }))
        .unwrap();
        assert_eq!(details.balance.to_string(), "1500.00");
        assert_eq!(details.transactions.len(), 1);
        assert!(details.storage_activities.is_empty());
    }
}
