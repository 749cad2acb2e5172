//! Card operations on `/api/cards/`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    client::ApiClient,
    error::ApiResult,
    models::{Card, Transaction, UserInfo},
};

use super::accounts::AccountDetails;

/// Payload for creating a card and assigning it in one step.
#[derive(Debug, Clone, Serialize)]
pub struct CreateAndAssign {
    /// Name to print on the card.
    pub name_on_card: String,
    /// Phone of the member receiving the card.
    pub user_phone: String,
    /// Opening balance, usually zero.
    #[serde(with = "rust_decimal::serde::str")]
    pub initial_balance: Decimal,
}

/// Response to [`CardsApi::create_and_assign`].
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAndAssignResponse {
    /// Confirmation message.
    #[serde(default)]
    pub message: String,
    /// The created card.
    pub card: Card,
}

/// Payload for assigning an existing card to a member.
#[derive(Debug, Clone, Serialize)]
pub struct AssignCard {
    /// Card to assign.
    pub card_uuid: Uuid,
    /// Phone of the member receiving the card.
    pub user_phone: String,
    /// Opening balance, usually zero.
    #[serde(with = "rust_decimal::serde::str")]
    pub initial_balance: Decimal,
}

/// Payload for topping up a card.
#[derive(Debug, Clone, Serialize)]
pub struct TopUpCard {
    /// Card to credit.
    pub card_uuid: Uuid,
    /// Amount to add.
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    /// Optional ledger description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Response to a top-up. `new_balance` is the authoritative post-operation
/// balance; display this, never a locally recomputed sum.
#[derive(Debug, Clone, Deserialize)]
pub struct TopUpResponse {
    /// Confirmation message.
    #[serde(default)]
    pub message: String,
    /// Card that was credited.
    pub card_uuid: Uuid,
    /// Balance after the top-up, computed server-side.
    #[serde(with = "rust_decimal::serde::str")]
    pub new_balance: Decimal,
    /// The ledger entry the backend recorded.
    pub transaction: Transaction,
}

/// Response to registering a raw reader identifier.
#[derive(Debug, Clone, Deserialize)]
pub struct CardSetupResponse {
    /// UUID of the (possibly newly created) card.
    pub uuid: Uuid,
    /// The hex identifier as registered.
    pub hex_id: String,
    /// Confirmation message.
    #[serde(default)]
    pub message: String,
}

/// Full card information including user and account detail.
#[derive(Debug, Clone, Deserialize)]
pub struct CardInfoResponse {
    /// Backend identifier.
    pub uuid: Uuid,
    /// Name printed on the card.
    pub name_on_card: String,
    /// Blocked flag.
    #[serde(default)]
    pub is_blocked: bool,
    /// The holder.
    #[serde(default)]
    pub user_info: Option<UserInfo>,
    /// The backing account with ledger and storage history.
    #[serde(default)]
    pub account_details: Option<AccountDetails>,
}

/// Mutable card fields.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateCard {
    /// Replacement display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_on_card: Option<String>,
}

/// Operations on `/api/cards/`.
pub struct CardsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> CardsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Register a raw hex identifier read from the RFID hardware, creating
    /// an unassigned (and therefore blocked) card when it is new.
    pub async fn initial_card_setup(&self, hex_id: &str) -> ApiResult<CardSetupResponse> {
        self.client
            .post("/api/cards/initial_card_setup/", &json!({ "hex_id": hex_id }))
            .await
    }

    /// Create a new card and assign it to a member in one step.
    pub async fn create_and_assign(
        &self,
        payload: &CreateAndAssign,
    ) -> ApiResult<CreateAndAssignResponse> {
        self.client.post("/api/cards/create_and_assign/", payload).await
    }

    /// Assign an existing card to a member.
    pub async fn assign(&self, payload: &AssignCard) -> ApiResult<Value> {
        self.client.post("/api/cards/assign/", payload).await
    }

    /// Credit a card's account.
    pub async fn top_up(&self, payload: &TopUpCard) -> ApiResult<TopUpResponse> {
        self.client.post("/api/cards/topup/", payload).await
    }

    /// Block or unblock a card.
    pub async fn block(&self, card_uuid: Uuid, is_blocked: bool) -> ApiResult<Value> {
        self.client
            .post(
                "/api/cards/block/",
                &json!({ "card_uuid": card_uuid, "is_blocked": is_blocked }),
            )
            .await
    }

    /// Fetch complete card information: holder, account, ledger, storage.
    pub async fn info(&self, card_uuid: Uuid) -> ApiResult<CardInfoResponse> {
        self.client
            .post("/api/cards/info/", &json!({ "card_uuid": card_uuid }))
            .await
    }

    /// List all cards.
    pub async fn list(&self) -> ApiResult<Vec<Card>> {
        self.client.get_list("/api/cards/").await
    }

    /// Fetch one card.
    pub async fn get(&self, uuid: Uuid) -> ApiResult<Card> {
        self.client.get(&format!("/api/cards/{uuid}/")).await
    }

    /// Update card fields.
    pub async fn update(&self, uuid: Uuid, payload: &UpdateCard) -> ApiResult<Card> {
        self.client.put(&format!("/api/cards/{uuid}/"), payload).await
    }

    /// Delete a card.
    pub async fn delete(&self, uuid: Uuid) -> ApiResult<()> {
        self.client.delete(&format!("/api/cards/{uuid}/")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;

    #[test]
    fn top_up_response_carries_the_authoritative_balance() {
        let response: TopUpResponse = serde_json::from_value(json!({
            "message": "Top up successful",
            "card_uuid": "7f8a1c9e-1111-4222-8333-444455556666",
            "new_balance": "2500.00",
            "transaction": {
                "uuid": "7f8a1c9e-2222-4222-8333-444455556666",
                "transaction_type": "C",
                "amount": "1000.00",
                "description": "top up",
                "created": "2024-05-01T10:00:00Z"
            }
        }))
        .unwrap();
        assert_eq!(response.new_balance.to_string(), "2500.00");
        assert_eq!(response.transaction.direction, Direction::Credit);
    }

    #[test]
    fn assign_payload_serializes_balance_as_string() {
        let payload = AssignCard {
            card_uuid: "7f8a1c9e-1111-4222-8333-444455556666".parse().unwrap(),
            user_phone: "08012345678".to_string(),
            initial_balance: Decimal::ZERO,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["initial_balance"], json!("0"));
    }
}
