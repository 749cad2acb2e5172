//! Typed access to each backend REST resource.
//!
//! These modules translate domain operations into transport calls and
//! typed results. No business logic, no retries, no caching: whatever the
//! backend returns for a money-mutating call (new balance, total cost) is
//! what callers must display.

mod accounts;
mod auth;
mod cards;
mod storages;
mod transactions;
mod users;

pub use accounts::{AccountDetails, AccountsApi, UpdateAccount};
pub use auth::{AuthApi, ChangePassword, Login, LoginResponse, Register, RegisterResponse};
pub use cards::{
    AssignCard, CardInfoResponse, CardSetupResponse, CardsApi, CreateAndAssign,
    CreateAndAssignResponse, TopUpCard, TopUpResponse, UpdateCard,
};
pub use storages::{
    ActiveStorages, CheckoutResponse, CreateStorage, StoragesApi, UpdateStorage,
};
pub use transactions::{CardTransactions, CreateTransaction, TransactionsApi};
pub use users::UsersApi;

use serde::Deserialize;

/// List responses arrive either as a bare array or wrapped in an envelope
/// with a `results` field, depending on backend pagination settings. Every
/// list call in this crate goes through this one normalization.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListResponse<T> {
    /// Plain `[...]`.
    Bare(Vec<T>),
    /// `{"results": [...]}`.
    Envelope {
        /// The wrapped items.
        results: Vec<T>,
    },
}

impl<T> ListResponse<T> {
    pub(crate) fn into_items(self) -> Vec<T> {
        match self {
            ListResponse::Bare(items) => items,
            ListResponse::Envelope { results } => results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_shapes_normalize_to_the_same_array() {
        let bare: ListResponse<i32> = serde_json::from_str("[1, 2, 3]").unwrap();
        let enveloped: ListResponse<i32> =
            serde_json::from_str(r#"{"results": [1, 2, 3]}"#).unwrap();
        assert_eq!(bare.into_items(), enveloped.into_items());
    }

    #[test]
    fn empty_envelope_normalizes_to_an_empty_array() {
        let enveloped: ListResponse<i32> = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(enveloped.into_items().is_empty());
    }
}
