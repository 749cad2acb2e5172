//! User-profile operations on `/api/users/`.
//!
//! This endpoint is the single authoritative source for member identity.
//! Do not reconstruct users by joining phone numbers across card records;
//! that was a workaround for a missing backend capability.

use uuid::Uuid;

use crate::{client::ApiClient, error::ApiResult, models::UserProfile};

use super::auth::{Register, RegisterResponse};

/// Operations on `/api/users/`.
pub struct UsersApi<'a> {
    client: &'a ApiClient,
}

impl<'a> UsersApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// List all users.
    pub async fn list(&self) -> ApiResult<Vec<UserProfile>> {
        self.client.get_list("/api/users/").await
    }

    /// Fetch one user.
    pub async fn get(&self, uuid: Uuid) -> ApiResult<UserProfile> {
        self.client.get(&format!("/api/users/{uuid}/")).await
    }

    /// Register a new member. Registration lives under the auth resource
    /// on the backend; it is surfaced here because staff reach it from the
    /// member screen.
    pub async fn register(&self, payload: &Register) -> ApiResult<RegisterResponse> {
        self.client.post("/api/auth/register/", payload).await
    }
}
