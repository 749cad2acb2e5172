//! Authentication operations on `/api/auth/`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    client::ApiClient,
    error::{ApiError, ApiResult},
    models::{UserProfile, UserType},
    session::Session,
};

/// Registration payload shared by operator signup and member registration.
#[derive(Debug, Clone, Serialize)]
pub struct Register {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Phone number; doubles as the login identifier.
    pub phone: String,
    /// Postal address.
    pub address: String,
    /// Role of the new user.
    pub user_type: UserType,
    /// Password.
    pub password: String,
    /// Password confirmation; must match `password`.
    pub password_confirm: String,
}

/// Login payload.
#[derive(Debug, Clone, Serialize)]
pub struct Login {
    /// Phone number.
    pub phone: String,
    /// Password.
    pub password: String,
}

/// Response to a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Confirmation message.
    #[serde(default)]
    pub message: String,
    /// Profile of the authenticated user.
    pub user: UserProfile,
    /// Bearer token for subsequent requests.
    pub token: String,
}

/// Response to a registration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    /// Confirmation message.
    #[serde(default)]
    pub message: String,
    /// The created user.
    pub user: UserProfile,
    /// Token, present when the backend logs the new user straight in.
    #[serde(default)]
    pub token: Option<String>,
}

/// Password-change payload.
#[derive(Debug, Clone, Serialize)]
pub struct ChangePassword {
    /// Current password.
    pub old_password: String,
    /// Replacement password.
    pub new_password: String,
    /// Replacement confirmation.
    pub new_password_confirm: String,
}

/// Operations on `/api/auth/`.
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Register a new user.
    pub async fn register(&self, payload: &Register) -> ApiResult<RegisterResponse> {
        self.client.post("/api/auth/register/", payload).await
    }

    /// Log in and install the resulting session so subsequent requests
    /// carry the token.
    pub async fn login(&self, phone: &str, password: &str) -> ApiResult<UserProfile> {
        let payload = Login {
            phone: phone.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.client.post("/api/auth/login/", &payload).await?;
        self.client.session().set(Session {
            token: response.token,
            profile: response.user.clone(),
        });
        Ok(response.user)
    }

    /// Log out. The local session is cleared even when the backend call
    /// fails; an already-dead token is not worth keeping.
    pub async fn logout(&self) -> ApiResult<()> {
        let result = self
            .client
            .post::<_, Value>("/api/auth/logout/", &Value::Object(Default::default()))
            .await;
        self.client.session().clear();
        match result {
            Ok(_) | Err(ApiError::Unauthorized) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Change the logged-in user's password.
    pub async fn change_password(&self, payload: &ChangePassword) -> ApiResult<Value> {
        self.client.put("/api/auth/change-password/", payload).await
    }

    /// Fetch the logged-in user's profile.
    pub async fn profile(&self) -> ApiResult<UserProfile> {
        self.client.get("/api/auth/profile/").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_response_decodes() {
        let response: LoginResponse = serde_json::from_value(json!({
            "message": "Login successful",
            "user": {
                "uuid": "7f8a1c9e-1111-4222-8333-444455556666",
                "first_name": "Ada",
                "last_name": "Obi",
                "phone": "08012345678",
                "address": "12 Harbour Rd",
                "user_type": "ADMIN"
            },
            "token": "abc123"
        }))
        .unwrap();
        assert_eq!(response.token, "abc123");
        assert_eq!(response.user.user_type, UserType::Admin);
    }
}
