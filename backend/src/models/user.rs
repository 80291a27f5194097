use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::picker::PickerError;

/// The Google account behind a login session.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Stable Google account id; used as the picker session owner key.
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub access_token: String,
}

impl AuthUser {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.id, &self.access_token)
    }
}

impl fmt::Debug for AuthUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthUser")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
}

impl From<&AuthUser> for UserResponse {
    fn from(user: &AuthUser) -> Self {
        Self {
            id: user.id.clone(),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

/// Caller identity for picker operations: owner key plus bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub owner_key: String,
    pub access_token: String,
}

impl Credentials {
    pub fn new(owner_key: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            owner_key: owner_key.into(),
            access_token: access_token.into(),
        }
    }

    pub fn ensure_present(&self) -> Result<(), PickerError> {
        if self.owner_key.trim().is_empty() || self.access_token.trim().is_empty() {
            return Err(PickerError::Unauthenticated);
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("owner_key", &self.owner_key)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credentials_are_unauthenticated() {
        assert_eq!(
            Credentials::new("", "token").ensure_present(),
            Err(PickerError::Unauthenticated)
        );
        assert_eq!(
            Credentials::new("u1", "  ").ensure_present(),
            Err(PickerError::Unauthenticated)
        );
        assert!(Credentials::new("u1", "token").ensure_present().is_ok());
    }

    #[test]
    fn debug_output_redacts_token() {
        let creds = Credentials::new("u1", "secret-token");
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("u1"));
        assert!(!rendered.contains("secret-token"));
    }
}
