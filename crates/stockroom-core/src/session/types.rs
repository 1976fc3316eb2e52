//! Session data

use serde::{Deserialize, Serialize};

/// Profile of the logged-in user, as returned by login/signup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(rename = "companyId", default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Snapshot of the persisted session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub user: Option<UserProfile>,
}

impl Session {
    /// Whether an access token is present
    pub fn is_authenticated(&self) -> bool {
        self.access_token
            .as_deref()
            .is_some_and(|token| !token.trim().is_empty())
    }
}
