use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

/// User document as stored in the `users` collection.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub user_id: String, // PRIMARY IDENTIFIER - stable across _id migrations
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>, // bcrypt hash, never returned to clients
    pub wallet_balance: f64,
    // Optimistic locking counter, bumped on every balance write
    #[serde(default)]
    pub version: i64,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    pub created_at: Option<BsonDateTime>,
    pub updated_at: Option<BsonDateTime>,
    pub last_login: Option<BsonDateTime>,
}

fn default_is_active() -> bool {
    true
}

/// Public view of a user, safe to return from the API.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub wallet_balance: f64,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        UserInfo {
            id: user.user_id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            wallet_balance: user.wallet_balance,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StatementResponse {
    pub success: bool,
    pub user: UserInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_info_hides_password_hash() {
        let user = User {
            _id: None,
            user_id: "abc123".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: Some("$2b$12$hash".to_string()),
            wallet_balance: 42.5,
            version: 3,
            is_active: true,
            created_at: None,
            updated_at: None,
            last_login: None,
        };

        let info = UserInfo::from(&user);
        let json = serde_json::to_string(&info).unwrap();

        assert!(json.contains("alice"));
        assert!(!json.contains("$2b$12$hash"));
        assert_eq!(info.wallet_balance, 42.5);
    }
}
