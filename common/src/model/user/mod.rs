//! User profile owned by the user service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a user in the user service
pub type UserId = i64;

/// User profile as served by the user service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<i64>,
    #[serde(default)]
    pub dni: Option<i64>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_user_service_payload() {
        let json = r#"{
            "id": 42,
            "name": "Ana",
            "lastName": "Gómez",
            "email": "ana@example.com",
            "phone": 1144556677,
            "dni": 30111222,
            "country": "Argentina",
            "city": "Córdoba",
            "lastLogin": "2024-10-10T00:00:00Z"
        }"#;

        let user: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, 42);
        assert_eq!(user.last_name, "Gómez");
        assert_eq!(user.dni, Some(30111222));
        assert!(user.last_login.is_some());
    }
}
