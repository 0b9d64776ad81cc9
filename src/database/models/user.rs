use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::text_enum;

text_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
    #[serde(rename_all = "lowercase")]
    pub enum UserRole {
        Admin => "admin",
        Agent => "agent",
        #[default]
        Customer => "customer",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), String> {
        if !self.email.contains('@') {
            return Err("A valid email is required".to_string());
        }
        if self.password.len() < 8 {
            return Err("Password must be at least 8 characters".to_string());
        }
        if self.name.trim().is_empty() {
            return Err("Name is required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: "Amina".to_string(),
            phone: None,
            role: None,
        }
    }

    #[test]
    fn test_role_round_trips_through_text() {
        assert_eq!("Agent".parse::<UserRole>().unwrap(), UserRole::Agent);
        assert_eq!(UserRole::Admin.to_string(), "admin");
        assert_eq!(UserRole::default(), UserRole::Customer);
        assert!("manager".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_create_request_validation() {
        assert!(request("a@b.dz", "longenough").validate().is_ok());
        assert!(request("nope", "longenough").validate().is_err());
        assert!(request("a@b.dz", "short").validate().is_err());
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@b.dz".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            name: "Amina".to_string(),
            phone: None,
            role: UserRole::Agent,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "agent");
    }
}
