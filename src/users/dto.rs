use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::{NewUser, User, UserChanges};

/// Request body for `POST /user`.
///
/// Missing fields decode to empty values so that the validator, not the
/// JSON decoder, reports them.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub age: Option<i32>,
}

impl CreateUserRequest {
    pub fn normalize(&mut self) {
        self.email = self.email.trim().to_lowercase();
    }

    pub fn into_new_user(self, created_at: OffsetDateTime) -> NewUser {
        NewUser {
            username: self.user_name,
            email: self.email,
            age: self.age,
            created_at,
        }
    }
}

/// Request body for `PUT /user/{id}`. Extra fields such as `id` or
/// `created_at` are ignored.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,
}

impl UpdateUserRequest {
    /// Lowercases the email and treats an empty one as absent.
    pub fn normalize(&mut self) {
        self.email = self
            .email
            .take()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());
    }

    pub fn into_changes(self) -> UserChanges {
        UserChanges {
            username: self.user_name,
            email: self.email,
            age: self.age,
        }
    }
}

/// Success envelope: `{"msg": ..., "data": [...]}`.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub msg: String,
    pub data: Option<Vec<User>>,
}

impl UserResponse {
    pub fn one(msg: impl Into<String>, user: User) -> Self {
        Self {
            msg: msg.into(),
            data: Some(vec![user]),
        }
    }

    pub fn many(msg: impl Into<String>, users: Vec<User>) -> Self {
        Self {
            msg: msg.into(),
            data: Some(users),
        }
    }

    pub fn empty(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_tolerates_missing_fields() {
        let req: CreateUserRequest = serde_json::from_str(r#"{"age": 20}"#).unwrap();
        assert!(req.user_name.is_empty());
        assert!(req.email.is_empty());
        assert_eq!(req.age, Some(20));
    }

    #[test]
    fn update_request_ignores_server_fields_and_blank_email() {
        let mut req: UpdateUserRequest = serde_json::from_str(
            r#"{"id": 3, "user_name": "bob", "email": "  ", "created_at": "2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        req.normalize();
        assert_eq!(req.user_name, "bob");
        assert_eq!(req.email, None);
        assert_eq!(req.age, None);
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        let mut req = CreateUserRequest {
            user_name: "bob".into(),
            email: "  Bob@Example.COM ".into(),
            age: None,
        };
        req.normalize();
        assert_eq!(req.email, "bob@example.com");
    }

    #[test]
    fn empty_envelope_serializes_null_data() {
        let json = serde_json::to_value(UserResponse::empty("User deleted")).unwrap();
        assert_eq!(json["msg"], "User deleted");
        assert!(json["data"].is_null());
    }
}
