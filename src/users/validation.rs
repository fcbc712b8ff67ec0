use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde::Serialize;

use super::dto::{CreateUserRequest, UpdateUserRequest};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 50;
pub const MIN_AGE: i32 = 18;

/// Field name to message. Only the first violation per field is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    #[cfg(test)]
    pub(crate) fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, msg)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {msg}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Structural checks on inbound user payloads. Built once at startup and
/// shared through the application state.
#[derive(Debug, Clone)]
pub struct Validator {
    username_re: Regex,
    email_re: Regex,
}

impl Validator {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            username_re: Regex::new(r"^[A-Za-z0-9_]+$")?,
            email_re: Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")?,
        })
    }

    pub fn validate_create(&self, req: &CreateUserRequest) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        self.check_username(&mut errors, &req.user_name);
        if req.email.is_empty() {
            errors.add("email", "email is required");
        } else {
            self.check_email(&mut errors, &req.email);
        }
        check_age(&mut errors, req.age);
        errors.into_result()
    }

    pub fn validate_update(&self, req: &UpdateUserRequest) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        self.check_username(&mut errors, &req.user_name);
        if let Some(email) = req.email.as_deref().filter(|e| !e.is_empty()) {
            self.check_email(&mut errors, email);
        }
        check_age(&mut errors, req.age);
        errors.into_result()
    }

    fn check_username(&self, errors: &mut ValidationErrors, username: &str) {
        if username.is_empty() {
            errors.add("user_name", "user_name is required");
            return;
        }
        let len = username.chars().count();
        if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
            errors.add(
                "user_name",
                format!(
                    "user_name must be between {USERNAME_MIN_LEN} and {USERNAME_MAX_LEN} characters"
                ),
            );
        }
        if !self.username_chars_ok(username) {
            errors.add(
                "user_name",
                "user_name may only contain letters, digits and underscores",
            );
        }
    }

    /// Empty input passes; emptiness is the `required` rule's concern.
    fn username_chars_ok(&self, username: &str) -> bool {
        username.is_empty() || self.username_re.is_match(username)
    }

    fn check_email(&self, errors: &mut ValidationErrors, email: &str) {
        if !self.email_re.is_match(email) {
            errors.add("email", "email is not in the correct format");
        }
    }
}

fn check_age(errors: &mut ValidationErrors, age: Option<i32>) {
    if let Some(age) = age {
        if age < MIN_AGE {
            errors.add("age", format!("age must be greater than or equal {MIN_AGE}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> Validator {
        Validator::new().unwrap()
    }

    fn create(user_name: &str, email: &str, age: Option<i32>) -> CreateUserRequest {
        CreateUserRequest {
            user_name: user_name.into(),
            email: email.into(),
            age,
        }
    }

    #[test]
    fn accepts_a_well_formed_payload() {
        let v = validator();
        assert!(v
            .validate_create(&create("alice_1", "alice@example.com", Some(25)))
            .is_ok());
    }

    #[test]
    fn age_boundary() {
        let v = validator();
        let err = v
            .validate_create(&create("alice_1", "alice@example.com", Some(17)))
            .unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(err.get("age").unwrap().contains("18"));

        assert!(v
            .validate_create(&create("alice_1", "alice@example.com", Some(18)))
            .is_ok());
        assert!(v
            .validate_create(&create("alice_1", "alice@example.com", None))
            .is_ok());
    }

    #[test]
    fn username_length_and_charset() {
        let v = validator();

        let err = v
            .validate_create(&create("ab", "a@example.com", None))
            .unwrap_err();
        assert!(err.get("user_name").unwrap().contains("between"));

        assert!(v
            .validate_create(&create("ab_12", "a@example.com", None))
            .is_ok());

        let err = v
            .validate_create(&create("ab!", "a@example.com", None))
            .unwrap_err();
        assert!(err.get("user_name").unwrap().contains("letters"));

        let long = "a".repeat(USERNAME_MAX_LEN + 1);
        assert!(v
            .validate_create(&create(&long, "a@example.com", None))
            .is_err());
        let max = "a".repeat(USERNAME_MAX_LEN);
        assert!(v
            .validate_create(&create(&max, "a@example.com", None))
            .is_ok());
    }

    #[test]
    fn empty_username_only_trips_required() {
        let v = validator();
        assert!(v.username_chars_ok(""));
        let err = v
            .validate_create(&create("", "a@example.com", None))
            .unwrap_err();
        assert_eq!(err.get("user_name"), Some("user_name is required"));
    }

    #[test]
    fn email_required_on_create_and_checked_for_shape() {
        let v = validator();
        let err = v.validate_create(&create("alice", "", None)).unwrap_err();
        assert_eq!(err.get("email"), Some("email is required"));

        let err = v
            .validate_create(&create("alice", "not-an-email", None))
            .unwrap_err();
        assert_eq!(err.get("email"), Some("email is not in the correct format"));
    }

    #[test]
    fn collects_every_failing_field() {
        let v = validator();
        let err = v.validate_create(&create("a!", "nope", Some(3))).unwrap_err();
        assert_eq!(err.len(), 3);
        let json = serde_json::to_value(&err).unwrap();
        assert!(json["user_name"].is_string());
        assert!(json["email"].is_string());
        assert!(json["age"].is_string());
    }

    #[test]
    fn email_is_optional_on_update() {
        let v = validator();
        let req = UpdateUserRequest {
            user_name: "alice".into(),
            email: None,
            age: Some(30),
        };
        assert!(v.validate_update(&req).is_ok());

        let req = UpdateUserRequest {
            user_name: "alice".into(),
            email: Some("broken".into()),
            age: None,
        };
        assert!(v.validate_update(&req).unwrap_err().get("email").is_some());
    }
}
