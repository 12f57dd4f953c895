use chrono::{SecondsFormat, Utc};
use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const USERS_COLLECTION: &str = "users";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALLOWED: [&'static str; 3] = ["Male", "Female", "Other"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Gender::Male),
            "Female" => Ok(Gender::Female),
            "Other" => Ok(Gender::Other),
            other => Err(format!(
                "gender must be one of {} (got `{}`)",
                Gender::ALLOWED.join(", "),
                other
            )),
        }
    }
}

/// User document as stored in the `users` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub age: i32,
    #[serde(rename = "dateOfBirth")]
    pub date_of_birth: DateTime,
    /// bcrypt hash, never the plain text
    pub password: String,
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
}

impl User {
    /// The identity triple that must be unique across the collection.
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            name: self.name.clone(),
            age: self.age,
            date_of_birth: self.date_of_birth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub name: String,
    pub age: i32,
    pub date_of_birth: DateTime,
}

/// Request body for POST /create. Fields arrive as raw JSON values so that
/// missing or mistyped input is reported by the validator with the field
/// name, and numbers sent as strings (or the reverse) can be cast.
#[derive(Debug, Default, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    #[schema(value_type = String, example = "Alice")]
    pub name: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    #[schema(value_type = i64, example = 30)]
    pub age: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    #[schema(value_type = String, example = "1994-01-01")]
    pub date_of_birth: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    #[schema(value_type = String, example = "Female")]
    pub gender: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    #[schema(value_type = String)]
    pub password: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    #[schema(value_type = Option<String>)]
    pub about: Value,
}

/// Request body for PUT /update/{id}. Absent and `null` fields are left unchanged.
#[derive(Debug, Default, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    #[schema(value_type = Option<String>)]
    pub name: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    #[schema(value_type = Option<i64>)]
    pub age: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    #[schema(value_type = Option<String>)]
    pub date_of_birth: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    #[schema(value_type = Option<String>)]
    pub gender: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    #[schema(value_type = Option<String>)]
    pub password: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    #[schema(value_type = Option<String>)]
    pub about: Value,
    /// Accepted from legacy clients; not part of the user schema and ignored.
    #[serde(rename = "user_id", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub user_id: Option<Value>,
}

/// A record that passed validation and is ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub age: i32,
    pub date_of_birth: DateTime,
    pub password: String,
    pub gender: Gender,
    pub about: Option<String>,
}

impl NewUser {
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            name: self.name.clone(),
            age: self.age,
            date_of_birth: self.date_of_birth,
        }
    }

    pub fn into_user(self, password_hash: String) -> User {
        User {
            id: None,
            name: self.name,
            age: self.age,
            date_of_birth: self.date_of_birth,
            password: password_hash,
            gender: self.gender,
            about: self.about,
        }
    }
}

/// Validated partial update. `password` holds the hash once the service has
/// processed it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub date_of_birth: Option<DateTime>,
    pub password: Option<String>,
    pub gender: Option<Gender>,
    pub about: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.date_of_birth.is_none()
            && self.password.is_none()
            && self.gender.is_none()
            && self.about.is_none()
    }

    /// Whether the patch changes any part of the identity triple.
    pub fn touches_identity(&self) -> bool {
        self.name.is_some() || self.age.is_some() || self.date_of_birth.is_some()
    }

    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(age) = self.age {
            user.age = age;
        }
        if let Some(date_of_birth) = self.date_of_birth {
            user.date_of_birth = date_of_birth;
        }
        if let Some(password) = &self.password {
            user.password = password.clone();
        }
        if let Some(gender) = self.gender {
            user.gender = gender;
        }
        if let Some(about) = &self.about {
            user.about = Some(about.clone());
        }
    }
}

/// Public representation of a user. The password hash is never exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub age: i32,
    #[serde(rename = "dateOfBirth")]
    #[schema(example = "1994-01-01T00:00:00.000Z")]
    pub date_of_birth: String,
    pub gender: Gender,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: user.name,
            age: user.age,
            date_of_birth: format_date(user.date_of_birth),
            gender: user.gender,
            about: user.about,
        }
    }
}

/// Formats a BSON date as RFC 3339 with millisecond precision.
pub fn format_date(date: DateTime) -> String {
    chrono::DateTime::<Utc>::from_timestamp_millis(date.timestamp_millis())
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Some(ObjectId::new()),
            name: "Alice".to_string(),
            age: 30,
            date_of_birth: DateTime::from_millis(757_382_400_000),
            password: "$2b$04$hash".to_string(),
            gender: Gender::Female,
            about: None,
        }
    }

    #[test]
    fn response_hides_password_and_formats_date() {
        let response = UserResponse::from(sample_user());
        let value = serde_json::to_value(&response).unwrap();

        assert!(value.get("password").is_none());
        assert_eq!(value["dateOfBirth"], "1994-01-01T00:00:00.000Z");
        assert_eq!(value["gender"], "Female");
        assert_eq!(value["_id"].as_str().unwrap().len(), 24);
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let mut user = sample_user();
        let patch = UserPatch {
            name: Some("Alicia".to_string()),
            about: Some("hello".to_string()),
            ..Default::default()
        };

        patch.apply_to(&mut user);

        assert_eq!(user.name, "Alicia");
        assert_eq!(user.about.as_deref(), Some("hello"));
        assert_eq!(user.age, 30);
        assert_eq!(user.gender, Gender::Female);
    }

    #[test]
    fn only_name_age_and_date_touch_identity() {
        let cosmetic = UserPatch {
            gender: Some(Gender::Other),
            about: Some("bio".to_string()),
            password: Some("hash".to_string()),
            ..Default::default()
        };
        assert!(!cosmetic.touches_identity());

        let aged = UserPatch {
            age: Some(31),
            ..Default::default()
        };
        assert!(aged.touches_identity());
    }

    #[test]
    fn update_request_accepts_legacy_user_id() {
        let body = r#"{"name":"Bob","user_id":42}"#;
        let request: UpdateUserRequest = serde_json::from_str(body).unwrap();

        assert_eq!(request.name, "Bob");
        assert!(request.age.is_null());
        assert_eq!(request.user_id, Some(serde_json::json!(42)));
    }

    #[test]
    fn gender_rejects_unknown_values() {
        assert_eq!("Other".parse::<Gender>(), Ok(Gender::Other));
        assert!("male".parse::<Gender>().is_err());
    }
}
