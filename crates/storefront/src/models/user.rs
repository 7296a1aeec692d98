//! User domain types.
//!
//! [`UserRecord`] is the stored shape (seed fixture or local registration).
//! [`UserProfile`] is what a session may hold: the same data without the
//! password.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use marketstall_core::{Email, Password, UserId};

/// A user account as found in the seed fixture or the local registration list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Unique user ID.
    pub id: UserId,
    /// Login email, unique across the merged catalog.
    pub email: Email,
    /// Plaintext password (mock data only).
    #[serde(default)]
    pub password: Password,
    /// Display nickname, unique across the merged catalog.
    #[serde(default)]
    pub nickname: String,
    /// Real name.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default, rename = "basicAdd")]
    pub basic_address: String,
    #[serde(default, rename = "detailAdd")]
    pub detail_address: String,
    /// Profile image reference (URL or data URL), empty when unset.
    #[serde(default)]
    pub image: String,
}

/// Session-held user identity: every [`UserRecord`] field except the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub email: Email,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default, rename = "basicAdd")]
    pub basic_address: String,
    #[serde(default, rename = "detailAdd")]
    pub detail_address: String,
    #[serde(default)]
    pub image: String,
}

impl From<&UserRecord> for UserProfile {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id.clone(),
            email: record.email.clone(),
            nickname: record.nickname.clone(),
            name: record.name.clone(),
            phone: record.phone.clone(),
            postal_code: record.postal_code.clone(),
            basic_address: record.basic_address.clone(),
            detail_address: record.detail_address.clone(),
            image: record.image.clone(),
        }
    }
}

/// Sign-up form data.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: SecretString,
    pub name: String,
    pub nickname: String,
    pub phone: String,
    pub postal_code: String,
    pub basic_address: String,
    pub detail_address: String,
}

/// Partial profile update. `None` leaves a field untouched.
///
/// Email, nickname and password are not editable through a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub postal_code: Option<String>,
    pub basic_address: Option<String>,
    pub detail_address: Option<String>,
    pub image: Option<String>,
}

impl ProfilePatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.postal_code.is_none()
            && self.basic_address.is_none()
            && self.detail_address.is_none()
            && self.image.is_none()
    }

    /// Merge the patch into a stored record.
    pub fn apply_to_record(&self, record: &mut UserRecord) {
        apply(&mut record.name, self.name.as_ref());
        apply(&mut record.phone, self.phone.as_ref());
        apply(&mut record.postal_code, self.postal_code.as_ref());
        apply(&mut record.basic_address, self.basic_address.as_ref());
        apply(&mut record.detail_address, self.detail_address.as_ref());
        apply(&mut record.image, self.image.as_ref());
    }
}

fn apply(field: &mut String, value: Option<&String>) {
    if let Some(value) = value {
        field.clone_from(value);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record() -> UserRecord {
        serde_json::from_str(
            r#"{"id":"user1","email":"a@b.c","password":"pw","nickname":"shop1",
                "name":"Kim","phone":"0101112222","postalCode":"12345",
                "basicAdd":"Seoul","detailAdd":"101"}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_record_reads_fixture_field_names() {
        let user = record();
        assert_eq!(user.basic_address, "Seoul");
        assert_eq!(user.detail_address, "101");
        assert!(user.image.is_empty());
        assert!(user.password.matches("pw"));
    }

    #[test]
    fn test_profile_serialization_has_no_password() {
        let profile = UserProfile::from(&record());
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("\"pw\""));
    }

    #[test]
    fn test_patch_only_touches_given_fields() {
        let mut user = record();
        let patch = ProfilePatch {
            phone: Some("0109998888".to_string()),
            ..ProfilePatch::default()
        };
        patch.apply_to_record(&mut user);
        assert_eq!(user.phone, "0109998888");
        assert_eq!(user.name, "Kim");
        assert_eq!(user.postal_code, "12345");
    }

    #[test]
    fn test_empty_patch() {
        assert!(ProfilePatch::default().is_empty());
        let patch = ProfilePatch {
            image: Some(String::new()),
            ..ProfilePatch::default()
        };
        assert!(!patch.is_empty());
    }
}
