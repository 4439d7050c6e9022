use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub organization_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        organization_id: Uuid,
        email: impl Into<String>,
        display_name: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            display_name: display_name.into(),
            password_hash: password_hash.into(),
            role,
            organization_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy of this user with the given edits applied
    pub fn with_changes(&self, changes: &UserChanges) -> Self {
        let mut updated = self.clone();
        if let Some(email) = &changes.email {
            updated.email = email.clone();
        }
        if let Some(display_name) = &changes.display_name {
            updated.display_name = display_name.clone();
        }
        if let Some(password_hash) = &changes.password_hash {
            updated.password_hash = password_hash.clone();
        }
        updated.updated_at = Utc::now();
        updated
    }
}

/// Self-service edits; the password is already hashed here
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.display_name.is_none() && self.password_hash.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_never_serialized() {
        let user = User::new(Uuid::new_v4(), "a@x.com", "A", "$argon2id$secret", Role::Admin);
        let json = serde_json::to_value(&user).unwrap();

        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["displayName"], "A");
        assert_eq!(json["role"], "Admin");
    }

    #[test]
    fn with_changes_only_touches_given_fields() {
        let user = User::new(Uuid::new_v4(), "a@x.com", "A", "hash", Role::Member);
        let changed = user.with_changes(&UserChanges {
            display_name: Some("Alice".to_string()),
            ..Default::default()
        });

        assert_eq!(changed.id, user.id);
        assert_eq!(changed.email, "a@x.com");
        assert_eq!(changed.display_name, "Alice");
        assert_eq!(changed.password_hash, "hash");
    }
}
