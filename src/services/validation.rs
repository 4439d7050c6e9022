// services/validation.rs - Uniqueness, role and input checks
//
// The decision functions take a snapshot of users fetched by the caller and
// never touch a store, so they can be exercised directly.

use std::collections::HashMap;

use crate::database::models::User;
use crate::services::ServiceError;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_NAME_LENGTH: usize = 100;

/// Which unique key a candidate user collides on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniquenessConflict {
    Email,
    DisplayName,
}

impl UniquenessConflict {
    pub fn field(&self) -> &'static str {
        match self {
            UniquenessConflict::Email => "email",
            UniquenessConflict::DisplayName => "displayName",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            UniquenessConflict::Email => "Email is already registered",
            UniquenessConflict::DisplayName => "Display name is already taken in this organization",
        }
    }
}

/// First key `candidate` collides on. `siblings` are the users of the
/// candidate's organization; `email_owner` is whoever holds the candidate's
/// email anywhere in the system. The candidate itself is skipped by id.
pub fn find_conflict(
    candidate: &User,
    siblings: &[User],
    email_owner: Option<&User>,
) -> Option<UniquenessConflict> {
    let others = || siblings.iter().filter(|u| u.id != candidate.id);

    let email_taken = email_owner.is_some_and(|owner| owner.id != candidate.id)
        || others().any(|u| u.email == candidate.email);
    if email_taken {
        return Some(UniquenessConflict::Email);
    }

    if others().any(|u| u.display_name == candidate.display_name) {
        return Some(UniquenessConflict::DisplayName);
    }

    None
}

/// True iff nobody in `siblings` other than `user` holds the Admin role
pub fn is_last_admin(user: &User, siblings: &[User]) -> bool {
    !siblings
        .iter()
        .any(|u| u.id != user.id && u.role.is_admin())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Accepts `local@domain.tld` shapes; deliverability is not checked
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.split('.').count() >= 2
        && domain.split('.').all(|part| !part.is_empty())
        && !email.chars().any(char::is_whitespace)
}

/// Collects per-field problems and turns them into one validation error
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: HashMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn email(&mut self, field: &str, email: &str) {
        if !is_valid_email(email) {
            self.add(field, "Must be a valid email address");
        }
    }

    pub fn name(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "Must not be empty");
        } else if value.chars().count() > MAX_NAME_LENGTH {
            self.add(field, format!("Must be at most {} characters", MAX_NAME_LENGTH));
        }
    }

    pub fn password(&mut self, field: &str, password: &str) {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            self.add(field, format!("Must be at least {} characters", MIN_PASSWORD_LENGTH));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), ServiceError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation {
                message: "Invalid request data".to_string(),
                field_errors: self.errors,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use uuid::Uuid;

    fn user(org: Uuid, email: &str, name: &str, role: Role) -> User {
        User::new(org, email, name, "hash", role)
    }

    #[test]
    fn unique_candidate_passes() {
        let org = Uuid::new_v4();
        let siblings = vec![user(org, "a@x.com", "A", Role::Admin)];
        let candidate = user(org, "b@x.com", "B", Role::Member);

        assert_eq!(find_conflict(&candidate, &siblings, None), None);
    }

    #[test]
    fn email_owned_in_other_organization_conflicts() {
        let owner = user(Uuid::new_v4(), "a@x.com", "A", Role::Admin);
        let candidate = user(Uuid::new_v4(), "a@x.com", "B", Role::Admin);

        assert_eq!(
            find_conflict(&candidate, &[], Some(&owner)),
            Some(UniquenessConflict::Email)
        );
    }

    #[test]
    fn display_name_conflicts_within_organization() {
        let org = Uuid::new_v4();
        let siblings = vec![user(org, "a@x.com", "Sam", Role::Admin)];
        let candidate = user(org, "b@x.com", "Sam", Role::Member);

        assert_eq!(
            find_conflict(&candidate, &siblings, None),
            Some(UniquenessConflict::DisplayName)
        );
    }

    #[test]
    fn candidate_does_not_conflict_with_itself() {
        let org = Uuid::new_v4();
        let existing = user(org, "a@x.com", "A", Role::Admin);
        let mut renamed = existing.clone();
        renamed.display_name = "Alice".to_string();

        assert_eq!(find_conflict(&renamed, &[existing.clone()], Some(&existing)), None);
    }

    #[test]
    fn last_admin_detection() {
        let org = Uuid::new_v4();
        let admin = user(org, "a@x.com", "A", Role::Admin);
        let member = user(org, "b@x.com", "B", Role::Member);
        let siblings = vec![admin.clone(), member.clone()];

        assert!(is_last_admin(&admin, &siblings));

        let mut promoted = member;
        promoted.role = Role::Admin;
        assert!(!is_last_admin(&admin, &[admin.clone(), promoted]));
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("ops@fleet.example.com"));
        assert!(!is_valid_email("ops@localhost"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("a@@example.com"));
        assert_eq!(normalize_email("  Ops@Example.COM "), "ops@example.com");
    }

    #[test]
    fn field_errors_keep_first_message_per_field() {
        let mut errors = FieldErrors::new();
        errors.password("password", "short");
        errors.name("displayName", "   ");
        errors.add("password", "second message");

        match errors.into_result() {
            Err(ServiceError::Validation { field_errors, .. }) => {
                assert_eq!(field_errors.len(), 2);
                assert!(field_errors["password"].contains("at least 8"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
