use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth::{AuthError, PasswordError, PasswordHasher};
use crate::database::models::{User, UserChanges};
use crate::database::{OrganizationRepository, Store, UserRepository};
use crate::services::validation::{self, FieldErrors};
use crate::services::{ServiceError, LAST_ADMIN_MESSAGE};
use crate::types::Role;

// Verified against when the email is unknown, so a miss costs the same as a
// wrong password
const DUMMY_PASSWORD: &str = "sensorhub-dummy-password";

/// Fields of a user being created, as sent by a client
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub display_name: String,
    pub password: String,
}

/// Self-service edit; absent fields stay as they are
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub password: Option<String>,
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
    organizations: Arc<dyn OrganizationRepository>,
    hasher: Arc<PasswordHasher>,
    dummy_hash: String,
}

impl UserService {
    pub fn new(store: &Store, hasher: PasswordHasher) -> Result<Self, PasswordError> {
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;
        Ok(Self {
            users: store.users.clone(),
            organizations: store.organizations.clone(),
            hasher: Arc::new(hasher),
            dummy_hash,
        })
    }

    /// Whether `candidate` may be stored without colliding on email or on
    /// display name within its organization. Fails closed: a fetch error
    /// counts as a collision.
    pub async fn is_unique(&self, candidate: &User) -> bool {
        match self.find_conflict(candidate).await {
            Ok(conflict) => conflict.is_none(),
            Err(e) => {
                error!("Uniqueness check failed for user {}: {}", candidate.id, e);
                false
            }
        }
    }

    /// Whether `user` is the only admin of its organization
    pub async fn is_last_admin(&self, user: &User) -> Result<bool, ServiceError> {
        let siblings = self.users.find_by_organization(user.organization_id).await?;
        Ok(validation::is_last_admin(user, &siblings))
    }

    async fn find_conflict(
        &self,
        candidate: &User,
    ) -> Result<Option<validation::UniquenessConflict>, ServiceError> {
        let siblings = self.users.find_by_organization(candidate.organization_id).await?;
        let email_owner = self.users.find_by_email(&candidate.email).await?;
        Ok(validation::find_conflict(candidate, &siblings, email_owner.as_ref()))
    }

    async fn ensure_unique(&self, candidate: &User) -> Result<(), ServiceError> {
        if let Some(conflict) = self.find_conflict(candidate).await? {
            debug!("User {} collides on {}", candidate.id, conflict.field());
            return Err(ServiceError::Conflict(conflict.message().to_string()));
        }
        Ok(())
    }

    async fn hash_password(&self, password: String) -> Result<String, ServiceError> {
        let hasher = self.hasher.clone();
        let digest = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| PasswordError::HashFailed(e.to_string()))??;
        Ok(digest)
    }

    async fn verify_password(&self, password: String, digest: String) -> bool {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .unwrap_or(false)
    }

    fn check_new_user(input: &NewUser) -> Result<(), ServiceError> {
        let mut errors = FieldErrors::new();
        errors.email("email", &validation::normalize_email(&input.email));
        errors.name("displayName", &input.display_name);
        errors.password("password", &input.password);
        errors.into_result()
    }

    async fn create(&self, organization_id: Uuid, input: NewUser, role: Role) -> Result<User, ServiceError> {
        Self::check_new_user(&input)?;

        let mut candidate = User::new(
            organization_id,
            validation::normalize_email(&input.email),
            input.display_name.trim(),
            String::new(),
            role,
        );
        self.ensure_unique(&candidate).await?;

        candidate.password_hash = self.hash_password(input.password).await?;
        self.users.insert(&candidate).await?;

        info!(
            "Created user {} ({}) in organization {}",
            candidate.id, candidate.role, organization_id
        );
        Ok(candidate)
    }

    /// Public registration. The first user of an organization becomes its
    /// admin; everyone after joins as a member.
    pub async fn signup(&self, organization_id: Uuid, input: NewUser) -> Result<User, ServiceError> {
        if self.organizations.find_by_id(organization_id).await?.is_none() {
            return Err(ServiceError::not_found("Organization"));
        }

        let existing = self.users.find_by_organization(organization_id).await?;
        let role = if existing.is_empty() { Role::Admin } else { Role::Member };

        self.create(organization_id, input, role).await
    }

    /// An admin adds a user to their own organization
    pub async fn create_in_organization(
        &self,
        actor: &User,
        input: NewUser,
        role: Role,
    ) -> Result<User, ServiceError> {
        if !actor.role.is_admin() {
            return Err(ServiceError::admin_required());
        }
        self.create(actor.organization_id, input, role).await
    }

    /// Resolve the user behind a session. A token that outlived its user is
    /// treated like an invalid token.
    pub async fn actor(&self, user_id: Uuid) -> Result<User, ServiceError> {
        match self.users.find_by_id(user_id).await? {
            Some(user) => Ok(user),
            None => {
                warn!("Session refers to missing user {}", user_id);
                Err(ServiceError::Auth(AuthError::Invalid))
            }
        }
    }

    /// A user of the actor's organization
    pub async fn member(&self, actor: &User, user_id: Uuid) -> Result<User, ServiceError> {
        match self.users.find_by_id(user_id).await? {
            Some(user) if user.organization_id == actor.organization_id => Ok(user),
            _ => Err(ServiceError::not_found("User")),
        }
    }

    pub async fn list(&self, actor: &User) -> Result<Vec<User>, ServiceError> {
        Ok(self.users.find_by_organization(actor.organization_id).await?)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let email = validation::normalize_email(email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            self.verify_password(password.to_string(), self.dummy_hash.clone()).await;
            warn!("Login rejected for unknown email");
            return Err(AuthError::BadCredentials.into());
        };

        if !self.verify_password(password.to_string(), user.password_hash.clone()).await {
            warn!("Login rejected for user {}: wrong password", user.id);
            return Err(AuthError::BadCredentials.into());
        }

        Ok(user)
    }

    pub async fn update_profile(&self, actor: &User, update: ProfileUpdate) -> Result<User, ServiceError> {
        let email = update.email.as_deref().map(validation::normalize_email);
        let display_name = update.display_name.as_deref().map(|s| s.trim().to_string());

        let mut errors = FieldErrors::new();
        if let Some(email) = &email {
            errors.email("email", email);
        }
        if let Some(display_name) = &display_name {
            errors.name("displayName", display_name);
        }
        if let Some(password) = &update.password {
            errors.password("password", password);
        }
        errors.into_result()?;

        let password_hash = match update.password {
            Some(password) => Some(self.hash_password(password).await?),
            None => None,
        };
        let changes = UserChanges {
            email,
            display_name,
            password_hash,
        };
        if changes.is_empty() {
            return Err(ServiceError::Validation {
                message: "Nothing to update".to_string(),
                field_errors: Default::default(),
            });
        }

        let candidate = actor.with_changes(&changes);
        self.ensure_unique(&candidate).await?;
        self.users.update_profile(&candidate).await?;

        info!("Updated profile of user {}", candidate.id);
        Ok(candidate)
    }

    /// Set the role of a user in the actor's organization. Demoting the last
    /// admin is refused here and again by the store under a row lock.
    pub async fn change_role(&self, actor: &User, user_id: Uuid, role: Role) -> Result<User, ServiceError> {
        if !actor.role.is_admin() {
            return Err(ServiceError::admin_required());
        }
        let target = self.member(actor, user_id).await?;

        if target.role.is_admin() && !role.is_admin() && self.is_last_admin(&target).await? {
            warn!("Refusing to demote last admin {} of {}", target.id, target.organization_id);
            return Err(ServiceError::Conflict(LAST_ADMIN_MESSAGE.to_string()));
        }

        let updated = self.users.update_role(user_id, role).await?;
        info!("User {} is now {}", updated.id, updated.role);
        Ok(updated)
    }

    /// Delete a user of the actor's organization. Anyone may delete
    /// themselves; deleting others takes an admin.
    pub async fn delete(&self, actor: &User, user_id: Uuid) -> Result<(), ServiceError> {
        if actor.id != user_id && !actor.role.is_admin() {
            return Err(ServiceError::admin_required());
        }
        let target = self.member(actor, user_id).await?;

        if target.role.is_admin() && self.is_last_admin(&target).await? {
            warn!("Refusing to delete last admin {} of {}", target.id, target.organization_id);
            return Err(ServiceError::Conflict(LAST_ADMIN_MESSAGE.to_string()));
        }

        self.users.delete(user_id).await?;
        info!("Deleted user {}", user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PasswordConfig;
    use crate::database::models::Organization;

    async fn setup() -> (UserService, Store, Organization) {
        let store = Store::in_memory();
        let hasher = PasswordHasher::new(&PasswordConfig {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        let service = UserService::new(&store, hasher).unwrap();
        let org = Organization::new("Acme");
        store.organizations.insert(&org).await.unwrap();
        (service, store, org)
    }

    fn new_user(email: &str, name: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            display_name: name.to_string(),
            password: "correct horse battery".to_string(),
        }
    }

    #[tokio::test]
    async fn first_signup_is_admin_then_members() {
        let (service, _, org) = setup().await;

        let first = service.signup(org.id, new_user("a@x.com", "A")).await.unwrap();
        let second = service.signup(org.id, new_user("b@x.com", "B")).await.unwrap();

        assert_eq!(first.role, Role::Admin);
        assert_eq!(second.role, Role::Member);
    }

    #[tokio::test]
    async fn signup_normalizes_email_and_hashes_password() {
        let (service, _, org) = setup().await;

        let user = service.signup(org.id, new_user("  Ops@Example.COM", "Ops")).await.unwrap();

        assert_eq!(user.email, "ops@example.com");
        assert!(user.password_hash.starts_with("$argon2id$"));
        assert!(service.authenticate("OPS@example.com", "correct horse battery").await.is_ok());
    }

    #[tokio::test]
    async fn signup_into_unknown_organization_is_not_found() {
        let (service, _, _) = setup().await;

        let err = service.signup(Uuid::new_v4(), new_user("a@x.com", "A")).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn signup_rejects_bad_input() {
        let (service, _, org) = setup().await;
        let input = NewUser {
            email: "nope".to_string(),
            display_name: " ".to_string(),
            password: "short".to_string(),
        };

        match service.signup(org.id, input).await.unwrap_err() {
            ServiceError::Validation { field_errors, .. } => {
                assert!(field_errors.contains_key("email"));
                assert!(field_errors.contains_key("displayName"));
                assert!(field_errors.contains_key("password"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn email_taken_in_other_organization_conflicts() {
        let (service, store, acme) = setup().await;
        let globex = Organization::new("Globex");
        store.organizations.insert(&globex).await.unwrap();

        service.signup(acme.id, new_user("a@x.com", "A")).await.unwrap();
        let err = service.signup(globex.id, new_user("a@x.com", "A")).await.unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn is_unique_ignores_the_candidate_itself() {
        let (service, _, org) = setup().await;
        let user = service.signup(org.id, new_user("a@x.com", "A")).await.unwrap();

        assert!(service.is_unique(&user).await);

        let clash = User::new(org.id, "b@x.com", "A", "", Role::Member);
        assert!(!service.is_unique(&clash).await);
    }

    #[tokio::test]
    async fn last_admin_scenario() {
        let (service, _, org) = setup().await;
        let a = service.signup(org.id, new_user("a@x.com", "A")).await.unwrap();
        let b = service.signup(org.id, new_user("b@x.com", "B")).await.unwrap();

        let err = service.delete(&a, a.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err = service.change_role(&a, a.id, Role::Member).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        service.change_role(&a, b.id, Role::Admin).await.unwrap();
        service.delete(&a, a.id).await.unwrap();

        let b = service.actor(b.id).await.unwrap();
        assert!(service.is_last_admin(&b).await.unwrap());
    }

    #[tokio::test]
    async fn members_cannot_manage_others() {
        let (service, _, org) = setup().await;
        let a = service.signup(org.id, new_user("a@x.com", "A")).await.unwrap();
        let b = service.signup(org.id, new_user("b@x.com", "B")).await.unwrap();

        assert!(matches!(
            service.change_role(&b, b.id, Role::Admin).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(service.delete(&b, a.id).await, Err(ServiceError::Forbidden(_))));

        service.delete(&b, b.id).await.unwrap();
        assert!(matches!(service.delete(&a, b.id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn authenticate_rejects_wrong_password_and_unknown_email() {
        let (service, _, org) = setup().await;
        service.signup(org.id, new_user("a@x.com", "A")).await.unwrap();

        assert!(matches!(
            service.authenticate("a@x.com", "wrong password").await,
            Err(ServiceError::Auth(AuthError::BadCredentials))
        ));
        assert!(matches!(
            service.authenticate("ghost@x.com", "correct horse battery").await,
            Err(ServiceError::Auth(AuthError::BadCredentials))
        ));
    }

    #[tokio::test]
    async fn profile_update_checks_uniqueness_and_rehashes() {
        let (service, _, org) = setup().await;
        let a = service.signup(org.id, new_user("a@x.com", "A")).await.unwrap();
        service.signup(org.id, new_user("b@x.com", "B")).await.unwrap();

        let clash = ProfileUpdate {
            display_name: Some("B".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.update_profile(&a, clash).await,
            Err(ServiceError::Conflict(_))
        ));

        let update = ProfileUpdate {
            email: Some("alice@x.com".to_string()),
            password: Some("another long secret".to_string()),
            ..Default::default()
        };
        let updated = service.update_profile(&a, update).await.unwrap();

        assert_eq!(updated.email, "alice@x.com");
        assert_eq!(updated.display_name, "A");
        assert!(service.authenticate("alice@x.com", "another long secret").await.is_ok());
    }

    #[tokio::test]
    async fn empty_profile_update_is_rejected() {
        let (service, _, org) = setup().await;
        let a = service.signup(org.id, new_user("a@x.com", "A")).await.unwrap();

        assert!(matches!(
            service.update_profile(&a, ProfileUpdate::default()).await,
            Err(ServiceError::Validation { .. })
        ));
    }
}
