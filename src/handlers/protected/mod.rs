// handlers/protected/mod.rs - Private handlers (session required)
//
// Every route here sits behind `require_session`, and every entity is
// scoped to the caller's organization: a record of another organization is
// reported as not found.

pub mod auth;
pub mod operator;
pub mod organization;
pub mod preset;
pub mod sensor;
pub mod thing;
pub mod user;

use uuid::Uuid;

use crate::database::models::Thing;
use crate::error::ApiError;
use crate::middleware::Session;
use crate::AppState;

/// A thing of the caller's organization
pub(crate) async fn owned_thing(state: &AppState, session: &Session, thing_id: Uuid) -> Result<Thing, ApiError> {
    match state.store.things.find_by_id(thing_id).await? {
        Some(thing) if thing.organization_id == session.organization_id => Ok(thing),
        _ => Err(ApiError::not_found("Thing not found")),
    }
}
