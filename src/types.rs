/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

/// Role of a user within its organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Member => "Member",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Role::Admin),
            "Member" => Ok(Role::Member),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

static LAST_UPDATE: AtomicI64 = AtomicI64::new(0);

/// Epoch milliseconds for a sensor write, strictly greater than any value
/// previously handed out by this process.
pub fn next_update_timestamp() -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    let previous = LAST_UPDATE
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
        .unwrap_or_else(|last| last);
    now.max(previous + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_text() {
        for role in [Role::Admin, Role::Member] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn update_timestamps_strictly_increase() {
        let mut last = next_update_timestamp();
        for _ in 0..1000 {
            let next = next_update_timestamp();
            assert!(next > last);
            last = next;
        }
    }
}
