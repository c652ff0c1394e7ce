//! Test utilities for the backend crate.
//!
//! Shared by unit tests in `src/` and integration tests in `tests/`. Compiled
//! only for tests or with the `test-support` feature.

pub mod clock;
pub mod user_store;

pub use clock::MutableClock;
pub use user_store::InMemoryUserStore;

use chrono::{DateTime, TimeDelta, Utc};

use crate::domain::{CreateUserParams, Role};

/// 2024-05-01T12:00:00Z as seconds since the Unix epoch.
const FIXED_NOW_SECS: i64 = 1_714_564_800;

/// Fixed instant used as the default "now" in fixtures.
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(FIXED_NOW_SECS)
}

/// Creation parameters for a user called `name` with a derived email.
pub fn create_params(name: &str) -> CreateUserParams {
    CreateUserParams {
        name: name.to_owned(),
        email: format!("{}@example.com", name.to_lowercase()),
        hashed_password: format!("$argon2id$hash-for-{name}"),
        role: Role::User,
    }
}
