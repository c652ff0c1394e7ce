//! In-memory user store with real commit and rollback semantics.
//!
//! Transactions run against a copy of the state and publish it only when the
//! unit of work succeeds, so tests can observe atomicity without PostgreSQL.
//! A single lock serialises transactions.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use mockable::Clock;
use tokio::sync::Mutex;

use crate::domain::ports::{
    RepositoryWork, TransactionManager, UserPersistenceError, UserRepository, UserStore,
};
use crate::domain::{
    AuditLogEntry, CreateUserParams, UpdateUserParams, User, UserId, UserParts,
};

use super::{MutableClock, fixed_now};

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    hashed_password: String,
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    users: BTreeMap<UserId, StoredUser>,
    audit: Vec<AuditLogEntry>,
    last_id: i64,
}

#[derive(Default)]
struct Counters {
    transactions: AtomicUsize,
    rollbacks: AtomicUsize,
    reads: AtomicUsize,
}

#[derive(Default)]
struct Faults {
    fail_audit_writes: AtomicBool,
    unavailable: AtomicBool,
}

/// Transactional store double implementing both store ports.
pub struct InMemoryUserStore {
    state: Mutex<StoreState>,
    clock: Arc<dyn Clock + Send + Sync>,
    counters: Counters,
    faults: Faults,
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(MutableClock::new(fixed_now())))
    }
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store that stamps rows with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            clock,
            counters: Counters::default(),
            faults: Faults::default(),
        }
    }

    /// Make every audit insert fail with a query error.
    pub fn fail_audit_writes(&self, enabled: bool) {
        self.faults.fail_audit_writes.store(enabled, Ordering::SeqCst);
    }

    /// Refuse to hand out connections.
    pub fn set_unavailable(&self, enabled: bool) {
        self.faults.unavailable.store(enabled, Ordering::SeqCst);
    }

    /// Number of transactions started.
    pub fn transaction_count(&self) -> usize {
        self.counters.transactions.load(Ordering::SeqCst)
    }

    /// Number of transactions rolled back.
    pub fn rollback_count(&self) -> usize {
        self.counters.rollbacks.load(Ordering::SeqCst)
    }

    /// Number of `get_user` calls issued, committed or not.
    pub fn read_count(&self) -> usize {
        self.counters.reads.load(Ordering::SeqCst)
    }

    /// Committed copy of a user row.
    pub async fn user(&self, id: UserId) -> Option<User> {
        self.state
            .lock()
            .await
            .users
            .get(&id)
            .map(|stored| stored.user.clone())
    }

    pub async fn user_count(&self) -> usize {
        self.state.lock().await.users.len()
    }

    /// Stored password hash for a user.
    pub async fn hashed_password(&self, id: UserId) -> Option<String> {
        self.state
            .lock()
            .await
            .users
            .get(&id)
            .map(|stored| stored.hashed_password.clone())
    }

    /// Committed audit rows in insertion order.
    pub async fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.state.lock().await.audit.clone()
    }

    fn ensure_available(&self) -> Result<(), UserPersistenceError> {
        if self.faults.unavailable.load(Ordering::SeqCst) {
            return Err(UserPersistenceError::connection("store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionManager for InMemoryUserStore {
    async fn read_committed<T>(&self, work: RepositoryWork<'_, T>) -> Result<T, UserPersistenceError>
    where
        T: Send,
    {
        self.ensure_available()?;
        let mut committed = self.state.lock().await;
        self.counters.transactions.fetch_add(1, Ordering::SeqCst);

        let mut draft = committed.clone();
        let result = {
            let mut repo = StateRepository {
                state: &mut draft,
                clock: self.clock.as_ref(),
                counters: &self.counters,
                faults: &self.faults,
            };
            work(&mut repo).await
        };

        match result {
            Ok(value) => {
                *committed = draft;
                Ok(value)
            }
            Err(error) => {
                self.counters.rollbacks.fetch_add(1, Ordering::SeqCst);
                Err(error)
            }
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn run<T>(&self, work: RepositoryWork<'_, T>) -> Result<T, UserPersistenceError>
    where
        T: Send,
    {
        self.ensure_available()?;
        let mut state = self.state.lock().await;
        let mut repo = StateRepository {
            state: &mut state,
            clock: self.clock.as_ref(),
            counters: &self.counters,
            faults: &self.faults,
        };
        work(&mut repo).await
    }
}

struct StateRepository<'s> {
    state: &'s mut StoreState,
    clock: &'s (dyn Clock + Send + Sync),
    counters: &'s Counters,
    faults: &'s Faults,
}

impl StateRepository<'_> {
    fn email_taken(&self, email: &str) -> bool {
        self.state
            .users
            .values()
            .any(|stored| stored.user.email() == email)
    }
}

fn rebuild(parts: UserParts) -> Result<User, UserPersistenceError> {
    User::from_parts(parts).map_err(|err| UserPersistenceError::query(err.to_string()))
}

#[async_trait]
impl UserRepository for StateRepository<'_> {
    async fn create_user(
        &mut self,
        params: &CreateUserParams,
    ) -> Result<User, UserPersistenceError> {
        if self.email_taken(&params.email) {
            return Err(UserPersistenceError::duplicate(format!(
                "email {} already registered",
                params.email
            )));
        }
        let id = UserId::new(self.state.last_id + 1)
            .map_err(|err| UserPersistenceError::query(err.to_string()))?;
        let now = self.clock.utc();
        let user = rebuild(UserParts {
            id,
            name: params.name.clone(),
            email: params.email.clone(),
            role: params.role,
            created_at: now,
            updated_at: now,
        })?;
        self.state.last_id = id.get();
        self.state.users.insert(
            id,
            StoredUser {
                user: user.clone(),
                hashed_password: params.hashed_password.clone(),
            },
        );
        Ok(user)
    }

    async fn get_user(&mut self, id: UserId) -> Result<User, UserPersistenceError> {
        self.counters.reads.fetch_add(1, Ordering::SeqCst);
        self.state
            .users
            .get(&id)
            .map(|stored| stored.user.clone())
            .ok_or_else(|| UserPersistenceError::not_found(id.get()))
    }

    async fn update_user(
        &mut self,
        params: &UpdateUserParams,
    ) -> Result<User, UserPersistenceError> {
        let now = self.clock.utc();
        let stored = self
            .state
            .users
            .get_mut(&params.user_id)
            .ok_or_else(|| UserPersistenceError::not_found(params.user_id.get()))?;
        let current = &stored.user;
        let name = params
            .name
            .as_set()
            .cloned()
            .unwrap_or_else(|| current.name().to_owned());
        let updated = rebuild(UserParts {
            id: current.id(),
            name,
            email: current.email().to_owned(),
            role: params.role,
            created_at: current.created_at(),
            updated_at: now.max(current.created_at()),
        })?;
        stored.user = updated.clone();
        Ok(updated)
    }

    async fn delete_user(&mut self, id: UserId) -> Result<(), UserPersistenceError> {
        self.state
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| UserPersistenceError::not_found(id.get()))
    }

    async fn create_audit_log(&mut self, entry: &AuditLogEntry) -> Result<(), UserPersistenceError> {
        if self.faults.fail_audit_writes.load(Ordering::SeqCst) {
            return Err(UserPersistenceError::query("audit_logs insert rejected"));
        }
        self.state.audit.push(entry.clone());
        Ok(())
    }
}
