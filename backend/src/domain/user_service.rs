//! Cache-aside orchestration of user operations.
//!
//! Each operation runs its repository and audit writes inside one Read
//! Committed transaction, then applies cache side effects outside it:
//!
//! ```text
//! start -> in transaction -> committed | rolled back -> cache side effect -> done
//! ```
//!
//! Only the transactional segment is atomic. Cache failures are logged and
//! absorbed here; they never change what the caller sees. Across concurrent
//! requests for the same id the last cache write to finish wins, so callers
//! must not rely on the cache being current right after a call returns.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    TransactionManager, UserCache, UserCacheError, UserManagement, UserServiceError,
    repository_work,
};
use crate::domain::{
    AuditAction, AuditLogEntry, CreateUserParams, DeleteUserParams, GetUserParams,
    UpdateUserParams, User, UserId,
};

/// Orchestrator implementing [`UserManagement`].
///
/// Holds no mutable state of its own; everything shared lives behind the
/// injected transaction manager and cache, so it is safe under arbitrary
/// concurrent invocation.
pub struct UserService<M, C: ?Sized> {
    transactions: Arc<M>,
    cache: Arc<C>,
}

impl<M, C: ?Sized> Clone for UserService<M, C> {
    fn clone(&self) -> Self {
        Self {
            transactions: Arc::clone(&self.transactions),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<M, C: ?Sized> UserService<M, C> {
    /// Create a service over the given transaction manager and cache.
    pub fn new(transactions: Arc<M>, cache: Arc<C>) -> Self {
        Self {
            transactions,
            cache,
        }
    }
}

/// Outcome of a cache lookup.
///
/// Only a clean miss may repopulate; a degraded cache is bypassed.
#[derive(Debug)]
enum CacheRead {
    Hit(User),
    Miss,
    Degraded,
}

impl<M, C> UserService<M, C>
where
    M: TransactionManager,
    C: UserCache + ?Sized,
{
    async fn populate_cache(&self, user: &User, operation: AuditAction) {
        if let Err(error) = self.cache.create(user).await {
            warn!(
                %error,
                user_id = %user.id(),
                %operation,
                "cache populate failed; continuing without cache entry"
            );
        }
    }

    async fn evict_cache(&self, id: UserId, operation: AuditAction) {
        if let Err(error) = self.cache.delete(id).await {
            warn!(
                %error,
                user_id = %id,
                %operation,
                "cache eviction failed; entry may be stale until next write"
            );
        }
    }

    async fn read_cache(&self, id: UserId) -> CacheRead {
        match self.cache.get(id).await {
            Ok(user) => CacheRead::Hit(user),
            Err(UserCacheError::NotFound { .. }) => {
                debug!(user_id = %id, "cache miss");
                CacheRead::Miss
            }
            Err(error) => {
                warn!(%error, user_id = %id, "cache read failed; falling back to store");
                CacheRead::Degraded
            }
        }
    }
}

#[async_trait]
impl<M, C> UserManagement for UserService<M, C>
where
    M: TransactionManager + 'static,
    C: UserCache + ?Sized + 'static,
{
    async fn create(&self, params: CreateUserParams) -> Result<User, UserServiceError> {
        info!(email = %params.email, role = params.role.as_i16(), "creating user");

        let user = self
            .transactions
            .read_committed(repository_work(move |repo| {
                Box::pin(async move {
                    let user = repo.create_user(&params).await?;
                    let entry = AuditLogEntry::record(AuditAction::Create, &params, Some(&user))?;
                    repo.create_audit_log(&entry).await?;
                    Ok(user)
                })
            }))
            .await
            .map_err(|err| UserServiceError::new(AuditAction::Create, err))?;

        self.populate_cache(&user, AuditAction::Create).await;
        Ok(user)
    }

    async fn get(&self, params: GetUserParams) -> Result<User, UserServiceError> {
        let id = params.user_id;
        let may_populate = match self.read_cache(id).await {
            CacheRead::Hit(user) => {
                debug!(user_id = %id, "served from cache");
                return Ok(user);
            }
            CacheRead::Miss => true,
            CacheRead::Degraded => false,
        };

        let user = self
            .transactions
            .read_committed(repository_work(move |repo| {
                Box::pin(async move {
                    let user = repo.get_user(params.user_id).await?;
                    let entry = AuditLogEntry::record(AuditAction::Get, &params, Some(&user))?;
                    repo.create_audit_log(&entry).await?;
                    Ok(user)
                })
            }))
            .await
            .map_err(|err| UserServiceError::new(AuditAction::Get, err))?;

        if may_populate {
            self.populate_cache(&user, AuditAction::Get).await;
        }
        Ok(user)
    }

    async fn update(&self, params: UpdateUserParams) -> Result<User, UserServiceError> {
        let id = params.user_id;
        info!(user_id = %id, name_changed = !params.name.is_unchanged(), "updating user");

        // Evict before the write so a stale entry cannot outlive the update.
        self.evict_cache(id, AuditAction::Update).await;

        let user = self
            .transactions
            .read_committed(repository_work(move |repo| {
                Box::pin(async move {
                    let user = repo.update_user(&params).await?;
                    let entry = AuditLogEntry::record::<_, ()>(AuditAction::Update, &params, None)?;
                    repo.create_audit_log(&entry).await?;
                    Ok(user)
                })
            }))
            .await
            .map_err(|err| UserServiceError::new(AuditAction::Update, err))?;

        self.populate_cache(&user, AuditAction::Update).await;
        Ok(user)
    }

    async fn delete(&self, params: DeleteUserParams) -> Result<(), UserServiceError> {
        let id = params.user_id;
        info!(user_id = %id, "deleting user");

        self.transactions
            .read_committed(repository_work(move |repo| {
                Box::pin(async move {
                    repo.delete_user(params.user_id).await?;
                    let entry = AuditLogEntry::record::<_, ()>(AuditAction::Delete, &params, None)?;
                    repo.create_audit_log(&entry).await?;
                    Ok(())
                })
            }))
            .await
            .map_err(|err| UserServiceError::new(AuditAction::Delete, err))?;

        self.evict_cache(id, AuditAction::Delete).await;
        Ok(())
    }
}

#[cfg(test)]
#[path = "user_service_tests.rs"]
mod tests;
