//! PostgreSQL-backed user repository and transaction manager.
//!
//! [`DieselUserStore`] owns the pool and hands each unit of work a
//! [`DieselUserRepository`] bound to one checked-out connection, either inside
//! a Read Committed transaction or in autocommit mode.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::OptionalExtension;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{
    RepositoryWork, TransactionManager, UserPersistenceError, UserRepository, UserStore,
};
use crate::domain::{AuditLogEntry, CreateUserParams, UpdateUserParams, User, UserId};

use super::diesel_error_mapping::map_diesel_error;
use super::models::{NewAuditLogRow, NewUserRow, UserChangeset, UserRow};
use super::pool::DbPool;
use super::schema::{audit_logs, users};

/// Pool-backed implementation of [`TransactionManager`] and [`UserStore`].
#[derive(Clone)]
pub struct DieselUserStore {
    pool: DbPool,
}

impl DieselUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Error carried out of a Diesel transaction closure.
///
/// Diesel needs `From<diesel::result::Error>` to report commit and rollback
/// failures; work errors pass through untouched.
#[derive(Debug)]
enum TransactionError {
    Diesel(diesel::result::Error),
    Work(UserPersistenceError),
}

impl From<diesel::result::Error> for TransactionError {
    fn from(value: diesel::result::Error) -> Self {
        Self::Diesel(value)
    }
}

impl From<TransactionError> for UserPersistenceError {
    fn from(value: TransactionError) -> Self {
        match value {
            TransactionError::Diesel(err) => map_diesel_error(err),
            TransactionError::Work(err) => err,
        }
    }
}

#[async_trait]
impl TransactionManager for DieselUserStore {
    async fn read_committed<T>(&self, work: RepositoryWork<'_, T>) -> Result<T, UserPersistenceError>
    where
        T: Send,
    {
        let mut conn = self.pool.get().await?;
        let result = conn
            .build_transaction()
            .read_committed()
            .run(|conn| {
                async move {
                    let mut repo = DieselUserRepository::new(conn);
                    work(&mut repo).await.map_err(TransactionError::Work)
                }
                .scope_boxed()
            })
            .await;
        if let Err(TransactionError::Work(err)) = &result {
            debug!(error = %err, "transaction rolled back");
        }
        result.map_err(UserPersistenceError::from)
    }
}

#[async_trait]
impl UserStore for DieselUserStore {
    async fn run<T>(&self, work: RepositoryWork<'_, T>) -> Result<T, UserPersistenceError>
    where
        T: Send,
    {
        let mut conn = self.pool.get().await?;
        let mut repo = DieselUserRepository::new(&mut conn);
        work(&mut repo).await
    }
}

/// Repository bound to a single connection, transactional or not.
pub struct DieselUserRepository<'c> {
    conn: &'c mut AsyncPgConnection,
}

impl<'c> DieselUserRepository<'c> {
    pub fn new(conn: &'c mut AsyncPgConnection) -> Self {
        Self { conn }
    }
}

fn into_user(row: UserRow) -> Result<User, UserPersistenceError> {
    User::try_from(row).map_err(|err| UserPersistenceError::query(format!("invalid user row: {err}")))
}

#[async_trait]
impl UserRepository for DieselUserRepository<'_> {
    async fn create_user(
        &mut self,
        params: &CreateUserParams,
    ) -> Result<User, UserPersistenceError> {
        let row = diesel::insert_into(users::table)
            .values(NewUserRow::from(params))
            .returning(UserRow::as_returning())
            .get_result(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;
        into_user(row)
    }

    async fn get_user(&mut self, id: UserId) -> Result<User, UserPersistenceError> {
        let row = users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first(&mut *self.conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .ok_or_else(|| UserPersistenceError::not_found(id.get()))?;
        into_user(row)
    }

    async fn update_user(
        &mut self,
        params: &UpdateUserParams,
    ) -> Result<User, UserPersistenceError> {
        let id = params.user_id.get();
        let row = diesel::update(users::table.find(id))
            .set((
                UserChangeset::from(params),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .returning(UserRow::as_returning())
            .get_result(&mut *self.conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .ok_or_else(|| UserPersistenceError::not_found(id))?;
        into_user(row)
    }

    async fn delete_user(&mut self, id: UserId) -> Result<(), UserPersistenceError> {
        let deleted = diesel::delete(users::table.find(id.get()))
            .execute(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;
        if deleted == 0 {
            return Err(UserPersistenceError::not_found(id.get()));
        }
        Ok(())
    }

    async fn create_audit_log(&mut self, entry: &AuditLogEntry) -> Result<(), UserPersistenceError> {
        diesel::insert_into(audit_logs::table)
            .values(NewAuditLogRow::from(entry))
            .execute(&mut *self.conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}
