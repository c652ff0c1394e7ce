//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod creation_events;
mod user_cache;
mod user_management;
mod user_repository;

#[cfg(test)]
pub use creation_events::MockCreationEventSource;
pub use creation_events::{CreationEventSource, CreationMessage, EventSourceError};
#[cfg(test)]
pub use user_cache::MockUserCache;
pub use user_cache::{UserCache, UserCacheError};
#[cfg(test)]
pub use user_management::MockUserManagement;
pub use user_management::{UserManagement, UserServiceError};
pub use user_repository::{
    RepositoryWork, TransactionManager, UserPersistenceError, UserRepository, UserStore,
    repository_work,
};
