pub mod memory;
pub mod models;
pub mod mongo;
pub mod provision;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryUserStore;
pub use models::UserRecord;
pub use mongo::MongoUserStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already registered: {0}")]
    Duplicate(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(e: mongodb::error::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// Account lookup and creation. Implementations must be safe to share across
/// request tasks.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Inserts a new account, failing with [`StoreError::Duplicate`] if the
    /// username is already taken.
    async fn insert_user(&self, user: &UserRecord) -> Result<(), StoreError>;
}
