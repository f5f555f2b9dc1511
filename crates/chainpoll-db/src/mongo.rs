use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::{Client, Collection};
use tracing::{debug, info};

use crate::models::UserRecord;
use crate::provision::{self, USERS};
use crate::{StoreError, UserStore};

const DUPLICATE_KEY: i32 = 11000;

/// MongoDB-backed credential store.
#[derive(Clone)]
pub struct MongoUserStore {
    users: Collection<UserRecord>,
}

impl MongoUserStore {
    /// Connects, checks the server answers a ping, and provisions collections.
    pub async fn connect(url: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(url).await?;
        let db = client.database(database);

        db.run_command(doc! { "ping": 1 }).await?;
        info!("Connected to MongoDB database '{}'", database);

        provision::run(&db).await?;

        Ok(Self {
            users: db.collection(USERS),
        })
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.find_one(doc! { "username": username }).await?)
    }

    async fn insert_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        if self.find_user(&user.username).await?.is_some() {
            return Err(StoreError::Duplicate(user.username.clone()));
        }

        match self.users.insert_one(user).await {
            Ok(_) => {
                debug!("Inserted user {}", user.id);
                Ok(())
            }
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate(user.username.clone())),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(w)) if w.code == DUPLICATE_KEY
    )
}
