use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Database, IndexModel};
use tracing::info;

use crate::StoreError;
use crate::models::UserRecord;

pub const USERS: &str = "users";
/// Provisioned for parity with the deployed layout; poll state lives on-chain.
pub const POLLS: &str = "polls";

pub async fn run(db: &Database) -> Result<(), StoreError> {
    let existing = db.list_collection_names().await?;

    for name in [USERS, POLLS] {
        if existing.iter().any(|c| c == name) {
            info!("'{}' collection already exists", name);
        } else {
            db.create_collection(name).await?;
            info!("Created '{}' collection", name);
        }
    }

    // Closes the window between the duplicate check and the insert.
    let index = IndexModel::builder()
        .keys(doc! { "username": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    db.collection::<UserRecord>(USERS).create_index(index).await?;

    info!("Database provisioning complete");
    Ok(())
}
