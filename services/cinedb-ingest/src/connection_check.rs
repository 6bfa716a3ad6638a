//! `test-connection`: prove the configured deployment accepts reads and
//! writes before running a full import.

use mongodb::bson::{self, doc, Document};
use tracing::warn;

use cinedb_core::{CoreError, CoreResult, ImportConfig};
use cinedb_storage::{MongoMovieStore, MovieStore};

/// Collection the check document is written to.
pub const CHECK_COLLECTION: &str = "test";

pub fn check_document(timestamp: bson::DateTime) -> Document {
    doc! {
        "title": "Connection test",
        "timestamp": timestamp,
        "status": "success",
    }
}

/// Ping, then insert, read back and delete a check document.
pub async fn check_connection(config: &ImportConfig) -> CoreResult<()> {
    println!("🔗 Testing connection to MongoDB...");
    let store = MongoMovieStore::connect(config).await?;
    println!("✅ Connected (ping ok)");

    let result = round_trip_check(&store).await;

    if let Err(e) = store.close().await {
        warn!("Failed to close connection: {}", e);
    }
    result
}

async fn round_trip_check(store: &MongoMovieStore) -> CoreResult<()> {
    let collection = store.database().collection::<Document>(CHECK_COLLECTION);

    let inserted = collection
        .insert_one(check_document(bson::DateTime::now()))
        .await
        .map_err(|e| CoreError::storage(e.to_string()))?;
    println!("✅ Check document inserted: {}", inserted.inserted_id);

    let found = collection
        .find_one(doc! { "_id": inserted.inserted_id.clone() })
        .await
        .map_err(|e| CoreError::storage(e.to_string()))?
        .ok_or_else(|| CoreError::storage("check document not found after insert"))?;
    println!(
        "✅ Check document found: {}",
        found.get_str("title").unwrap_or("<untitled>")
    );

    collection
        .delete_one(doc! { "_id": inserted.inserted_id })
        .await
        .map_err(|e| CoreError::storage(e.to_string()))?;
    println!("🧹 Check document removed");

    Ok(())
}

pub fn print_troubleshooting() {
    println!("\n💡 Check that:");
    println!("  1. MONGO_CONNECTION_STRING in .env is correct");
    println!("  2. The user name and password are correct");
    println!("  3. Your IP address is allowed by the cluster's network access list");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_document_shape() {
        let now = bson::DateTime::from_millis(1_700_000_000_000);
        let check = check_document(now);

        assert_eq!(check.get_str("title").unwrap(), "Connection test");
        assert_eq!(check.get_str("status").unwrap(), "success");
        assert_eq!(check.get_datetime("timestamp").unwrap(), &now);
        assert!(!check.contains_key("_id"));
    }
}
