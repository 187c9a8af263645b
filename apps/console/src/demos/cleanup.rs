use anyhow::Result;
use document_client::{links, DocumentClient, FeedOptions, RequestOptions};
use serde_json::Value;
use shared::resource::PartitionKey;

use crate::config::Settings;

use super::{banner, connect, DATABASE_ID, STORE_COLLECTION_ID};

/// Remove everything any demo may have left behind in `mydb`/`mystore`,
/// leaving the fixtures themselves in place.
pub async fn run(settings: Settings) -> Result<()> {
    banner("Cleanup");
    let client = connect(&settings)?;
    let collection_link = links::collection(DATABASE_ID, STORE_COLLECTION_ID);

    delete_documents(&client, &collection_link).await?;
    delete_stored_procedures(&client, &collection_link).await?;
    delete_triggers(&client, &collection_link).await?;
    delete_udfs(&client, &collection_link).await?;
    delete_users(&client).await?;

    println!("Cleanup complete");
    Ok(())
}

async fn delete_documents(client: &DocumentClient, collection_link: &str) -> Result<()> {
    println!("Deleting all documents in {STORE_COLLECTION_ID}");
    let rows: Vec<Value> = client
        .query_documents_all(
            collection_link,
            "SELECT c.id, c.address.postalCode AS postalCode FROM c",
            FeedOptions::cross_partition(),
        )
        .await?;
    for row in &rows {
        let id = row["id"].as_str().unwrap_or_default();
        let postal_code = row["postalCode"].as_str().unwrap_or_default();
        client
            .delete_document(
                &links::document(DATABASE_ID, STORE_COLLECTION_ID, id),
                &RequestOptions::with_partition_key(PartitionKey::string(postal_code)),
            )
            .await?;
    }
    println!("Deleted {} documents", rows.len());
    Ok(())
}

async fn delete_stored_procedures(client: &DocumentClient, collection_link: &str) -> Result<()> {
    let sprocs = client.list_stored_procedures(collection_link).await?;
    for sproc in &sprocs {
        client
            .delete_stored_procedure(&links::stored_procedure(
                DATABASE_ID,
                STORE_COLLECTION_ID,
                &sproc.id,
            ))
            .await?;
    }
    println!("Deleted {} stored procedures", sprocs.len());
    Ok(())
}

async fn delete_triggers(client: &DocumentClient, collection_link: &str) -> Result<()> {
    let triggers = client.list_triggers(collection_link).await?;
    for trigger in &triggers {
        client
            .delete_trigger(&links::trigger(DATABASE_ID, STORE_COLLECTION_ID, &trigger.id))
            .await?;
    }
    println!("Deleted {} triggers", triggers.len());
    Ok(())
}

async fn delete_udfs(client: &DocumentClient, collection_link: &str) -> Result<()> {
    let udfs = client.list_user_defined_functions(collection_link).await?;
    for udf in &udfs {
        client
            .delete_user_defined_function(&links::user_defined_function(
                DATABASE_ID,
                STORE_COLLECTION_ID,
                &udf.id,
            ))
            .await?;
    }
    println!("Deleted {} user defined functions", udfs.len());
    Ok(())
}

async fn delete_users(client: &DocumentClient) -> Result<()> {
    let users = client.list_users(&links::database(DATABASE_ID)).await?;
    for user in &users {
        client
            .delete_user(&links::user(DATABASE_ID, &user.id))
            .await?;
    }
    println!("Deleted {} users", users.len());
    Ok(())
}
