use anyhow::Result;
use document_client::{links, DocumentClient, RequestOptions};
use shared::resource::Collection;

use crate::config::Settings;

use super::{banner, connect, DATABASE_ID};

pub async fn run(settings: Settings) -> Result<()> {
    banner("Collections");
    let client = connect(&settings)?;
    let database_link = links::database(DATABASE_ID);

    view_collections(&client, &database_link).await?;

    // Baseline throughput, then an explicitly scaled-out collection.
    create_collection(&client, &database_link, "MyCollection1", 1000).await?;
    create_collection(&client, &database_link, "MyCollection2", 25000).await?;

    view_collections(&client, &database_link).await?;

    delete_collection(&client, "MyCollection1").await?;
    delete_collection(&client, "MyCollection2").await?;

    Ok(())
}

async fn view_collections(client: &DocumentClient, database_link: &str) -> Result<()> {
    println!("**** View Collections in {DATABASE_ID} ****");
    let collections = client.list_collections(database_link).await?;

    for collection in &collections {
        print_collection(collection);
    }
    println!("Total collections in {DATABASE_ID} database: {}", collections.len());
    println!();
    Ok(())
}

async fn create_collection(
    client: &DocumentClient,
    database_link: &str,
    collection_id: &str,
    throughput: u32,
) -> Result<()> {
    println!("**** Create Collection {collection_id} at {throughput} RU/sec ****");

    let options = RequestOptions {
        offer_throughput: Some(throughput),
        ..RequestOptions::default()
    };
    let collection = client
        .create_collection(
            database_link,
            Collection::definition(collection_id, "/partitionKey"),
            &options,
        )
        .await?;

    println!("Created new collection:");
    print_collection(&collection);
    println!();
    Ok(())
}

async fn delete_collection(client: &DocumentClient, collection_id: &str) -> Result<()> {
    println!("**** Delete Collection {collection_id} ****");
    client
        .delete_collection(&links::collection(DATABASE_ID, collection_id))
        .await?;
    println!("Deleted collection {collection_id}");
    println!();
    Ok(())
}

fn print_collection(collection: &Collection) {
    println!(
        "  Collection id: {}; partition key: {}; rid: {}",
        collection.id,
        collection.partition_key.paths.join(","),
        collection.meta.resource_id
    );
}
