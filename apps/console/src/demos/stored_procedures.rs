use anyhow::Result;
use document_client::{links, DocumentClient, FeedOptions, RequestOptions};
use serde::Deserialize;
use serde_json::{json, Value};
use shared::resource::PartitionKey;

use crate::config::Settings;
use crate::dispatch::flatten_error;

use super::{banner, connect, DATABASE_ID, STORE_COLLECTION_ID};

const SPROCS: &[(&str, &str)] = &[
    ("spHelloWorld", include_str!("../../scripts/spHelloWorld.js")),
    ("spSetNorthAmerica", include_str!("../../scripts/spSetNorthAmerica.js")),
    ("spEnsureUniqueId", include_str!("../../scripts/spEnsureUniqueId.js")),
    ("spBulkInsert", include_str!("../../scripts/spBulkInsert.js")),
    ("spBulkDelete", include_str!("../../scripts/spBulkDelete.js")),
];

const BULK_PARTITION: &str = "12345";
const BULK_COUNT: usize = 5000;

/// Shape of spBulkDelete's response body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkDeleteResponse {
    count: u32,
    continuation_flag: bool,
}

pub async fn run(settings: Settings) -> Result<()> {
    banner("Stored Procedures");
    let client = connect(&settings)?;
    let collection_link = links::collection(DATABASE_ID, STORE_COLLECTION_ID);

    create_stored_procedures(&client, &collection_link).await?;
    view_stored_procedures(&client, &collection_link).await?;

    execute_hello_world(&client).await?;
    execute_set_north_america(&client, &collection_link).await?;
    execute_ensure_unique_id(&client).await?;
    execute_bulk_insert(&client).await?;
    execute_bulk_delete(&client).await?;

    delete_stored_procedures(&client, &collection_link).await?;
    Ok(())
}

async fn create_stored_procedures(client: &DocumentClient, collection_link: &str) -> Result<()> {
    println!("**** Create Stored Procedures ****");
    for (id, body) in SPROCS {
        let sproc = client
            .create_stored_procedure(collection_link, id, body)
            .await?;
        println!("Created stored procedure {}; rid: {}", sproc.id, sproc.meta.resource_id);
    }
    println!();
    Ok(())
}

async fn view_stored_procedures(client: &DocumentClient, collection_link: &str) -> Result<()> {
    println!("**** View Stored Procedures ****");
    let sprocs = client.list_stored_procedures(collection_link).await?;
    for sproc in &sprocs {
        println!("  Stored procedure id: {}; rid: {}", sproc.id, sproc.meta.resource_id);
    }
    println!("Total stored procedures: {}", sprocs.len());
    println!();
    Ok(())
}

async fn execute_hello_world(client: &DocumentClient) -> Result<()> {
    println!("**** Execute spHelloWorld ****");
    let reply: String = client
        .execute_stored_procedure(
            &links::stored_procedure(DATABASE_ID, STORE_COLLECTION_ID, "spHelloWorld"),
            &RequestOptions::with_partition_key(PartitionKey::string("11229")),
            &json!([]),
        )
        .await?;
    println!("Result: {reply}");
    println!();
    Ok(())
}

/// The script stamps `isNorthAmerica` from the address country before
/// creating the document. A document with no country is rejected by the
/// script; that rejection is the demo, so it is reported and swallowed.
async fn execute_set_north_america(client: &DocumentClient, collection_link: &str) -> Result<()> {
    println!("**** Execute spSetNorthAmerica ****");

    set_north_america(client, "Sproc Customer 1", Some("United States")).await?;
    set_north_america(client, "Sproc Customer 2", Some("United Kingdom")).await?;
    if let Err(err) = set_north_america(client, "Sproc Customer 3", None).await {
        println!("Expected failure for a document without a country:");
        println!("{}", flatten_error(&err));
    }

    // Clear out whatever the script created.
    let created: Vec<Value> = client
        .query_documents_all(
            collection_link,
            "SELECT c.id, c.address.postalCode AS postalCode FROM c \
             WHERE STARTSWITH(c.name, 'Sproc Customer') = true",
            FeedOptions::cross_partition(),
        )
        .await?;
    for row in &created {
        let id = row["id"].as_str().unwrap_or_default();
        let postal_code = row["postalCode"].as_str().unwrap_or_default();
        client
            .delete_document(
                &links::document(DATABASE_ID, STORE_COLLECTION_ID, id),
                &RequestOptions::with_partition_key(PartitionKey::string(postal_code)),
            )
            .await?;
    }
    println!();
    Ok(())
}

async fn set_north_america(
    client: &DocumentClient,
    name: &str,
    country: Option<&str>,
) -> Result<()> {
    let mut address = json!({ "postalCode": "11229" });
    if let Some(country) = country {
        address["countryRegionName"] = Value::String(country.to_string());
    }
    let document = json!({ "name": name, "address": address });

    let created: Value = client
        .execute_stored_procedure(
            &links::stored_procedure(DATABASE_ID, STORE_COLLECTION_ID, "spSetNorthAmerica"),
            &RequestOptions::with_partition_key(PartitionKey::string("11229")),
            &json!([document]),
        )
        .await?;
    println!(
        "Created {name}; isNorthAmerica = {}",
        created["isNorthAmerica"]
    );
    Ok(())
}

/// Submit three documents with the same id; the script keeps the first and
/// rewrites the colliding ones.
async fn execute_ensure_unique_id(client: &DocumentClient) -> Result<()> {
    println!("**** Execute spEnsureUniqueId ****");
    let sproc_link = links::stored_procedure(DATABASE_ID, STORE_COLLECTION_ID, "spEnsureUniqueId");
    let options = RequestOptions::with_partition_key(PartitionKey::string("11229"));

    let mut created_ids = Vec::new();
    for n in 1..=3 {
        let document = json!({
            "id": "DUPEJ",
            "name": format!("Duplicate Id Customer {n}"),
            "address": { "postalCode": "11229" }
        });
        let created: Value = client
            .execute_stored_procedure(&sproc_link, &options, &json!([document]))
            .await?;
        println!("Submitted id DUPEJ; stored with id {}", created["id"]);
        if let Some(id) = created["id"].as_str() {
            created_ids.push(id.to_string());
        }
    }

    for id in &created_ids {
        client
            .delete_document(&links::document(DATABASE_ID, STORE_COLLECTION_ID, id), &options)
            .await?;
    }
    println!();
    Ok(())
}

/// The script inserts as many documents as it can before its execution is
/// bounded, returning the count; the client keeps calling with the remainder.
async fn execute_bulk_insert(client: &DocumentClient) -> Result<()> {
    println!("**** Execute spBulkInsert ****");
    let documents: Vec<Value> = (1..=BULK_COUNT)
        .map(|n| {
            json!({
                "name": format!("Bulk inserted doc {n}"),
                "address": { "postalCode": BULK_PARTITION }
            })
        })
        .collect();

    let sproc_link = links::stored_procedure(DATABASE_ID, STORE_COLLECTION_ID, "spBulkInsert");
    let options = RequestOptions::with_partition_key(PartitionKey::string(BULK_PARTITION));

    let mut inserted = 0;
    while inserted < documents.len() {
        let batch: u32 = client
            .execute_stored_procedure(&sproc_link, &options, &json!([&documents[inserted..]]))
            .await?;
        if batch == 0 {
            anyhow::bail!("bulk insert made no progress after {inserted} documents");
        }
        inserted += batch as usize;
        println!("Inserted {batch} documents ({inserted} of {})", documents.len());
    }
    println!();
    Ok(())
}

async fn execute_bulk_delete(client: &DocumentClient) -> Result<()> {
    println!("**** Execute spBulkDelete ****");
    let sproc_link = links::stored_procedure(DATABASE_ID, STORE_COLLECTION_ID, "spBulkDelete");
    let options = RequestOptions::with_partition_key(PartitionKey::string(BULK_PARTITION));
    let query = "SELECT * FROM c WHERE STARTSWITH(c.name, 'Bulk inserted doc') = true";

    let mut deleted = 0;
    loop {
        let response: BulkDeleteResponse = client
            .execute_stored_procedure(&sproc_link, &options, &json!([query]))
            .await?;
        deleted += response.count;
        println!("Deleted {} documents ({deleted} so far)", response.count);
        if !response.continuation_flag {
            break;
        }
    }
    println!("Deleted {deleted} bulk inserted documents");
    println!();
    Ok(())
}

async fn delete_stored_procedures(client: &DocumentClient, collection_link: &str) -> Result<()> {
    println!("**** Delete Stored Procedures ****");
    for sproc in client.list_stored_procedures(collection_link).await? {
        client
            .delete_stored_procedure(&links::stored_procedure(
                DATABASE_ID,
                STORE_COLLECTION_ID,
                &sproc.id,
            ))
            .await?;
        println!("Deleted stored procedure {}", sproc.id);
    }
    println!();
    Ok(())
}
