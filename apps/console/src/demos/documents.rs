use anyhow::Result;
use document_client::{links, DocumentClient, FeedOptions, RequestOptions};
use serde_json::{json, Value};
use shared::document::Document;
use shared::resource::PartitionKey;

use crate::config::Settings;

use super::{banner, connect, customer::Customer, DATABASE_ID, STORE_COLLECTION_ID};

pub async fn run(settings: Settings) -> Result<()> {
    banner("Documents");
    let client = connect(&settings)?;
    let collection_link = links::collection(DATABASE_ID, STORE_COLLECTION_ID);

    create_documents(&client, &collection_link).await?;
    query_documents_with_sql(&client, &collection_link).await?;
    query_documents_with_paging(&client, &collection_link).await?;
    query_uk_customers(&client, &collection_link).await?;
    replace_documents(&client, &collection_link).await?;
    delete_documents(&client, &collection_link).await?;

    Ok(())
}

async fn create_documents(client: &DocumentClient, collection_link: &str) -> Result<()> {
    println!("**** Create Documents ****");

    // From a JSON value built in code.
    let value_doc = Document::from_value(json!({
        "name": "New Customer 1",
        "address": {
            "addressType": "Main Office",
            "addressLine1": "123 Main Street",
            "location": { "city": "Brooklyn", "stateProvinceName": "New York" },
            "postalCode": "11229",
            "countryRegionName": "United States"
        }
    }))?;
    let created = create_document(client, collection_link, value_doc, "11229").await?;
    println!("Created document from JSON value, id {}", display_id(&created));

    // From raw JSON text, the way a payload arrives off the wire.
    let raw = r#"
    {
        "name": "New Customer 2",
        "address": {
            "addressType": "Main Office",
            "addressLine1": "123 Main Street",
            "location": { "city": "London", "stateProvinceName": "England" },
            "postalCode": "W1 3AL",
            "countryRegionName": "United Kingdom"
        }
    }"#;
    let created =
        create_document(client, collection_link, Document::from_json_str(raw)?, "W1 3AL").await?;
    println!("Created document from JSON text, id {}", display_id(&created));

    // From a typed payload.
    let customer = Customer::new(
        "New Customer 3",
        "123 Main Street",
        "Brooklyn",
        "New York",
        "11229",
        "United States",
    );
    let created = create_document(
        client,
        collection_link,
        Document::from_typed(&customer)?,
        "11229",
    )
    .await?;
    println!("Created document from typed payload, id {}", display_id(&created));
    println!();
    Ok(())
}

async fn create_document(
    client: &DocumentClient,
    collection_link: &str,
    document: Document,
    postal_code: &str,
) -> Result<Document> {
    let options = RequestOptions::with_partition_key(PartitionKey::string(postal_code));
    Ok(client
        .create_document(collection_link, document, &options)
        .await?)
}

async fn query_documents_with_sql(client: &DocumentClient, collection_link: &str) -> Result<()> {
    println!("**** Query Documents (SQL) ****");
    let sql = "SELECT * FROM c WHERE STARTSWITH(c.name, 'New Customer') = true";

    println!("Querying for new customer documents (dynamic)");
    let documents: Vec<Document> = client
        .query_documents_all(collection_link, sql, FeedOptions::cross_partition())
        .await?;
    for document in &documents {
        println!(
            "  Found document id {}; name {}",
            display_id(document),
            document
                .get_path("name")
                .and_then(Value::as_str)
                .unwrap_or("(unnamed)")
        );
    }
    println!("Retrieved {} documents as dynamic\n", documents.len());

    println!("Querying for new customer documents (typed)");
    let customers: Vec<Customer> = client
        .query_documents_all(collection_link, sql, FeedOptions::cross_partition())
        .await?;
    for customer in &customers {
        println!(
            "  Found customer {}; city {}",
            customer.name, customer.address.location.city
        );
    }
    println!("Retrieved {} documents as typed\n", customers.len());
    Ok(())
}

async fn query_documents_with_paging(client: &DocumentClient, collection_link: &str) -> Result<()> {
    println!("**** Query Documents (paged results) ****");

    let options = FeedOptions {
        max_item_count: Some(100),
        ..FeedOptions::cross_partition()
    };
    let mut iterator =
        client.query_documents::<Document>(collection_link, "SELECT * FROM c", options);

    let mut page_number = 0;
    let mut total = 0;
    while iterator.has_more_results() {
        let page = iterator.execute_next().await?;
        page_number += 1;
        total += page.len();
        println!("Page {page_number}: {} documents", page.len());
    }
    println!("Retrieved {total} documents across {page_number} pages\n");
    Ok(())
}

async fn query_uk_customers(client: &DocumentClient, collection_link: &str) -> Result<()> {
    println!("**** Query UK Customers (projection) ****");
    let sql = "SELECT c.name, c.address.location.city FROM c \
               WHERE c.address.countryRegionName = 'United Kingdom'";

    let rows: Vec<Value> = client
        .query_documents_all(collection_link, sql, FeedOptions::cross_partition())
        .await?;
    for row in &rows {
        println!("  {row}");
    }
    println!("Found {} UK customers\n", rows.len());
    Ok(())
}

async fn replace_documents(client: &DocumentClient, collection_link: &str) -> Result<()> {
    println!("**** Replace Documents ****");

    let flagged = "SELECT VALUE COUNT(c) FROM c WHERE c.isNew = true";
    let count: Vec<i64> = client
        .query_documents_all(collection_link, flagged, FeedOptions::cross_partition())
        .await?;
    println!("Documents with 'isNew' flag: {}", count.first().copied().unwrap_or(0));

    println!("Querying for documents to update");
    let documents: Vec<Document> = client
        .query_documents_all(
            collection_link,
            "SELECT * FROM c WHERE STARTSWITH(c.name, 'New Customer') = true",
            FeedOptions::cross_partition(),
        )
        .await?;
    println!("Found {} documents to update", documents.len());

    for mut document in documents {
        let customer: Customer = document.to_typed()?;
        document.set("isNew", Value::Bool(true));
        let self_link = document
            .self_link()
            .map(str::to_string)
            .unwrap_or_default();
        let options = partition_key_options(&document);
        let replaced = client
            .replace_document(&self_link, &document, &options)
            .await?;
        println!(
            "  Updated {}; new etag {}",
            customer.name,
            replaced.etag().unwrap_or_default()
        );
    }
    println!("Updated documents with 'isNew' flag");

    let count: Vec<i64> = client
        .query_documents_all(collection_link, flagged, FeedOptions::cross_partition())
        .await?;
    println!(
        "Documents with 'isNew' flag: {}\n",
        count.first().copied().unwrap_or(0)
    );
    Ok(())
}

async fn delete_documents(client: &DocumentClient, collection_link: &str) -> Result<()> {
    println!("**** Delete Documents ****");

    println!("Querying for documents to delete");
    let documents: Vec<Document> = client
        .query_documents_all(
            collection_link,
            "SELECT c.id, c.address.postalCode AS postalCode FROM c \
             WHERE STARTSWITH(c.name, 'New Customer') = true",
            FeedOptions::cross_partition(),
        )
        .await?;
    println!("Found {} documents to delete", documents.len());

    for document in &documents {
        let id = document.id().unwrap_or_default();
        let postal_code = document
            .get_path("postalCode")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let link = links::document(DATABASE_ID, STORE_COLLECTION_ID, id);
        let options = RequestOptions::with_partition_key(PartitionKey::string(postal_code));
        client.delete_document(&link, &options).await?;
    }
    println!("Deleted {} new customer documents\n", documents.len());
    Ok(())
}

fn partition_key_options(document: &Document) -> RequestOptions {
    let postal_code = document
        .get_path("address.postalCode")
        .and_then(Value::as_str)
        .unwrap_or_default();
    RequestOptions::with_partition_key(PartitionKey::string(postal_code))
}

fn display_id(document: &Document) -> &str {
    document.id().unwrap_or("(no id)")
}
