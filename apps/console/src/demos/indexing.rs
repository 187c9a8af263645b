use anyhow::Result;
use document_client::{links, DocumentClient, FeedOptions, RequestOptions};
use serde_json::{json, Value};
use shared::document::Document;
use shared::indexing::{
    DataType, ExcludedPath, IncludedPath, Index, IndexingDirective, IndexingPolicy,
};
use shared::resource::{Collection, PartitionKey};

use crate::config::Settings;

use super::{banner, connect, DATABASE_ID};

pub async fn run(settings: Settings) -> Result<()> {
    banner("Indexing");
    let client = connect(&settings)?;
    let database_link = links::database(DATABASE_ID);

    automatic_indexing(&client, &database_link).await?;
    manual_indexing(&client, &database_link).await?;
    custom_index_paths(&client, &database_link).await?;

    Ok(())
}

/// Every document is indexed unless a request opts out.
async fn automatic_indexing(client: &DocumentClient, database_link: &str) -> Result<()> {
    println!("**** Automatic Indexing ****");
    let collection_id = "autoindexing";
    client
        .create_collection(
            database_link,
            Collection::definition(collection_id, "/partitionKey"),
            &RequestOptions::default(),
        )
        .await?;
    let collection_link = links::collection(DATABASE_ID, collection_id);

    create_book(client, &collection_link, "Document A", None).await?;
    create_book(
        client,
        &collection_link,
        "Document B",
        Some(IndexingDirective::Exclude),
    )
    .await?;

    let found = count_by_title(client, &collection_link, "Document A").await?;
    println!("Documents indexed automatically and found by query: {found}");
    let found = count_by_title(client, &collection_link, "Document B").await?;
    println!("Documents excluded from the index and found by query: {found}");

    client.delete_collection(&collection_link).await?;
    println!();
    Ok(())
}

/// Nothing is indexed unless a request opts in.
async fn manual_indexing(client: &DocumentClient, database_link: &str) -> Result<()> {
    println!("**** Manual Indexing ****");
    let collection_id = "manualindexing";
    client
        .create_collection(
            database_link,
            Collection::definition(collection_id, "/partitionKey")
                .with_indexing_policy(IndexingPolicy::manual()),
            &RequestOptions::default(),
        )
        .await?;
    let collection_link = links::collection(DATABASE_ID, collection_id);

    create_book(client, &collection_link, "Document C", None).await?;
    create_book(
        client,
        &collection_link,
        "Document D",
        Some(IndexingDirective::Include),
    )
    .await?;

    let found = count_by_title(client, &collection_link, "Document C").await?;
    println!("Documents left unindexed and found by query: {found}");
    let found = count_by_title(client, &collection_link, "Document D").await?;
    println!("Documents indexed on request and found by query: {found}");

    client.delete_collection(&collection_link).await?;
    println!();
    Ok(())
}

/// Range index on titles for sorting, everything else hash+range, and a
/// subtree excluded from indexing entirely.
async fn custom_index_paths(client: &DocumentClient, database_link: &str) -> Result<()> {
    println!("**** Custom Index Paths ****");
    let policy = IndexingPolicy {
        included_paths: vec![
            IncludedPath::new(
                "/title/?",
                vec![Index::Range {
                    data_type: DataType::String,
                }],
            ),
            IncludedPath::new(
                "/*",
                vec![
                    Index::Hash {
                        data_type: DataType::String,
                    },
                    Index::Range {
                        data_type: DataType::Number,
                    },
                ],
            ),
        ],
        excluded_paths: vec![ExcludedPath::new("/misc/*")],
        ..IndexingPolicy::default()
    };

    let collection_id = "customindexing";
    client
        .create_collection(
            database_link,
            Collection::definition(collection_id, "/partitionKey")
                .with_indexing_policy(policy),
            &RequestOptions::default(),
        )
        .await?;
    let collection_link = links::collection(DATABASE_ID, collection_id);

    for (title, rank) in [("War and Peace", 1), ("Moby Dick", 2), ("Ulysses", 3)] {
        let document = Document::from_value(json!({
            "title": title,
            "rank": rank,
            "partitionKey": "books",
            "misc": { "notes": "not indexed" }
        }))?;
        client
            .create_document(
                &collection_link,
                document,
                &RequestOptions::with_partition_key(PartitionKey::string("books")),
            )
            .await?;
    }

    println!("Sorting on the range-indexed title path");
    let titles: Vec<Value> = client
        .query_documents_all(
            &collection_link,
            "SELECT c.title FROM c ORDER BY c.title",
            FeedOptions::cross_partition(),
        )
        .await?;
    for title in &titles {
        println!("  {title}");
    }

    println!("Filtering on the excluded path needs a scan");
    let rows: Vec<Value> = client
        .query_documents_all(
            &collection_link,
            "SELECT c.title FROM c WHERE c.misc.notes = 'not indexed'",
            FeedOptions::cross_partition().with_scan(),
        )
        .await?;
    println!("  Scan found {} documents", rows.len());

    client.delete_collection(&collection_link).await?;
    println!();
    Ok(())
}

async fn create_book(
    client: &DocumentClient,
    collection_link: &str,
    title: &str,
    directive: Option<IndexingDirective>,
) -> Result<()> {
    let document = Document::from_value(json!({ "title": title, "partitionKey": "books" }))?;
    let options = RequestOptions {
        partition_key: Some(PartitionKey::string("books")),
        indexing_directive: directive,
        ..RequestOptions::default()
    };
    client
        .create_document(collection_link, document, &options)
        .await?;
    Ok(())
}

async fn count_by_title(
    client: &DocumentClient,
    collection_link: &str,
    title: &str,
) -> Result<usize> {
    let sql = format!("SELECT * FROM c WHERE c.title = '{title}'");
    let rows: Vec<Value> = client
        .query_documents_all(collection_link, &sql, FeedOptions::cross_partition())
        .await?;
    Ok(rows.len())
}
