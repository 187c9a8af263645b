use anyhow::Result;
use document_client::{links, DocumentClient, FeedOptions, RequestOptions};
use serde_json::{json, Value};
use shared::document::Document;
use shared::resource::PartitionKey;

use crate::config::Settings;

use super::{banner, connect, DATABASE_ID, STORE_COLLECTION_ID};

const UDFS: &[(&str, &str)] = &[
    ("udfRegEx", include_str!("../../scripts/udfRegEx.js")),
    ("udfIsNorthAmerica", include_str!("../../scripts/udfIsNorthAmerica.js")),
    ("udfFormatCityStateZip", include_str!("../../scripts/udfFormatCityStateZip.js")),
];

pub async fn run(settings: Settings) -> Result<()> {
    banner("User Defined Functions");
    let client = connect(&settings)?;
    let collection_link = links::collection(DATABASE_ID, STORE_COLLECTION_ID);

    create_udfs(&client, &collection_link).await?;
    view_udfs(&client, &collection_link).await?;

    create_sample_customers(&client, &collection_link).await?;
    execute_regex(&client, &collection_link).await?;
    execute_is_north_america(&client, &collection_link).await?;
    execute_format_city_state_zip(&client, &collection_link).await?;
    delete_sample_customers(&client, &collection_link).await?;

    delete_udfs(&client, &collection_link).await?;
    Ok(())
}

async fn create_udfs(client: &DocumentClient, collection_link: &str) -> Result<()> {
    println!("**** Create User Defined Functions ****");
    for (id, body) in UDFS {
        let udf = client
            .create_user_defined_function(collection_link, id, body)
            .await?;
        println!("Created UDF {}; rid: {}", udf.id, udf.meta.resource_id);
    }
    println!();
    Ok(())
}

async fn view_udfs(client: &DocumentClient, collection_link: &str) -> Result<()> {
    println!("**** View User Defined Functions ****");
    let udfs = client.list_user_defined_functions(collection_link).await?;
    for udf in &udfs {
        println!("  UDF id: {}; rid: {}", udf.id, udf.meta.resource_id);
    }
    println!("Total UDFs: {}", udfs.len());
    println!();
    Ok(())
}

async fn create_sample_customers(client: &DocumentClient, collection_link: &str) -> Result<()> {
    let customers = [
        ("Udf Customer Rental Cars", "Brooklyn", "New York", "11229", "United States"),
        ("Udf Customer Bike Shop", "Seattle", "Washington", "98101", "United States"),
        ("Udf Customer Tea House", "London", "England", "W1 3AL", "United Kingdom"),
    ];
    for (name, city, state, postal_code, country) in customers {
        let body = json!({
            "name": name,
            "address": {
                "location": { "city": city, "stateProvinceName": state },
                "postalCode": postal_code,
                "countryRegionName": country
            }
        });
        client
            .create_document(
                collection_link,
                Document::from_value(body)?,
                &RequestOptions::with_partition_key(PartitionKey::string(postal_code)),
            )
            .await?;
    }
    Ok(())
}

async fn execute_regex(client: &DocumentClient, collection_link: &str) -> Result<()> {
    println!("**** Query with udfRegEx ****");
    let rows: Vec<Value> = client
        .query_documents_all(
            collection_link,
            "SELECT c.name FROM c WHERE udf.udfRegEx(c.name, 'Rental') != null",
            FeedOptions::cross_partition(),
        )
        .await?;
    for row in &rows {
        println!("  Matched {}", row["name"]);
    }
    println!("Found {} documents matching the pattern\n", rows.len());
    Ok(())
}

async fn execute_is_north_america(client: &DocumentClient, collection_link: &str) -> Result<()> {
    println!("**** Query with udfIsNorthAmerica ****");
    for expected in [true, false] {
        let sql = format!(
            "SELECT c.name, c.address.countryRegionName AS country FROM c \
             WHERE udf.udfIsNorthAmerica(c.address.countryRegionName) = {expected} \
             AND STARTSWITH(c.name, 'Udf Customer') = true"
        );
        let rows: Vec<Value> = client
            .query_documents_all(collection_link, &sql, FeedOptions::cross_partition())
            .await?;
        println!("Customers where North America = {expected}:");
        for row in &rows {
            println!("  {} ({})", row["name"], row["country"]);
        }
    }
    println!();
    Ok(())
}

async fn execute_format_city_state_zip(
    client: &DocumentClient,
    collection_link: &str,
) -> Result<()> {
    println!("**** Query with udfFormatCityStateZip ****");
    let rows: Vec<Value> = client
        .query_documents_all(
            collection_link,
            "SELECT c.name, udf.udfFormatCityStateZip(c) AS cityStateZip FROM c \
             WHERE STARTSWITH(c.name, 'Udf Customer') = true",
            FeedOptions::cross_partition(),
        )
        .await?;
    for row in &rows {
        println!("  {}: {}", row["name"], row["cityStateZip"]);
    }
    println!();
    Ok(())
}

async fn delete_sample_customers(client: &DocumentClient, collection_link: &str) -> Result<()> {
    let rows: Vec<Value> = client
        .query_documents_all(
            collection_link,
            "SELECT c.id, c.address.postalCode AS postalCode FROM c \
             WHERE STARTSWITH(c.name, 'Udf Customer') = true",
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
    Ok(())
}

async fn delete_udfs(client: &DocumentClient, collection_link: &str) -> Result<()> {
    println!("**** Delete User Defined Functions ****");
    for udf in client.list_user_defined_functions(collection_link).await? {
        client
            .delete_user_defined_function(&links::user_defined_function(
                DATABASE_ID,
                STORE_COLLECTION_ID,
                &udf.id,
            ))
            .await?;
        println!("Deleted UDF {}", udf.id);
    }
    println!();
    Ok(())
}
