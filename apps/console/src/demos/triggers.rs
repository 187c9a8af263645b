use anyhow::Result;
use document_client::{links, DocumentClient, FeedOptions, RequestOptions};
use serde_json::{json, Value};
use shared::document::Document;
use shared::resource::{PartitionKey, ResourceMeta, Trigger, TriggerOperation, TriggerType};

use crate::config::Settings;
use crate::dispatch::flatten_error;

use super::{banner, connect, DATABASE_ID, STORE_COLLECTION_ID};

pub async fn run(settings: Settings) -> Result<()> {
    banner("Triggers");
    let client = connect(&settings)?;
    let collection_link = links::collection(DATABASE_ID, STORE_COLLECTION_ID);

    create_triggers(&client, &collection_link).await?;
    view_triggers(&client, &collection_link).await?;

    validate_document_demo(&client, &collection_link).await?;
    update_metadata_demo(&client, &collection_link).await?;

    delete_triggers(&client, &collection_link).await?;
    Ok(())
}

async fn create_triggers(client: &DocumentClient, collection_link: &str) -> Result<()> {
    println!("**** Create Triggers ****");

    let validate = Trigger {
        id: "trgValidateDocument".to_string(),
        body: include_str!("../../scripts/trgValidateDocument.js").to_string(),
        trigger_type: TriggerType::Pre,
        trigger_operation: TriggerOperation::All,
        meta: ResourceMeta::default(),
    };
    let metadata = Trigger {
        id: "trgUpdateMetadata".to_string(),
        body: include_str!("../../scripts/trgUpdateMetadata.js").to_string(),
        trigger_type: TriggerType::Post,
        trigger_operation: TriggerOperation::Create,
        meta: ResourceMeta::default(),
    };

    for definition in [validate, metadata] {
        let trigger = client.create_trigger(collection_link, definition).await?;
        println!(
            "Created trigger {}; type: {:?}; operation: {:?}",
            trigger.id, trigger.trigger_type, trigger.trigger_operation
        );
    }
    println!();
    Ok(())
}

async fn view_triggers(client: &DocumentClient, collection_link: &str) -> Result<()> {
    println!("**** View Triggers ****");
    let triggers = client.list_triggers(collection_link).await?;
    for trigger in &triggers {
        println!(
            "  Trigger id: {}; type: {:?}; operation: {:?}",
            trigger.id, trigger.trigger_type, trigger.trigger_operation
        );
    }
    println!("Total triggers: {}", triggers.len());
    println!();
    Ok(())
}

/// The pre-trigger requires a non-empty name and stamps a validation time.
/// The nameless document is rejected server-side; that rejection is the demo.
async fn validate_document_demo(client: &DocumentClient, collection_link: &str) -> Result<()> {
    println!("**** Execute trgValidateDocument ****");

    create_validated(client, collection_link, json!({ "name": "Trigger Customer 1", "address": { "postalCode": "11229" } })).await?;
    create_validated(client, collection_link, json!({ "name": "Trigger Customer 2", "address": { "postalCode": "11229" } })).await?;

    let nameless = json!({ "address": { "postalCode": "11229" } });
    if let Err(err) = create_validated(client, collection_link, nameless).await {
        println!("Expected failure for a document without a name:");
        println!("{}", flatten_error(&err));
    }

    delete_by_name_prefix(client, collection_link, "Trigger Customer").await?;
    println!();
    Ok(())
}

async fn create_validated(
    client: &DocumentClient,
    collection_link: &str,
    body: Value,
) -> Result<()> {
    let options = RequestOptions {
        partition_key: Some(PartitionKey::string("11229")),
        pre_trigger_include: vec!["trgValidateDocument".to_string()],
        ..RequestOptions::default()
    };
    let created = client
        .create_document(collection_link, Document::from_value(body)?, &options)
        .await?;
    println!(
        "Created document {}; validationTime = {}",
        created.id().unwrap_or_default(),
        created.get_path("validationTime").unwrap_or(&Value::Null)
    );
    Ok(())
}

/// The post-trigger maintains one `_metadata` document per partition with a
/// running count of created documents.
async fn update_metadata_demo(client: &DocumentClient, collection_link: &str) -> Result<()> {
    println!("**** Execute trgUpdateMetadata ****");

    for (name, postal_code) in [
        ("Metadata Customer 1", "11229"),
        ("Metadata Customer 2", "11229"),
        ("Metadata Customer 3", "55555"),
    ] {
        let options = RequestOptions {
            partition_key: Some(PartitionKey::string(postal_code)),
            post_trigger_include: vec!["trgUpdateMetadata".to_string()],
            ..RequestOptions::default()
        };
        let body = json!({ "name": name, "address": { "postalCode": postal_code } });
        client
            .create_document(collection_link, Document::from_value(body)?, &options)
            .await?;
        println!("Created {name} in partition {postal_code}");
    }

    let metadata: Vec<Value> = client
        .query_documents_all(
            collection_link,
            "SELECT c.address.postalCode AS postalCode, c.createdCount FROM c \
             WHERE c.isMetadata = true",
            FeedOptions::cross_partition(),
        )
        .await?;
    for row in &metadata {
        println!(
            "Partition {}: {} documents created",
            row["postalCode"], row["createdCount"]
        );
    }

    delete_by_name_prefix(client, collection_link, "Metadata Customer").await?;
    delete_metadata_documents(client, collection_link).await?;
    println!();
    Ok(())
}

async fn delete_by_name_prefix(
    client: &DocumentClient,
    collection_link: &str,
    prefix: &str,
) -> Result<()> {
    let sql = format!(
        "SELECT c.id, c.address.postalCode AS postalCode FROM c \
         WHERE STARTSWITH(c.name, '{prefix}') = true"
    );
    let rows: Vec<Value> = client
        .query_documents_all(collection_link, &sql, FeedOptions::cross_partition())
        .await?;
    for row in &rows {
        delete_row(client, row).await?;
    }
    Ok(())
}

async fn delete_metadata_documents(client: &DocumentClient, collection_link: &str) -> Result<()> {
    let rows: Vec<Value> = client
        .query_documents_all(
            collection_link,
            "SELECT c.id, c.address.postalCode AS postalCode FROM c WHERE c.isMetadata = true",
            FeedOptions::cross_partition(),
        )
        .await?;
    for row in &rows {
        delete_row(client, row).await?;
    }
    Ok(())
}

async fn delete_row(client: &DocumentClient, row: &Value) -> Result<()> {
    let id = row["id"].as_str().unwrap_or_default();
    let postal_code = row["postalCode"].as_str().unwrap_or_default();
    client
        .delete_document(
            &links::document(DATABASE_ID, STORE_COLLECTION_ID, id),
            &RequestOptions::with_partition_key(PartitionKey::string(postal_code)),
        )
        .await?;
    Ok(())
}

async fn delete_triggers(client: &DocumentClient, collection_link: &str) -> Result<()> {
    println!("**** Delete Triggers ****");
    for trigger in client.list_triggers(collection_link).await? {
        client
            .delete_trigger(&links::trigger(DATABASE_ID, STORE_COLLECTION_ID, &trigger.id))
            .await?;
        println!("Deleted trigger {}", trigger.id);
    }
    println!();
    Ok(())
}
