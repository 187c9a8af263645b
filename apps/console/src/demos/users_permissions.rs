use anyhow::{anyhow, Context, Result};
use document_client::{links, DocumentClient, RequestOptions};
use serde_json::json;
use shared::document::Document;
use shared::resource::{Permission, PermissionMode, User};

use crate::config::Settings;
use crate::dispatch::flatten_error;

use super::{banner, connect, DATABASE_ID, STORE_COLLECTION_ID};

pub async fn run(settings: Settings) -> Result<()> {
    banner("Users & Permissions");
    let client = connect(&settings)?;
    let database_link = links::database(DATABASE_ID);

    view_users(&client, &database_link).await?;

    let alice = create_user(&client, &database_link, "Alice").await?;
    let tom = create_user(&client, &database_link, "Tom").await?;
    view_users(&client, &database_link).await?;
    query_demo_users(&client, &database_link).await?;

    let store_self_link = store_collection_self_link(&client, &database_link).await?;
    let alice_permission = create_permission(
        &client,
        &alice,
        "AliceCollectionAccess",
        PermissionMode::All,
        &store_self_link,
    )
    .await?;
    let tom_permission = create_permission(
        &client,
        &tom,
        "TomCollectionAccess",
        PermissionMode::Read,
        &store_self_link,
    )
    .await?;

    view_permissions(&client, "Alice").await?;
    view_permissions(&client, "Tom").await?;
    query_write_permissions(&client, "Alice").await?;

    test_permissions(&settings, &alice_permission, "Alice").await?;
    test_permissions(&settings, &tom_permission, "Tom").await?;

    delete_user(&client, "Alice").await?;
    delete_user(&client, "Tom").await?;
    view_users(&client, &database_link).await?;

    Ok(())
}

async fn view_users(client: &DocumentClient, database_link: &str) -> Result<()> {
    println!("**** View Users in {DATABASE_ID} ****");
    let users = client.list_users(database_link).await?;

    if users.is_empty() {
        println!("No users");
    }
    for user in &users {
        println!("  User id: {}; rid: {}", user.id, user.meta.resource_id);
    }
    println!("Total users in database {DATABASE_ID}: {}", users.len());
    println!();
    Ok(())
}

async fn query_demo_users(client: &DocumentClient, database_link: &str) -> Result<()> {
    println!("**** Query Users ****");
    let users = client
        .query_users(
            database_link,
            "SELECT * FROM c WHERE c.id = 'Alice' OR c.id = 'Tom'",
        )
        .await?;
    for user in &users {
        println!("  Found user id: {}; rid: {}", user.id, user.meta.resource_id);
    }
    println!("Found {} demo users by query", users.len());
    println!();
    Ok(())
}

async fn create_user(client: &DocumentClient, database_link: &str, id: &str) -> Result<User> {
    println!("**** Create User {id} ****");
    let user = client.create_user(database_link, id).await?;
    println!("Created user id: {}; rid: {}", user.id, user.meta.resource_id);
    println!();
    Ok(user)
}

async fn create_permission(
    client: &DocumentClient,
    user: &User,
    permission_id: &str,
    mode: PermissionMode,
    resource_link: &str,
) -> Result<Permission> {
    println!("**** Create Permission {permission_id} for {} ****", user.id);
    let permission = client
        .create_permission(
            &links::user(DATABASE_ID, &user.id),
            Permission::definition(permission_id, mode, resource_link),
        )
        .await?;
    println!(
        "Created permission id: {}; mode: {:?}; resource: {}",
        permission.id, permission.permission_mode, permission.resource
    );
    println!();
    Ok(permission)
}

async fn view_permissions(client: &DocumentClient, user_id: &str) -> Result<()> {
    println!("**** View Permissions for {user_id} ****");
    let permissions = client
        .list_permissions(&links::user(DATABASE_ID, user_id))
        .await?;

    for permission in &permissions {
        println!(
            "  Permission id: {}; mode: {:?}; resource: {}",
            permission.id, permission.permission_mode, permission.resource
        );
    }
    println!("Total permissions for {user_id}: {}", permissions.len());
    println!();
    Ok(())
}

async fn query_write_permissions(client: &DocumentClient, user_id: &str) -> Result<()> {
    println!("**** Query Permissions for {user_id} with write access ****");
    let permissions = client
        .query_permissions(
            &links::user(DATABASE_ID, user_id),
            "SELECT * FROM c WHERE c.permissionMode = 'All'",
        )
        .await?;
    for permission in &permissions {
        println!(
            "  Permission id: {}; resource: {}",
            permission.id, permission.resource
        );
    }
    println!("Found {} write permissions for {user_id}", permissions.len());
    println!();
    Ok(())
}

/// Act as the user through their resource token: create a document, then
/// delete it. With read-only access both writes fail; the failure is the
/// point of the demo, so it is reported and swallowed.
async fn test_permissions(
    settings: &Settings,
    permission: &Permission,
    user_id: &str,
) -> Result<()> {
    println!(
        "**** Test Permission {} ({:?}) for {user_id} ****",
        permission.id, permission.permission_mode
    );
    if permission.token.is_empty() {
        return Err(anyhow!("permission {} carries no resource token", permission.id));
    }

    let restricted = DocumentClient::with_resource_token(&settings.endpoint, &permission.token);
    let collection_link = links::collection(DATABASE_ID, STORE_COLLECTION_ID);
    let document = Document::from_value(json!({
        "id": format!("{}Doc", user_id),
        "name": format!("Created by {user_id}"),
        "address": { "postalCode": "11229" }
    }))?;
    let options = RequestOptions::with_partition_key(shared::resource::PartitionKey::string(
        "11229",
    ));

    match restricted
        .create_document(&collection_link, document, &options)
        .await
    {
        Ok(created) => {
            println!("Created document as {user_id}: {}", created.id().unwrap_or_default());
            let link = links::document(
                DATABASE_ID,
                STORE_COLLECTION_ID,
                created.id().unwrap_or_default(),
            );
            restricted
                .delete_document(&link, &options)
                .await
                .with_context(|| format!("deleting document created by {user_id}"))?;
            println!("Deleted document as {user_id}");
        }
        // A read-only token is refused the write; that refusal is the demo.
        Err(err) if err.is_forbidden() => {
            println!("Create denied for {user_id}; the permission is read-only:");
            println!("{}", flatten_error(&anyhow::Error::new(err)));
        }
        Err(err) => return Err(err.into()),
    }
    println!();
    Ok(())
}

async fn delete_user(client: &DocumentClient, user_id: &str) -> Result<()> {
    println!("**** Delete User {user_id} ****");
    client.delete_user(&links::user(DATABASE_ID, user_id)).await?;
    println!("Deleted user {user_id}");
    println!();
    Ok(())
}

async fn store_collection_self_link(
    client: &DocumentClient,
    database_link: &str,
) -> Result<String> {
    let sql = format!("SELECT * FROM c WHERE c.id = '{STORE_COLLECTION_ID}'");
    let collections = client.query_collections(database_link, &sql).await?;
    collections
        .first()
        .and_then(|collection| collection["_self"].as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("collection {STORE_COLLECTION_ID} not found in {DATABASE_ID}"))
}
