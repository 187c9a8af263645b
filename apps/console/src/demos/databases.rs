use anyhow::Result;
use document_client::{links, DocumentClient};
use shared::resource::Database;

use crate::config::Settings;

use super::{banner, connect};

const DEMO_DATABASE_ID: &str = "DatabaseId1";

pub async fn run(settings: Settings) -> Result<()> {
    banner("Databases");
    let client = connect(&settings)?;

    view_databases(&client).await?;
    create_database(&client).await?;
    view_databases(&client).await?;
    delete_database(&client).await?;
    view_databases(&client).await?;

    Ok(())
}

async fn view_databases(client: &DocumentClient) -> Result<()> {
    println!("**** View Databases ****");
    let databases = client.list_databases().await?;

    if databases.is_empty() {
        println!("No databases");
    }
    for database in &databases {
        print_database(database);
    }
    println!("Total databases: {}", databases.len());
    println!();
    Ok(())
}

async fn create_database(client: &DocumentClient) -> Result<()> {
    println!("**** Create Database ****");
    let database = client
        .create_database(Database::definition(DEMO_DATABASE_ID))
        .await?;
    println!("Created new database:");
    print_database(&database);
    println!();
    Ok(())
}

async fn delete_database(client: &DocumentClient) -> Result<()> {
    println!("**** Delete Database ****");
    client
        .delete_database(&links::database(DEMO_DATABASE_ID))
        .await?;
    println!("Deleted database {DEMO_DATABASE_ID}");
    println!();
    Ok(())
}

fn print_database(database: &Database) {
    println!(
        "  Database id: {}; rid: {}; self link: {}",
        database.id, database.meta.resource_id, database.meta.self_link
    );
}
