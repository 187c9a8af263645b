//! One module per demo area. Every demo connects, runs its sequence against
//! the service, prints what it did, and leaves the `mydb`/`mystore` fixtures
//! in place for the next demo.

pub mod cleanup;
pub mod collections;
pub mod customer;
pub mod databases;
pub mod documents;
pub mod indexing;
pub mod stored_procedures;
pub mod triggers;
pub mod udfs;
pub mod users_permissions;

use anyhow::{Context, Result};
use document_client::DocumentClient;

use crate::config::Settings;

/// Database and collection the demos assume exist. The store collection is
/// partitioned on `/address/postalCode`.
pub const DATABASE_ID: &str = "mydb";
pub const STORE_COLLECTION_ID: &str = "mystore";

pub fn connect(settings: &Settings) -> Result<DocumentClient> {
    DocumentClient::with_master_key(&settings.endpoint, &settings.master_key)
        .context("building document client")
}

pub fn banner(title: &str) {
    println!();
    println!(">>> {title} <<<");
    println!();
}
