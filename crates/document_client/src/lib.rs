//! Typed client for the document store's REST surface: databases,
//! collections, documents, server-side scripts, users and permissions,
//! plus SQL queries over paginated feeds.

use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::{
    document::Document,
    error::ServiceErrorBody,
    resource::{
        Collection, Database, Permission, StoredProcedure, Trigger, User, UserDefinedFunction,
    },
};
use tracing::debug;
use uuid::Uuid;

pub mod auth;
pub mod error;
pub mod links;
mod query;

pub use error::ClientError;
pub use query::QueryIterator;

use auth::{rfc1123_date_now, AuthScheme, MasterKey};
use shared::indexing::IndexingDirective;
use shared::resource::PartitionKey;

const API_VERSION: &str = "2018-12-31";

const HDR_DATE: &str = "x-ms-date";
const HDR_VERSION: &str = "x-ms-version";
const HDR_PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
const HDR_INDEXING_DIRECTIVE: &str = "x-ms-indexing-directive";
const HDR_OFFER_THROUGHPUT: &str = "x-ms-offer-throughput";
const HDR_PRE_TRIGGER_INCLUDE: &str = "x-ms-documentdb-pre-trigger-include";
const HDR_POST_TRIGGER_INCLUDE: &str = "x-ms-documentdb-post-trigger-include";
const HDR_IS_QUERY: &str = "x-ms-documentdb-isquery";
const HDR_CROSS_PARTITION: &str = "x-ms-documentdb-query-enablecrosspartition";
const HDR_ENABLE_SCAN: &str = "x-ms-documentdb-query-enable-scan";
const HDR_MAX_ITEM_COUNT: &str = "x-ms-max-item-count";
const HDR_CONTINUATION: &str = "x-ms-continuation";

const QUERY_CONTENT_TYPE: &str = "application/query+json";

/// Per-request options: partition key routing, indexing directive, offered
/// throughput for collection creation, and trigger includes.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub partition_key: Option<PartitionKey>,
    pub indexing_directive: Option<IndexingDirective>,
    pub offer_throughput: Option<u32>,
    pub pre_trigger_include: Vec<String>,
    pub post_trigger_include: Vec<String>,
}

impl RequestOptions {
    pub fn with_partition_key(partition_key: PartitionKey) -> Self {
        Self {
            partition_key: Some(partition_key),
            ..Self::default()
        }
    }
}

/// Options for query feeds.
#[derive(Debug, Clone, Default)]
pub struct FeedOptions {
    pub enable_cross_partition_query: bool,
    pub enable_scan_in_query: bool,
    pub max_item_count: Option<u32>,
}

impl FeedOptions {
    pub fn cross_partition() -> Self {
        Self {
            enable_cross_partition_query: true,
            ..Self::default()
        }
    }

    pub fn with_scan(mut self) -> Self {
        self.enable_scan_in_query = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct DocumentClient {
    http: Client,
    endpoint: String,
    auth: AuthScheme,
}

impl DocumentClient {
    /// Client authorized with the account's base64-encoded master key.
    pub fn with_master_key(
        endpoint: impl Into<String>,
        master_key_base64: &str,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            http: Client::new(),
            endpoint: normalize_endpoint(endpoint.into()),
            auth: AuthScheme::MasterKey(MasterKey::from_base64(master_key_base64)?),
        })
    }

    /// Client authorized with a resource token issued through a permission.
    /// Such a client can only reach the resources the permission covers.
    pub fn with_resource_token(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: normalize_endpoint(endpoint.into()),
            auth: AuthScheme::ResourceToken(token.into()),
        }
    }

    // ---- Databases ----

    pub async fn create_database(&self, definition: Database) -> Result<Database, ClientError> {
        let response = self
            .request(Method::POST, "dbs", "dbs", "")
            .json(&definition)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn list_databases(&self) -> Result<Vec<Database>, ClientError> {
        self.read_feed("dbs", "dbs", "", "Databases").await
    }

    pub async fn delete_database(&self, database_link: &str) -> Result<(), ClientError> {
        self.delete(database_link, "dbs", &RequestOptions::default())
            .await
    }

    // ---- Collections ----

    pub async fn create_collection(
        &self,
        database_link: &str,
        definition: Collection,
        options: &RequestOptions,
    ) -> Result<Collection, ClientError> {
        let parent = trim_link(database_link);
        let path = format!("{parent}/colls");
        let response = self
            .apply_options(self.request(Method::POST, &path, "colls", parent), options)
            .json(&definition)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn list_collections(
        &self,
        database_link: &str,
    ) -> Result<Vec<Collection>, ClientError> {
        let parent = trim_link(database_link);
        let path = format!("{parent}/colls");
        self.read_feed(&path, "colls", parent, "DocumentCollections")
            .await
    }

    pub async fn query_collections(
        &self,
        database_link: &str,
        sql: &str,
    ) -> Result<Vec<Value>, ClientError> {
        self.query_feed(
            database_link,
            "colls",
            "DocumentCollections",
            sql,
            FeedOptions::default(),
        )
        .collect_all()
        .await
    }

    pub async fn delete_collection(&self, collection_link: &str) -> Result<(), ClientError> {
        self.delete(collection_link, "colls", &RequestOptions::default())
            .await
    }

    // ---- Documents ----

    /// Create a document. A missing `id` is assigned client-side, the way
    /// SDKs for this service traditionally do.
    pub async fn create_document(
        &self,
        collection_link: &str,
        mut document: Document,
        options: &RequestOptions,
    ) -> Result<Document, ClientError> {
        if document.id().is_none() {
            document.set("id", Value::String(Uuid::new_v4().to_string()));
        }
        let parent = trim_link(collection_link);
        let path = format!("{parent}/docs");
        let response = self
            .apply_options(self.request(Method::POST, &path, "docs", parent), options)
            .json(&document)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn replace_document(
        &self,
        document_link: &str,
        document: &Document,
        options: &RequestOptions,
    ) -> Result<Document, ClientError> {
        let link = trim_link(document_link);
        let response = self
            .apply_options(self.request(Method::PUT, link, "docs", link), options)
            .json(document)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn delete_document(
        &self,
        document_link: &str,
        options: &RequestOptions,
    ) -> Result<(), ClientError> {
        self.delete(document_link, "docs", options).await
    }

    pub fn query_documents<T: DeserializeOwned>(
        &self,
        collection_link: &str,
        sql: &str,
        options: FeedOptions,
    ) -> QueryIterator<T> {
        self.query_feed(collection_link, "docs", "Documents", sql, options)
    }

    /// Single-shot variant draining every page.
    pub async fn query_documents_all<T: DeserializeOwned>(
        &self,
        collection_link: &str,
        sql: &str,
        options: FeedOptions,
    ) -> Result<Vec<T>, ClientError> {
        self.query_documents(collection_link, sql, options)
            .collect_all()
            .await
    }

    // ---- Stored procedures ----

    pub async fn create_stored_procedure(
        &self,
        collection_link: &str,
        id: &str,
        body: &str,
    ) -> Result<StoredProcedure, ClientError> {
        let parent = trim_link(collection_link);
        let path = format!("{parent}/sprocs");
        let definition = serde_json::json!({ "id": id, "body": body });
        let response = self
            .request(Method::POST, &path, "sprocs", parent)
            .json(&definition)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn list_stored_procedures(
        &self,
        collection_link: &str,
    ) -> Result<Vec<StoredProcedure>, ClientError> {
        let parent = trim_link(collection_link);
        let path = format!("{parent}/sprocs");
        self.read_feed(&path, "sprocs", parent, "StoredProcedures")
            .await
    }

    pub async fn delete_stored_procedure(&self, sproc_link: &str) -> Result<(), ClientError> {
        self.delete(sproc_link, "sprocs", &RequestOptions::default())
            .await
    }

    /// Execute a stored procedure with a JSON array of arguments and
    /// deserialize whatever the script set as its response body.
    pub async fn execute_stored_procedure<T: DeserializeOwned>(
        &self,
        sproc_link: &str,
        options: &RequestOptions,
        arguments: &impl Serialize,
    ) -> Result<T, ClientError> {
        let link = trim_link(sproc_link);
        let response = self
            .apply_options(self.request(Method::POST, link, "sprocs", link), options)
            .json(arguments)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    // ---- Triggers ----

    pub async fn create_trigger(
        &self,
        collection_link: &str,
        definition: Trigger,
    ) -> Result<Trigger, ClientError> {
        let parent = trim_link(collection_link);
        let path = format!("{parent}/triggers");
        let response = self
            .request(Method::POST, &path, "triggers", parent)
            .json(&definition)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn list_triggers(&self, collection_link: &str) -> Result<Vec<Trigger>, ClientError> {
        let parent = trim_link(collection_link);
        let path = format!("{parent}/triggers");
        self.read_feed(&path, "triggers", parent, "Triggers").await
    }

    pub async fn delete_trigger(&self, trigger_link: &str) -> Result<(), ClientError> {
        self.delete(trigger_link, "triggers", &RequestOptions::default())
            .await
    }

    // ---- User-defined functions ----

    pub async fn create_user_defined_function(
        &self,
        collection_link: &str,
        id: &str,
        body: &str,
    ) -> Result<UserDefinedFunction, ClientError> {
        let parent = trim_link(collection_link);
        let path = format!("{parent}/udfs");
        let definition = serde_json::json!({ "id": id, "body": body });
        let response = self
            .request(Method::POST, &path, "udfs", parent)
            .json(&definition)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn list_user_defined_functions(
        &self,
        collection_link: &str,
    ) -> Result<Vec<UserDefinedFunction>, ClientError> {
        let parent = trim_link(collection_link);
        let path = format!("{parent}/udfs");
        self.read_feed(&path, "udfs", parent, "UserDefinedFunctions")
            .await
    }

    pub async fn delete_user_defined_function(&self, udf_link: &str) -> Result<(), ClientError> {
        self.delete(udf_link, "udfs", &RequestOptions::default())
            .await
    }

    // ---- Users and permissions ----

    pub async fn create_user(&self, database_link: &str, id: &str) -> Result<User, ClientError> {
        let parent = trim_link(database_link);
        let path = format!("{parent}/users");
        let definition = serde_json::json!({ "id": id });
        let response = self
            .request(Method::POST, &path, "users", parent)
            .json(&definition)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn list_users(&self, database_link: &str) -> Result<Vec<User>, ClientError> {
        let parent = trim_link(database_link);
        let path = format!("{parent}/users");
        self.read_feed(&path, "users", parent, "Users").await
    }

    pub async fn query_users(
        &self,
        database_link: &str,
        sql: &str,
    ) -> Result<Vec<User>, ClientError> {
        self.query_feed(database_link, "users", "Users", sql, FeedOptions::default())
            .collect_all()
            .await
    }

    pub async fn delete_user(&self, user_link: &str) -> Result<(), ClientError> {
        self.delete(user_link, "users", &RequestOptions::default())
            .await
    }

    pub async fn create_permission(
        &self,
        user_link: &str,
        definition: Permission,
    ) -> Result<Permission, ClientError> {
        let parent = trim_link(user_link);
        let path = format!("{parent}/permissions");
        let response = self
            .request(Method::POST, &path, "permissions", parent)
            .json(&definition)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn list_permissions(
        &self,
        user_link: &str,
    ) -> Result<Vec<Permission>, ClientError> {
        let parent = trim_link(user_link);
        let path = format!("{parent}/permissions");
        self.read_feed(&path, "permissions", parent, "Permissions")
            .await
    }

    pub async fn query_permissions(
        &self,
        user_link: &str,
        sql: &str,
    ) -> Result<Vec<Permission>, ClientError> {
        self.query_feed(user_link, "permissions", "Permissions", sql, FeedOptions::default())
            .collect_all()
            .await
    }

    pub async fn delete_permission(&self, permission_link: &str) -> Result<(), ClientError> {
        self.delete(permission_link, "permissions", &RequestOptions::default())
            .await
    }

    // ---- Request plumbing ----

    fn request(
        &self,
        method: Method,
        path: &str,
        resource_type: &str,
        resource_link: &str,
    ) -> RequestBuilder {
        let date = rfc1123_date_now();
        let authorization = self
            .auth
            .authorization(method.as_str(), resource_type, resource_link, &date);
        self.http
            .request(method, format!("{}/{}", self.endpoint, path))
            .header(HDR_DATE, date)
            .header(HDR_VERSION, API_VERSION)
            .header(header::AUTHORIZATION, authorization)
    }

    fn apply_options(&self, mut builder: RequestBuilder, options: &RequestOptions) -> RequestBuilder {
        if let Some(partition_key) = &options.partition_key {
            builder = builder.header(HDR_PARTITION_KEY, partition_key.header_value());
        }
        if let Some(directive) = options.indexing_directive {
            builder = builder.header(HDR_INDEXING_DIRECTIVE, directive.header_value());
        }
        if let Some(throughput) = options.offer_throughput {
            builder = builder.header(HDR_OFFER_THROUGHPUT, throughput.to_string());
        }
        if !options.pre_trigger_include.is_empty() {
            builder = builder.header(
                HDR_PRE_TRIGGER_INCLUDE,
                options.pre_trigger_include.join(","),
            );
        }
        if !options.post_trigger_include.is_empty() {
            builder = builder.header(
                HDR_POST_TRIGGER_INCLUDE,
                options.post_trigger_include.join(","),
            );
        }
        builder
    }

    fn query_feed<T: DeserializeOwned>(
        &self,
        parent_link: &str,
        resource_type: &'static str,
        envelope: &'static str,
        sql: &str,
        options: FeedOptions,
    ) -> QueryIterator<T> {
        QueryIterator::new(
            self.clone(),
            trim_link(parent_link).to_string(),
            resource_type,
            envelope,
            sql,
            options,
        )
    }

    pub(crate) async fn execute_query_page(
        &self,
        parent_link: &str,
        resource_type: &'static str,
        envelope: &'static str,
        query: &Value,
        options: &FeedOptions,
        continuation: Option<String>,
    ) -> Result<(Vec<Value>, Option<String>), ClientError> {
        let path = format!("{parent_link}/{resource_type}");
        let mut builder = self
            .request(Method::POST, &path, resource_type, parent_link)
            .header(header::CONTENT_TYPE, QUERY_CONTENT_TYPE)
            .header(HDR_IS_QUERY, "true");

        if options.enable_cross_partition_query {
            builder = builder.header(HDR_CROSS_PARTITION, "true");
        }
        if options.enable_scan_in_query {
            builder = builder.header(HDR_ENABLE_SCAN, "true");
        }
        if let Some(max_item_count) = options.max_item_count {
            builder = builder.header(HDR_MAX_ITEM_COUNT, max_item_count.to_string());
        }
        if let Some(token) = &continuation {
            builder = builder.header(HDR_CONTINUATION, token);
        }

        let response = Self::check(builder.body(query.to_string()).send().await?).await?;
        let next_continuation = response
            .headers()
            .get(HDR_CONTINUATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        debug!(
            path,
            continued = continuation.is_some(),
            has_more = next_continuation.is_some(),
            "query page fetched"
        );

        let value: Value = response.json().await?;
        let items = unwrap_feed::<Value>(value, envelope)?;
        Ok((items, next_continuation))
    }

    async fn read_feed<T: DeserializeOwned>(
        &self,
        path: &str,
        resource_type: &str,
        resource_link: &str,
        envelope: &'static str,
    ) -> Result<Vec<T>, ClientError> {
        let response = self
            .request(Method::GET, path, resource_type, resource_link)
            .send()
            .await?;
        let value: Value = Self::check(response).await?.json().await?;
        unwrap_feed(value, envelope)
    }

    async fn delete(
        &self,
        link: &str,
        resource_type: &str,
        options: &RequestOptions,
    ) -> Result<(), ClientError> {
        let link = trim_link(link);
        let response = self
            .apply_options(self.request(Method::DELETE, link, resource_type, link), options)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<ServiceErrorBody>(&text)
            .unwrap_or_else(|_| ServiceErrorBody::opaque(text));
        Err(ClientError::Service { status, body })
    }
}

fn unwrap_feed<T: DeserializeOwned>(
    mut value: Value,
    envelope: &'static str,
) -> Result<Vec<T>, ClientError> {
    match value.get_mut(envelope).map(Value::take) {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(ClientError::Decode))
            .collect(),
        _ => Err(ClientError::MissingFeed(envelope)),
    }
}

fn normalize_endpoint(endpoint: String) -> String {
    endpoint.trim_end_matches('/').to_string()
}

fn trim_link(link: &str) -> &str {
    link.trim_matches('/')
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
