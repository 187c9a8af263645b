use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::indexing::IndexingPolicy;

/// System metadata the service stamps onto every resource it returns.
/// Absent on definitions the client sends, which is why every field
/// defaults and is skipped when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceMeta {
    #[serde(rename = "_rid", default, skip_serializing_if = "String::is_empty")]
    pub resource_id: String,
    #[serde(rename = "_self", default, skip_serializing_if = "String::is_empty")]
    pub self_link: String,
    #[serde(rename = "_etag", default, skip_serializing_if = "String::is_empty")]
    pub etag: String,
    #[serde(rename = "_ts", default, skip_serializing_if = "is_zero")]
    pub timestamp: i64,
}

fn is_zero(ts: &i64) -> bool {
    *ts == 0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub id: String,
    #[serde(flatten)]
    pub meta: ResourceMeta,
    #[serde(rename = "_colls", default, skip_serializing_if = "String::is_empty")]
    pub collections_link: String,
    #[serde(rename = "_users", default, skip_serializing_if = "String::is_empty")]
    pub users_link: String,
}

impl Database {
    pub fn definition(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            meta: ResourceMeta::default(),
            collections_link: String::new(),
            users_link: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionKeyDefinition {
    pub paths: Vec<String>,
    #[serde(default = "PartitionKeyDefinition::default_kind")]
    pub kind: String,
}

impl PartitionKeyDefinition {
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            paths: vec![path.into()],
            kind: Self::default_kind(),
        }
    }

    fn default_kind() -> String {
        "Hash".to_string()
    }
}

/// Value of the partition key for a single request, serialized into the
/// partition-key request header as a one-element JSON array.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionKey(pub Value);

impl PartitionKey {
    pub fn string(value: impl Into<String>) -> Self {
        Self(Value::String(value.into()))
    }

    /// Header representation, e.g. `["11229"]`.
    pub fn header_value(&self) -> String {
        Value::Array(vec![self.0.clone()]).to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    #[serde(rename = "partitionKey")]
    pub partition_key: PartitionKeyDefinition,
    #[serde(
        rename = "indexingPolicy",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub indexing_policy: Option<IndexingPolicy>,
    #[serde(flatten)]
    pub meta: ResourceMeta,
}

impl Collection {
    pub fn definition(id: impl Into<String>, partition_key_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            partition_key: PartitionKeyDefinition::path(partition_key_path),
            indexing_policy: None,
            meta: ResourceMeta::default(),
        }
    }

    pub fn with_indexing_policy(mut self, policy: IndexingPolicy) -> Self {
        self.indexing_policy = Some(policy);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(
        rename = "_permissions",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub permissions_link: String,
    #[serde(flatten)]
    pub meta: ResourceMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionMode {
    All,
    Read,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: String,
    #[serde(rename = "permissionMode")]
    pub permission_mode: PermissionMode,
    /// Self link of the resource this permission grants access to.
    pub resource: String,
    /// Resource token issued by the service; never sent by the client.
    #[serde(rename = "_token", default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    #[serde(flatten)]
    pub meta: ResourceMeta,
}

impl Permission {
    pub fn definition(
        id: impl Into<String>,
        permission_mode: PermissionMode,
        resource_link: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            permission_mode,
            resource: resource_link.into(),
            token: String::new(),
            meta: ResourceMeta::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProcedure {
    pub id: String,
    pub body: String,
    #[serde(flatten)]
    pub meta: ResourceMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerType {
    Pre,
    Post,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerOperation {
    All,
    Create,
    Replace,
    Delete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub id: String,
    pub body: String,
    #[serde(rename = "triggerType")]
    pub trigger_type: TriggerType,
    #[serde(rename = "triggerOperation")]
    pub trigger_operation: TriggerOperation,
    #[serde(flatten)]
    pub meta: ResourceMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDefinedFunction {
    pub id: String,
    pub body: String,
    #[serde(flatten)]
    pub meta: ResourceMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn meta_fields_round_trip_underscore_names() {
        let database: Database = serde_json::from_value(json!({
            "id": "mydb",
            "_rid": "qWcbAA==",
            "_self": "dbs/qWcbAA==/",
            "_etag": "\"00000100-0000-0000-0000-000000000000\"",
            "_ts": 1_700_000_000,
            "_colls": "colls/",
            "_users": "users/"
        }))
        .unwrap();

        assert_eq!(database.id, "mydb");
        assert_eq!(database.meta.self_link, "dbs/qWcbAA==/");
        assert_eq!(database.meta.timestamp, 1_700_000_000);
        assert_eq!(database.collections_link, "colls/");
    }

    #[test]
    fn definition_serializes_without_system_fields() {
        let value = serde_json::to_value(Database::definition("DatabaseId1")).unwrap();
        assert_eq!(value, json!({ "id": "DatabaseId1" }));
    }

    #[test]
    fn collection_definition_carries_partition_key() {
        let value =
            serde_json::to_value(Collection::definition("mystore", "/partitionKey")).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "mystore",
                "partitionKey": { "paths": ["/partitionKey"], "kind": "Hash" }
            })
        );
    }

    #[test]
    fn partition_key_header_is_a_json_array() {
        assert_eq!(PartitionKey::string("11229").header_value(), r#"["11229"]"#);
        assert_eq!(PartitionKey::string("").header_value(), r#"[""]"#);
    }

    #[test]
    fn permission_mode_uses_wire_casing() {
        let perm = Permission::definition("TomAccess", PermissionMode::Read, "colls/x");
        let value = serde_json::to_value(perm).unwrap();
        assert_eq!(value["permissionMode"], "Read");
        assert_eq!(value["resource"], "colls/x");
        assert!(value.get("_token").is_none());
    }

    #[test]
    fn trigger_enums_use_wire_casing() {
        let trigger = Trigger {
            id: "trgValidateDocument".into(),
            body: "function() {}".into(),
            trigger_type: TriggerType::Pre,
            trigger_operation: TriggerOperation::All,
            meta: ResourceMeta::default(),
        };
        let value = serde_json::to_value(trigger).unwrap();
        assert_eq!(value["triggerType"], "Pre");
        assert_eq!(value["triggerOperation"], "All");
    }
}
