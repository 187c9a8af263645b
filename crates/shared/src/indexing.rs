use serde::{Deserialize, Serialize};

/// Collection-level indexing policy, in the service's wire shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingPolicy {
    #[serde(rename = "indexingMode")]
    pub indexing_mode: IndexingMode,
    pub automatic: bool,
    #[serde(rename = "includedPaths", default, skip_serializing_if = "Vec::is_empty")]
    pub included_paths: Vec<IncludedPath>,
    #[serde(rename = "excludedPaths", default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_paths: Vec<ExcludedPath>,
}

impl Default for IndexingPolicy {
    fn default() -> Self {
        Self {
            indexing_mode: IndexingMode::Consistent,
            automatic: true,
            included_paths: Vec::new(),
            excluded_paths: Vec::new(),
        }
    }
}

impl IndexingPolicy {
    pub fn manual() -> Self {
        Self {
            automatic: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexingMode {
    Consistent,
    Lazy,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncludedPath {
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<Index>,
}

impl IncludedPath {
    pub fn new(path: impl Into<String>, indexes: Vec<Index>) -> Self {
        Self {
            path: path.into(),
            indexes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcludedPath {
    pub path: String,
}

impl ExcludedPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Index {
    Hash {
        #[serde(rename = "dataType")]
        data_type: DataType,
    },
    Range {
        #[serde(rename = "dataType")]
        data_type: DataType,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    String,
    Number,
}

/// Per-request override of the collection policy, sent as a request header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexingDirective {
    #[default]
    Default,
    Include,
    Exclude,
}

impl IndexingDirective {
    pub fn header_value(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Include => "Include",
            Self::Exclude => "Exclude",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn policy_serializes_to_wire_shape() {
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

        assert_eq!(
            serde_json::to_value(policy).unwrap(),
            json!({
                "indexingMode": "consistent",
                "automatic": true,
                "includedPaths": [
                    {
                        "path": "/title/?",
                        "indexes": [{ "kind": "Range", "dataType": "String" }]
                    },
                    {
                        "path": "/*",
                        "indexes": [
                            { "kind": "Hash", "dataType": "String" },
                            { "kind": "Range", "dataType": "Number" }
                        ]
                    }
                ],
                "excludedPaths": [{ "path": "/misc/*" }]
            })
        );
    }

    #[test]
    fn manual_policy_disables_automatic() {
        let policy = IndexingPolicy::manual();
        assert!(!policy.automatic);
        assert_eq!(policy.indexing_mode, IndexingMode::Consistent);
    }
}
