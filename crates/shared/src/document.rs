use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A document is an arbitrary JSON object plus the system metadata the
/// service adds on write. Payloads stay untyped here; callers that want a
/// schema deserialize the body into their own type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    body: Value,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document payload is not a JSON object")]
    NotAnObject,
    #[error("document payload is not valid JSON")]
    InvalidJson(#[source] serde_json::Error),
}

impl Document {
    pub fn from_value(body: Value) -> Result<Self, DocumentError> {
        if !body.is_object() {
            return Err(DocumentError::NotAnObject);
        }
        Ok(Self { body })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, DocumentError> {
        let body = serde_json::from_str(raw).map_err(DocumentError::InvalidJson)?;
        Self::from_value(body)
    }

    pub fn from_typed<T: Serialize>(payload: &T) -> Result<Self, DocumentError> {
        let body = serde_json::to_value(payload).map_err(DocumentError::InvalidJson)?;
        Self::from_value(body)
    }

    pub fn id(&self) -> Option<&str> {
        self.body.get("id").and_then(Value::as_str)
    }

    pub fn self_link(&self) -> Option<&str> {
        self.body.get("_self").and_then(Value::as_str)
    }

    pub fn etag(&self) -> Option<&str> {
        self.body.get("_etag").and_then(Value::as_str)
    }

    /// Value at a dotted path, e.g. `address.location.city`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = &self.body;
        for segment in path.split('.') {
            current = current.get(segment)?;
        }
        Some(current)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        if let Some(object) = self.body.as_object_mut() {
            object.insert(key.to_string(), value);
        }
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Reinterpret the document body as a typed payload.
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T, DocumentError> {
        serde_json::from_value(self.body.clone()).map_err(DocumentError::InvalidJson)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_non_object_payloads() {
        assert!(matches!(
            Document::from_value(json!([1, 2, 3])),
            Err(DocumentError::NotAnObject)
        ));
        assert!(matches!(
            Document::from_json_str("not json"),
            Err(DocumentError::InvalidJson(_))
        ));
    }

    #[test]
    fn exposes_system_fields_and_paths() {
        let doc = Document::from_value(json!({
            "id": "JOHN",
            "_self": "dbs/a/colls/b/docs/c/",
            "address": { "location": { "city": "Brooklyn" } }
        }))
        .unwrap();

        assert_eq!(doc.id(), Some("JOHN"));
        assert_eq!(doc.self_link(), Some("dbs/a/colls/b/docs/c/"));
        assert_eq!(
            doc.get_path("address.location.city"),
            Some(&json!("Brooklyn"))
        );
        assert_eq!(doc.get_path("address.missing"), None);
    }

    #[test]
    fn converts_body_to_typed_payload() {
        #[derive(Debug, Deserialize)]
        struct Named {
            name: String,
        }

        let doc = Document::from_value(json!({
            "name": "John Doe",
            "_etag": "\"00000100-0000-0000-0000-000000000000\""
        }))
        .unwrap();

        assert_eq!(doc.etag(), Some("\"00000100-0000-0000-0000-000000000000\""));
        let named: Named = doc.to_typed().unwrap();
        assert_eq!(named.name, "John Doe");
    }

    #[test]
    fn set_overwrites_body_fields() {
        let mut doc = Document::from_value(json!({ "id": "X" })).unwrap();
        doc.set("isNew", json!(true));
        assert_eq!(doc.body()["isNew"], json!(true));
    }
}
