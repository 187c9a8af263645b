use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::ClientError;

type HmacSha256 = Hmac<Sha256>;

/// How requests are authorized: the account master key (signed per request)
/// or a resource token previously issued through a permission.
#[derive(Clone)]
pub enum AuthScheme {
    MasterKey(MasterKey),
    ResourceToken(String),
}

impl std::fmt::Debug for AuthScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MasterKey(_) => f.write_str("AuthScheme::MasterKey(..)"),
            Self::ResourceToken(_) => f.write_str("AuthScheme::ResourceToken(..)"),
        }
    }
}

impl AuthScheme {
    pub fn authorization(
        &self,
        verb: &str,
        resource_type: &str,
        resource_link: &str,
        date: &str,
    ) -> String {
        match self {
            Self::MasterKey(key) => key.sign(verb, resource_type, resource_link, date),
            Self::ResourceToken(token) => url_encode(token),
        }
    }
}

#[derive(Clone)]
pub struct MasterKey {
    key: Vec<u8>,
}

impl MasterKey {
    pub fn from_base64(encoded: &str) -> Result<Self, ClientError> {
        let key = STANDARD
            .decode(encoded.trim())
            .map_err(ClientError::InvalidMasterKey)?;
        Ok(Self { key })
    }

    /// Signature over verb, resource type, resource link and request date.
    /// The verb and date are lowercased in the payload per the wire contract;
    /// the resource link is signed as-is.
    pub fn sign(&self, verb: &str, resource_type: &str, resource_link: &str, date: &str) -> String {
        let payload = format!(
            "{}\n{}\n{}\n{}\n\n",
            verb.to_lowercase(),
            resource_type,
            resource_link,
            date.to_lowercase()
        );
        // HMAC-SHA256 accepts keys of any length.
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("hmac key length is unrestricted");
        mac.update(payload.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());
        url_encode(&format!("type=master&ver=1.0&sig={signature}"))
    }
}

fn url_encode(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

/// RFC 1123 date for the `x-ms-date` header.
pub fn rfc1123_date_now() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> MasterKey {
        MasterKey::from_base64(&STANDARD.encode(b"not-a-real-master-key")).expect("valid base64")
    }

    #[test]
    fn rejects_invalid_base64_keys() {
        assert!(matches!(
            MasterKey::from_base64("!!not base64!!"),
            Err(ClientError::InvalidMasterKey(_))
        ));
    }

    #[test]
    fn signature_is_deterministic_and_url_encoded() {
        let key = test_key();
        let date = "Tue, 01 Apr 2025 00:00:00 GMT";
        let first = key.sign("GET", "dbs", "dbs/mydb", date);
        let second = key.sign("GET", "dbs", "dbs/mydb", date);

        assert_eq!(first, second);
        assert!(first.starts_with("type%3Dmaster%26ver%3D1.0%26sig%3D"));
        assert!(!first.contains('='), "token must be fully url-encoded");
    }

    #[test]
    fn verb_case_does_not_change_the_signature() {
        let key = test_key();
        let date = "Tue, 01 Apr 2025 00:00:00 GMT";
        assert_eq!(
            key.sign("GET", "docs", "dbs/mydb/colls/mystore", date),
            key.sign("get", "docs", "dbs/mydb/colls/mystore", date)
        );
    }

    #[test]
    fn different_resources_produce_different_signatures() {
        let key = test_key();
        let date = "Tue, 01 Apr 2025 00:00:00 GMT";
        assert_ne!(
            key.sign("GET", "dbs", "dbs/mydb", date),
            key.sign("GET", "dbs", "dbs/otherdb", date)
        );
    }

    #[test]
    fn resource_tokens_pass_through_encoded() {
        let scheme = AuthScheme::ResourceToken("type=resource&ver=1.0&sig=abc".into());
        assert_eq!(
            scheme.authorization("GET", "docs", "whatever", "date"),
            "type%3Dresource%26ver%3D1.0%26sig%3Dabc"
        );
    }

    #[test]
    fn date_header_matches_rfc1123_shape() {
        let date = rfc1123_date_now();
        assert!(date.ends_with(" GMT"));
        assert_eq!(date.len(), "Tue, 01 Apr 2025 00:00:00 GMT".len());
    }
}
