use reqwest::StatusCode;
use shared::error::ServiceErrorBody;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to document service failed")]
    Transport(#[from] reqwest::Error),
    #[error("service call failed with status {status}")]
    Service {
        status: StatusCode,
        #[source]
        body: ServiceErrorBody,
    },
    #[error("master key is not valid base64")]
    InvalidMasterKey(#[source] base64::DecodeError),
    #[error("unexpected response shape: missing '{0}' feed")]
    MissingFeed(&'static str),
    #[error("failed to decode response payload")]
    Decode(#[from] serde_json::Error),
    #[error("query iterator has no more results")]
    IteratorExhausted,
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Service { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(StatusCode::FORBIDDEN)
    }

    /// Message reported by the service, when there is one.
    pub fn service_message(&self) -> Option<&str> {
        match self {
            Self::Service { body, .. } => Some(&body.message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn service_error_exposes_status_and_cause() {
        let err = ClientError::Service {
            status: StatusCode::CONFLICT,
            body: ServiceErrorBody {
                code: "Conflict".into(),
                message: "Resource already exists".into(),
            },
        };

        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert_eq!(err.service_message(), Some("Resource already exists"));
        let source = err.source().expect("service error carries a cause");
        assert_eq!(source.to_string(), "Conflict: Resource already exists");
    }

    #[test]
    fn forbidden_status_is_detected() {
        let err = ClientError::Service {
            status: StatusCode::FORBIDDEN,
            body: ServiceErrorBody::opaque("write denied by permission"),
        };
        assert!(err.is_forbidden());
    }

    #[test]
    fn transport_errors_have_no_status() {
        let err = ClientError::MissingFeed("Documents");
        assert_eq!(err.status(), None);
        assert!(!err.is_forbidden());
    }
}
