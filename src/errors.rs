use crate::pocket::NetworkError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

/// Caller-facing failures of the lifecycle service.
///
/// The first five are caller-fixable and map to 4xx; the last two are our
/// problem and map to 500. Staking and unstaking do not use this type at
/// all, they collapse to negative results (see service.rs).
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("invalid application metadata: {0}")]
    InvalidMetadata(String),
    #[error("user does not exist")]
    UserNotFound,
    #[error("application already exists")]
    ApplicationAlreadyExists,
    #[error("imported account is invalid")]
    InvalidImportedAccount,
    #[error("application does not exist on network")]
    UnknownOnNetwork,
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("database error: {0}")]
    Store(#[from] rusqlite::Error),
}

impl ResponseError for PortalError {
    fn status_code(&self) -> StatusCode {
        match self {
            PortalError::InvalidMetadata(_) | PortalError::InvalidImportedAccount => {
                StatusCode::BAD_REQUEST
            }
            PortalError::UserNotFound | PortalError::UnknownOnNetwork => StatusCode::NOT_FOUND,
            PortalError::ApplicationAlreadyExists => StatusCode::CONFLICT,
            PortalError::Network(_) | PortalError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Internal failure details stay in the logs, not in the response body.
        let message = match self {
            PortalError::Network(_) => "Upstream network request failed".to_string(),
            PortalError::Store(_) => "Internal storage error".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_fixable_errors_map_to_4xx() {
        assert_eq!(
            PortalError::InvalidMetadata("contact email is malformed".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(PortalError::UserNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            PortalError::ApplicationAlreadyExists.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            PortalError::InvalidImportedAccount.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn operational_errors_map_to_500_without_detail() {
        let err = PortalError::Network(crate::pocket::NetworkError::Rejected(
            "secret internal detail".to_string(),
        ));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = err.error_response();
        assert_eq!(body.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
