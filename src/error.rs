use axum::http::StatusCode;
use thiserror::Error;

/// Failure taxonomy shared by the stores, the embedding provider and the
/// dialogue pipeline.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error("{0} not found")]
    Missing(&'static str),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("duplicate record: {0}")]
    Duplicate(String),

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl From<sqlx::Error> for CoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => CoreError::Missing("row"),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                CoreError::Duplicate(db.message().to_string())
            }
            _ => CoreError::Persistence(e.to_string()),
        }
    }
}

impl CoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            CoreError::Missing(_) => StatusCode::NOT_FOUND,
            CoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CoreError::Duplicate(_) => StatusCode::CONFLICT,
            CoreError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CoreError::CapabilityUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Handler-side rejection, in the `(StatusCode, String)` shape every route returns.
pub fn reject(e: CoreError) -> (StatusCode, String) {
    (e.status(), e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(CoreError::Missing("client").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            CoreError::Duplicate("x".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            CoreError::Persistence("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let (status, msg) = reject(CoreError::Missing("client"));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(msg, "client not found");
    }

    #[test]
    fn row_not_found_is_missing() {
        let e: CoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(e, CoreError::Missing(_)));
    }
}
