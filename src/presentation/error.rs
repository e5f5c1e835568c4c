// API error mapping
use crate::application::comparison_service::ServiceError;
use crate::domain::errors::AnalysisError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        Self(e)
    }
}

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        Self(e.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ServiceError::Analysis(e) => match e {
                AnalysisError::NotFound(_) => StatusCode::NOT_FOUND,
                AnalysisError::CategoryMismatch { .. } => StatusCode::CONFLICT,
                AnalysisError::InsufficientPoints { .. }
                | AnalysisError::FitFailure(_)
                | AnalysisError::InvalidMeta(_)
                | AnalysisError::IncompleteMetadata { .. }
                | AnalysisError::UnknownCategory(_) => StatusCode::UNPROCESSABLE_ENTITY,
            },
            ServiceError::NoFit => StatusCode::CONFLICT,
            ServiceError::Constants(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Surface(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Recoverable analysis errors are routine user feedback and log quietly.
    pub fn log_level(&self) -> tracing::Level {
        match &self.0 {
            ServiceError::Analysis(e) if e.is_recoverable() => tracing::Level::DEBUG,
            ServiceError::Analysis(_) | ServiceError::NoFit => tracing::Level::WARN,
            ServiceError::Constants(_) | ServiceError::Surface(_) => tracing::Level::ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let level = self.log_level();
        if level == tracing::Level::ERROR {
            tracing::error!("request failed: {}", self.0);
        } else if level == tracing::Level::WARN {
            tracing::warn!("request rejected: {}", self.0);
        } else {
            tracing::debug!("request rejected: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::Category;
    use crate::domain::result::ResultId;
    use crate::infrastructure::trace_surface::SurfaceError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(AnalysisError::NotFound(ResultId::new(1))).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(AnalysisError::CategoryMismatch {
                expected: Category::R,
                found: Category::B
            })
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(AnalysisError::InvalidMeta("min_range".into())).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(ServiceError::Constants(anyhow::anyhow!("down"))).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_log_level_follows_recoverability() {
        let fit_failure = ApiError::from(AnalysisError::FitFailure("2 distinct x values".into()));
        assert_eq!(fit_failure.log_level(), tracing::Level::DEBUG);

        let missing = ApiError::from(AnalysisError::NotFound(ResultId::new(4)));
        assert_eq!(missing.log_level(), tracing::Level::WARN);

        let surface = ApiError::from(ServiceError::Surface(SurfaceError::UnorderedRemovals { position: 1 }));
        assert_eq!(surface.log_level(), tracing::Level::ERROR);
    }
}
