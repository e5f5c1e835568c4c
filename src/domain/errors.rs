// Error taxonomy shared by every analysis operation
use super::category::Category;
use super::fit::FitOrder;
use super::result::ResultId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("order {order} fit needs at least {min} points, got {got}")]
    InsufficientPoints { order: FitOrder, got: usize, min: usize },

    #[error("fit failed: {0}")]
    FitFailure(String),

    #[error("no base constant registered for category {0}")]
    UnknownCategory(Category),

    #[error("selection mixes categories {expected} and {found}")]
    CategoryMismatch { expected: Category, found: Category },

    #[error("result {0} not found")]
    NotFound(ResultId),

    #[error("invalid metadata: {0}")]
    InvalidMeta(String),

    /// A record cannot be persisted until the named field is filled in.
    #[error("row {position} is missing {field}")]
    IncompleteMetadata { position: usize, field: &'static str },
}

impl AnalysisError {
    /// Errors the caller is expected to surface as a warning and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientPoints { .. } | Self::FitFailure(_) | Self::CategoryMismatch { .. }
        )
    }
}
