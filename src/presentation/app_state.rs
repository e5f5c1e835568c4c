// Application state for HTTP handlers
use crate::application::comparison_service::ComparisonService;

#[derive(Clone)]
pub struct AppState {
    pub comparison_service: ComparisonService,
}
