// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod constants;
pub mod http_response;
pub mod record_export;
pub mod trace_surface;
