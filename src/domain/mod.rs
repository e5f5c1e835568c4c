// Domain layer - Core data models with no I/O
pub mod category;
pub mod errors;
pub mod fit;
pub mod measurement;
pub mod result;
pub mod sync_plan;
