// Base constant source trait - where per-category reference coordinates come from
use crate::application::metric_converter::BaseConstants;
use async_trait::async_trait;

#[async_trait]
pub trait BaseConstantSource: Send + Sync {
    /// Fetch the current reference coordinate for every known category.
    async fn base_constants(&self) -> anyhow::Result<BaseConstants>;
}
