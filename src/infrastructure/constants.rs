// Base constant sources - static table from configuration or a remote lookup
use crate::application::constants_source::BaseConstantSource;
use crate::application::metric_converter::BaseConstants;
use crate::domain::category::Category;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct StaticBaseConstants {
    constants: BaseConstants,
}

impl StaticBaseConstants {
    pub fn new(constants: BaseConstants) -> Self {
        Self { constants }
    }
}

#[async_trait]
impl BaseConstantSource for StaticBaseConstants {
    async fn base_constants(&self) -> Result<BaseConstants> {
        Ok(self.constants.clone())
    }
}

/// Reference coordinates as the colour-coordinate service reports them:
/// red and green by CIE x, blue by CIE y.
#[derive(Debug, Deserialize)]
struct ColorCoordinates {
    rx: f64,
    gx: f64,
    by: f64,
}

impl From<ColorCoordinates> for BaseConstants {
    fn from(coords: ColorCoordinates) -> Self {
        BaseConstants::new()
            .with(Category::R, coords.rx)
            .with(Category::G, coords.gx)
            .with(Category::B, coords.by)
    }
}

#[derive(Debug, Clone)]
pub struct HttpBaseConstants {
    url: String,
    profile: String,
    client: reqwest::Client,
}

impl HttpBaseConstants {
    pub fn new(url: String, profile: String) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            profile,
            client: reqwest::Client::new(),
        }
    }

    fn build_url(&self) -> String {
        format!("{}?profile={}", self.url, urlencoding::encode(&self.profile))
    }
}

#[async_trait]
impl BaseConstantSource for HttpBaseConstants {
    async fn base_constants(&self) -> Result<BaseConstants> {
        let url = self.build_url();
        tracing::debug!("Fetching base constants from {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request for base constants")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Base constant lookup failed with status {}: {}", status, body);
        }

        let coords = response
            .json::<ColorCoordinates>()
            .await
            .context("Failed to parse base constant response")?;

        Ok(coords.into())
    }
}
