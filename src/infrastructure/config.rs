use crate::application::chart_synchronizer::AxisTitleTable;
use crate::application::metric_converter::BaseConstants;
use crate::domain::category::{Category, ClassifierThresholds};
use crate::domain::sync_plan::AxisTitles;
use serde::Deserialize;

const ENV_PREFIX: &str = "FIT_COMPARE";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub thresholds: ClassifierThresholds,
    #[serde(default)]
    pub constants: ConstantsConfig,
    #[serde(default)]
    pub axes: AxesConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConstantsSourceKind {
    #[default]
    Static,
    Http,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConstantsConfig {
    #[serde(default)]
    pub source: ConstantsSourceKind,
    #[serde(default)]
    pub r#static: StaticConstants,
    pub url: Option<String>,
    #[serde(default = "default_profile")]
    pub profile: String,
}

impl Default for ConstantsConfig {
    fn default() -> Self {
        Self {
            source: ConstantsSourceKind::default(),
            r#static: StaticConstants::default(),
            url: None,
            profile: default_profile(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct StaticConstants {
    #[serde(default = "default_r")]
    pub r: f64,
    #[serde(default = "default_g")]
    pub g: f64,
    #[serde(default = "default_b")]
    pub b: f64,
}

impl Default for StaticConstants {
    fn default() -> Self {
        Self {
            r: default_r(),
            g: default_g(),
            b: default_b(),
        }
    }
}

impl From<StaticConstants> for BaseConstants {
    fn from(values: StaticConstants) -> Self {
        BaseConstants::new()
            .with(Category::R, values.r)
            .with(Category::G, values.g)
            .with(Category::B, values.b)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AxesConfig {
    pub placeholder: Option<AxisTitles>,
    pub r: Option<AxisTitles>,
    pub g: Option<AxisTitles>,
    pub b: Option<AxisTitles>,
}

impl AxesConfig {
    /// Overlay configured titles on the built-in table.
    pub fn title_table(&self) -> AxisTitleTable {
        let defaults = AxisTitleTable::default();
        let mut table = AxisTitleTable::new(
            self.placeholder
                .clone()
                .unwrap_or_else(|| defaults.placeholder().clone()),
        );
        for (category, configured) in [
            (Category::R, &self.r),
            (Category::G, &self.g),
            (Category::B, &self.b),
            (Category::Unknown, &None),
        ] {
            let titles = configured
                .clone()
                .unwrap_or_else(|| defaults.for_category(Some(category)));
            table = table.with(category, titles);
        }
        table
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_profile() -> String {
    "default".to_string()
}

fn default_r() -> f64 {
    0.682
}

fn default_g() -> f64 {
    0.24
}

fn default_b() -> f64 {
    0.045
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn load<T: serde::de::DeserializeOwned>(name: &str) -> anyhow::Result<T> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(name).required(false))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_analysis_config() -> anyhow::Result<AnalysisConfig> {
    load("config/analysis")
}

pub fn load_server_config() -> anyhow::Result<ServerConfig> {
    load("config/server")
}
