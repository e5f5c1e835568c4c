// Category domain model - colour channel a measurement belongs to
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    R,
    G,
    B,
    /// Point sitting exactly on the y = 0 line; classified, but into no channel.
    #[serde(rename = "-")]
    Unknown,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::R => "R",
            Category::G => "G",
            Category::B => "B",
            Category::Unknown => "-",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that carries exactly one category.
pub trait HasCategory {
    fn category(&self) -> Category;
}

impl HasCategory for Category {
    fn category(&self) -> Category {
        *self
    }
}

impl<T: HasCategory + ?Sized> HasCategory for &T {
    fn category(&self) -> Category {
        (**self).category()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierThresholds {
    #[serde(default = "default_x_threshold")]
    pub x_threshold: f64,
    #[serde(default = "default_y_threshold")]
    pub y_threshold: f64,
}

fn default_x_threshold() -> f64 {
    0.6
}

fn default_y_threshold() -> f64 {
    0.2
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            x_threshold: default_x_threshold(),
            y_threshold: default_y_threshold(),
        }
    }
}

/// Classify a chromaticity pair. First matching rule wins.
pub fn classify(x: f64, y: f64, thresholds: &ClassifierThresholds) -> Category {
    if x > thresholds.x_threshold {
        Category::R
    } else if y < thresholds.y_threshold {
        if y == 0.0 {
            Category::Unknown
        } else {
            Category::B
        }
    } else {
        Category::G
    }
}
