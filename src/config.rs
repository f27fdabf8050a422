//! Report configuration.
//!
//! All fields have defaults, so an empty TOML document (or [`ReportConfig::default`]) yields a
//! usable configuration.

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::charts::Rgb;
use crate::error::{ReportError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Name shown in the header and used as the filename prefix.
    pub brand: String,
    /// Holder named in the copyright footer.
    pub copyright_holder: String,
    /// Maximum number of rows per tabular listing.
    pub table_row_limit: usize,
    /// Maximum number of characters per table cell before it is shortened.
    pub text_truncate_limit: usize,
    /// Number of trailing periods plotted in trend charts.
    pub line_chart_max_points: usize,
    pub margin_mm: f64,
    pub footer_height_mm: f64,
    pub accent_color: Rgb,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            brand: "Community Platform".to_string(),
            copyright_holder: "Community Platform".to_string(),
            table_row_limit: 10,
            text_truncate_limit: 40,
            line_chart_max_points: crate::charts::DEFAULT_MAX_POINTS,
            margin_mm: 15.0,
            footer_height_mm: 10.0,
            accent_color: Rgb(37, 99, 235),
        }
    }
}

impl ReportConfig {
    /// Parses a configuration from TOML and validates it.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: ReportConfig =
            toml::from_str(input).map_err(|err| ReportError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading report configuration from {}", path.display());
        let content = fs::read_to_string(path).map_err(|err| {
            ReportError::Config(format!("failed to read {}: {}", path.display(), err))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.brand.trim().is_empty() {
            return Err(ReportError::Config("brand must not be empty".into()));
        }
        if self.table_row_limit == 0 {
            return Err(ReportError::Config("table_row_limit must be positive".into()));
        }
        if self.text_truncate_limit < 4 {
            return Err(ReportError::Config(
                "text_truncate_limit must leave room for an ellipsis".into(),
            ));
        }
        if self.line_chart_max_points == 0 {
            return Err(ReportError::Config(
                "line_chart_max_points must be positive".into(),
            ));
        }
        if !(0.0..=60.0).contains(&self.margin_mm) {
            return Err(ReportError::Config(format!(
                "margin_mm {} is outside 0..=60",
                self.margin_mm
            )));
        }
        Ok(())
    }

    /// Copyright line printed in the footer of every page.
    pub fn copyright_line(&self, year: i32) -> String {
        format!("© {} {}. All rights reserved.", year, self.copyright_holder)
    }
}
