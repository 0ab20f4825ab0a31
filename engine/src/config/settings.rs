// Report settings, loaded from an optional JSON file next to the data.
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::EngineError;
use crate::inventory::{DEFAULT_NEW_ARRIVAL_DAYS, DEFAULT_OVERDUE_DAYS};
use crate::metrics::loss::IPVA_WARNING_DAYS;
use crate::metrics::rankings::{REVENUE_CHART_LIMIT, TOP_SALES_LIMIT};
use crate::periods::Period;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub default_period: Period,
    pub top_sales_limit: usize,
    pub revenue_chart_limit: usize,
    /// Vehicles older than this many days count as overdue.
    pub overdue_threshold_days: u32,
    pub ipva_warning_days: u32,
    pub new_arrival_days: u32,
}

impl Default for ReportSettings {
    fn default() -> Self {
        ReportSettings {
            default_period: Period::default(),
            top_sales_limit: TOP_SALES_LIMIT,
            revenue_chart_limit: REVENUE_CHART_LIMIT,
            overdue_threshold_days: DEFAULT_OVERDUE_DAYS,
            ipva_warning_days: IPVA_WARNING_DAYS,
            new_arrival_days: DEFAULT_NEW_ARRIVAL_DAYS,
        }
    }
}

impl ReportSettings {
    /// Reads settings from a JSON file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path)?;
        let settings: ReportSettings = serde_json::from_str(&raw).map_err(|e| {
            EngineError::ConfigError(format!("Failed to parse settings at {}: {}", path.display(), e))
        })?;
        settings.validate()?;
        tracing::debug!(path = %path.display(), "Loaded report settings");
        Ok(settings)
    }

    /// Settings from `path` when given, the defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, EngineError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.top_sales_limit == 0 {
            return Err(EngineError::ConfigError("top_sales_limit must be at least 1".to_string()));
        }
        if self.revenue_chart_limit == 0 {
            return Err(EngineError::ConfigError(
                "revenue_chart_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
