use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dojo::tools::error::{Result, ToolError};
use crate::dojo::tools::status::StatusEngine;
use crate::dojo::tools::store::{CachePolicy, RecordStore};
use crate::dojo::tools::summary::MonthMatching;

/// Workbook used when neither the settings file nor the command line name one.
pub const DEFAULT_WORKBOOK: &str = "students.xlsx";

/// Runtime settings. Every field is optional in the JSON settings file.
///
/// ```json
/// { "workbook": "gym.xlsx", "month_matching": "month_and_year", "grace_months": 1 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub workbook: PathBuf,
    pub month_matching: MonthMatching,
    pub cache_policy: CachePolicy,
    pub grace_months: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workbook: PathBuf::from(DEFAULT_WORKBOOK),
            month_matching: MonthMatching::default(),
            cache_policy: CachePolicy::default(),
            grace_months: 0,
        }
    }
}

impl Settings {
    /// Reads settings from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ToolError::MissingInput(path.to_path_buf()));
        }
        let source = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&source)?;
        debug!(path = %path.display(), ?settings, "settings loaded");
        Ok(settings)
    }

    pub fn status_engine(&self) -> StatusEngine {
        StatusEngine::new(self.grace_months)
    }

    pub fn record_store(&self) -> RecordStore {
        RecordStore::new(&self.workbook, self.cache_policy)
    }
}
