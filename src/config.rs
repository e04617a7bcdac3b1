use crate::db;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

pub const GRADING_SETTINGS_KEY: &str = "grading";

pub const DEFAULT_PASS_THRESHOLD: f64 = 60.0;
pub const DEFAULT_FILTER_THRESHOLD: f64 = 75.0;

/// Per-workspace grading settings, stored as JSON in the `settings` table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GradingSettings {
    /// Percentage at or above which a result passes.
    pub pass_threshold: f64,
    /// Cutoff used by `results.threshold` when the request gives none.
    pub default_threshold: f64,
}

impl Default for GradingSettings {
    fn default() -> Self {
        Self {
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            default_threshold: DEFAULT_FILTER_THRESHOLD,
        }
    }
}

impl GradingSettings {
    pub fn load(conn: &Connection) -> anyhow::Result<Self> {
        match db::settings_get_json(conn, GRADING_SETTINGS_KEY)? {
            Some(v) => Ok(serde_json::from_value(v)?),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, conn: &Connection) -> anyhow::Result<()> {
        db::settings_set_json(conn, GRADING_SETTINGS_KEY, &serde_json::to_value(self)?)
    }

    /// Applies a partial update. Unknown keys and out-of-range values are
    /// rejected and leave `self` untouched.
    pub fn merge_patch(&mut self, patch: &Map<String, Value>) -> Result<(), String> {
        let mut next = *self;
        for (k, v) in patch {
            let pct = || -> Result<f64, String> {
                let n = v.as_f64().ok_or_else(|| format!("{} must be a number", k))?;
                if !(0.0..=100.0).contains(&n) {
                    return Err(format!("{} must be in 0..=100", k));
                }
                Ok(n)
            };
            match k.as_str() {
                "passThreshold" => next.pass_threshold = pct()?,
                "defaultThreshold" => next.default_threshold = pct()?,
                _ => return Err(format!("unknown grading field: {}", k)),
            }
        }
        *self = next;
        Ok(())
    }
}

/// Process-level settings read once at startup.
#[derive(Debug, Clone, Default)]
pub struct DaemonConfig {
    pub workspace: Option<PathBuf>,
    pub role: Option<String>,
}

impl DaemonConfig {
    pub fn from_env() -> Self {
        Self {
            workspace: std::env::var_os("RESULTSD_WORKSPACE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            role: std::env::var("RESULTSD_ROLE").ok().filter(|v| !v.trim().is_empty()),
        }
    }
}
