//! Bridge settings

use crate::error::BridgeError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Bridge settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    pub engine: EngineSettings,
    pub script: ScriptSettings,
}

/// Engine heap limits; `None` keeps the engine default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub memory_limit: Option<usize>,
    pub gc_threshold: Option<usize>,
    pub max_stack_size: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    /// Evaluate sources in strict mode.
    pub strict: bool,
}

impl BridgeSettings {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> Result<Self, BridgeError> {
        let json = std::fs::read_to_string(path).map_err(|source| BridgeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json).map_err(|source| BridgeError::Settings {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = BridgeSettings::from_json(r#"{ "engine": { "memory_limit": 1048576 } }"#).unwrap();
        assert_eq!(settings.engine.memory_limit, Some(1 << 20));
        assert_eq!(settings.engine.gc_threshold, None);
        assert!(!settings.script.strict);
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(BridgeSettings::from_json("{}").unwrap(), BridgeSettings::default());
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = BridgeSettings::load(Path::new("/nonexistent/tether.json")).unwrap_err();
        assert!(matches!(err, BridgeError::Io { .. }));
    }
}
