use std::fs;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Compiler options, loaded from a JSON file or left at their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Run constant folding before assembly.
    pub optimize: bool,
    /// Name of the global array every variable lives in.
    pub variable_array: String,
    /// Number of storage slots available before compilation fails.
    pub max_slots: usize,
    /// How deeply user function calls may be inlined into each other.
    pub max_inline_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            optimize: true,
            variable_array: "Vars".to_string(),
            max_slots: 1000,
            max_inline_depth: 16,
        }
    }
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Options {
    pub fn load(path: &Path) -> Result<Self, OptionsError> {
        let data = fs::read_to_string(path)?;
        let options = serde_json::from_str(&data)?;
        Ok(options)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let options: Options = serde_json::from_str(r#"{ "optimize": false }"#).unwrap();
        assert!(!options.optimize);
        assert_eq!(options.variable_array, "Vars");
        assert_eq!(options.max_slots, 1000);
        assert_eq!(options.max_inline_depth, 16);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = serde_json::from_str::<Options>(r#"{ "optimise": false }"#).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn load_from_file() {
        let dir = std::env::temp_dir().join("ramattra_test_options");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("ramattra.json");
        fs::write(&path, r#"{ "variable_array": "Slots", "max_slots": 64 }"#).unwrap();

        let options = Options::load(&path).unwrap();
        assert_eq!(options.variable_array, "Slots");
        assert_eq!(options.max_slots, 64);
        assert!(options.optimize);

        let missing = Options::load(&dir.join("nope.json")).unwrap_err();
        assert!(missing.to_string().starts_with("I/O error"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn schema_lists_every_option() {
        let schema = serde_json::to_value(schemars::schema_for!(Options)).unwrap();
        let properties = schema["properties"].as_object().unwrap();
        for key in ["optimize", "variable_array", "max_slots", "max_inline_depth"] {
            assert!(properties.contains_key(key), "{key}");
        }
    }
}
