//! Scheduler settings: a TOML file flattened into the string-keyed map the
//! scheduler configuration is parsed from, plus `--set` overrides.

use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Build the settings map from an optional TOML file and overrides.
///
/// Overrides are applied in order, so a later `--set` of the same key wins.
pub fn load_settings(
    file: Option<&Path>,
    overrides: &[(String, String)],
) -> Result<HashMap<String, String>> {
    let mut map = match file {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading settings file: {}", path.display()))?;
            flatten_toml(&text).with_context(|| format!("parsing settings file: {}", path.display()))?
        }
        None => HashMap::new(),
    };
    for (key, value) in overrides {
        map.insert(key.clone(), value.clone());
    }
    Ok(map)
}

/// Flatten top-level TOML scalars into strings.
pub fn flatten_toml(text: &str) -> Result<HashMap<String, String>> {
    let table: toml::Table = text.parse()?;
    table
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                other => bail!("setting '{}' must be a scalar, got {}", key, other.type_str()),
            };
            Ok((key, value))
        })
        .collect()
}

/// Parse `KEY=VALUE`. Only the first `=` separates, so CEW specifications
/// (`7-9=120,`) pass through intact.
pub fn parse_override(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got '{}'", raw).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_flatten_scalars() {
        let map = flatten_toml(
            "chargeRate = 150\ndeviationTime = 0.25\nrecalculate = true\nmethod = \"SPM\"\n",
        )
        .unwrap();
        assert_eq!(map["chargeRate"], "150");
        assert_eq!(map["deviationTime"], "0.25");
        assert_eq!(map["recalculate"], "true");
        assert_eq!(map["method"], "SPM");
    }

    #[test]
    fn test_nested_values_are_rejected() {
        let err = flatten_toml("[solver]\ntimeout = 5\n").unwrap_err();
        assert!(err.to_string().contains("solver"));
    }

    #[test]
    fn test_override_parsing() {
        assert_eq!(
            parse_override("CEW=7-9=120,").unwrap(),
            ("CEW".to_string(), "7-9=120,".to_string())
        );
        assert!(parse_override("chargeRate").is_err());
        assert!(parse_override("=5").is_err());
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "chargeRate = 150").unwrap();
        writeln!(file, "bigM = 1000").unwrap();

        let map = load_settings(
            Some(file.path()),
            &[("chargeRate".to_string(), "90".to_string())],
        )
        .unwrap();
        assert_eq!(map["chargeRate"], "90");
        assert_eq!(map["bigM"], "1000");
    }
}
