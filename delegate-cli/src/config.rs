//! Scenario configuration loading and validation

use crate::targets::Target;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from a scenario TOML file)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub instances: Vec<InstanceConfig>,
    #[serde(default)]
    pub scenarios: Vec<ScenarioConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RunConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Run scenarios on the rayon thread pool
    #[serde(default)]
    pub parallel: bool,
    /// Report destination (default: stdout)
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
}

/// A `Register` instance methods can be bound to
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstanceConfig {
    pub name: String,
    #[serde(default)]
    pub value: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub name: String,
    /// `"<function>"` or `"<instance>.<method>"`
    pub target: String,
    #[serde(default)]
    pub inputs: Vec<i64>,
    /// Expected outputs of the first pass, one per input
    pub expect: Option<Vec<i64>>,
    /// Target to re-connect the same delegate to for a second pass
    pub rebind: Option<String>,
    /// Expected outputs of the second pass
    pub expect_rebind: Option<Vec<i64>>,
}

impl AppConfig {
    /// Check that every scenario resolves against the catalog and the
    /// declared instances
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for instance in &self.instances {
            if !names.insert(instance.name.as_str()) {
                bail!("Duplicate instance name: {}", instance.name);
            }
        }

        for scenario in &self.scenarios {
            let declared = || self.instances.iter().map(|i| i.name.as_str());

            let targets = std::iter::once(&scenario.target).chain(scenario.rebind.as_ref());
            for spec in targets {
                Target::parse(spec)
                    .and_then(|target| target.check(declared()))
                    .with_context(|| format!("Scenario {:?}", scenario.name))?;
            }

            check_expectation(&scenario.name, "expect", &scenario.expect, scenario.inputs.len())?;
            check_expectation(
                &scenario.name,
                "expect_rebind",
                &scenario.expect_rebind,
                scenario.inputs.len(),
            )?;
            if scenario.expect_rebind.is_some() && scenario.rebind.is_none() {
                bail!("Scenario {:?}: expect_rebind given without rebind", scenario.name);
            }
        }

        Ok(())
    }
}

fn check_expectation(scenario: &str, field: &str, expect: &Option<Vec<i64>>, inputs: usize) -> Result<()> {
    match expect {
        Some(values) if values.len() != inputs => bail!(
            "Scenario {:?}: {} has {} values for {} inputs",
            scenario,
            field,
            values.len(),
            inputs
        ),
        _ => Ok(()),
    }
}

/// Load and validate configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .validate()
        .with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
        [run]
        format = "json"
        parallel = true

        [[instances]]
        name = "acc"
        value = 5

        [[scenarios]]
        name = "add"
        target = "acc.add"
        inputs = [10, 20]
        expect = [15, 25]

        [[scenarios]]
        name = "double then negate"
        target = "double"
        inputs = [21]
        expect = [42]
        rebind = "negate"
        expect_rebind = [-21]
    "#;

    #[test]
    fn test_config_deserialization() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.run.format, OutputFormat::Json);
        assert!(config.run.parallel);
        assert_eq!(config.instances.len(), 1);
        assert_eq!(config.scenarios.len(), 2);
        assert_eq!(config.scenarios[1].rebind.as_deref(), Some("negate"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.run.format, OutputFormat::Txt);
        assert!(!config.run.parallel);
        assert!(config.scenarios.is_empty());
    }

    #[test]
    fn test_validate_unknown_instance() {
        let config: AppConfig = toml::from_str(
            r#"
            [[scenarios]]
            name = "orphan"
            target = "missing.add"
            "#,
        )
        .unwrap();
        let error = format!("{:#}", config.validate().unwrap_err());
        assert!(error.contains("Unknown instance: missing"), "{}", error);
    }

    #[test]
    fn test_validate_expectation_length() {
        let config: AppConfig = toml::from_str(
            r#"
            [[scenarios]]
            name = "short"
            target = "double"
            inputs = [1, 2]
            expect = [2]
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_duplicate_instance() {
        let config: AppConfig = toml::from_str(
            r#"
            [[instances]]
            name = "acc"
            [[instances]]
            name = "acc"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.scenarios[0].target, "acc.add");
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(&dir.path().join("absent.toml"));
        assert!(result.is_err());
    }
}
