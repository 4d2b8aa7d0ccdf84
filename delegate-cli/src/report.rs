//! Report generation
//!
//! Renders scenario outcomes as an ASCII TXT report or as pretty JSON.

use crate::config::OutputFormat;
use crate::runner::ScenarioOutcome;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// RFC 3339 timestamp of report creation
    pub generated_at: String,
    pub tool_version: String,
    pub library_version: String,
    pub passed: usize,
    pub failed: usize,
    pub scenarios: Vec<ScenarioOutcome>,
}

impl RunReport {
    pub fn new(scenarios: Vec<ScenarioOutcome>) -> Self {
        let passed = scenarios.iter().filter(|s| s.passed()).count();
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            library_version: delegate_core::VERSION.to_string(),
            passed,
            failed: scenarios.len() - passed,
            scenarios,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Txt => Ok(self.render_txt()),
            OutputFormat::Json => {
                serde_json::to_string_pretty(self).context("Failed to serialize report")
            }
        }
    }

    fn render_txt(&self) -> String {
        let mut out = String::new();
        let rule = "═══════════════════════════════════════════════";

        // Writing into a String cannot fail
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "  Delegate Scenario Report");
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "Generated: {}", self.generated_at);
        let _ = writeln!(
            out,
            "Versions:  cli {} / delegate-core {}\n",
            self.tool_version, self.library_version
        );

        for scenario in &self.scenarios {
            let status = if scenario.passed() { "PASS" } else { "FAIL" };
            let _ = writeln!(out, "[{}] {}", status, scenario.name);
            let _ = writeln!(out, "  inputs:   {:?}", scenario.inputs);
            for pass in &scenario.passes {
                let _ = writeln!(out, "  {:<9} {:?}", format!("{}:", pass.target), pass.outputs);
                if let Some(expected) = &pass.expected {
                    if !pass.passed() {
                        let _ = writeln!(out, "  expected: {:?}", expected);
                    }
                }
            }
            if let Some(error) = &scenario.error {
                let _ = writeln!(out, "  error:    {}", error);
            }
        }

        let _ = writeln!(out, "───────────────────────────────────────────────");
        let _ = writeln!(
            out,
            "Summary: {} passed, {} failed, {} total",
            self.passed,
            self.failed,
            self.scenarios.len()
        );
        out
    }
}

/// Write the rendered report to `output`, or stdout when `None`
pub fn write_report(report: &RunReport, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let rendered = report.render(format)?;
    match output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            log::info!("Report written to {:?}", path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
