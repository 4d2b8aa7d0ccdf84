//! Scenario execution
//!
//! Each scenario builds its own instances and a single delegate, runs the
//! inputs through it, optionally re-connects it to a second target and runs
//! the inputs again. Nothing is shared between scenarios, so they can run on
//! separate rayon workers.

use crate::config::{AppConfig, InstanceConfig, ScenarioConfig};
use crate::targets::{Operation, Register, ScenarioError, Target};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

/// Result of running the inputs through one binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassOutcome {
    pub target: String,
    pub outputs: Vec<i64>,
    pub expected: Option<Vec<i64>>,
}

impl PassOutcome {
    pub fn passed(&self) -> bool {
        match &self.expected {
            Some(expected) => expected == &self.outputs,
            None => true,
        }
    }
}

/// Result of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub inputs: Vec<i64>,
    pub passes: Vec<PassOutcome>,
    /// Set when the scenario could not be bound or run
    pub error: Option<String>,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.error.is_none() && self.passes.iter().all(PassOutcome::passed)
    }
}

/// Run every scenario of `config`, in declaration order
pub fn run_all(config: &AppConfig) -> Vec<ScenarioOutcome> {
    log::info!(
        "Running {} scenario(s){}",
        config.scenarios.len(),
        if config.run.parallel { " in parallel" } else { "" }
    );

    if config.run.parallel {
        config
            .scenarios
            .par_iter()
            .map(|scenario| run_scenario(scenario, &config.instances))
            .collect()
    } else {
        config
            .scenarios
            .iter()
            .map(|scenario| run_scenario(scenario, &config.instances))
            .collect()
    }
}

/// Run one scenario with fresh instances
pub fn run_scenario(scenario: &ScenarioConfig, instances: &[InstanceConfig]) -> ScenarioOutcome {
    log::debug!("Scenario {:?}: target {}", scenario.name, scenario.target);

    let registers = build_registers(instances);
    let mut outcome = ScenarioOutcome {
        name: scenario.name.clone(),
        inputs: scenario.inputs.clone(),
        passes: Vec::new(),
        error: None,
    };

    let mut passes = vec![(scenario.target.as_str(), scenario.expect.as_ref())];
    if let Some(rebind) = &scenario.rebind {
        passes.push((rebind.as_str(), scenario.expect_rebind.as_ref()));
    }

    let mut delegate = Operation::new();
    for (spec, expected) in passes {
        match run_pass(&mut delegate, spec, &scenario.inputs, &registers) {
            Ok(outputs) => {
                let pass = PassOutcome {
                    target: spec.to_string(),
                    outputs,
                    expected: expected.cloned(),
                };
                if !pass.passed() {
                    log::warn!(
                        "Scenario {:?}: {} produced {:?}, expected {:?}",
                        scenario.name,
                        spec,
                        pass.outputs,
                        pass.expected
                    );
                }
                outcome.passes.push(pass);
            }
            Err(e) => {
                log::error!("Scenario {:?}: {}", scenario.name, e);
                outcome.error = Some(e.to_string());
                break;
            }
        }
    }

    outcome
}

/// Connect `delegate` to `spec` and feed it every input
///
/// A successful bind leaves the delegate non-empty, so inputs use `invoke`.
fn run_pass<'a>(
    delegate: &mut Operation<'a>,
    spec: &str,
    inputs: &[i64],
    registers: &'a HashMap<String, Register>,
) -> Result<Vec<i64>, ScenarioError> {
    let target = Target::parse(spec)?;
    target.bind(delegate, registers)?;

    Ok(inputs.iter().map(|&input| delegate.invoke(input)).collect())
}

fn build_registers(instances: &[InstanceConfig]) -> HashMap<String, Register> {
    instances
        .iter()
        .map(|instance| (instance.name.clone(), Register::new(instance.value)))
        .collect()
}
