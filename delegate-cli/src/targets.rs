//! Catalog of bindable targets
//!
//! Every target has the signature `(i64,) -> i64`. Free functions are bound
//! directly, methods are bound to a [`Register`] instance named in the
//! scenario file.

use delegate_core::Delegate;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;

/// Delegate type used by all scenarios
pub type Operation<'a> = Delegate<'a, (i64,), i64>;

/// Free functions available to scenarios
pub const FUNCTIONS: &[&str] = &["double", "identity", "negate", "square"];

/// Methods available on every [`Register`] instance
pub const METHODS: &[&str] = &["add", "calls", "mul", "sub"];

/// Errors raised while resolving or running a scenario
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScenarioError {
    #[error("Invalid target {0:?}: expected \"<function>\" or \"<instance>.<method>\"")]
    InvalidTarget(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Unknown instance: {0}")]
    UnknownInstance(String),
}

/// Object whose methods can be bound to an [`Operation`]
#[derive(Debug)]
pub struct Register {
    value: i64,
    /// Number of method calls made on this instance
    calls: Cell<i64>,
}

impl Register {
    pub fn new(value: i64) -> Self {
        Self {
            value,
            calls: Cell::new(0),
        }
    }

    pub fn add(&self, x: i64) -> i64 {
        self.tick();
        self.value.wrapping_add(x)
    }

    pub fn sub(&self, x: i64) -> i64 {
        self.tick();
        self.value.wrapping_sub(x)
    }

    pub fn mul(&self, x: i64) -> i64 {
        self.tick();
        self.value.wrapping_mul(x)
    }

    /// Number of calls made before this one; the argument is ignored
    pub fn calls(&self, _x: i64) -> i64 {
        let previous = self.calls.get();
        self.tick();
        previous
    }

    fn tick(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

fn double(x: i64) -> i64 {
    x.wrapping_mul(2)
}

fn identity(x: i64) -> i64 {
    x
}

fn negate(x: i64) -> i64 {
    x.wrapping_neg()
}

fn square(x: i64) -> i64 {
    x.wrapping_mul(x)
}

/// A parsed scenario target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Free function, e.g. `double`
    Function(String),
    /// Method on a named instance, e.g. `acc.add`
    Method { instance: String, method: String },
}

impl Target {
    /// Parse `"<function>"` or `"<instance>.<method>"`
    pub fn parse(spec: &str) -> Result<Self, ScenarioError> {
        let spec = spec.trim();
        let invalid = || ScenarioError::InvalidTarget(spec.to_string());

        match spec.split_once('.') {
            None if is_identifier(spec) => Ok(Target::Function(spec.to_string())),
            Some((instance, method)) if is_identifier(instance) && is_identifier(method) => {
                Ok(Target::Method {
                    instance: instance.to_string(),
                    method: method.to_string(),
                })
            }
            _ => Err(invalid()),
        }
    }

    /// Check that the target exists in the catalog and that its instance is
    /// declared, without binding anything
    pub fn check<'n>(&self, mut instances: impl Iterator<Item = &'n str>) -> Result<(), ScenarioError> {
        match self {
            Target::Function(name) => {
                if !FUNCTIONS.contains(&name.as_str()) {
                    return Err(ScenarioError::UnknownFunction(name.clone()));
                }
            }
            Target::Method { instance, method } => {
                if !METHODS.contains(&method.as_str()) {
                    return Err(ScenarioError::UnknownMethod(method.clone()));
                }
                if !instances.any(|name| name == instance) {
                    return Err(ScenarioError::UnknownInstance(instance.clone()));
                }
            }
        }
        Ok(())
    }

    /// Bind this target to `delegate`, replacing any previous binding
    pub fn bind<'a>(
        &self,
        delegate: &mut Operation<'a>,
        instances: &'a HashMap<String, Register>,
    ) -> Result<(), ScenarioError> {
        match self {
            Target::Function(name) => bind_function(delegate, name),
            Target::Method { instance, method } => {
                let register = instances
                    .get(instance)
                    .ok_or_else(|| ScenarioError::UnknownInstance(instance.clone()))?;
                bind_method(delegate, method, register)
            }
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Function(name) => write!(f, "{}", name),
            Target::Method { instance, method } => write!(f, "{}.{}", instance, method),
        }
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Bind a catalog free function by name
pub fn bind_function(delegate: &mut Operation<'_>, name: &str) -> Result<(), ScenarioError> {
    match name {
        "double" => delegate.connect(double),
        "identity" => delegate.connect(identity),
        "negate" => delegate.connect(negate),
        "square" => delegate.connect(square),
        _ => return Err(ScenarioError::UnknownFunction(name.to_string())),
    }
    log::debug!("Bound free function {}", name);
    Ok(())
}

/// Bind a catalog method by name on `register`
pub fn bind_method<'a>(
    delegate: &mut Operation<'a>,
    method: &str,
    register: &'a Register,
) -> Result<(), ScenarioError> {
    match method {
        "add" => delegate.connect_method(Register::add, register),
        "sub" => delegate.connect_method(Register::sub, register),
        "mul" => delegate.connect_method(Register::mul, register),
        "calls" => delegate.connect_method(Register::calls, register),
        _ => return Err(ScenarioError::UnknownMethod(method.to_string())),
    }
    log::debug!("Bound method {} on register {:p}", method, register);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registers(entries: &[(&str, i64)]) -> HashMap<String, Register> {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), Register::new(*value)))
            .collect()
    }

    #[test]
    fn test_parse_targets() {
        assert_eq!(Target::parse("double").unwrap(), Target::Function("double".into()));
        assert_eq!(
            Target::parse(" acc.add ").unwrap(),
            Target::Method {
                instance: "acc".into(),
                method: "add".into()
            }
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", ".add", "acc.", "a.b.c", "1acc.add", "dou ble"] {
            assert!(
                matches!(Target::parse(bad), Err(ScenarioError::InvalidTarget(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_display_round_trips() {
        let target = Target::parse("acc.mul").unwrap();
        assert_eq!(target.to_string(), "acc.mul");
    }

    #[test]
    fn test_check_catalog() {
        let names = ["acc"];
        assert!(Target::parse("square").unwrap().check(names.into_iter()).is_ok());
        assert!(Target::parse("acc.sub").unwrap().check(names.into_iter()).is_ok());
        assert_eq!(
            Target::parse("cube").unwrap().check(names.into_iter()),
            Err(ScenarioError::UnknownFunction("cube".into()))
        );
        assert_eq!(
            Target::parse("acc.div").unwrap().check(names.into_iter()),
            Err(ScenarioError::UnknownMethod("div".into()))
        );
        assert_eq!(
            Target::parse("other.add").unwrap().check(names.into_iter()),
            Err(ScenarioError::UnknownInstance("other".into()))
        );
    }

    #[test]
    fn test_bind_functions() {
        let instances = registers(&[]);
        let mut delegate = Operation::new();
        for (name, input, expected) in [
            ("double", 21, 42),
            ("identity", 7, 7),
            ("negate", 3, -3),
            ("square", -4, 16),
        ] {
            Target::Function(name.into()).bind(&mut delegate, &instances).unwrap();
            assert_eq!(delegate.invoke(input), expected, "function {}", name);
        }
    }

    #[test]
    fn test_bind_methods() {
        let instances = registers(&[("acc", 5)]);
        let mut delegate = Operation::new();

        Target::parse("acc.add").unwrap().bind(&mut delegate, &instances).unwrap();
        assert_eq!(delegate.invoke(10), 15);
        assert!(delegate.is_bound_to(&instances["acc"]));

        Target::parse("acc.mul").unwrap().bind(&mut delegate, &instances).unwrap();
        assert_eq!(delegate.invoke(3), 15);

        Target::parse("acc.calls").unwrap().bind(&mut delegate, &instances).unwrap();
        assert_eq!(delegate.invoke(0), 2);
    }

    #[test]
    fn test_bind_unknown_instance() {
        let instances = registers(&[]);
        let mut delegate = Operation::new();
        let result = Target::parse("ghost.add").unwrap().bind(&mut delegate, &instances);
        assert_eq!(result, Err(ScenarioError::UnknownInstance("ghost".into())));
        assert!(delegate.is_empty());
    }

    #[test]
    fn test_wrapping_arithmetic() {
        let register = Register::new(i64::MAX);
        assert_eq!(register.add(1), i64::MIN);
        assert_eq!(negate(i64::MIN), i64::MIN);
    }
}
