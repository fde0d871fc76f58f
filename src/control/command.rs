//! Commands accepted by a run loop.

use serde::{Deserialize, Serialize};

use crate::schema::SimulationConfig;

/// Command dispatched into a run loop by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "snake_case")]
pub enum Command {
    /// Create an engine for the config.
    Initialize(SimulationConfig),
    /// Run one step (coalesced while a step is in flight).
    RequestStep,
    ToggleAutoRun,
    /// Dispose the engine and return to the uninitialized phase.
    Reset,
    /// Reinitialize the live engine in place with a new config.
    Restart(SimulationConfig),
}

const COMMAND_TYPES: [&str; 5] = [
    "initialize",
    "request_step",
    "toggle_auto_run",
    "reset",
    "restart",
];

impl Command {
    /// Parse a JSON command such as `{"type": "request_step"}`.
    pub fn from_json(json: &str) -> Result<Self, CommandError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let kind = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or(CommandError::MissingType)?;
        if !COMMAND_TYPES.contains(&kind) {
            return Err(CommandError::UnknownType(kind.to_string()));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialize(_) => "initialize",
            Self::RequestStep => "request_step",
            Self::ToggleAutoRun => "toggle_auto_run",
            Self::Reset => "reset",
            Self::Restart(_) => "restart",
        }
    }
}

/// JSON command parsing errors.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Malformed command: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Command has no type")]
    MissingType,
    #[error("Unknown command type {0:?}")]
    UnknownType(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unit_commands() {
        assert_eq!(
            Command::from_json(r#"{"type": "request_step"}"#).unwrap(),
            Command::RequestStep
        );
        assert_eq!(
            Command::from_json(r#"{"type": "toggle_auto_run"}"#).unwrap(),
            Command::ToggleAutoRun
        );
        assert_eq!(
            Command::from_json(r#"{"type": "reset"}"#).unwrap(),
            Command::Reset
        );
    }

    #[test]
    fn test_parse_initialize() {
        let command = Command::from_json(
            r#"{"type": "initialize", "config": {"ca": {"width": 32, "height": 32}}}"#,
        )
        .unwrap();
        let Command::Initialize(config) = command else {
            panic!("expected initialize");
        };
        assert_eq!(config.ca.width, 32);
        assert_eq!(config.ea.population_size, 100);
    }

    #[test]
    fn test_round_trip_names() {
        for command in [
            Command::Initialize(SimulationConfig::default()),
            Command::RequestStep,
            Command::ToggleAutoRun,
            Command::Reset,
            Command::Restart(SimulationConfig::default()),
        ] {
            let json = serde_json::to_string(&command).unwrap();
            assert!(json.contains(command.name()));
            assert_eq!(Command::from_json(&json).unwrap(), command);
        }
    }

    #[test]
    fn test_rejects_unknown_and_malformed() {
        assert!(matches!(
            Command::from_json(r#"{"type": "explode"}"#),
            Err(CommandError::UnknownType(t)) if t == "explode"
        ));
        assert!(matches!(
            Command::from_json(r#"{"kind": "reset"}"#),
            Err(CommandError::MissingType)
        ));
        assert!(matches!(
            Command::from_json("not json"),
            Err(CommandError::Malformed(_))
        ));
        assert!(matches!(
            Command::from_json(r#"{"type": "initialize"}"#),
            Err(CommandError::Malformed(_))
        ));
    }
}
