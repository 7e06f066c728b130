use crate::EnumConversionError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Outcome a test scenario reported for the path it walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    Error,
    NotRun,
}

impl FromStr for ScenarioStatus {
    type Err = EnumConversionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "passed" => Ok(ScenarioStatus::Passed),
            "failed" => Ok(ScenarioStatus::Failed),
            "error" => Ok(ScenarioStatus::Error),
            "not_run" | "not-run" => Ok(ScenarioStatus::NotRun),
            _ => Err(EnumConversionError::InvalidScenarioStatus(value.to_string())),
        }
    }
}

/// Render-side status of a connector line.
///
/// The declaration order is the sort order used for multi-status style keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStatus {
    Executed,
    Passed,
    Failed,
    Error,
    NotRun,
}

impl PathStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathStatus::Executed => "executed",
            PathStatus::Passed => "passed",
            PathStatus::Failed => "failed",
            PathStatus::Error => "error",
            PathStatus::NotRun => "not-run",
        }
    }
}

impl From<ScenarioStatus> for PathStatus {
    fn from(status: ScenarioStatus) -> Self {
        match status {
            ScenarioStatus::Passed => PathStatus::Passed,
            ScenarioStatus::Failed => PathStatus::Failed,
            ScenarioStatus::Error => PathStatus::Error,
            ScenarioStatus::NotRun => PathStatus::NotRun,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_status_accepts_both_not_run_spellings() {
        assert_eq!("not_run".parse::<ScenarioStatus>().unwrap(), ScenarioStatus::NotRun);
        assert_eq!("not-run".parse::<ScenarioStatus>().unwrap(), ScenarioStatus::NotRun);
        assert!("skipped".parse::<ScenarioStatus>().is_err());
    }

    #[test]
    fn path_status_order_puts_executed_first() {
        let mut statuses = vec![PathStatus::Failed, PathStatus::Executed, PathStatus::Passed];
        statuses.sort();
        assert_eq!(
            statuses,
            vec![PathStatus::Executed, PathStatus::Passed, PathStatus::Failed]
        );
        assert_eq!(PathStatus::from(ScenarioStatus::Error), PathStatus::Error);
    }
}
