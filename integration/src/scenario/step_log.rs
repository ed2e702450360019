//! The append-only log of the scenario's steps

use std::fmt::Display;

use eyre::{eyre, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

/// The outcome of a step
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub(crate) enum StepOutcome {
    /// The step succeeded with the given receipt or value
    Ok {
        /// The receipt or value
        value: Value,
    },
    /// The step failed as expected
    ExpectedRevert {
        /// The caught error
        error: String,
    },
    /// The step failed, aborting the scenario
    Error {
        /// The error
        error: String,
    },
    /// The step was expected to fail but succeeded, aborting the scenario
    UnexpectedSuccess {
        /// The receipt or value
        value: Value,
    },
}

/// A logged step
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct StepEntry {
    /// The name of the step
    pub(crate) step: String,
    /// What came out of it
    #[serde(flatten)]
    pub(crate) outcome: StepOutcome,
}

/// The steps attempted so far, in submission order
#[derive(Debug, Default)]
pub(crate) struct StepLog {
    /// The logged steps
    entries: Vec<StepEntry>,
}

impl StepLog {
    /// The logged steps
    pub(crate) fn entries(&self) -> &[StepEntry] {
        &self.entries
    }

    /// Log a step expected to succeed.
    ///
    /// A failure is logged under the step's name before being returned.
    pub(crate) fn record<T: Serialize, E: Display>(
        &mut self,
        step: &str,
        result: Result<T, E>,
    ) -> Result<T> {
        info!("== step: {step}");
        match result {
            Ok(value) => {
                self.push(step, StepOutcome::Ok { value: to_json(&value) });
                Ok(value)
            }
            Err(e) => {
                error!("step {step} failed: {e}");
                self.push(step, StepOutcome::Error { error: e.to_string() });
                Err(eyre!("step {step} failed: {e}"))
            }
        }
    }

    /// Log a step expected to fail, the caught error being its successful outcome.
    ///
    /// A success is logged as unexpected and returned as an error.
    pub(crate) fn record_expected_revert<T: Serialize, E: Display>(
        &mut self,
        step: &str,
        result: Result<T, E>,
    ) -> Result<()> {
        info!("== step: {step} (expected to fail)");
        match result {
            Ok(value) => {
                error!("step {step} succeeded but was expected to fail");
                self.push(step, StepOutcome::UnexpectedSuccess { value: to_json(&value) });
                Err(eyre!("step {step} succeeded but was expected to fail"))
            }
            Err(e) => {
                info!("step {step} failed as expected: {e}");
                self.push(step, StepOutcome::ExpectedRevert { error: e.to_string() });
                Ok(())
            }
        }
    }

    /// Render the log as pretty JSON
    pub(crate) fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    // -----------
    // | Helpers |
    // -----------

    /// Append an entry
    fn push(&mut self, step: &str, outcome: StepOutcome) {
        self.entries.push(StepEntry { step: step.to_string(), outcome });
    }
}

/// Convert a step's value to JSON, replacing an unserializable value by its error
fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| Value::String(format!("unserializable: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_steps_logged_in_order() {
        let mut log = StepLog::default();

        log.record("setMinter", Ok::<_, String>(1u64)).unwrap();
        log.record_expected_revert("overMinting", Err::<u64, _>("execution reverted"))
            .unwrap();
        log.record("setInvestorCap", Ok::<_, String>("done")).unwrap();

        let steps: Vec<&str> = log.entries().iter().map(|e| e.step.as_str()).collect();
        assert_eq!(steps, ["setMinter", "overMinting", "setInvestorCap"]);
        assert_eq!(
            log.entries()[1].outcome,
            StepOutcome::ExpectedRevert { error: "execution reverted".to_string() }
        );
    }

    #[test]
    fn test_failed_step_logged_before_abort() {
        let mut log = StepLog::default();

        let res = log.record("investorBuys", Err::<u64, _>("insufficient funds"));

        assert!(res.is_err());
        assert_eq!(log.entries().len(), 1);
        assert_eq!(
            log.entries()[0].outcome,
            StepOutcome::Error { error: "insufficient funds".to_string() }
        );
    }

    #[test]
    fn test_unexpected_success_aborts() {
        let mut log = StepLog::default();

        let res = log.record_expected_revert("issuerTokens1", Ok::<_, String>(true));

        assert!(res.is_err());
        assert_eq!(
            log.entries()[0].outcome,
            StepOutcome::UnexpectedSuccess { value: json!(true) }
        );
    }

    #[test]
    fn test_json_shape() {
        let mut log = StepLog::default();
        log.record("setPauser", Ok::<_, String>(json!({ "status": true }))).unwrap();

        let rendered: Value = serde_json::from_str(&log.to_json().unwrap()).unwrap();
        assert_eq!(
            rendered,
            json!([{ "step": "setPauser", "outcome": "ok", "value": { "status": true } }])
        );
    }
}
