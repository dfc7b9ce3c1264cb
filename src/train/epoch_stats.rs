use std::fmt;

use serde::{Deserialize, Serialize};

/// How an epoch's accuracy compares with the best seen before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpochOutcome {
    First,
    Better,
    Same,
    Worse,
}

impl EpochOutcome {
    pub fn compare(accuracy: f64, best: Option<f64>) -> EpochOutcome {
        match best {
            None => EpochOutcome::First,
            Some(best) if accuracy > best => EpochOutcome::Better,
            Some(best) if accuracy == best => EpochOutcome::Same,
            Some(_) => EpochOutcome::Worse,
        }
    }
}

impl fmt::Display for EpochOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EpochOutcome::First => Ok(()),
            EpochOutcome::Better => f.write_str(" (better)"),
            EpochOutcome::Same => f.write_str(" (same)"),
            EpochOutcome::Worse => f.write_str(" (worse)"),
        }
    }
}

/// Per-epoch statistics emitted by `train_loop`.
///
/// When a `progress_tx` channel is configured in `TrainConfig`, one value is
/// sent at the end of every completed epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochStats {
    /// 0-based epoch number.
    pub epoch: usize,
    pub total_epochs: usize,
    /// Mean squared error over the training samples of this epoch.
    pub train_loss: f64,
    /// Test accuracy in [0, 1], measured on a clone after the epoch.
    pub accuracy: f64,
    pub outcome: EpochOutcome,
    /// Wall-clock duration of the training pass in milliseconds.
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_relative_to_best() {
        assert_eq!(EpochOutcome::compare(0.5, None), EpochOutcome::First);
        assert_eq!(EpochOutcome::compare(0.6, Some(0.5)), EpochOutcome::Better);
        assert_eq!(EpochOutcome::compare(0.5, Some(0.5)), EpochOutcome::Same);
        assert_eq!(EpochOutcome::compare(0.4, Some(0.5)), EpochOutcome::Worse);
        assert_eq!(EpochOutcome::Better.to_string(), " (better)");
        assert_eq!(EpochOutcome::First.to_string(), "");
    }
}
