use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;
use std::time::Instant;

use log::{info, warn};

use crate::checkpoint::store::{CheckpointStore, SaveOutcome};
use crate::data::sample::Sample;
use crate::error::{CheckpointError, NetworkError};
use crate::network::network::Network;
use crate::optim::sgd::Sgd;
use crate::train::epoch_stats::{EpochOutcome, EpochStats};
use crate::train::evaluate::accuracy;
use crate::train::train_config::TrainConfig;
use crate::train::trainer::train_epoch;

type PendingSave = JoinHandle<Result<SaveOutcome, CheckpointError>>;

/// Summary of a finished `train_loop` run.
#[derive(Debug, Clone, Default)]
pub struct TrainReport {
    pub epochs_run: usize,
    pub best_accuracy: Option<f64>,
    pub best_epoch: Option<usize>,
    pub history: Vec<EpochStats>,
    /// Checkpoints written during the run, oldest first. Earlier ones may
    /// already have been replaced by later ones.
    pub checkpoints: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` for `config.epochs` epochs, one sample at a time.
///
/// After every epoch the network is cloned on this thread, the clone is
/// scored on `test`, and if it beats every earlier epoch it is handed to a
/// background checkpoint save (when `config.checkpoint_dir` is set). Saves
/// never block training and their failures are only logged.
///
/// # Early termination
/// The loop breaks early if the `progress_tx` receiver has been dropped or
/// `config.stop_flag` is set.
///
/// # Errors
/// Returns the first shape error from a sample; pending saves are still
/// joined before returning.
pub fn train_loop(
    network: &mut Network,
    train: &[Sample],
    test: &[Sample],
    config: &TrainConfig,
) -> Result<TrainReport, NetworkError> {
    let mut report = TrainReport::default();
    let mut pending: Vec<PendingSave> = Vec::new();

    let result = run_epochs(network, train, test, config, &mut report, &mut pending);

    for handle in pending {
        record_save(handle, &mut report.checkpoints);
    }

    result.map(|()| report)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn run_epochs(
    network: &mut Network,
    train: &[Sample],
    test: &[Sample],
    config: &TrainConfig,
    report: &mut TrainReport,
    pending: &mut Vec<PendingSave>,
) -> Result<(), NetworkError> {
    let optimizer = Sgd::new(config.learning_rate);
    let mut rng = config.shuffle_rng();
    let signature = network.architecture().signature();
    let store = config.checkpoint_dir.as_ref().map(CheckpointStore::new);

    for epoch in 0..config.epochs {
        if stop_requested(config) {
            break;
        }

        let t_start = Instant::now();
        let train_loss = train_epoch(network, train, &optimizer, &mut rng)?;
        let elapsed_ms = t_start.elapsed().as_millis() as u64;

        // Scored and persisted; the live network stays on this thread.
        let mut snapshot = network.clone();
        let acc = accuracy(&mut snapshot, test)?;
        let outcome = EpochOutcome::compare(acc, report.best_accuracy);

        info!(
            "[{signature}] Epoch #{epoch}, Accuracy=={:.2}%{outcome}, loss={train_loss:.6}",
            acc * 100.0
        );

        if matches!(outcome, EpochOutcome::First | EpochOutcome::Better) {
            report.best_accuracy = Some(acc);
            report.best_epoch = Some(epoch);
            if let Some(store) = &store {
                pending.push(store.save_in_background(snapshot, signature.clone(), epoch, acc));
            }
        }

        reap_finished(pending, &mut report.checkpoints);

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_loss,
            accuracy: acc,
            outcome,
            elapsed_ms,
        };
        report.epochs_run += 1;
        report.history.push(stats.clone());

        if let Some(tx) = &config.progress_tx {
            if tx.send(stats).is_err() {
                break;
            }
        }
    }
    Ok(())
}

fn stop_requested(config: &TrainConfig) -> bool {
    config
        .stop_flag
        .as_ref()
        .is_some_and(|flag| flag.load(Ordering::Relaxed))
}

/// Joins the saves that have already finished, keeping the rest pending.
fn reap_finished(pending: &mut Vec<PendingSave>, checkpoints: &mut Vec<PathBuf>) {
    let (done, running): (Vec<_>, Vec<_>) = pending.drain(..).partition(|h| h.is_finished());
    *pending = running;
    for handle in done {
        record_save(handle, checkpoints);
    }
}

fn record_save(handle: PendingSave, checkpoints: &mut Vec<PathBuf>) {
    match handle.join() {
        Ok(Ok(SaveOutcome::Saved { path, .. })) => checkpoints.push(path),
        Ok(Ok(SaveOutcome::Skipped { .. })) => {}
        Ok(Err(e)) => warn!("checkpoint not saved: {e}"),
        Err(_) => warn!("checkpoint not saved: {}", CheckpointError::TaskPanicked),
    }
}
