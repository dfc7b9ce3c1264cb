use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::checkpoint::filename::{basis_points, CheckpointName};
use crate::checkpoint::record::{read_record, write_network};
use crate::checkpoint::retry::{remove_with_retry, retry_delete, RetryPolicy};
use crate::error::CheckpointError;
use crate::network::network::Network;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What a `save` call did.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// A new checkpoint was written; `replaced` lists the worse ones deleted.
    Saved { path: PathBuf, replaced: Vec<PathBuf> },
    /// A checkpoint at least as accurate already exists; nothing was written.
    Skipped { existing: PathBuf, existing_accuracy: f64 },
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Keeps at most one checkpoint per architecture signature in a directory:
/// the most accurate one seen so far.
///
/// The guarantee is eventual, not atomic. Worse files are deleted before the
/// new one is written, so a crash in between can leave none.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    directory: PathBuf,
    retry: RetryPolicy,
}

impl CheckpointStore {
    pub fn new(directory: impl Into<PathBuf>) -> CheckpointStore {
        CheckpointStore { directory: directory.into(), retry: RetryPolicy::default() }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> CheckpointStore {
        self.retry = retry;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Persists `network` if `accuracy` beats every stored checkpoint for
    /// `signature`.
    ///
    /// Saves into the same directory are serialized within the process, so
    /// concurrent callers cannot both conclude they are the best.
    ///
    /// # Errors
    /// - `InvalidSignature` when `signature` cannot be encoded in a file name
    ///   and read back; nothing is touched on disk.
    /// - `DeleteFailed` when a worse checkpoint could not be removed; the
    ///   stale file stays and nothing new is written.
    /// - `Io` / `Serialize` when writing fails; the partial file is removed.
    pub fn save(
        &self,
        network: &Network,
        signature: &str,
        epoch: usize,
        accuracy: f64,
    ) -> Result<SaveOutcome, CheckpointError> {
        self.save_with(network, signature, epoch, accuracy, |path| fs::remove_file(path))
    }

    /// `save` with the delete step supplied by the caller.
    pub(crate) fn save_with<D>(
        &self,
        network: &Network,
        signature: &str,
        epoch: usize,
        accuracy: f64,
        mut delete: D,
    ) -> Result<SaveOutcome, CheckpointError>
    where
        D: FnMut(&Path) -> io::Result<()>,
    {
        CheckpointName::check_signature(signature).map_err(|reason| CheckpointError::InvalidSignature {
            signature: signature.to_owned(),
            reason,
        })?;

        fs::create_dir_all(&self.directory).map_err(|e| CheckpointError::io(&self.directory, e))?;

        let lock = directory_lock(&self.directory);
        let _guard = lock.lock();

        let candidate = basis_points(accuracy);
        let existing = self.list(signature)?;

        if let Some((path, name)) = existing.iter().find(|(_, name)| name.basis_points >= candidate) {
            info!(
                "existing checkpoint {} ({:.2}%) is at least as accurate as {:.2}%, not saving",
                path.display(),
                name.accuracy() * 100.0,
                accuracy * 100.0
            );
            return Ok(SaveOutcome::Skipped {
                existing: path.clone(),
                existing_accuracy: name.accuracy(),
            });
        }

        let mut replaced = Vec::with_capacity(existing.len());
        for (path, _) in existing {
            retry_delete(&path, &self.retry, &mut delete)?;
            debug!("deleted superseded checkpoint {}", path.display());
            replaced.push(path);
        }

        let (path, file) = self.create_unique(CheckpointName::now(signature, epoch, accuracy))?;
        self.write_or_discard(&path, file, |writer| {
            write_network(writer, network).map_err(|e| e.to_string())
        })?;

        info!("network configuration saved to {}", path.display());
        Ok(SaveOutcome::Saved { path, replaced })
    }

    /// Runs `save` on a background thread against an owned snapshot, so the
    /// training loop never waits on disk I/O.
    pub fn save_in_background(
        &self,
        network: Network,
        signature: String,
        epoch: usize,
        accuracy: f64,
    ) -> JoinHandle<Result<SaveOutcome, CheckpointError>> {
        let store = self.clone();
        thread::spawn(move || store.save(&network, &signature, epoch, accuracy))
    }

    /// Restores a network from a checkpoint file.
    pub fn load(path: impl AsRef<Path>) -> Result<Network, CheckpointError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| CheckpointError::io(path, e))?;
        let record = read_record(BufReader::new(file)).map_err(|e| CheckpointError::Deserialize {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        record.into_network(path)
    }

    /// The surviving checkpoint for `signature`, if any.
    pub fn best(&self, signature: &str) -> Result<Option<(PathBuf, CheckpointName)>, CheckpointError> {
        Ok(self.list(signature)?.into_iter().next())
    }

    /// Checkpoints recorded for exactly `signature`, most accurate first.
    /// A missing directory holds no checkpoints.
    pub fn list(&self, signature: &str) -> Result<Vec<(PathBuf, CheckpointName)>, CheckpointError> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CheckpointError::io(&self.directory, e)),
        };

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CheckpointError::io(&self.directory, e))?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str().and_then(CheckpointName::parse) else {
                continue;
            };
            if name.signature == signature {
                found.push((entry.path(), name));
            }
        }
        found.sort_by(|(_, a), (_, b)| b.basis_points.cmp(&a.basis_points));
        Ok(found)
    }

    fn create_unique(&self, mut name: CheckpointName) -> Result<(PathBuf, File), CheckpointError> {
        loop {
            let path = self.directory.join(name.to_string());
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => name = name.bump(),
                Err(e) => return Err(CheckpointError::io(path, e)),
            }
        }
    }

    /// Runs `write` against `file`; on any failure the partial file is
    /// removed so the directory never holds a truncated checkpoint.
    fn write_or_discard<F>(&self, path: &Path, file: File, write: F) -> Result<(), CheckpointError>
    where
        F: FnOnce(&mut BufWriter<File>) -> Result<(), String>,
    {
        let mut writer = BufWriter::new(file);
        let result = write(&mut writer)
            .and_then(|()| writer.flush().map_err(|e| e.to_string()))
            .and_then(|()| writer.get_ref().sync_all().map_err(|e| e.to_string()));
        drop(writer);

        if let Err(reason) = result {
            warn!("failed to write network configuration {}: {reason}", path.display());
            if let Err(e) = remove_with_retry(path, &self.retry) {
                warn!("partial checkpoint left behind: {e}");
            }
            return Err(CheckpointError::Serialize { path: path.to_path_buf(), reason });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Directory locks
// ---------------------------------------------------------------------------

/// One mutex per directory, shared by every store in the process.
fn directory_lock(directory: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();

    // Canonical so that `saved` and `./saved` share a lock; the directory
    // exists by the time this is called.
    let key = directory.canonicalize().unwrap_or_else(|_| directory.to_path_buf());
    let mut locks = LOCKS.get_or_init(|| Mutex::new(HashMap::new())).lock();
    locks.entry(key).or_default().clone()
}
