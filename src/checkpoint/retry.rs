use std::fs;
use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;

use log::warn;

use crate::error::CheckpointError;

/// Bounded retry with a fixed delay between attempts.
///
/// Deleting a checkpoint can fail transiently while another process (a
/// backup tool, a reader of the old model) still holds the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy { max_attempts: 100, delay: Duration::from_millis(100) }
    }
}

/// Deletes `path`, retrying per `policy`. A file that is already gone counts
/// as deleted.
pub fn remove_with_retry(path: &Path, policy: &RetryPolicy) -> Result<(), CheckpointError> {
    retry_delete(path, policy, |p| fs::remove_file(p))
}

pub(crate) fn retry_delete<F>(path: &Path, policy: &RetryPolicy, mut delete: F) -> Result<(), CheckpointError>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match delete(path) {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) if attempt >= max_attempts => {
                return Err(CheckpointError::DeleteFailed {
                    path: path.to_path_buf(),
                    attempts: attempt,
                    source: e,
                });
            }
            Err(e) => {
                warn!("error deleting {} (attempt {attempt}/{max_attempts}): {e}", path.display());
                thread::sleep(policy.delay);
            }
        }
    }
}
