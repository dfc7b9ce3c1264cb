pub mod filename;
pub mod record;
pub mod retry;
pub mod store;

pub use filename::{basis_points, CheckpointName};
pub use retry::RetryPolicy;
pub use store::{CheckpointStore, SaveOutcome};
