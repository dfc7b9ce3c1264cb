pub mod epoch_stats;
pub mod evaluate;
pub mod loop_fn;
pub mod train_config;
pub mod trainer;

pub use epoch_stats::{EpochOutcome, EpochStats};
pub use evaluate::{accuracy, argmax};
pub use loop_fn::{train_loop, TrainReport};
pub use train_config::{DataPaths, TrainConfig};
pub use trainer::{train_epoch, train_network, train_sample};
