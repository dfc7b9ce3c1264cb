pub mod math;
pub mod activation;
pub mod parallel;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod checkpoint;
pub mod data;
pub mod train;
pub mod error;

// Convenience re-exports
pub use math::gaussian::RandomGaussian;
pub use activation::sigmoid::Sigmoid;
pub use parallel::partitioner::WorkPartitioner;
pub use layers::dense::Layer;
pub use network::{Architecture, Network};
pub use loss::mse::MseLoss;
pub use optim::sgd::Sgd;
pub use checkpoint::{CheckpointName, CheckpointStore, RetryPolicy, SaveOutcome};
pub use data::{load_idx_pair, parse_idx_pair, Sample};
pub use train::{accuracy, train_loop, train_network, EpochStats, TrainConfig, TrainReport};
pub use error::{CheckpointError, ConfigError, DataError, NetworkError};
