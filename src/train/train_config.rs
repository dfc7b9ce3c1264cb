use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{atomic::AtomicBool, Arc};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, NetworkError};
use crate::math::gaussian::RandomGaussian;
use crate::network::network::Network;
use crate::parallel::partitioner::WorkPartitioner;
use crate::train::epoch_stats::EpochStats;

fn default_epochs() -> usize {
    100
}

fn default_learning_rate() -> f64 {
    0.01
}

fn default_classes() -> usize {
    10
}

/// Locations of an IDX train/test split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPaths {
    pub train_images: PathBuf,
    pub train_labels: PathBuf,
    pub test_images: PathBuf,
    pub test_labels: PathBuf,
    #[serde(default = "default_classes")]
    pub n_classes: usize,
}

/// Configuration for a `train_loop` run, loadable from JSON.
///
/// # Fields
/// - `layer_sizes`    — neurons per layer, input first (at least 2 entries)
/// - `epochs`         — full passes over the training samples
/// - `learning_rate`  — gradient-descent step size, must be positive
/// - `seed`           — fixes weight initialization and shuffling when set;
///                      otherwise both draw from OS entropy
/// - `checkpoint_dir` — where the best model per architecture is kept;
///                      `None` disables checkpointing
/// - `parallelism`    — neuron ranges per layer; defaults to the rayon pool size
/// - `data`           — IDX files read by the binary
/// - `progress_tx`    — optional channel; one `EpochStats` per epoch. If the
///                      receiver is dropped the loop stops early.
/// - `stop_flag`      — optional flag; when set the loop stops after the
///                      current epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub layer_sizes: Vec<usize>,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub checkpoint_dir: Option<PathBuf>,
    #[serde(default)]
    pub parallelism: Option<usize>,
    #[serde(default)]
    pub data: Option<DataPaths>,
    #[serde(skip)]
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    #[serde(skip)]
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Defaults for everything but the architecture; no checkpointing.
    pub fn new(layer_sizes: Vec<usize>) -> Self {
        TrainConfig {
            layer_sizes,
            epochs: default_epochs(),
            learning_rate: default_learning_rate(),
            seed: None,
            checkpoint_dir: None,
            parallelism: None,
            data: None,
            progress_tx: None,
            stop_flag: None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layer_sizes.len() < 2 {
            return Err(ConfigError::Invalid(format!(
                "layer_sizes needs at least 2 entries, got {}",
                self.layer_sizes.len()
            )));
        }
        if self.layer_sizes.contains(&0) {
            return Err(ConfigError::Invalid("layer_sizes must all be positive".to_owned()));
        }
        if self.epochs == 0 {
            return Err(ConfigError::Invalid("epochs must be at least 1".to_owned()));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.parallelism == Some(0) {
            return Err(ConfigError::Invalid("parallelism must be at least 1".to_owned()));
        }
        Ok(())
    }

    pub fn partitioner(&self) -> WorkPartitioner {
        self.parallelism.map_or_else(WorkPartitioner::available, WorkPartitioner::new)
    }

    /// A freshly initialized network for this configuration.
    pub fn build_network(&self) -> Result<Network, NetworkError> {
        let network = match self.seed {
            Some(seed) => Network::new(&self.layer_sizes, &mut RandomGaussian::from_seed(seed))?,
            None => Network::random(&self.layer_sizes)?,
        };
        Ok(network.with_partitioner(self.partitioner()))
    }

    /// Generator for per-epoch shuffling.
    pub fn shuffle_rng(&self) -> StdRng {
        match self.seed {
            // Offset so the shuffle stream differs from the weight stream.
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        }
    }

    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let io_err = |source| ConfigError::Io { path: path.to_path_buf(), source };
        let file = std::fs::File::create(path).map_err(io_err)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })
    }

    /// Deserializes and validates a config from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<TrainConfig, ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let reader = std::io::BufReader::new(file);
        let config: TrainConfig = serde_json::from_reader(reader)
            .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_json_fills_defaults() {
        let config: TrainConfig = serde_json::from_str(r#"{ "layer_sizes": [784, 350, 10] }"#).unwrap();
        assert_eq!(config.epochs, 100);
        assert_eq!(config.learning_rate, 0.01);
        assert_eq!(config.seed, None);
        assert!(config.checkpoint_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.json");
        let mut config = TrainConfig::new(vec![4, 3, 2]);
        config.seed = Some(9);
        config.checkpoint_dir = Some(PathBuf::from("saved"));
        config.save_json(&path).unwrap();

        let loaded = TrainConfig::load_json(&path).unwrap();
        assert_eq!(loaded.layer_sizes, vec![4, 3, 2]);
        assert_eq!(loaded.seed, Some(9));
        assert_eq!(loaded.checkpoint_dir, Some(PathBuf::from("saved")));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = TrainConfig::new(vec![4]);
        assert!(config.validate().is_err());
        config.layer_sizes = vec![4, 2];
        config.learning_rate = 0.0;
        assert!(config.validate().is_err());
        config.learning_rate = 0.1;
        config.epochs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = TrainConfig::load_json(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
    }

    #[test]
    fn seeded_builds_are_identical() {
        let mut config = TrainConfig::new(vec![3, 4, 2]);
        config.seed = Some(77);
        let a = config.build_network().unwrap();
        let b = config.build_network().unwrap();
        assert_eq!(a.layers, b.layers);
    }
}
