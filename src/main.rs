// Trains a network described by a JSON config file on an IDX train/test split,
// keeping the best checkpoint per architecture in `checkpoint_dir`.
//
// Run with:
//   RUST_LOG=info cargo run --release -- train.json
//
// Minimal config:
//   {
//     "layer_sizes": [784, 350, 10],
//     "epochs": 100,
//     "learning_rate": 0.01,
//     "checkpoint_dir": "saved",
//     "data": {
//       "train_images": "train-images.idx3-ubyte",
//       "train_labels": "train-labels.idx1-ubyte",
//       "test_images":  "t10k-images.idx3-ubyte",
//       "test_labels":  "t10k-labels.idx1-ubyte"
//     }
//   }

use std::env;

use anyhow::{bail, Context};
use log::info;

use ferrite_backprop::{load_idx_pair, train_loop, TrainConfig};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let Some(config_path) = env::args().nth(1) else {
        bail!("usage: ferrite-backprop <config.json>");
    };
    let config = TrainConfig::load_json(&config_path)?;
    let Some(data) = &config.data else {
        bail!("{config_path}: a \"data\" section with IDX file paths is required");
    };

    info!("loading training data");
    let train = load_idx_pair(&data.train_images, &data.train_labels, data.n_classes)?;
    info!("loading test data");
    let test = load_idx_pair(&data.test_images, &data.test_labels, data.n_classes)?;
    info!("{} training samples, {} test samples", train.len(), test.len());

    let mut network = config.build_network()?;
    info!(
        "training {} for {} epochs, lr={}, {} neuron ranges per layer",
        network.architecture(),
        config.epochs,
        config.learning_rate,
        network.partitioner().parallelism()
    );

    let report = train_loop(&mut network, &train, &test, &config).context("training failed")?;

    match (report.best_accuracy, report.best_epoch) {
        (Some(acc), Some(epoch)) => info!("best accuracy {:.2}% at epoch #{epoch}", acc * 100.0),
        _ => info!("no epochs completed"),
    }
    if let Some(path) = report.checkpoints.last() {
        info!("latest checkpoint: {}", path.display());
    }
    Ok(())
}
