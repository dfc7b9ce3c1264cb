/// MNIST digit classification with per-sample backpropagation.
///
/// Architecture: 784 -> 350 -> 10, sigmoid throughout
/// Optimizer:    plain gradient descent, lr = 0.01, one sample at a time
/// Epochs:       100
///
/// After every epoch the network is cloned and scored on the test set; each
/// new best is written to `saved/` in the background, replacing the previous
/// best for the same architecture.
///
/// Run with:
///   RUST_LOG=info cargo run --example mnist --release
///
/// Data files must be present at demos/mnist_data/ (IDX binary format).
use std::sync::mpsc;
use std::thread;

use ferrite_backprop::{load_idx_pair, train_loop, CheckpointStore, TrainConfig};

const TRAIN_IMAGES: &str = "demos/mnist_data/train-images-idx3-ubyte";
const TRAIN_LABELS: &str = "demos/mnist_data/train-labels-idx1-ubyte";
const TEST_IMAGES: &str = "demos/mnist_data/t10k-images-idx3-ubyte";
const TEST_LABELS: &str = "demos/mnist_data/t10k-labels-idx1-ubyte";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("Loading MNIST data...");
    let train = load_idx_pair(TRAIN_IMAGES, TRAIN_LABELS, 10)?;
    let test = load_idx_pair(TEST_IMAGES, TEST_LABELS, 10)?;
    println!("  Training set: {} images", train.len());
    println!("  Test set:     {} images", test.len());

    let input_size = train.first().map_or(784, |s| s.features.len());
    let mut config = TrainConfig::new(vec![input_size, 350, 10]);
    config.epochs = 100;
    config.learning_rate = 0.01;
    config.checkpoint_dir = Some("saved".into());

    let (tx, rx) = mpsc::channel();
    config.progress_tx = Some(tx);

    let mut network = config.build_network()?;
    let signature = network.architecture().signature();
    println!("\nTraining {signature} for {} epochs...\n", config.epochs);

    // Print progress from a separate thread so the table fills in live.
    let printer = thread::spawn(move || {
        println!("{:>6}  {:>10}  {:>10}  {:>10}", "Epoch", "MSE", "Test Acc", "Time");
        println!("{}", "─".repeat(44));
        for stats in rx {
            println!(
                "{:>6}  {:>10.6}  {:>9.2}%  {:>8}ms{}",
                stats.epoch,
                stats.train_loss,
                stats.accuracy * 100.0,
                stats.elapsed_ms,
                stats.outcome
            );
        }
    });

    let report = train_loop(&mut network, &train, &test, &config)?;
    drop(config);
    let _ = printer.join();

    if let Some(best) = report.best_accuracy {
        println!("\nBest test accuracy: {:.2}%", best * 100.0);
    }

    let store = CheckpointStore::new("saved");
    if let Some((path, name)) = store.best(&signature)? {
        println!("Kept checkpoint: {} (epoch {})", path.display(), name.epoch);
        let mut restored = CheckpointStore::load(&path)?;
        let acc = ferrite_backprop::accuracy(&mut restored, &test)?;
        println!("Restored model scores {:.2}% on the test set", acc * 100.0);
    }
    Ok(())
}
