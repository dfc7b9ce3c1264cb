use rand::seq::SliceRandom;
use rand::Rng;

use crate::data::sample::Sample;
use crate::error::NetworkError;
use crate::loss::mse::MseLoss;
use crate::network::network::Network;
use crate::optim::sgd::Sgd;

/// One training step on a single sample: forward, backward, update.
/// Returns the sample's loss before the update.
pub fn train_sample(
    network: &mut Network,
    input: &[f64],
    target: &[f64],
    optimizer: &Sgd,
) -> Result<f64, NetworkError> {
    let output = network.forward(input)?;
    network.backward(target)?;
    optimizer.step(network);
    Ok(MseLoss::loss(&output, target))
}

/// Trains on every `(input, expected)` pair once, in order, and returns the
/// mean loss. Both slices must have the same length.
pub fn train_network(
    network: &mut Network,
    inputs: &[Vec<f64>],
    expected_outputs: &[Vec<f64>],
    optimizer: &Sgd,
) -> Result<f64, NetworkError> {
    if inputs.len() != expected_outputs.len() {
        return Err(NetworkError::SampleCount {
            inputs: inputs.len(),
            targets: expected_outputs.len(),
        });
    }
    if inputs.is_empty() {
        return Ok(0.0);
    }
    let mut total_loss = 0.0;
    for (input, expected) in inputs.iter().zip(expected_outputs) {
        total_loss += train_sample(network, input, expected, optimizer)?;
    }
    Ok(total_loss / inputs.len() as f64)
}

/// One epoch over `samples` in a freshly shuffled order. Returns the mean loss.
pub fn train_epoch<R: Rng>(
    network: &mut Network,
    samples: &[Sample],
    optimizer: &Sgd,
    rng: &mut R,
) -> Result<f64, NetworkError> {
    if samples.is_empty() {
        return Ok(0.0);
    }

    let mut order: Vec<usize> = (0..samples.len()).collect();
    order.shuffle(rng);

    let mut total_loss = 0.0;
    for &idx in &order {
        let sample = &samples[idx];
        total_loss += train_sample(network, &sample.features, &sample.targets, optimizer)?;
    }
    Ok(total_loss / samples.len() as f64)
}
