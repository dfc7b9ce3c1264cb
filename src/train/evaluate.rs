use crate::data::sample::Sample;
use crate::error::NetworkError;
use crate::network::network::Network;

/// Index of the largest value; ties go to the lowest index. Returns 0 for an
/// empty slice.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Fraction of `samples` whose argmax output equals their label.
///
/// Runs forward passes, so it needs exclusive access; evaluate a clone while
/// the original keeps training. An empty set scores 0.
pub fn accuracy(network: &mut Network, samples: &[Sample]) -> Result<f64, NetworkError> {
    if samples.is_empty() {
        return Ok(0.0);
    }
    let mut matches = 0usize;
    for sample in samples {
        let outputs = network.forward(&sample.features)?;
        if argmax(&outputs) == sample.label {
            matches += 1;
        }
    }
    Ok(matches as f64 / samples.len() as f64)
}
