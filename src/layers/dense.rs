use rand::Rng;

use crate::math::gaussian::RandomGaussian;

/// One fully-connected layer of sigmoid neurons.
///
/// `weights[i][k]` connects neuron `k` of the previous layer to neuron `i`
/// of this one. The input layer (`prev_neuron_count == 0`) carries no
/// weights or biases; its `outputs` hold the raw input vector.
///
/// `Clone` is a deep copy: every vector is duplicated, so a clone and its
/// source never share state.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub neuron_count: usize,
    pub prev_neuron_count: usize,
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
    /// Local error signal (delta) per neuron, rewritten by every backward pass.
    pub gradients: Vec<f64>,
    /// Last activations computed by the forward pass.
    pub outputs: Vec<f64>,
}

impl Layer {
    /// Builds a layer with `neuron_count` neurons fed by `prev_neuron_count`
    /// inputs.
    ///
    /// Weights are drawn from N(0, 1) and biases from
    /// N(0, 1) / sqrt(prev_neuron_count). An input layer consumes no draws.
    pub fn new<R: Rng>(
        neuron_count: usize,
        prev_neuron_count: usize,
        gaussian: &mut RandomGaussian<R>,
    ) -> Layer {
        let mut weights = Vec::new();
        let mut biases = Vec::new();

        if prev_neuron_count > 0 {
            let scale = (prev_neuron_count as f64).sqrt();
            weights.reserve(neuron_count);
            biases.reserve(neuron_count);
            for _ in 0..neuron_count {
                let row = (0..prev_neuron_count).map(|_| gaussian.sample()).collect();
                weights.push(row);
                biases.push(gaussian.sample() / scale);
            }
        }

        Layer {
            neuron_count,
            prev_neuron_count,
            weights,
            biases,
            gradients: vec![0.0; neuron_count],
            outputs: vec![0.0; neuron_count],
        }
    }

    /// Rebuilds a layer from persisted parameters. Gradients and outputs
    /// start zeroed; they are transient computation state.
    pub fn from_parameters(
        neuron_count: usize,
        prev_neuron_count: usize,
        weights: Vec<Vec<f64>>,
        biases: Vec<f64>,
    ) -> Layer {
        Layer {
            neuron_count,
            prev_neuron_count,
            weights,
            biases,
            gradients: vec![0.0; neuron_count],
            outputs: vec![0.0; neuron_count],
        }
    }

    pub fn is_input(&self) -> bool {
        self.prev_neuron_count == 0
    }

    /// True when every array has the length implied by the two counts.
    pub fn has_consistent_shape(&self) -> bool {
        let params_ok = if self.is_input() {
            self.weights.is_empty() && self.biases.is_empty()
        } else {
            self.weights.len() == self.neuron_count
                && self.weights.iter().all(|row| row.len() == self.prev_neuron_count)
                && self.biases.len() == self.neuron_count
        };
        params_ok
            && self.gradients.len() == self.neuron_count
            && self.outputs.len() == self.neuron_count
    }
}
