use rand::Rng;
use rayon::prelude::*;

use crate::activation::sigmoid::Sigmoid;
use crate::error::NetworkError;
use crate::layers::dense::Layer;
use crate::loss::mse::MseLoss;
use crate::math::gaussian::RandomGaussian;
use crate::network::architecture::Architecture;
use crate::parallel::partitioner::{split_ranges_mut, WorkPartitioner};

// Each phase walks the layers in order and, inside a layer, fans out over
// partitioned neuron ranges on the rayon pool. Tasks write disjoint slices of
// the current layer and only read the neighbouring layer, which is settled
// before the layer starts, so no locking is required. Every call joins all of
// its tasks before returning.

/// A fully-connected sigmoid network trained one sample at a time.
///
/// `layers[0]` is the input layer and holds no parameters. A training step is
/// `forward` -> `backward` -> `update`; calling them out of order trains on
/// stale activations or gradients.
///
/// `Clone` is a deep copy, which makes a clone safe to evaluate on another
/// thread while the original keeps training.
#[derive(Debug, Clone)]
pub struct Network {
    pub layers: Vec<Layer>,
    partitioner: WorkPartitioner,
}

impl Network {
    /// Builds a network from layer sizes, input first.
    pub fn new<R: Rng>(
        layer_sizes: &[usize],
        gaussian: &mut RandomGaussian<R>,
    ) -> Result<Network, NetworkError> {
        Architecture::new(layer_sizes.to_vec())?;

        let mut layers = Vec::with_capacity(layer_sizes.len());
        layers.push(Layer::new(layer_sizes[0], 0, gaussian));
        for pair in layer_sizes.windows(2) {
            layers.push(Layer::new(pair[1], pair[0], gaussian));
        }

        Ok(Network { layers, partitioner: WorkPartitioner::available() })
    }

    /// Reproducible initialization from a fixed seed.
    pub fn with_seed(layer_sizes: &[usize], seed: u64) -> Result<Network, NetworkError> {
        Network::new(layer_sizes, &mut RandomGaussian::from_seed(seed))
    }

    /// Initialization from operating-system entropy.
    pub fn random(layer_sizes: &[usize]) -> Result<Network, NetworkError> {
        Network::new(layer_sizes, &mut RandomGaussian::from_entropy())
    }

    /// Assembles a network from already-built layers, e.g. a loaded checkpoint.
    /// The caller guarantees the layers chain correctly.
    pub(crate) fn from_layers(layers: Vec<Layer>) -> Network {
        Network { layers, partitioner: WorkPartitioner::available() }
    }

    /// Replaces the partitioner that controls task granularity.
    pub fn with_partitioner(mut self, partitioner: WorkPartitioner) -> Network {
        self.partitioner = partitioner;
        self
    }

    pub fn partitioner(&self) -> WorkPartitioner {
        self.partitioner
    }

    pub fn layer_sizes(&self) -> Vec<usize> {
        self.layers.iter().map(|layer| layer.neuron_count).collect()
    }

    pub fn architecture(&self) -> Architecture {
        // Construction already enforced the shape rules.
        Architecture::new(self.layer_sizes())
            .unwrap_or_else(|e| unreachable!("network holds an invalid architecture: {e}"))
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].neuron_count
    }

    pub fn output_size(&self) -> usize {
        self.layers[self.layers.len() - 1].neuron_count
    }

    /// Forward pass; stores every layer's activations for backprop and
    /// returns a copy of the output layer's activations.
    pub fn forward(&mut self, inputs: &[f64]) -> Result<Vec<f64>, NetworkError> {
        let expected = self.input_size();
        if inputs.len() != expected {
            return Err(NetworkError::InputSize { expected, actual: inputs.len() });
        }

        self.layers[0].outputs.copy_from_slice(inputs);

        for l in 1..self.layers.len() {
            let ranges = self.partitioner.partition(self.layers[l].neuron_count);
            let (settled, rest) = self.layers.split_at_mut(l);
            let previous = &settled[l - 1].outputs;
            let current = &mut rest[0];

            let weights = &current.weights;
            let biases = &current.biases;
            let chunks = split_ranges_mut(&mut current.outputs, &ranges);

            ranges.par_iter().zip(chunks).for_each(|(range, outputs)| {
                for (j, out) in range.clone().zip(outputs.iter_mut()) {
                    let z = weights[j]
                        .iter()
                        .zip(previous)
                        .fold(biases[j], |z, (w, x)| z + x * w);
                    *out = Sigmoid::function(z);
                }
            });
        }

        Ok(self.layers[self.layers.len() - 1].outputs.clone())
    }

    /// Computes every non-input layer's delta from `targets`.
    ///
    /// Must follow a `forward` on the matching input.
    pub fn backward(&mut self, targets: &[f64]) -> Result<(), NetworkError> {
        let last = self.layers.len() - 1;
        let expected = self.layers[last].neuron_count;
        if targets.len() != expected {
            return Err(NetworkError::TargetSize { expected, actual: targets.len() });
        }

        // Output layer: short, so it stays on the calling thread.
        let output = &mut self.layers[last];
        let errors = MseLoss::derivative(&output.outputs, targets);
        for ((delta, error), a) in output.gradients.iter_mut().zip(errors).zip(&output.outputs) {
            *delta = error * Sigmoid::derivative_from_output(*a);
        }

        for l in (1..last).rev() {
            let ranges = self.partitioner.partition(self.layers[l].neuron_count);
            let (head, tail) = self.layers.split_at_mut(l + 1);
            let next = &tail[0];
            let current = &mut head[l];

            let outputs = &current.outputs;
            let chunks = split_ranges_mut(&mut current.gradients, &ranges);

            ranges.par_iter().zip(chunks).for_each(|(range, gradients)| {
                for (i, delta) in range.clone().zip(gradients.iter_mut()) {
                    let sum = next
                        .weights
                        .iter()
                        .zip(&next.gradients)
                        .fold(0.0, |acc, (row, g)| acc + row[i] * g);
                    *delta = sum * Sigmoid::derivative_from_output(outputs[i]);
                }
            });
        }

        Ok(())
    }

    /// One plain gradient-descent step using the deltas from `backward`.
    pub fn update(&mut self, learning_rate: f64) {
        debug_assert!(learning_rate > 0.0, "learning rate must be positive");

        for l in 1..self.layers.len() {
            let ranges = self.partitioner.partition(self.layers[l].neuron_count);
            let (settled, rest) = self.layers.split_at_mut(l);
            let inputs = &settled[l - 1].outputs;
            let current = &mut rest[0];

            let gradients = &current.gradients;
            let weight_chunks = split_ranges_mut(&mut current.weights, &ranges);
            let bias_chunks = split_ranges_mut(&mut current.biases, &ranges);

            ranges
                .par_iter()
                .zip(weight_chunks)
                .zip(bias_chunks)
                .for_each(|((range, weights), biases)| {
                    for ((i, row), bias) in range.clone().zip(weights.iter_mut()).zip(biases.iter_mut()) {
                        let step = learning_rate * gradients[i];
                        for (w, x) in row.iter_mut().zip(inputs) {
                            *w -= step * x;
                        }
                        *bias -= step;
                    }
                });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn half_loss(net: &mut Network, input: &[f64], target: &[f64]) -> f64 {
        let out = net.forward(input).unwrap();
        0.5 * out.iter().zip(target).map(|(o, t)| (o - t).powi(2)).sum::<f64>()
    }

    #[test]
    fn fresh_network_shapes() {
        let sizes = [5, 4, 3, 2];
        let net = Network::with_seed(&sizes, 1).unwrap();
        assert_eq!(net.layers.len(), 4);
        assert!(net.layers[0].weights.is_empty());
        assert!(net.layers[0].biases.is_empty());
        for i in 1..sizes.len() {
            let layer = &net.layers[i];
            assert_eq!(layer.prev_neuron_count, sizes[i - 1]);
            assert_eq!(layer.weights.len(), sizes[i]);
            assert!(layer.weights.iter().all(|row| row.len() == sizes[i - 1]));
            assert_eq!(layer.biases.len(), sizes[i]);
        }
        assert_eq!(net.architecture().signature(), "[5]_[4]_[3]_[2]");
    }

    #[test]
    fn construction_errors() {
        assert_eq!(Network::with_seed(&[3], 0).unwrap_err(), NetworkError::TooFewLayers(1));
        assert_eq!(
            Network::with_seed(&[3, 0], 0).unwrap_err(),
            NetworkError::EmptyLayer { index: 1 }
        );
    }

    #[test]
    fn hand_computed_single_neuron() {
        let mut net = Network::with_seed(&[1, 1], 0).unwrap();
        net.layers[1].weights[0][0] = 1.0;
        net.layers[1].biases[0] = 0.0;
        let out = net.forward(&[0.0]).unwrap();
        assert_eq!(out, vec![0.5]);

        let out = net.forward(&[2.0]).unwrap();
        assert_relative_eq!(out[0], Sigmoid::function(2.0));
    }

    #[test]
    fn outputs_lie_in_open_unit_interval() {
        let mut net = Network::with_seed(&[6, 9, 4], 2).unwrap();
        let out = net.forward(&[0.1, -3.0, 0.0, 7.5, 1.0, -0.2]).unwrap();
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|&o| o > 0.0 && o < 1.0));
    }

    #[test]
    fn shape_mismatches_are_rejected_before_mutation() {
        let mut net = Network::with_seed(&[3, 2], 4).unwrap();
        assert_eq!(
            net.forward(&[1.0, 2.0]).unwrap_err(),
            NetworkError::InputSize { expected: 3, actual: 2 }
        );
        assert!(net.layers[0].outputs.iter().all(|&x| x == 0.0));
        assert_eq!(
            net.backward(&[1.0]).unwrap_err(),
            NetworkError::TargetSize { expected: 2, actual: 1 }
        );
    }

    #[test]
    fn input_layer_never_receives_gradients() {
        let mut net = Network::with_seed(&[3, 4, 2], 8).unwrap();
        net.forward(&[0.5, 0.2, 0.9]).unwrap();
        net.backward(&[1.0, 0.0]).unwrap();
        assert!(net.layers[0].gradients.iter().all(|&g| g == 0.0));
        assert!(net.layers[1].gradients.iter().any(|&g| g != 0.0));
    }

    #[test]
    fn backprop_matches_finite_differences() {
        let input = [0.3, -0.8, 0.5];
        let target = [1.0, 0.0];
        let mut net = Network::with_seed(&[3, 4, 3, 2], 17).unwrap();
        net.forward(&input).unwrap();
        net.backward(&target).unwrap();

        let h = 1e-6;
        for l in 1..net.layers.len() {
            for i in 0..net.layers[l].neuron_count {
                for j in 0..net.layers[l].prev_neuron_count {
                    let analytic = net.layers[l].gradients[i] * net.layers[l - 1].outputs[j];

                    let mut plus = net.clone();
                    plus.layers[l].weights[i][j] += h;
                    let mut minus = net.clone();
                    minus.layers[l].weights[i][j] -= h;
                    let numeric = (half_loss(&mut plus, &input, &target)
                        - half_loss(&mut minus, &input, &target))
                        / (2.0 * h);

                    assert_relative_eq!(analytic, numeric, epsilon = 1e-7);
                }
            }
        }
    }

    #[test]
    fn update_reduces_loss_on_a_sample() {
        let input = [0.2, 0.7];
        let target = [0.0, 1.0];
        let mut net = Network::with_seed(&[2, 5, 2], 23).unwrap();
        let before = half_loss(&mut net, &input, &target);
        for _ in 0..50 {
            net.forward(&input).unwrap();
            net.backward(&target).unwrap();
            net.update(0.5);
        }
        let after = half_loss(&mut net, &input, &target);
        assert!(after < before, "loss went from {before} to {after}");
    }

    #[test]
    fn partitioning_does_not_change_results() {
        let input: Vec<f64> = (0..20).map(|i| (i as f64 * 0.37).sin()).collect();
        let mut target = vec![0.0; 7];
        target[3] = 1.0;

        let mut serial = Network::with_seed(&[20, 33, 7], 99)
            .unwrap()
            .with_partitioner(WorkPartitioner::new(1));
        let mut parallel = serial.clone().with_partitioner(WorkPartitioner::new(8));

        for _ in 0..5 {
            for net in [&mut serial, &mut parallel] {
                net.forward(&input).unwrap();
                net.backward(&target).unwrap();
                net.update(0.1);
            }
        }
        for (a, b) in serial.layers.iter().zip(&parallel.layers) {
            assert_eq!(a.weights, b.weights);
            assert_eq!(a.biases, b.biases);
        }
    }

    #[test]
    fn clone_matches_then_diverges() {
        let input = [0.9, 0.1, 0.4];
        let mut source = Network::with_seed(&[3, 5, 2], 31).unwrap();
        source.forward(&input).unwrap();
        let mut copy = source.clone();

        assert_eq!(copy.forward(&input).unwrap(), source.forward(&input).unwrap());

        let snapshot: Vec<Layer> = source.layers.clone();
        for _ in 0..10 {
            copy.forward(&[0.0, 1.0, 0.0]).unwrap();
            copy.backward(&[0.0, 1.0]).unwrap();
            copy.update(1.0);
        }
        assert_eq!(source.layers, snapshot);
        assert_ne!(copy.layers[1].weights, snapshot[1].weights);
    }
}
