use crate::network::network::Network;

/// Plain gradient descent: no momentum, no regularization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }

    /// Applies one update to every layer using the deltas left by the last
    /// `Network::backward`.
    pub fn step(&self, network: &mut Network) {
        network.update(self.learning_rate);
    }
}
