//! On-disk body of a checkpoint file.
//!
//! Only model state is persisted: the layer sizes plus, for every non-input
//! layer, its weight matrix and bias vector. Values go through bincode as
//! fixed-width little-endian `f64`, so a round trip is bit-exact.

use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CheckpointError;
use crate::layers::dense::Layer;
use crate::network::network::Network;

const MAGIC: [u8; 4] = *b"FBPN";
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct NetworkRecordRef<'a> {
    magic: [u8; 4],
    version: u32,
    layer_sizes: Vec<usize>,
    layers: Vec<LayerRecordRef<'a>>,
}

#[derive(Serialize)]
struct LayerRecordRef<'a> {
    weights: &'a [Vec<f64>],
    biases: &'a [f64],
}

/// Owned form produced by decoding a checkpoint body.
#[derive(Debug, Deserialize)]
pub struct NetworkRecord {
    magic: [u8; 4],
    version: u32,
    layer_sizes: Vec<usize>,
    layers: Vec<LayerRecord>,
}

#[derive(Debug, Deserialize)]
struct LayerRecord {
    weights: Vec<Vec<f64>>,
    biases: Vec<f64>,
}

/// Encodes `network` without copying its parameters.
pub fn write_network<W: Write>(writer: W, network: &Network) -> Result<(), bincode::Error> {
    let record = NetworkRecordRef {
        magic: MAGIC,
        version: FORMAT_VERSION,
        layer_sizes: network.layer_sizes(),
        layers: network.layers[1..]
            .iter()
            .map(|layer| LayerRecordRef { weights: &layer.weights, biases: &layer.biases })
            .collect(),
    };
    bincode::serialize_into(writer, &record)
}

pub fn read_record<R: Read>(reader: R) -> Result<NetworkRecord, bincode::Error> {
    bincode::deserialize_from(reader)
}

impl NetworkRecord {
    /// Validates the decoded shapes and rebuilds the network.
    /// `path` is only used in error messages.
    pub fn into_network(self, path: &Path) -> Result<Network, CheckpointError> {
        if self.magic != MAGIC {
            return Err(CheckpointError::corrupt(path, "not a network checkpoint"));
        }
        if self.version != FORMAT_VERSION {
            return Err(CheckpointError::corrupt(
                path,
                format!("unsupported format version {}", self.version),
            ));
        }
        if self.layer_sizes.len() < 2 || self.layer_sizes.contains(&0) {
            return Err(CheckpointError::corrupt(
                path,
                format!("invalid layer sizes {:?}", self.layer_sizes),
            ));
        }
        if self.layers.len() != self.layer_sizes.len() - 1 {
            return Err(CheckpointError::corrupt(
                path,
                format!(
                    "{} parameter blocks for {} layers",
                    self.layers.len(),
                    self.layer_sizes.len()
                ),
            ));
        }

        let mut layers = Vec::with_capacity(self.layer_sizes.len());
        layers.push(Layer::from_parameters(self.layer_sizes[0], 0, Vec::new(), Vec::new()));

        for (l, record) in self.layers.into_iter().enumerate() {
            let neuron_count = self.layer_sizes[l + 1];
            let prev_neuron_count = self.layer_sizes[l];
            let layer =
                Layer::from_parameters(neuron_count, prev_neuron_count, record.weights, record.biases);
            if !layer.has_consistent_shape() {
                return Err(CheckpointError::corrupt(
                    path,
                    format!("layer {} does not match {neuron_count}x{prev_neuron_count}", l + 1),
                ));
            }
            layers.push(layer);
        }

        Ok(Network::from_layers(layers))
    }
}
