use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::NetworkError;

/// The ordered layer sizes of a network, input first.
///
/// Its `Display` form is the architecture signature used to group
/// checkpoints, e.g. `[784]_[350]_[10]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Architecture {
    layer_sizes: Vec<usize>,
}

impl Architecture {
    /// Rejects fewer than two layers and zero-sized layers.
    pub fn new(layer_sizes: Vec<usize>) -> Result<Architecture, NetworkError> {
        if layer_sizes.len() < 2 {
            return Err(NetworkError::TooFewLayers(layer_sizes.len()));
        }
        if let Some(index) = layer_sizes.iter().position(|&n| n == 0) {
            return Err(NetworkError::EmptyLayer { index });
        }
        Ok(Architecture { layer_sizes })
    }

    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    pub fn input_size(&self) -> usize {
        self.layer_sizes[0]
    }

    pub fn output_size(&self) -> usize {
        self.layer_sizes[self.layer_sizes.len() - 1]
    }

    pub fn signature(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, n) in self.layer_sizes.iter().enumerate() {
            if i > 0 {
                f.write_str("_")?;
            }
            write!(f, "[{n}]")?;
        }
        Ok(())
    }
}
