/// One labeled example: a feature vector plus its class as both an index and
/// a one-hot target over all classes.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub features: Vec<f64>,
    pub label: usize,
    pub targets: Vec<f64>,
}

impl Sample {
    /// # Panics
    /// Panics if `label >= n_classes`.
    pub fn new(features: Vec<f64>, label: usize, n_classes: usize) -> Sample {
        assert!(label < n_classes, "label {label} out of range for {n_classes} classes");
        let mut targets = vec![0.0; n_classes];
        targets[label] = 1.0;
        Sample { features, label, targets }
    }
}
