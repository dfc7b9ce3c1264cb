/// Squared-error loss between the output activations and a one-hot target.
pub struct MseLoss;

impl MseLoss {
    /// Mean of `(output - target)^2`, reported per epoch by the trainer.
    pub fn loss(outputs: &[f64], targets: &[f64]) -> f64 {
        if outputs.is_empty() {
            return 0.0;
        }
        let sum: f64 = outputs
            .iter()
            .zip(targets)
            .map(|(o, t)| (o - t) * (o - t))
            .sum();
        sum / outputs.len() as f64
    }

    /// Per-output error `output - target`: the gradient of half the summed
    /// squared error, and the seed of the output-layer delta.
    pub fn derivative(outputs: &[f64], targets: &[f64]) -> Vec<f64> {
        outputs.iter().zip(targets).map(|(o, t)| o - t).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_prediction_has_zero_loss() {
        assert_eq!(MseLoss::loss(&[0.0, 1.0], &[0.0, 1.0]), 0.0);
        assert_eq!(MseLoss::derivative(&[0.0, 1.0], &[0.0, 1.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn loss_and_error_values() {
        assert_eq!(MseLoss::loss(&[0.5, 0.5], &[1.0, 0.0]), 0.25);
        assert_eq!(MseLoss::derivative(&[0.75, 0.25], &[1.0, 0.0]), vec![-0.25, 0.25]);
    }

    #[test]
    fn empty_outputs() {
        assert_eq!(MseLoss::loss(&[], &[]), 0.0);
    }
}
