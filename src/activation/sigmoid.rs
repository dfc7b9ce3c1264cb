use std::f64::consts::E;

/// The logistic activation, the only one this network uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sigmoid;

impl Sigmoid {
    /// `1 / (1 + e^-z)`
    pub fn function(z: f64) -> f64 {
        1.0 / (1.0 + E.powf(-z))
    }

    /// Derivative expressed through the already-computed activation
    /// `a = sigmoid(z)`: `a * (1 - a)`.
    ///
    /// Takes the layer output, not the pre-activation value. This shortcut
    /// is only valid for the sigmoid.
    pub fn derivative_from_output(a: f64) -> f64 {
        a * (1.0 - a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sigmoid_of_zero_is_half() {
        assert_eq!(Sigmoid::function(0.0), 0.5);
    }

    #[test]
    fn strictly_increasing_and_bounded() {
        let mut prev = Sigmoid::function(-30.0);
        assert!(prev > 0.0);
        let mut z = -30.0;
        while z < 30.0 {
            z += 0.25;
            let s = Sigmoid::function(z);
            assert!(s > prev, "sigmoid not increasing at z = {z}");
            assert!(s > 0.0 && s < 1.0);
            prev = s;
        }
    }

    #[test]
    fn derivative_matches_finite_difference() {
        for &z in &[-2.0, -0.5, 0.0, 0.7, 3.0] {
            let h = 1e-6;
            let numeric = (Sigmoid::function(z + h) - Sigmoid::function(z - h)) / (2.0 * h);
            let analytic = Sigmoid::derivative_from_output(Sigmoid::function(z));
            assert_relative_eq!(numeric, analytic, epsilon = 1e-8);
        }
    }
}
