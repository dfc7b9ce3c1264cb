use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

/// Standard-normal sampler built on the Box-Muller transform.
///
/// Wraps an explicit generator instead of a shared global one, so layer
/// initialization can be made reproducible by seeding it.
#[derive(Debug, Clone)]
pub struct RandomGaussian<R: Rng = StdRng> {
    rng: R,
}

impl RandomGaussian<StdRng> {
    /// A generator whose sequence is fully determined by `seed`.
    pub fn from_seed(seed: u64) -> Self {
        RandomGaussian { rng: StdRng::seed_from_u64(seed) }
    }

    /// A generator seeded from operating-system entropy.
    pub fn from_entropy() -> Self {
        RandomGaussian { rng: StdRng::from_entropy() }
    }
}

impl<R: Rng> RandomGaussian<R> {
    pub fn new(rng: R) -> Self {
        RandomGaussian { rng }
    }

    /// Samples a single value from N(0, 1).
    pub fn sample(&mut self) -> f64 {
        // gen() is uniform on [0, 1); flip it onto (0, 1] so ln() never sees 0.
        let x1: f64 = 1.0 - self.rng.gen::<f64>();
        let x2: f64 = 1.0 - self.rng.gen::<f64>();
        (-2.0 * x1.ln()).sqrt() * (2.0 * PI * x2).cos()
    }

    /// Gives back the underlying generator, e.g. to reuse it for shuffling.
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }
}
