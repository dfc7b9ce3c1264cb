pub mod gaussian;

pub use gaussian::RandomGaussian;
