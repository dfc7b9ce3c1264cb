pub mod partitioner;

pub use partitioner::{split_ranges_mut, WorkPartitioner};
