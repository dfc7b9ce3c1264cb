use std::ops::Range;

// Every per-neuron inner loop is a short dot product, while a layer may have
// hundreds of neurons. Dispatching each neuron as its own task spends more
// time scheduling than computing, so the neuron range is cut into at most
// `parallelism` contiguous chunks and each chunk runs as one rayon task.

/// Splits `[0, n)` into a few contiguous, balanced ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkPartitioner {
    parallelism: usize,
}

impl WorkPartitioner {
    /// `parallelism` is clamped to at least 1.
    pub fn new(parallelism: usize) -> WorkPartitioner {
        WorkPartitioner { parallelism: parallelism.max(1) }
    }

    /// Sized to the threads of the current rayon pool.
    pub fn available() -> WorkPartitioner {
        WorkPartitioner::new(rayon::current_num_threads())
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Returns `min(parallelism, n)` ranges covering `[0, n)` exactly once.
    ///
    /// Sizes differ by at most one; the leading ranges take the remainder.
    /// `n == 0` yields no ranges.
    pub fn partition(&self, n: usize) -> Vec<Range<usize>> {
        if n == 0 {
            return Vec::new();
        }
        let count = self.parallelism.min(n);
        let base = n / count;
        let extra = n % count;

        let mut ranges = Vec::with_capacity(count);
        let mut start = 0;
        for i in 0..count {
            let len = base + usize::from(i < extra);
            ranges.push(start..start + len);
            start += len;
        }
        ranges
    }
}

impl Default for WorkPartitioner {
    fn default() -> Self {
        WorkPartitioner::available()
    }
}

/// Cuts `data` into the disjoint sub-slices named by `ranges`.
///
/// `ranges` must be contiguous and start at 0, as returned by
/// [`WorkPartitioner::partition`]; each returned slice can then be handed
/// to its own parallel task without locking.
pub fn split_ranges_mut<'a, T>(data: &'a mut [T], ranges: &[Range<usize>]) -> Vec<&'a mut [T]> {
    let mut chunks = Vec::with_capacity(ranges.len());
    let mut rest = data;
    let mut offset = 0;
    for range in ranges {
        debug_assert_eq!(range.start, offset, "ranges must be contiguous");
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(range.end - offset);
        chunks.push(head);
        rest = tail;
        offset = range.end;
    }
    chunks
}
