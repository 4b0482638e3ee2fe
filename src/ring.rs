//! Fixed-capacity ring buffer for gesture samples.

use crate::sample::Sample;

/// Circular sample store with wraparound overwrite.
///
/// Capacity is fixed at construction. Overflow silently evicts the oldest
/// sample; there is no removal operation — consumers iterate the whole
/// buffer and then `clear` it for the next phase.
#[derive(Debug)]
pub struct SampleRing {
    slots: Vec<Sample>,
    write: usize,
    len: usize,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be nonzero");
        Self {
            slots: vec![Sample::default(); capacity],
            write: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Samples currently retained; saturates at capacity.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, sample: Sample) {
        self.slots[self.write] = sample;
        self.write = (self.write + 1) % self.slots.len();
        if self.len < self.slots.len() {
            self.len += 1;
        }
    }

    pub fn clear(&mut self) {
        self.write = 0;
        self.len = 0;
        self.slots.fill(Sample::default());
    }

    /// Slot at `idx` counted oldest-first; out-of-range clamps to the last
    /// retained sample rather than erroring.
    pub fn get(&self, idx: usize) -> Sample {
        if self.len == 0 {
            return Sample::default();
        }
        let idx = idx.min(self.len - 1);
        let oldest = if self.len < self.slots.len() {
            0
        } else {
            self.write
        };
        self.slots[(oldest + idx) % self.slots.len()]
    }

    /// Retained samples in arrival order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }
}
