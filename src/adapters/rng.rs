//! Random source for the flame effect, backed by `oorandom`.

use core::ops::Range;

use oorandom::Rand32;

use crate::app::ports::RandomSource;

/// Small deterministic PCG generator.  Same seed, same flame.
pub struct SeededRng {
    inner: Rand32,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Rand32::new(seed),
        }
    }
}

impl RandomSource for SeededRng {
    fn next_in(&mut self, range: Range<u32>) -> u32 {
        if range.is_empty() {
            return range.start;
        }
        self.inner.rand_range(range)
    }
}
