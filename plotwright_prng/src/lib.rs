// Seeded pseudo-random source for the planner.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding,
// plus the few sampling helpers the planner needs on top of the raw stream:
// uniform index ranges, sampling without replacement (for the random share
// of site candidates) and weighted choice (for road and foundation palettes).
//
// Every randomized planner call takes a `&mut PlanRng` explicitly. Nothing
// in `plotwright_plan` owns a hidden generator, so a test that seeds the
// generator gets the same footprints, roads and palette picks on every run.
//
// **Critical constraint: determinism.** Identical seeds must produce identical
// output on every platform. No OS entropy, no stdlib hashing, and no
// floating-point arithmetic inside the core generator.

/// Xoshiro256++ generator used for every random decision in planning.
#[derive(Clone, Debug)]
pub struct PlanRng {
    s: [u64; 4],
}

impl PlanRng {
    /// Create a generator from a `u64` seed.
    ///
    /// The seed is expanded into the 256-bit state with SplitMix64.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Next raw `u64` of the stream.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Uniform `f64` in [0, 1), built from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in `[low, high)`, rejection-sampled to avoid modulo bias.
    ///
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        let threshold = range.wrapping_neg() % range;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Uniform `usize` in `[low, high)`. Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Pick `k` distinct indices from `0..n`, in draw order.
    ///
    /// Partial Fisher-Yates over an index table, so every subset of size `k`
    /// is equally likely. `k` larger than `n` is clamped to `n`.
    pub fn sample_indices(&mut self, n: usize, k: usize) -> Vec<usize> {
        let k = k.min(n);
        let mut table: Vec<usize> = (0..n).collect();
        for i in 0..k {
            let j = self.range_usize(i, n);
            table.swap(i, j);
        }
        table.truncate(k);
        table
    }

    /// Pick an index with probability proportional to its weight.
    ///
    /// Negative and NaN weights count as zero. Returns `None` when the slice
    /// is empty or every weight is zero.
    pub fn choose_weighted(&mut self, weights: &[f64]) -> Option<usize> {
        let clean = |w: f64| if w > 0.0 { w } else { 0.0 };
        let total: f64 = weights.iter().map(|&w| clean(w)).sum();
        if total <= 0.0 {
            return None;
        }
        let mut target = self.next_f64() * total;
        let mut last_positive = None;
        for (i, &w) in weights.iter().enumerate() {
            let w = clean(w);
            if w == 0.0 {
                continue;
            }
            if target < w {
                return Some(i);
            }
            target -= w;
            last_positive = Some(i);
        }
        // Rounding can leave `target` a hair above the last bucket.
        last_positive
    }
}

/// SplitMix64 step, used only to expand a seed into xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
