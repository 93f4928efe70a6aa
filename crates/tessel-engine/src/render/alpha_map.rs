/// Maps an accumulated coverage count to an 8-bit alpha.
///
/// The path rasterizer accumulates per-pixel deltas whose running sum is the
/// number of covered subpixel samples; this table turns that count into
/// coverage. Sums outside the table clamp to its ends.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AlphaMap {
    table: Vec<u8>,
}

impl AlphaMap {
    /// Table for `samples` subpixel samples per pixel: `0..=samples` maps
    /// linearly onto `0..=255`, rounding to nearest.
    pub fn for_subpixel_samples(samples: u32) -> Self {
        let n = samples.max(1);
        let table = (0..=n).map(|i| ((i * 255 + n / 2) / n) as u8).collect();
        Self { table }
    }

    /// Uses `table` as-is. An empty table maps everything to 0.
    pub fn from_table(table: Vec<u8>) -> Self {
        if table.is_empty() {
            return Self { table: vec![0] };
        }
        Self { table }
    }

    /// Largest running sum with its own entry.
    #[inline]
    pub fn max_sum(&self) -> i32 {
        (self.table.len() - 1).min(i32::MAX as usize) as i32
    }

    #[inline]
    pub fn coverage(&self, sum: i32) -> u32 {
        self.table[sum.clamp(0, self.max_sum()) as usize] as u32
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.table
    }
}
