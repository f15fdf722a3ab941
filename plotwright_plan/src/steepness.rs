// Flatness analysis for ranking candidate building sites.
//
// For each interior column of a region (those at least `span` blocks from
// every edge), the steepness is the sum of absolute height differences
// between the column and every column in its (2*span+1)^2 window. Columns
// whose surface block matches an excluded pattern (water by default) get a
// large sentinel so they never rank as flat.
//
// Values are stored flattened in x-major order over the inset grid of
// `width x depth` = `(size.x - 2*span) x (size.z - 2*span)`. Index `i` maps
// back to local `(i / depth + span, i % depth + span)`.
//
// The field doubles as the per-column malus for nav graph edge weights
// (`value_at`), where border columns borrow the nearest interior value.
//
// See also: `surface.rs` for the no-vegetation heightmap this reads,
// `nav.rs` for edge weighting, `site.rs` for how priority candidates seed
// the placement search.

use crate::config::SteepnessParams;
use crate::surface::{SurfaceList, SurfaceSample};
use crate::terrain::HeightMap;
use crate::types::Column;
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SteepnessField {
    /// World column of the region's minimum corner.
    start: Column,
    span: usize,
    width: usize,
    depth: usize,
    values: Vec<u64>,
}

impl SteepnessField {
    /// Compute the field over a region-local no-vegetation heightmap.
    ///
    /// `surface` supplies the block at each column for the exclusion check.
    /// Regions too small to have an interior produce an empty field.
    pub fn compute(
        heights: &HeightMap,
        surface: &SurfaceList,
        start: Column,
        params: &SteepnessParams,
    ) -> Self {
        let span = params.span.max(1) as usize;
        let width = heights.size_x().saturating_sub(2 * span);
        let depth = heights.size_z().saturating_sub(2 * span);
        let mut values = Vec::with_capacity(width * depth);

        for i in span..span + width {
            for j in span..span + depth {
                let column = Column::new(start.x + i as i32, start.z + j as i32);
                let excluded = surface
                    .find(column)
                    .is_some_and(|s| s.is_one_of(&params.excluded_patterns));
                if excluded {
                    values.push(params.excluded_sentinel);
                    continue;
                }
                let center = heights.get(i as i32, j as i32).unwrap_or_default();
                let mut sum = 0u64;
                for wi in i - span..=i + span {
                    for wj in j - span..=j + span {
                        let h = heights.get(wi as i32, wj as i32).unwrap_or(center);
                        sum += (h - center).unsigned_abs() as u64;
                    }
                }
                values.push(sum);
            }
        }

        Self {
            start,
            span,
            width,
            depth,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<u64> {
        self.values.get(index).copied()
    }

    /// The world column a flat index refers to.
    pub fn column_of(&self, index: usize) -> Option<Column> {
        if index >= self.values.len() {
            return None;
        }
        let x = index / self.depth;
        let z = index % self.depth;
        Some(Column::new(
            self.start.x + (x + self.span) as i32,
            self.start.z + (z + self.span) as i32,
        ))
    }

    /// Steepness at a column, clamped to the nearest interior cell. An empty
    /// field reads as perfectly flat.
    pub fn value_at(&self, column: Column) -> u64 {
        if self.values.is_empty() {
            return 0;
        }
        let i = (column.x - self.start.x - self.span as i32).clamp(0, self.width as i32 - 1);
        let j = (column.z - self.start.z - self.span as i32).clamp(0, self.depth as i32 - 1);
        self.values[i as usize * self.depth + j as usize]
    }

    /// Flat indices of the lowest `fraction` of the field, flattest first.
    ///
    /// Ties are broken by index so the selection is stable across runs.
    pub fn flattest_indices(&self, fraction: f64) -> Vec<usize> {
        let count = ((self.values.len() as f64) * fraction.clamp(0.0, 1.0)) as usize;
        if count == 0 {
            return Vec::new();
        }
        let mut order: Vec<(u64, usize)> =
            self.values.iter().copied().zip(0..).collect();
        order.select_nth_unstable(count - 1);
        order.truncate(count);
        order.sort_unstable();
        order.into_iter().map(|(_, i)| i).collect()
    }

    /// Surface samples at the flattest columns, skipping occupied ones and
    /// columns missing from the surface.
    pub fn priority_candidates(
        &self,
        surface: &SurfaceList,
        occupied: &BTreeSet<Column>,
        fraction: f64,
    ) -> Vec<SurfaceSample> {
        self.flattest_indices(fraction)
            .into_iter()
            .filter_map(|i| self.column_of(i))
            .filter(|c| !occupied.contains(c))
            .filter_map(|c| surface.find(c).cloned())
            .collect()
    }
}
