use ndarray::{s, Array1, Array2};

use crate::tree::model::SplitOp;

/// Per-feature, per-node accumulation of value counts and value × class counts.
///
/// Binary columns use the same cache with two value rows; nominal columns hold
/// one row per declared value. `best_v` is the value whose one-vs-rest
/// isolation scored best, `-1` until a search has run.
#[derive(Debug)]
pub(crate) struct NominalSplitCache {
    pub best_v: i32,
    pub v_counts: Array1<u32>,
    pub yv_counts: Array2<u32>,
}

impl NominalSplitCache {
    pub fn new(n_vals: usize, n_classes: usize) -> Self {
        Self {
            best_v: -1,
            v_counts: Array1::zeros(n_vals),
            yv_counts: Array2::zeros((n_vals, n_classes)),
        }
    }

    /// Grow-only resize that keeps already accumulated counts.
    pub fn expand(&mut self, n_vals: usize, n_classes: usize) {
        let old_vals = self.v_counts.len();
        let (old_rows, old_cols) = self.yv_counts.dim();
        let n_vals = n_vals.max(old_vals);
        let n_classes = n_classes.max(old_cols);

        let mut v_counts = Array1::zeros(n_vals);
        v_counts.slice_mut(s![..old_vals]).assign(&self.v_counts);
        self.v_counts = v_counts;

        let mut yv_counts = Array2::zeros((n_vals, n_classes));
        yv_counts
            .slice_mut(s![..old_rows, ..old_cols])
            .assign(&self.yv_counts);
        self.yv_counts = yv_counts;
    }

    /// Whether the stored shape is too small for the requested one.
    pub fn needs_expand(&self, n_vals: usize, n_classes: usize) -> bool {
        let (rows, cols) = self.yv_counts.dim();
        rows < n_vals || cols < n_classes
    }
}

/// Kernel output for one continuous feature at one node.
#[derive(Debug)]
pub(crate) struct ContinuousSplitCache {
    pub is_const: bool,
    pub threshold: f64,
    pub op: SplitOp,
    pub left_counts: Array1<u32>,
    pub right_counts: Array1<u32>,
    pub nan_counts: Array1<u32>,
}

impl ContinuousSplitCache {
    pub fn new(n_classes: usize) -> Self {
        Self {
            is_const: false,
            threshold: f64::INFINITY,
            op: SplitOp::Ge,
            left_counts: Array1::zeros(n_classes),
            right_counts: Array1::zeros(n_classes),
            nan_counts: Array1::zeros(n_classes),
        }
    }
}

/// Sparse slot vector addressed by feature index, growing by doubling.
///
/// Slots start empty and are filled lazily on first visit; growth never drops
/// an occupied slot.
#[derive(Debug)]
pub(crate) struct CacheSlots<T> {
    slots: Vec<Option<Box<T>>>,
}

const INITIAL_SLOTS: usize = 32;

impl<T> CacheSlots<T> {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Slots `[0, len)`, allocating empty ones as needed.
    pub fn slice_mut(&mut self, len: usize) -> &mut [Option<Box<T>>] {
        if self.slots.len() < len {
            let mut capacity = self.slots.len().max(INITIAL_SLOTS);
            while capacity < len {
                capacity *= 2;
            }
            self.slots.resize_with(capacity, || None);
        }
        &mut self.slots[..len]
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(|slot| slot.as_deref())
    }
}
