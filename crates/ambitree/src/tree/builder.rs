use std::collections::HashMap;
use std::str::FromStr;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::TreeError;
use crate::tree::cache::{CacheSlots, ContinuousSplitCache, NominalSplitCache};
use crate::tree::classifier::TreeConfig;
use crate::tree::missing::MissingValues;
use crate::tree::model::{Node, SplitOp, SplitRecord, Tree, NO_CHILD};
use crate::tree::partition::partition;
use crate::tree::split::{evaluate_splits, SplitEval};

/// Policy deciding which candidate splits a node expands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum SplitChoice {
    /// Greedy: only the split with the largest impurity decrease.
    SingleMax,
    /// Ambiguity: every split tied for the largest impurity decrease.
    AllMax,
}

impl SplitChoice {
    pub(crate) fn choose(self, decreases: &[f64]) -> Vec<usize> {
        if decreases.is_empty() {
            return Vec::new();
        }
        match self {
            SplitChoice::SingleMax => {
                let mut best = 0;
                for (f, &d) in decreases.iter().enumerate() {
                    if d > decreases[best] {
                        best = f;
                    }
                }
                vec![best]
            }
            SplitChoice::AllMax => {
                let max = decreases.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                decreases
                    .iter()
                    .enumerate()
                    .filter(|&(_, &d)| d == max)
                    .map(|(f, _)| f)
                    .collect()
            }
        }
    }
}

impl FromStr for SplitChoice {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_max" => Ok(SplitChoice::SingleMax),
            "all_max" => Ok(SplitChoice::AllMax),
            other => Err(TreeError::UnknownSplitChoice(other.to_string())),
        }
    }
}

/// Per-node state while the node sits on the frontier.
///
/// `node` is the tree node this context expands; `[start, end)` is its range
/// of the shared sample slab. The caches and the impurity table are filled by
/// the first kernel run and reused across re-visits in ambiguity mode.
#[derive(Debug)]
struct SplitterContext {
    node: usize,
    start: usize,
    end: usize,
    counts: Array1<u32>,
    impurity: f64,
    nominal_caches: CacheSlots<NominalSplitCache>,
    continuous_caches: CacheSlots<ContinuousSplitCache>,
    impurities: Option<Array2<f64>>,
    chosen: Vec<usize>,
    cursor: usize,
}

impl SplitterContext {
    fn new(node: usize, start: usize, end: usize, counts: Array1<u32>, impurity: f64) -> Self {
        Self {
            node,
            start,
            end,
            counts,
            impurity,
            nominal_caches: CacheSlots::new(),
            continuous_caches: CacheSlots::new(),
            impurities: None,
            chosen: Vec::new(),
            cursor: 0,
        }
    }
}

/// Content-addressed index keyed on sorted sample-index sets.
///
/// The FNV hash buckets candidate sets; equality on collision is exact, so a
/// hit always means the same set of samples. Node numbering follows insertion
/// order, keeping the frozen tree identical across runs.
#[derive(Debug, Default)]
struct NodeIndex {
    buckets: HashMap<u64, Vec<(Vec<u32>, i32)>>,
}

impl NodeIndex {
    fn get(&self, key: &[u32]) -> Option<i32> {
        self.buckets
            .get(&fnv1a(key))?
            .iter()
            .find(|(stored, _)| stored == key)
            .map(|&(_, node)| node)
    }

    fn insert(&mut self, key: Vec<u32>, node: i32) {
        self.buckets.entry(fnv1a(&key)).or_default().push((key, node));
    }
}

fn fnv1a(rows: &[u32]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for &row in rows {
        for byte in row.to_le_bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(PRIME);
        }
    }
    hash
}

/// Finds the unique classes in a sorted label slice.
///
/// Returns per-class counts, the class decoding table, and the compressed
/// class id of every row.
pub(crate) fn unique_counts(y_sorted: &[i64]) -> (Array1<u32>, Vec<i64>, Vec<u32>) {
    let mut counts = Vec::new();
    let mut uniques = Vec::new();
    let mut ids = vec![0u32; y_sorted.len()];
    let mut run_start = 0;
    for i in 1..y_sorted.len() {
        if y_sorted[i] != y_sorted[i - 1] {
            counts.push((i - run_start) as u32);
            uniques.push(y_sorted[i - 1]);
            run_start = i;
        }
        ids[i] = counts.len() as u32;
    }
    counts.push((y_sorted.len() - run_start) as u32);
    uniques.push(y_sorted[y_sorted.len() - 1]);
    (Array1::from_vec(counts), uniques, ids)
}

/// Fits a decision or ambiguity tree. Inputs are assumed validated.
pub(crate) fn fit_tree(
    x_bin: ArrayView2<u8>,
    x_cont: ArrayView2<f64>,
    y: ArrayView1<i64>,
    missing: &[(usize, usize)],
    config: &TreeConfig,
) -> Tree {
    let n = y.len();

    // One-time stable sort by label keeps equal classes contiguous.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| y[i]);

    let x_bin_sorted: Array2<u8> = if x_bin.nrows() == 0 {
        Array2::zeros((0, 0))
    } else {
        x_bin.select(Axis(0), &order)
    };
    let x_cont_sorted: Array2<f64> = if x_cont.nrows() == 0 {
        Array2::zeros((0, 0))
    } else {
        x_cont.select(Axis(0), &order)
    };
    let y_sorted: Vec<i64> = order.iter().map(|&i| y[i]).collect();
    let (counts, u_ys, y_ids) = unique_counts(&y_sorted);
    let n_classes = u_ys.len();

    let mut row_position = vec![0u32; n];
    for (position, &row) in order.iter().enumerate() {
        row_position[row] = position as u32;
    }
    let missing = MissingValues::normalize(missing, &row_position);

    let n_bin = x_bin_sorted.ncols();
    let n_cont = x_cont_sorted.ncols();
    let arities: Vec<u32> = config
        .value_arities
        .clone()
        .unwrap_or_else(|| vec![2; n_bin]);

    let mut slab: Vec<u32> = (0..n as u32).collect();
    let root_impurity = config.criterion.of_counts(counts.view());

    let mut nodes: Vec<Node> = vec![Node::Internal {
        splits: Vec::new(),
        counts: counts.clone(),
    }];
    let mut node_index = NodeIndex::default();
    let mut stack = vec![SplitterContext::new(0, 0, n, counts, root_impurity)];

    while let Some(mut context) = stack.pop() {
        if context.impurities.is_none() {
            let impurities = {
                let eval = SplitEval {
                    x_bin: &x_bin_sorted,
                    x_cont: &x_cont_sorted,
                    y_ids: &y_ids,
                    node_rows: &slab[context.start..context.end],
                    counts: &context.counts,
                    impurity: context.impurity,
                    arities: &arities,
                    missing: &missing,
                    n_classes,
                    criterion: config.criterion,
                    sep_nan: config.sep_nan,
                };
                evaluate_splits(
                    &eval,
                    context.nominal_caches.slice_mut(n_bin),
                    context.continuous_caches.slice_mut(n_cont),
                )
            };
            let decreases: Vec<f64> = (0..n_bin + n_cont)
                .map(|f| context.impurity - impurities[[f, 0]])
                .collect();
            context.chosen = config.split_choice.choose(&decreases);
            context.impurities = Some(impurities);
            if context.chosen.is_empty() {
                nodes[context.node] = Node::Leaf {
                    counts: context.counts.clone(),
                };
                continue;
            }
        }

        // One partitioning split per visit: a retained split's subtree must
        // finish before the range is repartitioned for the next tied split,
        // so the context re-enters the stack beneath its children.
        let mut spawned: Vec<SplitterContext> = Vec::new();
        while context.cursor < context.chosen.len() && spawned.is_empty() {
            let split = context.chosen[context.cursor];
            context.cursor += 1;

            let impurities = context.impurities.as_ref().expect("kernel has run");
            let decrease = context.impurity - impurities[[split, 0]];
            if decrease <= 0.0 {
                nodes[context.node] = Node::Leaf {
                    counts: context.counts.clone(),
                };
                continue;
            }
            let imp_left = impurities[[split, 1]];
            let imp_right = impurities[[split, 2]];

            let pivot;
            let left_counts;
            let right_counts;
            let threshold_bits;
            let op;
            let range = &mut slab[context.start..context.end];
            if split < n_bin {
                let cache = context
                    .nominal_caches
                    .get(split)
                    .expect("kernel filled the nominal cache");
                let value = cache.best_v;
                let column_missing = missing.column(split);
                let q = partition(range, |row| {
                    !column_missing.contains(row)
                        && i32::from(x_bin_sorted[[row as usize, split]]) == value
                });
                let right = cache.yv_counts.row(value as usize).to_owned();
                left_counts = &context.counts - &right;
                right_counts = right;
                pivot = context.start + q;
                threshold_bits = value;
                op = SplitOp::Ge;
            } else {
                let j = split - n_bin;
                let cache = context
                    .continuous_caches
                    .get(j)
                    .expect("kernel filled the continuous cache");
                let threshold = cache.threshold;
                let cache_op = cache.op;
                let column_missing = missing.column(split);
                let q = partition(range, |row| {
                    !column_missing.contains(row)
                        && cache_op.applies(x_cont_sorted[[row as usize, j]], threshold)
                });
                left_counts = cache.left_counts.clone();
                right_counts = cache.right_counts.clone();
                pivot = context.start + q;
                threshold_bits = (threshold as f32).to_bits() as i32;
                op = cache_op;
            }

            let node_left = materialize_child(
                &mut nodes,
                &mut node_index,
                config.cache_nodes,
                &slab,
                pivot,
                context.end,
                imp_left,
                left_counts,
                &mut spawned,
            );
            let node_right = materialize_child(
                &mut nodes,
                &mut node_index,
                config.cache_nodes,
                &slab,
                context.start,
                pivot,
                imp_right,
                right_counts,
                &mut spawned,
            );
            if let Node::Internal { splits, .. } = &mut nodes[context.node] {
                splits.push(SplitRecord {
                    feature: split as i32,
                    threshold_bits,
                    left: node_left,
                    right: node_right,
                    nan: NO_CHILD,
                    op,
                });
            }
        }

        if context.cursor < context.chosen.len() {
            stack.push(context);
        }
        for child in spawned {
            stack.push(child);
        }
    }

    Tree {
        nodes,
        u_ys,
        n_bin_features: n_bin,
        n_cont_features: n_cont,
    }
}

/// Allocates (or, with `cache_nodes`, reuses) the node for one child range.
///
/// An impure child becomes an internal node with a fresh context; a pure one
/// becomes a leaf. Dedup hits return the existing node index, which is what
/// turns an ambiguity tree into a DAG.
#[allow(clippy::too_many_arguments)]
fn materialize_child(
    nodes: &mut Vec<Node>,
    node_index: &mut NodeIndex,
    cache_nodes: bool,
    slab: &[u32],
    start: usize,
    end: usize,
    impurity: f64,
    counts: Array1<u32>,
    spawned: &mut Vec<SplitterContext>,
) -> i32 {
    let key = if cache_nodes {
        let mut key = slab[start..end].to_vec();
        key.sort_unstable();
        if let Some(existing) = node_index.get(&key) {
            return existing;
        }
        Some(key)
    } else {
        None
    };

    let index = nodes.len() as i32;
    if let Some(key) = key {
        node_index.insert(key, index);
    }
    if impurity > 0.0 {
        nodes.push(Node::Internal {
            splits: Vec::new(),
            counts: counts.clone(),
        });
        spawned.push(SplitterContext::new(
            index as usize,
            start,
            end,
            counts,
            impurity,
        ));
    } else {
        nodes.push(Node::Leaf { counts });
    }
    index
}
