use ndarray::{Array1, Array2, Axis};

use crate::tree::cache::{ContinuousSplitCache, NominalSplitCache};
use crate::tree::criterion::Criterion;
use crate::tree::missing::MissingValues;
use crate::tree::model::SplitOp;

/// Read-only node and dataset state consumed by one kernel invocation.
///
/// `node_rows` is the node's slice of the sample slab; every row id indexes
/// the class-sorted matrices.
pub(crate) struct SplitEval<'a> {
    pub x_bin: &'a Array2<u8>,
    pub x_cont: &'a Array2<f64>,
    pub y_ids: &'a [u32],
    pub node_rows: &'a [u32],
    pub counts: &'a Array1<u32>,
    pub impurity: f64,
    pub arities: &'a [u32],
    pub missing: &'a MissingValues,
    pub n_classes: usize,
    pub criterion: Criterion,
    pub sep_nan: bool,
}

/// Evaluates every candidate split of a node.
///
/// Fills the per-feature caches and returns the impurity table with one
/// `[total, left, right]` row per feature, binary columns first. A feature
/// found constant reports the node's own impurity in all three slots, so the
/// chooser discards it. Features are independent; with the `parallel` feature
/// the columns are fanned out across the rayon pool.
pub(crate) fn evaluate_splits(
    eval: &SplitEval<'_>,
    nominal: &mut [Option<Box<NominalSplitCache>>],
    continuous: &mut [Option<Box<ContinuousSplitCache>>],
) -> Array2<f64> {
    let n_bin = nominal.len();
    let n_cont = continuous.len();

    let nominal_rows = map_slots(nominal, |j, slot| eval_nominal(eval, j, slot));
    let continuous_rows = map_slots(continuous, |j, slot| eval_continuous(eval, j, slot));

    let mut impurities = Array2::zeros((n_bin + n_cont, 3));
    for (f, row) in nominal_rows.iter().chain(continuous_rows.iter()).enumerate() {
        impurities[[f, 0]] = row[0];
        impurities[[f, 1]] = row[1];
        impurities[[f, 2]] = row[2];
    }
    impurities
}

#[cfg(feature = "parallel")]
fn map_slots<T, F>(slots: &mut [Option<Box<T>>], f: F) -> Vec<[f64; 3]>
where
    T: Send,
    F: Fn(usize, &mut Option<Box<T>>) -> [f64; 3] + Send + Sync,
{
    use rayon::prelude::*;
    slots
        .par_iter_mut()
        .enumerate()
        .map(|(j, slot)| f(j, slot))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn map_slots<T, F>(slots: &mut [Option<Box<T>>], f: F) -> Vec<[f64; 3]>
where
    F: Fn(usize, &mut Option<Box<T>>) -> [f64; 3],
{
    slots
        .iter_mut()
        .enumerate()
        .map(|(j, slot)| f(j, slot))
        .collect()
}

/// Total impurity of a two-way partition, weighted by branch size.
fn weighted_total(imp_left: f64, n_left: u32, imp_right: f64, n_right: u32) -> f64 {
    let n = u64::from(n_left) + u64::from(n_right);
    if n == 0 {
        return 0.0;
    }
    (f64::from(n_left) * imp_left + f64::from(n_right) * imp_right) / n as f64
}

fn score(criterion: Criterion, left: &Array1<u32>, right: &Array1<u32>) -> (f64, f64, f64) {
    let n_left: u32 = left.sum();
    let n_right: u32 = right.sum();
    let imp_left = criterion.of_counts(left.view());
    let imp_right = criterion.of_counts(right.view());
    (
        weighted_total(imp_left, n_left, imp_right, n_right),
        imp_left,
        imp_right,
    )
}

/// One binary or small-nominal column.
///
/// Binary columns have the single candidate "right = value 1"; nominal
/// columns search every one-vs-rest isolation and record the winner in the
/// cache. Missing rows are excluded from the tables while searching; their
/// labels rejoin the left column implicitly because child counts are derived
/// from the node totals.
fn eval_nominal(
    eval: &SplitEval<'_>,
    j: usize,
    slot: &mut Option<Box<NominalSplitCache>>,
) -> [f64; 3] {
    let n_vals = eval.arities[j] as usize;
    let n_classes = eval.n_classes;
    let cache = slot.get_or_insert_with(|| Box::new(NominalSplitCache::new(n_vals, n_classes)));
    if cache.needs_expand(n_vals, n_classes) {
        cache.expand(n_vals, n_classes);
    }

    let missing = eval.missing.column(j);
    for &row in eval.node_rows {
        if missing.contains(row) {
            continue;
        }
        let value = usize::from(eval.x_bin[[row as usize, j]]);
        let class = eval.y_ids[row as usize] as usize;
        cache.v_counts[value] += 1;
        cache.yv_counts[[value, class]] += 1;
    }

    if cache.v_counts.iter().filter(|&&c| c > 0).count() <= 1 {
        return [eval.impurity; 3];
    }

    let non_missing = cache.yv_counts.sum_axis(Axis(0));
    let n_non_missing: u32 = non_missing.sum();
    let candidates = if n_vals == 2 { 1..n_vals } else { 0..n_vals };

    let mut best = [f64::INFINITY, 0.0, 0.0];
    let mut best_v = -1;
    for value in candidates {
        let counts_right = cache.yv_counts.row(value);
        let n_right: u32 = counts_right.sum();
        let counts_left = &non_missing - &counts_right;
        let n_left = n_non_missing - n_right;
        let imp_left = eval.criterion.of_counts(counts_left.view());
        let imp_right = eval.criterion.of_counts(counts_right);
        let total = weighted_total(imp_left, n_left, imp_right, n_right);
        if total < best[0] {
            best = [total, imp_left, imp_right];
            best_v = value as i32;
        }
    }
    cache.best_v = best_v;
    best
}

struct ContCandidate {
    total: f64,
    imp_left: f64,
    imp_right: f64,
    op: SplitOp,
    left: Array1<u32>,
    right: Array1<u32>,
}

/// One continuous column: threshold search with NaN polarity handling.
fn eval_continuous(
    eval: &SplitEval<'_>,
    j: usize,
    slot: &mut Option<Box<ContinuousSplitCache>>,
) -> [f64; 3] {
    let n_classes = eval.n_classes;
    let cache = slot.get_or_insert_with(|| Box::new(ContinuousSplitCache::new(n_classes)));
    let global_column = eval.x_bin.ncols() + j;

    // A pure node gets placeholder state only.
    if eval.counts.iter().filter(|&&c| c > 0).count() <= 1 {
        cache.is_const = true;
        cache.threshold = f64::INFINITY;
        cache.op = SplitOp::Ge;
        cache.left_counts = eval.counts.clone();
        cache.right_counts = Array1::zeros(n_classes);
        cache.nan_counts = Array1::zeros(n_classes);
        return [eval.impurity; 3];
    }

    let missing = eval.missing.column(global_column);
    let mut miss_counts = Array1::<u32>::zeros(n_classes);
    let mut values: Vec<(f64, u32)> = Vec::with_capacity(eval.node_rows.len());
    for &row in eval.node_rows {
        let class = eval.y_ids[row as usize];
        if missing.contains(row) {
            miss_counts[class as usize] += 1;
            continue;
        }
        values.push((eval.x_cont[[row as usize, j]], class));
    }

    // Sort by value, NaN at the tail.
    values.sort_by(|a, b| match (a.0.is_nan(), b.0.is_nan()) {
        (false, false) => a.0.partial_cmp(&b.0).expect("both values are ordered"),
        (false, true) => std::cmp::Ordering::Less,
        (true, false) => std::cmp::Ordering::Greater,
        (true, true) => std::cmp::Ordering::Equal,
    });
    let nan_start = values
        .iter()
        .position(|v| v.0.is_nan())
        .unwrap_or(values.len());
    let has_nan = nan_start < values.len();

    let mut nan_counts = Array1::<u32>::zeros(n_classes);
    for v in &values[nan_start..] {
        nan_counts[v.1 as usize] += 1;
    }
    let mut non_nan = Array1::<u32>::zeros(n_classes);
    for v in &values[..nan_start] {
        non_nan[v.1 as usize] += 1;
    }

    let mut best: Option<ContCandidate> = None;
    let mut best_total = f64::INFINITY;
    let mut search_threshold = f64::INFINITY;

    // Cumulative sweep over the candidate thresholds, one per adjacent
    // unequal value pair.
    let mut below = Array1::<u32>::zeros(n_classes);
    for i in 1..nan_start {
        below[values[i - 1].1 as usize] += 1;
        if values[i].0 == values[i - 1].0 {
            continue;
        }
        let above = &non_nan - &below;
        let candidate = if eval.sep_nan && has_nan {
            // Either polarity may absorb the NaN block: `>=` folds it into
            // the below side, `<` into the above side.
            let ge_left = &below + &nan_counts;
            let (ge_total, ge_l, ge_r) = score(eval.criterion, &ge_left, &above);
            let lt_left = &above + &nan_counts;
            let (lt_total, lt_l, lt_r) = score(eval.criterion, &lt_left, &below);
            if lt_total < ge_total {
                ContCandidate {
                    total: lt_total,
                    imp_left: lt_l,
                    imp_right: lt_r,
                    op: SplitOp::Lt,
                    left: lt_left,
                    right: below.clone(),
                }
            } else {
                ContCandidate {
                    total: ge_total,
                    imp_left: ge_l,
                    imp_right: ge_r,
                    op: SplitOp::Ge,
                    left: ge_left,
                    right: above,
                }
            }
        } else {
            let (total, imp_left, imp_right) = score(eval.criterion, &below, &above);
            ContCandidate {
                total,
                imp_left,
                imp_right,
                op: SplitOp::Ge,
                left: below.clone(),
                right: above,
            }
        };
        if candidate.total < best_total {
            best_total = candidate.total;
            search_threshold = (values[i - 1].0 + values[i].0) / 2.0;
            best = Some(candidate);
        }
    }

    // Isolating the NaN block outright is a third candidate.
    if eval.sep_nan && has_nan {
        let left = eval.counts - &nan_counts - &miss_counts;
        let right = nan_counts.clone();
        let (total, imp_left, imp_right) = score(eval.criterion, &left, &right);
        if total < best_total {
            best = Some(ContCandidate {
                total,
                imp_left,
                imp_right,
                op: SplitOp::IsNan,
                left,
                right,
            });
        }
    }

    match best {
        Some(candidate) => {
            let mut left = candidate.left;
            if !eval.sep_nan {
                // NaN fails every threshold test and walks left.
                left += &nan_counts;
            }
            left += &miss_counts;
            cache.is_const = false;
            cache.threshold = search_threshold;
            cache.op = candidate.op;
            cache.left_counts = left;
            cache.right_counts = candidate.right;
            cache.nan_counts = nan_counts;
            [candidate.total, candidate.imp_left, candidate.imp_right]
        }
        None => {
            // Single distinct value: the feature is constant here.
            cache.is_const = true;
            cache.threshold = f64::INFINITY;
            cache.op = SplitOp::Ge;
            cache.left_counts = eval.counts.clone();
            cache.right_counts = Array1::zeros(n_classes);
            cache.nan_counts = nan_counts;
            [eval.impurity; 3]
        }
    }
}
