use std::collections::HashSet;

use ndarray::ArrayView1;

use crate::error::{Result, TreeError};
use crate::tree::model::{Node, SplitOp, SplitRecord, Tree, NO_CHILD};
use crate::tree::predict::argmax_counts;

/// Which branch of a split a condition asserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum Polarity {
    /// The left (negated) branch.
    Neg,
    /// The right (asserted) branch.
    Pos,
    /// The NaN branch.
    Nan,
}

/// One atom of a conjunctive rule.
///
/// Nominal atoms test value equality against `threshold`; continuous atoms
/// apply `op` at `threshold`. `Pos` asserts the test, `Neg` negates it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Condition {
    pub feature: i32,
    pub nominal: bool,
    pub polarity: Polarity,
    pub op: SplitOp,
    pub threshold: f32,
}

impl Condition {
    /// Evaluates the atom against one sample.
    pub fn holds(
        &self,
        x_bin: ArrayView1<u8>,
        x_cont: ArrayView1<f64>,
        n_bin_features: usize,
    ) -> bool {
        if self.nominal {
            let hit = i32::from(x_bin[self.feature as usize]) == self.threshold as i32;
            match self.polarity {
                Polarity::Pos => hit,
                Polarity::Neg => !hit,
                Polarity::Nan => false,
            }
        } else {
            let value = x_cont[self.feature as usize - n_bin_features];
            match self.polarity {
                Polarity::Pos => self.op.applies(value, f64::from(self.threshold)),
                Polarity::Neg => !self.op.applies(value, f64::from(self.threshold)),
                Polarity::Nan => value.is_nan(),
            }
        }
    }
}

/// A root-to-leaf rule: the conjunction of its atoms.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Conjunction {
    pub conditions: Vec<Condition>,
}

impl Conjunction {
    /// Whether every atom holds for one sample.
    pub fn matches(
        &self,
        x_bin: ArrayView1<u8>,
        x_cont: ArrayView1<f64>,
        n_bin_features: usize,
    ) -> bool {
        self.conditions
            .iter()
            .all(|condition| condition.holds(x_bin, x_cont, n_bin_features))
    }
}

/// Extracts the conjunctive rules leading to leaves of a target class.
///
/// With `only_pure_leaves`, splits with an impure leaf child are skipped
/// entirely. Collected paths are sorted by feature, collapsed when two paths
/// differ in exactly one atom's polarity, and deduplicated.
pub(crate) fn tree_to_conditions(
    tree: &Tree,
    target_class: i64,
    only_pure_leaves: bool,
) -> Result<Vec<Conjunction>> {
    let target = tree
        .u_ys
        .iter()
        .position(|&u| u == target_class)
        .ok_or(TreeError::TargetClassNotFound(target_class))?;
    let n_bin = tree.n_bin_features;

    let mut frontier: Vec<(usize, Vec<Condition>)> = vec![(0, Vec::new())];
    let mut paths: Vec<Vec<Condition>> = Vec::new();
    while !frontier.is_empty() {
        let mut next = Vec::new();
        for (index, path) in frontier {
            match &tree.nodes[index] {
                Node::Internal { splits, .. } => {
                    for split in splits {
                        if only_pure_leaves && split_reaches_impure_leaf(tree, split) {
                            continue;
                        }
                        let nominal = (split.feature as usize) < n_bin;
                        let threshold = if nominal {
                            split.threshold_bits as f32
                        } else {
                            split.threshold()
                        };
                        let atom = |polarity| Condition {
                            feature: split.feature,
                            nominal,
                            polarity,
                            op: split.op,
                            threshold,
                        };
                        if split.left != NO_CHILD {
                            let mut extended = path.clone();
                            extended.push(atom(Polarity::Neg));
                            next.push((split.left as usize, extended));
                        }
                        if split.right != NO_CHILD {
                            let mut extended = path.clone();
                            extended.push(atom(Polarity::Pos));
                            next.push((split.right as usize, extended));
                        }
                        if split.nan != NO_CHILD {
                            let mut extended = path.clone();
                            extended.push(atom(Polarity::Nan));
                            next.push((split.nan as usize, extended));
                        }
                    }
                }
                Node::Leaf { counts } => {
                    if argmax_counts(counts) == target {
                        paths.push(path);
                    }
                }
            }
        }
        frontier = next;
    }

    for path in &mut paths {
        path.sort_by_key(|condition| condition.feature);
    }
    let paths = remove_over_constrained(paths);
    let paths = remove_duplicates(paths);
    Ok(paths
        .into_iter()
        .map(|conditions| Conjunction { conditions })
        .collect())
}

fn split_reaches_impure_leaf(tree: &Tree, split: &SplitRecord) -> bool {
    [split.left, split.right, split.nan].into_iter().any(|child| {
        if child == NO_CHILD {
            return false;
        }
        let node = &tree.nodes[child as usize];
        node.is_leaf() && !node.is_pure()
    })
}

/// Replaces path pairs differing in exactly one atom's polarity with a
/// single path that drops the differing atom.
fn remove_over_constrained(paths: Vec<Vec<Condition>>) -> Vec<Vec<Condition>> {
    let mut pairs: Vec<(usize, usize, usize)> = Vec::new();
    for i in 0..paths.len() {
        for j in (0..i).rev() {
            if paths[j].len() != paths[i].len() {
                continue;
            }
            let aligned = paths[i].iter().zip(&paths[j]).all(|(a, b)| {
                a.feature == b.feature
                    && a.nominal == b.nominal
                    && a.op == b.op
                    && a.threshold == b.threshold
            });
            if !aligned {
                continue;
            }
            let differing: Vec<usize> = paths[i]
                .iter()
                .zip(&paths[j])
                .enumerate()
                .filter(|(_, (a, b))| a.polarity != b.polarity)
                .map(|(position, _)| position)
                .collect();
            if differing.len() == 1 {
                pairs.push((i, j, differing[0]));
            }
        }
    }

    let mut replaced = HashSet::new();
    let mut out = Vec::new();
    for &(i, j, position) in &pairs {
        replaced.insert(i);
        replaced.insert(j);
        let mut collapsed = paths[i].clone();
        collapsed.remove(position);
        out.push(collapsed);
    }
    for (i, path) in paths.into_iter().enumerate() {
        if !replaced.contains(&i) {
            out.push(path);
        }
    }
    out
}

fn remove_duplicates(paths: Vec<Vec<Condition>>) -> Vec<Vec<Condition>> {
    let mut out: Vec<Vec<Condition>> = Vec::new();
    for path in paths {
        if !out.iter().any(|seen| seen == &path) {
            out.push(path);
        }
    }
    out
}
