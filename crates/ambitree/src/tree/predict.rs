use std::str::FromStr;

use ndarray::{Array1, ArrayView2};

use crate::error::TreeError;
use crate::tree::model::{Node, Tree, NO_CHILD};

/// Policy resolving a sample's leaf set into a prediction.
///
/// In a classical tree the walk reaches exactly one leaf; in an ambiguity
/// tree a sample may reach many, and the policy disambiguates. The
/// `*General` policies answer the binary question "did any leaf vote for the
/// positive class" and return `1` or `0` instead of a class id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum PredChoice {
    /// The class predicted by the majority of reached leaves.
    Majority,
    /// Majority over pure leaves when any exist, else over all leaves.
    PureMajority,
    /// `1` if any leaf's majority class is the positive class, else `0`.
    MajorityGeneral,
    /// Like `MajorityGeneral`, restricted to pure leaves when any exist.
    PureMajorityGeneral,
}

impl PredChoice {
    pub(crate) fn is_general(self) -> bool {
        matches!(
            self,
            PredChoice::MajorityGeneral | PredChoice::PureMajorityGeneral
        )
    }

    fn choose(self, leaf_counts: &[&Array1<u32>], positive_class: i64) -> i64 {
        match self {
            PredChoice::Majority => majority(leaf_counts) as i64,
            PredChoice::PureMajority => {
                let pure = pure_subset(leaf_counts);
                if pure.is_empty() {
                    majority(leaf_counts) as i64
                } else {
                    majority(&pure) as i64
                }
            }
            PredChoice::MajorityGeneral => any_votes_for(leaf_counts, positive_class),
            PredChoice::PureMajorityGeneral => {
                let pure = pure_subset(leaf_counts);
                if pure.is_empty() {
                    any_votes_for(leaf_counts, positive_class)
                } else {
                    any_votes_for(&pure, positive_class)
                }
            }
        }
    }
}

impl FromStr for PredChoice {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "majority" => Ok(PredChoice::Majority),
            "pure_majority" => Ok(PredChoice::PureMajority),
            "majority_general" => Ok(PredChoice::MajorityGeneral),
            "pure_majority_general" => Ok(PredChoice::PureMajorityGeneral),
            other => Err(TreeError::UnknownPredChoice(other.to_string())),
        }
    }
}

/// Index of the first maximum in a count vector.
pub(crate) fn argmax_counts(counts: &Array1<u32>) -> usize {
    let mut best = 0;
    for (k, &c) in counts.iter().enumerate() {
        if c > counts[best] {
            best = k;
        }
    }
    best
}

fn pure_subset<'a>(leaf_counts: &[&'a Array1<u32>]) -> Vec<&'a Array1<u32>> {
    leaf_counts
        .iter()
        .copied()
        .filter(|counts| counts.iter().filter(|&&c| c > 0).count() == 1)
        .collect()
}

fn majority(leaf_counts: &[&Array1<u32>]) -> usize {
    if leaf_counts.is_empty() {
        return 0;
    }
    let mut votes = vec![0u32; leaf_counts[0].len()];
    for counts in leaf_counts {
        votes[argmax_counts(counts)] += 1;
    }
    let mut best = 0;
    for (k, &v) in votes.iter().enumerate() {
        if v > votes[best] {
            best = k;
        }
    }
    best
}

fn any_votes_for(leaf_counts: &[&Array1<u32>], positive_class: i64) -> i64 {
    let hit = leaf_counts
        .iter()
        .any(|counts| argmax_counts(counts) as i64 == positive_class);
    i64::from(hit)
}

/// Classifies every sample by walking the frozen tree.
///
/// The walk keeps a visit mask over the node table instead of a work list:
/// ambiguity trees are DAGs, so a node can be reached along several paths and
/// must still be expanded once. The mask grows monotonically, so the walk
/// terminates after at most `node_count` rounds.
pub(crate) fn predict_tree(
    tree: &Tree,
    x_bin: ArrayView2<u8>,
    x_cont: ArrayView2<f64>,
    choice: PredChoice,
    positive_class: i64,
    decode_classes: bool,
) -> Array1<i64> {
    const UNSEEN: u8 = 0;
    const VISIT: u8 = 1;
    const VISITED: u8 = 2;

    let rows = x_bin.nrows().max(x_cont.nrows());
    let n_bin = tree.n_bin_features;
    let mut out = Array1::zeros(rows);
    for i in 0..rows {
        let mut mask = vec![UNSEEN; tree.nodes.len()];
        mask[0] = VISIT;
        let mut frontier = vec![0usize];
        let mut leaf_counts: Vec<&Array1<u32>> = Vec::new();

        while !frontier.is_empty() {
            for &index in &frontier {
                mask[index] = VISITED;
            }
            let mut next = Vec::new();
            for &index in &frontier {
                match &tree.nodes[index] {
                    Node::Internal { splits, .. } => {
                        for split in splits {
                            let feature = split.feature as usize;
                            let goes_right = if feature < n_bin {
                                i32::from(x_bin[[i, feature]]) == split.threshold_bits
                            } else {
                                split
                                    .op
                                    .applies(x_cont[[i, feature - n_bin]], f64::from(split.threshold()))
                            };
                            let child = if goes_right { split.right } else { split.left };
                            if child != NO_CHILD {
                                let child = child as usize;
                                if mask[child] == UNSEEN {
                                    mask[child] = VISIT;
                                    next.push(child);
                                }
                            }
                        }
                    }
                    Node::Leaf { counts } => leaf_counts.push(counts),
                }
            }
            frontier = next;
        }

        let vote = choice.choose(&leaf_counts, positive_class);
        out[i] = if decode_classes && !choice.is_general() {
            tree.u_ys[vote as usize]
        } else {
            vote
        };
    }
    out
}
