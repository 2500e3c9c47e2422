use std::fmt;

use ndarray::Array1;

/// Sentinel child index meaning "no node on this branch".
pub const NO_CHILD: i32 = -1;

/// Node type tag used in the flat encoding.
const TTYPE_NODE: i32 = 1;
const TTYPE_LEAF: i32 = 2;

/// Comparison operator recorded on a split.
///
/// Continuous splits carry `Ge`, `Lt` or `IsNan`; a NaN value fails both the
/// `Ge` and `Lt` tests and therefore walks left, which is how the chosen
/// polarity decides which side absorbs NaN. Binary and nominal splits are
/// dispatched by value equality and record `Ge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum SplitOp {
    /// Right branch when `value >= threshold`.
    Ge,
    /// Right branch when `value < threshold`.
    Lt,
    /// Right branch when the value is NaN.
    IsNan,
}

impl SplitOp {
    /// Whether `value` takes the right branch under this operator.
    pub fn applies(self, value: f64, threshold: f64) -> bool {
        match self {
            SplitOp::Ge => value >= threshold,
            SplitOp::Lt => value < threshold,
            SplitOp::IsNan => value.is_nan(),
        }
    }
}

impl fmt::Display for SplitOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitOp::Ge => write!(f, ">="),
            SplitOp::Lt => write!(f, "<"),
            SplitOp::IsNan => write!(f, "isNaN"),
        }
    }
}

/// One split retained on an internal node.
///
/// Classical trees hold exactly one record per internal node; ambiguity trees
/// keep every split tied for best impurity decrease. Child fields are node
/// indices, [`NO_CHILD`] when a branch has no node. For continuous features
/// `threshold_bits` is the bit pattern of the `f32` threshold; for binary and
/// nominal features it holds the isolated value itself (`1` for plain binary
/// columns).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct SplitRecord {
    pub feature: i32,
    pub threshold_bits: i32,
    pub left: i32,
    pub right: i32,
    pub nan: i32,
    pub op: SplitOp,
}

impl SplitRecord {
    /// The continuous threshold decoded from its bit pattern.
    pub fn threshold(&self) -> f32 {
        f32::from_bits(self.threshold_bits as u32)
    }
}

/// A node of a frozen tree.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum Node {
    /// Interior node: one or more splits plus the class counts of the
    /// samples that reached it.
    Internal {
        splits: Vec<SplitRecord>,
        counts: Array1<u32>,
    },
    /// Terminal node: class counts only.
    Leaf { counts: Array1<u32> },
}

impl Node {
    /// Class counts of the samples that reached this node.
    pub fn counts(&self) -> &Array1<u32> {
        match self {
            Node::Internal { counts, .. } | Node::Leaf { counts } => counts,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// The node's split records; empty for leaves.
    pub fn splits(&self) -> &[SplitRecord] {
        match self {
            Node::Internal { splits, .. } => splits,
            Node::Leaf { .. } => &[],
        }
    }

    /// Whether the count vector has exactly one non-zero entry.
    pub fn is_pure(&self) -> bool {
        self.counts().iter().filter(|&&c| c > 0).count() == 1
    }
}

/// A fitted decision or ambiguity tree. Immutable after fit.
///
/// Node 0 is the root. Ambiguity trees are directed acyclic graphs: a child
/// node may be shared by several parents, but back-edges never occur.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Tree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) u_ys: Vec<i64>,
    pub(crate) n_bin_features: usize,
    pub(crate) n_cont_features: usize,
}

impl Tree {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The class-id decoding table, ordered by compressed class index.
    pub fn classes(&self) -> &[i64] {
        &self.u_ys
    }

    pub fn n_bin_features(&self) -> usize {
        self.n_bin_features
    }

    pub fn n_cont_features(&self) -> usize {
        self.n_cont_features
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Encodes the tree into a flat `i32` buffer.
    ///
    /// Layout: `[class_table_offset]`, then per node
    /// `[encoded_length, ttype, index, n_splits,
    ///   (feature, threshold_bits, left_off, right_off, nan_off) * n_splits,
    ///   counts * n_classes]`, then the class ids. Child fields hold buffer
    /// offsets rather than node indices, `-1` preserved.
    pub fn encode(&self) -> Vec<i32> {
        let n_classes = self.u_ys.len();
        let mut node_offsets = Vec::with_capacity(self.nodes.len() + 1);
        let mut offset = 1i32;
        node_offsets.push(offset);
        for node in &self.nodes {
            offset += (4 + node.splits().len() * 5 + n_classes) as i32;
            node_offsets.push(offset);
        }

        let mut out = vec![0i32; offset as usize + n_classes];
        out[0] = offset;
        for (i, node) in self.nodes.iter().enumerate() {
            let mut ind = node_offsets[i] as usize;
            out[ind] = node_offsets[i + 1] - node_offsets[i];
            out[ind + 1] = if node.is_leaf() { TTYPE_LEAF } else { TTYPE_NODE };
            out[ind + 2] = i as i32;
            out[ind + 3] = node.splits().len() as i32;
            ind += 4;
            for split in node.splits() {
                let child_offset = |child: i32| {
                    if child == NO_CHILD {
                        NO_CHILD
                    } else {
                        node_offsets[child as usize]
                    }
                };
                out[ind] = split.feature;
                out[ind + 1] = split.threshold_bits;
                out[ind + 2] = child_offset(split.left);
                out[ind + 3] = child_offset(split.right);
                out[ind + 4] = child_offset(split.nan);
                ind += 5;
            }
            for &c in node.counts().iter() {
                out[ind] = c as i32;
                ind += 1;
            }
        }
        for (k, &u) in self.u_ys.iter().enumerate() {
            out[offset as usize + k] = u as i32;
        }
        out
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TREE w/ classes: {:?}", self.u_ys)?;
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Internal { splits, .. } => {
                    write!(f, "NODE({i}) : ")?;
                    for split in splits {
                        let feature = split.feature;
                        if (feature as usize) < self.n_bin_features {
                            if split.threshold_bits == 1 {
                                write!(f, "({feature})")?;
                            } else {
                                write!(f, "({feature}={})", split.threshold_bits)?;
                            }
                        } else if split.op == SplitOp::IsNan {
                            write!(f, "({feature},isNaN)")?;
                        } else {
                            write!(f, "({feature},{}{})", split.op, split.threshold())?;
                        }
                        write!(f, "[L:{} R:{}", split.left, split.right)?;
                        if split.nan == NO_CHILD {
                            write!(f, "] ")?;
                        } else {
                            write!(f, " NaN:{}] ", split.nan)?;
                        }
                    }
                    writeln!(f)?;
                }
                Node::Leaf { counts } => {
                    writeln!(f, "LEAF({i}) : {:?}", counts.as_slice().unwrap_or(&[]))?;
                }
            }
        }
        Ok(())
    }
}
