use ndarray::{s, Array1, ArrayView1, ArrayView2};

use crate::error::{Result, TreeError};
use crate::tree::builder::{fit_tree, SplitChoice};
use crate::tree::conditions::{tree_to_conditions, Conjunction};
use crate::tree::criterion::Criterion;
use crate::tree::model::Tree;
use crate::tree::predict::{predict_tree, PredChoice};
use crate::utils;

/// Configuration for tree induction and prediction.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeConfig {
    /// Impurity criterion scoring candidate splits.
    pub criterion: Criterion,
    /// Greedy single split versus all tied splits per node.
    pub split_choice: SplitChoice,
    /// Voting policy resolving the leaf set at prediction time.
    pub pred_choice: PredChoice,
    /// Class consulted by the `*General` prediction policies.
    pub positive_class: i64,
    /// Treat NaN in continuous features as a separable branch.
    pub sep_nan: bool,
    /// Deduplicate identical children across expansions, producing a DAG.
    pub cache_nodes: bool,
    /// Declared value count per binary-matrix column; `None` means every
    /// column is binary. Columns with arity 3 or more are searched
    /// one-vs-rest.
    pub value_arities: Option<Vec<u32>>,
}

impl TreeConfig {
    /// Classical greedy decision tree.
    pub fn decision_tree() -> Self {
        Self {
            criterion: Criterion::Gini,
            split_choice: SplitChoice::SingleMax,
            pred_choice: PredChoice::Majority,
            positive_class: 1,
            sep_nan: true,
            cache_nodes: false,
            value_arities: None,
        }
    }

    /// Ambiguity tree: every tied split expands, shared children collapse
    /// into a DAG, prediction votes across pure leaves.
    pub fn ambiguity_tree() -> Self {
        Self {
            criterion: Criterion::Gini,
            split_choice: SplitChoice::AllMax,
            pred_choice: PredChoice::PureMajority,
            positive_class: 1,
            sep_nan: true,
            cache_nodes: true,
            value_arities: None,
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::decision_tree()
    }
}

/// Multiclass classifier over mixed binary, nominal and continuous features.
///
/// Samples are described by two parallel matrices sharing their row count: a
/// `u8` matrix of binary or small-nominal values and an `f64` matrix of
/// continuous values (NaN permitted). Cells listed in the missing set are
/// routed into the left branch during both fit and predict.
///
/// # Example
/// ```
/// use ambitree::{TreeClassifier, TreeConfig};
/// use ndarray::{arr1, arr2, Array2};
///
/// let x_bin = arr2(&[[0u8, 0], [0, 1], [1, 0], [1, 1]]);
/// let x_cont = Array2::<f64>::zeros((0, 0));
/// let y = arr1(&[1i64, 1, 1, 2]);
///
/// let mut clf = TreeClassifier::new(TreeConfig::decision_tree());
/// clf.fit(x_bin.view(), x_cont.view(), y.view(), &[]).unwrap();
/// let predictions = clf.predict(x_bin.view(), x_cont.view()).unwrap();
/// assert_eq!(predictions, arr1(&[1i64, 1, 1, 2]));
/// ```
#[derive(Debug)]
pub struct TreeClassifier {
    config: TreeConfig,
    tree: Option<Tree>,
}

impl TreeClassifier {
    /// Creates an unfitted classifier with the given configuration.
    pub fn new(config: TreeConfig) -> Self {
        Self { config, tree: None }
    }

    /// Fits the tree to the training data.
    ///
    /// `missing` lists `(row, column)` cells to exclude from split search,
    /// columns numbered binary-first then continuous. The pairs may arrive
    /// in any order; they are normalized internally.
    pub fn fit(
        &mut self,
        x_bin: ArrayView2<u8>,
        x_cont: ArrayView2<f64>,
        y: ArrayView1<i64>,
        missing: &[(usize, usize)],
    ) -> Result<()> {
        utils::validate_fit_input(&x_bin, &x_cont, &y)?;
        // A matrix without rows contributes no features.
        let x_bin = if x_bin.nrows() == 0 {
            x_bin.slice_move(s![0..0, 0..0])
        } else {
            x_bin
        };
        let x_cont = if x_cont.nrows() == 0 {
            x_cont.slice_move(s![0..0, 0..0])
        } else {
            x_cont
        };
        match &self.config.value_arities {
            Some(arities) => utils::validate_arities(&x_bin, arities)?,
            None => utils::validate_arities(&x_bin, &vec![2; x_bin.ncols()])?,
        }
        utils::validate_missing(missing, y.len(), x_bin.ncols() + x_cont.ncols())?;

        self.tree = Some(fit_tree(x_bin, x_cont, y, missing, &self.config));
        Ok(())
    }

    /// Predicts class labels using the configured policy.
    pub fn predict(
        &self,
        x_bin: ArrayView2<u8>,
        x_cont: ArrayView2<f64>,
    ) -> Result<Array1<i64>> {
        self.predict_with(
            x_bin,
            x_cont,
            self.config.pred_choice,
            self.config.positive_class,
            true,
        )
    }

    /// Predicts with an explicit policy, positive class and decode flag.
    ///
    /// With `decode_classes` the majority policies return original class
    /// ids; the `*General` policies always return `0` or `1`.
    pub fn predict_with(
        &self,
        x_bin: ArrayView2<u8>,
        x_cont: ArrayView2<f64>,
        pred_choice: PredChoice,
        positive_class: i64,
        decode_classes: bool,
    ) -> Result<Array1<i64>> {
        let tree = self.tree.as_ref().ok_or(TreeError::NotFitted)?;
        let x_bin = if tree.n_bin_features() == 0 {
            x_bin.slice_move(s![0..0, 0..0])
        } else {
            x_bin
        };
        let x_cont = if tree.n_cont_features() == 0 {
            x_cont.slice_move(s![0..0, 0..0])
        } else {
            x_cont
        };
        let rows = utils::sample_rows(&x_bin, &x_cont);
        if tree.n_bin_features() > 0 {
            if x_bin.ncols() != tree.n_bin_features() {
                return Err(TreeError::DimensionMismatch {
                    expected: tree.n_bin_features(),
                    got: x_bin.ncols(),
                });
            }
            if x_bin.nrows() != rows {
                return Err(TreeError::RowCountMismatch {
                    bin: x_bin.nrows(),
                    cont: rows,
                });
            }
        }
        if tree.n_cont_features() > 0 {
            if x_cont.ncols() != tree.n_cont_features() {
                return Err(TreeError::DimensionMismatch {
                    expected: tree.n_cont_features(),
                    got: x_cont.ncols(),
                });
            }
            if x_cont.nrows() != rows {
                return Err(TreeError::RowCountMismatch {
                    bin: rows,
                    cont: x_cont.nrows(),
                });
            }
        }
        Ok(predict_tree(
            tree,
            x_bin,
            x_cont,
            pred_choice,
            positive_class,
            decode_classes,
        ))
    }

    /// Extracts the conjunctive rules leading to `target_class` leaves.
    pub fn conditions(
        &self,
        target_class: i64,
        only_pure_leaves: bool,
    ) -> Result<Vec<Conjunction>> {
        let tree = self.tree.as_ref().ok_or(TreeError::NotFitted)?;
        tree_to_conditions(tree, target_class, only_pure_leaves)
    }

    /// The fitted tree, if any.
    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }
}
