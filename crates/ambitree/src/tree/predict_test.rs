#[cfg(test)]
mod tests {
    use ndarray::{arr1, arr2, Array1, Array2};
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::tree::builder::fit_tree;
    use crate::tree::classifier::TreeConfig;
    use crate::tree::model::{Node, SplitOp, SplitRecord, Tree, NO_CHILD};
    use crate::tree::predict::{predict_tree, PredChoice};

    /// An ambiguity node whose two splits send an x0=1 sample into both an
    /// impure and a pure leaf.
    fn two_leaf_tree() -> Tree {
        let split = |left, right| SplitRecord {
            feature: 0,
            threshold_bits: 1,
            left,
            right,
            nan: NO_CHILD,
            op: SplitOp::Ge,
        };
        Tree {
            nodes: vec![
                Node::Internal {
                    splits: vec![split(1, 2), split(1, 3)],
                    counts: arr1(&[3, 6]),
                },
                Node::Leaf {
                    counts: arr1(&[1, 0]),
                },
                Node::Leaf {
                    counts: arr1(&[2, 1]),
                },
                Node::Leaf {
                    counts: arr1(&[0, 5]),
                },
            ],
            u_ys: vec![10, 20],
            n_bin_features: 1,
            n_cont_features: 0,
        }
    }

    #[test]
    fn test_xor_like_training_data_reproduced() {
        let x_bin = arr2(&[[0u8, 0], [0, 1], [1, 0], [1, 1]]);
        let x_cont = Array2::<f64>::zeros((0, 0));
        let y = arr1(&[1i64, 1, 1, 2]);
        let tree = fit_tree(
            x_bin.view(),
            x_cont.view(),
            y.view(),
            &[],
            &TreeConfig::decision_tree(),
        );
        let out = predict_tree(&tree, x_bin.view(), x_cont.view(), PredChoice::Majority, 1, true);
        assert_eq!(out, y);
    }

    #[test]
    fn test_majority_ties_take_first_class() {
        let tree = two_leaf_tree();
        let x_cont = Array2::<f64>::zeros((0, 0));
        // One impure leaf votes class 0, one pure leaf votes class 1: the
        // tie resolves to the lower class index.
        let out = predict_tree(
            &tree,
            arr2(&[[1u8]]).view(),
            x_cont.view(),
            PredChoice::Majority,
            0,
            true,
        );
        assert_eq!(out, arr1(&[10]));
    }

    #[test]
    fn test_pure_majority_prefers_pure_leaves() {
        let tree = two_leaf_tree();
        let x_cont = Array2::<f64>::zeros((0, 0));
        let out = predict_tree(
            &tree,
            arr2(&[[1u8]]).view(),
            x_cont.view(),
            PredChoice::PureMajority,
            0,
            true,
        );
        assert_eq!(out, arr1(&[20]));

        // The x0=0 sample reaches only the pure class-0 leaf.
        let out = predict_tree(
            &tree,
            arr2(&[[0u8]]).view(),
            x_cont.view(),
            PredChoice::PureMajority,
            0,
            true,
        );
        assert_eq!(out, arr1(&[10]));
    }

    #[test]
    fn test_general_policies_answer_binary_question() {
        let tree = two_leaf_tree();
        let x_bin = arr2(&[[1u8]]);
        let x_cont = Array2::<f64>::zeros((0, 0));

        // Some reached leaf votes for class index 1.
        let out = predict_tree(&tree, x_bin.view(), x_cont.view(), PredChoice::MajorityGeneral, 1, true);
        assert_eq!(out, arr1(&[1]));
        // ... and for class index 0.
        let out = predict_tree(&tree, x_bin.view(), x_cont.view(), PredChoice::MajorityGeneral, 0, true);
        assert_eq!(out, arr1(&[1]));
        // Restricted to pure leaves, class index 0 no longer wins a leaf.
        let out = predict_tree(
            &tree,
            x_bin.view(),
            x_cont.view(),
            PredChoice::PureMajorityGeneral,
            0,
            true,
        );
        assert_eq!(out, arr1(&[0]));
    }

    #[test]
    fn test_dag_walk_terminates_with_shared_children() {
        // Both splits share the same left child; the visit mask keeps the
        // walk from expanding it twice.
        let tree = two_leaf_tree();
        let x_cont = Array2::<f64>::zeros((0, 0));
        let out = predict_tree(
            &tree,
            arr2(&[[0u8], [0], [0]]).view(),
            x_cont.view(),
            PredChoice::Majority,
            0,
            true,
        );
        assert_eq!(out, arr1(&[10, 10, 10]));
    }

    #[test]
    fn test_pred_choice_parsing() {
        assert_eq!("majority".parse::<PredChoice>().unwrap(), PredChoice::Majority);
        assert_eq!(
            "pure_majority".parse::<PredChoice>().unwrap(),
            PredChoice::PureMajority
        );
        assert_eq!(
            "majority_general".parse::<PredChoice>().unwrap(),
            PredChoice::MajorityGeneral
        );
        assert_eq!(
            "pure_majority_general".parse::<PredChoice>().unwrap(),
            PredChoice::PureMajorityGeneral
        );
        assert!("plurality".parse::<PredChoice>().is_err());
    }

    #[test]
    fn test_training_labels_reproduced_on_separable_data() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let n = 64;
        let mut x_bin = Array2::<u8>::zeros((n, 3));
        let mut y = Array1::<i64>::zeros(n);
        for i in 0..n {
            for j in 0..3 {
                x_bin[[i, j]] = rng.gen_range(0..2u8);
            }
            y[i] = i64::from(x_bin[[i, 0]]) + 2 * i64::from(x_bin[[i, 1]]);
        }
        let x_cont = Array2::<f64>::zeros((0, 0));
        for config in [TreeConfig::decision_tree(), TreeConfig::ambiguity_tree()] {
            let tree = fit_tree(x_bin.view(), x_cont.view(), y.view(), &[], &config);
            let out = predict_tree(
                &tree,
                x_bin.view(),
                x_cont.view(),
                config.pred_choice,
                config.positive_class,
                true,
            );
            assert_eq!(out, y);
        }
    }
}
