#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2, Array1, Array2};

    use crate::tree::builder::unique_counts;
    use crate::tree::cache::{ContinuousSplitCache, NominalSplitCache};
    use crate::tree::criterion::Criterion;
    use crate::tree::missing::MissingValues;
    use crate::tree::model::SplitOp;
    use crate::tree::split::{evaluate_splits, SplitEval};

    struct KernelRun {
        impurities: Array2<f64>,
        nominal: Vec<Option<Box<NominalSplitCache>>>,
        continuous: Vec<Option<Box<ContinuousSplitCache>>>,
    }

    /// Runs the kernel over one node covering every sample, labels sorted.
    fn run_kernel(
        x_bin: Array2<u8>,
        x_cont: Array2<f64>,
        y_sorted: &[i64],
        missing: &[(usize, usize)],
        criterion: Criterion,
        sep_nan: bool,
        arities: Option<Vec<u32>>,
    ) -> KernelRun {
        let n = y_sorted.len();
        let (counts, _, y_ids) = unique_counts(y_sorted);
        let identity: Vec<u32> = (0..n as u32).collect();
        let missing = MissingValues::normalize(missing, &identity);
        let arities = arities.unwrap_or_else(|| vec![2; x_bin.ncols()]);
        let impurity = criterion.of_counts(counts.view());

        let mut nominal: Vec<Option<Box<NominalSplitCache>>> =
            (0..x_bin.ncols()).map(|_| None).collect();
        let mut continuous: Vec<Option<Box<ContinuousSplitCache>>> =
            (0..x_cont.ncols()).map(|_| None).collect();
        let eval = SplitEval {
            x_bin: &x_bin,
            x_cont: &x_cont,
            y_ids: &y_ids,
            node_rows: &identity,
            counts: &counts,
            impurity,
            arities: &arities,
            missing: &missing,
            n_classes: counts.len(),
            criterion,
            sep_nan,
        };
        let impurities = evaluate_splits(&eval, &mut nominal, &mut continuous);
        KernelRun {
            impurities,
            nominal,
            continuous,
        }
    }

    #[test]
    fn test_threshold_sweep_finds_class_boundary() {
        // One continuous feature 0..9; the label flips at index i. The best
        // threshold must land strictly between the adjacent values.
        let n = 10usize;
        let column: Vec<f64> = (0..n).map(|v| v as f64).collect();
        let x_cont = Array2::from_shape_vec((n, 1), column).unwrap();

        for i in 0..=n {
            let y: Vec<i64> = (0..n).map(|r| i64::from(r >= i)).collect();
            let run = run_kernel(
                Array2::zeros((0, 0)),
                x_cont.clone(),
                &y,
                &[],
                Criterion::Gini,
                true,
                None,
            );
            let cache = run.continuous[0].as_ref().unwrap();
            if i == 0 || i == n {
                // Pure node: placeholder threshold.
                assert_eq!(cache.threshold, f64::INFINITY);
                assert_eq!(cache.left_counts, arr1(&[n as u32]));
                assert_eq!(cache.right_counts.sum(), 0);
            } else {
                assert!(cache.threshold > (i - 1) as f64 && cache.threshold < i as f64);
                assert_eq!(cache.op, SplitOp::Ge);
                assert_eq!(cache.left_counts, arr1(&[i as u32, 0]));
                assert_eq!(cache.right_counts, arr1(&[0, (n - i) as u32]));
                assert_relative_eq!(run.impurities[[0, 0]], 0.0);
            }
        }
    }

    #[test]
    fn test_binary_split_with_missing_value() {
        // Row 1 is missing in the only column; it must not enter the value
        // tables but its class still reaches the left child through the node
        // totals.
        let x_bin = arr2(&[[0u8], [1], [1], [0]]);
        let y = [0i64, 0, 1, 1];
        let run = run_kernel(
            x_bin,
            Array2::zeros((0, 0)),
            &y,
            &[(1, 0)],
            Criterion::Gini,
            false,
            None,
        );
        let cache = run.nominal[0].as_ref().unwrap();
        assert_eq!(cache.best_v, 1);
        assert_eq!(cache.v_counts, arr1(&[2, 1]));
        assert_eq!(cache.yv_counts, arr2(&[[1, 1], [0, 1]]));
        // left = [1,1] at gini 0.5, right = [0,1] pure, weighted by 2 and 1.
        assert_relative_eq!(run.impurities[[0, 0]], (2.0 * 0.5) / 3.0);
        assert_relative_eq!(run.impurities[[0, 1]], 0.5);
        assert_relative_eq!(run.impurities[[0, 2]], 0.0);
    }

    #[test]
    fn test_nan_block_isolated_when_separable() {
        // Seven numeric rows of class 0, three NaN rows of class 1: the
        // isNaN operator yields pure children and must win.
        let mut column = vec![0.5, 1.5, 2.5, 3.5, 4.5, 5.5, 6.5];
        column.extend([f64::NAN; 3]);
        let x_cont = Array2::from_shape_vec((10, 1), column).unwrap();
        let y = [0i64, 0, 0, 0, 0, 0, 0, 1, 1, 1];
        let run = run_kernel(
            Array2::zeros((0, 0)),
            x_cont,
            &y,
            &[],
            Criterion::Gini,
            true,
            None,
        );
        let cache = run.continuous[0].as_ref().unwrap();
        assert_eq!(cache.op, SplitOp::IsNan);
        assert_eq!(cache.left_counts, arr1(&[7, 0]));
        assert_eq!(cache.right_counts, arr1(&[0, 3]));
        assert_relative_eq!(run.impurities[[0, 0]], 0.0);
    }

    #[test]
    fn test_constant_features_report_node_impurity() {
        // A constant column in either matrix fills all three impurity slots
        // with the node's own impurity, so its decrease is exactly zero.
        let x_bin = arr2(&[[1u8], [1], [1], [1]]);
        let x_cont = arr2(&[[5.0], [5.0], [5.0], [5.0]]);
        let y = [0i64, 0, 1, 1];
        let run = run_kernel(x_bin, x_cont, &y, &[], Criterion::Gini, false, None);
        let node_impurity = 0.5;
        for f in 0..2 {
            for slot in 0..3 {
                assert_relative_eq!(run.impurities[[f, slot]], node_impurity);
            }
        }
        assert!(run.continuous[0].as_ref().unwrap().is_const);
        assert_eq!(run.continuous[0].as_ref().unwrap().threshold, f64::INFINITY);
    }

    #[test]
    fn test_weighted_total_impurity() {
        // left = {2 of class 0, 1 of class 1}, right = {1 of each}:
        // total = (3 * 4/9 + 2 * 1/2) / 5.
        let x_bin = arr2(&[[0u8], [0], [1], [1], [0]]);
        let y = [0i64, 0, 0, 1, 1];
        let run = run_kernel(
            x_bin,
            Array2::zeros((0, 0)),
            &y,
            &[],
            Criterion::Gini,
            false,
            None,
        );
        assert_relative_eq!(
            run.impurities[[0, 0]],
            (3.0 * (4.0 / 9.0) + 2.0 * 0.5) / 5.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_nominal_one_vs_rest_search() {
        let x_bin = arr2(&[[0u8], [0], [1], [1], [2], [2]]);
        let y = [0i64, 0, 1, 1, 1, 1];
        let run = run_kernel(
            x_bin,
            Array2::zeros((0, 0)),
            &y,
            &[],
            Criterion::Gini,
            false,
            Some(vec![3]),
        );
        // Isolating value 0 separates the classes exactly.
        let cache = run.nominal[0].as_ref().unwrap();
        assert_eq!(cache.best_v, 0);
        assert_relative_eq!(run.impurities[[0, 0]], 0.0);
    }

    #[test]
    fn test_nominal_ties_keep_first_value() {
        // Perfectly symmetric values: every isolation scores the same, the
        // first evaluated value is kept.
        let x_bin = arr2(&[[0u8], [0], [1], [1], [2], [2]]);
        let y = [0i64, 0, 1, 1, 2, 2];
        let run = run_kernel(
            x_bin,
            Array2::zeros((0, 0)),
            &y,
            &[],
            Criterion::Gini,
            false,
            Some(vec![3]),
        );
        assert_eq!(run.nominal[0].as_ref().unwrap().best_v, 0);
    }

    #[test]
    fn test_missing_rows_excluded_from_threshold_search() {
        // Row 3 is missing: the search sees classes [0, 0, 1] over values
        // [0, 1, 2] and lands between 1 and 2; the missing label is folded
        // into the retained left column afterwards.
        let x_cont = arr2(&[[0.0], [1.0], [2.0], [3.0]]);
        let y = [0i64, 0, 1, 1];
        let run = run_kernel(
            Array2::zeros((0, 0)),
            x_cont,
            &y,
            &[(3, 0)],
            Criterion::Gini,
            true,
            None,
        );
        let cache = run.continuous[0].as_ref().unwrap();
        assert_relative_eq!(cache.threshold, 1.5);
        assert_eq!(cache.left_counts, arr1(&[2, 1]));
        assert_eq!(cache.right_counts, arr1(&[0, 1]));
        assert_relative_eq!(run.impurities[[0, 0]], 0.0);
    }

    #[test]
    fn test_nan_routed_left_without_separation() {
        // With NaN separation off the NaN rows take no part in the search
        // but still land in the left column for count conservation.
        let x_cont = arr2(&[[0.0], [1.0], [f64::NAN], [2.0], [3.0], [f64::NAN]]);
        let y = [0i64, 0, 0, 1, 1, 1];
        let run = run_kernel(
            Array2::zeros((0, 0)),
            x_cont,
            &y,
            &[],
            Criterion::Gini,
            false,
            None,
        );
        let cache = run.continuous[0].as_ref().unwrap();
        assert_eq!(cache.op, SplitOp::Ge);
        assert_relative_eq!(cache.threshold, 1.5);
        let total: Array1<u32> = &cache.left_counts + &cache.right_counts;
        assert_eq!(total, arr1(&[3, 3]));
    }

    #[test]
    fn test_zero_criterion_scores_everything_zero() {
        let x_bin = arr2(&[[0u8], [1], [0], [1]]);
        let y = [0i64, 0, 1, 1];
        let run = run_kernel(
            x_bin,
            Array2::zeros((0, 0)),
            &y,
            &[],
            Criterion::Zero,
            false,
            None,
        );
        for slot in 0..3 {
            assert_relative_eq!(run.impurities[[0, slot]], 0.0);
        }
    }
}
