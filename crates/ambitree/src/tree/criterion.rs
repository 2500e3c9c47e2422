use std::str::FromStr;

use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::error::TreeError;

/// Impurity criterion used to score candidate splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum Criterion {
    /// Gini impurity, `1 - Σ (c_k / Σc)²`.
    Gini,
    /// Always zero, which terminates every branch immediately.
    Zero,
}

impl Criterion {
    /// Impurity of a single class-count vector.
    pub fn of_counts(self, counts: ArrayView1<u32>) -> f64 {
        match self {
            Criterion::Gini => gini(counts),
            Criterion::Zero => 0.0,
        }
    }

    /// Row-wise impurity of a 2-D count table.
    pub fn of_rows(self, counts: ArrayView2<u32>) -> Array1<f64> {
        let mut out = Array1::zeros(counts.nrows());
        if self == Criterion::Zero {
            return out;
        }
        for (j, row) in counts.outer_iter().enumerate() {
            out[j] = gini(row);
        }
        out
    }
}

impl FromStr for Criterion {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gini" => Ok(Criterion::Gini),
            "zero" => Ok(Criterion::Zero),
            other => Err(TreeError::UnknownCriterion(other.to_string())),
        }
    }
}

fn gini(counts: ArrayView1<u32>) -> f64 {
    let total: u32 = counts.sum();
    if total == 0 {
        return 0.0;
    }
    let total = f64::from(total);
    let mut s = 0.0;
    for &c in counts.iter() {
        let prob = f64::from(c) / total;
        s += prob * (1.0 - prob);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2};

    #[test]
    fn test_gini_pure() {
        assert_relative_eq!(Criterion::Gini.of_counts(arr1(&[5, 0, 0]).view()), 0.0);
    }

    #[test]
    fn test_gini_uniform() {
        assert_relative_eq!(Criterion::Gini.of_counts(arr1(&[5, 5]).view()), 0.5);
    }

    #[test]
    fn test_gini_empty_counts() {
        assert_relative_eq!(Criterion::Gini.of_counts(arr1(&[0, 0]).view()), 0.0);
    }

    #[test]
    fn test_gini_rows() {
        let table = arr2(&[[3, 1], [0, 0], [2, 2]]);
        let out = Criterion::Gini.of_rows(table.view());
        assert_relative_eq!(out[0], 0.375);
        assert_relative_eq!(out[1], 0.0);
        assert_relative_eq!(out[2], 0.5);
    }

    #[test]
    fn test_zero_criterion() {
        let table = arr2(&[[3, 1], [2, 2]]);
        let out = Criterion::Zero.of_rows(table.view());
        assert!(out.iter().all(|&v| v == 0.0));
        assert_relative_eq!(Criterion::Zero.of_counts(arr1(&[9, 1]).view()), 0.0);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("gini".parse::<Criterion>().unwrap(), Criterion::Gini);
        assert_eq!("zero".parse::<Criterion>().unwrap(), Criterion::Zero);
        assert!(matches!(
            "entropy".parse::<Criterion>(),
            Err(TreeError::UnknownCriterion(_))
        ));
    }
}
