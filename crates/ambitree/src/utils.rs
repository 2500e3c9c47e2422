use ndarray::{ArrayView1, ArrayView2};

use crate::error::{Result, TreeError};

/// Number of sample rows described by a pair of feature matrices.
///
/// Either matrix may be empty; the other then carries the row count.
pub(crate) fn sample_rows(x_bin: &ArrayView2<u8>, x_cont: &ArrayView2<f64>) -> usize {
    x_bin.nrows().max(x_cont.nrows())
}

/// Validate the shapes of a fit input.
pub(crate) fn validate_fit_input(
    x_bin: &ArrayView2<u8>,
    x_cont: &ArrayView2<f64>,
    y: &ArrayView1<i64>,
) -> Result<()> {
    if x_bin.nrows() > 0 && x_cont.nrows() > 0 && x_bin.nrows() != x_cont.nrows() {
        return Err(TreeError::RowCountMismatch {
            bin: x_bin.nrows(),
            cont: x_cont.nrows(),
        });
    }
    let rows = sample_rows(x_bin, x_cont);
    if rows == 0 {
        return Err(TreeError::EmptyTrainingSet);
    }
    if y.len() != rows {
        return Err(TreeError::LabelsMismatch {
            rows,
            labels: y.len(),
        });
    }
    Ok(())
}

/// Validate declared value arities against the binary matrix contents.
pub(crate) fn validate_arities(x_bin: &ArrayView2<u8>, arities: &[u32]) -> Result<()> {
    let n_features = if x_bin.nrows() == 0 { 0 } else { x_bin.ncols() };
    if arities.len() != n_features {
        return Err(TreeError::ArityMismatch {
            features: n_features,
            arities: arities.len(),
        });
    }
    for (j, &arity) in arities.iter().enumerate() {
        if arity < 2 {
            return Err(TreeError::InvalidArity { feature: j, arity });
        }
        for i in 0..x_bin.nrows() {
            let value = x_bin[[i, j]];
            if u32::from(value) >= arity {
                return Err(TreeError::ValueOutOfArity {
                    feature: j,
                    value,
                    arity,
                });
            }
        }
    }
    Ok(())
}

/// Validate that missing-value pairs stay inside the dataset bounds.
pub(crate) fn validate_missing(
    missing: &[(usize, usize)],
    rows: usize,
    columns: usize,
) -> Result<()> {
    for &(row, column) in missing {
        if row >= rows || column >= columns {
            return Err(TreeError::MissingOutOfRange { row, column });
        }
    }
    Ok(())
}
