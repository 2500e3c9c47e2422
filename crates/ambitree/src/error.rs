use thiserror::Error;

/// A specialized Result type for tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors that can occur while fitting, predicting or extracting rules.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The training set contains no samples.
    #[error("Empty training dataset")]
    EmptyTrainingSet,

    /// Binary and continuous matrices disagree on their sample counts.
    #[error("Row count mismatch between binary ({bin}) and continuous ({cont}) matrices")]
    RowCountMismatch {
        /// Rows in the binary matrix
        bin: usize,
        /// Rows in the continuous matrix
        cont: usize,
    },

    /// The label vector does not cover every sample row.
    #[error("Labels length {labels} does not match sample count {rows}")]
    LabelsMismatch {
        /// Sample rows in the feature matrices
        rows: usize,
        /// Entries in the label vector
        labels: usize,
    },

    /// A prediction input has a different feature width than the fitted tree.
    #[error("Feature dimensions mismatch: expected {expected} columns, got {got}")]
    DimensionMismatch {
        /// Columns the fitted tree was trained on
        expected: usize,
        /// Columns in the offending input
        got: usize,
    },

    /// The declared value-arity list does not cover every binary column.
    #[error("Value arity list covers {arities} columns but the binary matrix has {features}")]
    ArityMismatch {
        /// Columns in the binary matrix
        features: usize,
        /// Entries in the arity list
        arities: usize,
    },

    /// A declared arity is too small to describe a feature.
    #[error("Feature {feature} declares arity {arity}; at least 2 is required")]
    InvalidArity {
        /// The offending feature column
        feature: usize,
        /// The declared arity
        arity: u32,
    },

    /// A nominal feature holds a value outside its declared arity.
    #[error("Value {value} in feature {feature} exceeds its declared arity {arity}")]
    ValueOutOfArity {
        /// The offending feature column
        feature: usize,
        /// The out-of-range value
        value: u8,
        /// The declared arity
        arity: u32,
    },

    /// A missing-value pair references a row or column outside the dataset.
    #[error("Missing-value pair ({row}, {column}) is outside the dataset")]
    MissingOutOfRange {
        /// The referenced sample row
        row: usize,
        /// The referenced global feature column
        column: usize,
    },

    /// The classifier has not been fitted yet.
    #[error("Classifier must be fit before this operation")]
    NotFitted,

    /// The requested class does not appear in the training set.
    #[error("Target class {0} not present in the training set")]
    TargetClassNotFound(i64),

    /// An unrecognized impurity criterion name.
    #[error("Unknown criterion: {0}")]
    UnknownCriterion(String),

    /// An unrecognized split-choice policy name.
    #[error("Unknown split choice: {0}")]
    UnknownSplitChoice(String),

    /// An unrecognized prediction-choice policy name.
    #[error("Unknown prediction choice: {0}")]
    UnknownPredChoice(String),
}
