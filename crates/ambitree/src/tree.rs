/*!
Decision and ambiguity tree induction.

The induction engine grows a tree from mixed binary, small-nominal and
continuous features by repeatedly scoring every candidate split of a node,
partitioning the node's slice of a shared sample-index slab in place, and
pushing the resulting children onto a frontier stack. With
[`SplitChoice::AllMax`] every split tied for the best
impurity decrease is expanded, and with node caching enabled identical
children are shared, so the result is a directed acyclic graph whose leaves
are disambiguated at prediction time by a voting policy.

# Modules

- [`classifier`]: configuration and the fit/predict entry points
- [`criterion`]: Gini and zero impurity kernels
- [`model`]: the frozen tree, its flat encoding and display
- [`predict`]: the prediction walk and voting policies
- [`conditions`]: extraction of conjunctive rules per target class
*/

pub mod classifier;
pub mod conditions;
pub mod criterion;
pub mod model;
pub mod predict;

pub(crate) mod builder;
pub(crate) mod cache;
pub(crate) mod missing;
pub(crate) mod partition;
pub(crate) mod split;

pub use builder::SplitChoice;
pub use classifier::{TreeClassifier, TreeConfig};
pub use conditions::{Condition, Conjunction, Polarity};
pub use criterion::Criterion;
pub use model::{Node, SplitOp, SplitRecord, Tree, NO_CHILD};
pub use predict::PredChoice;

#[cfg(test)]
mod split_test;



#[cfg(test)]
mod predict_test;
