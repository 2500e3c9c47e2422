/*!
This crate provides a decision/ambiguity tree induction engine for multiclass
classification over mixed binary, small-nominal and continuous features.

The engine is implemented with a focus on:
- A single in-place partitioned sample-index slab instead of per-node copies
- Deterministic output: refitting the same data yields a byte-identical tree
- Explicit missing-value routing and NaN-separable continuous splits
- Memory-efficient per-node split caches with growth on demand

# Ambiguity trees

A classical decision tree commits greedily to the single best split of each
node. An ambiguity tree instead expands *every* split tied for the maximum
impurity decrease, and optionally shares identical children across parents,
producing a directed acyclic graph. At prediction time a sample may reach
several leaves; a pluggable voting policy resolves the leaf set into a class.

# Usage Example

```rust
use ambitree::{TreeClassifier, TreeConfig};
use ndarray::{arr1, arr2, Array2};

let x_bin = arr2(&[[0u8, 0], [0, 1], [1, 0], [1, 1]]);
let x_cont = Array2::<f64>::zeros((0, 0));
let y = arr1(&[1i64, 1, 1, 2]);

let mut clf = TreeClassifier::new(TreeConfig::ambiguity_tree());
clf.fit(x_bin.view(), x_cont.view(), y.view(), &[]).unwrap();
let predictions = clf.predict(x_bin.view(), x_cont.view()).unwrap();
assert_eq!(predictions, arr1(&[1i64, 1, 1, 2]));
```

# Features
- `parallel`: evaluate feature columns with rayon during split search
- `serde-support`: enable serialization of configs and fitted trees
*/

pub mod error;
pub mod tree;

mod utils;

pub use error::{Result, TreeError};
pub use tree::classifier::{TreeClassifier, TreeConfig};
pub use tree::conditions::{Condition, Conjunction, Polarity};
pub use tree::criterion::Criterion;
pub use tree::model::{Node, SplitOp, SplitRecord, Tree};
pub use tree::predict::PredChoice;
pub use tree::SplitChoice;
