//! Random-forest classifier: artifact representation and fitting.

pub mod model;
pub mod train;

pub use model::{DecisionTree, Node, RandomForest, MODEL_VERSION};
pub use train::{train_forest, TrainDataset, TrainOptions};
