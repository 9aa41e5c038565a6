pub mod api;
pub mod artifacts;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod encoding;
pub mod error;
pub mod forest;
pub mod metrics;
pub mod schema;
pub mod server;
pub mod trainer;

pub use artifacts::ModelBundle;
pub use config::AppConfig;
pub use encoding::{EncoderSet, LabelEncoder};
pub use error::{PredictError, Result, TriageError};
pub use forest::RandomForest;
