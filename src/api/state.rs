use std::sync::Arc;

use crate::artifacts::ModelBundle;

/// Shared application state for API handlers
///
/// The bundle is loaded once at startup and never mutated afterwards;
/// handlers share it through the cloned router state.
#[derive(Clone)]
pub struct AppState {
    /// Trained model and its encoder set
    pub bundle: Arc<ModelBundle>,
}

impl AppState {
    pub fn new(bundle: ModelBundle) -> Self {
        Self {
            bundle: Arc::new(bundle),
        }
    }
}
