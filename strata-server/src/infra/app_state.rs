use std::{fmt, sync::Arc};

use strata_core::ImageCatalog;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<ImageCatalog>,
}

impl AppState {
    pub fn new(catalog: ImageCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
