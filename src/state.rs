use crate::storage::LocalStorage;
use crate::store::Store;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<Store<LocalStorage>>>,
}

impl AppState {
    pub fn new(store: Store<LocalStorage>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }
}
