use std::{sync::Arc, time::Duration};

use crate::{assets::AssetStore, storage::MessageStore};

/// How long a client may take to deliver a whole request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AppState {
    pub store: Arc<dyn MessageStore>,
    pub assets: AssetStore,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(store: Arc<dyn MessageStore>, assets: AssetStore) -> Self {
        Self {
            store,
            assets,
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}
