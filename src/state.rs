use std::sync::Arc;

use crate::config::Config;
use crate::store::ArticleStore;

/// Shared application state, constructed once at startup and cloned into
/// every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: ArticleStore,
    pub config: Arc<Config>,
}
