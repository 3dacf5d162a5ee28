use std::{path::PathBuf, sync::Arc};

use server_api::{ApiContext, Collections};
use storage::DocumentStore;

use crate::config::Settings;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) static_dir: PathBuf,
}

impl AppState {
    pub(crate) fn new(settings: &Settings, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            api: ApiContext {
                store,
                collections: Collections {
                    submissions: settings.collection_name.clone(),
                    todos: settings.todo_collection_name.clone(),
                },
                feed_path: settings.feed_path.clone(),
            },
            static_dir: settings.static_dir.clone(),
        }
    }
}
