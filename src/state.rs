use std::sync::Arc;

use crate::{comments::CommentService, config::Config};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub comments: Arc<CommentService>,
    pub config: Config,
}

impl FromRef<AppState> for Arc<CommentService> {
    fn from_ref(state: &AppState) -> Self {
        state.comments.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
