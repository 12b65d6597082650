use crate::config::Config;
use crate::omr::OmrEngine;
use crate::store::ExamStore;
use axum::extract::FromRef;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: ExamStore,
    pub omr: Arc<dyn OmrEngine>,
    pub config: Config,
}

impl FromRef<AppState> for ExamStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Arc<dyn OmrEngine> {
    fn from_ref(state: &AppState) -> Self {
        state.omr.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
