use std::sync::Arc;

use crate::auth::{AuthProvider, TokenValidator};
use crate::polls::PollService;

#[derive(Clone)]
pub struct AppState {
    pub polls: PollService,
    /// `None` when Supabase is not configured.
    pub auth: Option<Arc<dyn AuthProvider>>,
    pub validator: Option<Arc<dyn TokenValidator>>,
    pub protected_prefixes: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(
        polls: PollService,
        auth: Option<Arc<dyn AuthProvider>>,
        validator: Option<Arc<dyn TokenValidator>>,
        protected_prefixes: Vec<String>,
    ) -> Self {
        Self {
            polls,
            auth,
            validator,
            protected_prefixes: Arc::new(protected_prefixes),
        }
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.protected_prefixes
            .iter()
            .any(|prefix| path == prefix || path.starts_with(&format!("{}/", prefix)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_matches_exact_path_and_children_only() {
        let state = AppState::new(
            PollService::disabled(),
            None,
            None,
            vec!["/polls".into(), "/polls/create".into()],
        );
        assert!(state.is_protected("/polls"));
        assert!(state.is_protected("/polls/create"));
        assert!(state.is_protected("/polls/abc/vote"));
        assert!(!state.is_protected("/pollster"));
        assert!(!state.is_protected("/auth/login"));
        assert!(!state.is_protected("/"));
    }
}
