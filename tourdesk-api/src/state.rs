use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tourdesk_booking::{BookingDesk, DeskSettings};
use tourdesk_core::{BearerToken, BookingApi};

/// One booking desk per bearer token.
#[derive(Default)]
pub struct SessionRegistry {
    desks: RwLock<HashMap<String, Arc<BookingDesk>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn desk_for(
        &self,
        token: &str,
        api: &Arc<dyn BookingApi>,
        settings: &DeskSettings,
    ) -> Arc<BookingDesk> {
        if let Some(desk) = self.desks.read().await.get(token) {
            return desk.clone();
        }

        let mut desks = self.desks.write().await;
        desks
            .entry(token.to_string())
            .or_insert_with(|| {
                tracing::debug!("Opening booking desk for new session");
                Arc::new(BookingDesk::new(
                    api.clone(),
                    BearerToken::new(token),
                    settings.clone(),
                ))
            })
            .clone()
    }

    /// Forget the desk for `token`. In-flight requests on it still finish.
    pub async fn remove(&self, token: &str) -> bool {
        let removed = self.desks.write().await.remove(token).is_some();
        if removed {
            tracing::debug!("Closed booking desk after the backend rejected its token");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.desks.read().await.len()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn BookingApi>,
    pub settings: DeskSettings,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(api: Arc<dyn BookingApi>, settings: DeskSettings) -> Self {
        Self {
            api,
            settings,
            sessions: Arc::new(SessionRegistry::new()),
        }
    }
}
