//! Session Registry
//!
//! Process-wide mapping from session ID to session state. The registry is an
//! explicit object injected through application state, never a global. Each
//! session sits behind its own mutex so that ingest and finish are serialized
//! per session while operations on distinct sessions never contend.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::types::{UploadError, UploadSession};

/// Registry of in-flight upload sessions.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<UploadSession>>>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a session expecting `ceil(total_records / BATCH_SIZE)` batches
    /// and return its fresh ID.
    pub async fn create(&self, total_records: u64) -> Uuid {
        let session = UploadSession::new(total_records);
        let id = session.id;

        let mut sessions = self.sessions.write().await;
        sessions.insert(id, Arc::new(Mutex::new(session)));

        id
    }

    /// Get a session handle by ID.
    pub async fn get(&self, id: &Uuid) -> Result<Arc<Mutex<UploadSession>>, UploadError> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned().ok_or(UploadError::SessionNotFound)
    }

    /// Get a session handle by string ID. An unparseable ID is reported the
    /// same way as an absent one.
    pub async fn get_by_str(&self, id: &str) -> Result<Arc<Mutex<UploadSession>>, UploadError> {
        let id = Uuid::parse_str(id).map_err(|_| UploadError::SessionNotFound)?;
        self.get(&id).await
    }

    /// Remove a session. Called exactly once, when a finish merge commits.
    pub async fn remove(&self, id: &Uuid) -> Option<Arc<Mutex<UploadSession>>> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id)
    }

    /// Number of open sessions.
    pub async fn len(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    /// Whether the registry holds no sessions.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
