use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use loanpro_mcp_runtime::McpServer;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Which network transport the router serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpTransport {
    Http,
    Sse,
}

impl HttpTransport {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Sse => "sse",
        }
    }
}

pub type SessionSender = mpsc::UnboundedSender<Value>;

/// Open SSE streams keyed by session id.
#[derive(Clone, Default)]
pub struct Sessions {
    inner: Arc<Mutex<HashMap<Uuid, SessionSender>>>,
}

impl Sessions {
    pub fn open(&self) -> (Uuid, mpsc::UnboundedReceiver<Value>) {
        let id = Uuid::now_v7();
        let (sender, receiver) = mpsc::unbounded_channel();
        self.lock().insert(id, sender);
        (id, receiver)
    }

    pub fn sender(&self, id: &Uuid) -> Option<SessionSender> {
        self.lock().get(id).cloned()
    }

    pub fn close(&self, id: &Uuid) -> bool {
        self.lock().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, SessionSender>> {
        // The map stays consistent even if a holder panicked.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub server: McpServer,
    pub transport: HttpTransport,
    pub sessions: Sessions,
}

impl AppState {
    pub fn new(server: McpServer, transport: HttpTransport) -> Self {
        Self {
            server,
            transport,
            sessions: Sessions::default(),
        }
    }
}
