//! Concrete backends behind the [`crate::services`] ports.

pub mod memory;
pub mod supabase;

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::BackendConfig;
use crate::services::{AuthApi, GradebookStore};

/// The storage and auth pair a process runs against.
#[derive(Clone)]
pub struct Backends {
    pub store: Arc<dyn GradebookStore>,
    pub auth: Arc<dyn AuthApi>,
}

impl Backends {
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(memory::MemoryStore::new()),
            auth: Arc::new(memory::MemoryAuth::new()),
        }
    }
}

/// Builds REST clients for a configured backend, or in-memory stand-ins.
pub fn connect(backend: Option<&BackendConfig>) -> Result<Backends> {
    match backend {
        Some(config) => {
            info!(url = %config.url, timeout_secs = config.timeout.as_secs(), "Using hosted backend");
            Ok(Backends {
                store: Arc::new(supabase::RestStore::connect(config)?),
                auth: Arc::new(supabase::RestAuth::connect(config)?),
            })
        }
        None => {
            warn!("SUPABASE_URL not set, using in-memory backends; data is lost on exit");
            Ok(Backends::in_memory())
        }
    }
}
