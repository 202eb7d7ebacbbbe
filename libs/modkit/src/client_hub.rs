//! Type-keyed registry of cross-module clients.
//!
//! Providers register an implementation once during `init`; consumers fetch it
//! by interface type: `hub.get::<dyn accounts::AccountsApi>()`.
//! Re-registering overwrites the previous value; Arcs already handed out stay valid.

use parking_lot::RwLock;
use std::{any::Any, collections::HashMap, sync::Arc};

#[derive(Debug, thiserror::Error)]
pub enum ClientHubError {
    #[error("client not found: {type_name}")]
    NotFound { type_name: &'static str },

    #[error("type mismatch in hub for {type_name}")]
    TypeMismatch { type_name: &'static str },
}

type Boxed = Box<dyn Any + Send + Sync>;

/// Keyed by `type_name::<T>()`, which works for `T = dyn Trait`.
#[derive(Default)]
pub struct ClientHub {
    map: RwLock<HashMap<&'static str, Boxed>>,
}

impl ClientHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T>(&self, client: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = std::any::type_name::<T>();
        tracing::debug!(client = key, "client registered");
        self.map.write().insert(key, Box::new(client));
    }

    pub fn get<T>(&self) -> Result<Arc<T>, ClientHubError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_name = std::any::type_name::<T>();
        let r = self.map.read();
        let boxed = r
            .get(type_name)
            .ok_or(ClientHubError::NotFound { type_name })?;
        boxed
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or(ClientHubError::TypeMismatch { type_name })
    }

    pub fn remove<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let boxed = self.map.write().remove(std::any::type_name::<T>())?;
        boxed.downcast::<Arc<T>>().ok().map(|b| *b)
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}
