use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::client::PushClient;
use crate::errors::PushError;

/// Named push clients, owned by the application's composition root
///
/// There is no implicit default: callers always name the backend they want.
#[derive(Default, Clone)]
pub struct ClientRegistry {
    clients: HashMap<String, Arc<dyn PushClient>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client, returning the one previously registered under `name`
    pub fn register(
        &mut self,
        name: impl Into<String>,
        client: Arc<dyn PushClient>,
    ) -> Option<Arc<dyn PushClient>> {
        let name = name.into();
        info!(client = %name, "Registered push client");
        self.clients.insert(name, client)
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn PushClient>, PushError> {
        self.clients
            .get(name)
            .cloned()
            .ok_or_else(|| PushError::UnknownClient(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clients.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.clients.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn PushClient>> {
        self.clients.remove(name)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PushMessage, PushResult, PushTarget};

    struct NamedClient(&'static str);

    #[async_trait::async_trait]
    impl PushClient for NamedClient {
        async fn send(&self, _message: &PushMessage, _target: &PushTarget) -> PushResult {
            PushResult::ok(Some(self.0.to_string()), None)
        }
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let mut registry = ClientRegistry::new();
        assert!(registry.is_empty());

        registry.register("fcm", Arc::new(NamedClient("fcm")));
        registry.register("fcm-staging", Arc::new(NamedClient("staging")));

        let client = registry.get("fcm-staging").unwrap();
        let result = client
            .send(&PushMessage::new("t", "b"), &PushTarget::token("abc"))
            .await;

        assert_eq!(result.id.as_deref(), Some("staging"));
        assert_eq!(registry.names(), vec!["fcm", "fcm-staging"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unknown_client() {
        let registry = ClientRegistry::new();

        match registry.get("missing") {
            Err(PushError::UnknownClient(name)) => assert_eq!(name, "missing"),
            _ => panic!("expected UnknownClient"),
        }
    }

    #[test]
    fn test_register_replaces_and_remove() {
        let mut registry = ClientRegistry::new();

        assert!(registry.register("fcm", Arc::new(NamedClient("a"))).is_none());
        assert!(registry.register("fcm", Arc::new(NamedClient("b"))).is_some());
        assert_eq!(registry.len(), 1);

        assert!(registry.remove("fcm").is_some());
        assert!(!registry.contains("fcm"));
        assert!(registry.remove("fcm").is_none());
    }
}
