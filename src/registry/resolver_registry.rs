//! # Resolver Registry
//!
//! Thread-safe map from resolver id to [`Resolver`] implementation.
//!
//! A registry instance is normally passed to the runtime explicitly
//! (see [`Runtime::with_resolvers`](crate::checks::Runtime::with_resolvers)).
//! A process-wide default exists for top-level use; runtimes without a private
//! registry fall back to it. Registration is last-write-wins and entries never
//! expire; [`ResolverRegistry::remove`] is the only way to drop one.

use crate::checks::Resolver;
use dashmap::DashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

static GLOBAL_REGISTRY: OnceLock<Arc<ResolverRegistry>> = OnceLock::new();

#[derive(Default)]
pub struct ResolverRegistry {
    resolvers: DashMap<String, Arc<dyn Resolver>>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide default registry
    pub fn global() -> Arc<ResolverRegistry> {
        GLOBAL_REGISTRY
            .get_or_init(|| Arc::new(ResolverRegistry::new()))
            .clone()
    }

    /// Store `resolver` under its own id, replacing and returning any previous entry
    pub fn register(&self, resolver: Arc<dyn Resolver>) -> Option<Arc<dyn Resolver>> {
        let id = resolver.id().to_string();
        let previous = self.resolvers.insert(id.clone(), resolver);
        debug!(
            resolver_id = %id,
            replaced = previous.is_some(),
            "Registered slow check resolver"
        );
        previous
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Resolver>> {
        self.resolvers.get(id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, id: &str) -> Option<Arc<dyn Resolver>> {
        self.resolvers.remove(id).map(|(_, resolver)| resolver)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.resolvers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.resolvers.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }
}

impl FromIterator<Arc<dyn Resolver>> for ResolverRegistry {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Resolver>>>(iter: I) -> Self {
        let registry = ResolverRegistry::new();
        for resolver in iter {
            registry.register(resolver);
        }
        registry
    }
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("resolvers", &self.ids())
            .finish()
    }
}

/// Add a resolver to the global registry
pub fn register_resolver(resolver: Arc<dyn Resolver>) -> Option<Arc<dyn Resolver>> {
    ResolverRegistry::global().register(resolver)
}

/// Look up a resolver in the global registry
pub fn get_resolver(id: &str) -> Option<Arc<dyn Resolver>> {
    ResolverRegistry::global().get(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{CheckContext, ResolveError, ResolveInput, ResolvedValue};
    use async_trait::async_trait;

    struct StaticResolver {
        id: &'static str,
        value: i64,
    }

    #[async_trait]
    impl Resolver for StaticResolver {
        fn id(&self) -> &str {
            self.id
        }

        async fn resolve(
            &self,
            _ctx: &CheckContext,
            _input: &ResolveInput,
        ) -> Result<ResolvedValue, ResolveError> {
            Ok(ResolvedValue::Json(serde_json::json!(self.value)))
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ResolverRegistry::new();
        assert!(registry.get("static").is_none());
        assert!(registry.is_empty());

        let previous = registry.register(Arc::new(StaticResolver { id: "static", value: 1 }));
        assert!(previous.is_none());
        assert!(registry.contains("static"));
        assert_eq!(registry.get("static").map(|r| r.id().to_string()), Some("static".into()));
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let registry = ResolverRegistry::new();
        registry.register(Arc::new(StaticResolver { id: "static", value: 1 }));
        let previous = registry.register(Arc::new(StaticResolver { id: "static", value: 2 }));

        assert!(previous.is_some());
        assert_eq!(registry.len(), 1);

        let resolver = registry.get("static").unwrap();
        let value = resolver
            .resolve(&CheckContext::new(), &ResolveInput::Json(serde_json::Value::Null))
            .await
            .unwrap();
        assert_eq!(value, ResolvedValue::Json(serde_json::json!(2)));
    }

    #[test]
    fn test_remove_and_ids() {
        let registry: ResolverRegistry = vec![
            Arc::new(StaticResolver { id: "b", value: 1 }) as Arc<dyn Resolver>,
            Arc::new(StaticResolver { id: "a", value: 2 }),
        ]
        .into_iter()
        .collect();

        assert_eq!(registry.ids(), vec!["a".to_string(), "b".to_string()]);
        assert!(registry.remove("a").is_some());
        assert!(registry.remove("a").is_none());
        assert_eq!(registry.ids(), vec!["b".to_string()]);
    }

    #[test]
    fn test_global_registry_roundtrip() {
        const ID: &str = "registry-test-unique";
        assert!(get_resolver(ID).is_none());

        register_resolver(Arc::new(StaticResolver { id: ID, value: 0 }));
        assert!(get_resolver(ID).is_some());

        ResolverRegistry::global().remove(ID);
        assert!(get_resolver(ID).is_none());
    }

    #[test]
    fn test_concurrent_registration() {
        let registry = Arc::new(ResolverRegistry::new());
        let ids: Vec<&'static str> = vec!["r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7"];

        let handles: Vec<_> = ids
            .iter()
            .map(|&id| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for value in 0..50 {
                        registry.register(Arc::new(StaticResolver { id, value }));
                        assert!(registry.get(id).is_some());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), ids.len());
    }
}
