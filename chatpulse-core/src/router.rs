//! Backing store selection per tenant
//!
//! Demo tenants are served from the fixture dataset unless a demo live
//! store is configured; real tenants go to the production live store, then
//! the demo live store, then fixtures. Every backend is built once, when the
//! router is built, so resolving a tenant is a pure decision.

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::{Config, StoreScope, TenantsConfig};
use crate::operations::AnalyticsOperations;
use crate::store::{AnalyticsBackend, FixtureSource, FixtureStore, LiveStore};

/// Decides whether a tenant is a demo tenant.
///
/// Must be cheap and pure: the router calls it on every resolution.
pub trait TenantClassifier: Send + Sync {
    fn is_demo_tenant(&self, tenant_id: &str) -> bool;
}

impl<F> TenantClassifier for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_demo_tenant(&self, tenant_id: &str) -> bool {
        self(tenant_id)
    }
}

/// Demo tenants listed in configuration, or matching a prefix
#[derive(Debug, Clone, Default)]
pub struct DemoTenants {
    ids: HashSet<String>,
    prefix: Option<String>,
}

impl DemoTenants {
    pub fn new(ids: impl IntoIterator<Item = String>, prefix: Option<String>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            prefix: prefix.filter(|p| !p.is_empty()),
        }
    }
}

impl From<&TenantsConfig> for DemoTenants {
    fn from(config: &TenantsConfig) -> Self {
        Self::new(config.demo_tenants.iter().cloned(), config.demo_prefix.clone())
    }
}

impl TenantClassifier for DemoTenants {
    fn is_demo_tenant(&self, tenant_id: &str) -> bool {
        self.ids.contains(tenant_id)
            || self
                .prefix
                .as_deref()
                .is_some_and(|prefix| tenant_id.starts_with(prefix))
    }
}

/// Which backing store serves a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendChoice {
    /// The fixture dataset
    Fixtures,
    /// A live store
    Live(StoreScope),
}

impl std::fmt::Display for BackendChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendChoice::Fixtures => write!(f, "fixtures"),
            BackendChoice::Live(scope) => write!(f, "live:{}", scope),
        }
    }
}

/// Resolves tenants and assistants to an [`AnalyticsOperations`] facade
pub struct Router {
    classifier: Arc<dyn TenantClassifier>,
    fixtures: Arc<FixtureStore>,
    demo: Arc<LiveStore>,
    production: Arc<LiveStore>,
}

impl Router {
    /// Build the router and all backends from configuration
    pub fn new(config: &Config) -> Self {
        Self::with_backends(
            Arc::new(DemoTenants::from(&config.tenants)),
            FixtureStore::new(FixtureSource::from_config(&config.fixtures)),
            LiveStore::from_config(config.live.scope(StoreScope::Demo)),
            LiveStore::from_config(config.live.scope(StoreScope::Production)),
        )
    }

    /// Build the router over explicit backends
    pub fn with_backends(
        classifier: Arc<dyn TenantClassifier>,
        fixtures: FixtureStore,
        demo: LiveStore,
        production: LiveStore,
    ) -> Self {
        Self {
            classifier,
            fixtures: Arc::new(fixtures),
            demo: Arc::new(demo),
            production: Arc::new(production),
        }
    }

    /// Decide which store serves `tenant_id`
    pub fn choose(&self, tenant_id: &str) -> BackendChoice {
        if self.classifier.is_demo_tenant(tenant_id) {
            if self.demo.is_configured() {
                BackendChoice::Live(StoreScope::Demo)
            } else {
                BackendChoice::Fixtures
            }
        } else {
            self.choose_real()
        }
    }

    /// Decision for a tenant known not to be a demo tenant
    fn choose_real(&self) -> BackendChoice {
        if self.production.is_configured() {
            BackendChoice::Live(StoreScope::Production)
        } else if self.demo.is_configured() {
            BackendChoice::Live(StoreScope::Demo)
        } else {
            BackendChoice::Fixtures
        }
    }

    /// Facade over a chosen store
    pub fn operations(&self, choice: BackendChoice) -> AnalyticsOperations {
        let backend: Arc<dyn AnalyticsBackend> = match choice {
            BackendChoice::Fixtures => self.fixtures.clone(),
            BackendChoice::Live(StoreScope::Demo) => self.demo.clone(),
            BackendChoice::Live(StoreScope::Production) => self.production.clone(),
        };
        AnalyticsOperations::new(backend)
    }

    /// Facade for every call scoped to `tenant_id`
    pub fn resolve(&self, tenant_id: &str) -> AnalyticsOperations {
        let choice = self.choose(tenant_id);
        tracing::debug!(tenant_id, backend = %choice, "resolved tenant");
        self.operations(choice)
    }

    /// Decide which store serves `assistant_id` when its tenant is unknown.
    ///
    /// If the fixture dataset holds a session of the assistant under a demo
    /// tenant, fixtures serve it; otherwise it is treated as a real tenant's
    /// assistant. A fixture dataset that fails to load counts as not holding
    /// the assistant.
    pub async fn choose_for_assistant(&self, assistant_id: &str) -> BackendChoice {
        let is_demo = match self.fixtures.sessions().await {
            Ok(sessions) => sessions.iter().any(|s| {
                s.assistant_id == assistant_id && self.classifier.is_demo_tenant(&s.tenant_id)
            }),
            Err(e) => {
                tracing::warn!(assistant_id, error = %e, "could not load fixture sessions");
                false
            }
        };
        if is_demo {
            BackendChoice::Fixtures
        } else {
            self.choose_real()
        }
    }

    /// Facade for every call scoped to `assistant_id`
    pub async fn resolve_for_assistant(&self, assistant_id: &str) -> AnalyticsOperations {
        let choice = self.choose_for_assistant(assistant_id).await;
        tracing::debug!(assistant_id, backend = %choice, "resolved assistant");
        self.operations(choice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LiveStoreConfig;

    fn live(scope: StoreScope, configured: bool) -> LiveStore {
        if configured {
            LiveStore::from_config(&LiveStoreConfig::new(scope, "https://db.example.com", "key"))
        } else {
            LiveStore::from_config(&LiveStoreConfig::unconfigured(scope))
        }
    }

    fn router(demo: bool, production: bool) -> Router {
        Router::with_backends(
            Arc::new(DemoTenants::new(vec!["showroom".to_string()], Some("demo-".to_string()))),
            FixtureStore::embedded(),
            live(StoreScope::Demo, demo),
            live(StoreScope::Production, production),
        )
    }

    #[test]
    fn test_demo_tenants() {
        let tenants = DemoTenants::new(vec!["showroom".to_string()], Some("demo-".to_string()));
        assert!(tenants.is_demo_tenant("showroom"));
        assert!(tenants.is_demo_tenant("demo-client"));
        assert!(!tenants.is_demo_tenant("acme"));

        let no_prefix = DemoTenants::new(Vec::new(), Some(String::new()));
        assert!(!no_prefix.is_demo_tenant("acme"));
    }

    #[test]
    fn test_routing_policy() {
        use BackendChoice::*;
        use StoreScope::*;

        // (demo configured, production configured, demo tenant choice, real tenant choice)
        let cases = [
            (true, true, Live(Demo), Live(Production)),
            (true, false, Live(Demo), Live(Demo)),
            (false, true, Fixtures, Live(Production)),
            (false, false, Fixtures, Fixtures),
        ];
        for (demo, production, for_demo, for_real) in cases {
            let router = router(demo, production);
            assert_eq!(router.choose("demo-client"), for_demo, "demo={demo} production={production}");
            assert_eq!(router.choose("acme"), for_real, "demo={demo} production={production}");
        }
    }

    #[test]
    fn test_router_from_config_picks_stores_by_scope() {
        let mut config = Config::default();
        config.live.production =
            LiveStoreConfig::new(StoreScope::Production, "https://db.example.com", "key");

        let router = Router::new(&config);
        assert_eq!(router.choose("acme"), BackendChoice::Live(StoreScope::Production));
        assert_eq!(router.choose("demo-client"), BackendChoice::Fixtures);
        assert_eq!(router.resolve("acme").backend_name(), "live:production");
    }

    #[test]
    fn test_routing_is_deterministic() {
        let router = router(false, true);
        let first = router.choose("acme");
        for _ in 0..10 {
            assert_eq!(router.choose("acme"), first);
        }
        assert_eq!(router.resolve("acme").backend_name(), "live:production");
    }

    #[test]
    fn test_closure_classifier() {
        let router = Router::with_backends(
            Arc::new(|tenant: &str| tenant == "sandbox"),
            FixtureStore::embedded(),
            live(StoreScope::Demo, false),
            live(StoreScope::Production, true),
        );
        assert_eq!(router.choose("sandbox"), BackendChoice::Fixtures);
        assert_eq!(router.choose("demo-client"), BackendChoice::Live(StoreScope::Production));
    }

    #[tokio::test]
    async fn test_resolve_for_assistant() {
        let router = router(false, true);
        assert_eq!(
            router.choose_for_assistant("demo-mascot-1").await,
            BackendChoice::Fixtures
        );
        assert_eq!(
            router.choose_for_assistant("acme-bot").await,
            BackendChoice::Live(StoreScope::Production)
        );
        assert_eq!(
            router.resolve_for_assistant("demo-mascot-2").await.backend_name(),
            "fixtures"
        );
    }

    #[tokio::test]
    async fn test_resolve_for_assistant_ignores_demo_live_store() {
        // Fixture assistants stay on fixtures even when a demo live store exists
        let router = router(true, false);
        assert_eq!(
            router.choose_for_assistant("demo-mascot-1").await,
            BackendChoice::Fixtures
        );
        assert_eq!(
            router.choose_for_assistant("acme-bot").await,
            BackendChoice::Live(StoreScope::Demo)
        );
    }
}
