//! Process-wide geometry backend discovery and selection.
//!
//! Backend crates register a [`BackendProvider`] (normally from a static
//! constructor, so linking the crate is enough). The first call that needs a
//! backend selects one provider and freezes the resulting
//! [`GeometryContext`] for the life of the process.

use crate::{
    config::GeometryConfig,
    context::GeometryContext,
    error::GeometryError,
    geometry::GeometryBackend,
    obs::sink::{self, MetricsEvent},
};
use std::sync::{Arc, LazyLock, OnceLock, PoisonError, RwLock};

///
/// BackendProvider
///
/// Named factory for one backend implementation.
///

#[derive(Clone, Copy, Debug)]
pub struct BackendProvider {
    pub name: &'static str,
    pub create: fn(&GeometryConfig) -> Arc<dyn GeometryBackend>,
}

static PROVIDERS: LazyLock<RwLock<Vec<BackendProvider>>> =
    LazyLock::new(|| RwLock::new(Vec::new()));

static CONFIG: LazyLock<RwLock<GeometryConfig>> =
    LazyLock::new(|| RwLock::new(GeometryConfig::default()));

static CONTEXT: OnceLock<Arc<GeometryContext>> = OnceLock::new();

/// Add a provider to the discovery list.
///
/// Returns `false` when a provider with the same name is already present.
/// Registration after selection is accepted but has no effect on the
/// selected context.
pub fn register_provider(provider: BackendProvider) -> bool {
    let mut providers = PROVIDERS.write().unwrap_or_else(PoisonError::into_inner);
    if providers.iter().any(|p| p.name == provider.name) {
        return false;
    }

    providers.push(provider);
    tracing::debug!(backend = provider.name, "geometry backend provider registered");

    true
}

/// Names of registered providers, in registration order.
#[must_use]
pub fn providers() -> Vec<&'static str> {
    PROVIDERS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .map(|p| p.name)
        .collect()
}

/// Set the configuration used at selection time.
///
/// The write lock is held across the initialized check and the store;
/// selection holds the read lock until the context is set, so a
/// configuration is either seen by selection or rejected.
pub fn configure(config: GeometryConfig) -> Result<(), GeometryError> {
    config.validate()?;

    let mut current = CONFIG.write().unwrap_or_else(PoisonError::into_inner);
    if is_initialized() {
        return Err(GeometryError::AlreadyInitialized);
    }
    *current = config;

    Ok(())
}

/// Install a context directly, bypassing discovery.
pub fn install(context: Arc<GeometryContext>) -> Result<(), GeometryError> {
    let backend = context.backend_id();
    CONTEXT
        .set(context)
        .map_err(|_| GeometryError::AlreadyInitialized)?;

    sink::record(MetricsEvent::BackendSelected { backend });
    tracing::info!(%backend, "geometry context installed");

    Ok(())
}

/// True once a context has been selected or installed. Never selects.
#[must_use]
pub fn is_initialized() -> bool {
    CONTEXT.get().is_some()
}

/// The process-wide context, selecting a backend on first use.
///
/// With no registered provider this fails with `BackendUnavailable` and
/// leaves the slot empty, so a later registration can still succeed.
pub fn context() -> Result<&'static Arc<GeometryContext>, GeometryError> {
    if let Some(ctx) = CONTEXT.get() {
        return Ok(ctx);
    }

    // held until the context is set; see `configure`
    let config = CONFIG.read().unwrap_or_else(PoisonError::into_inner);
    let provider = {
        let providers = PROVIDERS.read().unwrap_or_else(PoisonError::into_inner);
        select_provider(&providers, &config)?
    };

    let mut selected = false;
    let ctx = CONTEXT.get_or_init(|| {
        selected = true;
        GeometryContext::with_config((provider.create)(&config), &config)
    });
    drop(config);

    if selected {
        let backend = ctx.backend_id();
        sink::record(MetricsEvent::BackendSelected { backend });
        tracing::info!(provider = provider.name, %backend, "geometry backend selected");
    }

    Ok(ctx)
}

/// Pick the provider named by `config`, or the first registered one.
pub fn select_provider(
    providers: &[BackendProvider],
    config: &GeometryConfig,
) -> Result<BackendProvider, GeometryError> {
    if let Some(name) = config.backend.as_deref() {
        return providers
            .iter()
            .find(|p| p.name == name)
            .copied()
            .ok_or_else(|| {
                GeometryError::unavailable(format!(
                    "backend '{name}' is not registered (registered: {})",
                    names(providers)
                ))
            });
    }

    let first = providers
        .first()
        .copied()
        .ok_or_else(|| GeometryError::unavailable("no geometry backend registered"))?;

    if providers.len() > 1 {
        tracing::warn!(
            selected = first.name,
            candidates = %names(providers),
            "several geometry backends registered; selecting the first"
        );
    }

    Ok(first)
}

fn names(providers: &[BackendProvider]) -> String {
    if providers.is_empty() {
        return "none".to_string();
    }

    providers
        .iter()
        .map(|p| p.name)
        .collect::<Vec<_>>()
        .join(", ")
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorClass,
        test_support::{MOCK_A, MOCK_B, mock_backend},
        value::GeometryValue,
    };

    fn create_a(_: &GeometryConfig) -> Arc<dyn GeometryBackend> {
        mock_backend(MOCK_A)
    }

    fn create_b(_: &GeometryConfig) -> Arc<dyn GeometryBackend> {
        mock_backend(MOCK_B)
    }

    const A: BackendProvider = BackendProvider {
        name: "mock-a",
        create: create_a,
    };
    const B: BackendProvider = BackendProvider {
        name: "mock-b",
        create: create_b,
    };

    #[test]
    fn first_registered_wins_without_a_name() {
        let chosen = select_provider(&[A, B], &GeometryConfig::default()).unwrap();
        assert_eq!(chosen.name, "mock-a");
    }

    #[test]
    fn configured_name_selects_that_provider() {
        let config = GeometryConfig::default().with_backend("mock-b");
        let chosen = select_provider(&[A, B], &config).unwrap();
        assert_eq!(chosen.name, "mock-b");
        assert_eq!((chosen.create)(&config).id(), MOCK_B);
    }

    #[test]
    fn unknown_configured_name_is_unavailable() {
        let config = GeometryConfig::default().with_backend("gone");
        let err = select_provider(&[A], &config).unwrap_err();

        assert_eq!(err.class(), ErrorClass::Unavailable);
        assert!(err.to_string().contains("'gone'"));
        assert!(err.to_string().contains("mock-a"));
    }

    #[test]
    fn empty_provider_list_is_unavailable() {
        let err = select_provider(&[], &GeometryConfig::default()).unwrap_err();
        assert!(matches!(err, GeometryError::BackendUnavailable { .. }));
    }

    // The core test binary never registers a provider, so the process-wide
    // registry stays unselected for every test below.

    #[test]
    fn global_constructors_fail_without_a_backend() {
        assert!(matches!(
            GeometryValue::from_text("POINT(1 2)"),
            Err(GeometryError::BackendUnavailable { .. })
        ));
        assert!(matches!(
            GeometryValue::from_text_with_srid("POINT(1 2)", 4326),
            Err(GeometryError::BackendUnavailable { .. })
        ));
        assert!(matches!(
            GeometryValue::from_bytes(&[0, 0, 0, 0, 1]),
            Err(GeometryError::BackendUnavailable { .. })
        ));
    }

    #[test]
    fn failed_selection_leaves_registry_uninitialized() {
        assert!(context().is_err());
        assert!(context().is_err());
        assert!(!is_initialized());
        assert!(providers().is_empty());
    }

    #[test]
    fn configure_validates_before_storing() {
        let bad = GeometryConfig {
            text_precision: 99,
            ..GeometryConfig::default()
        };
        let err = configure(bad).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Config);
    }
}
