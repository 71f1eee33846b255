//! Startup-built binding tables.
//!
//! Bindings map (capability, selector) pairs and job-type names to the
//! constructors that build them inside a scope. Both tables are populated by
//! the composition root before the scheduler starts, then wrapped in `Arc`
//! and read concurrently without locking; there is no runtime mutation.
//!
//! Duplicate binds overwrite: the last registration wins, and a warning is
//! emitted so a double registration shows up in the logs instead of being
//! silently ambiguous.

use std::collections::HashMap;

use tracing::warn;

use jobscope_types::{JobConfiguration, Marketplace};

use crate::activation::ScopedJob;
use crate::error::ScopeError;
use crate::scope::Scope;

/// Selector-keyed constructor table for one capability interface `C`.
///
/// `C` is the capability trait object (e.g. `dyn UnitCounter`); the stored
/// constructors receive the activation's scope so any resource they need is
/// created, and owned, there.
///
/// # Example
///
/// ```ignore
/// let mut counters: VariantBindings<dyn UnitCounter> = VariantBindings::new("unit-counter");
/// counters.bind(Marketplace::Jet, |scope| Ok(Box::new(JetFeed::create(scope)?)));
/// let counters = Arc::new(counters); // read-only from here on
/// ```
pub struct VariantBindings<C: ?Sized> {
    capability: &'static str,
    #[allow(clippy::type_complexity)]
    constructors: HashMap<
        Marketplace,
        Box<dyn Fn(&mut Scope) -> Result<Box<C>, ScopeError> + Send + Sync>,
    >,
}

impl<C: ?Sized> VariantBindings<C> {
    /// Create an empty table for the named capability.
    pub fn new(capability: &'static str) -> Self {
        Self {
            capability,
            constructors: HashMap::new(),
        }
    }

    /// Capability name used in diagnostics and `UnboundVariant` errors.
    pub fn capability(&self) -> &'static str {
        self.capability
    }

    /// Register the constructor for `selector`.
    ///
    /// Last bind wins: rebinding an already-bound selector replaces the
    /// previous constructor and logs a warning.
    pub fn bind<F>(&mut self, selector: Marketplace, constructor: F)
    where
        F: Fn(&mut Scope) -> Result<Box<C>, ScopeError> + Send + Sync + 'static,
    {
        if self
            .constructors
            .insert(selector, Box::new(constructor))
            .is_some()
        {
            warn!(
                capability = self.capability,
                selector = %selector,
                "Duplicate variant bind; last registration wins"
            );
        }
    }

    /// Whether a constructor is bound for `selector`.
    pub fn is_bound(&self, selector: Marketplace) -> bool {
        self.constructors.contains_key(&selector)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Build the variant bound for `selector` inside `scope`.
    ///
    /// # Errors
    ///
    /// `ScopeError::UnboundVariant` if no constructor is registered for the
    /// selector; otherwise whatever the constructor itself returns.
    pub fn build(&self, selector: Marketplace, scope: &mut Scope) -> Result<Box<C>, ScopeError> {
        let constructor =
            self.constructors
                .get(&selector)
                .ok_or(ScopeError::UnboundVariant {
                    capability: self.capability,
                    selector,
                })?;
        constructor(scope)
    }
}

/// Job-type-keyed constructor table.
///
/// Job constructors additionally receive the trigger's `JobConfiguration`,
/// so they can thread the selector into every capability `build` call.
#[derive(Default)]
pub struct JobBindings {
    #[allow(clippy::type_complexity)]
    constructors: HashMap<
        String,
        Box<
            dyn Fn(&mut Scope, &JobConfiguration) -> Result<Box<dyn ScopedJob>, ScopeError>
                + Send
                + Sync,
        >,
    >,
}

impl JobBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the constructor for a job type. Last bind wins, logged.
    pub fn bind<F>(&mut self, job_type: impl Into<String>, constructor: F)
    where
        F: Fn(&mut Scope, &JobConfiguration) -> Result<Box<dyn ScopedJob>, ScopeError>
            + Send
            + Sync
            + 'static,
    {
        let job_type = job_type.into();
        if self
            .constructors
            .insert(job_type.clone(), Box::new(constructor))
            .is_some()
        {
            warn!(job_type = %job_type, "Duplicate job bind; last registration wins");
        }
    }

    /// Whether a constructor is bound for `job_type`.
    pub fn is_bound(&self, job_type: &str) -> bool {
        self.constructors.contains_key(job_type)
    }

    /// Registered job-type names, for wiring diagnostics.
    pub fn job_types(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Construct `job_type` inside `scope` with the given configuration.
    ///
    /// # Errors
    ///
    /// `ScopeError::UnknownJobType` if the name is not bound; otherwise
    /// whatever the constructor returns.
    pub fn construct(
        &self,
        job_type: &str,
        scope: &mut Scope,
        configuration: &JobConfiguration,
    ) -> Result<Box<dyn ScopedJob>, ScopeError> {
        let constructor = self
            .constructors
            .get(job_type)
            .ok_or_else(|| ScopeError::UnknownJobType(job_type.to_string()))?;
        constructor(scope, configuration)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::error::HookError;
    use crate::resource::{ResourceId, ScopedResource};

    trait Tally: Send + Sync + std::fmt::Debug {
        fn value(&self) -> i64;
    }

    #[derive(Debug)]
    struct FixedTally(i64);

    impl Tally for FixedTally {
        fn value(&self) -> i64 {
            self.0
        }
    }

    struct MarkerResource {
        id: ResourceId,
    }

    impl MarkerResource {
        fn new() -> Self {
            Self {
                id: ResourceId::generate(),
            }
        }
    }

    impl ScopedResource for MarkerResource {
        fn id(&self) -> ResourceId {
            self.id
        }

        fn kind(&self) -> &str {
            "marker"
        }

        fn release(&self) -> Result<(), HookError> {
            Ok(())
        }
    }

    #[test]
    fn test_build_unbound_selector_fails() {
        let bindings: VariantBindings<dyn Tally> = VariantBindings::new("tally");
        let mut scope = Scope::open();

        let err = bindings.build(Marketplace::Jet, &mut scope).unwrap_err();
        assert!(matches!(
            err,
            ScopeError::UnboundVariant {
                capability: "tally",
                selector: Marketplace::Jet,
            }
        ));
        // Never a partially-valid instance: nothing landed in the scope.
        assert_eq!(scope.resource_count(), 0);
    }

    #[test]
    fn test_build_invokes_bound_constructor() {
        let mut bindings: VariantBindings<dyn Tally> = VariantBindings::new("tally");
        bindings.bind(Marketplace::Amazon, |scope| {
            scope.adopt(Arc::new(MarkerResource::new()));
            Ok(Box::new(FixedTally(2)))
        });

        let mut scope = Scope::open();
        let tally = bindings.build(Marketplace::Amazon, &mut scope).unwrap();
        assert_eq!(tally.value(), 2);
        // The constructor's resource was created inside the caller's scope.
        assert_eq!(scope.resource_count(), 1);
    }

    #[test]
    fn test_last_bind_wins() {
        let mut bindings: VariantBindings<dyn Tally> = VariantBindings::new("tally");
        bindings.bind(Marketplace::Jet, |_| Ok(Box::new(FixedTally(1))));
        bindings.bind(Marketplace::Jet, |_| Ok(Box::new(FixedTally(2))));

        assert_eq!(bindings.len(), 1);
        let mut scope = Scope::open();
        let tally = bindings.build(Marketplace::Jet, &mut scope).unwrap();
        assert_eq!(tally.value(), 2);
    }

    #[test]
    fn test_build_is_deterministic() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut bindings: VariantBindings<dyn Tally> = VariantBindings::new("tally");
        let counter = calls.clone();
        bindings.bind(Marketplace::Jet, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FixedTally(7)))
        });
        let bindings = Arc::new(bindings);

        let mut scope = Scope::open();
        for _ in 0..3 {
            let tally = bindings.build(Marketplace::Jet, &mut scope).unwrap();
            assert_eq!(tally.value(), 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_job_bindings_unknown_type_fails() {
        let bindings = JobBindings::new();
        let mut scope = Scope::open();
        let configuration = JobConfiguration::new(Marketplace::Jet);

        let err = bindings
            .construct("missing", &mut scope, &configuration)
            .unwrap_err();
        assert!(matches!(err, ScopeError::UnknownJobType(name) if name == "missing"));
    }

    #[test]
    fn test_job_bindings_lists_bound_types() {
        struct NullJob;

        #[async_trait::async_trait]
        impl ScopedJob for NullJob {
            async fn run(&mut self) -> Result<(), crate::error::JobError> {
                Ok(())
            }
        }

        let mut bindings = JobBindings::new();
        bindings.bind("feed-sync", |_, _| Ok(Box::new(NullJob)));

        assert!(bindings.is_bound("feed-sync"));
        assert!(!bindings.is_bound("other"));
        assert_eq!(bindings.job_types(), vec!["feed-sync"]);
    }
}
