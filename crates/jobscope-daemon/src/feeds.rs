//! Demo marketplace feed domain.
//!
//! One simulated resource (`FeedConnection`, opened per execution) and two
//! capability interfaces with a concrete variant per marketplace. Each
//! variant opens its own connection inside the activation's scope, so a job
//! that uses both capabilities owns two independent resources for the length
//! of one run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use jobscope_lifecycle::{
    HookError, ResourceId, Scope, ScopeError, ScopedResource, VariantBindings,
};
use jobscope_types::Marketplace;

/// A simulated per-run connection to a marketplace feed.
///
/// Opening it is the externally observable side effect of activation;
/// closing it happens exactly once when the owning scope is released.
#[derive(Debug)]
pub struct FeedConnection {
    id: ResourceId,
    marketplace: Marketplace,
    closed: AtomicBool,
}

impl FeedConnection {
    /// Creation hook.
    ///
    /// # Errors
    ///
    /// Refuses to open for `Marketplace::Invalid`.
    pub fn open(marketplace: Marketplace) -> Result<Self, HookError> {
        if !marketplace.is_valid() {
            return Err(HookError::new(
                "cannot open a feed connection for an invalid marketplace",
            ));
        }
        let id = ResourceId::generate();
        info!(resource = %id, marketplace = %marketplace, "Feed connection opened");
        Ok(Self {
            id,
            marketplace,
            closed: AtomicBool::new(false),
        })
    }

    pub fn marketplace(&self) -> Marketplace {
        self.marketplace
    }

    /// Whether the release hook has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl ScopedResource for FeedConnection {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn kind(&self) -> &str {
        "feed-connection"
    }

    fn release(&self) -> Result<(), HookError> {
        self.closed.store(true, Ordering::SeqCst);
        info!(resource = %self.id, marketplace = %self.marketplace, "Feed connection closed");
        Ok(())
    }
}

/// Capability: produces an integer unit count from a marketplace feed.
pub trait UnitCounter: Send + Sync {
    fn count_units(&self, base: i64) -> i64;
}

/// Capability: produces a display label for a marketplace feed entry.
pub trait FeedLabeler: Send + Sync {
    fn label(&self, base: i64) -> String;
}

/// Amazon variant of both demo capabilities.
pub struct AmazonFeed {
    connection: Arc<FeedConnection>,
}

impl AmazonFeed {
    /// Construct inside `scope`, opening a fresh connection owned by it.
    pub fn create(scope: &mut Scope) -> Result<Self, ScopeError> {
        let connection = FeedConnection::open(Marketplace::Amazon)
            .map_err(|e| ScopeError::construction("amazon feed connection", e))?;
        Ok(Self {
            connection: scope.adopt(Arc::new(connection)),
        })
    }
}

impl UnitCounter for AmazonFeed {
    fn count_units(&self, base: i64) -> i64 {
        debug_assert_eq!(self.connection.marketplace(), Marketplace::Amazon);
        base * 2
    }
}

impl FeedLabeler for AmazonFeed {
    fn label(&self, base: i64) -> String {
        format!("amazon:{base}")
    }
}

/// Jet variant of both demo capabilities.
pub struct JetFeed {
    connection: Arc<FeedConnection>,
}

impl JetFeed {
    /// Construct inside `scope`, opening a fresh connection owned by it.
    pub fn create(scope: &mut Scope) -> Result<Self, ScopeError> {
        let connection = FeedConnection::open(Marketplace::Jet)
            .map_err(|e| ScopeError::construction("jet feed connection", e))?;
        Ok(Self {
            connection: scope.adopt(Arc::new(connection)),
        })
    }
}

impl UnitCounter for JetFeed {
    fn count_units(&self, base: i64) -> i64 {
        debug_assert_eq!(self.connection.marketplace(), Marketplace::Jet);
        base * 3
    }
}

impl FeedLabeler for JetFeed {
    fn label(&self, base: i64) -> String {
        format!("jet:{base}")
    }
}

/// The capability binding tables for the feed domain, `Arc`-shared and
/// read-only once built.
pub struct FeedBindings {
    pub unit_counters: Arc<VariantBindings<dyn UnitCounter>>,
    pub labelers: Arc<VariantBindings<dyn FeedLabeler>>,
}

/// Build the feed capability tables. Called once at startup.
pub fn feed_bindings() -> FeedBindings {
    let mut unit_counters: VariantBindings<dyn UnitCounter> = VariantBindings::new("unit-counter");
    unit_counters.bind(Marketplace::Amazon, |scope| {
        Ok(Box::new(AmazonFeed::create(scope)?))
    });
    unit_counters.bind(Marketplace::Jet, |scope| {
        Ok(Box::new(JetFeed::create(scope)?))
    });

    let mut labelers: VariantBindings<dyn FeedLabeler> = VariantBindings::new("feed-labeler");
    labelers.bind(Marketplace::Amazon, |scope| {
        Ok(Box::new(AmazonFeed::create(scope)?))
    });
    labelers.bind(Marketplace::Jet, |scope| {
        Ok(Box::new(JetFeed::create(scope)?))
    });

    FeedBindings {
        unit_counters: Arc::new(unit_counters),
        labelers: Arc::new(labelers),
    }
}
