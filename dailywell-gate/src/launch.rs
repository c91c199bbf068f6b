//! Launch root selection
//!
//! Turns the gate decision into the one UI root mounted for this launch.

use serde::Serialize;
use tracing::warn;

use crate::decision::GateDecision;
use crate::resolver::GateResolver;
use crate::store::LaunchStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "root", rename_all = "snake_case")]
pub enum LaunchRoot {
    /// Progress indicator while the probe is in flight.
    Loading,
    /// First-run carousel, shown before the native app.
    Onboarding,
    /// Native tab shell (planner, habits, goals, mindfulness, settings).
    NativeApp,
    /// Embedded web view pointed at the gate endpoint.
    WebContent { url: String },
}

pub fn select_root(
    decision: GateDecision,
    onboarding_completed: bool,
    endpoint: &str,
) -> LaunchRoot {
    match decision {
        GateDecision::Pending => LaunchRoot::Loading,
        GateDecision::Unlocked => LaunchRoot::WebContent {
            url: endpoint.to_string(),
        },
        GateDecision::Locked if onboarding_completed => LaunchRoot::NativeApp,
        GateDecision::Locked => LaunchRoot::Onboarding,
    }
}

/// The resolved start-up state handed to UI composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchContext {
    pub decision: GateDecision,
    pub onboarding_completed: bool,
    pub root: LaunchRoot,
}

impl LaunchContext {
    /// Resolve the gate (once) and pick the root.
    pub async fn resolve(resolver: &GateResolver, store: &dyn LaunchStore) -> Self {
        let decision = resolver.resolve().await;
        let onboarding_completed = match store.onboarding_completed().await {
            Ok(completed) => completed,
            Err(e) => {
                warn!(error = %e, "failed to read onboarding flag; assuming first run");
                false
            }
        };

        Self {
            decision,
            onboarding_completed,
            root: select_root(decision, onboarding_completed, &resolver.config().endpoint),
        }
    }
}
