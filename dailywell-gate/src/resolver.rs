//! GateResolver
//!
//! Resolves the launch gate exactly once. Construct one resolver per
//! process start and pass the resulting decision down explicitly; the
//! resolver never re-probes, and concurrent callers share the single
//! in-flight resolution.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};
use url::Url;

use crate::classify::classify;
use crate::config::GateConfig;
use crate::decision::{GateDecision, GateFlags, ProbeOutcome};
use crate::error::GateError;
use crate::probe::{parse_endpoint, GateProbe, HttpProbe};
use crate::store::LaunchStore;

pub struct GateResolver {
    config: GateConfig,
    probe: Arc<dyn GateProbe>,
    store: Arc<dyn LaunchStore>,
    decision: OnceCell<GateDecision>,
}

impl GateResolver {
    pub fn new(
        config: GateConfig,
        probe: Arc<dyn GateProbe>,
        store: Arc<dyn LaunchStore>,
    ) -> Self {
        Self {
            config,
            probe,
            store,
            decision: OnceCell::new(),
        }
    }

    /// Resolver backed by the reqwest probe.
    pub fn with_http_probe(
        config: GateConfig,
        store: Arc<dyn LaunchStore>,
    ) -> Result<Self, GateError> {
        let probe = HttpProbe::new(&config)?;
        Ok(Self::new(config, Arc::new(probe), store))
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// `Pending` until [`resolve`](Self::resolve) completes, then the terminal decision.
    pub fn current(&self) -> GateDecision {
        self.decision
            .get()
            .copied()
            .unwrap_or(GateDecision::Pending)
    }

    pub async fn resolve(&self) -> GateDecision {
        self.resolve_at(Utc::now()).await
    }

    /// Resolve using `now` for the effective-from check. Only the first call
    /// does any work; later calls return the same value.
    pub async fn resolve_at(&self, now: DateTime<Utc>) -> GateDecision {
        *self
            .decision
            .get_or_init(|| self.compute(now))
            .await
    }

    async fn compute(&self, now: DateTime<Utc>) -> GateDecision {
        if let Some(decision) = self.reuse_persisted().await {
            return decision;
        }

        let (decision, probed) = if !self.config.probe_allowed_at(now) {
            info!(
                effective_from = ?self.config.effective_from,
                "gate probe not yet effective; staying locked"
            );
            (GateDecision::Locked, false)
        } else {
            match parse_endpoint(&self.config.endpoint) {
                Err(e) => {
                    info!(reason = e.kind(), error = %e, "gate locked");
                    (e.decision(), false)
                }
                Ok(url) => match self.probe_once(&url).await {
                    Ok(()) => (GateDecision::Unlocked, true),
                    Err(e) => {
                        info!(reason = e.kind(), error = %e, "gate locked");
                        (e.decision(), true)
                    }
                },
            }
        };

        info!(%decision, probed, "gate resolved");
        // Only a decision backed by a real request may be reused by later launches.
        let flags = if probed {
            GateFlags::from_decision(decision)
        } else {
            GateFlags::default()
        };
        self.persist(flags).await;
        decision
    }

    async fn reuse_persisted(&self) -> Option<GateDecision> {
        if self.config.reprobe_on_launch {
            return None;
        }
        match self.store.load_flags().await {
            Ok(flags) if flags.probed => {
                let decision = GateDecision::from_locked_flag(flags.locked);
                info!(%decision, "reusing persisted gate decision");
                Some(decision)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "failed to read persisted gate flags; probing");
                None
            }
        }
    }

    async fn probe_once(&self, url: &Url) -> Result<(), GateError> {
        info!(host = url.host_str().unwrap_or_default(), "probing gate endpoint");

        let timeout = self.config.timeout();
        let outcome = match tokio::time::timeout(timeout, self.probe.probe(url)).await {
            Ok(outcome) => outcome,
            Err(_) => ProbeOutcome::Failed(GateError::TransportFailure(format!(
                "timeout: no response within {}s",
                timeout.as_secs()
            ))),
        };

        if let Some(status) = outcome.status() {
            info!(status, "gate endpoint responded");
        }
        classify(&outcome)
    }

    async fn persist(&self, flags: GateFlags) {
        if let Err(e) = self.store.save_flags(flags).await {
            warn!(error = %e, "failed to persist gate flags");
        }
    }
}
