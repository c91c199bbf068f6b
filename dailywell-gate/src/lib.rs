//! DailyWell launch gate
//!
//! At process start the app issues one bounded HTTP GET to a configured
//! endpoint and classifies the answer into a [`GateDecision`]:
//!
//! - `Unlocked`: the endpoint returned content (200 with a body) or a redirect;
//!   the embedded web content is mounted.
//! - `Locked`: anything else, including every failure; the native app is mounted.
//!
//! The gate fails closed. The decision is computed once per launch, persisted
//! for the next one, and handed to UI composition as a [`LaunchContext`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dailywell_gate::{GateConfig, GateResolver, JsonFileLaunchStore, LaunchContext};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GateConfig::load(None)?;
//! let store = Arc::new(JsonFileLaunchStore::new(config.state_path.clone()));
//! let resolver = GateResolver::with_http_probe(config, store.clone())?;
//! let launch = LaunchContext::resolve(&resolver, &*store).await;
//! println!("{:?}", launch.root);
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod config;
pub mod decision;
pub mod error;
pub mod launch;
pub mod probe;
pub mod resolver;
pub mod store;

pub use classify::{classify, decide};
pub use config::GateConfig;
pub use decision::{GateDecision, GateFlags, ProbeOutcome};
pub use error::{ConfigError, GateError, StoreError};
pub use launch::{select_root, LaunchContext, LaunchRoot};
pub use probe::{parse_endpoint, GateProbe, HttpProbe};
pub use resolver::GateResolver;
pub use store::{JsonFileLaunchStore, LaunchStore, MemoryLaunchStore};
