//! DailyWell launcher
//!
//! Runs the start-up path once: resolve the remote gate, then report which
//! UI root would be mounted.
//!
//! Usage:
//!   dailywell-launch --config gate.yaml
//!   dailywell-launch --json resolve
//!   dailywell-launch status
//!   dailywell-launch complete-onboarding
//!   dailywell-launch reset

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use dailywell_gate::{
    GateConfig, GateResolver, JsonFileLaunchStore, LaunchContext, LaunchRoot, LaunchStore,
};

#[derive(Parser, Debug)]
#[command(name = "dailywell-launch")]
#[command(about = "Resolve the DailyWell launch gate and report the UI root")]
struct Args {
    /// Gate config file (YAML). Without it, config comes from the environment.
    #[arg(long, short = 'c', env = "DAILYWELL_CONFIG")]
    config: Option<PathBuf>,

    /// Override the persisted launch-state file
    #[arg(long, short = 's')]
    state: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Probe the endpoint once and pick the UI root (default)
    Resolve,
    /// Show persisted launch state without probing
    Status,
    /// Mark onboarding as completed
    CompleteOnboarding,
    /// Clear all persisted launch state
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command.unwrap_or(Command::Resolve) {
        Command::Resolve => resolve(&args).await,
        Command::Status => status(&args).await,
        Command::CompleteOnboarding => {
            let store = open_store(&args)?;
            store
                .set_onboarding_completed(true)
                .await
                .context("Failed to write onboarding flag")?;
            info!(path = %store.path().display(), "onboarding marked complete");
            Ok(())
        }
        Command::Reset => {
            let store = open_store(&args)?;
            store
                .clear()
                .await
                .context("Failed to clear launch state")?;
            info!(path = %store.path().display(), "launch state cleared");
            Ok(())
        }
    }
}

async fn resolve(args: &Args) -> Result<()> {
    let mut config =
        GateConfig::load(args.config.as_deref()).context("Failed to load gate config")?;
    if let Some(state) = &args.state {
        config.state_path = state.clone();
    }

    let store = Arc::new(JsonFileLaunchStore::new(config.state_path.clone()));
    let resolver = GateResolver::with_http_probe(config, store.clone())
        .context("Failed to build gate probe")?;
    let launch = LaunchContext::resolve(&resolver, &*store).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&launch)?);
    } else {
        println!("decision: {}", launch.decision);
        println!("root:     {}", describe_root(&launch.root));
    }
    Ok(())
}

async fn status(args: &Args) -> Result<()> {
    let store = open_store(args)?;
    let flags = store
        .load_flags()
        .await
        .context("Failed to read launch state")?;
    let onboarding_completed = store
        .onboarding_completed()
        .await
        .context("Failed to read onboarding flag")?;

    if args.json {
        let value = serde_json::json!({
            "state_path": store.path().display().to_string(),
            "locked": flags.locked,
            "probed": flags.probed,
            "onboarding_completed": onboarding_completed,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("state:      {}", store.path().display());
        println!("locked:     {}", flags.locked);
        println!("probed:     {}", flags.probed);
        println!("onboarded:  {}", onboarding_completed);
    }
    Ok(())
}

/// State commands only need the file location, not a valid endpoint.
fn open_store(args: &Args) -> Result<JsonFileLaunchStore> {
    let path = match (&args.state, &args.config) {
        (Some(state), _) => state.clone(),
        (None, Some(config)) => {
            let mut config =
                GateConfig::load_from_file(config).context("Failed to load gate config")?;
            config
                .apply_env_overrides()
                .context("Invalid gate config override")?;
            config.state_path
        }
        (None, None) => GateConfig::state_path_from_env(),
    };
    Ok(JsonFileLaunchStore::new(path))
}

fn describe_root(root: &LaunchRoot) -> String {
    match root {
        LaunchRoot::Loading => "loading".to_string(),
        LaunchRoot::Onboarding => "onboarding".to_string(),
        LaunchRoot::NativeApp => "native app".to_string(),
        LaunchRoot::WebContent { url } => format!("web content ({url})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subcommand_defaults_to_resolve() {
        let args = Args::try_parse_from(["dailywell-launch", "--json"]).unwrap();
        assert!(args.json);
        assert_eq!(args.command, None);

        let args = Args::try_parse_from(["dailywell-launch", "complete-onboarding"]).unwrap();
        assert_eq!(args.command, Some(Command::CompleteOnboarding));
    }

    #[test]
    fn state_flag_wins_for_state_commands() {
        let args =
            Args::try_parse_from(["dailywell-launch", "--state", "/tmp/s.json", "status"]).unwrap();
        let store = open_store(&args).unwrap();
        assert_eq!(store.path(), std::path::Path::new("/tmp/s.json"));
    }

    #[test]
    fn roots_describe_themselves() {
        assert_eq!(describe_root(&LaunchRoot::NativeApp), "native app");
        assert_eq!(
            describe_root(&LaunchRoot::WebContent {
                url: "https://example.com".into()
            }),
            "web content (https://example.com)"
        );
    }
}
