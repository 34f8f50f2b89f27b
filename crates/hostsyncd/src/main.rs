// # hostsyncd - router-to-IPAM sync
//
// Thin integration layer: reads configuration from environment variables,
// initializes logging and the runtime, wires the collaborators together
// and runs one command. All reconciliation logic lives in hostsync-core.
//
// ## Commands
//
// - `hostsyncd` / `hostsyncd sync`: reconcile the router snapshot into IPAM
// - `hostsyncd hosts`: print the router's known-hosts table
// - `hostsyncd status`: print the IPAM instance version
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Router
// - `HOSTSYNC_ROUTER_URL`: Base URL of the router API
// - `HOSTSYNC_ROUTER_USER`: API username
// - `HOSTSYNC_ROUTER_PASSWORD`: API password
//
// ### IPAM
// - `HOSTSYNC_IPAM_PROTOCOL`: http or https (default: http)
// - `HOSTSYNC_IPAM_HOST`: IPAM hostname
// - `HOSTSYNC_IPAM_PORT`: IPAM port (default: 8000)
// - `HOSTSYNC_IPAM_TOKEN`: API token
// - `HOSTSYNC_IPAM_TENANT_ID`: Tenant id for created addresses (optional)
//
// ### Filtering
// - `HOSTSYNC_IGNORE`: Comma-separated IPs excluded from the sync
// - `HOSTSYNC_ACCEPT`: Comma-separated IPs (reserved, currently unused)
//
// ### Snapshot cache
// - `HOSTSYNC_SNAPSHOT_PATH`: Cache file for the last router snapshot
// - `HOSTSYNC_SOURCE`: Where hosts come from: router (default) or snapshot
//
// ### Logging
// - `HOSTSYNC_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
// - `HOSTSYNC_LOG_FILE`: Log file path (default: stderr)
//
// ## Exit Codes
//
// - 0: clean run (per-host failures are reported but do not change this)
// - 1: configuration error
// - 2: duplicate-hostname precondition failed
// - 3: upstream failure (router unreachable, IPAM fetch failed)
// - 4: unexpected runtime error

use anyhow::{Context, Result};
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use hostsync_core::{
    Error, HostFilter, HostRecord, HostSnapshot, HostSource, Reconciler, SnapshotFile, SyncReport,
    ensure_unique_names,
};
use hostsync_netbox::NetBoxIpam;
use hostsync_routeros::RouterOsHostSource;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum SyncExitCode {
    /// Clean run
    CleanExit = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Duplicate hostnames in the filtered snapshot
    PreconditionError = 2,
    /// Router or IPAM unreachable, or an unexpected initial-fetch status
    UpstreamError = 3,
    /// Unexpected runtime error
    RuntimeError = 4,
}

impl From<SyncExitCode> for ExitCode {
    fn from(code: SyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// The command selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Sync,
    Hosts,
    Status,
}

impl Command {
    fn parse(arg: Option<&str>) -> Result<Self> {
        match arg.unwrap_or("sync") {
            "sync" => Ok(Self::Sync),
            "hosts" => Ok(Self::Hosts),
            "status" => Ok(Self::Status),
            other => anyhow::bail!("unknown command '{other}'. Commands: sync, hosts, status"),
        }
    }
}

/// Where the host snapshot comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Router,
    Snapshot,
}

/// Application configuration
struct Config {
    router_url: Option<String>,
    router_user: Option<String>,
    router_password: Option<String>,
    ipam_protocol: String,
    ipam_host: Option<String>,
    ipam_port: u16,
    ipam_token: Option<String>,
    ipam_tenant_id: Option<u64>,
    ignore_list: Vec<String>,
    accept_list: Vec<String>,
    snapshot_path: Option<String>,
    source: Source,
    log_level: String,
    log_file: Option<String>,
}

/// Split a comma-separated variable into trimmed, non-empty entries
fn env_list(key: &str) -> Vec<String> {
    env::var(key)
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let ipam_port = match env::var("HOSTSYNC_IPAM_PORT") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("HOSTSYNC_IPAM_PORT is not a valid port: {raw:?}"))?,
            Err(_) => 8000,
        };

        let ipam_tenant_id = match env::var("HOSTSYNC_IPAM_TENANT_ID") {
            Ok(raw) => Some(
                raw.parse()
                    .with_context(|| format!("HOSTSYNC_IPAM_TENANT_ID is not a number: {raw:?}"))?,
            ),
            Err(_) => None,
        };

        let source = match env::var("HOSTSYNC_SOURCE").as_deref() {
            Ok("router") | Err(_) => Source::Router,
            Ok("snapshot") => Source::Snapshot,
            Ok(other) => anyhow::bail!(
                "HOSTSYNC_SOURCE '{other}' is not supported. Supported sources: router, snapshot"
            ),
        };

        Ok(Self {
            router_url: env::var("HOSTSYNC_ROUTER_URL").ok(),
            router_user: env::var("HOSTSYNC_ROUTER_USER").ok(),
            router_password: env::var("HOSTSYNC_ROUTER_PASSWORD").ok(),
            ipam_protocol: env::var("HOSTSYNC_IPAM_PROTOCOL").unwrap_or_else(|_| "http".to_string()),
            ipam_host: env::var("HOSTSYNC_IPAM_HOST").ok(),
            ipam_port,
            ipam_token: env::var("HOSTSYNC_IPAM_TOKEN").ok(),
            ipam_tenant_id,
            ignore_list: env_list("HOSTSYNC_IGNORE"),
            accept_list: env_list("HOSTSYNC_ACCEPT"),
            snapshot_path: env::var("HOSTSYNC_SNAPSHOT_PATH").ok(),
            source,
            log_level: env::var("HOSTSYNC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_file: env::var("HOSTSYNC_LOG_FILE").ok(),
        })
    }

    /// Validate what the selected command actually needs
    fn validate(&self, command: Command) -> Result<()> {
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => anyhow::bail!(
                "HOSTSYNC_LOG_LEVEL '{other}' is not valid. Valid levels: trace, debug, info, warn, error"
            ),
        }

        let needs_hosts = matches!(command, Command::Sync | Command::Hosts);
        let needs_ipam = matches!(command, Command::Sync | Command::Status);

        if needs_hosts {
            match self.source {
                Source::Router => {
                    for (value, key) in [
                        (&self.router_url, "HOSTSYNC_ROUTER_URL"),
                        (&self.router_user, "HOSTSYNC_ROUTER_USER"),
                        (&self.router_password, "HOSTSYNC_ROUTER_PASSWORD"),
                    ] {
                        if value.as_ref().is_none_or(|v| v.is_empty()) {
                            anyhow::bail!("{key} is required when HOSTSYNC_SOURCE=router");
                        }
                    }
                }
                Source::Snapshot => {
                    if self.snapshot_path.as_ref().is_none_or(|p| p.is_empty()) {
                        anyhow::bail!(
                            "HOSTSYNC_SNAPSHOT_PATH is required when HOSTSYNC_SOURCE=snapshot"
                        );
                    }
                }
            }
        }

        if needs_ipam {
            if self.ipam_host.as_ref().is_none_or(|h| h.is_empty()) {
                anyhow::bail!(
                    "HOSTSYNC_IPAM_HOST is required. Set it via: export HOSTSYNC_IPAM_HOST=ipam.example"
                );
            }
            let token = self.ipam_token.as_deref().unwrap_or("");
            if token.is_empty() {
                anyhow::bail!(
                    "HOSTSYNC_IPAM_TOKEN is required. Set it via: export HOSTSYNC_IPAM_TOKEN=your_token"
                );
            }
            // Catch obvious placeholder tokens (common mistake)
            let token_lower = token.to_lowercase();
            if token_lower.contains("your_token") || token_lower.contains("example") || token_lower == "token" {
                anyhow::bail!(
                    "HOSTSYNC_IPAM_TOKEN appears to be a placeholder. Use an actual API token."
                );
            }
        }

        Ok(())
    }

    fn router_config(&self) -> hostsync_core::RouterConfig {
        hostsync_core::RouterConfig {
            url: self.router_url.clone().unwrap_or_default(),
            username: self.router_user.clone().unwrap_or_default(),
            password: self.router_password.clone().unwrap_or_default(),
        }
    }

    fn ipam_config(&self) -> hostsync_core::IpamConfig {
        hostsync_core::IpamConfig {
            protocol: self.ipam_protocol.clone(),
            host: self.ipam_host.clone().unwrap_or_default(),
            port: self.ipam_port,
            token: self.ipam_token.clone().unwrap_or_default(),
            tenant_id: self.ipam_tenant_id,
        }
    }
}

fn main() -> ExitCode {
    let command = match Command::parse(env::args().nth(1).as_deref()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}");
            return SyncExitCode::ConfigError.into();
        }
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return SyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate(command) {
        eprintln!("Configuration validation error: {e}");
        return SyncExitCode::ConfigError.into();
    }

    if let Err(e) = init_tracing(&config) {
        eprintln!("Failed to initialize logging: {e}");
        return SyncExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(command, config)).into()
}

/// Initialize the tracing subscriber, to stderr or the configured file
fn init_tracing(config: &Config) -> Result<()> {
    let level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    match &config.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {path}"))?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        None => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

/// Dispatch the selected command
async fn run(command: Command, config: Config) -> SyncExitCode {
    match command {
        Command::Sync => run_sync(&config).await,
        Command::Hosts => run_hosts(&config).await,
        Command::Status => run_status(&config).await,
    }
}

/// Build the configured host source
fn host_source(config: &Config) -> Result<Box<dyn HostSource>, Error> {
    match config.source {
        Source::Router => Ok(Box::new(RouterOsHostSource::new(&config.router_config())?)),
        Source::Snapshot => {
            let path = config.snapshot_path.as_deref().unwrap_or_default();
            Ok(Box::new(SnapshotFile::new(path)))
        }
    }
}

/// Fetch the snapshot and refresh the cache file when configured
async fn fetch_hosts(config: &Config) -> Result<Vec<HostRecord>, Error> {
    let source = host_source(config)?;
    let hosts = source.get_hosts().await?;

    if config.source == Source::Router
        && let Some(path) = &config.snapshot_path
    {
        let cache = SnapshotFile::new(path);
        if let Err(e) = cache.store(&HostSnapshot::new(hosts.clone())).await {
            warn!("failed to refresh snapshot cache: {}", e);
        }
    }

    Ok(hosts)
}

/// Map a fatal core error to the exit code it deserves
fn exit_for(err: &Error) -> SyncExitCode {
    match err {
        Error::DuplicateHostnames(_) => SyncExitCode::PreconditionError,
        Error::Config(_) => SyncExitCode::ConfigError,
        Error::Router(_)
        | Error::Ipam(_)
        | Error::Api { .. }
        | Error::Authentication(_)
        | Error::NotFound(_)
        | Error::Decode(_)
        | Error::Json(_)
        | Error::Io(_) => SyncExitCode::UpstreamError,
        _ => SyncExitCode::RuntimeError,
    }
}

/// `sync`: reconcile the filtered router snapshot into IPAM
async fn run_sync(config: &Config) -> SyncExitCode {
    let hosts = match fetch_hosts(config).await {
        Ok(hosts) => hosts,
        Err(e) => {
            eprintln!("Failed to fetch hosts: {e}");
            return exit_for(&e);
        }
    };

    let filter = HostFilter::new(config.ignore_list.clone(), config.accept_list.clone());
    let filtered = filter.apply(&hosts);
    info!(total = hosts.len(), filtered = filtered.len(), "host snapshot filtered");

    // Hard precondition: duplicate hostnames make the sync undecidable.
    // Checked here so IPAM is left untouched, and re-checked by the engine.
    if let Err(e) = ensure_unique_names(&filtered) {
        eprintln!("{e}");
        eprintln!("Aborting: fix the duplicate hostnames on the router and re-run.");
        return SyncExitCode::PreconditionError;
    }

    let ipam = match NetBoxIpam::new(&config.ipam_config()) {
        Ok(ipam) => ipam,
        Err(e) => {
            eprintln!("Failed to set up IPAM client: {e}");
            return SyncExitCode::ConfigError;
        }
    };

    let mut reconciler = Reconciler::new(Box::new(ipam));
    match reconciler.run(&filtered).await {
        Ok(report) => {
            print_report(&report);
            SyncExitCode::CleanExit
        }
        Err(e) => {
            eprintln!("Sync aborted: {e}");
            exit_for(&e)
        }
    }
}

/// `hosts`: print the router's known-hosts table
async fn run_hosts(config: &Config) -> SyncExitCode {
    match fetch_hosts(config).await {
        Ok(hosts) => {
            print_hosts(&hosts);
            SyncExitCode::CleanExit
        }
        Err(e) => {
            eprintln!("Failed to fetch hosts: {e}");
            exit_for(&e)
        }
    }
}

/// `status`: print the IPAM instance version
async fn run_status(config: &Config) -> SyncExitCode {
    let ipam = match NetBoxIpam::new(&config.ipam_config()) {
        Ok(ipam) => ipam,
        Err(e) => {
            eprintln!("Failed to set up IPAM client: {e}");
            return SyncExitCode::ConfigError;
        }
    };

    use hostsync_core::traits::IpamStore;
    match ipam.status().await {
        Ok(status) => {
            println!("IPAM version: {}", status.version);
            SyncExitCode::CleanExit
        }
        Err(e) => {
            eprintln!("Failed to query IPAM status: {e}");
            exit_for(&e)
        }
    }
}

/// Numbered host table, one line per router entry
fn print_hosts(hosts: &[HostRecord]) {
    for (index, host) in hosts.iter().enumerate() {
        let status = if host.status { "active" } else { "-" };
        let ip = if host.ip.is_empty() { "-" } else { &host.ip };
        let mac = if host.mac.is_empty() { "-" } else { &host.mac };
        println!("{:>3}: {:<16} {:<42} {:<17}   {}", index + 1, ip, host.name, mac, status);
    }
}

/// Per-host outcomes followed by a one-line summary
fn print_report(report: &SyncReport) {
    for outcome in &report.outcomes {
        match &outcome.action {
            hostsync_core::Action::Failed(reason) => {
                println!("{:<16} {:<42} failed: {}", outcome.ip, outcome.host, reason);
            }
            action => {
                println!("{:<16} {:<42} {}", outcome.ip, outcome.host, action.label());
            }
        }
    }
    println!(
        "{} host(s): {} created, {} updated, {} unchanged, {} failed",
        report.outcomes.len(),
        report.created(),
        report.updated(),
        report.unchanged(),
        report.failed()
    );
}
