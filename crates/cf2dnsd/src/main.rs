// # cf2dnsd - cf2dns runner
//
// This binary is a THIN integration layer: all selection and reconciliation
// logic lives in cf2dns-core. It is meant to be run periodically (cron,
// systemd timer) and performs exactly one pass per invocation.
//
// The runner is responsible for:
// 1. Reading configuration from the config file and environment variables
// 2. Initializing logging and the runtime
// 3. Registering providers
// 4. Running one orchestrated pass under the configured deadline
//
// ## Configuration
//
// - `CF2DNS_CONFIG`: Path to the JSON config file (default: config.json)
// - `CF2DNS_API_TOKEN`: DNS provider API token (overrides the file)
// - `CF2DNS_DEADLINE_SECS`: Run deadline in seconds (overrides the file)
// - `CF2DNS_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
// - `CF2DNS_MODE`: set to `dry-run` to skip DNS writes
//
// ## Example
//
// ```bash
// export CF2DNS_CONFIG=/etc/cf2dns/config.json
// export CF2DNS_API_TOKEN=your_token
// cf2dnsd
// ```

use anyhow::{Context, Result};
use cf2dns_core::{Cf2DnsConfig, Orchestrator, ProviderRegistry, TargetOutcome};
use cf2dns_source_http::HttpMeasurementSource;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Run completed
/// - 1: Configuration or startup error
/// - 2: Runtime error (a target failed or the deadline expired)
#[derive(Debug, Clone, Copy)]
enum RunExitCode {
    /// Run completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<RunExitCode> for ExitCode {
    fn from(code: RunExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Runner settings resolved from the environment
struct Settings {
    config_path: PathBuf,
    api_token: Option<String>,
    deadline_secs: Option<u64>,
    log_level: String,
}

impl Settings {
    /// Load settings from environment variables
    fn from_env() -> Result<Self> {
        let deadline_secs = match env::var("CF2DNS_DEADLINE_SECS") {
            Ok(raw) => Some(
                raw.trim()
                    .parse()
                    .with_context(|| format!("CF2DNS_DEADLINE_SECS is not a number: {}", raw))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            config_path: env::var("CF2DNS_CONFIG")
                .unwrap_or_else(|_| "config.json".to_string())
                .into(),
            api_token: env::var("CF2DNS_API_TOKEN").ok().filter(|t| !t.is_empty()),
            deadline_secs,
            log_level: env::var("CF2DNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Resolve the tracing level
    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "CF2DNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Read the config file and apply environment overrides
    fn load_config(&self) -> Result<Cf2DnsConfig> {
        let mut config = Cf2DnsConfig::read(&self.config_path)?;

        if let Some(ref token) = self.api_token {
            config.provider.set_api_token(token.as_str());
        }
        if let Some(secs) = self.deadline_secs {
            config.run.deadline_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return RunExitCode::ConfigError.into();
        }
    };

    let log_level = match settings.level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return RunExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return RunExitCode::ConfigError.into();
    }

    info!("Starting cf2dnsd v{}", env!("CARGO_PKG_VERSION"));

    let config = match settings.load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return RunExitCode::ConfigError.into();
        }
    };
    info!("Configuration loaded: {} target(s)", config.targets.len());

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return RunExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run_once(config).await {
            Ok(code) => code,
            Err(e) => {
                error!("Run failed: {:#}", e);
                RunExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Wire the components and perform one pass
async fn run_once(config: Cf2DnsConfig) -> Result<RunExitCode> {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "cloudflare")]
    {
        info!("Registering Cloudflare provider");
        cf2dns_provider_cloudflare::register(&registry);
    }

    let provider = registry
        .create_provider(&config.provider)
        .context("failed to create DNS provider")?;
    let source = HttpMeasurementSource::new().context("failed to create measurement source")?;

    let orchestrator = Orchestrator::new(Box::new(source), provider, &config.run);
    let deadline = tokio::time::Instant::now() + config.run.deadline();

    let report = tokio::select! {
        result = orchestrator.run(deadline, &config.targets) => result?,
        signal = wait_for_shutdown() => {
            warn!("Received {}, aborting run", signal?);
            return Ok(RunExitCode::RuntimeError);
        }
    };

    for outcome in &report.outcomes {
        match outcome {
            TargetOutcome::Applied { target, report } => info!(
                "{}: {} created, {} updated, {} failed update(s), {} untouched",
                target,
                report.created(),
                report.updated(),
                report.update_failures.len(),
                report.untouched
            ),
            TargetOutcome::Skipped { target, reason } => warn!("{}: skipped ({})", target, reason),
            TargetOutcome::Failed { target, message } => error!("{}: failed ({})", target, message),
        }
    }

    let elapsed = (report.finished_at - report.started_at)
        .to_std()
        .unwrap_or(Duration::ZERO);
    info!("Run finished in {:?}", elapsed);

    if report.has_failures() {
        return Ok(RunExitCode::RuntimeError);
    }
    Ok(RunExitCode::Success)
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
