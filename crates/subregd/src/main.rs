// # subregd - Subdomain Registry Daemon
//
// The subregd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime and the registry store
// 3. Wiring up the DNS provisioner when credentials are configured
// 4. Serving the HTTP JSON API until a shutdown signal arrives
//
// It is a thin integration layer: registry semantics live in subreg-core,
// provider plumbing in subreg-provider-cloudflare, and this binary only
// composes them.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Server
// - `SUBREG_HOST`: Bind address (default 0.0.0.0)
// - `SUBREG_PORT`: Bind port (default 10000)
// - `SUBREG_DATA_DIR`: Directory for the JSON documents (default "domains")
// - `SUBREG_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ### Base domains
// - `SUBREG_BASE_DOMAIN_<TLD>`: Base domain backing each TLD code, e.g.
//   `SUBREG_BASE_DOMAIN_COM=example.com`. Defaults are provided for the
//   built-in TLD codes (net, com, zw, dev, id).
//
// ### DNS Provider (optional)
// - `SUBREG_CLOUDFLARE_API_TOKEN`: API token with Zone:DNS:Edit permissions.
//   When absent, DNS provisioning is disabled and the registry runs
//   standalone.
// - `SUBREG_CLOUDFLARE_ZONE_<TLD>`: Cloudflare zone ID per TLD code.
//
// ## Example
//
// ```bash
// export SUBREG_PORT=10000
// export SUBREG_DATA_DIR=/var/lib/subreg
// export SUBREG_BASE_DOMAIN_COM=example.com
// export SUBREG_CLOUDFLARE_API_TOKEN=your_token
// export SUBREG_CLOUDFLARE_ZONE_COM=023e105f4ecef8ad9ca31a8372d0c353
//
// subregd
// ```

mod api;
mod state;

use anyhow::Result;
use std::collections::HashMap;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use subreg_core::FileRegistryStore;
use subreg_core::config::DEFAULT_ALLOWED_TLDS;
use subreg_core::traits::DnsProvisioner;
use subreg_provider_cloudflare::CloudflareProvisioner;

use crate::state::AppState;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum SubregExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<SubregExitCode> for ExitCode {
    fn from(code: SubregExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Base domain defaults for the built-in TLD codes
const DEFAULT_BASE_DOMAINS: [(&str, &str); 5] = [
    ("net", "example.net"),
    ("com", "example.com"),
    ("zw", "example.co.zw"),
    ("dev", "example.dev"),
    ("id", "example.id"),
];

/// Application configuration
struct Config {
    host: String,
    port: u16,
    data_dir: String,
    base_domains: HashMap<String, String>,
    cloudflare_api_token: Option<String>,
    cloudflare_zone_ids: HashMap<String, String>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let mut base_domains: HashMap<String, String> = DEFAULT_BASE_DOMAINS
            .iter()
            .map(|(tld, base)| (tld.to_string(), base.to_string()))
            .collect();
        let mut cloudflare_zone_ids = HashMap::new();

        for tld in DEFAULT_ALLOWED_TLDS {
            let suffix = tld.to_uppercase();
            if let Ok(base) = env::var(format!("SUBREG_BASE_DOMAIN_{suffix}")) {
                base_domains.insert(tld.to_string(), base);
            }
            if let Ok(zone_id) = env::var(format!("SUBREG_CLOUDFLARE_ZONE_{suffix}")) {
                cloudflare_zone_ids.insert(tld.to_string(), zone_id);
            }
        }

        Ok(Self {
            host: env::var("SUBREG_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SUBREG_PORT")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| anyhow::anyhow!("SUBREG_PORT is not a valid port number: {e}"))?
                .unwrap_or(10000),
            data_dir: env::var("SUBREG_DATA_DIR").unwrap_or_else(|_| "domains".to_string()),
            base_domains,
            cloudflare_api_token: env::var("SUBREG_CLOUDFLARE_API_TOKEN").ok(),
            cloudflare_zone_ids,
            log_level: env::var("SUBREG_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// This performs validation including:
    /// - Value format validation (API token, base domains)
    /// - Zone coverage checks when a token is configured
    /// - Type enumeration validation (log level)
    fn validate(&self) -> Result<()> {
        if let Some(token) = &self.cloudflare_api_token {
            if token.is_empty() {
                anyhow::bail!(
                    "SUBREG_CLOUDFLARE_API_TOKEN is set but empty. \
                    Unset it to run without DNS provisioning."
                );
            }

            // Cloudflare API tokens are typically 40 characters alphanumeric
            if token.len() < 20 {
                anyhow::bail!(
                    "SUBREG_CLOUDFLARE_API_TOKEN appears too short ({} chars). \
                    Cloudflare tokens are typically 40 characters. \
                    Verify your token is correct.",
                    token.len()
                );
            }

            // Check for obvious placeholder tokens (common mistake)
            let token_lower = token.to_lowercase();
            if token_lower.contains("your_token")
                || token_lower.contains("replace_me")
                || token_lower.contains("example")
                || token_lower == "token"
            {
                anyhow::bail!(
                    "SUBREG_CLOUDFLARE_API_TOKEN appears to be a placeholder. \
                    Use an actual API token from Cloudflare."
                );
            }

            if self.cloudflare_zone_ids.is_empty() {
                anyhow::bail!(
                    "SUBREG_CLOUDFLARE_API_TOKEN is set but no zones are configured. \
                    Set at least one: export SUBREG_CLOUDFLARE_ZONE_COM=your_zone_id"
                );
            }
        }

        if self.data_dir.is_empty() {
            anyhow::bail!("SUBREG_DATA_DIR cannot be empty");
        }

        for (tld, base) in &self.base_domains {
            validate_domain_name(base).map_err(|e| {
                anyhow::anyhow!("SUBREG_BASE_DOMAIN_{} is invalid: {e}", tld.to_uppercase())
            })?;
        }

        // Validate log level
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "SUBREG_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

/// Validate that a string is a valid domain name
///
/// Basic DNS domain name validation per RFC 1035. Not comprehensive but
/// catches common errors.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return SubregExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return SubregExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SubregExitCode::ConfigError.into();
    }

    info!("Starting subregd daemon");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SubregExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_server(config).await {
            error!("Server error: {}", e);
            SubregExitCode::RuntimeError
        } else {
            SubregExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the HTTP server until a shutdown signal arrives
async fn run_server(config: Config) -> Result<()> {
    let store = FileRegistryStore::new(&config.data_dir).await?;
    info!(data_dir = %config.data_dir, "registry store initialized");

    let provisioner: Option<Arc<dyn DnsProvisioner>> = match &config.cloudflare_api_token {
        Some(token) => {
            let cloudflare =
                CloudflareProvisioner::new(token.clone(), config.cloudflare_zone_ids.clone())?;
            info!(
                zones = config.cloudflare_zone_ids.len(),
                "Cloudflare DNS provisioning enabled"
            );
            Some(Arc::new(cloudflare))
        }
        None => {
            warn!("SUBREG_CLOUDFLARE_API_TOKEN not set, DNS provisioning disabled");
            None
        }
    };

    let app_state = AppState {
        store: Arc::new(store),
        provisioner,
        base_domains: config.base_domains.clone(),
    };

    let app = api::router(app_state);

    let bind_addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down daemon");
    Ok(())
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to setup SIGTERM handler: {}", e);
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to setup SIGINT handler: {}", e);
            return;
        }
    };

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    info!("Received shutdown signal: {}", name);
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to wait for CTRL-C: {}", e);
        return;
    }
    info!("Received shutdown signal: SIGINT");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_domain_names() {
        assert!(validate_domain_name("example.com").is_ok());
        assert!(validate_domain_name("example.co.zw").is_ok());
        assert!(validate_domain_name("a-b.example.dev").is_ok());
    }

    #[test]
    fn invalid_domain_names() {
        assert!(validate_domain_name("").is_err());
        assert!(validate_domain_name("example..com").is_err());
        assert!(validate_domain_name("-bad.example.com").is_err());
        assert!(validate_domain_name(&"a".repeat(300)).is_err());
    }
}
