//! Portcullis daemon — entry point for running the admission service.

use clap::Parser;
use portcullis_gate::{GateConfig, HumanVerificationGate};
use portcullis_pat::{PatConfig, PatVerifier};
use portcullis_recaptcha::{RecaptchaConfig, RecaptchaVerifier};
use portcullis_service::{init_logging, AppState, GateMetrics, LogFormat, ServiceConfig};
use portcullis_types::VerificationPolicy;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "portcullis-daemon", about = "Human verification admission gate")]
struct Cli {
    /// Address the HTTP server binds to.
    #[arg(long, env = "PORTCULLIS_LISTEN_ADDR")]
    listen_addr: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "PORTCULLIS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format: "human" or "json".
    #[arg(long, env = "PORTCULLIS_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Action label gated endpoints assert towards the score verifier.
    #[arg(long, env = "PORTCULLIS_EXPECTED_ACTION")]
    expected_action: Option<String>,

    /// Admit requests that carry no verification token at all. Tokens that
    /// are present are still verified in full.
    #[arg(long, env = "PORTCULLIS_VERIFICATION_OPTIONAL")]
    verification_optional: bool,

    /// Path to a TOML configuration file. If provided, file settings are
    /// used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServiceConfig::from_file(path)
            .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", path.display()))?,
        None => ServiceConfig::default(),
    };
    if let Some(listen_addr) = cli.listen_addr {
        config.listen_addr = listen_addr;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }
    if let Some(log_format) = cli.log_format {
        config.log_format = log_format;
    }
    if let Some(expected_action) = cli.expected_action {
        config.expected_action = expected_action;
    }
    if cli.verification_optional {
        config.verification_required = false;
    }

    init_logging(config.log_format, &config.log_level);

    // Verifier identity and bypass switches come from the environment,
    // matching how deployments inject secrets.
    let gate_config = GateConfig::from_env();
    let pat_config = PatConfig::from_env();
    let recaptcha_config = RecaptchaConfig::from_env();

    if gate_config.bypass() {
        tracing::warn!(
            source = gate_config.bypass_source().unwrap_or("config"),
            "verification bypass is enabled, every request will be admitted"
        );
    }
    if !pat_config.is_configured() {
        tracing::info!(
            "no Private Access Token relay identity configured, \
             proof tokens fall back to score verification"
        );
    }
    if !recaptcha_config.is_configured() {
        tracing::warn!("no scoring secret configured, score verification will deny");
    }

    let policy = VerificationPolicy::new()
        .with_expected_action(config.expected_action.clone())
        .with_min_score(recaptcha_config.default_min_score())
        .with_required(config.verification_required);

    let metrics = Arc::new(GateMetrics::new());
    let gate = HumanVerificationGate::new(
        gate_config,
        PatVerifier::new(pat_config),
        RecaptchaVerifier::new(recaptcha_config),
    )
    .with_telemetry(metrics.clone());

    tracing::info!(
        listen_addr = %config.listen_addr,
        expected_action = %config.expected_action,
        required = config.verification_required,
        "starting portcullis"
    );

    let state = AppState::new(Arc::new(gate), policy, metrics);
    portcullis_service::run(&config, state).await?;

    Ok(())
}
