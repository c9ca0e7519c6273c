//! lemonade entry point.
//!
//! One binary plays both roles:
//!
//! - `lemonade server` runs the endpoint on the desktop.
//! - `lemonade open|copy|paste` (or the `xdg-open`, `pbcopy`, `pbpaste`
//!   aliases) run the client on a remote shell.
//!
//! # Usage
//!
//! ```text
//! lemonade [OPTIONS] <open|copy|paste|server> [PAYLOAD]
//!
//! Options:
//!   --host <HOST>              Endpoint host [default: localhost]
//!   --port <PORT>              Endpoint port [default: 2489]
//!   --allow <CIDRS>            Server: allowed peer ranges [default: 0.0.0.0/0,::/0]
//!   --line-ending <lf|crlf>    Convert line endings of pasted/copied text
//!   --trans-loopback[=BOOL]    Rewrite loopback URLs to the caller [default: true]
//!   --trans-localfile[=BOOL]   Serve local files over HTTP [default: true]
//!   --no-fallback-messages     Do not log before falling back to a local endpoint
//!   --log-level <0-4>          0 debug, 1 info, 2 warn, 3 error, 4 critical [default: 1]
//!   --file-timeout <SECS>      Wait for an exposed file to be fetched [default: 30]
//! ```
//!
//! Every option can also be set in `~/.config/lemonade.toml`; command-line
//! values win.  `RUST_LOG` overrides `--log-level`.
//!
//! # Exit status
//!
//! `0` success, `11` bad command line or config, `12` transport or remote
//! failure, `13` help requested.

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use lemonade::application::{dispatch, DispatchOutcome, ExitStatus};
use lemonade::infrastructure::desktop::SystemDesktop;
use lemonade::infrastructure::server::{serve, LocalEndpoint};
use lemonade::infrastructure::storage::{load_config, FileConfig};
use lemonade::infrastructure::transport::TransportClient;
use lemonade_core::domain::config::{DEFAULT_FILE_FETCH_TIMEOUT, DEFAULT_HOST, DEFAULT_PORT};
use lemonade_core::{
    resolve_command, Action, AllowList, ClientConfig, Invocation, LineEnding, ServerConfig,
    TransportEndpoint, USAGE,
};

const DEFAULT_LOG_LEVEL: u8 = 1;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Flags left over once the action token has been removed.
///
/// Every flag is optional so that an unset flag can fall through to the
/// config file.  Help is handled by hand to keep lemonade's own usage text
/// and exit status.
#[derive(Debug, Parser)]
#[command(name = "lemonade", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Comma-separated CIDR ranges allowed to connect to the server.
    #[arg(long)]
    allow: Option<String>,

    /// `lf`, `crlf`, or empty for no conversion.
    #[arg(long)]
    line_ending: Option<String>,

    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    trans_loopback: Option<bool>,

    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    trans_localfile: Option<bool>,

    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    no_fallback_messages: Option<bool>,

    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=4))]
    log_level: Option<u8>,

    /// Seconds to wait for the endpoint to fetch an exposed local file.
    #[arg(long)]
    file_timeout: Option<u64>,

    #[arg(short = 'h', long = "help")]
    help: bool,

    /// URL, path or text; read from stdin when absent.
    args: Vec<String>,
}

/// Effective settings after layering flags over the config file.
#[derive(Debug)]
struct Settings {
    client: ClientConfig,
    server: ServerConfig,
    trans_loopback: bool,
    trans_localfile: bool,
    log_level: u8,
}

impl Cli {
    /// Merges flags over `file` over the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the allow-list does not parse.
    fn to_settings(&self, file: &FileConfig) -> anyhow::Result<Settings> {
        let host = self
            .host
            .clone()
            .or_else(|| file.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = self.port.or(file.port).unwrap_or(DEFAULT_PORT);

        let line_ending = self
            .line_ending
            .as_deref()
            .or(file.line_ending.as_deref())
            .and_then(LineEnding::from_option);

        let allow = match self.allow.as_deref().or(file.allow.as_deref()) {
            Some(list) => AllowList::parse(list)
                .with_context(|| format!("invalid --allow value '{list}'"))?,
            None => AllowList::default(),
        };

        let file_fetch_timeout = self
            .file_timeout
            .or(file.file_timeout)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_FILE_FETCH_TIMEOUT);

        Ok(Settings {
            client: ClientConfig {
                endpoint: TransportEndpoint::new(host, port),
                line_ending,
                no_fallback_messages: self
                    .no_fallback_messages
                    .or(file.no_fallback_messages)
                    .unwrap_or(false),
                file_fetch_timeout,
            },
            server: ServerConfig {
                port,
                allow,
                line_ending,
            },
            trans_loopback: self.trans_loopback.or(file.trans_loopback).unwrap_or(true),
            trans_localfile: self.trans_localfile.or(file.trans_localfile).unwrap_or(true),
            log_level: self.log_level.or(file.log_level).unwrap_or(DEFAULT_LOG_LEVEL),
        })
    }
}

fn wants_help(args: &[String]) -> bool {
    args.iter().skip(1).any(|a| a == "--help" || a == "-h")
}

/// Maps lemonade's 0-4 log level onto a `tracing` filter directive.
fn level_directive(level: u8) -> &'static str {
    match level {
        0 => "debug",
        1 => "info",
        2 => "warn",
        _ => "error",
    }
}

/// Logs go to stderr so `paste` output on stdout stays clean.
fn init_logging(level: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(level)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args().collect();
    ExitCode::from(run(argv).await.code())
}

async fn run(argv: Vec<String>) -> ExitStatus {
    let resolved = match resolve_command(&argv) {
        Ok(resolved) => resolved,
        Err(_) if wants_help(&argv) => {
            eprintln!("{USAGE}");
            return ExitStatus::Help;
        }
        Err(e) => {
            eprintln!("{e}");
            return ExitStatus::FlagParseError;
        }
    };

    let cli = match Cli::try_parse_from(&resolved.args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}");
            return ExitStatus::FlagParseError;
        }
    };
    if cli.help {
        eprintln!("{USAGE}");
        return ExitStatus::Help;
    }

    let settings = match load_config()
        .context("failed to load lemonade.toml")
        .and_then(|file| cli.to_settings(&file))
    {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitStatus::FlagParseError;
        }
    };
    init_logging(settings.log_level);
    debug!("resolved {:?} ({:?} style)", resolved.action, resolved.style);

    if resolved.action == Action::Serve {
        return match run_server(settings.server).await {
            Ok(()) => ExitStatus::Success,
            Err(e) => {
                eprintln!("{e:#}");
                ExitStatus::RpcError
            }
        };
    }

    let invocation = match Invocation::from_parts(
        resolved.action,
        &cli.args,
        settings.trans_localfile,
        settings.trans_loopback,
        &mut std::io::stdin().lock(),
    ) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("failed to read stdin: {e}");
            return ExitStatus::FlagParseError;
        }
    };

    let local_host = Arc::new(LocalEndpoint::new(
        Arc::new(SystemDesktop::short_lived()),
        settings.client.line_ending,
    ));
    let client = TransportClient::new(settings.client, local_host);

    match dispatch(&invocation, &client).await {
        Ok(DispatchOutcome::Done) => ExitStatus::Success,
        Ok(DispatchOutcome::Pasted(text)) => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
                eprintln!("failed to write to stdout: {e}");
                return ExitStatus::RpcError;
            }
            ExitStatus::Success
        }
        Err(e) => {
            eprintln!("{e}");
            ExitStatus::RpcError
        }
    }
}

/// Runs the endpoint until Ctrl+C.
async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    info!(
        "lemonade endpoint starting on port {} (allow: {})",
        config.port,
        config
            .allow
            .ranges()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    );

    tokio::select! {
        result = serve(config, Arc::new(SystemDesktop::new())) => {
            result.context("endpoint stopped")?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl+C")?;
            info!("received Ctrl+C; shutting down");
        }
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
