use anyhow::{Context, bail};
use clap::{ArgAction, Parser};
use core::time::Duration;
use fluxflix::Cadence;

/// Runtime configuration for the `fluxflix-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file is loaded first when present), with defaults suitable for a
/// local demo.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fluxflix-server",
    version,
    about = "An HTTP service for browsing movies and following their event feeds"
)]
pub struct CliArgs {
    /// Address to listen on (TCP or Unix socket path; use --uds for Unix socket).
    ///
    /// Example: "0.0.0.0:8080" or "/tmp/fluxflix.sock"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub server_addr: String,

    /// Listen on a Unix socket instead of TCP. If set, `SERVER_ADDR` must be a file path.
    #[arg(short, long, default_value_t = false)]
    pub uds: bool,

    /// Default spacing, in milliseconds, between events on a movie's feed.
    ///
    /// Individual requests may override it with the `cadence_ms` query
    /// parameter. Must be greater than 0.
    ///
    /// Environment variable: `EVENT_CADENCE_MS`
    #[arg(
        long,
        env = "EVENT_CADENCE_MS",
        default_value_t = 1000,
        allow_negative_numbers = true
    )]
    pub event_cadence_ms: i64,

    /// Interval, in seconds, between SSE keep-alive comments on an idle
    /// connection.
    ///
    /// Environment variable: `SSE_KEEP_ALIVE_SECS`
    #[arg(long, env = "SSE_KEEP_ALIVE_SECS", default_value_t = 15)]
    pub sse_keep_alive_secs: u64,

    /// Seconds to wait for open event streams to close during shutdown.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 3)]
    pub shutdown_timeout: u64,

    /// Replace the catalog with the demo titles at startup.
    ///
    /// Environment variable: `SEED_DEMO_DATA`
    #[arg(long, env = "SEED_DEMO_DATA", default_value_t = true, action = ArgAction::Set)]
    pub seed_demo_data: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub uds: bool,
    pub cadence: Cadence,
    pub keep_alive: Duration,
    pub shutdown_timeout: Duration,
    pub seed_demo_data: bool,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let cadence = Cadence::from_millis(args.event_cadence_ms)
            .context("EVENT_CADENCE_MS must be greater than 0")?;

        if args.sse_keep_alive_secs == 0 {
            bail!("SSE_KEEP_ALIVE_SECS must be greater than 0");
        }

        Ok(Self {
            server_addr: args.server_addr,
            uds: args.uds,
            cadence,
            keep_alive: Duration::from_secs(args.sse_keep_alive_secs),
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
            seed_demo_data: args.seed_demo_data,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_addr: String::from("0.0.0.0:8080"),
            uds: false,
            cadence: Cadence::default(),
            keep_alive: Duration::from_secs(15),
            shutdown_timeout: Duration::from_secs(3),
            seed_demo_data: true,
        }
    }
}
