mod simulate;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use blockworld_relay::{
    AccountTokenSource, AppMessage, CompanionSink, OutboundMessage, Relay, RelayError,
    ReqwestTransport,
};
use blockworld_viewer::ViewerConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::simulate::{Script, SimulateOptions};

#[derive(Parser)]
#[command(name = "blockworld-cli", about = "CLI tool for blockworld operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML viewer config; defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the effective viewer config
    Info,
    /// Run the viewer headless against a scripted event sequence
    Simulate {
        /// YAML event script
        #[arg(short, long)]
        script: Option<PathBuf>,
        /// Frames to render after the script finishes
        #[arg(short, long, default_value = "3")]
        frames: u64,
        /// Simulated time between frames, in milliseconds
        #[arg(long, default_value = "16")]
        frame_ms: u64,
        /// Print every rendered frame
        #[arg(long)]
        print_frames: bool,
    },
    /// Forward one companion message to its endpoint
    Relay {
        /// Endpoint URL; the last path segment picks the method
        #[arg(long)]
        url: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        score: Option<i64>,
        #[arg(long)]
        mac: Option<String>,
        #[arg(long)]
        nonce: Option<String>,
        /// Account token attached to submissions
        #[arg(long, default_value = "")]
        token: String,
        /// Request timeout in seconds
        #[arg(long, default_value = "10")]
        timeout: u64,
    },
}

struct StaticToken(String);

impl AccountTokenSource for StaticToken {
    fn account_token(&self) -> String {
        self.0.clone()
    }
}

/// Companion channel that writes each message to stdout as JSON.
struct StdoutCompanion;

impl CompanionSink for StdoutCompanion {
    fn send(&mut self, message: OutboundMessage) -> Result<(), RelayError> {
        println!("{}", serde_json::to_string(&message)?);
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("blockworld-cli v{}", env!("CARGO_PKG_VERSION"));
            print!("{}", serde_yaml::to_string(&config)?);
        }
        Commands::Simulate {
            script,
            frames,
            frame_ms,
            print_frames,
        } => {
            let script = match script {
                Some(path) => Script::load(&path)?,
                None => Script::default(),
            };
            let options = SimulateOptions {
                trailing_frames: frames,
                frame_interval: Duration::from_millis(frame_ms),
                print_frames,
            };
            let summary = simulate::run(config, &script, &options)?;

            println!("Frames: {}", summary.frames);
            println!(
                "Capture: {:?} ({} request(s))",
                summary.capture_state, summary.capture_requests
            );
            println!(
                "Position: ({:.1}, {:.1}, {:.1})",
                summary.position.x, summary.position.y, summary.position.z
            );
            println!("World edits: {:?}", summary.actions);
            for warning in &summary.warnings {
                println!("Warning: {warning}");
            }
            if !print_frames {
                if let Some(frame) = &summary.last_frame {
                    print!("{frame}");
                }
            }
        }
        Commands::Relay {
            url,
            name,
            score,
            mac,
            nonce,
            token,
            timeout,
        } => {
            let message = AppMessage {
                url,
                name,
                score,
                mac,
                nonce,
            };
            let transport = ReqwestTransport::new(Duration::from_secs(timeout))?;
            let mut relay = Relay::new(transport, StaticToken(token), StdoutCompanion);
            let outcome = relay
                .handle(&message)
                .with_context(|| format!("relaying to {}", message.url))?;
            println!("{outcome:?}");
        }
    }

    Ok(())
}
