use std::time::Duration;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use termify::{cli, config::AuthConfig};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth(AuthOptions),

    /// Show stored token state
    Status,

    /// Print the currently playing track
    NowPlaying(NowPlayingOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct AuthOptions {
    /// Run the browser flow even if a valid token is stored
    #[clap(long)]
    pub force: bool,

    /// Give up waiting for the browser callback after this many seconds
    #[clap(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(Parser, Debug, Clone)]
pub struct NowPlayingOptions {
    /// Polling interval in milliseconds
    #[clap(long, default_value_t = 200)]
    pub interval_ms: u64,

    /// Fetch once and exit
    #[clap(long)]
    pub once: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AuthConfig::from_env();

    match cli.command {
        Command::Auth(opt) => {
            let config = match opt.timeout_secs {
                Some(secs) => config.with_callback_timeout(Duration::from_secs(secs)),
                None => config,
            };
            cli::auth(config, opt.force).await
        }
        Command::Status => cli::status(config).await,
        Command::NowPlaying(opt) => {
            cli::now_playing(config, Duration::from_millis(opt.interval_ms), opt.once).await
        }
        Command::Completions(opt) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
