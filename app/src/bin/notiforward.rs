//! Forward Discord desktop notifications to a push endpoint.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use discord_push_lib::forward::config::{self, DEFAULT_APP_MATCH};
use discord_push_lib::forward::{self, ForwardConfig, Format};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to config.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Write the config file
    Setup {
        /// Push endpoint URL, e.g. https://ntfy.sh/your-topic
        #[arg(long)]
        endpoint: String,

        /// Log every forwarded notification
        #[arg(long)]
        logging: bool,

        /// Text identifying the app's notifications
        #[arg(long, default_value = DEFAULT_APP_MATCH)]
        app_match: String,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Forward notifications (service mode)
    Run,
    /// Print a systemd user unit
    ServiceUnit,
    /// Delete the config file
    Reset,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let path = args.config.unwrap_or_else(ForwardConfig::default_path);

    match args.command {
        Cmd::Setup {
            endpoint,
            logging,
            app_match,
            format,
        } => {
            let config = ForwardConfig {
                endpoint,
                logging,
                app_match,
                format,
            };
            config
                .save(&path)
                .with_context(|| format!("write {}", path.display()))?;
            println!("Saved {}", path.display());
        }
        Cmd::Run => {
            let config = ForwardConfig::load(&path)
                .with_context(|| format!("load {} (run `notiforward setup` first)", path.display()))?;
            init_tracing(config.logging);

            let shutdown = CancellationToken::new();
            let token = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    token.cancel();
                }
            });
            forward::run(&config, shutdown).await?;
        }
        Cmd::ServiceUnit => {
            let exe = std::env::current_exe().context("locate executable")?;
            print!("{}", forward::service_unit(&exe, &runtime_dir()));
        }
        Cmd::Reset => {
            if config::reset(&path)? {
                println!("Removed {}", path.display());
            } else {
                println!("No config at {}", path.display());
            }
        }
    }
    Ok(())
}

fn runtime_dir() -> String {
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        return dir;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        if let Ok(meta) = std::fs::metadata("/proc/self") {
            return format!("/run/user/{}", meta.uid());
        }
    }
    "/run/user/1000".to_string()
}
