//! Redirect gateway.
//!
//! Sits in front of a blogging/CMS application and enforces its canonical
//! origins before any routing happens.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ legacy aliases ──▶ admin marker ──▶ url redirects ──▶ upstream CMS
//!                          │                                   │
//!     ◀──── 301 ───────────┴───────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use redirect_gateway::config::load_config;
use redirect_gateway::lifecycle::startup;

#[derive(Parser)]
#[command(name = "redirect-gateway")]
#[command(about = "Blog/admin origin redirect gateway", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long, requires = "config")]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.check {
        if let Some(path) = cli.config.as_deref() {
            load_config(path)?;
            println!("{}: ok", path.display());
        }
        return Ok(());
    }

    startup::start(cli.config.as_deref()).await
}
