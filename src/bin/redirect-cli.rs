use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use redirect_gateway::config::load_config;
use redirect_gateway::redirect::site_url::split_path_and_query;
use redirect_gateway::redirect::{resolve, Decision, LegacyRedirects, RequestDescriptor, Site, Target};

#[derive(Parser)]
#[command(name = "redirect-cli")]
#[command(about = "Inspect redirect decisions for a gateway configuration", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration file
    Check,
    /// Show the redirect decision for a request
    Resolve {
        /// Request Host header; omit to simulate a missing header
        #[arg(long)]
        host: Option<String>,
        /// Path and query as received
        #[arg(long, default_value = "/")]
        path: String,
        /// Request arrived over TLS
        #[arg(long)]
        secure: bool,
        /// Resolve against the admin target
        #[arg(long)]
        admin: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let site = Site::from_config(&config.site)?;

    let output = match cli.command {
        Commands::Check => json!({
            "config": cli.config.display().to_string(),
            "public_url": site.public_url().to_string(),
            "admin_url": site.admin_url().to_string(),
            "admin_entry": site.admin_entry(),
            "distinct_admin_host": site.has_distinct_admin_host(),
        }),
        Commands::Resolve { host, path, secure, admin } => {
            let descriptor = RequestDescriptor::new(host.as_deref(), path, secure);
            resolve_request(&site, &descriptor, admin)
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn resolve_request(site: &Site, descriptor: &RequestDescriptor, admin: bool) -> Value {
    let (path, _) = split_path_and_query(&descriptor.original_url);
    let decision = LegacyRedirects::for_site(site)
        .lookup(path)
        .map(Decision::Redirect)
        .unwrap_or_else(|| {
            let target = if admin { Target::Admin } else { Target::Blog };
            resolve(site, target, descriptor)
        });

    match decision {
        Decision::Continue => json!({ "decision": "continue" }),
        Decision::Redirect(redirect) => json!({
            "decision": "redirect",
            "status": redirect.status.as_u16(),
            "location": redirect.location,
            "cache_control": redirect.cache_control.header_value(),
            "reason": redirect.reason.as_str(),
        }),
    }
}
