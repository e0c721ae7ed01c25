use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use http::Method;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::dao::DaoRegistry;
use crate::daos::EchoDao;
use crate::router::Routed;
use crate::server::{AppService, CrudRequest};

/// Command-line interface for crudrouter
#[derive(Parser, Debug)]
#[command(name = "crudrouter")]
#[command(about = "Inspect and exercise a crudrouter configuration", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a configuration and list its resources
    Check {
        /// Path to the YAML configuration
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Dispatch one request against echo DAOs and show the routing decision
    Route {
        /// Path to the YAML configuration
        #[arg(short, long)]
        config: PathBuf,

        /// HTTP method (GET, POST, ...)
        method: String,

        /// Request target, optionally with a query string
        path: String,

        /// JSON request body
        #[arg(long)]
        body: Option<String>,

        /// Accept header to negotiate the response format
        #[arg(long)]
        accept: Option<String>,
    },
}

/// Build the application from `path`, binding an [`EchoDao`] to every resource.
fn echo_service(path: &Path) -> Result<(AppConfig, AppService)> {
    let config = AppConfig::load(path)?;
    let daos = DaoRegistry::from_factory(config.resources.all_names(), |name| EchoDao::new(name));
    let service = AppService::from_config(&config, &daos)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok((config, service))
}

fn check(config: &Path) -> Result<()> {
    let (cfg, service) = echo_service(config)?;
    println!("navigation: {}", service.router().navigation());
    println!("resources:");
    for name in cfg.resources.all_names() {
        println!("  - {name}");
    }
    println!("configuration OK");
    Ok(())
}

fn route(
    config: &Path,
    method: &str,
    target: &str,
    body: Option<&str>,
    accept: Option<&str>,
) -> Result<()> {
    let (_, service) = echo_service(config)?;
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("Invalid method '{method}'"))?;

    let mut req = CrudRequest::new(method, target);
    if let Some(body) = body {
        req = req
            .with_header("Content-Type", "application/json")
            .with_body(body.as_bytes().to_vec());
    }
    if let Some(accept) = accept {
        req = req.with_header("Accept", accept);
    }

    match service.router().route(&req.path) {
        Ok(Routed::Root(_)) => println!("route: root handler"),
        Ok(Routed::Node(m)) => {
            println!("node: {}", m.node.name());
            println!("url_params: {}", serde_json::to_string(&m.url_params)?);
            println!("bulk: {}", m.flags.bulk);
            match m.node.select(&m.url_params, m.flags) {
                Ok(controller) => println!("controller: {}", controller.kind()),
                Err(err) => println!("controller: none ({err})"),
            }
        }
        Err(err) => println!("route: {err}"),
    }

    let res = service.handle(req);
    println!("status: {} {}", res.status, res.reason());
    for (name, value) in &res.headers {
        println!("{name}: {value}");
    }
    if let Some(body) = res.body_str().filter(|b| !b.is_empty()) {
        println!();
        println!("{body}");
    }
    Ok(())
}

/// Parse the process arguments and run the selected command.
pub fn run_cli() -> Result<()> {
    run(Cli::parse())
}

pub fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Check { config } => check(config),
        Commands::Route {
            config,
            method,
            path,
            body,
            accept,
        } => route(config, method, path, body.as_deref(), accept.as_deref()),
    }
}
