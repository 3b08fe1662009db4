//! Domain Map CLI
//!
//! Manage domains and aliases, resolve hostnames, and serve the admin API.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use domainmap::commands;
use domainmap_api::models::UpdateDomainRequest;
use domainmap_api::{ApiServer, ApiServerConfig};
use domainmap_router::DomainRecord;
use domainmap_store::{default_state_path, SnapshotStore};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("DOMAINMAP_GIT_HASH"),
    ", built ",
    env!("DOMAINMAP_BUILD_TIME"),
    ")"
);

/// Domain Map - Map incoming hostnames to configured domains
#[derive(Parser, Debug)]
#[command(name = "domainmap")]
#[command(about = "Domain Map - Map incoming hostnames to configured domains")]
#[command(version, long_version = LONG_VERSION)]
struct Cli {
    /// Snapshot file holding domains and aliases (default: ~/.domainmap/state.json)
    #[arg(long, env = "DOMAINMAP_STATE", global = true)]
    state: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the admin REST API
    #[command(long_about = r#"
Serve the admin REST API. Changes made through the API are written back
to the snapshot file.

EXAMPLES:
  domainmap serve --bind 0.0.0.0:8080

ENVIRONMENT VARIABLES:
  DOMAINMAP_STATE  Snapshot file
  DOMAINMAP_BIND   Address to bind
    "#)]
    Serve {
        /// Address to bind the API server
        #[arg(long, env = "DOMAINMAP_BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,

        /// Disable CORS for localhost origins
        #[arg(long)]
        no_cors: bool,
    },

    /// Resolve a hostname and print the result as JSON
    Resolve {
        /// Hostname to resolve (may include a port)
        host: String,
    },

    /// Print the diagnostic report for a hostname
    Report {
        /// Hostname as it would appear in the Host header
        host: String,
    },

    /// Manage domains
    #[command(subcommand)]
    Domain(DomainCommands),

    /// Manage aliases
    #[command(subcommand)]
    Alias(AliasCommands),
}

#[derive(Subcommand, Debug)]
enum DomainCommands {
    /// Add a domain
    Add {
        /// Domain id
        id: String,
        /// Canonical hostname
        hostname: String,
        /// Display name
        #[arg(long)]
        name: Option<String>,
        /// Make this the default domain
        #[arg(long)]
        default: bool,
        /// Add the domain disabled
        #[arg(long)]
        disabled: bool,
    },

    /// Edit a domain
    Edit(EditDomainArgs),

    /// List domains
    List,

    /// Remove a domain (fails while aliases point at it)
    Remove {
        /// Domain id
        id: String,
    },

    /// Make a domain the default, clearing the previous default
    SetDefault {
        /// Domain id
        id: String,
    },
}

#[derive(Args, Debug)]
struct EditDomainArgs {
    /// Domain id
    id: String,
    /// New hostname
    #[arg(long)]
    hostname: Option<String>,
    /// New display name
    #[arg(long)]
    name: Option<String>,
    /// Enable the domain
    #[arg(long, conflicts_with = "disable")]
    enable: bool,
    /// Disable the domain
    #[arg(long)]
    disable: bool,
}

impl EditDomainArgs {
    fn enabled(&self) -> Option<bool> {
        match (self.enable, self.disable) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Subcommand, Debug)]
enum AliasCommands {
    /// Add an alias
    Add {
        /// Alias id
        id: String,
        /// Target domain id
        domain_id: String,
        /// Hostname pattern, `*` matches one label
        pattern: String,
        /// Redirect matching hosts to the target domain's hostname
        #[arg(long)]
        redirect: bool,
    },

    /// List aliases
    List {
        /// Only aliases targeting this domain
        #[arg(long)]
        domain: Option<String>,
    },

    /// Remove an alias
    Remove {
        /// Alias id
        id: String,
    },
}

fn setup_logging(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .context("Failed to initialize logging filter")?;

    // stdout carries command output
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level)?;

    let path = match cli.state {
        Some(path) => path,
        None => default_state_path()?,
    };
    let store = SnapshotStore::new(path);

    match cli.command {
        Commands::Serve { bind, no_cors } => {
            let map = store.load_map()?;
            info!(
                "Loaded {} domains from {}",
                map.domains().len(),
                store.path().display()
            );

            let config = ApiServerConfig {
                bind_addr: bind,
                enable_cors: !no_cors,
            };
            ApiServer::new(config, Arc::new(map), Some(store))
                .start()
                .await?;
        }
        Commands::Resolve { host } => {
            let result = commands::resolve(&store, &host)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Report { host } => {
            print!("{}", commands::report(&store, &host)?);
        }
        Commands::Domain(command) => run_domain_command(&store, command)?,
        Commands::Alias(command) => run_alias_command(&store, command)?,
    }

    Ok(())
}

fn run_domain_command(store: &SnapshotStore, command: DomainCommands) -> Result<()> {
    match command {
        DomainCommands::Add {
            id,
            hostname,
            name,
            default,
            disabled,
        } => {
            let mut record = DomainRecord::new(id, hostname).with_enabled(!disabled);
            if let Some(name) = name {
                record = record.with_name(name);
            }
            if default {
                record = record.as_default();
            }
            let record = commands::add_domain(store, record)?;
            println!("✅ Domain '{}' added ({})", record.id, record.hostname);
        }
        DomainCommands::Edit(args) => {
            let edit = UpdateDomainRequest {
                hostname: args.hostname.clone(),
                name: args.name.clone(),
                enabled: args.enabled(),
            };
            let record = commands::edit_domain(store, &args.id, edit)?;
            println!("✅ Domain '{}' updated", record.id);
        }
        DomainCommands::List => print!("{}", commands::list_domains(store)?),
        DomainCommands::Remove { id } => {
            commands::remove_domain(store, &id)?;
            println!("✅ Domain '{}' removed", id);
        }
        DomainCommands::SetDefault { id } => {
            commands::set_default(store, &id)?;
            println!("✅ Domain '{}' is now the default", id);
        }
    }
    Ok(())
}

fn run_alias_command(store: &SnapshotStore, command: AliasCommands) -> Result<()> {
    match command {
        AliasCommands::Add {
            id,
            domain_id,
            pattern,
            redirect,
        } => {
            let alias = commands::add_alias(store, &id, &domain_id, &pattern, redirect)?;
            println!(
                "✅ Alias '{}' added: {} -> {}",
                alias.id, alias.pattern, alias.domain_id
            );
        }
        AliasCommands::List { domain } => {
            print!("{}", commands::list_aliases(store, domain.as_deref())?)
        }
        AliasCommands::Remove { id } => {
            commands::remove_alias(store, &id)?;
            println!("✅ Alias '{}' removed", id);
        }
    }
    Ok(())
}
