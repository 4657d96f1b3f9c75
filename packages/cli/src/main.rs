#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line host for the map parser functions.
//!
//! Renders an invocation the way a wiki page would
//! (`wikimap render "Paris~Home;48.8,2.3|service=layers"`) and lists the
//! map services and geoservices the pipeline knows about.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use wikimap_geocoder::registry::GeocoderRegistry;
use wikimap_geocoder::service_registry;
use wikimap_request::MapsParserFunctions;
use wikimap_request::config::MapsConfig;
use wikimap_request::render::RendererRegistry;
use wikimap_request::services::ServiceRegistry;
use wikimap_request_models::split_invocation;

const USER_AGENT: &str = concat!("wikimap/", env!("CARGO_PKG_VERSION"));

/// Render wiki map invocations from the command line.
#[derive(Parser)]
#[command(name = "wikimap")]
#[command(about = "Render wiki map invocations from the command line")]
struct Cli {
    /// Configuration file (defaults to the built-in configuration).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one invocation and print the resulting markup.
    Render {
        /// Macro to run (`display_map`, `display_point`, `display_points`,
        /// `display_address`, `display_addresses`).
        #[arg(long, default_value = "display_points")]
        entry_point: String,

        /// Print the full output (text, flags and outcome) as JSON.
        #[arg(long)]
        json: bool,

        /// Raw parameters. A single argument containing `|` is split like
        /// a wiki invocation.
        #[arg(allow_hyphen_values = true)]
        params: Vec<String>,
    },

    /// List the known map services.
    Services,

    /// List the configured geoservices.
    Geoservices,

    /// Report whether each token is a coordinate pair.
    CheckCoords {
        /// Tokens to check, e.g. `"48.85, 2.35"` or `"55° 45' N, 37° 37' E"`.
        #[arg(allow_hyphen_values = true)]
        tokens: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = MapsConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Render {
            entry_point,
            json,
            params,
        } => cmd_render(config, &entry_point, json, &params).await,
        Commands::Services => cmd_services(&config),
        Commands::Geoservices => {
            cmd_geoservices(&config);
            Ok(())
        }
        Commands::CheckCoords { tokens } => {
            cmd_check_coords(&tokens);
            Ok(())
        }
    }
}

/// Expands the command-line parameters into raw parameter strings.
fn expand_params(params: &[String]) -> Vec<String> {
    match params {
        [single] if single.contains('|') => split_invocation(single),
        _ => params.to_vec(),
    }
}

async fn cmd_render(
    config: MapsConfig,
    entry_point: &str,
    json: bool,
    params: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let services = ServiceRegistry::from_config(&config)?;

    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
    let mut geocoders = GeocoderRegistry::from_services(
        &client,
        &service_registry::enabled_services(),
        &config.default_geoservice,
    );
    services.apply_geoservice_preferences(&mut geocoders);

    let renderers = RendererRegistry::with_defaults(&services);
    let functions = MapsParserFunctions::new(config, services, renderers, Arc::new(geocoders));

    let raw_params = expand_params(params);
    log::debug!("Rendering {entry_point} with {} parameters", raw_params.len());
    let output = functions.build_output(&raw_params, entry_point).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", output.text);
    }

    Ok(())
}

fn cmd_services(config: &MapsConfig) -> Result<(), Box<dyn std::error::Error>> {
    let services = ServiceRegistry::from_config(config)?;

    println!("{:<12} {:<22} {:<10} ENTRY POINTS", "ID", "ALIASES", "GEOSERVICE");
    for service in services.services() {
        let entry_points: Vec<String> =
            service.entry_points.iter().map(ToString::to_string).collect();
        let marker = if service.id == services.default_service() {
            " (default)"
        } else {
            ""
        };
        println!(
            "{:<12} {:<22} {:<10} {}{marker}",
            service.id,
            service.aliases.join(","),
            service.geoservice.as_deref().unwrap_or("-"),
            entry_points.join(",")
        );
    }

    Ok(())
}

fn cmd_geoservices(config: &MapsConfig) {
    println!("{:<12} {:<8} {:<26} BASE URL", "ID", "ENABLED", "ALIASES");
    for service in service_registry::all_services() {
        let marker = if service.answers_to(&config.default_geoservice) {
            " (default)"
        } else {
            ""
        };
        println!(
            "{:<12} {:<8} {:<26} {}{marker}",
            service.id,
            service.enabled,
            service.aliases.join(","),
            service.base_url()
        );
    }
}

fn cmd_check_coords(tokens: &[String]) {
    for token in tokens {
        match wikimap_coords::parse_coordinate(token) {
            Some(lat_lng) => println!("{token:?}: valid ({lat_lng})"),
            None => println!("{token:?}: invalid"),
        }
    }
}
