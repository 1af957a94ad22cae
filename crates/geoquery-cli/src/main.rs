mod geojson;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use geoquery_ai::{AgentConfig, Agents, Collaborators, MapRenderer, Terrain};
use geoquery_client::{ChatClient, IsochroneClient, RoutingClient};
use geoquery_core::geometry::generate_circle;
use geoquery_core::protocol::format_coordinates;
use geoquery_core::{Coordinate, Geometry, SelectedFeature, parse_coordinates, parse_rings};
use geoquery_host::{FixedPosition, Session, SharedSelection};

use crate::geojson::GeoJsonRenderer;

#[derive(Parser)]
#[command(name = "geoquery", version, about = "Natural-language map queries to geometries")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a query without calling any service
    Classify {
        /// The user's query
        text: String,
        /// The AI answer shown alongside the query
        #[arg(long, default_value = "")]
        ai: String,
    },
    /// Extract coordinates from free text
    Parse {
        text: String,
        /// Split on `||` and print one ring per line
        #[arg(long)]
        rings: bool,
    },
    /// Print a buffer ring as GeoJSON
    Circle {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long)]
        radius_km: f64,
        #[arg(long, default_value_t = 64)]
        points: usize,
    },
    /// Run a full turn against the configured services and print GeoJSON
    Ask {
        text: String,
        #[arg(long, default_value = "")]
        ai: String,
        /// User position as `lat,lon`
        #[arg(long, allow_hyphen_values = true)]
        position: Option<String>,
        /// Map viewport centre as `lat,lon`
        #[arg(long, allow_hyphen_values = true)]
        viewport: Option<String>,
        /// Selected feature: one `lat,lon` for a marker, several for a line
        #[arg(long, allow_hyphen_values = true)]
        selected: Option<String>,
        #[command(flatten)]
        services: Services,
    },
}

#[derive(clap::Args)]
struct Services {
    /// OpenAI-compatible API root
    #[arg(long, env = "GEOQUERY_LLM_URL", default_value = "https://api.openai.com/v1")]
    llm_url: String,
    #[arg(long, env = "GEOQUERY_LLM_MODEL", default_value = "gpt-4o-mini")]
    llm_model: String,
    #[arg(long, env = "GEOQUERY_LLM_API_KEY", hide_env_values = true)]
    llm_api_key: Option<String>,
    #[arg(long, env = "GEOQUERY_ROUTING_URL", default_value = "https://router.project-osrm.org")]
    routing_url: String,
    #[arg(long, env = "GEOQUERY_ISOCHRONE_URL", default_value = "https://api.mapbox.com")]
    isochrone_url: String,
    #[arg(long, env = "GEOQUERY_MAP_TOKEN", hide_env_values = true, default_value = "")]
    map_token: String,
    /// JSON file overriding agent defaults
    #[arg(long, env = "GEOQUERY_CONFIG")]
    config: Option<PathBuf>,
}

/// Terrain source for the CLI: no elevation data.
struct NoTerrain;

impl Terrain for NoTerrain {
    fn elevation_at(&self, _coord: Coordinate) -> Option<f64> {
        None
    }
}

fn coordinate_arg(name: &str, value: Option<&str>) -> anyhow::Result<Option<Coordinate>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let coords = parse_coordinates(value).with_context(|| format!("--{name} {value:?}"))?;
    Ok(coords.first().copied())
}

fn selection_arg(value: Option<&str>) -> anyhow::Result<Option<SelectedFeature>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let coords = parse_coordinates(value).with_context(|| format!("--selected {value:?}"))?;
    Ok(Some(match coords.as_slice() {
        [coord] => SelectedFeature::Marker { coord: *coord },
        _ => SelectedFeature::Line { coords },
    }))
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::debug!("geoquery v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    match cli.command {
        Command::Classify { text, ai } => {
            let classification = geoquery_ai::classify(&text, &ai);
            print_json(&serde_json::to_value(classification)?)?;
        }
        Command::Parse { text, rings } => {
            if rings {
                let rings = parse_rings(&text);
                anyhow::ensure!(!rings.is_empty(), "no rings found");
                for ring in &rings {
                    println!("{}", format_coordinates(ring));
                }
            } else {
                let coords = parse_coordinates(&text)?;
                println!("{}", format_coordinates(&coords));
            }
        }
        Command::Circle {
            lat,
            lon,
            radius_km,
            points,
        } => {
            let center = Coordinate::new(lat, lon)?;
            let ring = generate_circle(center, radius_km, points)?;
            let renderer = GeoJsonRenderer::default();
            renderer.render(&Geometry::Buffer {
                center,
                radius_km,
                ring,
            });
            print_json(&renderer.feature_collection())?;
        }
        Command::Ask {
            text,
            ai,
            position,
            viewport,
            selected,
            services,
        } => {
            let config = match &services.config {
                Some(path) => AgentConfig::from_json_file(path)?,
                None => AgentConfig::default(),
            };
            let renderer = Arc::new(GeoJsonRenderer::default());
            let collab = Collaborators {
                completion: Arc::new(ChatClient::new(
                    &services.llm_url,
                    services.llm_model.clone(),
                    services.llm_api_key.clone(),
                )?),
                routing: Arc::new(RoutingClient::new(&services.routing_url)?),
                isochrone: Arc::new(IsochroneClient::new(
                    &services.isochrone_url,
                    services.map_token.clone(),
                )?),
                terrain: Arc::new(NoTerrain),
                renderer: renderer.clone(),
            };
            let position = FixedPosition {
                user: coordinate_arg("position", position.as_deref())?,
                viewport: coordinate_arg("viewport", viewport.as_deref())?,
            };
            let selection = SharedSelection::new(selection_arg(selected.as_deref())?);
            let session = Session::new(
                Agents::new(collab, config),
                Arc::new(selection),
                Arc::new(position),
            );

            let outcome = session.submit(&text, &ai).await;
            tracing::info!(
                intent = %outcome.classification.intent,
                rule = outcome.classification.rule,
                "turn finished"
            );
            if let Some(err) = outcome.report.error {
                anyhow::bail!("{} query failed: {err}", outcome.classification.intent);
            }

            let mut collection = renderer.feature_collection();
            if let Some(profile) = &outcome.report.profile {
                collection["profile"] = serde_json::to_value(profile)?;
            }
            print_json(&collection)?;
        }
    }
    Ok(())
}
