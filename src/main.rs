//! fieldcam - publish one snapshot from the command line
//!
//! Decodes an image file, resolves a location fix (given coordinates or the
//! fallback), and runs a single publish session against the configured
//! broker.

use clap::Parser;
use fieldcam::capture::{FileFrameSource, FrameSource};
use fieldcam::config::PublisherConfig;
use fieldcam::location::{LocationSource, StaticLocationSource};
use fieldcam::observability::init_default_logging;
use fieldcam::payload::GeoPoint;
use fieldcam::session::{MqttLink, PublishSession};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, warn};

/// Publish a wildlife camera snapshot over MQTT
#[derive(Parser)]
#[command(name = "fieldcam")]
#[command(about = "Publish a camera snapshot with its GPS fix to an MQTT broker")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Image file to publish
    #[arg(short, long, value_name = "FILE")]
    image: PathBuf,

    /// Caller topic, e.g. the species tag
    #[arg(short, long)]
    topic: String,

    /// Latitude of the capture site
    #[arg(long, requires = "longitude")]
    latitude: Option<f64>,

    /// Longitude of the capture site
    #[arg(long, requires = "latitude")]
    longitude: Option<f64>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = publish_snapshot(&cli, &config).await {
        error!("Publish failed during {} phase: {e}", e.phase());
        process::exit(1);
    }
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<PublisherConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(PublisherConfig::load_from_file(path)?)
        }
        None => {
            let default_path = PathBuf::from("fieldcam.toml");
            if default_path.exists() {
                info!("Loading configuration from: {}", default_path.display());
                return Ok(PublisherConfig::load_from_file(&default_path)?);
            }
            info!("No configuration file found, using defaults");
            Ok(PublisherConfig::default())
        }
    }
}

async fn publish_snapshot(
    cli: &Cli,
    config: &PublisherConfig,
) -> Result<(), fieldcam::PublishError> {
    let frame = match FileFrameSource::new(&cli.image).capture().await {
        Ok(frame) => frame,
        Err(e) => {
            error!("Frame capture failed: {e}");
            process::exit(1);
        }
    };

    let point = match (cli.latitude, cli.longitude) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint {
            latitude,
            longitude,
        }),
        _ => None,
    };
    let fix = StaticLocationSource::new(point).current_fix().await;
    if fix.is_fallback() {
        warn!("No location given, publishing with the fallback position");
    }

    let session = PublishSession::new(
        MqttLink::new(&config.mqtt.broker_url),
        &config.mqtt.topic_prefix,
        config.mqtt.retain,
        config.mqtt.policy(),
    );

    session.publish(&cli.topic, &frame, fix.point()).await
}
