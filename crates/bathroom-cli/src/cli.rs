use bathroom_core::config::CliConfigOverrides;
use bathroom_core::models::ReportedStatus;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Bathroom Now - find, report and add public restrooms
#[derive(Parser, Debug)]
#[command(name = "bathroom")]
#[command(about = "Find, report and add public restrooms", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (TOML); defaults to ./bathroom.toml when present
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Cache database path
    #[arg(long, global = true, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Hours before a reported status is shown as unknown
    #[arg(long, global = true, value_name = "HOURS")]
    pub freshness_hours: Option<u32>,

    /// Widest window, in degrees, that will be fetched
    #[arg(long, global = true, value_name = "DEGREES")]
    pub max_span: Option<f64>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn overrides(&self) -> CliConfigOverrides {
        CliConfigOverrides {
            cache_path: self.cache.clone(),
            freshness_hours: self.freshness_hours,
            max_span_degrees: self.max_span,
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch and show restrooms around a position
    Nearby(NearbyArgs),

    /// Show the restroom closest to a position
    Nearest(NearestArgs),

    /// Add a restroom at a position
    Add(AddArgs),

    /// Report a restroom as open or closed
    Report(ReportArgs),

    /// List cached restrooms
    List(ListArgs),

    /// Show the effective configuration and where each value came from
    Config,

    /// Show the anonymous id attached to this device's writes
    DeviceId,

    /// Print a navigation link to a restroom
    Directions(DirectionsArgs),
}

#[derive(Args, Debug, Clone, Copy)]
pub struct PositionArgs {
    /// Latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lng: f64,
}

#[derive(Parser, Debug)]
pub struct NearbyArgs {
    #[command(flatten)]
    pub position: PositionArgs,

    /// Window span in degrees (both axes)
    #[arg(long, default_value_t = 0.02)]
    pub delta: f64,
}

#[derive(Parser, Debug)]
pub struct NearestArgs {
    /// Latitude in degrees; without a position, location is treated as denied
    #[arg(long, allow_hyphen_values = true, requires = "lng")]
    pub lat: Option<f64>,

    /// Longitude in degrees
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    pub lng: Option<f64>,

    /// Fetch the surrounding area before answering
    #[arg(long)]
    pub fetch: bool,
}

#[derive(Parser, Debug)]
pub struct AddArgs {
    #[command(flatten)]
    pub position: PositionArgs,

    /// Initial status
    #[arg(long, value_parser = parse_reported_status)]
    pub status: ReportedStatus,

    /// Wheelchair accessible
    #[arg(long)]
    pub accessible: bool,
}

#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Restroom id
    pub id: String,

    /// Reported status
    #[arg(long, value_parser = parse_reported_status)]
    pub status: ReportedStatus,

    /// Reporter position
    #[command(flatten)]
    pub position: PositionArgs,
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Show the stored status instead of the decayed one
    #[arg(long)]
    pub raw: bool,
}

#[derive(Parser, Debug)]
pub struct DirectionsArgs {
    /// Restroom id
    pub id: String,

    /// Target map application
    #[arg(long, value_enum, default_value = "android")]
    pub platform: Platform,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Platform {
    Ios,
    Android,
}

fn parse_reported_status(value: &str) -> Result<ReportedStatus, String> {
    value.parse().map_err(|e: bathroom_core::BathroomError| e.to_string())
}
