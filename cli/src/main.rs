//! chargenet command line
//!
//! ```sh
//! # Identify an id and print its canonical forms
//! chargenet parse "DE*GEF*E1234*1"
//!
//! # Derive the charging station id of a set of EVSEs
//! chargenet derive-station-id "DE*GEF*E1234*1" "DE*GEF*E1234*2"
//!
//! # Validate the configuration file
//! chargenet --config /etc/chargenet/config.toml check
//!
//! # Run a virtual station with reservation expiry until Ctrl+C
//! chargenet demo
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use chargenet::application::{
    start_reservation_expiry_task, StationRegistry, VirtualChargingStation, VirtualStationSettings,
};
use chargenet::application::charging::{RemoteStartRequest, ReserveRequest};
use chargenet::config::AppConfig;
use chargenet::domain::auth::AuthIdentification;
use chargenet::domain::charging_station::ChargingStation;
use chargenet::domain::ids::{
    ChargingPoolId, ChargingStationId, ChargingStationOperatorId, EMobilityAccountId,
    EMobilityProviderId, EvseId, OperatorIdFormat,
};
use chargenet::domain::session::StopReason;
use chargenet::init_tracing;
use chargenet::support::shutdown::{listen_for_shutdown_signals, ShutdownSignal};

/// Tools for the chargenet charging network model.
#[derive(Parser, Debug)]
#[command(name = "chargenet", version, about = "EV charging network identifier tools and virtual station demo")]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "CHARGENET_CONFIG")]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect the kind of an identifier and print its canonical forms as JSON.
    Parse { id: String },

    /// Derive the charging station id shared by a set of EVSE ids.
    DeriveStationId {
        #[arg(required = true)]
        evse_ids: Vec<String>,

        /// Suffix length when the id has to be hashed.
        #[arg(long)]
        hash_length: Option<usize>,
    },

    /// Validate the configuration file and exit.
    Check,

    /// Run a virtual charging station with the reservation expiry task.
    Demo {
        /// Station the demo EVSEs belong to.
        #[arg(long, default_value = "DE*GEF*S1234")]
        station_id: String,

        #[arg(long, default_value_t = 2)]
        evses: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(chargenet::default_config_path);

    let mut config = match AppConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            if matches!(cli.command, Command::Check) {
                eprintln!("❌ Invalid configuration {}: {}", config_path.display(), e);
                std::process::exit(1);
            }
            let cfg = AppConfig::default();
            init_with_override(&cfg, cli.log_level.as_deref());
            warn!("Failed to load config from {}: {}", config_path.display(), e);
            warn!("Using default configuration.");
            return run(cli.command, cfg).await;
        }
    };

    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    init_tracing(&config);
    info!("Configuration loaded from {}", config_path.display());

    if matches!(cli.command, Command::Check) {
        println!("✅ Configuration is valid");
        println!("   Config file          : {}", config_path.display());
        println!("   Log level            : {}", config.logging.level);
        println!(
            "   Reservation duration : {}s (max {}s)",
            config.reservations.default_duration_secs, config.reservations.max_duration_secs
        );
        println!(
            "   Expiry check         : every {}s",
            config.reservations.expiry_check_interval_secs
        );
        println!("   Status history       : {}", config.status.history_size);
        println!("   Station id hash      : {}", config.station_id.hash_length);
        return Ok(());
    }

    run(cli.command, config).await
}

fn init_with_override(config: &AppConfig, level: Option<&str>) {
    let mut config = config.clone();
    if let Some(level) = level {
        config.logging.level = level.to_string();
    }
    init_tracing(&config);
}

async fn run(command: Command, config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Parse { id } => {
            let described = describe_id(&id);
            if described.is_empty() {
                return Err(format!("'{id}' is not a known identifier").into());
            }
            println!("{}", serde_json::to_string_pretty(&Value::Array(described))?);
        }
        Command::DeriveStationId {
            evse_ids,
            hash_length,
        } => {
            let evse_ids = evse_ids
                .iter()
                .map(|id| EvseId::parse(id))
                .collect::<Result<Vec<_>, _>>()?;
            let hash_length = hash_length.unwrap_or(config.station_id.hash_length);
            let station_id = ChargingStationId::from_evse_ids(&evse_ids, hash_length)?;
            println!("{station_id}");
        }
        Command::Check => {
            println!("✅ Configuration is valid (defaults)");
        }
        Command::Demo { station_id, evses } => demo(&config, &station_id, evses).await?,
    }
    Ok(())
}

/// Every reading of `text` as one of the identifier kinds
fn describe_id(text: &str) -> Vec<Value> {
    let mut found = Vec::new();

    if let Some(id) = ChargingStationOperatorId::try_parse(text) {
        let forms: Vec<String> = [
            OperatorIdFormat::Iso,
            OperatorIdFormat::IsoStarless,
            OperatorIdFormat::Din,
        ]
        .into_iter()
        .filter_map(|format| id.to_format(format).ok())
        .map(|id| id.to_string())
        .collect();
        found.push(json!({
            "kind": "operator",
            "id": id.to_string(),
            "country": id.country().alpha2,
            "code": id.code(),
            "format": id.format(),
            "forms": forms,
        }));
    }
    if let Some(id) = ChargingPoolId::try_parse(text) {
        found.push(json!({
            "kind": "charging_pool",
            "id": id.to_string(),
            "operator": id.operator_id().to_string(),
            "suffix": id.suffix(),
        }));
    }
    if let Some(id) = ChargingStationId::try_parse(text) {
        found.push(json!({
            "kind": "charging_station",
            "id": id.to_string(),
            "operator": id.operator_id().to_string(),
            "suffix": id.suffix(),
        }));
    }
    if let Some(id) = EvseId::try_parse(text) {
        found.push(json!({
            "kind": "evse",
            "id": id.to_string(),
            "operator": id.operator_id().to_string(),
            "suffix": id.suffix(),
            "charging_station": id.station_id().to_string(),
        }));
    }
    if let Some(id) = EMobilityAccountId::try_parse(text) {
        found.push(json!({
            "kind": "emobility_account",
            "id": id.to_string(),
            "provider": id.provider_id().to_string(),
            "instance": id.instance(),
            "check_digit": id.check_digit().map(String::from),
        }));
    } else if let Ok(id) = EMobilityProviderId::parse(text) {
        found.push(json!({
            "kind": "emobility_provider",
            "id": id.to_string(),
            "country": id.country().alpha2,
            "code": id.code(),
        }));
    }
    found
}

async fn demo(
    config: &AppConfig,
    station_id: &str,
    evses: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let station_id = ChargingStationId::parse(station_id)?;
    let mut entity = ChargingStation::with_history_size(station_id.clone(), config.status.history_size);
    entity.set_name(Some("Demo station".to_string()));
    for n in 1..=evses {
        entity.create_evse(n)?;
    }

    let registry = StationRegistry::shared();
    let settings = VirtualStationSettings::from(&config.reservations);
    let station = registry
        .register(VirtualChargingStation::new(entity, settings))
        .await?;

    let shutdown = ShutdownSignal::new();
    tokio::spawn(listen_for_shutdown_signals(shutdown.clone()));
    let expiry = start_reservation_expiry_task(
        registry.clone(),
        shutdown.clone(),
        config.reservations.expiry_check_interval(),
    );

    // One reservation left to expire, one session run to completion
    let evse_ids = station.evse_ids().await;
    if let Some(evse_id) = evse_ids.first() {
        let result = registry
            .reserve(ReserveRequest::evse(evse_id.clone()).with_duration(chrono::Duration::seconds(30)))
            .await;
        info!(?result, "Demo reservation");
    }
    if let Some(evse_id) = evse_ids.get(1) {
        let auth = AuthIdentification::token("04A2B3C4D5")?;
        let started = registry
            .remote_start(RemoteStartRequest::new(evse_id.clone(), auth.clone()))
            .await;
        if let Some(session) = started.session() {
            registry.record_meter_value(&session.id, 12_500).await?;
            let stopped = registry
                .remote_stop(&session.id, StopReason::Remote, Some(auth))
                .await;
            if let Some(cdr) = stopped.charge_detail_record() {
                println!("{}", serde_json::to_string_pretty(cdr)?);
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&station.snapshot().await)?);
    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    shutdown.notified().wait().await;
    if let Err(e) = expiry.await {
        error!(error = %e, "Reservation expiry task failed");
    }
    Ok(())
}
