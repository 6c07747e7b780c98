use clap::Parser;
use fuddle::{MemberState, PeerInfo, RegistryConfig, RegistryOptions, ReplicaId};
use slog::Drain;
use std::net::SocketAddr;
use tokio::time::Duration;

/// Runs a single registry replica.
#[derive(Parser, Debug)]
#[command(name = "fuddle")]
#[command(about = "Service registry replica")]
struct Args {
    /// ID of this replica, unique in the cluster
    #[arg(long)]
    id: String,

    /// Address to serve client and replica RPCs on
    #[arg(long, default_value = "127.0.0.1:8220")]
    addr: SocketAddr,

    /// Peer replica, as `<id>=<host:port>`. Repeat for every peer.
    #[arg(long = "peer", value_parser = parse_peer)]
    peers: Vec<PeerInfo>,

    #[arg(long, default_value = "fuddle")]
    service: String,

    #[arg(long, default_value = "")]
    region: String,

    #[arg(long, default_value = "")]
    availability_zone: String,

    #[arg(long, value_name = "MILLIS")]
    heartbeat_timeout_ms: Option<u64>,

    #[arg(long, value_name = "MILLIS")]
    reconnect_timeout_ms: Option<u64>,

    #[arg(long, value_name = "MILLIS")]
    tombstone_timeout_ms: Option<u64>,

    #[arg(long, value_name = "MILLIS")]
    anti_entropy_interval_ms: Option<u64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_peer(s: &str) -> Result<PeerInfo, String> {
    let (id, addr) = s
        .split_once('=')
        .ok_or_else(|| format!("expected <id>=<host:port>, got {:?}", s))?;
    let rpc_addr = addr.parse::<SocketAddr>().map_err(|e| e.to_string())?;

    Ok(PeerInfo {
        id: ReplicaId::new(id),
        rpc_addr,
    })
}

fn create_root_logger_for_stdout(verbose: bool) -> slog::Logger {
    let level = if verbose { slog::Level::Debug } else { slog::Level::Info };

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).use_file_location().build().fuse();
    let drain = slog::LevelFilter::new(drain, level).fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let logger = create_root_logger_for_stdout(args.verbose);

    let local_member = MemberState {
        service: args.service,
        status: "active".to_string(),
        locality: fuddle::Locality {
            region: args.region,
            availability_zone: args.availability_zone,
        },
        started: chrono::Utc::now().timestamp_millis(),
        revision: env!("CARGO_PKG_VERSION").to_string(),
        ..MemberState::default()
    };

    let config = RegistryConfig {
        my_replica_id: args.id,
        rpc_addr: args.addr,
        peers: args.peers,
        local_member,
        info_logger: logger.clone(),
        options: RegistryOptions {
            heartbeat_timeout: args.heartbeat_timeout_ms.map(Duration::from_millis),
            reconnect_timeout: args.reconnect_timeout_ms.map(Duration::from_millis),
            tombstone_timeout: args.tombstone_timeout_ms.map(Duration::from_millis),
            anti_entropy_interval: args.anti_entropy_interval_ms.map(Duration::from_millis),
            ..RegistryOptions::default()
        },
    };

    let registry = fuddle::try_create_registry(config).await?;

    tokio::signal::ctrl_c().await?;
    slog::info!(logger, "Received ctrl-c");
    registry.shutdown();

    Ok(())
}
