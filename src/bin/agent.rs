//! The endpoint-facing agent binary: connects to a controller over TLS and
//! serves its single-threaded read-dispatch-reply loop until told to exit
//!.
//!
//! Modeled on `client.py`'s `Client` (prompt for
//! the server IP, connect, wrap with TLS, loop in `ready_to_receive`), with
//! the interactive prompt becoming a CLI flag and the single bare `connect`
//! attempt becoming a reconnect loop with a fixed delay, since a managed
//! endpoint agent outliving one connection attempt is expected operational
//! behavior rather than a spec change.

use std::net::SocketAddr;

use structopt::StructOpt;
use tracing::{error, info, warn};

use ironseam::defaults;
use ironseam::host_info::SystemHostInfo;
use ironseam::transport::{self, IoStream};

#[derive(Debug, StructOpt)]
#[structopt(name = "ironseam-agent", about = "Endpoint agent for a TLS command-and-control controller")]
struct Cli {
    /// Address of the controller to connect to, `ip[:port]`. Port defaults
    /// to 999 (the protocol "Configuration": "Port is hard-coded to 999").
    server: String,

    /// Increases log verbosity; repeatable.
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,

    /// Reconnect and retry forever instead of exiting after one failed or
    /// closed connection.
    #[structopt(long)]
    reconnect: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::from_args();
    ironseam::logging::init_agent(cli.verbose);

    let addr = resolve_server_addr(&cli.server)?;
    let connector = transport::connector::build();

    loop {
        match run_once(addr, &connector).await {
            Ok(()) => {
                info!("controller closed the session, exiting");
                return Ok(());
            }
            Err(err) => {
                warn!("session with {addr} ended: {err}");
                if !cli.reconnect {
                    return Err(err.into());
                }
            }
        }

        tokio::time::sleep(defaults::agent::reconnect_delay()).await;
        info!("reconnecting to {addr}");
    }
}

async fn run_once(
    addr: SocketAddr,
    connector: &tokio_rustls::TlsConnector,
) -> Result<(), ironseam::error::TransportError> {
    let tcp = tokio::net::TcpStream::connect(addr).await?;
    let server_name = rustls::pki_types::ServerName::try_from("localhost")
        .expect("\"localhost\" is a valid DNS name")
        .to_owned();
    let tls = connector
        .connect(server_name, tcp)
        .await
        .map_err(ironseam::error::TransportError::Tls)?;

    info!("connected to controller at {addr}");
    let mut host_info = SystemHostInfo::default();
    let result = ironseam::agent::run(
        IoStream::from(tls),
        defaults::shared::max_frame_bytes(),
        &mut host_info,
    )
    .await;

    if let Err(err) = &result {
        error!("agent loop terminated: {err}");
    }
    result
}

fn resolve_server_addr(input: &str) -> anyhow::Result<SocketAddr> {
    if let Ok(addr) = input.parse::<SocketAddr>() {
        return Ok(addr);
    }
    let ip: std::net::IpAddr = input
        .parse()
        .map_err(|_| anyhow::anyhow!("'{input}' is not a valid IP address or ip:port"))?;
    Ok(SocketAddr::new(ip, defaults::shared::port()))
}
