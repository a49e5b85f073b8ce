//! The operator-facing server binary: binds the TLS listener, runs the
//! accept loop and liveness prober as background tasks, and drives the
//! interactive menu on the foreground task.
//!
//! Modeled on `pyprober.py`'s `main` (load config,
//! construct the server/controller/logger, start the client-alive-checking
//! thread, then block on the menu loop).

use std::net::SocketAddr;
use std::path::PathBuf;

use structopt::StructOpt;
use tracing::error;

use ironseam::allowlist::AllowList;
use ironseam::artifacts::ArtifactRoot;
use ironseam::config::Config;
use ironseam::controller::menu::{self, MenuConfig};
use ironseam::controller::Controller;
use ironseam::session;
use ironseam::transport;
use ironseam::{accept, defaults, prober};

#[derive(Debug, StructOpt)]
#[structopt(name = "ironseam-controller", about = "TLS command-and-control server")]
struct Cli {
    /// Path to config.toml (default: the platform config directory).
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Overrides the data directory config.toml resolves to (cert/key,
    /// allow-list, logs, artifact sinks).
    #[structopt(long, parse(from_os_str))]
    data_dir: Option<PathBuf>,

    /// Overrides `[server] ip` from config.toml.
    #[structopt(long)]
    bind: Option<std::net::IpAddr>,

    /// Increases log verbosity; repeatable.
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::from_args();

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => defaults::controller::config_path()?,
    };
    let config = match Config::load(&config_path).await {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error loading configuration at {}: {err}", config_path.display());
            std::process::exit(1);
        }
    };

    let data_dir = cli.data_dir.unwrap_or_else(|| config.server.data_dir.clone());
    let _log_guards = ironseam::logging::init_controller(&data_dir, cli.verbose)?;

    let artifacts = ArtifactRoot::new(&data_dir);
    artifacts.ensure_directories()?;

    let allowlist_path = data_dir.join(defaults::controller::ALLOWLIST_FILE);
    let allowlist = AllowList::new(&allowlist_path);
    allowlist.ensure_exists()?;

    let cert_path = data_dir.join(defaults::controller::CERT_FILE);
    let key_path = data_dir.join(defaults::controller::KEY_FILE);
    let acceptor = transport::acceptor::build(&cert_path, &key_path)?;

    let table = session::new_shared();
    let bind_ip = cli.bind.unwrap_or(config.server.ip);
    let addr = SocketAddr::new(bind_ip, defaults::shared::port());
    let max_frame_bytes = config.server.max_frame_bytes;
    let table_for_accept = table.clone();

    tokio::spawn(async move {
        if let Err(err) = accept::run(addr, acceptor, allowlist, table_for_accept, max_frame_bytes).await {
            error!("accept loop terminated: {err}");
        }
    });
    tokio::spawn(prober::run(table.clone(), config.server.liveness_period));

    let controller = Controller::new(table, artifacts);
    let menu_config = MenuConfig {
        binary_hash_paths: defaults::controller::known_good_hash_paths(),
        known_good_hashes_path: data_dir.join(defaults::controller::KNOWN_GOOD_HASHES_FILE),
        auth_log_path: data_dir.join(defaults::controller::AUTH_LOG_FILE),
    };

    menu::run(&controller, &menu_config).await;

    Ok(())
}
