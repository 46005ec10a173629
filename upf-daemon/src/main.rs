//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

mod config;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::{App, Arg};
use config::{Config, LoggingFmtStyle};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::Layer;
use tracing_subscriber::prelude::*;
use upf_pfcp::forwarder::{Driver, Empty};
use upf_pfcp::master::{Master, ServerConfig};

fn init_tracing(config: &config::Logging) {
    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(config.colors);
    let layer = match config.style {
        LoggingFmtStyle::Compact => layer.compact().boxed(),
        LoggingFmtStyle::Full => layer.boxed(),
        LoggingFmtStyle::Json => layer.json().boxed(),
        LoggingFmtStyle::Pretty => layer.pretty().boxed(),
    };

    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive("upf_pfcp=debug".parse().unwrap())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .init();
}

fn server_config(config: &Config) -> Result<ServerConfig, String> {
    let addr = config
        .pfcp
        .addr
        .parse::<IpAddr>()
        .map_err(|error| format!("invalid pfcp address: {error}"))?;

    Ok(ServerConfig {
        bind: SocketAddr::from((addr, config.pfcp.port)),
        node_id: config.pfcp.node_id.clone(),
        retrans_timeout: Duration::from_secs(config.pfcp.retrans_timeout),
        max_retrans: config.pfcp.max_retrans,
        buffer_queue_len: config.pfcp.buffer_queue_len,
        sidechan_path: config
            .forwarder
            .sidechan_path
            .as_ref()
            .map(PathBuf::from),
    })
}

// ===== main =====

fn main() {
    // Parse command-line parameters.
    let matches = App::new("UPF control-plane daemon")
        .version(clap::crate_version!())
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("file")
                .help("Specify an alternative configuration file."),
        )
        .get_matches();

    // Read configuration file.
    let config_file = matches.value_of("config");
    let config = Config::load(config_file);

    // Initialize tracing.
    init_tracing(&config.logging);

    let server_config = match server_config(&config) {
        Ok(server_config) => server_config,
        Err(error) => {
            error!(%error, "invalid configuration");
            std::process::exit(1);
        }
    };

    // We're ready to go!
    info!("starting up");

    let exit_code = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to create async runtime")
        .block_on(run(server_config, &config));

    std::process::exit(exit_code);
}

async fn run(server_config: ServerConfig, config: &Config) -> i32 {
    // The forwarder installs one route per configured DNN.
    let driver: Box<dyn Driver> = match config.forwarder.kind {
        config::ForwarderKind::Empty => Box::new(Empty::default()),
    };
    for dnn in &config.dnn_list {
        info!(dnn = %dnn.dnn, cidr = %dnn.cidr,
            nat_ifname = ?dnn.nat_ifname, "installing DNN route");
    }

    // Start the PFCP server.
    let (master, rx) = match Master::new(server_config, driver).await {
        Ok((master, rx)) => (master, rx),
        Err(error) => {
            error!(%error, "failed to start PFCP server");
            return 1;
        }
    };
    info!(addr = ?master.local_addr(), "PFCP server started");

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let server = tokio::spawn(master.run(rx, shutdown_rx));

    // Run until a termination signal arrives.
    let mut sigint =
        signal(SignalKind::interrupt()).expect("failed to install handler");
    let mut sigterm =
        signal(SignalKind::terminate()).expect("failed to install handler");
    tokio::select! {
        _ = sigint.recv() => (),
        _ = sigterm.recv() => (),
    }

    info!("shutting down");
    let _ = shutdown_tx.send(()).await;
    let _ = server.await;
    0
}
