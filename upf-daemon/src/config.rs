//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub pfcp: Pfcp,
    pub forwarder: Forwarder,
    pub dnn_list: Vec<Dnn>,
    pub logging: Logging,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Pfcp {
    pub addr: String,
    pub port: u16,
    pub node_id: String,
    // Request retransmission interval, in seconds.
    pub retrans_timeout: u64,
    pub max_retrans: u8,
    pub buffer_queue_len: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Forwarder {
    pub kind: ForwarderKind,
    pub sidechan_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwarderKind {
    #[default]
    Empty,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dnn {
    pub dnn: String,
    pub cidr: String,
    pub nat_ifname: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Logging {
    pub style: LoggingFmtStyle,
    pub colors: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingFmtStyle {
    Compact,
    Full,
    Json,
    Pretty,
}

// ===== impl Config =====

impl Config {
    const DFLT_FILEPATH: &'static str = "/etc/upfd.toml";

    pub(crate) fn load(config_file: Option<&str>) -> Config {
        let config_file = config_file.unwrap_or(Config::DFLT_FILEPATH);

        match std::fs::read_to_string(config_file) {
            Ok(config_str) => toml::from_str(&config_str)
                .expect("Failed to parse configuration file"),
            Err(err) => {
                eprintln!("Failed to load configuration file: {err}");
                eprintln!("Falling back to default configuration...");
                Config::default()
            }
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            pfcp: Default::default(),
            forwarder: Default::default(),
            dnn_list: Vec::new(),
            logging: Default::default(),
        }
    }
}

// ===== impl Pfcp =====

impl Default for Pfcp {
    fn default() -> Pfcp {
        Pfcp {
            addr: "0.0.0.0".to_owned(),
            port: 8805,
            node_id: "127.0.0.8".to_owned(),
            retrans_timeout: 3,
            max_retrans: 3,
            buffer_queue_len: 64,
        }
    }
}

// ===== impl Forwarder =====

impl Default for Forwarder {
    fn default() -> Forwarder {
        Forwarder {
            kind: ForwarderKind::Empty,
            sidechan_path: Some("/tmp/upfd-sidechan.sock".to_owned()),
        }
    }
}

// ===== impl Logging =====

impl Default for Logging {
    fn default() -> Logging {
        Logging {
            style: LoggingFmtStyle::Compact,
            colors: true,
        }
    }
}
