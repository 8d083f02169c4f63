//! TOML configuration file.
//!
//! ```toml
//! network = "testnet"
//! relay_fee = 10000
//! pool_fee_rate = "2.59"
//! journal = "/var/lib/ticketsign/journal"
//!
//! [params]
//! subsidy_reduction_interval = 2048
//!
//! [session]
//! account = 0
//! min_conf = 1
//! settle_delay_secs = 5
//! vsp_url = "https://vsp.example.org"
//!
//! [session.vote_choices]
//! treasury = "yes"
//! ```
//!
//! Every key is optional. Command-line flags win over the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ticketsign_protocol::config::{Network, NetworkParams, DEFAULT_RELAY_FEE};
use ticketsign_protocol::stake::PoolFeeRate;
use ticketsign_protocol::SessionOptions;

const DEFAULT_JOURNAL_DIR: &str = "ticketsign-journal";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    pub network: Option<String>,
    pub relay_fee: Option<u64>,
    pub pool_fee_rate: Option<PoolFeeRate>,
    pub journal: Option<PathBuf>,
    #[serde(default)]
    pub params: ParamOverrides,
    #[serde(default)]
    pub session: SessionSection,
}

/// Settings for a signing session against a wallet and VSP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSection {
    pub account: Option<u32>,
    pub min_conf: Option<u32>,
    pub settle_delay_secs: Option<u64>,
    pub vsp_url: Option<String>,
    #[serde(default)]
    pub vote_choices: BTreeMap<String, String>,
}

/// Individual overrides on top of a network preset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamOverrides {
    pub coin_name: Option<String>,
    pub coin_type: Option<u32>,
    pub base_subsidy: Option<u64>,
    pub mul_subsidy: Option<u64>,
    pub div_subsidy: Option<u64>,
    pub subsidy_reduction_interval: Option<u64>,
    pub tickets_per_block: Option<u64>,
    pub ticket_pool_size: Option<u64>,
}

impl ParamOverrides {
    fn apply(&self, params: &mut NetworkParams) {
        if let Some(v) = &self.coin_name {
            params.coin_name = v.clone();
        }
        if let Some(v) = self.coin_type {
            params.coin_type = v;
        }
        if let Some(v) = self.base_subsidy {
            params.base_subsidy = v;
        }
        if let Some(v) = self.mul_subsidy {
            params.mul_subsidy = v;
        }
        if let Some(v) = self.div_subsidy {
            params.div_subsidy = v;
        }
        if let Some(v) = self.subsidy_reduction_interval {
            params.subsidy_reduction_interval = v;
        }
        if let Some(v) = self.tickets_per_block {
            params.tickets_per_block = v;
        }
        if let Some(v) = self.ticket_pool_size {
            params.ticket_pool_size = v;
        }
    }
}

impl CliConfig {
    /// Reads `path`, or returns the defaults when no file was given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Network parameters: `network_flag`, else the file, else mainnet,
    /// with the file's overrides applied.
    pub fn network_params(&self, network_flag: Option<&str>) -> Result<NetworkParams> {
        let name = network_flag.or(self.network.as_deref()).unwrap_or("mainnet");
        let network: Network = name.parse().map_err(anyhow::Error::msg)?;
        let mut params = network.params();
        self.params.apply(&mut params);
        Ok(params)
    }

    pub fn relay_fee(&self, flag: Option<u64>) -> u64 {
        flag.or(self.relay_fee).unwrap_or(DEFAULT_RELAY_FEE)
    }

    pub fn pool_fee_rate(&self, flag: Option<&str>) -> Result<PoolFeeRate> {
        match flag {
            Some(s) => s
                .parse()
                .with_context(|| format!("invalid pool fee rate {s:?}")),
            None => self
                .pool_fee_rate
                .context("no pool fee rate given (use --rate or pool_fee_rate)"),
        }
    }

    /// Session options from the `[session]` table on top of the defaults.
    pub fn session_options(&self, relay_fee_flag: Option<u64>) -> SessionOptions {
        let defaults = SessionOptions::default();
        SessionOptions {
            account: self.session.account.unwrap_or(defaults.account),
            min_conf: self.session.min_conf.unwrap_or(defaults.min_conf),
            settle_delay: self
                .session
                .settle_delay_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.settle_delay),
            relay_fee: self.relay_fee(relay_fee_flag),
            vote_choices: self.session.vote_choices.clone(),
            ..defaults
        }
    }

    /// Base URL of the VSP, without a trailing slash.
    pub fn vsp_url(&self) -> Option<&str> {
        self.session
            .vsp_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
    }

    pub fn journal_path(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.journal.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_JOURNAL_DIR))
    }
}
