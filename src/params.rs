// SPDX-License-Identifier: CC0-1.0

//! Chain consensus parameters.
//!
//! This module provides a predefined set of difficulty parameters for the
//! supported networks. A [`Params`] value is threaded explicitly through
//! every retarget call; there is no process-wide selected network.

use crate::pow::Target;

/// The network a set of parameters applies to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Network {
    /// The production network.
    Mainnet,
    /// The public test network.
    Testnet,
    /// Local regression testing, retargeting disabled.
    Regtest,
}

/// Parameters that influence chain consensus.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct Params {
    /// Network for which parameters are valid.
    pub network: Network,
    /// Proof of work limit value. It contains the lowest possible difficulty,
    /// i.e. the numerically largest permitted target.
    pub pow_limit: Target,
    /// Expected amount of time to mine one block.
    pub pow_target_spacing: u64,
    /// Timespan of one legacy retarget interval.
    pub pow_target_timespan: u64,
    /// Number of trailing blocks examined by the windowed per-block retarget.
    pub daa_window: u32,
    /// Determines whether minimal difficulty may be used for blocks or not.
    pub allow_min_difficulty_blocks: bool,
    /// Determines whether retargeting is disabled for this network or not.
    pub no_pow_retargeting: bool,
}

impl Params {
    /// Creates parameters set for the given network.
    pub fn new(network: Network) -> Self {
        match network {
            Network::Mainnet => Params {
                network: Network::Mainnet,
                pow_limit: Target::MAX_ATTAINABLE_MAINNET,
                pow_target_spacing: 10 * 60,            // 10 minutes.
                pow_target_timespan: 14 * 24 * 60 * 60, // 2 weeks.
                daa_window: 144,                        // One day of blocks.
                allow_min_difficulty_blocks: false,
                no_pow_retargeting: false,
            },
            Network::Testnet => Params {
                network: Network::Testnet,
                pow_limit: Target::MAX_ATTAINABLE_TESTNET,
                pow_target_spacing: 10 * 60,            // 10 minutes.
                pow_target_timespan: 14 * 24 * 60 * 60, // 2 weeks.
                daa_window: 144,
                allow_min_difficulty_blocks: true,
                no_pow_retargeting: false,
            },
            Network::Regtest => Params {
                network: Network::Regtest,
                pow_limit: Target::MAX_ATTAINABLE_REGTEST,
                pow_target_spacing: 10 * 60,            // 10 minutes.
                pow_target_timespan: 14 * 24 * 60 * 60, // 2 weeks.
                daa_window: 144,
                allow_min_difficulty_blocks: true,
                no_pow_retargeting: true,
            },
        }
    }

    /// Calculates the number of blocks between legacy difficulty adjustments.
    pub fn difficulty_adjustment_interval(&self) -> u64 {
        self.pow_target_timespan / self.pow_target_spacing
    }
}
