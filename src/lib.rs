// SPDX-License-Identifier: CC0-1.0

//! # Chainwork
//!
//! Chain work and proof-of-work difficulty calculations for Bitcoin-like chains.
//!
//! This library implements the consensus-critical arithmetic behind difficulty
//! retargeting: the compact encoding of 256-bit targets used in block headers,
//! the conversion of targets into accumulated chain work, the legacy periodic
//! retarget, a continuous per-block retarget driven by a sliding window of
//! recent blocks, and the work-to-time estimator used when comparing competing
//! chain tips.
//!
//! Every computation here is a pure function of immutable inputs. Independent
//! validators must arrive at bit-identical answers, so the algorithms
//! reproduce historical behavior exactly, including behavior on degenerate
//! encodings: decoding a compact target never fails, it reports out-of-range
//! encodings through flags and defines their value as zero (see
//! [`CompactTarget::decode`]).
//!
//! ## Available feature flags
//!
//! * `std` - the usual dependency on `std` (default).
//! * `serde` - (dependency), implements `serde`-based serialization and
//!   deserialization for the proof-of-work integer types.

#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]
// Experimental features we need.
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
// Coding conventions.
#![warn(missing_docs)]
// Exclude lints we don't think are valuable.
#![allow(clippy::manual_range_contains)] // More readable than clippy's format.

extern crate alloc;

pub mod chain;
pub mod params;
pub mod pow;

#[rustfmt::skip]                // Keep public re-exports separate.
#[doc(inline)]
pub use crate::{
    chain::{BlockId, BlockNode, ChainIndex},
    params::{Network, Params},
    pow::{block_proof_equivalent_time, CompactTarget, DecodedTarget, Target, Work},
};
