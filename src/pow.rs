// SPDX-License-Identifier: CC0-1.0

//! Proof-of-work related integer types and difficulty retargeting.
//!
//! Provides the [`Work`] and [`Target`] types used in proof-of-work
//! calculations, the compact target codec used in block headers, and the two
//! retarget algorithms that compute the required difficulty for the next
//! block. This is consensus code: every function is a pure computation over
//! borrowed chain data and must reproduce historical results bit for bit.

use core::fmt::{self, Write as _};
use core::ops::{Add, Div, Mul, Not, Rem, Shl, Shr, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::chain::{BlockId, BlockNode, ChainIndex};
use crate::params::Params;

/// Implement traits and methods shared by `Target` and `Work`.
macro_rules! do_impl {
    ($ty:ident) => {
        impl $ty {
            /// Creates `Self` from a big-endian byte array.
            #[inline]
            pub fn from_be_bytes(bytes: [u8; 32]) -> $ty { $ty(U256::from_be_bytes(bytes)) }

            /// Creates `Self` from a little-endian byte array.
            #[inline]
            pub fn from_le_bytes(bytes: [u8; 32]) -> $ty { $ty(U256::from_le_bytes(bytes)) }

            /// Converts `self` to a big-endian byte array.
            #[inline]
            pub fn to_be_bytes(self) -> [u8; 32] { self.0.to_be_bytes() }

            /// Converts `self` to a little-endian byte array.
            #[inline]
            pub fn to_le_bytes(self) -> [u8; 32] { self.0.to_le_bytes() }
        }

        impl fmt::Display for $ty {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
        }

        impl fmt::LowerHex for $ty {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { fmt::LowerHex::fmt(&self.0, f) }
        }

        impl fmt::UpperHex for $ty {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { fmt::UpperHex::fmt(&self.0, f) }
        }
    };
}

/// A 256 bit integer representing work.
///
/// Work is a measure of how difficult it is to find a hash below a given
/// [`Target`]. Summed block by block it forms chain work, the quantity
/// compared when choosing between competing chains.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Work(U256);

impl Work {
    /// Converts this [`Work`] to [`Target`].
    pub fn to_target(self) -> Target { Target(self.0.inverse()) }
}
do_impl!(Work);

impl Add for Work {
    type Output = Work;
    fn add(self, rhs: Self) -> Self { Work(self.0 + rhs.0) }
}

impl Sub for Work {
    type Output = Work;
    fn sub(self, rhs: Self) -> Self { Work(self.0 - rhs.0) }
}

/// A 256 bit integer representing target.
///
/// The hash of a block's header must be lower than or equal to the current
/// target for the block to be accepted by the network. The lower the target,
/// the more difficult it is to generate a block. (See also [`Work`].)
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Target(U256);

impl Target {
    /// A target of zero, the value degenerate compact encodings decode to.
    pub const ZERO: Target = Target(U256::ZERO);

    /// The maximum possible target.
    ///
    /// This value is used to calculate difficulty, which is defined as how
    /// difficult the current target makes it to find a block relative to how
    /// difficult it would be at the highest possible target. Remember highest
    /// target == lowest difficulty.
    // The upstream limit is ~(u256)0 >> 32 stored as a floating-point type so
    // it gets truncated, hence the low 208 bits are all zero.
    pub const MAX: Self = Target(U256(0xFFFF_u128 << (208 - 128), 0));

    /// The maximum **attainable** target value on mainnet.
    ///
    /// Not all target values are attainable because consensus code uses the
    /// compact format to represent targets (see [`CompactTarget`]).
    pub const MAX_ATTAINABLE_MAINNET: Self = Target(U256(0xFFFF_u128 << (208 - 128), 0));

    /// The maximum **attainable** target value on testnet.
    pub const MAX_ATTAINABLE_TESTNET: Self = Target(U256(0xFFFF_u128 << (208 - 128), 0));

    /// The maximum **attainable** target value on regtest.
    pub const MAX_ATTAINABLE_REGTEST: Self = Target(U256(0x7FFF_FF00_u128 << 96, 0));

    /// Computes the [`Target`] value from a compact representation.
    ///
    /// Equivalent to [`CompactTarget::decode`] with the degenerate flags
    /// collapsed into a target of zero.
    pub fn from_compact(c: CompactTarget) -> Target { c.decode().target }

    /// Computes the compact value from a [`Target`] representation.
    ///
    /// The compact form is by definition lossy, this means that
    /// `t == Target::from_compact(t.to_compact_lossy())` does not always hold.
    pub fn to_compact_lossy(self) -> CompactTarget {
        let mut size = (self.0.bits() + 7) / 8;
        let mut compact = if size <= 3 {
            (self.0.low_u64() << (8 * (3 - size))) as u32
        } else {
            let bn = self.0 >> (8 * (size - 3));
            bn.low_u32()
        };

        if (compact & 0x0080_0000) != 0 {
            compact >>= 8;
            size += 1;
        }

        CompactTarget(compact | (size << 24))
    }

    /// Converts this [`Target`] to [`Work`].
    ///
    /// "Work" is defined as the work done to mine a block with this target
    /// value (recorded in the block header in compact form as nBits). This is
    /// not the same as the difficulty to mine a block with this target (see
    /// `Self::difficulty`).
    pub fn to_work(self) -> Work { Work(self.0.inverse()) }

    /// Computes the popular "difficulty" measure for mining.
    ///
    /// Difficulty represents how difficult the current target makes it to
    /// find a block, relative to how difficult it would be at the highest
    /// possible target (highest target == lowest difficulty).
    ///
    /// # Note
    ///
    /// Since [`Target`] is represented as a 256 bit integer but `difficulty()`
    /// returns only 128 bits this means for targets below approximately
    /// `0xffff_ffff_ffff_ffff_ffff_ffff` `difficulty()` will saturate at
    /// `u128::MAX`.
    pub fn difficulty(&self) -> u128 {
        let d = Target::MAX.0 / self.0;
        d.saturating_to_u128()
    }
}
do_impl!(Target);

impl Sub for Target {
    type Output = Target;
    fn sub(self, rhs: Self) -> Self { Target(self.0 - rhs.0) }
}

impl Shr<u32> for Target {
    type Output = Target;
    fn shr(self, shift: u32) -> Target { Target(self.0 >> shift) }
}

/// Encoding of 256-bit target as 32-bit float.
///
/// This is used to encode a target into a block header: a one byte exponent
/// followed by a three byte mantissa whose high bit doubles as a sign flag.
/// The format comes from OpenSSL's bignum "compact" encoding and is stuck in
/// consensus code for good.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompactTarget(u32);

impl CompactTarget {
    /// Creates a [`CompactTarget`] from a consensus encoded `u32`.
    #[inline]
    pub fn from_consensus(bits: u32) -> Self { Self(bits) }

    /// Returns the consensus encoded `u32` representation of this [`CompactTarget`].
    #[inline]
    pub const fn to_consensus(self) -> u32 { self.0 }

    /// Decodes this compact value into a [`Target`] together with the
    /// degenerate conditions the encoding can express.
    ///
    /// Decoding never fails. An encoding with the sign bit set on a non-zero
    /// mantissa, or one whose exponent would shift significant mantissa bits
    /// past 256 bits, is reported through the flags and decodes to a target
    /// of zero; the raw bits remain available on `self` for re-encoding.
    pub fn decode(self) -> DecodedTarget {
        let bits = self.0;
        let size = bits >> 24;
        let mut word = bits & 0x007f_ffff;
        if size <= 3 {
            word >>= 8 * (3 - size);
        }

        let negative = word != 0 && (bits & 0x0080_0000) != 0;
        let overflow = word != 0
            && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32));

        let target = if negative || overflow {
            Target::ZERO
        } else if size <= 3 {
            Target(U256::from(word))
        } else {
            Target(U256::from(word) << (8 * (size - 3)))
        };

        DecodedTarget { target, negative, overflow }
    }

    /// Computes the required difficulty for the block following `prev` under
    /// the legacy periodic retargeter.
    ///
    /// `first_block_time` is the timestamp of the block one full retarget
    /// interval before `prev`. The observed timespan is clamped to between a
    /// quarter and four times the target timespan, which bounds how far
    /// difficulty can move in a single retarget step no matter how anomalous
    /// the observed timestamps are.
    pub fn from_next_work_required(
        prev: &BlockNode,
        first_block_time: i64,
        params: &Params,
    ) -> CompactTarget {
        if params.no_pow_retargeting {
            return prev.bits;
        }

        // Limit adjustment step.
        let pow_target_timespan = params.pow_target_timespan as i64;
        let mut actual_timespan = prev.time - first_block_time;
        if actual_timespan < pow_target_timespan / 4 {
            actual_timespan = pow_target_timespan / 4;
        }
        if actual_timespan > pow_target_timespan * 4 {
            actual_timespan = pow_target_timespan * 4;
        }

        // Retarget. The multiplication may wrap for targets near the top of
        // the 256 bit range, matching the historical arithmetic.
        let (scaled, _) = prev.bits.decode().target.0.mul_u64(actual_timespan as u64);
        let mut target = Target(scaled / U256::from(params.pow_target_timespan));
        if target > params.pow_limit {
            target = params.pow_limit;
        }
        target.to_compact_lossy()
    }

    /// Computes the required difficulty for the block following `prev` under
    /// the continuous windowed retargeter.
    ///
    /// The target is recomputed after every block from the work done over a
    /// trailing window of [`Params::daa_window`] blocks. Both ends of the
    /// window are anchored on the median-timestamp block of the three ending
    /// there, so that a single forged timestamp cannot swing the observed
    /// timespan, and the timespan itself is clamped to between half and
    /// double the ideal window duration.
    ///
    /// `header_time` is the timestamp of the candidate header; it does not
    /// enter the retarget arithmetic and only feeds the minimum-difficulty
    /// rule on test networks.
    ///
    /// # Panics
    ///
    /// If `prev` does not have a full window of ancestors. Callers gate this
    /// path on chain height.
    pub fn from_windowed_work_required(
        chain: &ChainIndex,
        prev: BlockId,
        header_time: i64,
        params: &Params,
    ) -> CompactTarget {
        let last = chain.node(prev);

        // Special difficulty rule for test networks: a candidate header far
        // enough past the chain tip may be mined at minimum difficulty.
        if params.allow_min_difficulty_blocks
            && header_time > last.time + 2 * params.pow_target_spacing as i64
        {
            return params.pow_limit.to_compact_lossy();
        }

        assert!(
            last.height >= params.daa_window + 2,
            "windowed retarget requires a full window of ancestors"
        );

        // Anchor both ends of the window on suitable blocks.
        let last_anchor = suitable_block(chain, prev);
        let first = chain
            .ancestor(prev, last.height - params.daa_window)
            .expect("window height checked above");
        let first_anchor = suitable_block(chain, first);

        let next_target = compute_target(chain, first_anchor, last_anchor, params);

        if next_target > params.pow_limit {
            return params.pow_limit.to_compact_lossy();
        }
        next_target.to_compact_lossy()
    }
}

impl From<CompactTarget> for Target {
    fn from(c: CompactTarget) -> Self { Target::from_compact(c) }
}

impl fmt::LowerHex for CompactTarget {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { fmt::LowerHex::fmt(&self.0, f) }
}

impl fmt::UpperHex for CompactTarget {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { fmt::UpperHex::fmt(&self.0, f) }
}

/// The result of decoding a [`CompactTarget`].
///
/// The compact format can express encodings that are not valid targets.
/// Consensus treats these as a target of zero rather than as errors, because
/// validation must produce a deterministic answer for every input, but the
/// conditions still need to be visible to callers: a block carrying one
/// contributes no work.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DecodedTarget {
    /// The decoded target, zero when either flag is set.
    pub target: Target,
    /// The sign bit was set on a non-zero mantissa.
    pub negative: bool,
    /// The exponent would shift significant mantissa bits past 256 bits.
    pub overflow: bool,
}

impl DecodedTarget {
    /// Work contributed by a block declaring this target.
    ///
    /// This is the expected number of hashes, to within a constant factor,
    /// needed to find a header at or below the target: 2^256 / (target + 1).
    /// It grows as the target shrinks, which makes it a sound scalar to sum
    /// across blocks mined at different difficulties. A degenerate encoding
    /// or a target of zero contributes no work.
    pub fn block_proof(&self) -> Work {
        if self.negative || self.overflow || self.target.0.is_zero() {
            return Work(U256::ZERO);
        }
        Work(self.target.0.inverse())
    }
}

/// Expresses the difference in chain work between two blocks as seconds of
/// work at a third block's difficulty.
///
/// The result is positive when `to` has accumulated more work than `from`,
/// negative otherwise, and saturates at the extreme `i64` values. When
/// difficulty never changed between the two blocks the result reduces exactly
/// to the difference of their timestamps, which is what makes it usable for
/// comparing competing chain tips in time units.
pub fn block_proof_equivalent_time(
    to: &BlockNode,
    from: &BlockNode,
    tip: &BlockNode,
    params: &Params,
) -> i64 {
    let (delta, sign) = if to.chain_work > from.chain_work {
        (to.chain_work - from.chain_work, 1)
    } else {
        (from.chain_work - to.chain_work, -1)
    };

    let (scaled, _) = delta.0.mul_u64(params.pow_target_spacing);
    let r = scaled / tip.bits.decode().block_proof().0;
    if r.bits() > 63 {
        return sign * i64::MAX;
    }
    sign * r.low_u64() as i64
}

/// Selects the retarget anchor for the window end at `id`.
///
/// Returns whichever of the block and its two predecessors has the median
/// timestamp. Anchoring the window on a median keeps a single block with a
/// very skewed timestamp from dragging the observed timespan: the anchor is
/// always a real block from the chain, chosen by timestamp rank, so a forged
/// timestamp can move it by at most one block of height.
fn suitable_block(chain: &ChainIndex, id: BlockId) -> BlockId {
    let prev = chain.node(id).prev.expect("suitable anchor requires two predecessors");
    let pprev = chain.node(prev).prev.expect("suitable anchor requires two predecessors");
    let mut candidates = [pprev, prev, id];

    // Sorting network, stable on equal timestamps so ties keep chain order.
    if chain.node(candidates[0]).time > chain.node(candidates[2]).time {
        candidates.swap(0, 2);
    }
    if chain.node(candidates[0]).time > chain.node(candidates[1]).time {
        candidates.swap(0, 1);
    }
    if chain.node(candidates[1]).time > chain.node(candidates[2]).time {
        candidates.swap(1, 2);
    }

    candidates[1]
}

/// Computes the next target from the work done between two window anchors.
fn compute_target(chain: &ChainIndex, first: BlockId, last: BlockId, params: &Params) -> Target {
    let first = chain.node(first);
    let last = chain.node(last);
    assert!(last.height > first.height, "window anchors out of order");

    // From the work done over the window and the time it took to produce it,
    // deduce how much work the network does in one target spacing.
    let work_span = last.chain_work - first.chain_work;
    let (scaled, _) = work_span.0.mul_u64(params.pow_target_spacing);

    // Bound the amplitude of the adjustment to a factor in [0.5, 2] of the
    // ideal window duration.
    let spacing = params.pow_target_spacing as i64;
    let window = params.daa_window as i64;
    let mut actual_timespan = last.time - first.time;
    if actual_timespan > 2 * window * spacing {
        actual_timespan = 2 * window * spacing;
    } else if actual_timespan < window / 2 * spacing {
        actual_timespan = window / 2 * spacing;
    }

    let projected_work = scaled / U256::from(actual_timespan as u64);

    // We need T = (2^256 / W) - 1, but 2^256 does not fit in 256 bits. By
    // expressing 1 as W / W we get (2^256 - W) / W, and 2^256 - W is the
    // two's complement negation of W.
    Target((!projected_work).wrapping_inc() / projected_work)
}

/// Big-endian 256 bit integer type.
// (high, low): u.0 contains the high bits, u.1 contains the low bits.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
struct U256(u128, u128);

impl U256 {
    const MAX: U256 =
        U256(0xffff_ffff_ffff_ffff_ffff_ffff_ffff_ffff, 0xffff_ffff_ffff_ffff_ffff_ffff_ffff_ffff);

    const ZERO: U256 = U256(0, 0);

    const ONE: U256 = U256(0, 1);

    /// Creates [`U256`] from a big-endian array of `u8`s.
    fn from_be_bytes(a: [u8; 32]) -> U256 {
        let (high, low) = split_in_half(a);
        let big = u128::from_be_bytes(high);
        let little = u128::from_be_bytes(low);
        U256(big, little)
    }

    /// Creates a [`U256`] from a little-endian array of `u8`s.
    fn from_le_bytes(a: [u8; 32]) -> U256 {
        let (high, low) = split_in_half(a);
        let little = u128::from_le_bytes(high);
        let big = u128::from_le_bytes(low);
        U256(big, little)
    }

    /// Converts `Self` to a big-endian array of `u8`s.
    fn to_be_bytes(self) -> [u8; 32] {
        let mut out = [0; 32];
        out[..16].copy_from_slice(&self.0.to_be_bytes());
        out[16..].copy_from_slice(&self.1.to_be_bytes());
        out
    }

    /// Converts `Self` to a little-endian array of `u8`s.
    fn to_le_bytes(self) -> [u8; 32] {
        let mut out = [0; 32];
        out[..16].copy_from_slice(&self.1.to_le_bytes());
        out[16..].copy_from_slice(&self.0.to_le_bytes());
        out
    }

    /// Calculates 2^256 / (x + 1) where x is a 256 bit unsigned integer.
    ///
    /// 2**256 / (x + 1) == ~x / (x + 1) + 1
    fn inverse(&self) -> U256 {
        // We should never have a target/work of zero so this doesn't matter
        // that much but we define the inverse of 0 as max.
        if self.is_zero() {
            return U256::MAX;
        }
        // The inverse of max is 1, and computing it the usual way would
        // increment max to zero and divide by it.
        if self.is_max() {
            return U256::ONE;
        }

        let ret = !*self / self.wrapping_inc();
        ret.wrapping_inc()
    }

    fn is_zero(&self) -> bool { self.0 == 0 && self.1 == 0 }

    fn is_max(&self) -> bool { self.0 == u128::MAX && self.1 == u128::MAX }

    /// Returns the low 32 bits.
    fn low_u32(&self) -> u32 { self.low_u128() as u32 }

    /// Returns the low 64 bits.
    fn low_u64(&self) -> u64 { self.low_u128() as u64 }

    /// Returns the low 128 bits.
    fn low_u128(&self) -> u128 { self.1 }

    /// Returns `self` as a `u128` saturating to `u128::MAX` if `self` is too big.
    fn saturating_to_u128(&self) -> u128 {
        if *self > U256::from(u128::MAX) {
            u128::MAX
        } else {
            self.low_u128()
        }
    }

    /// Returns the least number of bits needed to represent the number.
    fn bits(&self) -> u32 {
        if self.0 > 0 {
            256 - self.0.leading_zeros()
        } else {
            128 - self.1.leading_zeros()
        }
    }

    /// Wrapping multiplication by `u64`.
    ///
    /// # Returns
    ///
    /// The multiplication result along with a boolean indicating whether an
    /// arithmetic overflow occurred. If an overflow occurred then the wrapped
    /// value is returned.
    fn mul_u64(self, rhs: u64) -> (U256, bool) {
        let mut carry: u128 = 0;
        let mut split_le =
            [self.1 as u64, (self.1 >> 64) as u64, self.0 as u64, (self.0 >> 64) as u64];

        for word in &mut split_le {
            // This will not overflow, a product of two u64s plus a u64 carry
            // fits in a u128 with room to spare.
            let n = carry + u128::from(rhs) * u128::from(*word);

            *word = n as u64; // Intentional truncation, save the low bits
            carry = n >> 64; // and carry the high bits.
        }

        let low = u128::from(split_le[0]) | u128::from(split_le[1]) << 64;
        let high = u128::from(split_le[2]) | u128::from(split_le[3]) << 64;
        (Self(high, low), carry != 0)
    }

    /// Calculates quotient and remainder.
    ///
    /// # Returns
    ///
    /// (quotient, remainder)
    ///
    /// # Panics
    ///
    /// If `rhs` is zero.
    fn div_rem(self, rhs: Self) -> (Self, Self) {
        let mut sub_copy = self;
        let mut shift_copy = rhs;
        let mut ret = [0u128; 2];

        let my_bits = self.bits();
        let your_bits = rhs.bits();

        // Check for division by 0
        assert!(your_bits != 0, "attempted to divide {} by zero", self);

        // Early return in case we are dividing by a larger number than us
        if my_bits < your_bits {
            return (U256::ZERO, sub_copy);
        }

        // Bitwise long division
        let mut shift = my_bits - your_bits;
        shift_copy = shift_copy << shift;
        loop {
            if sub_copy >= shift_copy {
                ret[1 - (shift / 128) as usize] |= 1 << (shift % 128);
                sub_copy = sub_copy.wrapping_sub(shift_copy);
            }
            shift_copy = shift_copy >> 1;
            if shift == 0 {
                break;
            }
            shift -= 1;
        }

        (U256(ret[0], ret[1]), sub_copy)
    }

    /// Calculates `self` + `rhs`
    ///
    /// Returns a tuple of the addition along with a boolean indicating whether
    /// an arithmetic overflow would occur. If an overflow would have occurred
    /// then the wrapped value is returned.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    fn overflowing_add(self, rhs: Self) -> (Self, bool) {
        let mut ret = U256::ZERO;
        let mut ret_overflow = false;

        let (high, overflow) = self.0.overflowing_add(rhs.0);
        ret.0 = high;
        ret_overflow |= overflow;

        let (low, overflow) = self.1.overflowing_add(rhs.1);
        ret.1 = low;
        if overflow {
            let (high, overflow) = ret.0.overflowing_add(1);
            ret.0 = high;
            ret_overflow |= overflow;
        }

        (ret, ret_overflow)
    }

    /// Calculates `self` - `rhs`
    ///
    /// Returns a tuple of the subtraction along with a boolean indicating
    /// whether an arithmetic overflow would occur. If an overflow would have
    /// occurred then the wrapped value is returned.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    fn overflowing_sub(self, rhs: Self) -> (Self, bool) {
        let ret = self.wrapping_add(!rhs).wrapping_add(Self::ONE);
        let overflow = rhs > self;
        (ret, overflow)
    }

    /// Calculates the multiplication of `self` and `rhs`.
    ///
    /// Returns a tuple of the multiplication along with a boolean indicating
    /// whether an arithmetic overflow would occur. If an overflow would have
    /// occurred then the wrapped value is returned.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    fn overflowing_mul(self, rhs: Self) -> (Self, bool) {
        let mut ret = U256::ZERO;
        let mut ret_overflow = false;

        for i in 0..3 {
            let to_mul = (rhs >> (64 * i)).low_u64();
            let (mul_res, _) = self.mul_u64(to_mul);
            ret = ret.wrapping_add(mul_res << (64 * i));
        }

        let to_mul = (rhs >> 192).low_u64();
        let (mul_res, overflow) = self.mul_u64(to_mul);
        ret_overflow |= overflow;
        let (sum, overflow) = ret.overflowing_add(mul_res);
        ret = sum;
        ret_overflow |= overflow;

        (ret, ret_overflow)
    }

    /// Wrapping (modular) addition. Computes `self + rhs`, wrapping around at
    /// the boundary of the type.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    fn wrapping_add(self, rhs: Self) -> Self {
        let (ret, _overflow) = self.overflowing_add(rhs);
        ret
    }

    /// Wrapping (modular) subtraction. Computes `self - rhs`, wrapping around
    /// at the boundary of the type.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    fn wrapping_sub(self, rhs: Self) -> Self {
        let (ret, _overflow) = self.overflowing_sub(rhs);
        ret
    }

    /// Wrapping (modular) multiplication. Computes `self * rhs`, wrapping
    /// around at the boundary of the type.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    #[cfg(test)]
    fn wrapping_mul(self, rhs: Self) -> Self {
        let (ret, _overflow) = self.overflowing_mul(rhs);
        ret
    }

    /// Returns `self` incremented by 1 wrapping around at the boundary of the type.
    #[must_use = "this returns the result of the increment, without modifying the original"]
    fn wrapping_inc(&self) -> U256 {
        let mut ret = U256::ZERO;

        ret.1 = self.1.wrapping_add(1);
        if ret.1 == 0 {
            ret.0 = self.0.wrapping_add(1);
        } else {
            ret.0 = self.0;
        }
        ret
    }

    /// Panic-free bitwise shift-left; yields `self << mask(rhs)`, where `mask`
    /// removes any high-order bits of `rhs` that would cause the shift to
    /// exceed the bitwidth of the type.
    ///
    /// Note that this is *not* the same as a rotate-left; the RHS of a
    /// wrapping shift-left is restricted to the range of the type, rather
    /// than the bits shifted out of the LHS being returned to the other end.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    fn wrapping_shl(self, rhs: u32) -> Self {
        let shift = rhs & 0x000000ff;

        let mut ret = U256::ZERO;
        let word_shift = shift >= 128;
        let bit_shift = shift % 128;

        if word_shift {
            ret.0 = self.1 << bit_shift
        } else {
            ret.0 = self.0 << bit_shift;
            if bit_shift > 0 {
                ret.0 += self.1.wrapping_shr(128 - bit_shift);
            }
            ret.1 = self.1 << bit_shift;
        }
        ret
    }

    /// Panic-free bitwise shift-right; yields `self >> mask(rhs)`, where
    /// `mask` removes any high-order bits of `rhs` that would cause the shift
    /// to exceed the bitwidth of the type.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    fn wrapping_shr(self, rhs: u32) -> Self {
        let shift = rhs & 0x000000ff;

        let mut ret = U256::ZERO;
        let word_shift = shift >= 128;
        let bit_shift = shift % 128;

        if word_shift {
            ret.1 = self.0 >> bit_shift
        } else {
            ret.0 = self.0 >> bit_shift;
            ret.1 = self.1 >> bit_shift;
            if bit_shift > 0 {
                ret.1 += self.0.wrapping_shl(128 - bit_shift);
            }
        }
        ret
    }

    /// Format `self` to `f` as a decimal when value is known to be non-zero.
    fn fmt_decimal(&self, f: &mut fmt::Formatter) -> fmt::Result {
        const DIGITS: usize = 78; // U256::MAX has 78 base 10 digits.
        const TEN: U256 = U256(0, 10);

        let mut buf = [0_u8; DIGITS];
        let mut i = DIGITS - 1; // We loop backwards.
        let mut cur = *self;

        loop {
            let digit = (cur % TEN).low_u128() as u8; // Cast after rem 10 is lossless.
            buf[i] = digit + b'0';
            cur = cur / TEN;
            if cur.is_zero() {
                break;
            }
            i -= 1;
        }
        let s = core::str::from_utf8(&buf[i..]).expect("digits 0-9 are valid UTF8");
        f.pad_integral(true, "", s)
    }
}

impl<T: Into<u128>> From<T> for U256 {
    fn from(x: T) -> Self { U256(0, x.into()) }
}

impl Add for U256 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        let (res, overflow) = self.overflowing_add(rhs);
        debug_assert!(!overflow, "Addition of U256 values overflowed");
        res
    }
}

impl Sub for U256 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        let (res, overflow) = self.overflowing_sub(rhs);
        debug_assert!(!overflow, "Subtraction of U256 values overflowed");
        res
    }
}

impl Mul for U256 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let (res, overflow) = self.overflowing_mul(rhs);
        debug_assert!(!overflow, "Multiplication of U256 values overflowed");
        res
    }
}

impl Div for U256 {
    type Output = Self;
    fn div(self, rhs: Self) -> Self { self.div_rem(rhs).0 }
}

impl Rem for U256 {
    type Output = Self;
    fn rem(self, rhs: Self) -> Self { self.div_rem(rhs).1 }
}

impl Not for U256 {
    type Output = Self;

    fn not(self) -> Self { U256(!self.0, !self.1) }
}

impl Shl<u32> for U256 {
    type Output = Self;
    fn shl(self, shift: u32) -> U256 { self.wrapping_shl(shift) }
}

impl Shr<u32> for U256 {
    type Output = Self;
    fn shr(self, shift: u32) -> U256 { self.wrapping_shr(shift) }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_zero() {
            f.pad_integral(true, "", "0")
        } else {
            self.fmt_decimal(f)
        }
    }
}

impl fmt::Debug for U256 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{:#x}", self) }
}

macro_rules! impl_hex {
    ($hex:path, $lookup:expr) => {
        impl $hex for U256 {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                if f.alternate() {
                    f.write_str("0x")?;
                }

                for byte in self.to_be_bytes() {
                    let upper_idx = ((byte & 0xf0) >> 4) as usize;
                    let lower_idx = (byte & 0xf) as usize;
                    f.write_char($lookup[upper_idx])?;
                    f.write_char($lookup[lower_idx])?;
                }
                Ok(())
            }
        }
    };
}
#[rustfmt::skip]
impl_hex!(fmt::LowerHex, ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f']);
#[rustfmt::skip]
impl_hex!(fmt::UpperHex, ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F']);

#[cfg(feature = "serde")]
impl serde::Serialize for U256 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        struct DisplayHex(U256);

        impl fmt::Display for DisplayHex {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{:x}", self.0) }
        }

        if serializer.is_human_readable() {
            serializer.collect_str(&DisplayHex(*self))
        } else {
            let bytes = self.to_be_bytes();
            serializer.serialize_bytes(&bytes)
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for U256 {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        use core::convert::TryInto;

        use hex::FromHex;
        use serde::de;

        if d.is_human_readable() {
            struct HexVisitor;

            impl<'de> de::Visitor<'de> for HexVisitor {
                type Value = U256;

                fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    f.write_str("a 32 byte ASCII hex string")
                }

                fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    if s.len() != 64 {
                        return Err(de::Error::invalid_length(s.len(), &self));
                    }

                    let b = <[u8; 32]>::from_hex(s)
                        .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(s), &self))?;

                    Ok(U256::from_be_bytes(b))
                }

                fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    if let Ok(hex) = core::str::from_utf8(v) {
                        let b = <[u8; 32]>::from_hex(hex).map_err(|_| {
                            de::Error::invalid_value(de::Unexpected::Str(hex), &self)
                        })?;

                        Ok(U256::from_be_bytes(b))
                    } else {
                        Err(E::invalid_value(de::Unexpected::Bytes(v), &self))
                    }
                }
            }
            d.deserialize_str(HexVisitor)
        } else {
            struct BytesVisitor;

            impl<'de> de::Visitor<'de> for BytesVisitor {
                type Value = U256;

                fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    f.write_str("a sequence of bytes")
                }

                fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    let b = v.try_into().map_err(|_| de::Error::invalid_length(v.len(), &self))?;
                    Ok(U256::from_be_bytes(b))
                }
            }

            d.deserialize_bytes(BytesVisitor)
        }
    }
}

/// Splits a 32 byte array into two 16 byte arrays.
fn split_in_half(a: [u8; 32]) -> ([u8; 16], [u8; 16]) {
    let mut high = [0_u8; 16];
    let mut low = [0_u8; 16];

    high.copy_from_slice(&a[..16]);
    low.copy_from_slice(&a[16..]);

    (high, low)
}

#[cfg(kani)]
impl kani::Arbitrary for U256 {
    fn any() -> Self {
        let high: u128 = kani::any();
        let low: u128 = kani::any();
        Self(high, low)
    }
}

#[cfg(kani)]
mod verification {
    use super::*;

    #[kani::unwind(5)] // mul_u64 loops over 4 64 bit ints so use one more than 4
    #[kani::proof]
    fn check_mul_u64() {
        let x: U256 = kani::any();
        let y: u64 = kani::any();

        let _ = x.mul_u64(y);
    }
}

#[cfg(test)]
mod tests {
    use crate::params::Network;

    use super::*;

    impl<T: Into<u128>> From<T> for Target {
        fn from(x: T) -> Self { Self(U256::from(x)) }
    }

    impl<T: Into<u128>> From<T> for Work {
        fn from(x: T) -> Self { Self(U256::from(x)) }
    }

    impl U256 {
        /// Creates a U256 from a big-endian array of u64's
        fn from_array(a: [u64; 4]) -> Self {
            let mut ret = U256::ZERO;
            ret.0 = (a[0] as u128) << 64 ^ (a[1] as u128);
            ret.1 = (a[2] as u128) << 64 ^ (a[3] as u128);
            ret
        }
    }

    #[test]
    fn u256_num_bits() {
        assert_eq!(U256::from(255_u64).bits(), 8);
        assert_eq!(U256::from(256_u64).bits(), 9);
        assert_eq!(U256::from(300_u64).bits(), 9);
        assert_eq!(U256::from(60000_u64).bits(), 16);
        assert_eq!(U256::from(70000_u64).bits(), 17);

        let u = U256::from(u128::MAX) << 1;
        assert_eq!(u.bits(), 129);

        let mut shl = U256::from(70000_u64);
        shl = shl << 100;
        assert_eq!(shl.bits(), 117);
        shl = shl << 100;
        assert_eq!(shl.bits(), 217);
        shl = shl << 100;
        assert_eq!(shl.bits(), 0);
    }

    #[test]
    fn u256_comp() {
        let small = U256::from_array([0, 0, 0, 10]);
        let big = U256::from_array([0, 0, 0x0209_E737_8231_E632, 0x8C8C_3EE7_0C64_4118]);
        let bigger = U256::from_array([0, 0, 0x0209_E737_8231_E632, 0x9C8C_3EE7_0C64_4118]);
        let biggest = U256::from_array([1, 0, 0x0209_E737_8231_E632, 0x5C8C_3EE7_0C64_4118]);

        assert!(small < big);
        assert!(big < bigger);
        assert!(bigger < biggest);
        assert!(bigger <= biggest);
        assert!(biggest <= biggest);
        assert!(bigger >= big);
        assert!(bigger >= small);
        assert!(small <= small);
    }

    const WANT: U256 =
        U256(0x1bad_cafe_dead_beef_deaf_babe_2bed_feed, 0xbaad_f00d_defa_ceda_11fe_d2ba_d1c0_ffe0);

    #[rustfmt::skip]
    const BE_BYTES: [u8; 32] = [
        0x1b, 0xad, 0xca, 0xfe, 0xde, 0xad, 0xbe, 0xef, 0xde, 0xaf, 0xba, 0xbe, 0x2b, 0xed, 0xfe, 0xed,
        0xba, 0xad, 0xf0, 0x0d, 0xde, 0xfa, 0xce, 0xda, 0x11, 0xfe, 0xd2, 0xba, 0xd1, 0xc0, 0xff, 0xe0,
    ];

    #[rustfmt::skip]
    const LE_BYTES: [u8; 32] = [
        0xe0, 0xff, 0xc0, 0xd1, 0xba, 0xd2, 0xfe, 0x11, 0xda, 0xce, 0xfa, 0xde, 0x0d, 0xf0, 0xad, 0xba,
        0xed, 0xfe, 0xed, 0x2b, 0xbe, 0xba, 0xaf, 0xde, 0xef, 0xbe, 0xad, 0xde, 0xfe, 0xca, 0xad, 0x1b,
    ];

    #[test]
    fn u256_to_be_bytes() {
        assert_eq!(WANT.to_be_bytes(), BE_BYTES);
    }

    #[test]
    fn u256_from_be_bytes() {
        assert_eq!(U256::from_be_bytes(BE_BYTES), WANT);
    }

    #[test]
    fn u256_to_le_bytes() {
        assert_eq!(WANT.to_le_bytes(), LE_BYTES);
    }

    #[test]
    fn u256_from_le_bytes() {
        assert_eq!(U256::from_le_bytes(LE_BYTES), WANT);
    }

    #[test]
    fn u256_from_unsigned_integer_types() {
        assert_eq!(U256::from(0xbe_u8), U256(0, 0xbe));
        assert_eq!(U256::from(0xbeef_u16), U256(0, 0xbeef));
        assert_eq!(U256::from(0xdead_beef_u32), U256(0, 0xdead_beef));
        assert_eq!(U256::from(0xdead_beef_cafe_babe_u64), U256(0, 0xdead_beef_cafe_babe));
        assert_eq!(
            U256::from(0xdead_beef_cafe_babe_0123_4567_89ab_cdef_u128),
            U256(0, 0xdead_beef_cafe_babe_0123_4567_89ab_cdef)
        );
    }

    #[test]
    fn u256_shift_left() {
        let u = U256::from(1_u32);
        assert_eq!(u << 0, u);
        assert_eq!(u << 1, U256::from(2_u64));
        assert_eq!(u << 63, U256::from(0x8000_0000_0000_0000_u64));
        assert_eq!(u << 64, U256::from_array([0, 0, 0x0000_0000_0000_0001, 0]));
        assert_eq!(u << 127, U256(0, 0x8000_0000_0000_0000_0000_0000_0000_0000));
        assert_eq!(u << 128, U256(1, 0));

        let x = U256(0, 0x8000_0000_0000_0000_0000_0000_0000_0000);
        assert_eq!(x << 1, U256(1, 0));
    }

    #[test]
    fn u256_shift_right() {
        let u = U256(1, 0);
        assert_eq!(u >> 0, u);
        assert_eq!(u >> 1, U256(0, 0x8000_0000_0000_0000_0000_0000_0000_0000));
        assert_eq!(u >> 127, U256(0, 2));
        assert_eq!(u >> 128, U256(0, 1));
    }

    #[test]
    fn u256_arithmetic() {
        let init = U256::from(0xDEAD_BEEF_DEAD_BEEF_u64);
        let copy = init;

        let add = init.wrapping_add(copy);
        assert_eq!(add, U256::from_array([0, 0, 1, 0xBD5B_7DDF_BD5B_7DDE]));
        // Bitshifts
        let shl = add << 88;
        assert_eq!(shl, U256::from_array([0, 0x01BD_5B7D, 0xDFBD_5B7D_DE00_0000, 0]));
        let shr = shl >> 40;
        assert_eq!(shr, U256::from_array([0, 0, 0x0001_BD5B_7DDF_BD5B, 0x7DDE_0000_0000_0000]));
        // Increment
        let mut incr = shr;
        incr = incr.wrapping_inc();
        assert_eq!(incr, U256::from_array([0, 0, 0x0001_BD5B_7DDF_BD5B, 0x7DDE_0000_0000_0001]));
        // Subtraction
        let sub = incr.wrapping_sub(init);
        assert_eq!(sub, U256::from_array([0, 0, 0x0001_BD5B_7DDF_BD5A, 0x9F30_4110_2152_4112]));
        // Multiplication
        let (mult, _) = sub.mul_u64(300);
        assert_eq!(mult, U256::from_array([0, 0, 0x0209_E737_8231_E632, 0x8C8C_3EE7_0C64_4118]));
        // Division
        assert_eq!(U256::from(105_u32) / U256::from(5_u32), U256::from(21_u32));
        let div = mult / U256::from(300_u32);
        assert_eq!(div, U256::from_array([0, 0, 0x0001_BD5B_7DDF_BD5A, 0x9F30_4110_2152_4112]));

        assert_eq!(U256::from(105_u32) % U256::from(5_u32), U256::ZERO);
        assert_eq!(U256::from(35498456_u32) % U256::from(3435_u32), U256::from(1166_u32));
        let rem_src = mult.wrapping_mul(U256::from(39842_u32)).wrapping_add(U256::from(9054_u32));
        assert_eq!(rem_src % U256::from(39842_u32), U256::from(9054_u32));
    }

    #[test]
    fn u256_bit_inversion() {
        let v = U256(1, 0);
        let want = U256(
            0xffff_ffff_ffff_ffff_ffff_ffff_ffff_fffe,
            0xffff_ffff_ffff_ffff_ffff_ffff_ffff_ffff,
        );
        assert_eq!(!v, want);

        let v = U256(0x0c0c_0c0c_0c0c_0c0c_0c0c_0c0c_0c0c_0c0c, 0xeeee_eeee_eeee_eeee);
        let want = U256(
            0xf3f3_f3f3_f3f3_f3f3_f3f3_f3f3_f3f3_f3f3,
            0xffff_ffff_ffff_ffff_1111_1111_1111_1111,
        );
        assert_eq!(!v, want);
    }

    #[test]
    fn u256_mul_u64() {
        let v = U256::from(0xDEAD_BEEF_DEAD_BEEF_u64);
        assert_eq!(v, v.mul_u64(1_u64).0);
        assert_eq!(U256::ZERO, v.mul_u64(0_u64).0);

        let u96_res = v.mul_u64(0xFFFF_FFFF).0;
        let u128_res = u96_res.mul_u64(0xFFFF_FFFF).0;
        assert_eq!(u96_res, U256::from_array([0, 0, 0xDEAD_BEEE, 0xFFFF_FFFF_2152_4111]));
        assert_eq!(
            u128_res,
            U256::from_array([0, 0, 0xDEAD_BEEE_2152_4110, 0x2152_4111_DEAD_BEEF])
        );

        let (_, overflow) = U256::MAX.mul_u64(2);
        assert!(overflow, "max * 2 should overflow");
    }

    #[test]
    fn u256_addition() {
        let x = U256::from(u128::MAX);
        let (add, overflow) = x.overflowing_add(U256::ONE);
        assert!(!overflow);
        assert_eq!(add, U256(1, 0));

        let (add, _) = add.overflowing_add(U256::ONE);
        assert_eq!(add, U256(1, 1));
    }

    #[test]
    fn u256_subtraction() {
        let (sub, overflow) = U256::ONE.overflowing_sub(U256::ONE);
        assert!(!overflow);
        assert_eq!(sub, U256::ZERO);

        let x = U256(1, 0);
        let (sub, overflow) = x.overflowing_sub(U256::ONE);
        assert!(!overflow);
        assert_eq!(sub, U256::from(u128::MAX));
    }

    #[test]
    fn u256_multiplication() {
        let u64_val = U256::from(0xDEAD_BEEF_DEAD_BEEF_u64);

        let u128_res = u64_val.wrapping_mul(u64_val);

        assert_eq!(u128_res, U256(0, 0xC1B1_CD13_A4D1_3D46_048D_1354_216D_A321));

        let u256_res = u128_res.wrapping_mul(u128_res);

        assert_eq!(
            u256_res,
            U256(
                0x928D_92B4_D7F5_DF33_4AFC_FF6F_0375_C608,
                0xF5CF_7F36_18C2_C886_F4E1_66AA_D40D_0A41,
            )
        );
    }

    #[test]
    fn u256_increment() {
        let mut val = U256(
            0xEFFF_FFFF_FFFF_FFFF_FFFF_FFFF_FFFF_FFFF,
            0xFFFF_FFFF_FFFF_FFFF_FFFF_FFFF_FFFF_FFFE,
        );
        val = val.wrapping_inc();
        assert_eq!(
            val,
            U256(
                0xEFFF_FFFF_FFFF_FFFF_FFFF_FFFF_FFFF_FFFF,
                0xFFFF_FFFF_FFFF_FFFF_FFFF_FFFF_FFFF_FFFF,
            )
        );
        val = val.wrapping_inc();
        assert_eq!(
            val,
            U256(
                0xF000_0000_0000_0000_0000_0000_0000_0000,
                0x0000_0000_0000_0000_0000_0000_0000_0000,
            )
        );

        assert_eq!(U256::MAX.wrapping_inc(), U256::ZERO);
    }

    #[test]
    fn u256_extreme_bitshift() {
        // Shifting a u64 by 64 bits gives an undefined value, so make sure
        // that we're doing the Right Thing here
        let init = U256::from(0xDEAD_BEEF_DEAD_BEEF_u64);

        assert_eq!(init << 64, U256(0, 0xDEAD_BEEF_DEAD_BEEF_0000_0000_0000_0000));
        let add = (init << 64).wrapping_add(init);
        assert_eq!(add, U256(0, 0xDEAD_BEEF_DEAD_BEEF_DEAD_BEEF_DEAD_BEEF));
        assert_eq!(add >> 0, U256(0, 0xDEAD_BEEF_DEAD_BEEF_DEAD_BEEF_DEAD_BEEF));
        assert_eq!(add << 0, U256(0, 0xDEAD_BEEF_DEAD_BEEF_DEAD_BEEF_DEAD_BEEF));
        assert_eq!(add >> 64, U256(0, 0x0000_0000_0000_0000_DEAD_BEEF_DEAD_BEEF));
        assert_eq!(
            add << 64,
            U256(0xDEAD_BEEF_DEAD_BEEF, 0xDEAD_BEEF_DEAD_BEEF_0000_0000_0000_0000)
        );
    }

    #[test]
    fn u256_display() {
        assert_eq!(format!("{}", U256::from(100_u32)), "100",);
        assert_eq!(format!("{}", U256::ZERO), "0",);
        assert_eq!(format!("{}", U256::from(u64::MAX)), format!("{}", u64::MAX),);
        assert_eq!(
            format!("{}", U256::MAX),
            "115792089237316195423570985008687907853269984665640564039457584007913129639935",
        );
    }

    #[test]
    fn u256_lower_hex() {
        assert_eq!(
            format!("{:x}", U256::from(0xDEADBEEF_u64)),
            "00000000000000000000000000000000000000000000000000000000deadbeef",
        );
        assert_eq!(
            format!("{:#x}", U256::from(0xDEADBEEF_u64)),
            "0x00000000000000000000000000000000000000000000000000000000deadbeef",
        );
        assert_eq!(
            format!("{:x}", U256::MAX),
            "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
        );
    }

    #[test]
    fn u256_upper_hex() {
        assert_eq!(
            format!("{:X}", U256::from(0xDEADBEEF_u64)),
            "00000000000000000000000000000000000000000000000000000000DEADBEEF",
        );
        assert_eq!(
            format!("{:#X}", U256::from(0xDEADBEEF_u64)),
            "0x00000000000000000000000000000000000000000000000000000000DEADBEEF",
        );
    }

    #[test]
    fn u256_is_max_correct_negative() {
        let tc = vec![U256::ZERO, U256::ONE, U256::from(u128::MAX)];
        for t in tc {
            assert!(!t.is_max())
        }
    }

    #[test]
    fn u256_is_max_correct_positive() {
        assert!(U256::MAX.is_max());

        let u = u128::MAX;
        assert!(((U256::from(u) << 128) + U256::from(u)).is_max());
    }

    #[test]
    fn u256_wrapping_add_wraps_at_boundary() {
        assert_eq!(U256::MAX.wrapping_add(U256::ONE), U256::ZERO);
        assert_eq!(U256::MAX.wrapping_add(U256::from(2_u8)), U256::ONE);
    }

    #[test]
    fn u256_wrapping_sub_wraps_at_boundary() {
        assert_eq!(U256::ZERO.wrapping_sub(U256::ONE), U256::MAX);
        assert_eq!(U256::ONE.wrapping_sub(U256::from(2_u8)), U256::MAX);
    }

    #[test]
    #[should_panic]
    fn u256_overflowing_addition_panics() { let _ = U256::MAX + U256::ONE; }

    #[test]
    #[should_panic]
    fn u256_overflowing_subtraction_panics() { let _ = U256::ZERO - U256::ONE; }

    #[test]
    #[should_panic]
    fn u256_multiplication_by_max_panics() { let _ = U256::MAX * U256::MAX; }

    #[test]
    #[should_panic]
    fn work_overflowing_addition_panics() { let _ = Work(U256::MAX) + Work(U256::ONE); }

    #[test]
    #[should_panic]
    fn work_overflowing_subtraction_panics() { let _ = Work(U256::ZERO) - Work(U256::ONE); }

    #[test]
    fn u256_inverse_edge_cases() {
        assert_eq!(U256::MAX.inverse(), U256::ONE);
        assert_eq!(U256::ZERO.inverse(), U256::MAX);
        // 2^256 / 2 exactly; the inverse of one is not saturated.
        assert_eq!(U256::ONE.inverse(), U256(1 << 127, 0));
    }

    #[test]
    fn target_work_roundtrip() {
        let target = Target::from(0xdeadbeef_u32);
        let work = target.to_work();
        let back = work.to_target();
        assert_eq!(back, target)
    }

    #[cfg(feature = "serde")]
    #[test]
    fn u256_serde() {
        let check = |uint, hex| {
            let json = format!("\"{}\"", hex);
            assert_eq!(::serde_json::to_string(&uint).unwrap(), json);
            assert_eq!(::serde_json::from_str::<U256>(&json).unwrap(), uint);

            let bin_encoded = bincode::serialize(&uint).unwrap();
            let bin_decoded: U256 = bincode::deserialize(&bin_encoded).unwrap();
            assert_eq!(bin_decoded, uint);
        };

        check(U256::ZERO, "0000000000000000000000000000000000000000000000000000000000000000");
        check(
            U256::from(0xDEADBEEF_u32),
            "00000000000000000000000000000000000000000000000000000000deadbeef",
        );
        check(
            U256::from_array([0xdd44, 0xcc33, 0xbb22, 0xaa11]),
            "000000000000dd44000000000000cc33000000000000bb22000000000000aa11",
        );
        check(U256::MAX, "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff");

        assert!(::serde_json::from_str::<U256>(
            "\"fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffg\""
        )
        .is_err()); // invalid char
        assert!(::serde_json::from_str::<U256>(
            "\"ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff\""
        )
        .is_err()); // invalid length
    }

    #[test]
    fn compact_decode_values() {
        // (bits, target)
        let tests = vec![
            (0x0100_3456_u32, 0x00_u64), // Zero after the exponent shift.
            (0x0112_3456_u32, 0x12_u64),
            (0x0200_8000_u32, 0x80_u64),
            (0x0500_9234_u32, 0x9234_0000_u64),
            (0x0492_3456_u32, 0x00_u64), // High bit set (0x80 in 0x92).
            (0x0412_3456_u32, 0x1234_5600_u64), // Inverse of above; no high bit.
        ];

        for (bits, target) in tests {
            let want = Target::from(target);
            let got = Target::from_compact(CompactTarget::from_consensus(bits));
            assert_eq!(got, want);
        }
    }

    #[test]
    fn compact_decode_flags() {
        // Sign bit set on a non-zero mantissa.
        let decoded = CompactTarget::from_consensus(0x0492_3456).decode();
        assert!(decoded.negative);
        assert!(!decoded.overflow);
        assert_eq!(decoded.target, Target::ZERO);

        // Sign bit set but the mantissa shifts down to zero: no flag.
        let decoded = CompactTarget::from_consensus(0x0180_3456).decode();
        assert!(!decoded.negative);
        assert_eq!(decoded.target, Target::ZERO);

        // Sign bit set, small exponent, mantissa survives the shift.
        let decoded = CompactTarget::from_consensus(0x01fe_dcba).decode();
        assert!(decoded.negative);
        assert_eq!(decoded.target, Target::ZERO);

        // Exponent too large for any mantissa.
        let decoded = CompactTarget::from_consensus(0xff12_3456).decode();
        assert!(decoded.overflow);
        assert!(!decoded.negative);
        assert_eq!(decoded.target, Target::ZERO);

        // A zero mantissa never overflows.
        let decoded = CompactTarget::from_consensus(0xff00_0000).decode();
        assert!(!decoded.overflow);
        assert_eq!(decoded.target, Target::ZERO);

        // Exponent boundaries per mantissa width.
        assert!(!CompactTarget::from_consensus(0x2200_0001).decode().overflow);
        assert!(CompactTarget::from_consensus(0x2300_0001).decode().overflow);
        assert!(!CompactTarget::from_consensus(0x2100_0100).decode().overflow);
        assert!(CompactTarget::from_consensus(0x2200_0100).decode().overflow);
        assert!(!CompactTarget::from_consensus(0x2001_0000).decode().overflow);
        assert!(CompactTarget::from_consensus(0x2101_0000).decode().overflow);

        // The largest non-overflowing single-byte mantissa encoding.
        let decoded = CompactTarget::from_consensus(0x2200_00ff).decode();
        assert!(!decoded.overflow);
        assert_eq!(decoded.target, Target(U256::from(0xff_u32) << 248));
    }

    #[test]
    fn compact_encode_values() {
        // (bits, target)
        let tests = vec![
            (0x0_u32, 0x00_u64),
            (0x0112_0000_u32, 0x12_u64),
            (0x0200_8000_u32, 0x80_u64),
            (0x0500_9234_u32, 0x9234_0000_u64),
            (0x0412_3456_u32, 0x1234_5600_u64),
        ];

        for (bits, target) in tests {
            let want = CompactTarget::from_consensus(bits);
            let got = Target::from(target).to_compact_lossy();
            assert_eq!(got, want);
        }
    }

    #[test]
    fn compact_roundtrip_canonical() {
        // Values produced by to_compact_lossy round-trip exactly.
        for bits in [0x1d00_ffff_u32, 0x1c05_a3f4, 0x1c01_68fd, 0x207f_ffff, 0x0500_9234] {
            let compact = CompactTarget::from_consensus(bits);
            let target = Target::from_compact(compact);
            assert_eq!(target.to_compact_lossy(), compact);
        }
    }

    #[test]
    fn max_target_from_compact() {
        // The highest possible target is defined as 0x1d00ffff
        let bits = 0x1d00_ffff_u32;
        let want = Target::MAX;
        let got = Target::from_compact(CompactTarget::from_consensus(bits));
        assert_eq!(got, want)
    }

    #[test]
    fn target_difficulty() {
        assert_eq!(Target::MAX.difficulty(), 1);
        assert_eq!(
            Target::from_compact(CompactTarget::from_consensus(0x1c00_ffff)).difficulty(),
            256
        );
        assert_eq!(
            Target::from_compact(CompactTarget::from_consensus(0x1b00_ffff)).difficulty(),
            65536
        );
    }

    #[test]
    fn block_proof_values() {
        // Difficulty one: 2^256 / (2^224 - 2^208 + 1).
        let proof = CompactTarget::from_consensus(0x1d00_ffff).decode().block_proof();
        assert_eq!(proof, Work::from(0x1_0001_0001_u64));

        // Regtest-style easy target: two hashes expected per block.
        let proof = CompactTarget::from_consensus(0x207f_ffff).decode().block_proof();
        assert_eq!(proof, Work::from(2_u64));
    }

    #[test]
    fn block_proof_degenerate_is_zero() {
        // Negative, overflowing and zero targets contribute no work.
        for bits in [0x0492_3456_u32, 0xff12_3456, 0x0000_0000, 0x0100_3456] {
            let proof = CompactTarget::from_consensus(bits).decode().block_proof();
            assert_eq!(proof, Work::from(0_u64));
        }
    }

    #[test]
    fn legacy_retarget_disabled_returns_prev_bits() {
        let params = Params::new(Network::Regtest);
        let prev = BlockNode {
            height: 100,
            time: 1269211443,
            bits: CompactTarget::from_consensus(0x207f_ffff),
            chain_work: Work::from(0_u64),
            prev: None,
        };

        let got = CompactTarget::from_next_work_required(&prev, 1269200000, &params);
        assert_eq!(got, prev.bits);
    }

    #[test]
    fn windowed_retarget_min_difficulty_shortcut() {
        let params = Params::new(Network::Testnet);
        let mut chain = ChainIndex::new();
        let bits = CompactTarget::from_consensus(0x1c0f_fff0);
        let genesis = chain.insert_genesis(1269211443, bits);

        // A candidate header more than two spacings past the tip gets the
        // minimum difficulty without consulting the window.
        let header_time = 1269211443 + 2 * params.pow_target_spacing as i64 + 1;
        let got = CompactTarget::from_windowed_work_required(&chain, genesis, header_time, &params);
        assert_eq!(got, params.pow_limit.to_compact_lossy());
    }
}
