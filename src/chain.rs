// SPDX-License-Identifier: CC0-1.0

//! An arena backed index of block headers.
//!
//! The retarget algorithms consume a handful of header fields (height,
//! timestamp, declared difficulty, accumulated chain work) and the link to
//! the predecessor block. [`ChainIndex`] stores exactly that: an append-only
//! arena of [`BlockNode`]s addressed by [`BlockId`], with the predecessor
//! expressed as another index rather than a pointer. Forks are supported, so
//! the index forms a tree in general, but any one chain through it is a
//! simple list.
//!
//! The index owns the chain-work recurrence: appending a block computes its
//! cumulative work from its predecessor's and its own declared difficulty,
//! so `chain_work(block) == chain_work(prev) + proof(block)` holds by
//! construction. Nothing in this crate ever mutates a stored node.

use alloc::vec::Vec;

use crate::pow::{CompactTarget, Work};

/// Handle to a block stored in a [`ChainIndex`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(u32);

/// The per-block data tracked by the index.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockNode {
    /// Distance from the genesis block; increases by exactly one per block
    /// along a chain.
    pub height: u32,
    /// Header timestamp in seconds since the epoch. Not monotonic along a
    /// chain.
    pub time: i64,
    /// The declared difficulty, as carried in the header.
    pub bits: CompactTarget,
    /// Total work on the chain ending in this block.
    pub chain_work: Work,
    /// The predecessor block, `None` only for a genesis block.
    pub prev: Option<BlockId>,
}

/// Append-only arena of block headers.
#[derive(Debug, Clone, Default)]
pub struct ChainIndex {
    nodes: Vec<BlockNode>,
}

impl ChainIndex {
    /// Creates an empty index.
    pub fn new() -> Self { ChainIndex { nodes: Vec::new() } }

    /// Returns the number of blocks stored, across all forks.
    pub fn len(&self) -> usize { self.nodes.len() }

    /// Returns true if no blocks are stored.
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// Appends a genesis block at height zero.
    ///
    /// A genesis block's chain work is its own proof.
    pub fn insert_genesis(&mut self, time: i64, bits: CompactTarget) -> BlockId {
        let chain_work = bits.decode().block_proof();
        self.push(BlockNode { height: 0, time, bits, chain_work, prev: None })
    }

    /// Appends a block on top of `prev`.
    ///
    /// Height and chain work are derived from the predecessor; the new
    /// block's work contribution comes from decoding `bits`.
    ///
    /// # Panics
    ///
    /// If `prev` is not a handle into this index.
    pub fn insert(&mut self, prev: BlockId, time: i64, bits: CompactTarget) -> BlockId {
        let parent = *self.node(prev);
        let chain_work = parent.chain_work + bits.decode().block_proof();
        self.push(BlockNode { height: parent.height + 1, time, bits, chain_work, prev: Some(prev) })
    }

    /// Returns the block referred to by `id`.
    ///
    /// # Panics
    ///
    /// If `id` is not a handle into this index.
    pub fn node(&self, id: BlockId) -> &BlockNode { &self.nodes[id.0 as usize] }

    /// Walks predecessor links from `id` down to the ancestor at `height`.
    ///
    /// Returns `None` if `height` is above the starting block or the walk
    /// runs off the genesis block (which cannot happen on a well-formed
    /// chain, where heights step by one).
    pub fn ancestor(&self, id: BlockId, height: u32) -> Option<BlockId> {
        if height > self.node(id).height {
            return None;
        }

        let mut cursor = id;
        loop {
            let node = self.node(cursor);
            if node.height == height {
                return Some(cursor);
            }
            cursor = node.prev?;
        }
    }

    fn push(&mut self, node: BlockNode) -> BlockId {
        let id = BlockId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }
}
