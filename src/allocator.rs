//! # EncAlloc - A Tamper-Detecting Pool Allocator for Embedded Systems
//!
//! EncAlloc hands out byte ranges from a fixed backing buffer and seals every
//! block header with an integrity hash, so that invalid operations are detected
//! and safely ignored instead of corrupting the heap. It features:
//!
//! - **Hash-sealed block headers** - Every region carries a tag derived from
//!   its offset, a per-block nonce, and a pool-wide key
//! - **Double-free tolerance** - Releasing a block twice is a guaranteed no-op
//! - **Next-fit allocation** - The search resumes where the last one left off
//! - **Lazy coalescing** - Adjacent free regions merge on release
//! - **Flexible storage** - Inline arrays for statics, borrowed buffers, or
//!   heap-backed pools
//!
//! ## Quick Start
//!
//! ```rust
//! use encalloc::prelude::*;
//!
//! // A 256-byte pool with inline storage, keyed and seeded at init
//! let mut pool = EncPoolAllocator::<[u8; 256]>::new();
//! pool.init(&[0u8; KEY_SIZE], 0x5eed);
//!
//! let handle = pool.alloc(b"Hello, sealed heap!").unwrap();
//! assert_eq!(pool.get(handle).unwrap(), b"Hello, sealed heap!");
//!
//! pool.encfree(Some(handle));
//! pool.encfree(Some(handle)); // double free - absorbed, nothing happens
//! ```
//!
//! ## Features
//!
//! - `encpool` (default) - The pool backend with hash-sealed headers
//! - `alloc` (default) - Heap-backed pools via `EncPoolAllocator::with_capacity`
//! - `global-alloc` (default) - Single-threaded global pool access
//!
//! ## Architecture
//!
//! ### Core Trait
//!
//! The [`Allocator`] trait defines the interface for allocator backends:
//!
//! - `encalloc()` - Reserve a byte range; `None` means no space
//! - `encfree()` - Release a range; invalid input is silently absorbed
//! - `get()` / `get_mut()` - Access a live block through its handle
//! - `len()` / `capacity()` - Query allocator state
//!
//! ### Safety Model
//!
//! The pool has no free/used flags. A region is **live** exactly when its
//! header holds a non-zero nonce *and* a tag that matches
//! `mix(offset, nonce, key)`. Releasing a region zeroes the nonce, so a second
//! release - or a release through a stale or forged handle - fails the
//! liveness check and is skipped:
//!
//! ```rust
//! # use encalloc::prelude::*;
//! # let mut pool = EncPoolAllocator::<[u8; 256]>::new();
//! # pool.init(&[0u8; KEY_SIZE], 1);
//! let handle = pool.encalloc(64).unwrap();
//! pool.encfree(Some(handle));
//!
//! // The handle is dead: access and release both turn into no-ops
//! assert!(pool.get(handle).is_none());
//! pool.encfree(Some(handle));
//! ```
//!
//! The hash is an avalanche mix, not a MAC. It deters accidental corruption
//! and double release; it is not a defense against an attacker who can read
//! the pool's raw bytes.
//!
//! ### Memory Layout
//!
//! The buffer is partitioned into regions with no gaps and no overlaps. Each
//! region starts with a 16-byte header whose `end` word doubles as the offset
//! of the next header - adjacency is the link structure, there are no next
//! pointers:
//!
//! ```text
//! | header | payload ... | header | payload ... | header | payload |
//! 0        16            ^end                   ^end          capacity
//! ```
//!
//! ## Performance Characteristics
//!
//! | Operation | Cost | Notes |
//! |-----------|------|-------|
//! | encalloc() | O(regions) | Next-fit scan, two passes worst case |
//! | encfree() | O(free run) | Sweeps adjacent free regions forward |
//! | get() | O(1) | One header read plus liveness check |
//! | Memory | 16 bytes/region | Four little-endian words |
//!
//! ## Safety Guarantees
//!
//! - ✅ **No unsafe in the pool backend** - Offsets and slices, never pointers
//! - ✅ **Double-free tolerance** - Second release is a detected no-op
//! - ✅ **Bounds checking** - All header reads validated against capacity
//! - ✅ **No panics in release builds** - `Option`/`Result` for every failure
//! - ✅ **Single-threaded** - Exclusive access by construction (`&mut self`)
//!
//! ## no_std Support
//!
//! EncAlloc is fully `no_std` compatible. The `alloc` feature only adds the
//! heap-backed storage constructor; inline and borrowed storage work on bare
//! metal.
//!
//! ## Testing
//!
//! Due to the single-threaded global allocator:
//!
//! ```bash
//! cargo test --all-features -- --test-threads=1
//! ```
//!
//! ## License
//!
//! This project is licensed under your chosen license.

#![no_std]
#![warn(missing_docs)]
#![doc(html_root_url = "https://docs.rs/encalloc/0.1.0")]

#[cfg(feature = "alloc")]
extern crate alloc;

// Internal modules - use prelude for public API
mod backend;

#[cfg(feature = "global-alloc")]
mod global;

/// Convenient re-exports for common use - this is the public API
///
/// Users should import from prelude:
/// ```
/// use encalloc::prelude::*;
/// ```
pub mod prelude;

/// Returns the version string of the encalloc crate
///
/// # Examples
///
/// ```
/// use encalloc::version;
/// assert_eq!(version(), "0.1.0");
/// ```
pub fn version() -> &'static str {
    "0.1.0"
}

/// Width of the pool integrity key in bytes
///
/// The key is XOR-folded into a single word at init time and feeds the
/// per-block tag together with the block's offset and nonce.
pub const KEY_SIZE: usize = 32;

/// Size of the metadata header embedded at the start of every region
///
/// Each allocation costs this many bytes on top of its payload. Callers
/// sizing a pool should budget `HEADER_SIZE + nbytes` per block.
pub const HEADER_SIZE: usize = 16;

/// Errors surfaced when binding backing storage to a pool
///
/// Construction is the only fallible phase; every later operation reports
/// failure through `Option` or absorbs it silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// The storage cannot hold even a single block header
    StorageTooSmall,
    /// The storage is larger than a `u32` offset can address
    CapacityOverflow,
}

/// A handle to an allocated byte range
///
/// Handles carry the pool offset of the first payload byte - the block's
/// header sits [`HEADER_SIZE`] bytes below it. A handle is deliberately
/// forgeable: the pool re-validates the header it points at on every access,
/// so stale, doubled-up, or fabricated handles degrade to `None`/no-op
/// instead of undefined behavior.
///
/// # Examples
///
/// ```
/// use encalloc::Handle;
///
/// let handle = Handle::new(16);
/// assert_eq!(handle.offset, 16);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    /// Pool offset of the first payload byte
    pub offset: u32,
}

impl Handle {
    /// Creates a handle from a raw pool offset
    pub const fn new(offset: u32) -> Self {
        Self { offset }
    }
}

/// Core allocator trait for pool-backed memory management
///
/// Provides a safe interface for reserving, accessing, and releasing byte
/// ranges. All implementations must validate handles on every access and
/// absorb invalid releases.
///
/// # Error Model
///
/// - A failed reservation is `None`, never a panic - callers must handle it
/// - An invalid release (stale handle, wild offset, `None`) is a silent no-op;
///   this is the double-free-safety contract, not an error to surface
///
/// # Examples
///
/// ```
/// use encalloc::prelude::*;
///
/// let mut pool = EncPoolAllocator::<[u8; 128]>::new();
/// pool.init(&[0u8; KEY_SIZE], 1);
///
/// let handle = pool.encalloc(32).unwrap();
/// pool.get_mut(handle).unwrap()[0] = 42;
/// assert_eq!(pool.get(handle).unwrap()[0], 42);
///
/// pool.encfree(Some(handle));
/// assert!(pool.get(handle).is_none());
/// ```
pub trait Allocator {
    /// Reserves `nbytes` usable bytes from the pool
    ///
    /// # Returns
    ///
    /// - `Some(handle)` on success
    /// - `None` if no free region anywhere in the pool is large enough
    fn encalloc(&mut self, nbytes: usize) -> Option<Handle>;

    /// Releases a previously reserved range
    ///
    /// Never fails observably. `None`, out-of-range offsets, and handles
    /// whose header fails the liveness check are absorbed without touching
    /// pool state - releasing the same handle twice is safe by design.
    fn encfree(&mut self, mem: Option<Handle>);

    /// Gets a shared reference to a live block's payload
    ///
    /// # Returns
    ///
    /// - `Some(slice)` if the handle refers to a live block
    /// - `None` otherwise (released, corrupted, or never allocated)
    fn get(&self, mem: Handle) -> Option<&[u8]>;

    /// Gets a mutable reference to a live block's payload
    ///
    /// # Returns
    ///
    /// - `Some(slice)` if the handle refers to a live block
    /// - `None` otherwise (released, corrupted, or never allocated)
    fn get_mut(&mut self, mem: Handle) -> Option<&mut [u8]>;

    /// Returns the number of currently live blocks
    fn len(&self) -> usize;

    /// Returns true if no blocks are currently live
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the pool capacity in bytes, headers included
    fn capacity(&self) -> usize;

    /// Returns the per-block metadata overhead in bytes
    fn header_size(&self) -> usize;

    /// Reserves memory and copies `data` into it
    ///
    /// This is a convenience method that combines `encalloc` with
    /// `copy_from_slice`.
    ///
    /// # Returns
    ///
    /// - `Some(handle)` if the reservation and copy succeed
    /// - `None` if no free region is large enough
    fn alloc(&mut self, data: &[u8]) -> Option<Handle> {
        let handle = self.encalloc(data.len())?;
        let buf = self.get_mut(handle)?;
        buf[..data.len()].copy_from_slice(data);
        Some(handle)
    }

    /// Releases every block, resetting the pool to one free region
    fn clear(&mut self);
}
