//! Global pool access for hosts with a single process-wide allocator
//!
//! # Single-Threaded Design
//!
//! This global allocator is **NOT thread-safe** by design. It uses `UnsafeCell`
//! instead of `Mutex` for zero-cost abstraction in no_std embedded
//! environments.
//!
//! ## Important Constraints:
//! - **Single-threaded only** - Must not be accessed from multiple threads
//! - **No concurrent access** - All operations must be sequential
//! - **Tests require `--test-threads=1`** - Parallel tests would corrupt state
//!
//! This is the correct design for embedded systems where:
//! - Applications run single-threaded (no OS threading)
//! - Deterministic performance is required (no mutex overhead)
//! - Memory is limited and predictable
//!
//! ## Automatic Default Initialization
//!
//! The global pool **automatically initializes** with
//! [`GlobalPoolConfig::Pool256`], an all-zero key, and seed 0 if not
//! explicitly configured. The key is a corruption detector, not a secret, so
//! the zero-key fallback keeps first use panic-free; hosts that want their
//! own key must configure before first use:
//!
//! ```rust,ignore
//! use encalloc::prelude::*;
//!
//! fn main() {
//!     let key = [0x42u8; KEY_SIZE];
//!     // Option 1: Use a predefined configuration
//!     GlobalPoolConfig::Pool1K.init(&key, 0x5eed);
//!
//!     // Option 2: Custom pool
//!     // static mut MY_POOL: EncPoolAllocator<[u8; 4096]> = EncPoolAllocator::new();
//!     // unsafe {
//!     //     let pool = &mut *core::ptr::addr_of_mut!(MY_POOL);
//!     //     pool.init(&key, 0x5eed);
//!     //     init_global_allocator(pool);
//!     // }
//!
//!     with_global_allocator(|pool| {
//!         let handle = pool.alloc(b"Hello").unwrap();
//!         pool.encfree(Some(handle));
//!     });
//! }
//! ```

use crate::backend::encpool::EncPoolAllocator;
use crate::{Allocator, Handle, KEY_SIZE};
use core::cell::UnsafeCell;

/// Predefined pool configurations
#[derive(Debug, Clone, Copy)]
pub enum GlobalPoolConfig {
    /// 256-byte pool
    Pool256,
    /// 512-byte pool
    Pool512,
    /// 1KB pool
    Pool1K,
    /// 2KB pool
    Pool2K,
    /// 4KB pool
    Pool4K,
}

impl GlobalPoolConfig {
    /// Initializes the global pool with this configuration
    ///
    /// Creates a static pool internally for the selected capacity, keys it,
    /// and points the global at it.
    pub fn init(self, key: &[u8; KEY_SIZE], seed: u64) {
        macro_rules! init_static {
            ($capacity:expr) => {{
                static mut POOL: EncPoolAllocator<[u8; $capacity]> = EncPoolAllocator::new();
                unsafe {
                    let pool = &mut *core::ptr::addr_of_mut!(POOL);
                    pool.init(key, seed);
                    init_global_allocator(pool)
                }
            }};
        }
        match self {
            GlobalPoolConfig::Pool256 => init_static!(256),
            GlobalPoolConfig::Pool512 => init_static!(512),
            GlobalPoolConfig::Pool1K => init_static!(1024),
            GlobalPoolConfig::Pool2K => init_static!(2048),
            GlobalPoolConfig::Pool4K => init_static!(4096),
        }
    }
}

/// Type-erased global allocator storage
struct GlobalStorage {
    /// Pointer to the host's allocator (stored as dyn Allocator trait object)
    allocator_ptr: UnsafeCell<Option<&'static mut dyn Allocator>>,
}

unsafe impl Sync for GlobalStorage {}

impl GlobalStorage {
    const fn new() -> Self {
        Self {
            allocator_ptr: UnsafeCell::new(None),
        }
    }

    fn init<A: Allocator + 'static>(&self, allocator: &'static mut A) {
        unsafe {
            *self.allocator_ptr.get() = Some(allocator);
        }
    }
}

static GLOBAL: GlobalStorage = GlobalStorage::new();

/// Initializes the global allocator with a custom pool
///
/// This is **optional** - if never called, the global auto-initializes with
/// [`GlobalPoolConfig::Pool256`] and an all-zero key on first use. Call this
/// to size and key the pool for your application.
///
/// # Example
/// ```rust,ignore
/// use encalloc::prelude::*;
///
/// static mut MY_POOL: EncPoolAllocator<[u8; 4096]> = EncPoolAllocator::new();
///
/// fn main() {
///     unsafe {
///         let pool = &mut *core::ptr::addr_of_mut!(MY_POOL);
///         pool.init(&[0u8; KEY_SIZE], 1);
///         init_global_allocator(pool);
///     }
/// }
/// ```
pub fn init_global_allocator<A: Allocator + 'static>(allocator: &'static mut A) {
    GLOBAL.init(allocator);
}

/// Wrapper type that implements Allocator by forwarding to the global pool
///
/// This lets code written against `&mut impl Allocator` run unchanged on the
/// global instance.
pub struct GlobalAllocatorRef;

impl Allocator for GlobalAllocatorRef {
    fn encalloc(&mut self, nbytes: usize) -> Option<Handle> {
        unsafe {
            (*GLOBAL.allocator_ptr.get())
                .as_deref_mut()
                .unwrap()
                .encalloc(nbytes)
        }
    }

    fn encfree(&mut self, mem: Option<Handle>) {
        unsafe {
            (*GLOBAL.allocator_ptr.get())
                .as_deref_mut()
                .unwrap()
                .encfree(mem)
        }
    }

    fn get(&self, mem: Handle) -> Option<&[u8]> {
        unsafe { (*GLOBAL.allocator_ptr.get()).as_deref().unwrap().get(mem) }
    }

    fn get_mut(&mut self, mem: Handle) -> Option<&mut [u8]> {
        unsafe {
            (*GLOBAL.allocator_ptr.get())
                .as_deref_mut()
                .unwrap()
                .get_mut(mem)
        }
    }

    fn len(&self) -> usize {
        unsafe { (*GLOBAL.allocator_ptr.get()).as_deref().unwrap().len() }
    }

    fn capacity(&self) -> usize {
        unsafe { (*GLOBAL.allocator_ptr.get()).as_deref().unwrap().capacity() }
    }

    fn header_size(&self) -> usize {
        unsafe {
            (*GLOBAL.allocator_ptr.get())
                .as_deref()
                .unwrap()
                .header_size()
        }
    }

    fn alloc(&mut self, data: &[u8]) -> Option<Handle> {
        unsafe {
            (*GLOBAL.allocator_ptr.get())
                .as_deref_mut()
                .unwrap()
                .alloc(data)
        }
    }

    fn clear(&mut self) {
        unsafe {
            (*GLOBAL.allocator_ptr.get())
                .as_deref_mut()
                .unwrap()
                .clear()
        }
    }
}

/// Executes a closure with a reference to the global allocator
///
/// If the global pool has not been initialized, it auto-initializes with
/// [`GlobalPoolConfig::Pool256`], an all-zero key, and seed 0.
#[inline]
pub fn with_global_allocator<F, R>(f: F) -> R
where
    F: FnOnce(&mut GlobalAllocatorRef) -> R,
{
    // Auto-initialize with the default if not already configured
    unsafe {
        if (*GLOBAL.allocator_ptr.get()).is_none() {
            GlobalPoolConfig::Pool256.init(&[0u8; KEY_SIZE], 0);
        }
    }
    f(&mut GlobalAllocatorRef)
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test drives the whole module: the global is process-wide state, and
    // splitting this up would make the assertions race under the default
    // parallel test runner.
    #[test]
    fn test_global_pool_lifecycle() {
        static mut POOL: EncPoolAllocator<[u8; 1024]> = EncPoolAllocator::new();
        let key = [7u8; KEY_SIZE];
        unsafe {
            let pool = &mut *core::ptr::addr_of_mut!(POOL);
            pool.init(&key, 21);
            init_global_allocator(pool);
        }

        with_global_allocator(|pool| {
            assert_eq!(pool.capacity(), 1024);
            assert_eq!(pool.len(), 0);

            let handle = pool.alloc(b"test").unwrap();
            assert_eq!(&pool.get(handle).unwrap()[..4], b"test");
            assert_eq!(pool.len(), 1);

            pool.encfree(Some(handle));
            pool.encfree(Some(handle)); // absorbed
            assert_eq!(pool.len(), 0);
        });

        // re-pointing the global at a preset pool
        GlobalPoolConfig::Pool512.init(&key, 5);
        with_global_allocator(|pool| {
            assert_eq!(pool.capacity(), 512);
            let handle = pool.encalloc(64).unwrap();
            pool.encfree(Some(handle));
            assert!(pool.is_empty());
        });
    }
}
