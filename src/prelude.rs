//! Prelude module for convenient imports
//!
//! This is the **only public API** for EncAlloc. All items should be accessed
//! through:
//! ```
//! use encalloc::prelude::*;
//! ```

pub use crate::Allocator;
pub use crate::Handle;
pub use crate::PoolError;
pub use crate::{HEADER_SIZE, KEY_SIZE};

#[cfg(feature = "encpool")]
pub use crate::backend::encpool::EncPoolAllocator;

#[cfg(feature = "global-alloc")]
pub use crate::global::{GlobalPoolConfig, init_global_allocator, with_global_allocator};
