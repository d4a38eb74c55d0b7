//! Manual smoke test: the double-free torture sequence.
//!
//! Drives a 100-byte pool with an all-zero key through allocation,
//! exhaustion, repeated releases, and a wild free. Every release past the
//! first is absorbed by the header integrity check.

use encalloc::prelude::*;

fn main() {
    let key = [0u8; KEY_SIZE];
    let mut pool = EncPoolAllocator::<[u8; 100]>::new();
    pool.init(&key, 0);

    let buf = pool.encalloc(64);
    println!("buf alloc result: {buf:?}");
    if let Some(handle) = buf {
        let text = b"This is a string";
        pool.get_mut(handle).unwrap()[..text.len()].copy_from_slice(text);
        let stored = &pool.get(handle).unwrap()[..text.len()];
        println!("buf value: {}", core::str::from_utf8(stored).unwrap());
    }

    // the remaining space cannot hold a second header plus 64 bytes
    let buf2 = pool.encalloc(64);
    println!("buf2 alloc result: {buf2:?} (expected None)");
    pool.encfree(buf2);
    pool.encfree(buf2);

    pool.encfree(buf);
    pool.encfree(buf); // second release: absorbed
    pool.encfree(Some(Handle::new(10))); // wild offset: absorbed

    // the released region is immediately reusable
    let buf3 = pool.encalloc(64);
    println!("buf3 alloc result: {buf3:?}");
    if let Some(handle) = buf3 {
        let text = b"This is a different string";
        pool.get_mut(handle).unwrap()[..text.len()].copy_from_slice(text);
        let stored = &pool.get(handle).unwrap()[..text.len()];
        println!("buf3 value: {}", core::str::from_utf8(stored).unwrap());
    }

    pool.encfree(buf3);
    pool.encfree(buf3);

    println!("live blocks at exit: {}", pool.len());
}
