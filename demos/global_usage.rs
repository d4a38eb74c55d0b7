//! Global pool usage: configure once, allocate anywhere.

use encalloc::prelude::*;

fn main() {
    let key = [0x42u8; KEY_SIZE];
    GlobalPoolConfig::Pool1K.init(&key, 7);

    with_global_allocator(|pool| {
        let handle = pool.alloc(b"global pool").unwrap();
        println!(
            "stored {:?} at offset {}",
            core::str::from_utf8(&pool.get(handle).unwrap()[..11]).unwrap(),
            handle.offset
        );
        pool.encfree(Some(handle));
        println!("live blocks: {}", pool.len());
    });
}
