// Quickstart: open an in-memory-backed cache manager, admit a few entries,
// pin one against eviction, and watch a low-capacity FIFO policy evict the
// rest.

use fcache::{
    CacheManager, CacheManagerOptions, Error, FifoPolicy, FsFileStore, MemoryStore, RkyvCodec,
};

fn main() -> fcache::Result<()> {
    let manager = CacheManager::new(CacheManagerOptions::new(
        200,
        Box::new(MemoryStore::new()),
        Box::new(RkyvCodec),
        Box::new(FifoPolicy::default()),
        Box::new(FsFileStore),
    ))?;

    println!("capacity: {} bytes", manager.cap());

    manager.register(&["tile_0_0.png"])?;
    manager.set("tile_0_0.png", 40)?;
    manager.set("tile_0_1.png", 60)?;
    manager.set("tile_0_2.png", 50)?;
    println!("usage after three tiles: {} bytes", manager.usage());

    // Admitting a fourth, larger tile forces FIFO eviction of unpinned
    // entries; the pinned tile survives.
    manager.set("tile_1_0.png", 90)?;
    println!("usage after eviction: {} bytes", manager.usage());
    assert!(manager.get("tile_0_0.png").is_ok(), "pinned tile must survive eviction");

    manager.unregister(&["tile_0_0.png"])?;

    // once() lets a producer reserve space before doing its own I/O, then
    // roll the reservation back on failure.
    let downloaded = manager.once("tile_2_0.png", |ctx| {
        let entry = ctx.put("tile_2_0.png", 30)?;
        println!("materialized {} ({} bytes)", entry.key(), entry.size());
        Ok(entry)
    })?;
    println!("once() returned entry id {}", downloaded.id());

    match manager.get("missing_tile.png") {
        Err(Error::NoSuchKey(key)) => println!("no entry for {key}, as expected"),
        other => panic!("unexpected result: {other:?}"),
    }

    Ok(())
}
