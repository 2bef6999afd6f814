// Custom storage: swap the in-memory backend for the embedded `sled`
// store, and implement a `FileStore` that actually removes files from a
// scratch directory when the manager evicts them.

use fcache::{CacheManager, CacheManagerOptions, FifoPolicy, FsFileStore, RkyvCodec, SledStore};
use std::fs;
use std::path::PathBuf;

fn main() -> fcache::Result<()> {
    let scratch = std::env::temp_dir().join("fcache-custom-storage-demo");
    fs::create_dir_all(&scratch)?;

    let metadata_path: PathBuf = scratch.join("metadata.sled");
    let backend = SledStore::open(&metadata_path)?;

    let manager = CacheManager::new(CacheManagerOptions::new(
        10_000,
        Box::new(backend),
        Box::new(RkyvCodec),
        Box::new(FifoPolicy::default()),
        // FsFileStore removes real files; here every "file" is just a
        // zero-byte placeholder under `scratch` so the demo can run
        // without a real download step.
        Box::new(FsFileStore),
    ))?;

    for i in 0..5 {
        let path = scratch.join(format!("artifact_{i}.bin"));
        fs::write(&path, vec![0u8; 1024])?;
        manager.set(path.to_str().unwrap(), 1024)?;
    }

    println!("usage after five artifacts: {} bytes", manager.usage());

    // Re-opening the same sled path picks up where we left off: usage is
    // recovered by summing real entries at construction time.
    manager.close()?;
    let reopened = CacheManager::new(CacheManagerOptions::new(
        10_000,
        Box::new(SledStore::open(&metadata_path)?),
        Box::new(RkyvCodec),
        Box::new(FifoPolicy::default()),
        Box::new(FsFileStore),
    ))?;
    println!("usage after reopening: {} bytes", reopened.usage());

    fs::remove_dir_all(&scratch).ok();
    Ok(())
}
