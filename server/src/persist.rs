use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Concurrent snapshot writes must not share a temp file, so every write
/// gets its own suffix.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Writes `bytes` to a temporary file next to `path` and renames it into
/// place. A crash mid-write leaves the previous snapshot intact.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let serial = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp = path.with_extension(format!("tmp.{serial}"));
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}
