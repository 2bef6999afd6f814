// Entry codec boundary (spec section 4.1).
//
// `encode`/`decode` must round-trip every field losslessly. The manager
// never versions records itself; binary-format compatibility across
// restarts is entirely the codec's responsibility, per spec section 6.

use crate::entry::Entry;
use crate::error::{Error, Result};
use rkyv::AlignedVec;

/// Schema version prefixed to every `RkyvCodec`-encoded record.
const SCHEMA_VERSION: u8 = 1;

/// Converts an [`Entry`] to and from opaque bytes.
///
/// Implementations are injected into [`crate::pool::MetadataPool`]; the pool
/// and manager only depend on this trait, never on a concrete serialization
/// format.
pub trait Codec: Send + Sync {
    fn encode(&self, entry: &Entry) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<Entry>;
}

/// Default codec: zero-copy `rkyv` archives, schema-version-prefixed so a
/// format change can be detected rather than silently misread.
#[derive(Debug, Default, Clone, Copy)]
pub struct RkyvCodec;

impl Codec for RkyvCodec {
    fn encode(&self, entry: &Entry) -> Result<Vec<u8>> {
        let bytes = rkyv::to_bytes::<_, 256>(entry)
            .map_err(|e| Error::Codec(format!("failed to serialize entry: {e}")))?;
        let mut out = Vec::with_capacity(bytes.len() + 1);
        out.push(SCHEMA_VERSION);
        out.extend_from_slice(&bytes);
        Ok(out)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Entry> {
        if bytes.is_empty() {
            return Err(Error::Codec("empty byte array".to_string()));
        }
        let version = bytes[0];
        if version != SCHEMA_VERSION {
            return Err(Error::Codec(format!("unsupported schema version: {version}")));
        }

        let mut aligned = AlignedVec::new();
        aligned.extend_from_slice(&bytes[1..]);

        let archived = rkyv::check_archived_root::<Entry>(&aligned)
            .map_err(|e| Error::Codec(format!("failed to validate archived entry: {e}")))?;

        archived
            .deserialize(&mut rkyv::Infallible)
            .map_err(|e: std::convert::Infallible| Error::Codec(e.to_string()))
    }
}

/// Human-readable alternate codec, useful when cache contents need to be
/// inspected without a deserializer (debugging, a dev `sled` browser, ...).
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, entry: &Entry) -> Result<Vec<u8>> {
        serde_json::to_vec(entry).map_err(|e| Error::Codec(format!("json encode: {e}")))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Entry> {
        serde_json::from_slice(bytes).map_err(|e| Error::Codec(format!("json decode: {e}")))
    }
}
