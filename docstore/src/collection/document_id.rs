use crate::errors::{ErrorKind, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use rand::Rng;
use serde::ser::{Serialize, Serializer};
use std::fmt::{Debug, Display};
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

const COUNTER_MASK: u32 = 0x00FF_FFFF;

/// Per-process component shared by every id generated in this process.
static PROCESS_UNIQUE: Lazy<[u8; 5]> = Lazy::new(|| {
    let uuid = uuid::Uuid::new_v4();
    let uid = uuid.as_bytes();
    let rnd = OsRng.gen::<u32>().to_be_bytes();
    let unique = [
        uid[uid.len() - 1] ^ rnd[0],
        uid[uid.len() - 2] ^ rnd[1],
        uid[uid.len() - 3] ^ rnd[2],
        uid[uid.len() - 4] ^ rnd[3],
        uid[0],
    ];
    log::debug!("Initialized document id generator");
    unique
});

static COUNTER: Lazy<AtomicU32> = Lazy::new(|| AtomicU32::new(OsRng.gen_range(0..=COUNTER_MASK)));

/// A unique identifier for stored documents.
///
/// Every document written through the façade carries one under `_id`. If the
/// caller does not supply it, one is generated on insert.
///
/// # Layout
///
/// Twelve bytes, rendered as 24 lowercase hex characters:
/// - 4 bytes: seconds since the Unix epoch, big-endian
/// - 5 bytes: random value fixed for the lifetime of the process
/// - 3 bytes: counter, big-endian, starting at a random value
///
/// Ids generated by one process sort by creation second.
///
/// # Examples
///
/// ```rust,ignore
/// use docstore::collection::DocumentId;
///
/// let id = DocumentId::new();
/// let parsed: DocumentId = id.to_hex().parse()?;
/// assert_eq!(id, parsed);
/// ```
#[derive(PartialEq, Eq, Ord, PartialOrd, Hash, Clone, Copy)]
pub struct DocumentId {
    bytes: [u8; 12],
}

impl DocumentId {
    /// Generates a new unique `DocumentId`.
    pub fn new() -> Self {
        let seconds = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..4]);
        DocumentId { bytes }
    }

    /// Creates a `DocumentId` from its raw bytes.
    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        DocumentId { bytes }
    }

    /// Parses the 24-character hex form.
    ///
    /// # Errors
    ///
    /// Returns a [ErrorKind::ValidationError] if the text is not exactly 24
    /// hex digits.
    pub fn parse_str(text: &str) -> StoreResult<DocumentId> {
        if !DocumentId::is_valid_hex(text) {
            log::error!("Invalid document id {:?}", text);
            return Err(StoreError::new(
                &format!("Invalid document id {:?}: expected 24 hex characters", text),
                ErrorKind::ValidationError,
            ));
        }

        let mut bytes = [0u8; 12];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = &text[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(pair, 16).map_err(|_| {
                log::error!("Invalid document id {:?}", text);
                StoreError::new(
                    &format!("Invalid document id {:?}: expected 24 hex characters", text),
                    ErrorKind::ValidationError,
                )
            })?;
        }
        Ok(DocumentId { bytes })
    }

    /// Checks whether `text` looks like the hex form of an id.
    pub fn is_valid_hex(text: &str) -> bool {
        text.len() == 24 && text.bytes().all(|b| b.is_ascii_hexdigit())
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.bytes
    }

    /// The creation time embedded in the id, at second precision.
    pub fn timestamp(&self) -> DateTime<Utc> {
        let seconds = u32::from_be_bytes([self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3]]);
        DateTime::from_timestamp(seconds as i64, 0).unwrap_or_default()
    }

    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        DocumentId::new()
    }
}

impl Debug for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DocumentId(\"{}\")", self.to_hex())
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for DocumentId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentId::parse_str(s)
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
