use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppError, Message, MessageKey};

static ID_COUNTER: AtomicU32 = AtomicU32::new(0);
static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();

/// Storage identifier: a fixed-length lowercase hexadecimal token.
///
/// Layout is a 4-byte seconds timestamp, a 5-byte per-process random value
/// and a 3-byte counter, so ids minted by one process sort in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Number of hexadecimal characters in a well-formed id.
    pub const LENGTH: usize = 24;

    /// Mints a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        let seconds = u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX);
        let process_unique = PROCESS_UNIQUE.get_or_init(|| {
            let bytes = Uuid::new_v4().into_bytes();
            [bytes[0], bytes[1], bytes[2], bytes[3], bytes[4]]
        });
        let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed) & 0x00FF_FFFF;

        let mut value = format!("{seconds:08x}");
        for byte in process_unique {
            value.push_str(&format!("{byte:02x}"));
        }
        value.push_str(&format!("{counter:06x}"));

        Self(value)
    }

    /// Returns whether the value has the shape of an id token.
    #[must_use]
    pub fn is_well_formed(value: &str) -> bool {
        value.len() == Self::LENGTH && value.bytes().all(|byte| byte.is_ascii_hexdigit())
    }

    /// Parses a well-formed id, normalising it to lowercase.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::is_well_formed(value).then(|| Self(value.to_ascii_lowercase()))
    }

    /// Returns the underlying token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for EntityId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value).ok_or_else(|| {
            AppError::validation(Message::new(MessageKey::InvalidId).with("id", value))
        })
    }
}

impl TryFrom<String> for EntityId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.0
    }
}

impl Display for EntityId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}
