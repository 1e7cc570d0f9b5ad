use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Every polygon id string the process has seen, shared across threads.
static POLYGON_IDS: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Host-assigned polygon id (`"w_12"`, `"polygon_3"`), stored as a key into
/// `POLYGON_IDS` so sets, selection and history can hold it by value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PolygonId(Spur);

impl PolygonId {
    /// Id for `s`, registering it on first use. Ingest and deserialization
    /// go through here; host lookups use [`PolygonId::lookup`].
    pub fn intern(s: &str) -> Self {
        PolygonId(POLYGON_IDS.get_or_intern(s))
    }

    /// Id for `s` only if some polygon was ever registered under it.
    pub fn lookup(s: &str) -> Option<Self> {
        POLYGON_IDS.get(s).map(PolygonId)
    }

    /// The host-facing string, as written in save files and diagnostics.
    pub fn as_str(&self) -> &str {
        POLYGON_IDS.resolve(&self.0)
    }

    /// Generate a candidate id with a prefix (e.g. `polygon_7`).
    ///
    /// The counter is process-wide, so candidates never repeat; callers that
    /// need uniqueness within a set (ingested ids may already use the same
    /// pattern) go through `PolygonSet::fresh_id`.
    pub fn with_prefix(prefix: &str) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self::intern(&format!("{prefix}_{n}"))
    }
}

impl fmt::Debug for PolygonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PolygonId({})", self.as_str())
    }
}

impl fmt::Display for PolygonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PolygonId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PolygonId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(PolygonId::intern(&s))
    }
}
