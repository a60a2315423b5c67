use lasso::{Spur, ThreadedRodeo};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

use crate::model::FieldKind;

/// Global string interner for instance IDs.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Identity of one placed field instance, independent of its kind.
/// Internally a `Spur` index: 4 bytes, Copy, O(1) Eq and Hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(Spur);

impl InstanceId {
    /// Intern a string as an InstanceId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        InstanceId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Look up an already-interned id without interning `s`.
    pub fn lookup(s: &str) -> Option<Self> {
        INTERNER.get(s).map(InstanceId)
    }
}

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for InstanceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for InstanceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(InstanceId::intern(&s))
    }
}

/// Mints `<kind>_<timestamp>_<suffix>` ids.
///
/// The suffix mixes a seeded RNG with a per-generator sequence number, so
/// two ids minted in the same millisecond for the same kind still differ.
pub struct IdGenerator {
    rng: StdRng,
    seq: u32,
}

impl IdGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seq: 0,
        }
    }

    pub fn next(&mut self, kind: &FieldKind, timestamp_ms: u64) -> InstanceId {
        self.seq = self.seq.wrapping_add(1);
        let suffix: u32 = self.rng.random();
        InstanceId::intern(&format!(
            "{}_{timestamp_ms}_{suffix:08x}{:04x}",
            kind.as_str(),
            self.seq & 0xffff
        ))
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator").field("seq", &self.seq).finish()
    }
}
