//! Object identifiers for project records.
//!
//! Every record in a project file is keyed by a 24 character uppercase hex
//! token. Tokens are random, so regenerating a project yields new values; the
//! registry only guarantees uniqueness within one generation pass.

use rand::RngCore;
use rand::rngs::ThreadRng;
use std::collections::HashSet;
use std::fmt;

/// Number of random bytes behind one identifier.
const ID_BYTES: usize = 12;

/// Opaque identifier of one record in the project's object graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Text of the identifier.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.iter().map(|byte| format!("{byte:02X}")).collect())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issues identifiers that are unique within one generation pass.
///
/// # Examples
///
/// ```
/// use pbxgen::pbxproj::IdRegistry;
///
/// let mut ids = IdRegistry::new();
/// let a = ids.new_id();
/// let b = ids.new_id();
/// assert_ne!(a, b);
/// assert_eq!(a.as_str().len(), 24);
/// ```
#[derive(Debug)]
pub struct IdRegistry<R = ThreadRng> {
    rng: R,
    issued: HashSet<ObjectId>,
}

impl IdRegistry<ThreadRng> {
    /// Create a registry backed by the thread-local cryptographic generator.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(rand::thread_rng())
    }
}

impl Default for IdRegistry<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore> IdRegistry<R> {
    /// Create a registry drawing from `rng`.
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            issued: HashSet::new(),
        }
    }

    /// Issue a fresh identifier, never one returned before by this registry.
    pub fn new_id(&mut self) -> ObjectId {
        let mut bytes = [0_u8; ID_BYTES];
        loop {
            self.rng.fill_bytes(&mut bytes);
            let id = ObjectId::from_bytes(&bytes);
            if self.issued.insert(id.clone()) {
                return id;
            }
            tracing::debug!(%id, "discarding repeated object identifier");
        }
    }

    /// Number of identifiers issued so far.
    #[must_use]
    pub fn issued(&self) -> usize {
        self.issued.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::rstest;

    /// Replays a fixed byte per draw so repeats can be forced.
    struct Scripted {
        draws: std::vec::IntoIter<u8>,
    }

    impl RngCore for Scripted {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            let byte = self.draws.next().unwrap_or(0xFF);
            dest.fill(byte);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    #[rstest]
    fn ids_are_24_uppercase_hex_characters() {
        let mut ids = IdRegistry::with_rng(StdRng::seed_from_u64(7));
        for _ in 0..64 {
            let id = ids.new_id();
            assert_eq!(id.as_str().len(), 24);
            assert!(
                id.as_str()
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
            );
        }
    }

    #[rstest]
    fn repeated_draws_are_redrawn() {
        let mut ids = IdRegistry::with_rng(Scripted {
            draws: vec![0xAB, 0xAB, 0xAB, 0x01].into_iter(),
        });
        let first = ids.new_id();
        let second = ids.new_id();
        assert_eq!(first.as_str(), "ABABABABABABABABABABABAB");
        assert_eq!(second.as_str(), "010101010101010101010101");
        assert_eq!(ids.issued(), 2);
    }

    #[rstest]
    fn many_ids_stay_distinct() {
        let mut ids = IdRegistry::new();
        let drawn: HashSet<_> = (0..1000).map(|_| ids.new_id()).collect();
        assert_eq!(drawn.len(), 1000);
    }
}
