//! Salted, iterated SHA-256 key stretching (§4.2) and the key envelope's passphrase wrapper.

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// A passphrase prepared for key stretching.
///
/// Keeps the `SHA256(passphrase || _)` state around so that [`PwsafeKey::stretch`] can be called
/// repeatedly (once on read to verify, and again by a caller who wants to change the passphrase
/// without re-typing it) without re-hashing the raw passphrase bytes each time.
#[derive(Clone)]
pub struct PwsafeKey {
    prepared: Sha256,
}

impl PwsafeKey {
    /// Prepares a key from the raw passphrase bytes.
    pub fn new(passphrase: &[u8]) -> Self {
        let mut prepared = Sha256::default();
        prepared.update(passphrase);
        PwsafeKey { prepared }
    }

    /// `H0 = SHA256(passphrase || salt)`, then `n_iter` rounds of `H_{i+1} = SHA256(H_i)`.
    pub fn stretch(&self, salt: &[u8; 32], n_iter: u32) -> Zeroizing<[u8; 32]> {
        let mut hasher = self.prepared.clone();
        hasher.update(salt);

        let mut buf = Zeroizing::new([0u8; 32]);
        hasher.finalize_into((&mut *buf).into());

        for _ in 0..n_iter {
            let mut round = Sha256::default();
            round.update(&*buf);
            round.finalize_into((&mut *buf).into());
        }

        buf
    }
}

/// Free-function form of the same derivation, matching the component as specified: pure,
/// deterministic, no held state.
pub fn stretch(salt: &[u8; 32], passphrase: &[u8], n_iter: u32) -> Zeroizing<[u8; 32]> {
    PwsafeKey::new(passphrase).stretch(salt, n_iter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let salt = [7u8; 32];
        let a = stretch(&salt, b"hunter2", 100);
        let b = stretch(&salt, b"hunter2", 100);
        assert_eq!(*a, *b);
    }

    #[test]
    fn depends_on_passphrase() {
        let salt = [1u8; 32];
        let a = stretch(&salt, b"correct horse", 50);
        let b = stretch(&salt, b"incorrect horse", 50);
        assert_ne!(*a, *b);
    }

    #[test]
    fn depends_on_salt() {
        let a = stretch(&[1u8; 32], b"password", 50);
        let b = stretch(&[2u8; 32], b"password", 50);
        assert_ne!(*a, *b);
    }

    #[test]
    fn depends_on_iteration_count() {
        let salt = [3u8; 32];
        let a = stretch(&salt, b"password", 50);
        let b = stretch(&salt, b"password", 51);
        assert_ne!(*a, *b);
    }
}
