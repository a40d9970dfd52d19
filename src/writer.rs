//! The V3 writer (§4.5): encrypts and authenticates a header + records stream.
//!
//! Mirrors [`crate::reader`] in reverse, field for field. Iteration count is a constructor
//! parameter rather than hardwired so a caller re-saving a file can choose to preserve the
//! iteration count it was opened with; [`crate::database::Database`] itself always passes the
//! fixed default of 2048 on save, per spec.

use std::io::{self, Write};

use block_padding::ZeroPadding;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use twofish::cipher::crypto_common::generic_array::GenericArray;
use twofish::cipher::crypto_common::{KeyInit, KeyIvInit};
use twofish::cipher::{BlockEncrypt, BlockEncryptMut};
use twofish::Twofish;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{Error, Result};
use crate::key::PwsafeKey;

type TwofishCbcEnc = cbc::Encryptor<Twofish>;
type HmacSha256 = Hmac<Sha256>;

/// The fixed iteration count [`crate::database::Database`] uses on every save.
pub const DEFAULT_ITERATIONS: u32 = 2048;

/// Builds one V3 safe image field by field, then seals it with [`Writer::finish`].
pub struct Writer<W> {
    inner: W,
    buffer: Vec<u8>,
    k: Zeroizing<[u8; 32]>,
    iv: Zeroizing<[u8; 16]>,
    hmac: HmacSha256,
}

impl<W: Write> Writer<W> {
    /// Writes the tag, a fresh salt, the passphrase-hash verifier, and a freshly generated K/L/IV
    /// key envelope. Nothing past this point can be written without a matching [`Writer::finish`].
    pub fn new(mut inner: W, iterations: u32, passphrase: &[u8]) -> Result<Self> {
        inner.write_all(b"PWS3").map_err(Error::WriteError)?;

        let mut salt = [0u8; 32];
        OsRng.fill_bytes(&mut salt);
        inner.write_all(&salt).map_err(Error::WriteError)?;
        inner
            .write_all(&iterations.to_le_bytes())
            .map_err(Error::WriteError)?;

        let stretched = PwsafeKey::new(passphrase).stretch(&salt, iterations);

        let mut hasher = Sha256::default();
        hasher.update(&*stretched);
        let hash = hasher.finalize();
        inner.write_all(&hash).map_err(Error::WriteError)?;

        let mut k = Zeroizing::new([0u8; 32]);
        let mut l = Zeroizing::new([0u8; 32]);
        let mut iv = Zeroizing::new([0u8; 16]);
        OsRng.fill_bytes(&mut *k);
        OsRng.fill_bytes(&mut *l);
        OsRng.fill_bytes(&mut *iv);

        let mut k_envelope = *k;
        let mut l_envelope = *l;

        let envelope_cipher = Twofish::new_from_slice(&*stretched)
            .map_err(|_| Error::Unspecified(io::Error::new(io::ErrorKind::Other, "bad key length")))?;
        for chunk in k_envelope.chunks_exact_mut(16) {
            envelope_cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
        }
        for chunk in l_envelope.chunks_exact_mut(16) {
            envelope_cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
        }

        inner.write_all(&k_envelope).map_err(Error::WriteError)?;
        inner.write_all(&l_envelope).map_err(Error::WriteError)?;
        inner.write_all(&iv).map_err(Error::WriteError)?;

        let hmac = HmacSha256::new_from_slice(&*l)
            .map_err(|_| Error::Unspecified(io::Error::new(io::ErrorKind::Other, "bad hmac key length")))?;
        l_envelope.zeroize();

        Ok(Writer { inner, buffer: Vec::new(), k, iv, hmac })
    }

    /// Buffers one field's TLV blocks (not yet written to `inner`) and feeds its payload bytes
    /// into the running HMAC.
    pub fn write_field(&mut self, field_type: u8, data: &[u8]) -> Result<()> {
        self.hmac.update(data);

        let mut i = 0usize;
        loop {
            let mut block = [0u8; 16];
            let chunk_len;
            if i == 0 {
                block[..4].copy_from_slice(&(data.len() as u32).to_le_bytes());
                block[4] = field_type;
                chunk_len = data.len().min(11);
                block[5..5 + chunk_len].copy_from_slice(&data[..chunk_len]);
            } else {
                chunk_len = (data.len() - i).min(16);
                block[..chunk_len].copy_from_slice(&data[i..i + chunk_len]);
            }

            let filled = if i == 0 { 5 + chunk_len } else { chunk_len };
            OsRng.fill_bytes(&mut block[filled..16]);
            self.buffer.extend_from_slice(&block);

            i += chunk_len;
            if i >= data.len() {
                break;
            }
        }

        Ok(())
    }

    /// CBC-encrypts the buffered fields, then writes them, the EOF sentinel, and the HMAC tag.
    pub fn finish(mut self) -> Result<W> {
        let pos = self.buffer.len();
        let cbc_cipher = TwofishCbcEnc::new_from_slices(&self.k, &self.iv)
            .map_err(|_| Error::Unspecified(io::Error::new(io::ErrorKind::Other, "bad cbc key length")))?;
        cbc_cipher
            .encrypt_padded_mut::<ZeroPadding>(&mut self.buffer, pos)
            .map_err(|_| Error::Unspecified(io::Error::new(io::ErrorKind::Other, "padding overflow")))?;

        self.inner.write_all(&self.buffer).map_err(Error::WriteError)?;
        self.inner.write_all(b"PWS3-EOFPWS3-EOF").map_err(Error::WriteError)?;
        self.inner
            .write_all(&self.hmac.finalize().into_bytes())
            .map_err(Error::WriteError)?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::TERMINATOR;
    use std::io::Cursor;

    #[test]
    fn field_under_eleven_bytes_fits_one_block() {
        let mut out = Vec::new();
        let mut writer = Writer::new(Cursor::new(&mut out), 1, b"pw").unwrap();
        writer.write_field(0x03, b"hi").unwrap();
        assert_eq!(writer.buffer.len(), 16);
    }

    #[test]
    fn field_over_eleven_bytes_spans_blocks() {
        let mut out = Vec::new();
        let mut writer = Writer::new(Cursor::new(&mut out), 1, b"pw").unwrap();
        writer.write_field(0x05, &[7u8; 30]).unwrap();
        assert_eq!(writer.buffer.len(), 48);
    }

    #[test]
    fn finish_writes_eof_sentinel_and_32_byte_hmac() {
        let mut out = Vec::new();
        {
            let mut writer = Writer::new(Cursor::new(&mut out), 1, b"pw").unwrap();
            writer.write_field(0x00, &[3, 0]).unwrap();
            writer.write_field(TERMINATOR, &[]).unwrap();
            writer.finish().unwrap();
        }
        assert_eq!(&out[out.len() - 48..out.len() - 32], b"PWS3-EOFPWS3-EOF");
    }
}
