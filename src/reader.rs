//! The V3 reader (§4.4): decrypts, authenticates, and parses a safe into header + records.
//!
//! Ordering is load-bearing. Tag, then the passphrase-hash check, then the key envelope, then
//! field parsing, then the HMAC — in that order, matching the reference engine
//! (`db/dbiov3.cc::reader::read`). The HMAC check is always last: nothing this function returns
//! should be trusted by a caller that didn't get `Ok` back.

use std::io::Read;

use block_padding::NoPadding;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use twofish::cipher::crypto_common::generic_array::GenericArray;
use twofish::cipher::crypto_common::{KeyInit, KeyIvInit};
use twofish::cipher::{BlockDecrypt, BlockDecryptMut};
use twofish::Twofish;
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::field::TERMINATOR;
use crate::header::Header;
use crate::key::PwsafeKey;
use crate::record::Record;

type TwofishCbcDec = cbc::Decryptor<Twofish>;
type HmacSha256 = Hmac<Sha256>;

const TAG: &[u8; 4] = b"PWS3";
const EOF_SENTINEL: &[u8; 16] = b"PWS3-EOFPWS3-EOF";

/// Everything recovered from a successfully authenticated V3 file.
pub struct Parsed {
    pub header: Header,
    pub records: Vec<Record>,
    /// The iteration count read from the file, for a caller that wants to preserve it across a
    /// rewrite (see [`crate::writer::Writer::new`]).
    pub iterations: u32,
}

/// Reads and authenticates a V3 safe from `source`, using `passphrase` to derive the key.
pub fn read<R: Read>(mut source: R, passphrase: &[u8]) -> Result<Parsed> {
    let mut tag = [0u8; 4];
    source.read_exact(&mut tag).map_err(|_| Error::InvalidTag)?;
    if &tag != TAG {
        return Err(Error::InvalidTag);
    }

    let mut salt = [0u8; 32];
    let mut iter_bytes = [0u8; 4];
    let mut stored_hash = [0u8; 32];
    read_exact_or_malformed(&mut source, &mut salt)?;
    read_exact_or_malformed(&mut source, &mut iter_bytes)?;
    read_exact_or_malformed(&mut source, &mut stored_hash)?;
    let iterations = u32::from_le_bytes(iter_bytes);

    let stretched = PwsafeKey::new(passphrase).stretch(&salt, iterations);

    let mut computed_hash = Sha256::default();
    computed_hash.update(&*stretched);
    let computed_hash = computed_hash.finalize();

    if computed_hash.as_slice().ct_eq(&stored_hash).unwrap_u8() != 1 {
        return Err(Error::InvalidPassword);
    }

    let mut k_envelope = Zeroizing::new([0u8; 32]);
    let mut l_envelope = Zeroizing::new([0u8; 32]);
    let mut iv = Zeroizing::new([0u8; 16]);
    read_exact_or_malformed(&mut source, &mut *k_envelope)?;
    read_exact_or_malformed(&mut source, &mut *l_envelope)?;
    read_exact_or_malformed(&mut source, &mut *iv)?;

    let envelope_cipher =
        Twofish::new_from_slice(&*stretched).map_err(|_| Error::MalformedFile)?;
    ecb_decrypt_in_place(&envelope_cipher, &mut *k_envelope);
    ecb_decrypt_in_place(&envelope_cipher, &mut *l_envelope);
    let k = k_envelope;
    let l = l_envelope;

    let mut buffer = Vec::new();
    source.read_to_end(&mut buffer).map_err(|_| Error::MalformedFile)?;

    let data_len = buffer.len().checked_sub(48).ok_or(Error::MalformedFile)?;
    if data_len % 16 != 0 {
        return Err(Error::MalformedFile);
    }

    let (plain, tail) = buffer.split_at_mut(data_len);
    let (eof, hmac_tag) = tail.split_at(16);

    if eof != EOF_SENTINEL {
        return Err(Error::MalformedFile);
    }

    let cbc_cipher = TwofishCbcDec::new_from_slices(&k, &iv).map_err(|_| Error::MalformedFile)?;
    cbc_cipher
        .decrypt_padded_mut::<NoPadding>(plain)
        .map_err(|_| Error::MalformedFile)?;

    let mut hmac = HmacSha256::new_from_slice(&l).map_err(|_| Error::MalformedFile)?;

    let mut cursor: &[u8] = plain;
    let header = read_header(&mut cursor, &mut hmac)?;
    let records = read_records(&mut cursor, &mut hmac)?;

    hmac.verify_slice(hmac_tag).map_err(|_| Error::HmacMismatch)?;

    Ok(Parsed { header, records, iterations })
}

fn read_exact_or_malformed<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<()> {
    source.read_exact(buf).map_err(|_| Error::MalformedFile)
}

fn ecb_decrypt_in_place(cipher: &Twofish, buf: &mut [u8; 32]) {
    for chunk in buf.chunks_exact_mut(16) {
        cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
    }
}

fn read_header(cursor: &mut &[u8], hmac: &mut HmacSha256) -> Result<Header> {
    let mut header = Header::empty();

    loop {
        match next_field(cursor, hmac)? {
            None => return Err(Error::MalformedFile),
            Some((TERMINATOR, _)) => break,
            Some((field_type, data)) => header.fields_mut().add(field_type, data),
        }
    }

    if header.version().is_none() {
        return Err(Error::MalformedFile);
    }

    Ok(header)
}

fn read_records(cursor: &mut &[u8], hmac: &mut HmacSha256) -> Result<Vec<Record>> {
    let mut records = Vec::new();

    loop {
        let mut record = Record::empty();
        let mut got_any_field = false;

        loop {
            match next_field(cursor, hmac)? {
                None if got_any_field => return Err(Error::MalformedFile),
                None => return Ok(records),
                Some((TERMINATOR, _)) => break,
                Some((field_type, data)) => {
                    record.fields_mut().add(field_type, data);
                    got_any_field = true;
                }
            }
        }

        if record.id().is_none() {
            return Err(Error::MalformedFile);
        }

        records.push(record);
    }
}

/// Reads one field from `cursor`, advancing it past the field's blocks and feeding the payload
/// bytes (only the payload — no length, type, or padding) into `hmac`.
///
/// Returns `None` when `cursor` is exhausted: by construction (the EOF sentinel and HMAC tag were
/// already stripped off in [`read`]), this is the clean end of the header or record stream.
fn next_field(cursor: &mut &[u8], hmac: &mut HmacSha256) -> Result<Option<(u8, Vec<u8>)>> {
    if cursor.is_empty() {
        return Ok(None);
    }

    if cursor.len() < 16 {
        return Err(Error::MalformedFile);
    }

    let first_block = &cursor[..16];
    let length = u32::from_le_bytes(first_block[..4].try_into().unwrap()) as u64;
    let field_type = first_block[4];

    let first_chunk_len = length.min(11) as usize;
    let remaining_after_first = length.saturating_sub(11);
    let trailing_blocks = remaining_after_first.div_ceil(16);

    let total_blocks = 1 + trailing_blocks;
    let total_bytes = total_blocks
        .checked_mul(16)
        .and_then(|b| usize::try_from(b).ok())
        .ok_or(Error::MalformedFile)?;

    if cursor.len() < total_bytes {
        return Err(Error::MalformedFile);
    }

    let mut payload = Vec::with_capacity(length as usize);
    payload.extend_from_slice(&first_block[5..5 + first_chunk_len]);

    let mut remaining = remaining_after_first;
    let mut offset = 16usize;
    while remaining > 0 {
        let take = remaining.min(16) as usize;
        payload.extend_from_slice(&cursor[offset..offset + take]);
        offset += 16;
        remaining -= take as u64;
    }

    hmac.update(&payload);
    *cursor = &cursor[total_bytes..];

    Ok(Some((field_type, payload)))
}
