use crate::codec::{ByteReader, WireError, put_bytes, put_u32};

/// Aggregate secret totals travel as 8-byte big-endian integers.
pub const SECRET_TOTAL_LEN: usize = 8;

/// `u32 be count ‖ repeated(u32 be idLen ‖ id bytes)`
pub fn encode_item_ids<S: AsRef<str>>(ids: &[S]) -> Result<Vec<u8>, WireError> {
    let count = u32::try_from(ids.len()).map_err(|_| WireError::Oversized(ids.len()))?;
    let mut out = Vec::new();
    put_u32(&mut out, count);
    for id in ids {
        put_bytes(&mut out, id.as_ref().as_bytes())?;
    }
    Ok(out)
}

pub fn decode_item_ids(bytes: &[u8]) -> Result<Vec<String>, WireError> {
    let mut reader = ByteReader::new(bytes);
    let count = reader.read_u32()? as usize;

    // each id needs at least its 4-byte prefix
    if count > reader.remaining() / 4 {
        return Err(WireError::Truncated {
            needed: count.saturating_mul(4),
            available: reader.remaining(),
        });
    }

    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let raw = reader.read_prefixed()?;
        let id = std::str::from_utf8(raw).map_err(|_| WireError::InvalidUtf8("item id"))?;
        ids.push(id.to_string());
    }
    reader.finish()?;
    Ok(ids)
}

pub fn encode_secret_total(total: u64) -> [u8; SECRET_TOTAL_LEN] {
    total.to_be_bytes()
}

pub fn decode_secret_total(bytes: &[u8]) -> Result<u64, WireError> {
    let arr: [u8; SECRET_TOTAL_LEN] = bytes.try_into().map_err(|_| WireError::InvalidLength {
        expected: SECRET_TOTAL_LEN,
        got: bytes.len(),
    })?;
    Ok(u64::from_be_bytes(arr))
}

/// Frames `(alpha, beta)` ciphertext pairs as
/// `repeated(u32 be len ‖ alpha ‖ u32 be len ‖ beta)`.
pub fn encode_cipher_pairs<A: AsRef<[u8]>>(pairs: &[(A, A)]) -> Result<Vec<u8>, WireError> {
    let mut out = Vec::new();
    for (alpha, beta) in pairs {
        put_bytes(&mut out, alpha.as_ref())?;
        put_bytes(&mut out, beta.as_ref())?;
    }
    Ok(out)
}

pub fn decode_cipher_pairs(bytes: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, WireError> {
    let mut reader = ByteReader::new(bytes);
    let mut pairs = Vec::new();
    while !reader.is_empty() {
        let alpha = reader.read_prefixed()?.to_vec();
        let beta = reader.read_prefixed()?.to_vec();
        pairs.push((alpha, beta));
    }
    Ok(pairs)
}
