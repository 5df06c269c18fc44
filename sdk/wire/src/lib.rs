pub mod codec;
pub mod types;

pub use codec::{ByteReader, WireError, put_bytes, put_u32};
pub use types::{
    SECRET_TOTAL_LEN, decode_cipher_pairs, decode_item_ids, decode_secret_total,
    encode_cipher_pairs, encode_item_ids, encode_secret_total,
};
