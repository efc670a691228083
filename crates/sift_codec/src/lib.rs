//! # Sift Codec
//!
//! Typed index values and their deterministic binary encoding.
//!
//! [`IndexValue`] is the single value model shared by indexing and querying:
//! documents store it, predicates compare against it and projections render
//! its canonical text. The encoder produces identical bytes for identical
//! inputs so encoded documents can be compared and hashed.
//!
//! ## Usage
//!
//! ```
//! use sift_codec::{decode_value, encode_value, IndexValue};
//!
//! let value = IndexValue::from(42i32);
//! let bytes = encode_value(&value).unwrap();
//! let decoded = decode_value(&bytes).unwrap();
//! assert_eq!(value, decoded);
//! assert_eq!(decoded.value_as_string(), "42");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod value;

pub use decoder::{decode_value, ValueDecoder};
pub use encoder::{encode_value, ValueEncoder};
pub use error::{CodecError, CodecResult};
pub use value::{format_date, IndexValue, IndexValueType, ValueData, NO, YES};

/// Types that write themselves into a [`ValueEncoder`].
pub trait Encode {
    /// Encode this value into bytes.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Types that read themselves back from bytes produced by [`Encode`].
pub trait Decode: Sized {
    /// Decode this value from bytes.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}

impl Encode for IndexValue {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        encode_value(self)
    }
}

impl Decode for IndexValue {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        decode_value(bytes)
    }
}
