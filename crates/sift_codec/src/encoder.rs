//! Deterministic binary encoder.
//!
//! The layout borrows CBOR's initial-byte scheme: a 3-bit major type and a
//! shortest-form length or argument. An [`IndexValue`] is written as a
//! two-element array `[type tag, payload]`.

use crate::error::{CodecError, CodecResult};
use crate::value::{IndexValue, ValueData};

pub(crate) const MAJOR_UNSIGNED: u8 = 0;
pub(crate) const MAJOR_NEGATIVE: u8 = 1;
pub(crate) const MAJOR_TEXT: u8 = 3;
pub(crate) const MAJOR_ARRAY: u8 = 4;
pub(crate) const MAJOR_MAP: u8 = 5;

pub(crate) const FALSE: u8 = 0xf4;
pub(crate) const TRUE: u8 = 0xf5;
pub(crate) const FLOAT32: u8 = 0xfa;
pub(crate) const FLOAT64: u8 = 0xfb;

/// Encode a single typed value.
///
/// # Errors
///
/// Returns an error if the value holds a NaN float.
pub fn encode_value(value: &IndexValue) -> CodecResult<Vec<u8>> {
    let mut encoder = ValueEncoder::new();
    encoder.write_value(value)?;
    Ok(encoder.into_bytes())
}

/// A streaming encoder for typed values and the containers around them.
///
/// Callers are responsible for writing map entries in a stable order; the
/// encoder itself never reorders.
pub struct ValueEncoder {
    buffer: Vec<u8>,
}

impl ValueEncoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new encoder with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Consume this encoder and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Write a map header announcing `len` key/value pairs.
    pub fn write_map_header(&mut self, len: usize) {
        self.write_head(MAJOR_MAP, len as u64);
    }

    /// Write an array header announcing `len` items.
    pub fn write_array_header(&mut self, len: usize) {
        self.write_head(MAJOR_ARRAY, len as u64);
    }

    /// Write a UTF-8 string.
    pub fn write_text(&mut self, text: &str) {
        self.write_head(MAJOR_TEXT, text.len() as u64);
        self.buffer.extend_from_slice(text.as_bytes());
    }

    /// Write an unsigned integer.
    pub fn write_u64(&mut self, n: u64) {
        self.write_head(MAJOR_UNSIGNED, n);
    }

    /// Write a signed integer.
    #[allow(clippy::cast_sign_loss)]
    pub fn write_i64(&mut self, n: i64) {
        if n >= 0 {
            self.write_head(MAJOR_UNSIGNED, n as u64);
        } else {
            // -1 encodes as 0, -2 as 1, ...; -(n+1) never overflows.
            self.write_head(MAJOR_NEGATIVE, (-(n + 1)) as u64);
        }
    }

    /// Write a boolean.
    pub fn write_bool(&mut self, b: bool) {
        self.buffer.push(if b { TRUE } else { FALSE });
    }

    /// Write a single precision float.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NaNForbidden`] for NaN.
    pub fn write_f32(&mut self, n: f32) -> CodecResult<()> {
        if n.is_nan() {
            return Err(CodecError::NaNForbidden);
        }
        self.buffer.push(FLOAT32);
        self.buffer.extend_from_slice(&n.to_bits().to_be_bytes());
        Ok(())
    }

    /// Write a double precision float.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NaNForbidden`] for NaN.
    pub fn write_f64(&mut self, n: f64) -> CodecResult<()> {
        if n.is_nan() {
            return Err(CodecError::NaNForbidden);
        }
        self.buffer.push(FLOAT64);
        self.buffer.extend_from_slice(&n.to_bits().to_be_bytes());
        Ok(())
    }

    /// Write a typed value as `[tag, payload]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value holds a NaN float.
    pub fn write_value(&mut self, value: &IndexValue) -> CodecResult<()> {
        self.write_array_header(2);
        self.write_u64(u64::from(value.value_type().tag()));
        match value.data() {
            ValueData::Text(s) => self.write_text(s),
            ValueData::TextArray(items) => {
                self.write_array_header(items.len());
                for item in items {
                    self.write_text(item);
                }
            }
            ValueData::Bool(b) => self.write_bool(*b),
            ValueData::Int32(n) => self.write_i64(i64::from(*n)),
            ValueData::Int32Array(items) => {
                self.write_array_header(items.len());
                for item in items {
                    self.write_i64(i64::from(*item));
                }
            }
            ValueData::Int64(n) => self.write_i64(*n),
            ValueData::Float32(n) => self.write_f32(*n)?,
            ValueData::Float64(n) => self.write_f64(*n)?,
            ValueData::DateTime(dt) => {
                self.write_array_header(2);
                self.write_i64(dt.timestamp());
                self.write_u64(u64::from(dt.timestamp_subsec_nanos()));
            }
        }
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_head(&mut self, major_type: u8, value: u64) {
        let mt = major_type << 5;

        if value < 24 {
            self.buffer.push(mt | (value as u8));
        } else if u8::try_from(value).is_ok() {
            self.buffer.push(mt | 24);
            self.buffer.push(value as u8);
        } else if u16::try_from(value).is_ok() {
            self.buffer.push(mt | 25);
            self.buffer.extend_from_slice(&(value as u16).to_be_bytes());
        } else if u32::try_from(value).is_ok() {
            self.buffer.push(mt | 26);
            self.buffer.extend_from_slice(&(value as u32).to_be_bytes());
        } else {
            self.buffer.push(mt | 27);
            self.buffer.extend_from_slice(&value.to_be_bytes());
        }
    }
}

impl Default for ValueEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_heads_use_shortest_form() {
        let mut enc = ValueEncoder::new();
        enc.write_u64(23);
        enc.write_u64(24);
        enc.write_u64(256);
        enc.write_i64(-1);
        enc.write_i64(-25);
        assert_eq!(
            enc.into_bytes(),
            vec![0x17, 0x18, 24, 0x19, 0x01, 0x00, 0x20, 0x38, 24]
        );
    }

    #[test]
    fn text_value_layout() {
        let bytes = encode_value(&IndexValue::from("ab")).unwrap();
        // [tag 0, "ab"]
        assert_eq!(bytes, vec![0x82, 0x00, 0x62, b'a', b'b']);
    }

    #[test]
    fn bool_value_layout() {
        let bytes = encode_value(&IndexValue::from(true)).unwrap();
        assert_eq!(bytes, vec![0x82, 0x02, TRUE]);
    }

    #[test]
    fn float_value_layout() {
        let bytes = encode_value(&IndexValue::from(1.0f64)).unwrap();
        assert_eq!(bytes[..3], [0x82, 0x07, FLOAT64]);
        assert_eq!(bytes.len(), 3 + 8);
    }

    #[test]
    fn nan_is_rejected() {
        assert_eq!(
            encode_value(&IndexValue::from(f64::NAN)),
            Err(CodecError::NaNForbidden)
        );
        assert_eq!(
            encode_value(&IndexValue::from(f32::NAN)),
            Err(CodecError::NaNForbidden)
        );
    }

    #[test]
    fn identical_values_encode_identically() {
        let a = encode_value(&IndexValue::from(vec![3, 1, 2])).unwrap();
        let b = encode_value(&IndexValue::from(vec![3, 1, 2])).unwrap();
        assert_eq!(a, b);
    }
}
