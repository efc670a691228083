//! Binary decoder, the exact inverse of [`crate::ValueEncoder`].

use crate::encoder::{
    FALSE, FLOAT32, FLOAT64, MAJOR_ARRAY, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_TEXT, MAJOR_UNSIGNED,
    TRUE,
};
use crate::error::{CodecError, CodecResult};
use crate::value::{IndexValue, IndexValueType, ValueData};
use chrono::{TimeZone, Utc};

/// Decode a single typed value and require that all input is consumed.
///
/// # Errors
///
/// Returns an error if the bytes are malformed, truncated, or followed by
/// trailing data.
pub fn decode_value(bytes: &[u8]) -> CodecResult<IndexValue> {
    let mut decoder = ValueDecoder::new(bytes);
    let value = decoder.read_value()?;
    if !decoder.is_empty() {
        return Err(CodecError::invalid_structure("trailing bytes after value"));
    }
    Ok(value)
}

/// Maximum allowed element count for arrays and maps.
/// Bounds allocations driven by untrusted input.
const MAX_CONTAINER_ELEMENTS: u64 = 16 * 1024 * 1024;

/// Maximum allowed string length in bytes.
const MAX_TEXT_LENGTH: u64 = 64 * 1024 * 1024;

/// A streaming decoder over a byte slice.
pub struct ValueDecoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ValueDecoder<'a> {
    /// Create a new decoder for the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Check if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Get remaining bytes.
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /// Read a map header and return the number of pairs.
    pub fn read_map_header(&mut self) -> CodecResult<usize> {
        self.read_container(MAJOR_MAP, "map")
    }

    /// Read an array header and return the number of items.
    pub fn read_array_header(&mut self) -> CodecResult<usize> {
        self.read_container(MAJOR_ARRAY, "array")
    }

    /// Read a UTF-8 string.
    pub fn read_text(&mut self) -> CodecResult<String> {
        let (major, info) = self.read_initial()?;
        if major != MAJOR_TEXT {
            return Err(CodecError::invalid_structure(format!(
                "expected text, found major type {major}"
            )));
        }
        let len = self.read_argument(info)?;
        if len > MAX_TEXT_LENGTH {
            return Err(CodecError::SizeLimitExceeded {
                claimed: len,
                max_allowed: MAX_TEXT_LENGTH,
            });
        }
        let bytes = self.read_bytes(len as usize)?;
        let text = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
        Ok(text.to_string())
    }

    /// Read an unsigned integer.
    pub fn read_u64(&mut self) -> CodecResult<u64> {
        let (major, info) = self.read_initial()?;
        if major != MAJOR_UNSIGNED {
            return Err(CodecError::invalid_structure(format!(
                "expected unsigned integer, found major type {major}"
            )));
        }
        self.read_argument(info)
    }

    /// Read a signed integer.
    pub fn read_i64(&mut self) -> CodecResult<i64> {
        let (major, info) = self.read_initial()?;
        let arg = self.read_argument(info)?;
        let arg = i64::try_from(arg).map_err(|_| CodecError::IntegerOverflow)?;
        match major {
            MAJOR_UNSIGNED => Ok(arg),
            MAJOR_NEGATIVE => Ok(-1 - arg),
            other => Err(CodecError::invalid_structure(format!(
                "expected integer, found major type {other}"
            ))),
        }
    }

    /// Read a boolean.
    pub fn read_bool(&mut self) -> CodecResult<bool> {
        match self.read_byte()? {
            FALSE => Ok(false),
            TRUE => Ok(true),
            other => Err(CodecError::invalid_structure(format!(
                "expected boolean, found byte {other:#04x}"
            ))),
        }
    }

    /// Read a single precision float.
    pub fn read_f32(&mut self) -> CodecResult<f32> {
        self.expect_byte(FLOAT32, "single float")?;
        let bytes = self.read_bytes(4)?;
        let n = f32::from_bits(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]));
        if n.is_nan() {
            return Err(CodecError::NaNForbidden);
        }
        Ok(n)
    }

    /// Read a double precision float.
    pub fn read_f64(&mut self) -> CodecResult<f64> {
        self.expect_byte(FLOAT64, "double float")?;
        let bytes = self.read_bytes(8)?;
        let n = f64::from_bits(u64::from_be_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]));
        if n.is_nan() {
            return Err(CodecError::NaNForbidden);
        }
        Ok(n)
    }

    /// Read a typed value written by [`crate::ValueEncoder::write_value`].
    pub fn read_value(&mut self) -> CodecResult<IndexValue> {
        if self.read_array_header()? != 2 {
            return Err(CodecError::invalid_structure(
                "typed value must be a [tag, payload] pair",
            ));
        }
        let tag = self.read_u64()?;
        let tag = u8::try_from(tag).map_err(|_| CodecError::UnknownTag { tag })?;
        let data = match IndexValueType::try_from(tag)? {
            IndexValueType::Text => ValueData::Text(self.read_text()?),
            IndexValueType::TextArray => {
                let len = self.read_array_header()?;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.read_text()?);
                }
                ValueData::TextArray(items)
            }
            IndexValueType::Bool => ValueData::Bool(self.read_bool()?),
            IndexValueType::Int32 => ValueData::Int32(self.read_i32()?),
            IndexValueType::Int32Array => {
                let len = self.read_array_header()?;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.read_i32()?);
                }
                ValueData::Int32Array(items)
            }
            IndexValueType::Int64 => ValueData::Int64(self.read_i64()?),
            IndexValueType::Float32 => ValueData::Float32(self.read_f32()?),
            IndexValueType::Float64 => ValueData::Float64(self.read_f64()?),
            IndexValueType::DateTime => {
                if self.read_array_header()? != 2 {
                    return Err(CodecError::invalid_structure(
                        "date-time must be a [seconds, nanos] pair",
                    ));
                }
                let secs = self.read_i64()?;
                let nanos = u32::try_from(self.read_u64()?)
                    .map_err(|_| CodecError::IntegerOverflow)?;
                let dt = Utc
                    .timestamp_opt(secs, nanos)
                    .single()
                    .ok_or_else(|| CodecError::decoding_failed("date-time out of range"))?;
                ValueData::DateTime(dt)
            }
        };
        Ok(IndexValue::new(data))
    }

    fn read_i32(&mut self) -> CodecResult<i32> {
        i32::try_from(self.read_i64()?).map_err(|_| CodecError::IntegerOverflow)
    }

    fn read_container(&mut self, expected: u8, name: &str) -> CodecResult<usize> {
        let (major, info) = self.read_initial()?;
        if major != expected {
            return Err(CodecError::invalid_structure(format!(
                "expected {name}, found major type {major}"
            )));
        }
        let len = self.read_argument(info)?;
        if len > MAX_CONTAINER_ELEMENTS {
            return Err(CodecError::SizeLimitExceeded {
                claimed: len,
                max_allowed: MAX_CONTAINER_ELEMENTS,
            });
        }
        Ok(len as usize)
    }

    fn expect_byte(&mut self, expected: u8, name: &str) -> CodecResult<()> {
        let byte = self.read_byte()?;
        if byte != expected {
            return Err(CodecError::invalid_structure(format!(
                "expected {name}, found byte {byte:#04x}"
            )));
        }
        Ok(())
    }

    fn read_initial(&mut self) -> CodecResult<(u8, u8)> {
        let byte = self.read_byte()?;
        Ok((byte >> 5, byte & 0x1f))
    }

    #[inline]
    fn read_byte(&mut self) -> CodecResult<u8> {
        if self.pos >= self.data.len() {
            return Err(CodecError::UnexpectedEof);
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        if self.pos + len > self.data.len() {
            return Err(CodecError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_argument(&mut self, info: u8) -> CodecResult<u64> {
        let non_canonical = || {
            CodecError::invalid_structure("non-canonical: value could be encoded in fewer bytes")
        };
        match info {
            0..=23 => Ok(u64::from(info)),
            24 => {
                let byte = self.read_byte()?;
                if byte < 24 {
                    return Err(non_canonical());
                }
                Ok(u64::from(byte))
            }
            25 => {
                let bytes = self.read_bytes(2)?;
                let value = u16::from_be_bytes([bytes[0], bytes[1]]);
                if u8::try_from(value).is_ok() {
                    return Err(non_canonical());
                }
                Ok(u64::from(value))
            }
            26 => {
                let bytes = self.read_bytes(4)?;
                let value = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                if u16::try_from(value).is_ok() {
                    return Err(non_canonical());
                }
                Ok(u64::from(value))
            }
            27 => {
                let bytes = self.read_bytes(8)?;
                let value = u64::from_be_bytes([
                    bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
                ]);
                if u32::try_from(value).is_ok() {
                    return Err(non_canonical());
                }
                Ok(value)
            }
            31 => Err(CodecError::IndefiniteLengthForbidden),
            _ => Err(CodecError::invalid_structure("reserved additional info")),
        }
    }
}
