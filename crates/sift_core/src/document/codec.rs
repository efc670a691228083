//! Binary form of index documents.
//!
//! ```text
//! [not_indexed: bool, { name: [value, indexing, storing, term_vector], ... }]
//! ```
//!
//! Map keys are written in name order so identical documents produce
//! identical bytes.

use super::field::directives_from_tags;
use super::{IndexDocument, IndexField};
use sift_codec::{CodecError, CodecResult, Decode, Encode, ValueDecoder, ValueEncoder};

impl Encode for IndexDocument {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut fields: Vec<&IndexField> = self.fields.values().collect();
        fields.sort_by(|a, b| a.name().cmp(b.name()));

        let mut enc = ValueEncoder::with_capacity(64 + fields.len() * 32);
        enc.write_array_header(2);
        enc.write_bool(self.not_indexed);
        enc.write_map_header(fields.len());
        for field in fields {
            enc.write_text(field.name());
            enc.write_array_header(4);
            enc.write_value(field.value())?;
            enc.write_u64(field.indexing() as u64);
            enc.write_u64(field.storing() as u64);
            enc.write_u64(field.term_vector() as u64);
        }
        Ok(enc.into_bytes())
    }
}

impl Decode for IndexDocument {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let mut dec = ValueDecoder::new(bytes);
        if dec.read_array_header()? != 2 {
            return Err(CodecError::invalid_structure("document must be a 2-element array"));
        }
        let not_indexed = dec.read_bool()?;
        let count = dec.read_map_header()?;

        let mut doc = if not_indexed {
            IndexDocument::not_indexed()
        } else {
            IndexDocument::new()
        };
        let mut previous: Option<String> = None;
        for _ in 0..count {
            let name = dec.read_text()?;
            if previous.as_deref().is_some_and(|prev| prev >= name.as_str()) {
                return Err(CodecError::invalid_structure(format!(
                    "field names out of order at {name:?}"
                )));
            }
            if dec.read_array_header()? != 4 {
                return Err(CodecError::invalid_structure(format!(
                    "field {name:?} must be a 4-element array"
                )));
            }
            let value = dec.read_value()?;
            let (indexing, storing, term_vector) =
                directives_from_tags(dec.read_u64()?, dec.read_u64()?, dec.read_u64()?)
                    .map_err(|e| CodecError::invalid_structure(e.to_string()))?;
            // `add` drops forbidden names even if a writer let one through.
            doc.add(
                IndexField::new(name.clone(), value)
                    .with_indexing(indexing)
                    .with_storing(storing)
                    .with_term_vector(term_vector),
            );
            previous = Some(name);
        }

        if !dec.is_empty() {
            return Err(CodecError::invalid_structure("trailing bytes after document"));
        }
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{IndexingMode, StoringMode};
    use chrono::{TimeZone, Utc};

    fn sample() -> IndexDocument {
        let mut doc = IndexDocument::new();
        doc.add(
            IndexField::new("Name", "report")
                .with_indexing(IndexingMode::NotAnalyzed)
                .with_storing(StoringMode::Yes),
        );
        doc.add_value("Id", 12);
        doc.add_value("Keywords", vec!["a".to_string(), "b".to_string()]);
        doc.add_value(
            "CreationDate",
            Utc.with_ymd_and_hms(2020, 5, 1, 8, 30, 0).unwrap(),
        );
        doc
    }

    #[test]
    fn encode_decode() {
        let doc = sample();
        let bytes = doc.encode().unwrap();
        assert_eq!(IndexDocument::decode(&bytes).unwrap(), doc);
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = sample();
        let mut b = IndexDocument::new();
        // Same fields, different insertion order.
        b.add_value(
            "CreationDate",
            Utc.with_ymd_and_hms(2020, 5, 1, 8, 30, 0).unwrap(),
        );
        b.add_value("Keywords", vec!["a".to_string(), "b".to_string()]);
        b.add_value("Id", 12);
        b.add(
            IndexField::new("Name", "report")
                .with_indexing(IndexingMode::NotAnalyzed)
                .with_storing(StoringMode::Yes),
        );
        assert_eq!(a.encode().unwrap(), b.encode().unwrap());
    }

    #[test]
    fn not_indexed_survives() {
        let doc = IndexDocument::not_indexed();
        let decoded = IndexDocument::decode(&doc.encode().unwrap()).unwrap();
        assert!(!decoded.should_index());
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut bytes = sample().encode().unwrap();
        bytes.push(0x00);
        assert!(IndexDocument::decode(&bytes).is_err());
    }

    #[test]
    fn forbidden_fields_never_decode() {
        let mut enc = ValueEncoder::new();
        enc.write_array_header(2);
        enc.write_bool(false);
        enc.write_map_header(1);
        enc.write_text("Password");
        enc.write_array_header(4);
        enc.write_value(&"secret".into()).unwrap();
        enc.write_u64(0);
        enc.write_u64(0);
        enc.write_u64(0);

        let doc = IndexDocument::decode(enc.as_bytes()).unwrap();
        assert!(doc.is_empty());
    }
}
