//! Fuzz targets for the text front end.
//!
//! Each target takes raw bytes, as cargo-fuzz hands them out, and must
//! return without panicking whatever the input.

use sift_core::legacy::{move_settings_to_the_end, scan_fragments, substitute_parameters};
use sift_core::predicate::to_text;
use sift_core::{BuiltinFieldInfo, IndexDocument, Query, QueryParam};
use sift_codec::Decode;

fn as_text(data: &[u8]) -> String {
    String::from_utf8_lossy(data).into_owned()
}

/// Parses arbitrary text; when it parses, its canonical text must parse to
/// the same tree.
pub fn fuzz_parse(data: &[u8]) {
    let fields = BuiltinFieldInfo::new();
    if let Ok(query) = Query::parse(&as_text(data), &fields) {
        let rendered = to_text(query.predicate());
        let reparsed = Query::parse(&rendered, &fields);
        assert!(reparsed.is_ok(), "canonical text does not parse: {rendered:?}");
        if let Ok(reparsed) = reparsed {
            assert_eq!(query.predicate(), reparsed.predicate(), "tree changed: {rendered:?}");
        }
    }
}

/// Relocating settings twice changes nothing more.
pub fn fuzz_relocate(data: &[u8]) {
    let once = move_settings_to_the_end(&as_text(data));
    assert_eq!(move_settings_to_the_end(&once), once);
}

/// Fragment spans always lie on character boundaries and nest.
pub fn fuzz_fragments(data: &[u8]) {
    let text = as_text(data);
    if let Ok(fragments) = scan_fragments(&text) {
        for fragment in fragments {
            assert!(text.is_char_boundary(fragment.span.start));
            assert!(text.is_char_boundary(fragment.span.end));
            assert!(fragment.span.start < fragment.inner.start);
            assert!(fragment.inner.end < fragment.span.end);
        }
    }
}

/// Substitutes the bytes as a template with a few fixed parameters.
pub fn fuzz_substitute(data: &[u8]) {
    let params: Vec<QueryParam> = vec!["a b".into(), 7.into(), vec![1, 2].into()];
    let _ = substitute_parameters(&as_text(data), &params);
}

/// Decodes arbitrary bytes as an index document.
pub fn fuzz_document_decode(data: &[u8]) {
    let _ = IndexDocument::decode(data);
}
