//! Rule record codec tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use rulevault_core::error::ErrorCode;
use rulevault_core::record::{decode, encode, MAX_FIELDS};

fn fields(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

#[test]
fn encode_pads_with_empty_strings() {
    let row = encode("p", &fields(&["alice", "data1", "read"])).unwrap();
    assert_eq!(row.ptype, "p");
    assert_eq!(row.values[0], "alice");
    assert_eq!(row.values[1], "data1");
    assert_eq!(row.values[2], "read");
    assert_eq!(row.values[3], "");
    assert_eq!(row.values[4], "");
    assert_eq!(row.values[5], "");
}

#[test]
fn round_trip_without_empty_fields() {
    let f = fields(&["alice", "data1", "read"]);
    let row = encode("p", &f).unwrap();
    let rule = decode(&row);
    assert_eq!(rule.ptype, "p");
    assert_eq!(rule.fields, f);
}

#[test]
fn round_trip_full_arity() {
    let f = fields(&["a", "b", "c", "d", "e", "f"]);
    let row = encode("p", &f).unwrap();
    assert_eq!(decode(&row).fields, f);
}

#[test]
fn embedded_empty_field_survives() {
    // Empty between non-empty values is a real field, not padding.
    let f = fields(&["alice", "", "read"]);
    let row = encode("p", &f).unwrap();
    assert_eq!(decode(&row).fields, f);
}

#[test]
fn trailing_empty_field_collapses() {
    // Documented lossy edge: a legitimately-empty trailing field is
    // indistinguishable from unset and comes back with shorter arity.
    let row = encode("p", &fields(&["alice", "data1", ""])).unwrap();
    assert_eq!(decode(&row).fields, fields(&["alice", "data1"]));
}

#[test]
fn zero_arity_rule() {
    let row = encode("p", &[]).unwrap();
    let rule = decode(&row);
    assert_eq!(rule.ptype, "p");
    assert!(rule.fields.is_empty());
}

#[test]
fn arity_over_max_is_codec_error() {
    let too_many = fields(&["a", "b", "c", "d", "e", "f", "g"]);
    assert_eq!(too_many.len(), MAX_FIELDS + 1);
    let err = encode("p", &too_many).expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::Codec);
}
