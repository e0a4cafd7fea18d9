/*
 * SPDX-FileCopyrightText: 2026 The graphjson developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![cfg(test)]

use graphjson::prelude::*;
use std::rc::Rc;

fn round_trip(v: &Value) -> Value {
    let registry = Registry::new();
    let bytes = encode(v).unwrap();
    decode(&bytes, &registry, ReadFlags::default()).unwrap()
}

#[test]
fn test_bare_scalars() {
    assert_eq!(round_trip(&Value::Long(17)), Value::Long(17));
    assert_eq!(round_trip(&Value::Long(0)), Value::Long(0));
    assert_eq!(round_trip(&Value::Long(i64::MIN)), Value::Long(i64::MIN));
    assert_eq!(round_trip(&Value::Long(i64::MAX)), Value::Long(i64::MAX));
    assert_eq!(round_trip(&Value::Bool(true)), Value::Bool(true));
    assert_eq!(round_trip(&Value::Bool(false)), Value::Bool(false));
    assert_eq!(round_trip(&Value::Double(3.14)), Value::Double(3.14));
    assert_eq!(round_trip(&Value::Double(-0.5)), Value::Double(-0.5));
    assert_eq!(round_trip(&Value::string("hi")), Value::string("hi"));
    assert_eq!(round_trip(&Value::string("")), Value::string(""));
}

#[test]
fn test_double_keeps_its_point() {
    // An integral double must come back as a double, not an integer.
    let bytes = encode(&Value::Double(5.0)).unwrap();
    assert_eq!(std::str::from_utf8(&bytes).unwrap(), "5.0");
    assert_eq!(round_trip(&Value::Double(5.0)), Value::Double(5.0));
}

#[test]
fn test_top_level_null_is_empty_object() {
    let bytes = encode(&Value::Null).unwrap();
    assert_eq!(std::str::from_utf8(&bytes).unwrap(), "{}");
    assert_eq!(round_trip(&Value::Null), Value::Null);
}

macro_rules! boxed_round_trip {
    ($name:ident, $value:expr, $json:expr) => {
        #[test]
        fn $name() {
            // An untyped slot cannot infer these kinds, so they are
            // boxed with a short tag.
            let root = Value::list(vec![$value]);
            let bytes = encode(&root).unwrap();
            assert_eq!(
                std::str::from_utf8(&bytes).unwrap(),
                concat!(r#"{"@type":"list","@items":["#, $json, "]}")
            );
            let registry = Registry::new();
            let back = decode(&bytes, &registry, ReadFlags::default()).unwrap();
            let list = back.as_list().unwrap();
            assert_eq!(list.borrow()[0], $value);
        }
    };
}

boxed_round_trip!(test_boxed_byte, Value::Byte(-7), r#"{"@type":"byte","value":-7}"#);
boxed_round_trip!(test_boxed_byte_extremes, Value::Byte(i8::MIN), r#"{"@type":"byte","value":-128}"#);
boxed_round_trip!(test_boxed_short, Value::Short(i16::MAX), r#"{"@type":"short","value":32767}"#);
boxed_round_trip!(test_boxed_int, Value::Int(i32::MIN), r#"{"@type":"int","value":-2147483648}"#);
boxed_round_trip!(test_boxed_float, Value::Float(2.5), r#"{"@type":"float","value":2.5}"#);
boxed_round_trip!(test_boxed_char, Value::Char('a'), r#"{"@type":"char","value":"a"}"#);
boxed_round_trip!(test_boxed_date, Value::Date(1700000000000), r#"{"@type":"date","value":1700000000000}"#);
boxed_round_trip!(
    test_boxed_class,
    Value::class("Person"),
    r#"{"@type":"class","value":"Person"}"#
);

#[test]
fn test_long_is_bare_in_untyped_slots() {
    // 64-bit integers are what bare JSON integers decode to anyway.
    let root = Value::list(vec![Value::Long(17)]);
    let bytes = encode(&root).unwrap();
    assert_eq!(
        std::str::from_utf8(&bytes).unwrap(),
        r#"{"@type":"list","@items":[17]}"#
    );
}

#[test]
fn test_non_finite_doubles_become_null() {
    let bytes = encode(&Value::list(vec![Value::Double(f64::NAN)])).unwrap();
    assert_eq!(
        std::str::from_utf8(&bytes).unwrap(),
        r#"{"@type":"list","@items":[null]}"#
    );
}

#[test]
fn test_interned_literal_sharing() {
    let registry = Registry::new();
    let a = decode(br#""true""#, &registry, ReadFlags::default()).unwrap();
    let b = decode(br#""true""#, &registry, ReadFlags::default()).unwrap();
    let (a, b) = (a.as_str().unwrap(), b.as_str().unwrap());
    // Both decodes hand back the canonical pooled instance.
    assert!(Rc::ptr_eq(&a, &b));
}

#[test]
fn test_unicode_string_round_trip() {
    let s = "héllo ✓ 😀 \n\t\"quoted\"";
    assert_eq!(round_trip(&Value::string(s)), Value::string(s));
}

#[test]
fn test_code_points_0_to_999_round_trip() {
    let s: String = (0u32..1000).map(|c| char::from_u32(c).unwrap()).collect();
    let back = round_trip(&Value::string(&s));
    assert_eq!(back.as_str().unwrap().chars().count(), 1000);
    assert_eq!(back, Value::string(&s));
}
