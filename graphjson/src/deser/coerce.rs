/*
 * SPDX-FileCopyrightText: 2026 The graphjson developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

The primitive coercion matrix.

Maps a parsed scalar onto the declared type of the slot receiving it.
Integers truncate into the narrower integer kinds and widen into the
floating kinds; a one-character string becomes a char; an empty string
assigned to anything but a string coerces to the declared type's zero
value. A scalar with no declared type stays what bare JSON says it is:
64-bit integer, double, boolean, or string.

*/

use super::{Error, Result};
use crate::graph::{ArrayData, Value};
use crate::json::Elem;
use crate::meta::TypeSpec;

fn kind(elem: &Elem) -> &'static str {
    match elem {
        Elem::Null => "null",
        Elem::Bool(_) => "boolean",
        Elem::Long(_) => "integer",
        Elem::Double(_) => "double",
        Elem::Str(_) => "string",
        Elem::Array(_) => "array",
        Elem::Object(_) => "object",
    }
}

fn mismatch(elem: &Elem, declared: &TypeSpec) -> Error {
    Error::Semantic(format!(
        "cannot coerce a {} into {:?}",
        kind(elem),
        declared
    ))
}

/// Coerces a scalar node into the declared type.
pub(super) fn coerce(elem: &Elem, declared: &TypeSpec) -> Result<Value> {
    match elem {
        // A null takes the declared zero: 0 for primitives, null for
        // reference kinds.
        Elem::Null => Ok(match declared {
            TypeSpec::Any => Value::Null,
            other => other.zero(),
        }),
        Elem::Bool(b) => match declared {
            TypeSpec::Bool | TypeSpec::Any => Ok(Value::Bool(*b)),
            _ => Err(mismatch(elem, declared)),
        },
        Elem::Long(n) => match declared {
            TypeSpec::Byte => Ok(Value::Byte(*n as i8)),
            TypeSpec::Short => Ok(Value::Short(*n as i16)),
            TypeSpec::Int => Ok(Value::Int(*n as i32)),
            TypeSpec::Long | TypeSpec::Any => Ok(Value::Long(*n)),
            TypeSpec::Float => Ok(Value::Float(*n as f32)),
            TypeSpec::Double => Ok(Value::Double(*n as f64)),
            TypeSpec::Date => Ok(Value::Date(*n)),
            _ => Err(mismatch(elem, declared)),
        },
        Elem::Double(d) => match declared {
            TypeSpec::Float => Ok(Value::Float(*d as f32)),
            TypeSpec::Double | TypeSpec::Any => Ok(Value::Double(*d)),
            _ => Err(mismatch(elem, declared)),
        },
        Elem::Str(s) => {
            // A char array embeds as a single string; even an empty one
            // is an array, not a zeroed leaf.
            if let TypeSpec::Array(elem_spec) = declared {
                if **elem_spec == TypeSpec::Char {
                    return Ok(Value::array(ArrayData::Chars(s.to_string())));
                }
            }
            if s.is_empty() && !matches!(declared, TypeSpec::Str | TypeSpec::Any) {
                // Empty-string policy: zero for primitives, null for
                // reference kinds.
                return Ok(declared.zero());
            }
            match declared {
                TypeSpec::Str | TypeSpec::Any => Ok(Value::Str(s.clone())),
                TypeSpec::Char => Ok(Value::Char(s.chars().next().unwrap())),
                TypeSpec::Class => Ok(Value::Class(s.clone())),
                _ => Err(mismatch(elem, declared)),
            }
        }
        Elem::Array(_) | Elem::Object(_) => Err(mismatch(elem, declared)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_integer_truncation() {
        assert_eq!(coerce(&Elem::Long(300), &TypeSpec::Byte).unwrap(), Value::Byte(44));
        assert_eq!(coerce(&Elem::Long(-1), &TypeSpec::Byte).unwrap(), Value::Byte(-1));
        assert_eq!(
            coerce(&Elem::Long(0x1_0001), &TypeSpec::Short).unwrap(),
            Value::Short(1)
        );
        assert_eq!(
            coerce(&Elem::Long(i64::MAX), &TypeSpec::Long).unwrap(),
            Value::Long(i64::MAX)
        );
    }

    #[test]
    fn test_widening_to_floats() {
        assert_eq!(coerce(&Elem::Long(3), &TypeSpec::Double).unwrap(), Value::Double(3.0));
        assert_eq!(coerce(&Elem::Long(3), &TypeSpec::Float).unwrap(), Value::Float(3.0));
        assert_eq!(
            coerce(&Elem::Double(2.5), &TypeSpec::Float).unwrap(),
            Value::Float(2.5)
        );
    }

    #[test]
    fn test_untyped_scalars_stay_native() {
        assert_eq!(coerce(&Elem::Long(7), &TypeSpec::Any).unwrap(), Value::Long(7));
        assert_eq!(
            coerce(&Elem::Double(1.5), &TypeSpec::Any).unwrap(),
            Value::Double(1.5)
        );
        assert_eq!(coerce(&Elem::Bool(true), &TypeSpec::Any).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_char_and_class_from_string() {
        let s: Rc<str> = Rc::from("x");
        assert_eq!(coerce(&Elem::Str(s), &TypeSpec::Char).unwrap(), Value::Char('x'));
        let c: Rc<str> = Rc::from("Person");
        assert_eq!(
            coerce(&Elem::Str(c), &TypeSpec::Class).unwrap(),
            Value::class("Person")
        );
    }

    #[test]
    fn test_empty_string_zero_policy() {
        let e: Rc<str> = Rc::from("");
        assert_eq!(coerce(&Elem::Str(e.clone()), &TypeSpec::Int).unwrap(), Value::Int(0));
        assert_eq!(
            coerce(&Elem::Str(e.clone()), &TypeSpec::Bool).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            coerce(&Elem::Str(e.clone()), &TypeSpec::record("P")).unwrap(),
            Value::Null
        );
        assert_eq!(
            coerce(&Elem::Str(e), &TypeSpec::Str).unwrap(),
            Value::string("")
        );
    }

    #[test]
    fn test_date_from_epoch_millis() {
        assert_eq!(
            coerce(&Elem::Long(1234567), &TypeSpec::Date).unwrap(),
            Value::Date(1234567)
        );
    }

    #[test]
    fn test_char_array_from_string() {
        let spec = TypeSpec::array_of(TypeSpec::Char);
        let s: Rc<str> = Rc::from("ab");
        let v = coerce(&Elem::Str(s), &spec).unwrap();
        let arr = v.as_array().unwrap();
        assert_eq!(*arr.borrow(), ArrayData::Chars("ab".into()));
        // An empty char array is still an array, not a zeroed leaf.
        let empty: Rc<str> = Rc::from("");
        let v = coerce(&Elem::Str(empty), &spec).unwrap();
        let arr = v.as_array().unwrap();
        assert_eq!(*arr.borrow(), ArrayData::Chars(String::new()));
    }

    #[test]
    fn test_mismatches_fail() {
        assert!(coerce(&Elem::Bool(true), &TypeSpec::Int).is_err());
        assert!(coerce(&Elem::Double(1.5), &TypeSpec::Long).is_err());
        let s: Rc<str> = Rc::from("nope");
        assert!(coerce(&Elem::Str(s), &TypeSpec::Long).is_err());
    }
}
