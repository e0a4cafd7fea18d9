/*
 * SPDX-FileCopyrightText: 2026 The graphjson developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Conversions into [`Value`] for the primitive kinds and arrays.

*/

use std::rc::Rc;

use super::{ArrayData, JsonMap, JsonRecord, Value};

macro_rules! impl_from_prim {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    )*};
}

impl_from_prim!(
    bool => Bool,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    char => Char,
);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s.as_str()))
    }
}

impl From<JsonMap> for Value {
    fn from(map: JsonMap) -> Self {
        Value::map(map)
    }
}

impl From<Rc<JsonRecord>> for Value {
    fn from(record: Rc<JsonRecord>) -> Self {
        Value::Record(record)
    }
}

macro_rules! impl_from_prim_vec {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl From<Vec<$ty>> for Value {
            fn from(v: Vec<$ty>) -> Self {
                Value::array(ArrayData::$variant(v))
            }
        }
    )*};
}

impl_from_prim_vec!(
    i8 => Bytes,
    i16 => Shorts,
    i32 => Ints,
    i64 => Longs,
    f32 => Floats,
    f64 => Doubles,
    bool => Bools,
);

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}
