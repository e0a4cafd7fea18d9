/*
 * SPDX-FileCopyrightText: 2026 The graphjson developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

The emission pass.

Runs after tracing. The central rule is type inference: a value whose
runtime type equals the declared type of the slot holding it — or whose
type is what bare JSON would reproduce anyway (64-bit integers, doubles,
booleans, strings) — is emitted as a bare literal, and `@type` is
suppressed. Everything else is wrapped.

Nodes the trace found shared get `@id` stamped on their first emission;
later encounters emit `{"@ref":n}`.

*/

use std::collections::HashSet;

use super::trace::RefTrace;
use super::write::{write_json_string, WriteNoStd};
use super::{Result, WriteFlags};
use crate::graph::{ArrayData, JsonRecord, Value};
use crate::meta::{tag_of, TypeSpec};

pub(super) struct Emitter<'a, W: WriteNoStd> {
    pub out: &'a mut W,
    pub trace: &'a RefTrace,
    /// Ids already defined in the output; later encounters become `@ref`.
    pub defined: HashSet<u64>,
    pub flags: WriteFlags,
}

/// A double, in shortest round-trip form with a forced fractional or
/// exponent part. JSON has no non-finite numbers, so those become null.
fn double_literal(d: f64) -> String {
    if d.is_finite() {
        format!("{:?}", d)
    } else {
        "null".into()
    }
}

fn float_literal(f: f32) -> String {
    if f.is_finite() {
        format!("{:?}", f)
    } else {
        "null".into()
    }
}

impl<'a, W: WriteNoStd> Emitter<'a, W> {
    fn put(&mut self, s: &str) -> Result<()> {
        self.out.write_all(s.as_bytes())
    }

    fn put_ref(&mut self, id: u64) -> Result<()> {
        self.put("{\"@ref\":")?;
        self.put(&id.to_string())?;
        self.put("}")
    }

    /// `{"@type":"<tag>","value":` — the caller writes the payload and the
    /// closing brace.
    fn boxed_start(&mut self, tag: &str) -> Result<()> {
        self.put("{\"@type\":\"")?;
        self.put(tag)?;
        self.put("\",\"value\":")
    }

    fn boxed(&mut self, tag: &str, payload: &str) -> Result<()> {
        self.boxed_start(tag)?;
        self.put(payload)?;
        self.put("}")
    }

    pub fn value(&mut self, v: &Value, declared: &TypeSpec) -> Result<()> {
        let bare = |kind: TypeSpec| *declared == kind;
        match v {
            Value::Null => self.put("null"),
            // Booleans, 64-bit integers, doubles, and strings are what a
            // bare literal decodes to anyway, so they are also bare in
            // untyped slots.
            Value::Bool(b) => {
                if bare(TypeSpec::Bool) || *declared == TypeSpec::Any {
                    self.put(if *b { "true" } else { "false" })
                } else {
                    self.boxed("boolean", if *b { "true" } else { "false" })
                }
            }
            Value::Long(n) => {
                if bare(TypeSpec::Long) || *declared == TypeSpec::Any {
                    self.put(&n.to_string())
                } else {
                    self.boxed("long", &n.to_string())
                }
            }
            Value::Double(d) => {
                if bare(TypeSpec::Double) || *declared == TypeSpec::Any {
                    self.put(&double_literal(*d))
                } else {
                    self.boxed("double", &double_literal(*d))
                }
            }
            Value::Byte(n) => {
                if bare(TypeSpec::Byte) {
                    self.put(&n.to_string())
                } else {
                    self.boxed("byte", &n.to_string())
                }
            }
            Value::Short(n) => {
                if bare(TypeSpec::Short) {
                    self.put(&n.to_string())
                } else {
                    self.boxed("short", &n.to_string())
                }
            }
            Value::Int(n) => {
                if bare(TypeSpec::Int) {
                    self.put(&n.to_string())
                } else {
                    self.boxed("int", &n.to_string())
                }
            }
            Value::Float(f) => {
                if bare(TypeSpec::Float) {
                    self.put(&float_literal(*f))
                } else {
                    self.boxed("float", &float_literal(*f))
                }
            }
            Value::Char(c) => {
                let mut buf = [0u8; 4];
                let s = &*c.encode_utf8(&mut buf);
                if bare(TypeSpec::Char) {
                    write_json_string(self.out, s)
                } else {
                    self.boxed_start("char")?;
                    write_json_string(self.out, s)?;
                    self.put("}")
                }
            }
            Value::Date(ms) => {
                if bare(TypeSpec::Date) {
                    self.put(&ms.to_string())
                } else {
                    self.boxed("date", &ms.to_string())
                }
            }
            Value::Class(name) => {
                if bare(TypeSpec::Class) {
                    write_json_string(self.out, name)
                } else {
                    self.boxed_start("class")?;
                    write_json_string(self.out, name)?;
                    self.put("}")
                }
            }
            Value::Str(s) => {
                if let Some(id) = self.trace.shared_id(v) {
                    if !self.defined.insert(id) {
                        return self.put_ref(id);
                    }
                    self.put("{\"@id\":")?;
                    self.put(&id.to_string())?;
                    self.put(",\"@type\":\"string\",\"value\":")?;
                    write_json_string(self.out, s)?;
                    self.put("}")
                } else if *declared == TypeSpec::Str || *declared == TypeSpec::Any {
                    write_json_string(self.out, s)
                } else {
                    self.boxed_start("string")?;
                    write_json_string(self.out, s)?;
                    self.put("}")
                }
            }
            Value::Record(r) => self.record(v, r, declared),
            Value::List(_) => self.sequence(v),
            Value::Map(_) => self.mapping(v),
            Value::Array(_) => self.array(v, declared),
        }
    }

    /// `@id` first if shared, `@type` if not inferable, then the fields in
    /// descriptor order. A custom write hook replaces the field walk and
    /// forces `@type` so the reader dispatches to the matching read hook.
    fn record(&mut self, v: &Value, r: &JsonRecord, declared: &TypeSpec) -> Result<()> {
        let mut shared = None;
        if let Some(id) = self.trace.shared_id(v) {
            if !self.defined.insert(id) {
                return self.put_ref(id);
            }
            shared = Some(id);
        }
        let descriptor = r.descriptor().clone();
        let custom = descriptor.custom_write().is_some();
        let inferable =
            matches!(declared, TypeSpec::Record(n) if **n == **descriptor.name()) && !custom;

        self.put("{")?;
        let mut first = true;
        if let Some(id) = shared {
            self.put("\"@id\":")?;
            self.put(&id.to_string())?;
            first = false;
        }
        if !inferable {
            if !first {
                self.put(",")?;
            }
            self.put("\"@type\":")?;
            write_json_string(self.out, descriptor.name())?;
            first = false;
        }
        if let Some(hook) = descriptor.custom_write() {
            hook(r, &mut *self.out)?;
        } else {
            for (i, fd) in descriptor.fields().iter().enumerate() {
                let field = r.field_at(i);
                if field.is_null() && self.flags.contains(WriteFlags::SKIP_NULL_FIELDS) {
                    continue;
                }
                if !first {
                    self.put(",")?;
                }
                first = false;
                write_json_string(self.out, fd.name())?;
                self.put(":")?;
                self.value(&field, fd.spec())?;
            }
        }
        self.put("}")
    }

    fn sequence(&mut self, v: &Value) -> Result<()> {
        let items = v.as_list().unwrap();
        let mut shared = None;
        if let Some(id) = self.trace.shared_id(v) {
            if !self.defined.insert(id) {
                return self.put_ref(id);
            }
            shared = Some(id);
        }
        self.put("{")?;
        if let Some(id) = shared {
            self.put("\"@id\":")?;
            self.put(&id.to_string())?;
            self.put(",")?;
        }
        self.put("\"@type\":\"list\",\"@items\":[")?;
        for (i, item) in items.borrow().iter().enumerate() {
            if i > 0 {
                self.put(",")?;
            }
            self.value(item, &TypeSpec::Any)?;
        }
        self.put("]}")
    }

    fn mapping(&mut self, v: &Value) -> Result<()> {
        let map = v.as_map().unwrap();
        let mut shared = None;
        if let Some(id) = self.trace.shared_id(v) {
            if !self.defined.insert(id) {
                return self.put_ref(id);
            }
            shared = Some(id);
        }
        self.put("{")?;
        if let Some(id) = shared {
            self.put("\"@id\":")?;
            self.put(&id.to_string())?;
            self.put(",")?;
        }
        self.put("\"@type\":\"map\",\"@keys\":[")?;
        let map = map.borrow();
        for (i, (k, _)) in map.entries().iter().enumerate() {
            if i > 0 {
                self.put(",")?;
            }
            self.value(k, &TypeSpec::Any)?;
        }
        self.put("],\"@items\":[")?;
        for (i, (_, val)) in map.entries().iter().enumerate() {
            if i > 0 {
                self.put(",")?;
            }
            self.value(val, &TypeSpec::Any)?;
        }
        self.put("]}")
    }

    /// Bare `[…]` when the element type is inferable and the array is not
    /// shared; otherwise wrapped with `@type` and `@items` (`value` for
    /// char arrays, which serialize as a single string).
    fn array(&mut self, v: &Value, declared: &TypeSpec) -> Result<()> {
        let arr = v.as_array().unwrap();
        let data = arr.borrow();
        let elem = data.elem_spec();
        let inferable = match declared {
            TypeSpec::Array(d) => **d == elem,
            // A degenerate untyped array is plain JSON.
            TypeSpec::Any => {
                matches!(&*data, ArrayData::Values { elem, .. } if *elem == TypeSpec::Any)
            }
            _ => false,
        };
        let shared = self.trace.shared_id(v);
        if let Some(id) = shared {
            if !self.defined.insert(id) {
                return self.put_ref(id);
            }
        }

        if shared.is_none() && inferable {
            if let ArrayData::Chars(s) = &*data {
                return write_json_string(self.out, s);
            }
            self.put("[")?;
            self.elements(&data, &elem)?;
            return self.put("]");
        }

        self.put("{")?;
        if let Some(id) = shared {
            self.put("\"@id\":")?;
            self.put(&id.to_string())?;
            self.put(",")?;
        }
        self.put("\"@type\":")?;
        write_json_string(self.out, &tag_of(&TypeSpec::array_of(elem.clone())))?;
        if let ArrayData::Chars(s) = &*data {
            self.put(",\"value\":")?;
            write_json_string(self.out, s)?;
        } else {
            self.put(",\"@items\":[")?;
            self.elements(&data, &elem)?;
            self.put("]")?;
        }
        self.put("}")
    }

    /// Element loops, one tight pass per primitive kind.
    fn elements(&mut self, data: &ArrayData, elem: &TypeSpec) -> Result<()> {
        macro_rules! prim_loop {
            ($vals:expr, $fmt:expr) => {{
                for (i, x) in $vals.iter().enumerate() {
                    if i > 0 {
                        self.put(",")?;
                    }
                    let text: String = $fmt(x);
                    self.put(&text)?;
                }
                Ok(())
            }};
        }
        match data {
            ArrayData::Bytes(vals) => prim_loop!(vals, |x: &i8| x.to_string()),
            ArrayData::Shorts(vals) => prim_loop!(vals, |x: &i16| x.to_string()),
            ArrayData::Ints(vals) => prim_loop!(vals, |x: &i32| x.to_string()),
            ArrayData::Longs(vals) => prim_loop!(vals, |x: &i64| x.to_string()),
            ArrayData::Floats(vals) => prim_loop!(vals, |x: &f32| float_literal(*x)),
            ArrayData::Doubles(vals) => prim_loop!(vals, |x: &f64| double_literal(*x)),
            ArrayData::Bools(vals) => {
                prim_loop!(vals, |x: &bool| if *x { "true" } else { "false" }.to_string())
            }
            // Char arrays never reach the element loop: they are emitted
            // as one string.
            ArrayData::Chars(_) => unreachable!(),
            ArrayData::Values { items, .. } => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.put(",")?;
                    }
                    self.value(item, elem)?;
                }
                Ok(())
            }
        }
    }
}
