/*
 * SPDX-FileCopyrightText: 2026 The graphjson developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

The runtime object-graph model.

A graph node is a [`Value`]: either one of the eleven atomic leaf kinds, or
a shared container — typed array, generic list, mapping, or record. Shared
containers (and strings) sit behind [`Rc`], so *identity* is pointer
identity: two values are the same node exactly when their `Rc`s point at
the same allocation. The reference tracer keys on this, and it is what the
round-trip identity guarantee preserves.

Equality and hashing are identity-based for containers and content-based
for leaves; strings compare by content, which is what mapping keys need.
Floating-point values hash and compare by bit pattern so that [`Value`] can
serve as a mapping key.

*/

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use xxhash_rust::xxh3::Xxh3Builder;

use crate::meta::{ClassDescriptor, TypeSpec};

pub mod convert;

/// One node of an object graph.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Str(Rc<str>),
    /// Epoch-millisecond timestamp.
    Date(i64),
    /// Class-identity value, carried by name.
    Class(Rc<str>),
    Array(Rc<RefCell<ArrayData>>),
    List(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<JsonMap>>),
    Record(Rc<JsonRecord>),
}

impl Value {
    pub fn string(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    pub fn class(name: &str) -> Self {
        Value::Class(Rc::from(name))
    }

    pub fn array(data: ArrayData) -> Self {
        Value::Array(Rc::new(RefCell::new(data)))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn map(map: JsonMap) -> Self {
        Value::Map(Rc::new(RefCell::new(map)))
    }

    /// Pointer identity of a shared node; `None` for unboxed scalars,
    /// dates, and class values, which are never reference-tracked.
    pub(crate) fn identity(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(Rc::as_ptr(s) as *const u8 as usize),
            Value::Array(a) => Some(Rc::as_ptr(a) as usize),
            Value::List(l) => Some(Rc::as_ptr(l) as usize),
            Value::Map(m) => Some(Rc::as_ptr(m) as usize),
            Value::Record(r) => Some(Rc::as_ptr(r) as usize),
            _ => None,
        }
    }

    /// The runtime type, for comparison against a declared [`TypeSpec`].
    pub fn type_spec(&self) -> TypeSpec {
        match self {
            Value::Null => TypeSpec::Any,
            Value::Bool(_) => TypeSpec::Bool,
            Value::Byte(_) => TypeSpec::Byte,
            Value::Short(_) => TypeSpec::Short,
            Value::Int(_) => TypeSpec::Int,
            Value::Long(_) => TypeSpec::Long,
            Value::Float(_) => TypeSpec::Float,
            Value::Double(_) => TypeSpec::Double,
            Value::Char(_) => TypeSpec::Char,
            Value::Str(_) => TypeSpec::Str,
            Value::Date(_) => TypeSpec::Date,
            Value::Class(_) => TypeSpec::Class,
            Value::Array(a) => TypeSpec::array_of(a.borrow().elem_spec()),
            Value::List(_) => TypeSpec::List,
            Value::Map(_) => TypeSpec::Map,
            Value::Record(r) => TypeSpec::Record(r.descriptor().name().clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(l) => Some(*l),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<Rc<str>> {
        match self {
            Value::Str(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<Rc<RefCell<ArrayData>>> {
        match self {
            Value::Array(a) => Some(a.clone()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<Rc<RefCell<Vec<Value>>>> {
        match self {
            Value::List(l) => Some(l.clone()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<Rc<RefCell<JsonMap>>> {
        match self {
            Value::Map(m) => Some(m.clone()),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<Rc<JsonRecord>> {
        match self {
            Value::Record(r) => Some(r.clone()),
            _ => None,
        }
    }
}

// Shallow by intent: graphs can be cyclic, so containers print their
// address and length, never their children.
impl core::fmt::Debug for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Byte(v) => write!(f, "Byte({})", v),
            Value::Short(v) => write!(f, "Short({})", v),
            Value::Int(v) => write!(f, "Int({})", v),
            Value::Long(v) => write!(f, "Long({})", v),
            Value::Float(v) => write!(f, "Float({})", v),
            Value::Double(v) => write!(f, "Double({})", v),
            Value::Char(c) => write!(f, "Char({:?})", c),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Date(ms) => write!(f, "Date({})", ms),
            Value::Class(n) => write!(f, "Class({:?})", n),
            Value::Array(a) => {
                write!(f, "Array@{:p}[{}]", Rc::as_ptr(a), a.borrow().len())
            }
            Value::List(l) => write!(f, "List@{:p}[{}]", Rc::as_ptr(l), l.borrow().len()),
            Value::Map(m) => write!(f, "Map@{:p}[{}]", Rc::as_ptr(m), m.borrow().len()),
            Value::Record(r) => {
                write!(f, "Record({}@{:p})", r.descriptor().name(), Rc::as_ptr(r))
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Record(a), Value::Record(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

// The default drop glue recurses through nested containers, so a deep
// graph would overflow the stack the moment it goes out of scope. A
// sole-owner container instead drains its children into a work stack and
// drops them level by level; a shared handle just decrements the count,
// which also keeps cyclic graphs out of this loop. A container emptied by
// the drain falls through to the glue without recursing.
impl Drop for Value {
    fn drop(&mut self) {
        fn has_children(v: &Value) -> bool {
            match v {
                Value::Array(rc) => {
                    Rc::strong_count(rc) == 1
                        && matches!(
                            &*rc.borrow(),
                            ArrayData::Values { items, .. } if !items.is_empty()
                        )
                }
                Value::List(rc) => Rc::strong_count(rc) == 1 && !rc.borrow().is_empty(),
                Value::Map(rc) => Rc::strong_count(rc) == 1 && !rc.borrow().is_empty(),
                Value::Record(rc) => {
                    Rc::strong_count(rc) == 1 && !rc.fields.borrow().is_empty()
                }
                _ => false,
            }
        }
        if !has_children(self) {
            return;
        }
        let mut stack = vec![core::mem::replace(self, Value::Null)];
        while let Some(mut v) = stack.pop() {
            match &mut v {
                Value::Array(rc) => {
                    if let Some(cell) = Rc::get_mut(rc) {
                        if let ArrayData::Values { items, .. } = cell.get_mut() {
                            stack.append(items);
                        }
                    }
                }
                Value::List(rc) => {
                    if let Some(cell) = Rc::get_mut(rc) {
                        stack.append(cell.get_mut());
                    }
                }
                Value::Map(rc) => {
                    if let Some(cell) = Rc::get_mut(rc) {
                        let map = cell.get_mut();
                        // The index holds clones of the entry keys, so
                        // clearing it first only decrements counts.
                        map.index.clear();
                        for (key, val) in map.entries.drain(..) {
                            stack.push(key);
                            stack.push(val);
                        }
                    }
                }
                Value::Record(rc) => {
                    if let Some(rec) = Rc::get_mut(rc) {
                        stack.append(rec.fields.get_mut());
                    }
                }
                _ => {}
            }
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Byte(v) => v.hash(state),
            Value::Short(v) => v.hash(state),
            Value::Int(v) => v.hash(state),
            Value::Long(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Double(v) => v.to_bits().hash(state),
            Value::Char(c) => c.hash(state),
            Value::Str(s) => s.hash(state),
            Value::Date(ms) => ms.hash(state),
            Value::Class(n) => n.hash(state),
            Value::Array(a) => (Rc::as_ptr(a) as usize).hash(state),
            Value::List(l) => (Rc::as_ptr(l) as usize).hash(state),
            Value::Map(m) => (Rc::as_ptr(m) as usize).hash(state),
            Value::Record(r) => (Rc::as_ptr(r) as usize).hash(state),
        }
    }
}

/// Storage of a typed array. Each primitive element type gets its own
/// vector so emission can run a tight per-kind loop; char arrays are a
/// single string. Reference-typed elements use the [`ArrayData::Values`]
/// form, which records the declared element type for tag inference.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Bytes(Vec<i8>),
    Shorts(Vec<i16>),
    Ints(Vec<i32>),
    Longs(Vec<i64>),
    Floats(Vec<f32>),
    Doubles(Vec<f64>),
    Bools(Vec<bool>),
    Chars(String),
    Values { elem: TypeSpec, items: Vec<Value> },
}

impl ArrayData {
    /// A [`ArrayData::Values`] array of length `len`, pre-filled with
    /// nulls.
    pub fn values(elem: TypeSpec, len: usize) -> Self {
        ArrayData::Values {
            elem,
            items: vec![Value::Null; len],
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ArrayData::Bytes(v) => v.len(),
            ArrayData::Shorts(v) => v.len(),
            ArrayData::Ints(v) => v.len(),
            ArrayData::Longs(v) => v.len(),
            ArrayData::Floats(v) => v.len(),
            ArrayData::Doubles(v) => v.len(),
            ArrayData::Bools(v) => v.len(),
            ArrayData::Chars(s) => s.chars().count(),
            ArrayData::Values { items, .. } => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element type of this array.
    pub fn elem_spec(&self) -> TypeSpec {
        match self {
            ArrayData::Bytes(_) => TypeSpec::Byte,
            ArrayData::Shorts(_) => TypeSpec::Short,
            ArrayData::Ints(_) => TypeSpec::Int,
            ArrayData::Longs(_) => TypeSpec::Long,
            ArrayData::Floats(_) => TypeSpec::Float,
            ArrayData::Doubles(_) => TypeSpec::Double,
            ArrayData::Bools(_) => TypeSpec::Bool,
            ArrayData::Chars(_) => TypeSpec::Char,
            ArrayData::Values { elem, .. } => elem.clone(),
        }
    }
}

/// An insertion-ordered mapping with arbitrary [`Value`] keys.
///
/// Entries keep insertion order; lookups go through a hash index. Keys
/// whose hash is pointer-based (records and other containers) can be
/// patched in place during graph rebuild, which leaves the index stale —
/// [`JsonMap::reindex`] rebuilds it from the entries.
pub struct JsonMap {
    entries: Vec<(Value, Value)>,
    index: HashMap<Value, usize, Xxh3Builder>,
}

impl JsonMap {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::with_hasher(Xxh3Builder::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts, replacing the value of an equal key. Returns the replaced
    /// value, if any.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        match self.index.get(&key) {
            Some(&i) => Some(core::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.index.contains_key(key)
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[(Value, Value)] {
        &self.entries
    }

    /// Appends an entry without touching the index; used by the graph
    /// rebuild, which re-indexes once patching is done.
    pub(crate) fn push_entry(&mut self, key: Value, value: Value) {
        self.entries.push((key, value));
    }

    pub(crate) fn patch_key(&mut self, i: usize, key: Value) {
        self.entries[i].0 = key;
    }

    pub(crate) fn patch_value(&mut self, i: usize, value: Value) {
        self.entries[i].1 = value;
    }

    /// Drops the index and rebuilds it from the entries. Later duplicates
    /// win, matching [`JsonMap::insert`] replacement semantics.
    pub fn reindex(&mut self) {
        self.index.clear();
        for (i, (k, _)) in self.entries.iter().enumerate() {
            self.index.insert(k.clone(), i);
        }
    }
}

impl Default for JsonMap {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for JsonMap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.entries.iter().map(|(k, v)| (k, v))).finish()
    }
}

impl FromIterator<(Value, Value)> for JsonMap {
    fn from_iter<T: IntoIterator<Item = (Value, Value)>>(iter: T) -> Self {
        let mut map = JsonMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// A record instance: a descriptor plus one slot per flattened field.
pub struct JsonRecord {
    descriptor: Rc<ClassDescriptor>,
    fields: RefCell<Vec<Value>>,
}

impl JsonRecord {
    /// A fresh instance with every slot at its declared zero value.
    pub fn new(descriptor: Rc<ClassDescriptor>) -> Rc<Self> {
        let fields = descriptor.fields().iter().map(|f| f.spec().zero()).collect();
        Rc::new(Self {
            descriptor,
            fields: RefCell::new(fields),
        })
    }

    pub fn descriptor(&self) -> &Rc<ClassDescriptor> {
        &self.descriptor
    }

    pub fn class_name(&self) -> &str {
        self.descriptor.name()
    }

    /// Value of the first field with the given name.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.descriptor
            .field_index(name)
            .map(|i| self.fields.borrow()[i].clone())
    }

    /// Sets the first field with the given name. Returns false if the
    /// class has no such field.
    pub fn set(&self, name: &str, value: Value) -> bool {
        match self.descriptor.field_index(name) {
            Some(i) => {
                self.fields.borrow_mut()[i] = value;
                true
            }
            None => false,
        }
    }

    pub fn field_at(&self, i: usize) -> Value {
        self.fields.borrow()[i].clone()
    }

    pub(crate) fn set_slot(&self, i: usize, value: Value) {
        self.fields.borrow_mut()[i] = value;
    }
}
