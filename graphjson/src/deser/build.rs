/*
 * SPDX-FileCopyrightText: 2026 The graphjson developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

The graph rebuild pass.

Walks the intermediate tree with an explicit task stack and turns it into
a [`Value`] graph. Each intermediate object is instantiated once — by its
`@type` tag if present, by the expected type of the enclosing slot
otherwise — and the materialized value is stored back on the object as its
*target*, so back references resolve by a table lookup. A `@ref` whose
target is not built yet leaves a null placeholder and a patch record
(site + id); the patch queue is drained once, after the walk.

Mappings materialized here are re-indexed after patching: a key patched in
place would otherwise sit in the wrong hash bucket.

A dangling reference — an id the patch pass cannot resolve — is logged,
skipped, and surfaced as the final aggregate error once the pass is
complete.

*/

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::coerce::coerce;
use super::{Error, ReadFlags, Result};
use crate::graph::{ArrayData, JsonMap, JsonRecord, Value};
use crate::json::parser::Parsed;
use crate::json::{Elem, JsonObject};
use crate::meta::{parse_tag, Registry, TypeSpec};

/// Rebuilds the graph from a parsed document.
pub(super) fn build(parsed: Parsed, registry: &Registry, flags: ReadFlags) -> Result<Value> {
    let mut builder = Builder {
        registry,
        flags,
        refs: parsed.refs,
        tasks: Vec::new(),
        pending: Vec::new(),
        maps: Vec::new(),
    };
    let root = match builder.resolve(&parsed.root, &TypeSpec::Any)? {
        Resolved::Done(v) => v,
        // Nothing outside the document can define the root's target.
        Resolved::Patch(id) => return Err(Error::UnresolvedRefs { count: 1, first: id }),
    };
    builder.run()?;
    builder.patch()?;
    for map in &builder.maps {
        map.borrow_mut().reindex();
    }
    Ok(root)
}

/// Where a patched-in value lands.
enum Site {
    Field(Rc<JsonRecord>, usize),
    ArraySlot(Rc<RefCell<ArrayData>>, usize),
    ListSlot(Rc<RefCell<Vec<Value>>>, usize),
    MapKey(Rc<RefCell<JsonMap>>, usize),
    MapValue(Rc<RefCell<JsonMap>>, usize),
}

struct Pending {
    site: Site,
    id: i64,
}

/// Deferred population of a container created during the walk.
enum Task {
    Record {
        obj: Rc<JsonObject>,
        rec: Rc<JsonRecord>,
    },
    Elements {
        items: Rc<Vec<Elem>>,
        arr: Rc<RefCell<ArrayData>>,
        elem: TypeSpec,
    },
    List {
        items: Rc<Vec<Elem>>,
        list: Rc<RefCell<Vec<Value>>>,
    },
    MapPairs {
        keys: Rc<Vec<Elem>>,
        items: Rc<Vec<Elem>>,
        map: Rc<RefCell<JsonMap>>,
    },
    MapInline {
        pairs: Rc<Vec<(Rc<str>, Elem)>>,
        map: Rc<RefCell<JsonMap>>,
    },
}

enum Resolved {
    Done(Value),
    /// Forward reference: the caller leaves a null placeholder and queues
    /// a patch record for this id.
    Patch(i64),
}

struct Builder<'a> {
    registry: &'a Registry,
    flags: ReadFlags,
    refs: HashMap<i64, Rc<JsonObject>>,
    tasks: Vec<Task>,
    pending: Vec<Pending>,
    /// Every mapping materialized during the walk, re-indexed after
    /// patching.
    maps: Vec<Rc<RefCell<JsonMap>>>,
}

impl<'a> Builder<'a> {
    fn resolve(&mut self, elem: &Elem, declared: &TypeSpec) -> Result<Resolved> {
        match elem {
            Elem::Object(obj) => self.object(obj, declared),
            Elem::Array(items) => Ok(Resolved::Done(match declared {
                TypeSpec::Array(elem_spec) => self.build_array(items, elem_spec)?,
                TypeSpec::List => self.build_list(items),
                // Degenerate JS-style usage: an untyped bare array.
                TypeSpec::Any => {
                    let arr = Rc::new(RefCell::new(ArrayData::values(
                        TypeSpec::Any,
                        items.len(),
                    )));
                    self.tasks.push(Task::Elements {
                        items: items.clone(),
                        arr: arr.clone(),
                        elem: TypeSpec::Any,
                    });
                    Value::Array(arr)
                }
                other => {
                    return Err(Error::Semantic(format!(
                        "an array cannot populate a slot of type {:?}",
                        other
                    )))
                }
            })),
            scalar => Ok(Resolved::Done(coerce(scalar, declared)?)),
        }
    }

    fn object(&mut self, obj: &Rc<JsonObject>, declared: &TypeSpec) -> Result<Resolved> {
        if let Some(id) = obj.ref_id() {
            return Ok(match self.refs.get(&id).and_then(|o| o.target()) {
                Some(v) => Resolved::Done(v),
                None => Resolved::Patch(id),
            });
        }
        if let Some(v) = obj.target() {
            return Ok(Resolved::Done(v));
        }
        let v = self.instantiate(obj, declared)?;
        obj.set_target(v.clone());
        Ok(Resolved::Done(v))
    }

    /// Decides what an intermediate object materializes as: its `@type`
    /// tag wins; otherwise the expected type of the enclosing slot.
    fn instantiate(&mut self, obj: &Rc<JsonObject>, declared: &TypeSpec) -> Result<Value> {
        if let Some(tag) = obj.type_tag() {
            let spec = parse_tag(tag);
            // An explicit "object" tag carries no information; fall
            // through to the expected type.
            if spec != TypeSpec::Any {
                return self.instantiate_tagged(obj, &spec, tag);
            }
        }

        if let TypeSpec::Array(elem_spec) = declared {
            if **elem_spec == TypeSpec::Char {
                if let Some(Elem::Str(s)) = obj.value_slot() {
                    return Ok(Value::array(ArrayData::Chars(s.to_string())));
                }
            }
            return match self.items_vec(obj)? {
                Some(items) => self.build_array(&items, elem_spec),
                None => Err(Error::Semantic(
                    "@items missing on a declared array".into(),
                )),
            };
        }

        if matches!(declared, TypeSpec::List | TypeSpec::Any) {
            if let Some(items) = self.items_vec(obj)? {
                return Ok(self.build_list(&items));
            }
        }

        if declared.is_leaf() {
            return match obj.value_slot() {
                Some(payload) => coerce(payload, declared),
                None => Ok(declared.zero()),
            };
        }

        match declared {
            TypeSpec::Record(name) => self.record_for(&name.clone(), obj),
            TypeSpec::Map => self.build_map(obj),
            // An empty object in a sequence slot is a fresh, empty
            // sequence.
            TypeSpec::List => Ok(Value::list(Vec::new())),
            TypeSpec::Any => {
                if obj.entries().is_empty() {
                    // A bare {} with nothing expected decodes to null.
                    Ok(Value::Null)
                } else {
                    // Untyped object: a generic mapping of its fields.
                    self.build_inline_map(obj)
                }
            }
            _ => unreachable!("leaves and arrays handled above"),
        }
    }

    fn instantiate_tagged(
        &mut self,
        obj: &Rc<JsonObject>,
        spec: &TypeSpec,
        tag: &Rc<str>,
    ) -> Result<Value> {
        if spec.is_leaf() {
            return match obj.value_slot() {
                Some(payload) if payload.is_scalar() => coerce(payload, spec),
                Some(_) => Err(Error::Semantic(format!(
                    "boxed '{}' payload must be a scalar",
                    tag
                ))),
                None => Err(Error::Semantic(format!(
                    "boxed '{}' is missing its value",
                    tag
                ))),
            };
        }
        match spec {
            TypeSpec::List => Ok(match self.items_vec(obj)? {
                Some(items) => self.build_list(&items),
                None => Value::list(Vec::new()),
            }),
            TypeSpec::Map => self.build_map(obj),
            TypeSpec::Array(elem_spec) => {
                if **elem_spec == TypeSpec::Char {
                    if let Some(Elem::Str(s)) = obj.value_slot() {
                        return Ok(Value::array(ArrayData::Chars(s.to_string())));
                    }
                }
                match self.items_vec(obj)? {
                    Some(items) => self.build_array(&items, elem_spec),
                    None => Err(Error::Semantic(format!(
                        "@items missing on array '{}'",
                        tag
                    ))),
                }
            }
            TypeSpec::Record(name) => self.record_for(&name.clone(), obj),
            _ => unreachable!("leaf tags handled above"),
        }
    }

    /// Record instantiation: a fresh zero-filled instance of the
    /// registered class, or the custom read hook if the class declares
    /// one. An unknown name fails, or degrades to a generic mapping when
    /// [`ReadFlags::FAIL_ON_UNKNOWN_TYPE`] is cleared.
    fn record_for(&mut self, name: &Rc<str>, obj: &Rc<JsonObject>) -> Result<Value> {
        match self.registry.lookup(name) {
            Some(descriptor) => {
                if let Some(hook) = descriptor.custom_read() {
                    return hook(obj, self.registry);
                }
                let rec = JsonRecord::new(descriptor);
                self.tasks.push(Task::Record {
                    obj: obj.clone(),
                    rec: rec.clone(),
                });
                Ok(Value::Record(rec))
            }
            None => {
                if self.flags.contains(ReadFlags::FAIL_ON_UNKNOWN_TYPE) {
                    Err(Error::UnknownType(name.to_string()))
                } else {
                    log::debug!("unknown type tag '{}', degrading to a generic mapping", name);
                    self.build_inline_map(obj)
                }
            }
        }
    }

    /// `@items` as an array of nodes, if present.
    fn items_vec(&self, obj: &JsonObject) -> Result<Option<Rc<Vec<Elem>>>> {
        self.entry_vec(obj, "@items")
    }

    fn entry_vec(&self, obj: &JsonObject, key: &str) -> Result<Option<Rc<Vec<Elem>>>> {
        match obj.get(key) {
            Some(Elem::Array(items)) => Ok(Some(items.clone())),
            Some(_) => Err(Error::Semantic(format!("{} must be an array", key))),
            None => Ok(None),
        }
    }

    fn build_list(&mut self, items: &Rc<Vec<Elem>>) -> Value {
        let list = Rc::new(RefCell::new(vec![Value::Null; items.len()]));
        self.tasks.push(Task::List {
            items: items.clone(),
            list: list.clone(),
        });
        Value::List(list)
    }

    fn build_array(&mut self, items: &Rc<Vec<Elem>>, elem_spec: &TypeSpec) -> Result<Value> {
        if is_primitive_elem(elem_spec) {
            return Ok(Value::array(fill_prim(items, elem_spec)?));
        }
        let arr = Rc::new(RefCell::new(ArrayData::values(
            elem_spec.clone(),
            items.len(),
        )));
        self.tasks.push(Task::Elements {
            items: items.clone(),
            arr: arr.clone(),
            elem: elem_spec.clone(),
        });
        Ok(Value::Array(arr))
    }

    /// A tagged mapping: the positional `@keys`/`@items` form, or the
    /// inlined plain-object form when the keys were strings.
    fn build_map(&mut self, obj: &Rc<JsonObject>) -> Result<Value> {
        let keys = self.entry_vec(obj, "@keys")?;
        let items = self.items_vec(obj)?;
        match (keys, items) {
            (Some(keys), Some(items)) => {
                if keys.len() != items.len() {
                    return Err(Error::Semantic(
                        "@keys and @items must have the same length".into(),
                    ));
                }
                let map = self.fresh_map();
                self.tasks.push(Task::MapPairs {
                    keys,
                    items,
                    map: map.clone(),
                });
                Ok(Value::Map(map))
            }
            (None, None) => self.build_inline_map(obj),
            _ => Err(Error::Semantic(
                "a mapping needs both @keys and @items, or neither".into(),
            )),
        }
    }

    /// A mapping from the object's own (string-keyed) entries.
    fn build_inline_map(&mut self, obj: &Rc<JsonObject>) -> Result<Value> {
        let pairs: Vec<(Rc<str>, Elem)> = obj
            .entries()
            .iter()
            .filter(|(k, _)| !k.starts_with('@'))
            .cloned()
            .collect();
        let map = self.fresh_map();
        self.tasks.push(Task::MapInline {
            pairs: Rc::new(pairs),
            map: map.clone(),
        });
        Ok(Value::Map(map))
    }

    fn fresh_map(&mut self) -> Rc<RefCell<JsonMap>> {
        let map = Rc::new(RefCell::new(JsonMap::new()));
        self.maps.push(map.clone());
        map
    }

    fn run(&mut self) -> Result<()> {
        while let Some(task) = self.tasks.pop() {
            match task {
                Task::Record { obj, rec } => self.fill_record(&obj, &rec)?,
                Task::Elements { items, arr, elem } => self.fill_elements(&items, &arr, &elem)?,
                Task::List { items, list } => self.fill_list(&items, &list)?,
                Task::MapPairs { keys, items, map } => self.fill_map_pairs(&keys, &items, &map)?,
                Task::MapInline { pairs, map } => self.fill_map_inline(&pairs, &map)?,
            }
        }
        Ok(())
    }

    /// Field population: entries in document order, `@`-keys skipped,
    /// the k-th occurrence of a name routed to the k-th matching slot
    /// (shadowed fields), names the class does not declare silently
    /// ignored.
    fn fill_record(&mut self, obj: &Rc<JsonObject>, rec: &Rc<JsonRecord>) -> Result<()> {
        let descriptor = rec.descriptor().clone();
        let mut seen: HashMap<Rc<str>, usize> = HashMap::new();
        for (key, elem) in obj.entries() {
            if key.starts_with('@') {
                continue;
            }
            let occurrence = {
                let n = seen.entry(key.clone()).or_insert(0);
                let occurrence = *n;
                *n += 1;
                occurrence
            };
            let Some(slot) = descriptor.nth_field_index(key, occurrence) else {
                continue;
            };
            let spec = descriptor.fields()[slot].spec().clone();
            match self.resolve(elem, &spec)? {
                Resolved::Done(v) => rec.set_slot(slot, v),
                Resolved::Patch(id) => self.pending.push(Pending {
                    site: Site::Field(rec.clone(), slot),
                    id,
                }),
            }
        }
        Ok(())
    }

    fn fill_elements(
        &mut self,
        items: &[Elem],
        arr: &Rc<RefCell<ArrayData>>,
        elem: &TypeSpec,
    ) -> Result<()> {
        for (i, node) in items.iter().enumerate() {
            match self.resolve(node, elem)? {
                Resolved::Done(v) => {
                    if let ArrayData::Values { items, .. } = &mut *arr.borrow_mut() {
                        items[i] = v;
                    }
                }
                Resolved::Patch(id) => self.pending.push(Pending {
                    site: Site::ArraySlot(arr.clone(), i),
                    id,
                }),
            }
        }
        Ok(())
    }

    fn fill_list(&mut self, items: &[Elem], list: &Rc<RefCell<Vec<Value>>>) -> Result<()> {
        for (i, node) in items.iter().enumerate() {
            match self.resolve(node, &TypeSpec::Any)? {
                Resolved::Done(v) => list.borrow_mut()[i] = v,
                Resolved::Patch(id) => self.pending.push(Pending {
                    site: Site::ListSlot(list.clone(), i),
                    id,
                }),
            }
        }
        Ok(())
    }

    fn fill_map_pairs(
        &mut self,
        keys: &[Elem],
        items: &[Elem],
        map: &Rc<RefCell<JsonMap>>,
    ) -> Result<()> {
        for i in 0..keys.len() {
            let k = match self.resolve(&keys[i], &TypeSpec::Any)? {
                Resolved::Done(v) => v,
                Resolved::Patch(id) => {
                    self.pending.push(Pending {
                        site: Site::MapKey(map.clone(), i),
                        id,
                    });
                    Value::Null
                }
            };
            let v = match self.resolve(&items[i], &TypeSpec::Any)? {
                Resolved::Done(v) => v,
                Resolved::Patch(id) => {
                    self.pending.push(Pending {
                        site: Site::MapValue(map.clone(), i),
                        id,
                    });
                    Value::Null
                }
            };
            map.borrow_mut().push_entry(k, v);
        }
        Ok(())
    }

    fn fill_map_inline(
        &mut self,
        pairs: &[(Rc<str>, Elem)],
        map: &Rc<RefCell<JsonMap>>,
    ) -> Result<()> {
        for (i, (key, elem)) in pairs.iter().enumerate() {
            let v = match self.resolve(elem, &TypeSpec::Any)? {
                Resolved::Done(v) => v,
                Resolved::Patch(id) => {
                    self.pending.push(Pending {
                        site: Site::MapValue(map.clone(), i),
                        id,
                    });
                    Value::Null
                }
            };
            map.borrow_mut().push_entry(Value::Str(key.clone()), v);
        }
        Ok(())
    }

    /// Drains the patch queue once. Dangling ids are logged and skipped,
    /// then surfaced as one aggregate error.
    fn patch(&mut self) -> Result<()> {
        let mut dropped = 0usize;
        let mut first_missing = None;
        for Pending { site, id } in self.pending.drain(..) {
            let Some(v) = self.refs.get(&id).and_then(|o| o.target()) else {
                log::warn!("dropping unresolved forward reference to id {}", id);
                dropped += 1;
                first_missing.get_or_insert(id);
                continue;
            };
            match site {
                Site::Field(rec, slot) => rec.set_slot(slot, v),
                Site::ArraySlot(arr, i) => {
                    if let ArrayData::Values { items, .. } = &mut *arr.borrow_mut() {
                        items[i] = v;
                    }
                }
                Site::ListSlot(list, i) => list.borrow_mut()[i] = v,
                Site::MapKey(map, i) => map.borrow_mut().patch_key(i, v),
                Site::MapValue(map, i) => map.borrow_mut().patch_value(i, v),
            }
        }
        match first_missing {
            Some(first) => Err(Error::UnresolvedRefs {
                count: dropped,
                first,
            }),
            None => Ok(()),
        }
    }
}

fn is_primitive_elem(spec: &TypeSpec) -> bool {
    matches!(
        spec,
        TypeSpec::Byte
            | TypeSpec::Short
            | TypeSpec::Int
            | TypeSpec::Long
            | TypeSpec::Float
            | TypeSpec::Double
            | TypeSpec::Bool
            | TypeSpec::Char
    )
}

/// Tight per-kind loops for primitive element arrays.
fn fill_prim(items: &[Elem], spec: &TypeSpec) -> Result<ArrayData> {
    macro_rules! fill {
        ($data:ident, $value:ident) => {{
            let mut out = Vec::with_capacity(items.len());
            for node in items {
                match coerce(node, spec)? {
                    Value::$value(x) => out.push(x),
                    _ => unreachable!(),
                }
            }
            Ok(ArrayData::$data(out))
        }};
    }
    match spec {
        TypeSpec::Byte => fill!(Bytes, Byte),
        TypeSpec::Short => fill!(Shorts, Short),
        TypeSpec::Int => fill!(Ints, Int),
        TypeSpec::Long => fill!(Longs, Long),
        TypeSpec::Float => fill!(Floats, Float),
        TypeSpec::Double => fill!(Doubles, Double),
        TypeSpec::Bool => fill!(Bools, Bool),
        TypeSpec::Char => {
            // A char array may embed as one string.
            if let [Elem::Str(s)] = items {
                return Ok(ArrayData::Chars(s.to_string()));
            }
            let mut out = String::new();
            for node in items {
                match coerce(node, spec)? {
                    Value::Char(c) => out.push(c),
                    Value::Null => out.push('\0'),
                    _ => unreachable!(),
                }
            }
            Ok(ArrayData::Chars(out))
        }
        _ => unreachable!(),
    }
}
