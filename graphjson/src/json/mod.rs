/*
 * SPDX-FileCopyrightText: 2026 The graphjson developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

The intermediate tree.

Parsing produces an [`Elem`] tree: scalars, arrays, and objects, exactly as
they appear in the input. Objects capture the `@type`, `@id`, and `@ref`
meta-keys in dedicated slots at parse time; everything else — `@items`,
`@keys`, `value`, and user fields — stays in the ordered entry list. Keys
beginning with `@` are reserved and are never treated as user fields by the
graph rebuild.

After instantiation, an object carries its *target*: the materialized
[`Value`] it refers to. Back references resolve by reading the target of
the object registered under the referenced id; forward references wait for
it in the patch queue.

Arrays and objects sit behind [`Rc`], so cloning an [`Elem`] is cheap and
the reference table can alias objects into the tree.

*/

use std::cell::RefCell;
use std::rc::Rc;

use crate::graph::Value;

pub mod parser;

/// One node of the intermediate tree.
#[derive(Debug, Clone)]
pub enum Elem {
    Null,
    Bool(bool),
    /// Any number without `.`, `e`, or `E`.
    Long(i64),
    /// Any number with a fractional or exponent part.
    Double(f64),
    Str(Rc<str>),
    Array(Rc<Vec<Elem>>),
    Object(Rc<JsonObject>),
}

impl Elem {
    pub fn as_object(&self) -> Option<&Rc<JsonObject>> {
        match self {
            Elem::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Rc<Vec<Elem>>> {
        match self {
            Elem::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&Rc<str>> {
        match self {
            Elem::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this node is a scalar (not an array or object).
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Elem::Array(_) | Elem::Object(_))
    }
}

// Same flattening as the graph side: the default glue would recurse
// through deeply nested input, so a sole owner drains its children into a
// work stack before dropping. The target is a graph value whose own drop
// is iterative.
impl Drop for Elem {
    fn drop(&mut self) {
        fn has_children(e: &Elem) -> bool {
            match e {
                Elem::Array(rc) => Rc::strong_count(rc) == 1 && !rc.is_empty(),
                Elem::Object(rc) => {
                    Rc::strong_count(rc) == 1
                        && (!rc.entries.is_empty() || rc.target.borrow().is_some())
                }
                _ => false,
            }
        }
        if !has_children(self) {
            return;
        }
        let mut stack = vec![core::mem::replace(self, Elem::Null)];
        while let Some(mut e) = stack.pop() {
            match &mut e {
                Elem::Array(rc) => {
                    if let Some(items) = Rc::get_mut(rc) {
                        stack.append(items);
                    }
                }
                Elem::Object(rc) => {
                    if let Some(obj) = Rc::get_mut(rc) {
                        stack.extend(obj.entries.drain(..).map(|(_, child)| child));
                        drop(obj.target.get_mut().take());
                    }
                }
                _ => {}
            }
        }
    }
}

/// A parsed JSON object, meta-keys split out.
#[derive(Debug)]
pub struct JsonObject {
    type_tag: Option<Rc<str>>,
    id: Option<i64>,
    ref_id: Option<i64>,
    /// Remaining entries in document order, `@items`/`@keys`/`value`
    /// included.
    entries: Vec<(Rc<str>, Elem)>,
    /// The materialized value, once the rebuild pass has instantiated it.
    target: RefCell<Option<Value>>,
}

impl JsonObject {
    pub(crate) fn new(
        type_tag: Option<Rc<str>>,
        id: Option<i64>,
        ref_id: Option<i64>,
        entries: Vec<(Rc<str>, Elem)>,
    ) -> Self {
        Self {
            type_tag,
            id,
            ref_id,
            entries,
            target: RefCell::new(None),
        }
    }

    pub fn type_tag(&self) -> Option<&Rc<str>> {
        self.type_tag.as_ref()
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn ref_id(&self) -> Option<i64> {
        self.ref_id
    }

    pub fn entries(&self) -> &[(Rc<str>, Elem)] {
        &self.entries
    }

    /// First entry with the given key.
    pub fn get(&self, key: &str) -> Option<&Elem> {
        self.entries
            .iter()
            .find(|(k, _)| &**k == key)
            .map(|(_, v)| v)
    }

    pub fn items(&self) -> Option<&Elem> {
        self.get("@items")
    }

    pub fn keys(&self) -> Option<&Elem> {
        self.get("@keys")
    }

    /// The scalar payload of a boxed leaf.
    pub fn value_slot(&self) -> Option<&Elem> {
        self.get("value")
    }

    /// True when the object carries nothing at all: `{}`.
    pub fn is_empty(&self) -> bool {
        self.type_tag.is_none()
            && self.id.is_none()
            && self.ref_id.is_none()
            && self.entries.is_empty()
    }

    pub fn target(&self) -> Option<Value> {
        self.target.borrow().clone()
    }

    pub(crate) fn set_target(&self, value: Value) {
        *self.target.borrow_mut() = Some(value);
    }
}
