/*
 * SPDX-FileCopyrightText: 2026 The graphjson developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

The reference-tracing pass.

Before emitting anything, the writer walks the graph once to find the nodes
reachable by more than one path. Every identity-carrying node gets a
monotonically increasing 64-bit id on first encounter; meeting it again
records the id as *shared*. Only shared nodes get `@id` stamps in the
output, and the second and later encounters become `@ref` edges.

The walk is iterative; arrays of leaf element types are pruned since their
elements cannot reference other graph nodes.

*/

use std::collections::{HashMap, HashSet};

use crate::graph::{ArrayData, Value};

/// Outcome of the trace: ids in first-encounter order, and which of them
/// are referenced more than once.
pub(super) struct RefTrace {
    pub ids: HashMap<usize, u64>,
    pub shared: HashSet<u64>,
}

impl RefTrace {
    /// The id of `v`, if `v` is multiply referenced.
    pub fn shared_id(&self, v: &Value) -> Option<u64> {
        let id = *self.ids.get(&v.identity()?)?;
        self.shared.contains(&id).then_some(id)
    }
}

pub(super) fn trace(root: &Value) -> RefTrace {
    let mut ids: HashMap<usize, u64> = HashMap::new();
    let mut shared: HashSet<u64> = HashSet::new();
    let mut next_id: u64 = 1;
    let mut stack: Vec<Value> = vec![root.clone()];

    while let Some(v) = stack.pop() {
        let Some(key) = v.identity() else { continue };
        if let Some(&id) = ids.get(&key) {
            shared.insert(id);
            continue;
        }
        ids.insert(key, next_id);
        next_id += 1;
        match &v {
            Value::Record(r) => {
                for i in 0..r.descriptor().fields().len() {
                    let field = r.field_at(i);
                    if !field.is_null() {
                        stack.push(field);
                    }
                }
            }
            Value::List(l) => {
                for item in l.borrow().iter() {
                    if !item.is_null() {
                        stack.push(item.clone());
                    }
                }
            }
            Value::Map(m) => {
                for (k, val) in m.borrow().entries() {
                    if !k.is_null() {
                        stack.push(k.clone());
                    }
                    if !val.is_null() {
                        stack.push(val.clone());
                    }
                }
            }
            Value::Array(a) => {
                // Leaf-element arrays are pruned.
                if let ArrayData::Values { items, .. } = &*a.borrow() {
                    for item in items {
                        if !item.is_null() {
                            stack.push(item.clone());
                        }
                    }
                }
            }
            // Strings carry identity but have no outgoing references.
            _ => {}
        }
    }

    RefTrace { ids, shared }
}
