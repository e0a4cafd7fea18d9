/*
 * SPDX-FileCopyrightText: 2026 The graphjson developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Object-graph (de)serialization to plain JSON.

`graphjson` serializes in-memory object graphs — cyclic references, shared
subgraphs, and heterogeneous arrays included — to standard JSON augmented
with a small meta-key vocabulary (`@type`, `@id`, `@ref`, `@items`,
`@keys`, `value`) recording exactly what plain JSON would lose: concrete
runtime types, object identity, and the difference between an array
container and a record.

Participating record classes publish their metadata once through a
[`meta::Registry`]; graphs are built from [`graph::Value`] nodes, whose
container variants carry identity through [`std::rc::Rc`]. Encoding runs a
reference trace followed by an emission pass ([`ser`]); decoding parses to
an intermediate tree and rebuilds the graph, patching forward references
after the walk ([`deser`]).

```rust
use graphjson::prelude::*;

let registry = Registry::new();
registry
    .register("Point", vec![
        FieldDescriptor::new("x", TypeSpec::Int),
        FieldDescriptor::new("y", TypeSpec::Int),
    ])
    .unwrap();

let point = JsonRecord::new(registry.lookup("Point").unwrap());
point.set("x", Value::Int(3));
point.set("y", Value::Int(4));

let bytes = encode(&Value::Record(point)).unwrap();
assert_eq!(
    std::str::from_utf8(&bytes).unwrap(),
    r#"{"@type":"Point","x":3,"y":4}"#
);

let back = decode(&bytes, &registry, ReadFlags::default()).unwrap();
assert_eq!(back.as_record().unwrap().get("x"), Some(Value::Int(3)));
```

*/

#![deny(unconditional_recursion)]

pub mod deser;
pub mod graph;
pub mod json;
pub mod meta;
pub mod ser;
pub mod utils;

pub use deser::{decode, decode_tree, load};
pub use ser::{encode, encode_with_flags};

pub mod prelude {
    pub use crate::deser::{self, decode, decode_tree, load, ReadFlags};
    pub use crate::graph::{ArrayData, JsonMap, JsonRecord, Value};
    pub use crate::json::Elem;
    pub use crate::meta::{FieldDescriptor, Registry, TypeSpec};
    pub use crate::ser::{self, encode, encode_with_flags, Serialize, WriteFlags};
    pub use crate::utils::*;
}
