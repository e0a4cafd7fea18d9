/*
 * SPDX-FileCopyrightText: 2026 The graphjson developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Class descriptors and the descriptor registry.

There is no runtime reflection to lean on, so each record type that takes
part in (de)serialization publishes its metadata once through
[`Registry::register`]: a name, an optional parent class, and the ordered
list of declared fields. The registry flattens the field list on
registration — fields declared on the type first, then each ancestor walked
upward, shadowed duplicates kept — and memoizes the result in the
[`ClassDescriptor`], which both the writer and the reader consult.

A descriptor may also carry a pair of custom hooks replacing the per-field
walk: a write hook that appends raw `,"key":value` pairs to the character
sink, and a read hook that builds a [`Value`] from the parsed intermediate
object.

Field order is part of the public contract: identity ids are assigned in
traversal order, which depends on it.

*/

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::deser;
use crate::graph::{JsonRecord, Value};
use crate::json::JsonObject;
use crate::ser::{self, WriteNoStd};
use crate::utils::intern;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
/// Errors that can happen while registering a class.
pub enum Error {
    #[error("Class '{0}' is already registered")]
    DuplicateClass(String),
    #[error("Parent class '{0}' is not registered")]
    UnknownParent(String),
}

/// Custom emission hook: appends zero or more `,"key":value` pairs to the
/// sink. The writer has already emitted `{"@type":"…"` when the hook runs
/// and closes the brace afterwards, so every pair must be comma-prefixed.
pub type WriteHook = Box<dyn Fn(&JsonRecord, &mut dyn WriteNoStd) -> ser::Result<()>>;

/// Custom build hook: turns a parsed intermediate object into a [`Value`].
pub type ReadHook = Box<dyn Fn(&JsonObject, &Registry) -> deser::Result<Value>>;

/// The declared type of a field, an array element, or a container slot.
///
/// "Inferable from context" in the emission rules means the runtime type of
/// a value equals the declared [`TypeSpec`] of the slot holding it; in that
/// case the `@type` tag is suppressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    /// No declared type; anything goes.
    Any,
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
    Str,
    /// Epoch-millisecond timestamp.
    Date,
    /// A class-identity value, carried by name.
    Class,
    /// Fixed-size array with the given element type.
    Array(Box<TypeSpec>),
    /// Generic growable sequence of untyped elements.
    List,
    /// Key-value mapping; keys need not be strings.
    Map,
    /// A registered record class, by name.
    Record(Rc<str>),
}

impl TypeSpec {
    /// Whether this is one of the eleven atomic leaf kinds.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            TypeSpec::Bool
                | TypeSpec::Byte
                | TypeSpec::Short
                | TypeSpec::Int
                | TypeSpec::Long
                | TypeSpec::Float
                | TypeSpec::Double
                | TypeSpec::Char
                | TypeSpec::Str
                | TypeSpec::Date
                | TypeSpec::Class
        )
    }

    /// The zero value used to pre-fill record slots and to coerce empty
    /// strings: 0 for numeric kinds, `false`, `'\0'`, and null for
    /// reference kinds.
    pub fn zero(&self) -> Value {
        match self {
            TypeSpec::Bool => Value::Bool(false),
            TypeSpec::Byte => Value::Byte(0),
            TypeSpec::Short => Value::Short(0),
            TypeSpec::Int => Value::Int(0),
            TypeSpec::Long => Value::Long(0),
            TypeSpec::Float => Value::Float(0.0),
            TypeSpec::Double => Value::Double(0.0),
            TypeSpec::Char => Value::Char('\0'),
            TypeSpec::Date => Value::Date(0),
            _ => Value::Null,
        }
    }

    /// Shorthand for an array of `elem`.
    pub fn array_of(elem: TypeSpec) -> TypeSpec {
        TypeSpec::Array(Box::new(elem))
    }

    /// Shorthand for a record type by name.
    pub fn record(name: &str) -> TypeSpec {
        TypeSpec::Record(intern(name))
    }
}

/// The short tag for a leaf kind, or `None` for non-leaves.
pub fn short_tag(spec: &TypeSpec) -> Option<&'static str> {
    Some(match spec {
        TypeSpec::Bool => "boolean",
        TypeSpec::Byte => "byte",
        TypeSpec::Short => "short",
        TypeSpec::Int => "int",
        TypeSpec::Long => "long",
        TypeSpec::Float => "float",
        TypeSpec::Double => "double",
        TypeSpec::Char => "char",
        TypeSpec::Str => "string",
        TypeSpec::Date => "date",
        TypeSpec::Class => "class",
        _ => return None,
    })
}

/// The `@type` tag for any [`TypeSpec`]: short tags for leaves, `list` and
/// `map` for the generic containers, `<elem>[]` for arrays, the registered
/// name for records, and `object` for [`TypeSpec::Any`].
pub fn tag_of(spec: &TypeSpec) -> String {
    match spec {
        TypeSpec::Any => "object".into(),
        TypeSpec::List => "list".into(),
        TypeSpec::Map => "map".into(),
        TypeSpec::Array(elem) => format!("{}[]", tag_of(elem)),
        TypeSpec::Record(name) => name.to_string(),
        leaf => short_tag(leaf).unwrap().into(),
    }
}

/// Parses a `@type` tag back into a [`TypeSpec`]. Names that match no
/// short tag are record names; whether they resolve is decided against a
/// [`Registry`] at instantiation time.
pub fn parse_tag(tag: &str) -> TypeSpec {
    match tag {
        "object" => TypeSpec::Any,
        "boolean" => TypeSpec::Bool,
        "byte" => TypeSpec::Byte,
        "short" => TypeSpec::Short,
        "int" => TypeSpec::Int,
        "long" => TypeSpec::Long,
        "float" => TypeSpec::Float,
        "double" => TypeSpec::Double,
        "char" => TypeSpec::Char,
        "string" => TypeSpec::Str,
        "date" => TypeSpec::Date,
        "class" => TypeSpec::Class,
        "list" => TypeSpec::List,
        "map" => TypeSpec::Map,
        _ => match tag.strip_suffix("[]") {
            Some(elem) => TypeSpec::array_of(parse_tag(elem)),
            None => TypeSpec::Record(intern(tag)),
        },
    }
}

/// One declared instance field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: Rc<str>,
    spec: TypeSpec,
}

impl FieldDescriptor {
    pub fn new(name: &str, spec: TypeSpec) -> Self {
        Self {
            name: intern(name),
            spec,
        }
    }

    pub fn name(&self) -> &Rc<str> {
        &self.name
    }

    pub fn spec(&self) -> &TypeSpec {
        &self.spec
    }
}

/// Memoized per-class metadata: the flattened instance-field list and the
/// optional custom hooks. Immutable once registered.
pub struct ClassDescriptor {
    name: Rc<str>,
    parent: Option<Rc<ClassDescriptor>>,
    /// Flattened list: own fields first, then ancestors upward. Shadowed
    /// duplicates by simple name are kept in the order they appear.
    fields: Vec<FieldDescriptor>,
    custom_write: Option<WriteHook>,
    custom_read: Option<ReadHook>,
}

impl ClassDescriptor {
    pub fn name(&self) -> &Rc<str> {
        &self.name
    }

    pub fn parent(&self) -> Option<&Rc<ClassDescriptor>> {
        self.parent.as_ref()
    }

    /// The flattened instance-field list, in emission order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn custom_write(&self) -> Option<&WriteHook> {
        self.custom_write.as_ref()
    }

    pub fn custom_read(&self) -> Option<&ReadHook> {
        self.custom_read.as_ref()
    }

    /// Slot of the first field with the given name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.nth_field_index(name, 0)
    }

    /// Slot of the `n`-th field with the given name (shadowed fields keep
    /// one slot per declaration).
    pub fn nth_field_index(&self, name: &str, n: usize) -> Option<usize> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| &*f.name == name)
            .nth(n)
            .map(|(i, _)| i)
    }
}

impl core::fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| &p.name))
            .field("fields", &self.fields)
            .field("custom_write", &self.custom_write.is_some())
            .field("custom_read", &self.custom_read.is_some())
            .finish()
    }
}

/// The name → descriptor map shared by writer and reader.
///
/// Populated up front, read for the rest of its life. Descriptors are
/// handed out as [`Rc`]s, so records embed their descriptor directly and
/// emission never needs a lookup.
#[derive(Default)]
pub struct Registry {
    classes: RefCell<HashMap<Rc<str>, Rc<ClassDescriptor>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a root class with the given declared fields.
    pub fn register(&self, name: &str, fields: Vec<FieldDescriptor>) -> Result<Rc<ClassDescriptor>> {
        self.register_class(name, None, fields, None, None)
    }

    /// Registers a class extending `parent`, which must be registered
    /// already.
    pub fn register_subclass(
        &self,
        name: &str,
        parent: &str,
        fields: Vec<FieldDescriptor>,
    ) -> Result<Rc<ClassDescriptor>> {
        self.register_class(name, Some(parent), fields, None, None)
    }

    /// Full registration form: parent and custom hooks included.
    pub fn register_class(
        &self,
        name: &str,
        parent: Option<&str>,
        declared: Vec<FieldDescriptor>,
        custom_write: Option<WriteHook>,
        custom_read: Option<ReadHook>,
    ) -> Result<Rc<ClassDescriptor>> {
        let mut classes = self.classes.borrow_mut();
        if classes.contains_key(name) {
            return Err(Error::DuplicateClass(name.into()));
        }
        let parent = match parent {
            Some(p) => Some(
                classes
                    .get(p)
                    .cloned()
                    .ok_or_else(|| Error::UnknownParent(p.into()))?,
            ),
            None => None,
        };
        let mut fields = declared;
        if let Some(p) = &parent {
            fields.extend(p.fields.iter().cloned());
        }
        let descriptor = Rc::new(ClassDescriptor {
            name: intern(name),
            parent,
            fields,
            custom_write,
            custom_read,
        });
        classes.insert(descriptor.name.clone(), descriptor.clone());
        Ok(descriptor)
    }

    /// Looks up a registered class by name.
    pub fn lookup(&self, name: &str) -> Option<Rc<ClassDescriptor>> {
        self.classes.borrow().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flattened_order_subclass_first() {
        let registry = Registry::new();
        registry
            .register("Base", vec![FieldDescriptor::new("a", TypeSpec::Int)])
            .unwrap();
        let child = registry
            .register_subclass(
                "Child",
                "Base",
                vec![
                    FieldDescriptor::new("b", TypeSpec::Str),
                    FieldDescriptor::new("a", TypeSpec::Long),
                ],
            )
            .unwrap();
        let names: Vec<_> = child.fields().iter().map(|f| f.name().to_string()).collect();
        assert_eq!(names, ["b", "a", "a"]);
        assert_eq!(child.nth_field_index("a", 0), Some(1));
        assert_eq!(child.nth_field_index("a", 1), Some(2));
        assert_eq!(child.nth_field_index("a", 2), None);
    }

    #[test]
    fn test_duplicate_and_unknown_parent() {
        let registry = Registry::new();
        registry.register("A", vec![]).unwrap();
        assert!(matches!(
            registry.register("A", vec![]),
            Err(Error::DuplicateClass(_))
        ));
        assert!(matches!(
            registry.register_subclass("B", "Nope", vec![]),
            Err(Error::UnknownParent(_))
        ));
    }

    #[test]
    fn test_tag_round_trip() {
        for spec in [
            TypeSpec::Byte,
            TypeSpec::Str,
            TypeSpec::List,
            TypeSpec::Map,
            TypeSpec::array_of(TypeSpec::Int),
            TypeSpec::array_of(TypeSpec::array_of(TypeSpec::Double)),
            TypeSpec::array_of(TypeSpec::Any),
            TypeSpec::record("Person"),
        ] {
            assert_eq!(parse_tag(&tag_of(&spec)), spec);
        }
    }
}
