/*
 * SPDX-FileCopyrightText: 2026 The graphjson developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![cfg(test)]

use graphjson::meta::{ReadHook, WriteHook};
use graphjson::prelude::*;
use graphjson::ser::WriteNoStd;

fn person_registry() -> Registry {
    let registry = Registry::new();
    registry
        .register(
            "Person",
            vec![
                FieldDescriptor::new("name", TypeSpec::Str),
                FieldDescriptor::new("age", TypeSpec::Int),
            ],
        )
        .unwrap();
    registry
}

#[test]
fn test_record_round_trip() {
    let registry = person_registry();
    let person = JsonRecord::new(registry.lookup("Person").unwrap());
    person.set("name", Value::string("ada"));
    person.set("age", Value::Int(36));

    let bytes = encode(&Value::Record(person)).unwrap();
    assert_eq!(
        std::str::from_utf8(&bytes).unwrap(),
        r#"{"@type":"Person","name":"ada","age":36}"#
    );

    let back = decode(&bytes, &registry, ReadFlags::default()).unwrap();
    let back = back.as_record().unwrap();
    assert_eq!(back.get("name"), Some(Value::string("ada")));
    assert_eq!(back.get("age"), Some(Value::Int(36)));
}

#[test]
fn test_field_order_is_stable() {
    let registry = person_registry();
    let person = JsonRecord::new(registry.lookup("Person").unwrap());
    person.set("name", Value::string("b"));
    let first = encode(&Value::Record(person.clone())).unwrap();
    let second = encode(&Value::Record(person)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_nested_record_type_inference() {
    // A field whose declared type equals the runtime type carries no
    // @type tag.
    let registry = person_registry();
    registry
        .register(
            "Team",
            vec![FieldDescriptor::new("lead", TypeSpec::record("Person"))],
        )
        .unwrap();
    let lead = JsonRecord::new(registry.lookup("Person").unwrap());
    lead.set("name", Value::string("g"));
    lead.set("age", Value::Int(50));
    let team = JsonRecord::new(registry.lookup("Team").unwrap());
    team.set("lead", Value::Record(lead));

    let bytes = encode(&Value::Record(team)).unwrap();
    assert_eq!(
        std::str::from_utf8(&bytes).unwrap(),
        r#"{"@type":"Team","lead":{"name":"g","age":50}}"#
    );

    let back = decode(&bytes, &registry, ReadFlags::default()).unwrap();
    let lead = back.as_record().unwrap().get("lead").unwrap();
    assert_eq!(lead.as_record().unwrap().get("age"), Some(Value::Int(50)));
}

#[test]
fn test_subclass_in_superclass_slot_keeps_its_type() {
    let registry = person_registry();
    registry
        .register_subclass(
            "Employee",
            "Person",
            vec![FieldDescriptor::new("badge", TypeSpec::Int)],
        )
        .unwrap();
    registry
        .register(
            "Team",
            vec![FieldDescriptor::new("lead", TypeSpec::record("Person"))],
        )
        .unwrap();
    let lead = JsonRecord::new(registry.lookup("Employee").unwrap());
    lead.set("badge", Value::Int(7));
    lead.set("name", Value::string("e"));
    let team = JsonRecord::new(registry.lookup("Team").unwrap());
    team.set("lead", Value::Record(lead));

    let bytes = encode(&Value::Record(team)).unwrap();
    // Runtime type differs from the declared type, so @type is emitted.
    assert_eq!(
        std::str::from_utf8(&bytes).unwrap(),
        r#"{"@type":"Team","lead":{"@type":"Employee","badge":7,"name":"e","age":0}}"#
    );

    let back = decode(&bytes, &registry, ReadFlags::default()).unwrap();
    let lead = back.as_record().unwrap().get("lead").unwrap();
    let lead = lead.as_record().unwrap();
    assert_eq!(lead.class_name(), "Employee");
    assert_eq!(lead.get("badge"), Some(Value::Int(7)));
}

#[test]
fn test_shadowed_fields_round_trip() {
    let registry = Registry::new();
    registry
        .register("Base", vec![FieldDescriptor::new("id", TypeSpec::Int)])
        .unwrap();
    registry
        .register_subclass("Child", "Base", vec![FieldDescriptor::new("id", TypeSpec::Long)])
        .unwrap();
    let child = JsonRecord::new(registry.lookup("Child").unwrap());
    // set() reaches the first declaration; the shadowed ancestor slot
    // keeps its zero.
    child.set("id", Value::Long(1));

    let bytes = encode(&Value::Record(child)).unwrap();
    // Both declarations are emitted, subclass first.
    assert_eq!(
        std::str::from_utf8(&bytes).unwrap(),
        r#"{"@type":"Child","id":1,"id":0}"#
    );

    let back = decode(&bytes, &registry, ReadFlags::default()).unwrap();
    let back = back.as_record().unwrap();
    assert_eq!(back.field_at(0), Value::Long(1));
    assert_eq!(back.field_at(1), Value::Int(0));
}

#[test]
fn test_missing_fields_are_ignored() {
    let registry = person_registry();
    let back = decode(
        br#"{"@type":"Person","name":"x","unknown":5,"age":9}"#,
        &registry,
        ReadFlags::default(),
    )
    .unwrap();
    let back = back.as_record().unwrap();
    assert_eq!(back.get("name"), Some(Value::string("x")));
    assert_eq!(back.get("age"), Some(Value::Int(9)));
}

#[test]
fn test_skip_null_fields_flag() {
    let registry = person_registry();
    let person = JsonRecord::new(registry.lookup("Person").unwrap());
    person.set("age", Value::Int(3));

    let plain = encode(&Value::Record(person.clone())).unwrap();
    assert_eq!(
        std::str::from_utf8(&plain).unwrap(),
        r#"{"@type":"Person","name":null,"age":3}"#
    );

    let skipped = encode_with_flags(&Value::Record(person), WriteFlags::SKIP_NULL_FIELDS).unwrap();
    assert_eq!(
        std::str::from_utf8(&skipped).unwrap(),
        r#"{"@type":"Person","age":3}"#
    );
}

#[test]
fn test_unknown_type_fails_by_default() {
    let registry = Registry::new();
    let res = decode(br#"{"@type":"Ghost","a":1}"#, &registry, ReadFlags::default());
    assert!(matches!(res, Err(deser::Error::UnknownType(name)) if name == "Ghost"));
}

#[test]
fn test_unknown_type_degrades_to_mapping_when_allowed() {
    let registry = Registry::new();
    let back = decode(br#"{"@type":"Ghost","a":1}"#, &registry, ReadFlags::empty()).unwrap();
    let map = back.as_map().unwrap();
    assert_eq!(map.borrow().get(&Value::string("a")), Some(&Value::Long(1)));
}

#[test]
fn test_empty_record_round_trip() {
    let registry = Registry::new();
    registry.register("Empty", vec![]).unwrap();
    let rec = JsonRecord::new(registry.lookup("Empty").unwrap());
    let bytes = encode(&Value::Record(rec)).unwrap();
    assert_eq!(std::str::from_utf8(&bytes).unwrap(), r#"{"@type":"Empty"}"#);
    let back = decode(&bytes, &registry, ReadFlags::default()).unwrap();
    assert_eq!(back.as_record().unwrap().class_name(), "Empty");
}

#[test]
fn test_custom_hooks() {
    let registry = Registry::new();
    let write: WriteHook = Box::new(|rec, out: &mut dyn WriteNoStd| {
        if let Some(Value::Double(c)) = rec.get("celsius") {
            out.write_all(format!(",\"celsius\":{:?}", c).as_bytes())?;
        }
        Ok(())
    });
    let read: ReadHook = Box::new(|obj, registry| {
        let rec = JsonRecord::new(registry.lookup("Temp").unwrap());
        if let Some(Elem::Double(d)) = obj.get("celsius") {
            rec.set("celsius", Value::Double(*d));
        }
        Ok(Value::Record(rec))
    });
    registry
        .register_class(
            "Temp",
            None,
            vec![FieldDescriptor::new("celsius", TypeSpec::Double)],
            Some(write),
            Some(read),
        )
        .unwrap();

    let temp = JsonRecord::new(registry.lookup("Temp").unwrap());
    temp.set("celsius", Value::Double(21.5));

    let bytes = encode(&Value::Record(temp)).unwrap();
    // A custom writer always gets a @type tag so the reader can dispatch
    // to the matching read hook.
    assert_eq!(
        std::str::from_utf8(&bytes).unwrap(),
        r#"{"@type":"Temp","celsius":21.5}"#
    );

    let back = decode(&bytes, &registry, ReadFlags::default()).unwrap();
    assert_eq!(
        back.as_record().unwrap().get("celsius"),
        Some(Value::Double(21.5))
    );
}
