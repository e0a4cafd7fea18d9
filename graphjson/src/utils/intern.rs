/*
 * SPDX-FileCopyrightText: 2026 The graphjson developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Literal intern pool.

A fixed table of the strings that occur over and over in the wire format:
the meta-keys themselves, the `true`/`false`/`null` words and their case
variants, and the single-digit numerals. Looking one of these up returns a
canonical [`Rc<str>`] instance, so equal occurrences share one allocation.

The pool is populated once and never mutated afterwards. Graph values are
[`Rc`]-based and therefore confined to one thread, so the pool is
thread-local; each thread sees its own set of canonical instances.

*/

use std::cell::OnceCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Strings held by the pool, in no particular order.
const LITERALS: &[&str] = &[
    "@type", "@id", "@ref", "@items", "@keys", "value", //
    "true", "True", "TRUE", "false", "False", "FALSE", //
    "null", "Null", "NULL", //
    "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", //
    "",
];

thread_local! {
    static POOL: OnceCell<HashMap<&'static str, Rc<str>>> = const { OnceCell::new() };
}

/// Returns the canonical instance of `s`, if `s` is in the pool.
pub fn literal(s: &str) -> Option<Rc<str>> {
    POOL.with(|pool| {
        pool.get_or_init(|| LITERALS.iter().map(|&l| (l, Rc::from(l))).collect())
            .get(s)
            .cloned()
    })
}

/// Returns the canonical instance of `s` if pooled, or a fresh allocation.
pub fn intern(s: &str) -> Rc<str> {
    literal(s).unwrap_or_else(|| Rc::from(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_hits_share_allocation() {
        let a = intern("@type");
        let b = intern("@type");
        assert!(Rc::ptr_eq(&a, &b));
        let t = intern("true");
        let u = intern("true");
        assert!(Rc::ptr_eq(&t, &u));
    }

    #[test]
    fn test_misses_allocate() {
        let a = intern("not pooled");
        let b = intern("not pooled");
        assert_eq!(a, b);
        assert!(!Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_digits_and_empty() {
        for d in ["0", "9", ""] {
            assert!(literal(d).is_some());
        }
        assert!(literal("10").is_none());
    }
}
