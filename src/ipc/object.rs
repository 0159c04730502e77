/*
Copyright (c) 2022 VMware, Inc.
SPDX-License-Identifier: MIT
Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
 */

//! The IPC object: a typed key/value tree with a small fixed header, used for every message
//! exchanged with the manager. The wire encoding (length-prefixed JSON, see [`crate::ipc::codec`])
//! is this crate's own choice; only the header fields and the request/reply shape are part of
//! the protocol.

use serde_json::{Map, Value};

pub const VERSION: u64 = 1;

/// Builds a fresh object with the standard header populated. Method-specific fields are added
/// by the caller after this returns.
pub fn prepare(method: &str, id: u64, reply: bool) -> Map<String, Value> {
    let mut obj = Map::new();
    obj.insert("ipc:version".into(), Value::from(VERSION));
    obj.insert("ipc:id".into(), Value::from(id));
    obj.insert("ipc:method".into(), Value::from(method));
    obj.insert("ipc:reply".into(), Value::from(reply));
    obj
}

pub fn is_reply(obj: &Map<String, Value>) -> bool {
    obj.get("ipc:reply").and_then(Value::as_bool).unwrap_or(false)
}

/// An object is valid if it carries all four header fields with the right types. Anything else
/// -- a missing field, a reply flag that isn't a bool, a method that isn't a string -- is
/// rejected outright rather than partially trusted.
pub fn validate(obj: &Map<String, Value>) -> bool {
    obj.get("ipc:reply").map(Value::is_boolean).unwrap_or(false)
        && obj.get("ipc:method").map(Value::is_string).unwrap_or(false)
        && obj.get("ipc:id").map(Value::is_u64).unwrap_or(false)
        && obj.get("ipc:version").map(Value::is_u64).unwrap_or(false)
}

pub fn method(obj: &Map<String, Value>) -> Option<&str> {
    obj.get("ipc:method").and_then(Value::as_str)
}

pub fn id(obj: &Map<String, Value>) -> Option<u64> {
    obj.get("ipc:id").and_then(Value::as_u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepared_object_round_trips_through_validate() {
        let obj = prepare("status", 7, false);
        assert!(validate(&obj));
        assert!(!is_reply(&obj));
        assert_eq!(method(&obj), Some("status"));
        assert_eq!(id(&obj), Some(7));
    }

    #[test]
    fn missing_header_field_is_invalid() {
        let mut obj = prepare("kill", 1, true);
        obj.remove("ipc:version");
        assert!(!validate(&obj));
    }

    #[test]
    fn wrong_typed_header_field_is_invalid() {
        let mut obj = prepare("kill", 1, true);
        obj.insert("ipc:id".into(), Value::from("not a number"));
        assert!(!validate(&obj));
    }

    #[test]
    fn object_with_no_reply_field_is_not_a_reply() {
        let obj = Map::new();
        assert!(!is_reply(&obj));
    }
}
