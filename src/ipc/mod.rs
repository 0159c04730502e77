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

//! The manager-facing control protocol: decode one framed object, validate its header, look up
//! its method in [`methods::DISPATCH_TABLE`] by binary search, run the handler, and send back
//! whatever it produced.

pub mod codec;
pub mod methods;
pub mod object;

use crate::child::ChildProc;
use crate::error::IpcError;
use serde_json::{Map, Value};
use std::io::{Read, Write};

#[derive(Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Ok,
    Invalid,
    IsReply,
    MethodNotFound(String),
}

/// Validates and routes `req`, running the matched handler if any. Does not itself perform I/O;
/// callers combine this with [`codec::recv`]/[`codec::send`].
pub fn dispatch(child: &mut ChildProc, req: &Map<String, Value>) -> (DispatchOutcome, Option<Map<String, Value>>) {
    if !object::validate(req) {
        return (DispatchOutcome::Invalid, None);
    }

    if object::is_reply(req) {
        return (DispatchOutcome::IsReply, None);
    }

    let method = match object::method(req) {
        Some(m) => m,
        None => return (DispatchOutcome::Invalid, None),
    };

    match methods::DISPATCH_TABLE.binary_search_by(|(name, _)| (*name).cmp(method)) {
        Ok(idx) => {
            let (_, handler) = methods::DISPATCH_TABLE[idx];
            (DispatchOutcome::Ok, Some(handler(child, req)))
        }
        Err(_) => (DispatchOutcome::MethodNotFound(method.to_string()), None),
    }
}

fn error_reply(outcome: &DispatchOutcome, req: &Map<String, Value>) -> Map<String, Value> {
    let mut reply = object::prepare("error", object::id(req).unwrap_or(0), true);
    let tag = match outcome {
        DispatchOutcome::Invalid => "INVALID",
        DispatchOutcome::IsReply => "IS_REPLY",
        DispatchOutcome::MethodNotFound(_) => "METHOD_NOT_FOUND",
        DispatchOutcome::Ok => unreachable!(),
    };
    reply.insert("success".into(), Value::from(false));
    reply.insert("error".into(), Value::from(tag));
    reply
}

/// Handles exactly one request/reply cycle on `stream`. On a decode failure, the descriptor is
/// expected to be dropped from the poll watch set by the caller *and* closed -- both must
/// happen, not just the former, so a malformed peer can't keep a half-open fd lingering.
pub fn handle_one<S: Read + Write>(stream: &mut S, child: &mut ChildProc) -> Result<(), IpcError> {
    let req = codec::recv(&mut *stream)?;

    let (outcome, reply) = dispatch(child, &req);
    match outcome {
        DispatchOutcome::Ok => {
            if let Some(reply) = reply {
                codec::send(&mut *stream, &reply)?;
            }
            Ok(())
        }
        DispatchOutcome::IsReply => Ok(()),
        other => {
            codec::send(&mut *stream, &error_reply(&other, &req))?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::child::{ChildConfig, ChildProc};
    use nix::unistd::{Gid, Uid};

    fn test_child() -> ChildProc {
        ChildProc::new(ChildConfig {
            prog_name: "/bin/true".into(),
            prog_argv: vec!["/bin/true".into()],
            dir_chroot: None,
            dir_chdir: None,
            child_uid: None::<Uid>,
            child_gid: None::<Gid>,
            stdin_fd: 0,
            stdout_fd: 1,
            stderr_fd: 2,
            respawn_delay: 0,
            respawn_max: 0,
            respawn_period: 0,
            kill_delay: 3,
        })
    }

    #[test]
    fn status_request_dispatches_to_ok() {
        let mut child = test_child();
        let req = object::prepare("status", 1, false);
        let (outcome, reply) = dispatch(&mut child, &req);
        assert_eq!(outcome, DispatchOutcome::Ok);
        let reply = reply.unwrap();
        assert_eq!(reply.get("prog_name").unwrap(), "/bin/true");
    }

    #[test]
    fn unknown_method_is_reported_not_silently_dropped() {
        let mut child = test_child();
        let req = object::prepare("frobnicate", 1, false);
        let (outcome, _) = dispatch(&mut child, &req);
        assert_eq!(outcome, DispatchOutcome::MethodNotFound("frobnicate".to_string()));
    }

    #[test]
    fn a_reply_object_is_never_redispatched() {
        let mut child = test_child();
        let req = object::prepare("status", 1, true);
        let (outcome, reply) = dispatch(&mut child, &req);
        assert_eq!(outcome, DispatchOutcome::IsReply);
        assert!(reply.is_none());
    }

    #[test]
    fn invalid_object_missing_header_is_rejected() {
        let mut child = test_child();
        let req = Map::new();
        let (outcome, _) = dispatch(&mut child, &req);
        assert_eq!(outcome, DispatchOutcome::Invalid);
    }
}
