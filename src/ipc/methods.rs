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

//! The `kill`, `restart`, and `status` IPC methods, and the sorted table that
//! [`super::dispatch`] binary-searches to find them.

use crate::child::{ChildProc, ChildProcState};
use crate::ipc::object;
use serde_json::{Map, Value};

pub type MethodFn = fn(&mut ChildProc, &Map<String, Value>) -> Map<String, Value>;

fn kill(child: &mut ChildProc, req: &Map<String, Value>) -> Map<String, Value> {
    let mut reply = object::prepare("kill", object::id(req).unwrap_or(0), true);

    child.kill(true);
    child.set_state(ChildProcState::Down);

    reply.insert("success".into(), Value::from(true));
    reply
}

fn restart(child: &mut ChildProc, req: &Map<String, Value>) -> Map<String, Value> {
    let mut reply = object::prepare("restart", object::id(req).unwrap_or(0), true);

    child.restart_count = 0;
    child.kill(true);
    child.start();

    reply.insert("success".into(), Value::from(true));
    reply.insert("pid".into(), Value::from(child.child_pid.map(|p| p.as_raw()).unwrap_or(-1)));
    reply
}

fn status(child: &mut ChildProc, req: &Map<String, Value>) -> Map<String, Value> {
    let mut reply = object::prepare("status", object::id(req).unwrap_or(0), true);
    let cfg = &child.config;

    reply.insert("prog_name".into(), Value::from(cfg.prog_name.clone()));

    if let Some(dir) = &cfg.dir_chroot {
        reply.insert("dir_chroot".into(), Value::from(dir.clone()));
    }
    if let Some(dir) = &cfg.dir_chdir {
        reply.insert("dir_chdir".into(), Value::from(dir.clone()));
    }

    reply.insert(
        "pid".into(),
        Value::from(child.child_pid.map(|p| p.as_raw()).unwrap_or(-1)),
    );
    reply.insert("uid".into(), Value::from(cfg.child_uid.map(|u| u.as_raw() as i64).unwrap_or(-1)));
    reply.insert("gid".into(), Value::from(cfg.child_gid.map(|g| g.as_raw() as i64).unwrap_or(-1)));

    reply.insert("restart_count".into(), Value::from(child.restart_count));

    reply.insert("respawn_delay".into(), Value::from(cfg.respawn_delay));
    reply.insert("respawn_max".into(), Value::from(cfg.respawn_max));
    reply.insert("respawn_period".into(), Value::from(cfg.respawn_period));
    reply.insert("respawn_last".into(), Value::from(child.respawn_last));

    reply
}

/// Method names must stay lexicographically sorted: [`super::dispatch`] finds them with a
/// binary search, exactly like the table it was modeled on.
pub const DISPATCH_TABLE: &[(&str, MethodFn)] = &[
    ("kill", kill as MethodFn),
    ("restart", restart as MethodFn),
    ("status", status as MethodFn),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_table_is_sorted() {
        let names: Vec<&str> = DISPATCH_TABLE.iter().map(|(name, _)| *name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }
}
