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

//! Error taxonomy.
//!
//! Errors here are split by the stage at which they occur, because each stage has a different
//! recovery policy. A [`ConfigError`] is fatal before the child ever forks. A [`ChildSetupError`]
//! happens after `fork()`, inside the child, and is only ever observed indirectly: the child logs
//! it and exits, and the parent sees an ordinary crash to which the respawn policy applies. An
//! [`IpcError`] is scoped to a single request and never affects the child.

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("no program given to supervise")]
    NoProgram,

    #[error("could not resolve user: {0}")]
    UnknownUser(String),

    #[error("could not resolve group: {0}")]
    UnknownGroup(String),

    #[error("{path}: redirection failed: {source}")]
    Redirect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid umask: {0}")]
    InvalidUmask(String),
}

/// Failures that can occur in the child between `fork()` and `exec()`. These are only ever
/// logged from inside the child; the parent never sees this type, only the child's exit status.
#[derive(thiserror::Error, Debug)]
pub enum ChildSetupError {
    #[error("failed to chroot to '{path}': {source}")]
    Chroot {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },

    #[error("failed to chdir to '{path}': {source}")]
    Chdir {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },

    #[error("failed to setgid to {gid}: {source}")]
    Setgid { gid: u32, source: nix::Error },

    #[error("failed to setuid to {uid}: {source}")]
    Setuid { uid: u32, source: nix::Error },

    #[error("failed to exec {prog}: {source}")]
    Exec { prog: String, source: nix::Error },
}

#[derive(thiserror::Error, Debug)]
pub enum IpcError {
    #[error("malformed ipc object")]
    Invalid,

    #[error("received a reply where a request was expected")]
    IsReply,

    #[error("unknown method: {0}")]
    MethodNotFound(String),

    #[error("manager disconnected")]
    Disconnected,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
}
