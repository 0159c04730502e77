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

//! The supervised child process: its static configuration, its live state machine, and the
//! start/kill/monitor operations the supervisor loop drives it with.

mod controller;
mod state;

pub use state::ChildProcState;

use nix::unistd::{Gid, Pid, Uid};
use std::os::unix::io::RawFd;

/// Configuration fixed for the lifetime of the supervisor: the program to run and how to run it.
#[derive(Clone, Debug)]
pub struct ChildConfig {
    pub prog_name: String,
    pub prog_argv: Vec<String>,

    pub dir_chroot: Option<String>,
    pub dir_chdir: Option<String>,

    pub child_uid: Option<Uid>,
    pub child_gid: Option<Gid>,

    pub stdin_fd: RawFd,
    pub stdout_fd: RawFd,
    pub stderr_fd: RawFd,

    pub respawn_delay: u64,
    pub respawn_max: u32,
    pub respawn_period: u64,

    pub kill_delay: u64,
}

/// Live state of the supervised child, mutated only by the supervisor loop.
pub struct ChildProc {
    pub config: ChildConfig,

    pub child_pid: Option<Pid>,
    pub state: ChildProcState,
    pub restart_count: u32,
    pub respawn_last: i64,
}

impl ChildProc {
    pub fn new(config: ChildConfig) -> ChildProc {
        ChildProc {
            config,
            child_pid: None,
            state: ChildProcState::Initial,
            restart_count: 0,
            respawn_last: 0,
        }
    }

    pub fn set_state(&mut self, state: ChildProcState) {
        self.state = state;
    }

    /// Whether the supervisor is in the process of shutting this child down for good. Derived
    /// from the state machine rather than tracked as a separate flag, so the two can never
    /// disagree with each other.
    pub fn exiting(&self) -> bool {
        matches!(self.state, ChildProcState::Stopping | ChildProcState::Down)
    }

    pub fn start(&mut self) {
        controller::start(self)
    }

    pub fn kill(&mut self, should_wait: bool) -> bool {
        controller::kill(self, should_wait)
    }

    pub fn monitor(&mut self) -> bool {
        controller::monitor(self)
    }
}
