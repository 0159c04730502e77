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

//! A single-process service supervisor.
//!
//! This crate spawns one designated child program, watches it with `waitpid` via a `signalfd`
//! multiplexed into a single `poll()` loop, and restarts it according to a configurable respawn
//! policy when it exits unexpectedly. An optional pre-opened descriptor, the "manager fd", lets a
//! parent process drive the supervisor with a small set of structured control commands
//! (`kill`, `restart`, `status`) without needing a separate IPC mechanism of its own.
//!
//! There is no threading here by design: `SIGCHLD`, `SIGTERM`, and `SIGQUIT` are blocked process
//! wide and delivered through [`signals::SignalGate`]'s `signalfd`, so the entire program is one
//! cooperative event loop (see [`supervisor::Supervisor::run`]).
//!
//! Two small standalone utilities ship alongside the core: [`credentials`] resolves usernames and
//! group names to numeric ids, and [`inifile`] parses a basic INI file format. Neither is on the
//! supervisor's own startup path -- they exist for services that want them, and for the
//! `dump-inifile` binary.

pub mod child;
pub mod cli;
pub mod credentials;
pub mod error;
pub mod inifile;
pub mod ipc;
pub mod signals;
pub mod supervisor;
