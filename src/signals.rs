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

//! Process-wide signal gate.
//!
//! The supervisor never runs a signal handler in the traditional sense: it blocks `SIGCHLD`,
//! `SIGTERM` and `SIGQUIT` for the lifetime of the process and instead reads them off a
//! `signalfd`, multiplexed into the same `poll()` loop as the manager descriptor. This keeps the
//! entire program single-threaded and avoids the reentrancy hazards of async-signal-safe handlers.
//! A freshly forked child must call [`SignalGate::unblock`] before it execs, so that the program
//! it becomes isn't left with its parent's signals blocked.

use nix::sys::signal::{self, SigSet, Signal};
use nix::sys::signalfd::SignalFd;

pub struct SignalGate {
    fd: SignalFd,
}

impl SignalGate {
    /// Blocks `SIGCHLD`, `SIGTERM`, and `SIGQUIT` process-wide and returns a `signalfd` that
    /// becomes readable when one of them is pending. Aborts the process if the signal mask
    /// cannot be updated -- there is no sane way to keep running without that guarantee.
    pub fn block() -> SignalGate {
        let mut mask = SigSet::empty();
        mask.add(Signal::SIGCHLD);
        mask.add(Signal::SIGTERM);
        mask.add(Signal::SIGQUIT);

        if mask.thread_block().is_err() {
            std::process::abort();
        }

        let fd = match SignalFd::with_flags(&mask, nix::sys::signalfd::SfdFlags::SFD_CLOEXEC) {
            Ok(fd) => fd,
            Err(_) => std::process::abort(),
        };

        SignalGate { fd }
    }

    /// Restores the empty signal mask. Called in the child immediately after `fork()`, before
    /// `exec()`, so that the supervised program starts with no signals blocked.
    pub fn unblock() {
        if SigSet::empty().thread_set_mask().is_err() {
            std::process::abort();
        }
    }

    pub fn as_raw_fd(&self) -> std::os::unix::io::RawFd {
        use std::os::unix::io::AsRawFd;
        self.fd.as_raw_fd()
    }

    /// Reads one pending signal off the signalfd. A short read is fatal: it means the descriptor
    /// returned readable but didn't actually contain a full `signalfd_siginfo`, which should be
    /// impossible and indicates something has gone badly wrong with the process's signal state.
    pub fn read_signal(&mut self) -> Signal {
        match self.fd.read_signal() {
            Ok(Some(info)) => Signal::try_from(info.ssi_signo as i32).unwrap_or(Signal::SIGCHLD),
            Ok(None) | Err(_) => std::process::abort(),
        }
    }
}
