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

//! Drives the built `supervise` binary end to end against `/bin/true`, `/bin/false`, and
//! `/bin/sh`, the way `tests/test.rs` in the daemonization crate this was grounded on drives its
//! own binary with `std::process::Command`.

use anyhow::{anyhow, Context, Result};
use nix::fcntl::{fcntl, FcntlArg, FdFlag};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::io::{Read, Write};
use std::os::unix::io::AsRawFd;
use std::os::unix::net::UnixStream;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

enum Completion<T> {
    Incomplete,
    Complete(T),
}
use Completion::*;

fn wait_until<T, F>(mut condition: F) -> Result<T>
where
    F: FnMut() -> Completion<T>,
{
    for i in 0..12 {
        if let Complete(result) = condition() {
            return Ok(result);
        }
        let ms = match i {
            0 => 10,
            1 => 100,
            _ => 500,
        };
        std::thread::sleep(Duration::from_millis(ms));
    }
    Err(anyhow!("wait_until timed out"))
}

fn supervise_command() -> Result<Command> {
    let bin_dir = std::env::current_dir()?.join("target/debug");
    Ok(Command::new(bin_dir.join("supervise")))
}

struct Supervised {
    child: Child,
}

impl Drop for Supervised {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn stderr_contains(child: &mut Child, needle: &str) -> Result<bool> {
    let mut buf = String::new();
    if let Some(stderr) = child.stderr.as_mut() {
        stderr.read_to_string(&mut buf).ok();
    }
    Ok(buf.contains(needle))
}

#[test]
fn respawns_a_child_that_exits_immediately() -> Result<()> {
    let mut cmd = supervise_command()?;
    let mut child = cmd
        .args(["--respawn-delay=0", "--", "/bin/true"])
        .stderr(Stdio::piped())
        .spawn()
        .context("spawning supervise")?;

    std::thread::sleep(Duration::from_millis(300));
    // The supervisor itself should still be running: /bin/true exiting should never bring it
    // down on its own, only an explicit kill or respawn-max exhaustion does that.
    assert!(child.try_wait()?.is_none(), "supervisor exited on its own");

    child.kill()?;
    child.wait()?;
    Ok(())
}

#[test]
fn gives_up_after_respawn_max_is_exceeded() -> Result<()> {
    let mut cmd = supervise_command()?;
    let child = cmd
        .args(["--respawn-max=3", "--", "/bin/false"])
        .stderr(Stdio::piped())
        .spawn()
        .context("spawning supervise")?;
    let mut supervised = Supervised { child };

    let status = wait_until(|| match supervised.child.try_wait() {
        Ok(Some(status)) => Complete(status),
        Ok(None) => Incomplete,
        Err(_) => Incomplete,
    })?;

    assert!(status.success(), "supervisor should exit 0 once it gives up respawning");
    assert!(stderr_contains(&mut supervised.child, "restarted too many times, giving up")?);
    Ok(())
}

#[test]
fn sigterm_brings_down_the_child_and_the_supervisor() -> Result<()> {
    let mut cmd = supervise_command()?;
    let child = cmd
        .args(["--", "/bin/sh", "-c", "trap '' TERM; sleep 30"])
        .spawn()
        .context("spawning supervise")?;
    let mut supervised = Supervised { child };

    std::thread::sleep(Duration::from_millis(200));

    signal::kill(Pid::from_raw(supervised.child.id() as i32), Signal::SIGTERM)
        .context("sending SIGTERM to supervisor")?;

    let status = wait_until(|| match supervised.child.try_wait() {
        Ok(Some(status)) => Complete(status),
        Ok(None) => Incomplete,
        Err(_) => Incomplete,
    })?;

    assert!(status.success(), "supervisor should exit 0 after a clean shutdown");
    Ok(())
}

#[test]
fn manager_status_request_reports_the_running_child() -> Result<()> {
    let (manager_side, child_side) = UnixStream::pair().context("socketpair")?;

    let mut cmd = supervise_command()?;
    let fd = child_side.as_raw_fd();
    unsafe {
        cmd.pre_exec(move || {
            let flags = FdFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFD).unwrap_or(0));
            let _ = fcntl(fd, FcntlArg::F_SETFD(flags & !FdFlag::FD_CLOEXEC));
            Ok(())
        });
    }
    cmd.args([
        "--manager-fd",
        &fd.to_string(),
        "--",
        "/bin/sh",
        "-c",
        "sleep 30",
    ]);
    let mut supervised = Supervised {
        child: cmd.spawn().context("spawning supervise")?,
    };
    drop(child_side);

    std::thread::sleep(Duration::from_millis(200));

    let request = serde_json::json!({
        "ipc:version": 1,
        "ipc:id": 7,
        "ipc:method": "status",
        "ipc:reply": false,
    });
    let body = serde_json::to_vec(&request)?;
    let len = (body.len() as u32).to_le_bytes();

    let mut manager = manager_side;
    manager.write_all(&len)?;
    manager.write_all(&body)?;

    let mut len_buf = [0u8; 4];
    manager.read_exact(&mut len_buf)?;
    let reply_len = u32::from_le_bytes(len_buf) as usize;
    let mut reply_buf = vec![0u8; reply_len];
    manager.read_exact(&mut reply_buf)?;
    let reply: serde_json::Value = serde_json::from_slice(&reply_buf)?;

    assert_eq!(reply["ipc:id"], 7);
    assert_eq!(reply["ipc:reply"], true);
    assert_eq!(reply["prog_name"], "/bin/sh");

    supervised.child.kill()?;
    supervised.child.wait()?;
    Ok(())
}
