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

/// Lifecycle of the supervised child.
///
/// `Starting` -> `Up` happens once per fork, right before the supervisor re-enters `poll()`.
/// `Up` and `Ready` are both "running normally"; nothing in this crate currently promotes a
/// child from `Up` to `Ready` on its own, but the state exists so that an IPC method could mark
/// the child ready once it's done its own startup work, without conflating that with "running".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildProcState {
    Initial,
    Starting,
    Up,
    Ready,
    Crashed,
    Stopping,
    Down,
}
