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

//! Resolving usernames and group names to numeric ids.
//!
//! It's imperative to check the name database before falling back to treating the string as a
//! literal numeric id, and to validate that the string really is all digits before accepting it as
//! one. Otherwise a name like `0day` would resolve to uid 0, which is exactly the kind of
//! surprise that bit systemd once: <https://github.com/systemd/systemd/issues/6309>.

use nix::unistd::{Gid, Group, Uid, User};

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Resolves `name` to a uid. Tries the user database first, then falls back to parsing `name`
/// as a plain decimal number. Returns `None` if neither succeeds.
pub fn resolve_uid(name: &str) -> Option<Uid> {
    if let Ok(Some(user)) = User::from_name(name) {
        return Some(user.uid);
    }

    if is_all_digits(name) {
        return name.parse::<u32>().ok().map(Uid::from_raw);
    }

    None
}

/// Resolves `name` to a gid. Same policy as [`resolve_uid`].
pub fn resolve_gid(name: &str) -> Option<Gid> {
    if let Ok(Some(group)) = Group::from_name(name) {
        return Some(group.gid);
    }

    if is_all_digits(name) {
        return name.parse::<u32>().ok().map(Gid::from_raw);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_resolves_by_name() {
        assert_eq!(resolve_uid("root"), Some(Uid::from_raw(0)));
    }

    #[test]
    fn numeric_string_resolves_when_not_a_known_name() {
        assert_eq!(resolve_uid("1234567"), Some(Uid::from_raw(1234567)));
    }

    #[test]
    fn digit_lookalike_name_does_not_resolve_to_its_numeric_value() {
        // "0day" is not a valid user on any system and must not silently resolve via
        // the numeric fallback, since it is not actually all digits.
        assert_eq!(resolve_uid("0day"), None);
    }

    #[test]
    fn empty_string_does_not_resolve() {
        assert_eq!(resolve_uid(""), None);
        assert_eq!(resolve_gid(""), None);
    }
}
