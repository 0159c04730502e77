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

//! A small INI-file reader.
//!
//! This isn't consumed by the supervisor's own startup path (that's all command-line flags); it's
//! a standalone utility for services that want a structured config file of their own, and for the
//! `dump-inifile` debugging tool. Sections may repeat keys; later assignments are appended, not
//! overwritten, and a value that looks like a plain decimal number is stored as one.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IniValue {
    Number(u64),
    Str(String),
}

pub type Section = Vec<(String, IniValue)>;
pub type IniFile = HashMap<String, Section>;

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Parses the INI file at `path`. Lines beginning with `#` are comments (but only outside a
/// section header); lines before the first `[section]` header are ignored, matching the
/// original parser's behavior of discarding anything before the first section is opened.
pub fn parse(path: &Path) -> io::Result<IniFile> {
    let contents = fs::read_to_string(path)?;
    Ok(parse_str(&contents))
}

pub fn parse_str(contents: &str) -> IniFile {
    let mut out = IniFile::new();
    let mut section_name: Option<String> = None;
    let mut section: Section = Vec::new();

    for raw_line in contents.lines() {
        let line = raw_line.trim_end_matches('\r');

        if let Some(rest) = line.strip_prefix('[') {
            if let Some(end) = rest.find(']') {
                if let Some(name) = section_name.take() {
                    out.entry(name).or_insert_with(Vec::new).extend(section.drain(..));
                }
                section_name = Some(rest[..end].to_string());
                continue;
            }
        }

        if line.starts_with('#') || section_name.is_none() {
            continue;
        }

        if let Some(eq) = line.find('=') {
            let key = line[..eq].to_string();
            let value = &line[eq + 1..];
            let parsed = if is_numeric(value) {
                IniValue::Number(value.parse().unwrap_or(0))
            } else {
                IniValue::Str(value.to_string())
            };
            section.push((key, parsed));
        }
    }

    if let Some(name) = section_name {
        out.entry(name).or_insert_with(Vec::new).extend(section);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_and_coerces_numbers() {
        let ini = parse_str(
            "[service]\nname=worker\nport=9000\n[other]\nname=0day\n",
        );
        assert_eq!(
            ini.get("service").unwrap(),
            &vec![
                ("name".to_string(), IniValue::Str("worker".to_string())),
                ("port".to_string(), IniValue::Number(9000)),
            ]
        );
        // "0day" is not purely numeric, so it stays a string -- same rule as uid/gid resolution.
        assert_eq!(
            ini.get("other").unwrap(),
            &vec![("name".to_string(), IniValue::Str("0day".to_string()))]
        );
    }

    #[test]
    fn repeated_keys_in_a_section_are_kept_not_overwritten() {
        let ini = parse_str("[env]\nPATH=/bin\nPATH=/usr/bin\n");
        assert_eq!(ini.get("env").unwrap().len(), 2);
    }

    #[test]
    fn lines_before_first_section_are_ignored() {
        let ini = parse_str("stray=value\n[a]\nk=v\n");
        assert_eq!(ini.len(), 1);
        assert!(ini.contains_key("a"));
    }

    #[test]
    fn comment_lines_are_skipped() {
        let ini = parse_str("[a]\n# a comment\nk=v\n");
        assert_eq!(ini.get("a").unwrap(), &vec![("k".to_string(), IniValue::Str("v".to_string()))]);
    }
}
