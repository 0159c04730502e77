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

//! Debugging aid: parses an INI file with [`supervise::inifile`] and prints what it found.

use anyhow::{Context, Result};
use clap::Parser;
use supervise::inifile::{self, IniValue};

#[derive(Parser, Debug)]
#[clap(name = "dump-inifile", version, about = "dump the parsed contents of an INI file")]
struct Args {
    /// Path to the INI file to parse
    path: std::path::PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let parsed = inifile::parse(&args.path)
        .with_context(|| format!("{}: could not parse", args.path.display()))?;

    let mut sections: Vec<&String> = parsed.keys().collect();
    sections.sort();

    for section in sections {
        println!("[{section}]");
        for (key, value) in &parsed[section] {
            match value {
                IniValue::Number(n) => println!("{key}={n}"),
                IniValue::Str(s) => println!("{key}={s}"),
            }
        }
    }

    Ok(())
}
