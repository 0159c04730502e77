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

//! Wire framing for IPC objects: a 4-byte little-endian length prefix followed by the object's
//! JSON encoding. The prefix exists so a reader never has to guess where one JSON value ends and
//! the next begins on a stream socket.

use crate::error::IpcError;
use serde_json::{Map, Value};
use std::io::{Read, Write};

const MAX_FRAME: u32 = 1 << 20;

pub fn send(mut w: impl Write, obj: &Map<String, Value>) -> Result<(), IpcError> {
    let body = serde_json::to_vec(obj)?;
    let len = u32::try_from(body.len()).map_err(|_| IpcError::Invalid)?;
    w.write_all(&len.to_le_bytes())?;
    w.write_all(&body)?;
    Ok(())
}

/// Reads one framed object. A clean EOF on the length prefix is reported as
/// [`IpcError::Disconnected`]; any other short read or malformed frame is [`IpcError::Invalid`].
pub fn recv(mut r: impl Read) -> Result<Map<String, Value>, IpcError> {
    let mut len_buf = [0u8; 4];
    match r.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(IpcError::Disconnected)
        }
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf);
    if len > MAX_FRAME {
        return Err(IpcError::Invalid);
    }

    let mut body = vec![0u8; len as usize];
    r.read_exact(&mut body)?;

    let value: Value = serde_json::from_slice(&body)?;
    match value {
        Value::Object(obj) => Ok(obj),
        _ => Err(IpcError::Invalid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::object;

    #[test]
    fn round_trips_a_prepared_object_over_a_byte_buffer() {
        let obj = object::prepare("status", 42, false);
        let mut buf = Vec::new();
        send(&mut buf, &obj).unwrap();

        let decoded = recv(&buf[..]).unwrap();
        assert_eq!(decoded, obj);
    }

    #[test]
    fn empty_stream_is_a_disconnect_not_an_error() {
        let buf: Vec<u8> = Vec::new();
        match recv(&buf[..]) {
            Err(IpcError::Disconnected) => {}
            other => panic!("expected Disconnected, got {:?}", other),
        }
    }

    #[test]
    fn truncated_frame_is_invalid() {
        let obj = object::prepare("status", 1, false);
        let mut buf = Vec::new();
        send(&mut buf, &obj).unwrap();
        buf.truncate(buf.len() - 1);
        assert!(matches!(recv(&buf[..]), Err(IpcError::Io(_))));
    }
}
