//! JSON-lines decoding for streamed default responses.
//!
//! Both forms are single-pass and lazy: nothing is read before the first
//! element is requested. Blank lines are skipped.

use std::io::BufRead;

use futures_util::{Stream, StreamExt, stream};
use serde_json::Value;

use crate::error::CallError;

/// Blocking iterator over the JSON values of a line-delimited body.
#[derive(Debug)]
pub struct JsonLines<R> {
    reader: R,
    line: String,
    done: bool,
}

impl<R: BufRead> JsonLines<R> {
    /// Decode lines from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for JsonLines<R> {
    type Item = Result<Value, CallError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    if let Some(item) = parse_line(self.line.as_bytes()) {
                        return Some(item);
                    }
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err.into()));
                }
            }
        }
        None
    }
}

/// Async stream over the JSON values of a line-delimited byte stream.
pub fn json_lines<S, B, E>(bytes: S) -> impl Stream<Item = Result<Value, CallError>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<CallError>,
{
    stream::unfold(
        (bytes, Vec::new(), false),
        |(mut bytes, mut buffer, mut done)| async move {
            loop {
                if let Some(end) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=end).collect();
                    if let Some(item) = parse_line(&line) {
                        return Some((item, (bytes, buffer, done)));
                    }
                    continue;
                }
                if done {
                    let rest = std::mem::take(&mut buffer);
                    return parse_line(&rest).map(|item| (item, (bytes, buffer, done)));
                }
                match bytes.next().await {
                    Some(Ok(chunk)) => buffer.extend_from_slice(chunk.as_ref()),
                    Some(Err(err)) => {
                        buffer.clear();
                        return Some((Err(err.into()), (bytes, buffer, true)));
                    }
                    None => done = true,
                }
            }
        },
    )
}

fn parse_line(line: &[u8]) -> Option<Result<Value, CallError>> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }
    Some(serde_json::from_slice(line).map_err(CallError::from))
}
