//! Incremental server-sent-events decoder.
//!
//! Collects consecutive `data:` lines until a blank line, then yields the
//! joined payload. Works on raw bytes so a UTF-8 character split across
//! network chunks is reassembled before decoding.

#[derive(Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data_acc: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk; returns every payload completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let mut line = String::from_utf8_lossy(&raw[..raw.len() - 1]).into_owned();
            if line.ends_with('\r') {
                line.pop();
            }

            if line.is_empty() {
                if let Some(data) = self.data_acc.take() {
                    events.push(data);
                }
                continue;
            }

            if let Some(rest) = line.strip_prefix("data:") {
                let fragment = rest.strip_prefix(' ').unwrap_or(rest);
                match &mut self.data_acc {
                    Some(existing) => {
                        existing.push('\n');
                        existing.push_str(fragment);
                    }
                    None => self.data_acc = Some(fragment.to_string()),
                }
            }
            // event:, id:, retry: and comments carry nothing we use
        }

        events
    }

    /// Flush a trailing payload when the body ends without a blank line.
    pub fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let mut tail = self.feed(&rest);
            tail.extend(self.feed(b"\n"));
            if let Some(last) = tail.pop() {
                return Some(last);
            }
        }
        self.data_acc.take()
    }
}
