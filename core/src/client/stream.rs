/// Upper bound on buffered bytes while waiting for a complete part.
const MAX_BUFFER: usize = 16 * 1024 * 1024;

const DEFAULT_BOUNDARY: &str = "frame";

/// Incremental splitter for `multipart/x-mixed-replace` image streams.
///
/// Bytes are pushed as they arrive; each complete part body is returned once
/// its end is known, either from a `Content-Length` header or from the next
/// boundary line.
#[derive(Debug, Clone)]
pub struct MjpegReader {
    delimiter: Vec<u8>,
    buffer: Vec<u8>,
}

impl MjpegReader {
    pub fn new(boundary: &str) -> Self {
        let boundary = boundary.trim_start_matches("--");
        let mut delimiter = b"--".to_vec();
        delimiter.extend_from_slice(boundary.as_bytes());
        Self {
            delimiter,
            buffer: Vec::new(),
        }
    }

    /// Builds a reader from a response `Content-Type`, falling back to the
    /// `frame` boundary when none is declared.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let boundary = content_type
            .into_iter()
            .flat_map(|value| value.split(';'))
            .filter_map(|param| param.trim().strip_prefix("boundary="))
            .map(|value| value.trim_matches('"'))
            .find(|value| !value.is_empty())
            .unwrap_or(DEFAULT_BOUNDARY);
        Self::new(boundary)
    }

    /// Feeds a chunk and returns every part body completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(frame) = self.next_part() {
            frames.push(frame);
        }
        if self.buffer.len() > MAX_BUFFER {
            log::warn!("discarding {} buffered stream bytes", self.buffer.len());
            self.buffer.clear();
        }
        frames
    }

    fn next_part(&mut self) -> Option<Vec<u8>> {
        let start = find(&self.buffer, &self.delimiter)?;
        let header_start = start + self.delimiter.len();
        let header_len = find(&self.buffer[header_start..], b"\r\n\r\n")?;
        let body_start = header_start + header_len + 4;
        let declared = content_length(&String::from_utf8_lossy(
            &self.buffer[header_start..header_start + header_len],
        ));

        let body_end = match declared {
            Some(len) if self.buffer.len() >= body_start + len => body_start + len,
            Some(_) => return None,
            None => {
                let mut end = body_start + find(&self.buffer[body_start..], &self.delimiter)?;
                if end >= body_start + 2 && &self.buffer[end - 2..end] == b"\r\n" {
                    end -= 2;
                }
                end
            }
        };

        let frame = self.buffer[body_start..body_end].to_vec();
        self.buffer.drain(..body_end);
        Some(frame)
    }
}

fn content_length(headers: &str) -> Option<usize> {
    headers.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
