// ABOUTME: Record-at-a-time decoding of progress streams.
// ABOUTME: Byte-level JSON framing plus the build and push/pull consumers.

use super::error::ProgressError;
use super::record::ProgressRecord;
use super::ProgressStream;
use crate::types::ImageId;
use futures::{Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Prefix of the classic builder's final line on success.
pub const BUILD_SUCCESS_MARKER: &str = "Successfully built ";

const READ_CHUNK: usize = 8 * 1024;

/// Decode consecutive JSON objects from a raw byte stream.
///
/// This is the entry point for a raw response body. Streams already framed
/// by bollard are mapped record by record in the daemon module and skip it.
/// Objects may be newline separated or simply concatenated. Bytes are read
/// in small chunks and each record is yielded as soon as it is complete; the
/// stream is never buffered whole and every byte is scanned once.
pub fn records_from_reader<R>(reader: R) -> ProgressStream
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let state = (reader, Vec::<u8>::new(), Framer::default());
    Box::pin(futures::stream::try_unfold(
        state,
        |(mut reader, mut buf, mut framer)| async move {
            loop {
                if let Some(record) = take_record(&mut buf, &mut framer)? {
                    return Ok(Some((record, (reader, buf, framer))));
                }

                let mut chunk = vec![0u8; READ_CHUNK];
                let n = reader.read(&mut chunk).await?;
                if n == 0 {
                    if buf.iter().all(u8::is_ascii_whitespace) {
                        return Ok(None);
                    }
                    return Err(ProgressError::Truncated);
                }
                buf.extend_from_slice(&chunk[..n]);
            }
        },
    ))
}

/// Where the first top-level value in the buffer ends, as far as known.
#[derive(Debug, PartialEq, Eq)]
enum Frame {
    /// The value occupies this many leading bytes.
    Complete(usize),
    /// More bytes are needed.
    Pending,
    /// The buffer does not start with an object or array.
    Invalid,
}

/// Tracks nesting across reads so each byte is looked at once.
#[derive(Debug, Default)]
struct Framer {
    scanned: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl Framer {
    fn advance(&mut self, buf: &[u8]) -> Frame {
        while let Some(&byte) = buf.get(self.scanned) {
            self.scanned += 1;

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                continue;
            }

            match byte {
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' if self.depth > 0 => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        return Frame::Complete(self.scanned);
                    }
                }
                b'"' if self.depth > 0 => self.in_string = true,
                _ if byte.is_ascii_whitespace() => {}
                _ if self.depth == 0 => return Frame::Invalid,
                _ => {}
            }
        }
        Frame::Pending
    }
}

/// Pop the first complete record off the front of `buf`.
fn take_record(
    buf: &mut Vec<u8>,
    framer: &mut Framer,
) -> Result<Option<ProgressRecord>, ProgressError> {
    match framer.advance(buf) {
        Frame::Pending => Ok(None),
        Frame::Complete(len) => {
            let record = serde_json::from_slice(&buf[..len])?;
            buf.drain(..len);
            *framer = Framer::default();
            Ok(Some(record))
        }
        // Let serde_json name the problem; a scalar may still be incomplete.
        Frame::Invalid => match serde_json::from_slice::<ProgressRecord>(buf) {
            Ok(record) => {
                buf.clear();
                *framer = Framer::default();
                Ok(Some(record))
            }
            Err(e) if e.is_eof() => {
                *framer = Framer::default();
                Ok(None)
            }
            Err(e) => Err(e.into()),
        },
    }
}

/// Consume a push or pull stream.
///
/// Every record is handed to `observer`. The first record carrying an error
/// ends decoding with [`ProgressError::Remote`]; nothing after it is read.
pub async fn decode_progress<S, F>(mut records: S, mut observer: F) -> Result<(), ProgressError>
where
    S: Stream<Item = Result<ProgressRecord, ProgressError>> + Unpin,
    F: FnMut(&ProgressRecord),
{
    while let Some(record) = records.next().await {
        let record = record?;
        if let Some(message) = record.error_message() {
            return Err(ProgressError::Remote(message.to_string()));
        }
        observer(&record);
    }
    Ok(())
}

/// Consume a build stream and return the built image id.
///
/// The id comes from the first `Successfully built <id>` line, at which point
/// decoding stops. Builders that never print that line announce the id in an
/// `aux` record instead; the last one seen is returned at end of stream.
/// `Ok(None)` means the stream ended cleanly without naming an image.
pub async fn decode_build<S, F>(
    mut records: S,
    mut observer: F,
) -> Result<Option<ImageId>, ProgressError>
where
    S: Stream<Item = Result<ProgressRecord, ProgressError>> + Unpin,
    F: FnMut(&ProgressRecord),
{
    let mut aux_id = None;

    while let Some(record) = records.next().await {
        let record = record?;
        if let Some(message) = record.error_message() {
            return Err(ProgressError::Remote(message.to_string()));
        }
        observer(&record);

        if let Some(id) = record
            .stream
            .as_deref()
            .and_then(|text| text.strip_prefix(BUILD_SUCCESS_MARKER))
            .map(str::trim)
            .filter(|id| !id.is_empty())
        {
            return Ok(Some(ImageId::new(id)));
        }

        if let Some(id) = record.aux_id() {
            aux_id = Some(ImageId::new(id));
        }
    }

    Ok(aux_id)
}
