//! Streaming decoder: network chunks in, trade records out.
//!
//! The pipeline is push-based at every stage so that only a bounded amount
//! of data is buffered between pulls: whatever the gzip stage has
//! decompressed from the current chunk, plus at most one partial line.

use std::borrow::Cow;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::str::Utf8Error;

use csv::StringRecord;
use csv_core::ReadRecordResult;
use flate2::write::GzDecoder;
use tracing::{debug, trace};

use tradeledger_core::TradeRow;

use crate::error::{FeedError, Result};
use crate::source::ByteSource;

/// Content encoding of a byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Plain,
    Gzip,
}

/// Incremental gzip decompressor.
///
/// Accepts compressed input in arbitrary pieces, including pieces that end
/// inside the gzip header, and hands back whatever plain bytes are ready.
pub struct GzipStage {
    decoder: GzDecoder<Vec<u8>>,
}

impl GzipStage {
    pub fn new() -> Self {
        Self {
            decoder: GzDecoder::new(Vec::new()),
        }
    }

    /// Feed compressed bytes and take the plain bytes produced so far.
    pub fn push(&mut self, chunk: &[u8]) -> io::Result<Vec<u8>> {
        self.decoder.write_all(chunk)?;
        self.decoder.flush()?;
        Ok(std::mem::take(self.decoder.get_mut()))
    }

    /// End of input: verify the trailer and take the remaining plain bytes.
    ///
    /// Fails if the compressed stream was truncated.
    pub fn finish(&mut self) -> io::Result<Vec<u8>> {
        self.decoder.try_finish()?;
        Ok(std::mem::take(self.decoder.get_mut()))
    }
}

impl Default for GzipStage {
    fn default() -> Self {
        Self::new()
    }
}

/// Reassembles lines from byte chunks.
///
/// Lines end at `\n`; a `\r` right before it is dropped. The split happens
/// on bytes, before text decoding, so a multi-byte character cut by a chunk
/// boundary is rejoined intact.
#[derive(Debug, Default)]
pub struct LineAssembler {
    pending: Vec<u8>,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` and move every completed line onto `out`.
    pub fn push(&mut self, bytes: &[u8], out: &mut VecDeque<Vec<u8>>) {
        let mut rest = bytes;
        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            let mut line = std::mem::take(&mut self.pending);
            line.extend_from_slice(&rest[..pos]);
            strip_cr(&mut line);
            out.push_back(line);
            rest = &rest[pos + 1..];
        }
        self.pending.extend_from_slice(rest);
    }

    /// End of input: the unterminated final fragment, if any.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        let mut line = std::mem::take(&mut self.pending);
        strip_cr(&mut line);
        (!line.is_empty()).then_some(line)
    }

    /// Bytes held for the line in progress.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn strip_cr(line: &mut Vec<u8>) {
    if line.last() == Some(&b'\r') {
        line.pop();
    }
}

/// Splits one line into CSV fields.
///
/// One parser and its scratch buffers serve every line of a stream; only
/// the returned record is allocated per line.
#[derive(Debug)]
pub struct FieldSplitter {
    parser: csv_core::Reader,
    output: Vec<u8>,
    ends: Vec<usize>,
}

impl FieldSplitter {
    pub fn new() -> Self {
        Self {
            parser: csv_core::Reader::new(),
            output: vec![0; 256],
            ends: vec![0; 8],
        }
    }

    /// Fields of `line`, which holds no line terminator.
    pub fn split(&mut self, line: &[u8]) -> std::result::Result<StringRecord, Utf8Error> {
        self.parser.reset();
        let mut input = line;
        let (mut out_len, mut ends_len) = (0, 0);

        loop {
            let (result, read, written, ended) = self.parser.read_record(
                input,
                &mut self.output[out_len..],
                &mut self.ends[ends_len..],
            );
            input = &input[read..];
            out_len += written;
            ends_len += ended;

            match result {
                // The next call passes the empty remainder, which ends the record.
                ReadRecordResult::InputEmpty => {}
                ReadRecordResult::OutputFull => {
                    let len = self.output.len() * 2;
                    self.output.resize(len, 0);
                }
                ReadRecordResult::OutputEndsFull => {
                    let len = self.ends.len() * 2;
                    self.ends.resize(len, 0);
                }
                ReadRecordResult::Record | ReadRecordResult::End => break,
            }
        }

        let mut record = StringRecord::with_capacity(out_len, ends_len);
        let mut start = 0;
        for &end in &self.ends[..ends_len] {
            record.push_field(std::str::from_utf8(&self.output[start..end])?);
            start = end;
        }
        Ok(record)
    }
}

impl Default for FieldSplitter {
    fn default() -> Self {
        Self::new()
    }
}

/// A lazy, forward-only sequence of CSV records read from a [`ByteSource`].
///
/// Records come out one at a time as chunks arrive. The stream is fused:
/// after the end of data or the first error it keeps returning `Ok(None)`.
/// The source, and with it any network connection, is dropped as soon as
/// the data runs out, an error occurs, [`RecordStream::close`] is called,
/// or the stream itself is dropped.
pub struct RecordStream {
    label: String,
    source: Option<Box<dyn ByteSource>>,
    gzip: Option<GzipStage>,
    lines: LineAssembler,
    ready: VecDeque<Vec<u8>>,
    fields: FieldSplitter,
    line_no: u64,
}

impl RecordStream {
    pub fn new(label: impl Into<String>, source: Box<dyn ByteSource>, encoding: Encoding) -> Self {
        Self {
            label: label.into(),
            source: Some(source),
            gzip: match encoding {
                Encoding::Plain => None,
                Encoding::Gzip => Some(GzipStage::new()),
            },
            lines: LineAssembler::new(),
            ready: VecDeque::new(),
            fields: FieldSplitter::new(),
            line_no: 0,
        }
    }

    /// Next non-blank record as raw fields.
    pub async fn next_record(&mut self) -> Result<Option<StringRecord>> {
        loop {
            if let Some(line) = self.ready.pop_front() {
                self.line_no += 1;
                if line.is_empty() {
                    continue;
                }
                return self.tokenize(line).map(Some);
            }

            let Some(source) = self.source.as_mut() else {
                return Ok(None);
            };

            let next = source.next_chunk().await;
            match next {
                Ok(Some(chunk)) => {
                    trace!(stream = %self.label, len = chunk.len(), "chunk");
                    self.accept(&chunk)?;
                }
                Ok(None) => self.finish()?,
                Err(e) => {
                    self.close();
                    return Err(e);
                }
            }
        }
    }

    /// Next record converted to a [`TradeRow`].
    pub async fn next_trade(&mut self) -> Result<Option<TradeRow>> {
        let Some(record) = self.next_record().await? else {
            return Ok(None);
        };
        match TradeRow::from_fields(record.iter()) {
            Ok(row) => Ok(Some(row)),
            Err(e) => Err(self.fail(self.line_no, e.to_string())),
        }
    }

    /// Release the source now and discard anything buffered.
    pub fn close(&mut self) {
        if self.source.take().is_some() {
            debug!(stream = %self.label, line = self.line_no, "stream closed early");
        }
        self.gzip = None;
        self.lines = LineAssembler::new();
        self.ready.clear();
    }

    /// Whether the stream may still yield records.
    pub fn is_open(&self) -> bool {
        self.source.is_some() || !self.ready.is_empty()
    }

    /// Whether the underlying source is still held.
    pub fn holds_source(&self) -> bool {
        self.source.is_some()
    }

    /// Lines consumed so far, blank ones included.
    pub fn lines_read(&self) -> u64 {
        self.line_no
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn accept(&mut self, chunk: &[u8]) -> Result<()> {
        let decoded = self.gzip.as_mut().map(|gzip| gzip.push(chunk));
        let plain: Cow<'_, [u8]> = match decoded {
            None => Cow::Borrowed(chunk),
            Some(Ok(bytes)) => Cow::Owned(bytes),
            Some(Err(e)) => return Err(self.fail(self.line_no + 1, format!("gzip: {e}"))),
        };
        self.lines.push(&plain, &mut self.ready);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.source = None;

        let tail = match self.gzip.take().map(|mut gzip| gzip.finish()) {
            None => Vec::new(),
            Some(Ok(bytes)) => bytes,
            Some(Err(e)) => return Err(self.fail(self.line_no + 1, format!("gzip: {e}"))),
        };
        self.lines.push(&tail, &mut self.ready);
        if let Some(line) = self.lines.finish() {
            self.ready.push_back(line);
        }

        debug!(
            stream = %self.label,
            lines = self.line_no + self.ready.len() as u64,
            "stream exhausted"
        );
        Ok(())
    }

    fn tokenize(&mut self, line: Vec<u8>) -> Result<StringRecord> {
        let line_no = self.line_no;
        if let Err(e) = std::str::from_utf8(&line) {
            return Err(self.fail(line_no, format!("invalid UTF-8: {e}")));
        }
        match self.fields.split(&line) {
            Ok(record) => Ok(record),
            Err(e) => Err(self.fail(line_no, format!("invalid UTF-8: {e}"))),
        }
    }

    fn fail(&mut self, line: u64, reason: String) -> FeedError {
        self.close();
        FeedError::MalformedRecord { line, reason }
    }
}

impl std::fmt::Debug for RecordStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStream")
            .field("label", &self.label)
            .field("open", &self.is_open())
            .field("line", &self.line_no)
            .finish()
    }
}
