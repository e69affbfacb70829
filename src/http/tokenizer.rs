//! Incremental HTTP/1.x request tokenizer.
//!
//! Walks raw bytes applying the HTTP grammar and reports what it finds
//! through the [`Callbacks`] trait: message begin, request-target bytes,
//! header name/value bytes, headers complete, body bytes, message complete.
//! Input may be split at any byte boundary; partial tokens carry over to the
//! next [`Tokenizer::advance`] call. The layers above treat this module as a
//! black box and never look at raw bytes themselves.

use crate::http::request::{Method, Version};

/// Upper bound on the accumulated request-target length.
pub const MAX_TARGET_LEN: usize = 8 * 1024;

/// Upper bound on the header (and trailer) section size.
pub const MAX_HEAD_LEN: usize = 64 * 1024;

const MAX_METHOD_LEN: usize = 16;
const VERSION_LEN: usize = 8; // "HTTP/1.1"
const SNIFF_FIELD_MAX: usize = 17; // "transfer-encoding"
const SNIFF_VALUE_MAX: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    InvalidMethod,
    InvalidTarget,
    InvalidVersion,
    InvalidHeader,
    InvalidContentLength,
    InvalidChunk,
    TargetTooLong,
    HeadTooLarge,
    /// A callback asked the tokenizer to stop.
    Rejected,
    /// The tokenizer was fed again after a previous error.
    Broken,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMethod => write!(f, "invalid HTTP method"),
            Self::InvalidTarget => write!(f, "invalid request target"),
            Self::InvalidVersion => write!(f, "invalid HTTP version"),
            Self::InvalidHeader => write!(f, "invalid header"),
            Self::InvalidContentLength => write!(f, "invalid content length"),
            Self::InvalidChunk => write!(f, "invalid chunked encoding"),
            Self::TargetTooLong => write!(f, "request target too long"),
            Self::HeadTooLarge => write!(f, "header section too large"),
            Self::Rejected => write!(f, "rejected by callback"),
            Self::Broken => write!(f, "parser already failed"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Request-line facts handed to [`Callbacks::on_headers_complete`].
#[derive(Debug, Clone, Copy)]
pub struct Head {
    pub method: Method,
    pub version: Version,
}

/// Event sink for the tokenizer, one method per grammar event.
///
/// Slice-carrying callbacks may fire several times for one logical token
/// when it straddles a read boundary; receivers append. Every method returns
/// whether parsing should continue; returning false stops the tokenizer with
/// [`ParseError::Rejected`].
pub trait Callbacks {
    fn on_message_begin(&mut self) -> bool {
        true
    }
    fn on_url(&mut self, _raw: &[u8]) -> bool {
        true
    }
    fn on_header_field(&mut self, _raw: &[u8]) -> bool {
        true
    }
    fn on_header_value(&mut self, _raw: &[u8]) -> bool {
        true
    }
    fn on_headers_complete(&mut self, _head: Head) -> bool {
        true
    }
    fn on_body(&mut self, _raw: &[u8]) -> bool {
        true
    }
    fn on_message_complete(&mut self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Method,
    Target,
    Version,
    RequestLineLf,
    HeaderStart,
    HeaderField,
    HeaderValueStart,
    HeaderValue,
    HeaderLf,
    HeadersAlmostDone,
    Body,
    ChunkSize,
    ChunkExt,
    ChunkSizeLf,
    ChunkData,
    ChunkDataCr,
    ChunkDataLf,
    TrailerStart,
    TrailerLine,
    TrailerLf,
    TrailerAlmostDone,
    Failed,
}

/// Push parser for HTTP/1.x request streams.
///
/// One instance per connection. Consecutive messages on the same stream
/// (keep-alive, pipelining) are handled by the same instance; after an error
/// the instance is poisoned and every later call fails.
#[derive(Debug)]
pub struct Tokenizer {
    state: State,
    error: Option<ParseError>,
    method_buf: Vec<u8>,
    version_buf: Vec<u8>,
    method: Option<Method>,
    version: Option<Version>,
    target_len: usize,
    head_len: usize,
    sniff_field: Vec<u8>,
    sniff_field_overflow: bool,
    sniff_value: Vec<u8>,
    content_length: Option<u64>,
    chunked: bool,
    body_remaining: u64,
    chunk_size: u64,
    chunk_digits: u32,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            state: State::Start,
            error: None,
            method_buf: Vec::new(),
            version_buf: Vec::new(),
            method: None,
            version: None,
            target_len: 0,
            head_len: 0,
            sniff_field: Vec::new(),
            sniff_field_overflow: false,
            sniff_value: Vec::new(),
            content_length: None,
            chunked: false,
            body_remaining: 0,
            chunk_size: 0,
            chunk_digits: 0,
        }
    }

    /// Consumes `buf`, invoking callbacks synchronously as tokens complete.
    ///
    /// Returns the number of bytes consumed (always all of `buf` on
    /// success). Callbacks never outlive the call; whatever did not form a
    /// complete token yet is carried as internal state into the next call.
    pub fn advance(&mut self, cb: &mut impl Callbacks, buf: &[u8]) -> Result<usize, ParseError> {
        if self.error.is_some() {
            return Err(ParseError::Broken);
        }

        let mut i = 0;
        while i < buf.len() {
            let b = buf[i];
            match self.state {
                State::Start => {
                    if b == b'\r' || b == b'\n' {
                        // empty lines before the request line are tolerated
                        i += 1;
                    } else {
                        self.begin_message();
                        if !cb.on_message_begin() {
                            return Err(self.fail(ParseError::Rejected));
                        }
                        self.state = State::Method;
                    }
                }

                State::Method => {
                    let end = buf[i..]
                        .iter()
                        .position(|&c| c == b' ' || c == b'\r' || c == b'\n')
                        .map(|p| i + p);
                    let stop = end.unwrap_or(buf.len());
                    if self.method_buf.len() + (stop - i) > MAX_METHOD_LEN {
                        return Err(self.fail(ParseError::InvalidMethod));
                    }
                    self.method_buf.extend_from_slice(&buf[i..stop]);
                    i = stop;
                    if let Some(end) = end {
                        if buf[end] != b' ' {
                            return Err(self.fail(ParseError::InvalidMethod));
                        }
                        match Method::from_bytes(&self.method_buf) {
                            Some(m) => self.method = Some(m),
                            None => return Err(self.fail(ParseError::InvalidMethod)),
                        }
                        self.state = State::Target;
                        i = end + 1;
                    }
                }

                State::Target => {
                    let end = buf[i..]
                        .iter()
                        .position(|&c| c == b' ' || c == b'\r' || c == b'\n')
                        .map(|p| i + p);
                    let stop = end.unwrap_or(buf.len());
                    let run = &buf[i..stop];
                    if self.target_len + run.len() > MAX_TARGET_LEN {
                        return Err(self.fail(ParseError::TargetTooLong));
                    }
                    if !run.is_empty() {
                        self.target_len += run.len();
                        if !cb.on_url(run) {
                            return Err(self.fail(ParseError::Rejected));
                        }
                    }
                    i = stop;
                    if let Some(end) = end {
                        if buf[end] != b' ' || self.target_len == 0 {
                            return Err(self.fail(ParseError::InvalidTarget));
                        }
                        self.version_buf.clear();
                        self.state = State::Version;
                        i = end + 1;
                    }
                }

                State::Version => {
                    let end = buf[i..]
                        .iter()
                        .position(|&c| c == b'\r' || c == b'\n')
                        .map(|p| i + p);
                    let stop = end.unwrap_or(buf.len());
                    if self.version_buf.len() + (stop - i) > VERSION_LEN {
                        return Err(self.fail(ParseError::InvalidVersion));
                    }
                    self.version_buf.extend_from_slice(&buf[i..stop]);
                    i = stop;
                    if let Some(end) = end {
                        if buf[end] != b'\r' {
                            return Err(self.fail(ParseError::InvalidVersion));
                        }
                        match parse_version(&self.version_buf) {
                            Some(v) => self.version = Some(v),
                            None => return Err(self.fail(ParseError::InvalidVersion)),
                        }
                        self.state = State::RequestLineLf;
                        i = end + 1;
                    }
                }

                State::RequestLineLf => {
                    if b != b'\n' {
                        return Err(self.fail(ParseError::InvalidVersion));
                    }
                    self.state = State::HeaderStart;
                    i += 1;
                }

                State::HeaderStart => {
                    if b == b'\r' {
                        self.bump_head(1)?;
                        self.state = State::HeadersAlmostDone;
                        i += 1;
                    } else if b == b'\n' || b == b' ' || b == b'\t' {
                        // bare LF and obsolete line folding are both rejected
                        return Err(self.fail(ParseError::InvalidHeader));
                    } else {
                        self.state = State::HeaderField;
                    }
                }

                State::HeaderField => {
                    let end = buf[i..]
                        .iter()
                        .position(|&c| c == b':' || c == b'\r' || c == b'\n')
                        .map(|p| i + p);
                    let stop = end.unwrap_or(buf.len());
                    let run = &buf[i..stop];
                    if !run.iter().all(|&c| is_token_char(c)) {
                        return Err(self.fail(ParseError::InvalidHeader));
                    }
                    self.bump_head(stop - i)?;
                    if !run.is_empty() {
                        self.sniff_field_push(run);
                        if !cb.on_header_field(run) {
                            return Err(self.fail(ParseError::Rejected));
                        }
                    }
                    i = stop;
                    if let Some(end) = end {
                        if buf[end] != b':' {
                            return Err(self.fail(ParseError::InvalidHeader));
                        }
                        if self.sniff_field.is_empty() && !self.sniff_field_overflow {
                            // ":" with no name in front of it
                            return Err(self.fail(ParseError::InvalidHeader));
                        }
                        self.bump_head(1)?;
                        self.state = State::HeaderValueStart;
                        i = end + 1;
                    }
                }

                State::HeaderValueStart => {
                    if b == b' ' || b == b'\t' {
                        self.bump_head(1)?;
                        i += 1;
                    } else if b == b'\r' {
                        self.bump_head(1)?;
                        self.finish_header()?;
                        self.state = State::HeaderLf;
                        i += 1;
                    } else if b == b'\n' {
                        return Err(self.fail(ParseError::InvalidHeader));
                    } else {
                        self.state = State::HeaderValue;
                    }
                }

                State::HeaderValue => {
                    let end = buf[i..]
                        .iter()
                        .position(|&c| c == b'\r' || c == b'\n')
                        .map(|p| i + p);
                    let stop = end.unwrap_or(buf.len());
                    let run = &buf[i..stop];
                    if run.iter().any(|&c| c != b'\t' && (c < 0x20 || c == 0x7f)) {
                        return Err(self.fail(ParseError::InvalidHeader));
                    }
                    self.bump_head(stop - i)?;
                    if !run.is_empty() {
                        self.sniff_value_push(run)?;
                        if !cb.on_header_value(run) {
                            return Err(self.fail(ParseError::Rejected));
                        }
                    }
                    i = stop;
                    if let Some(end) = end {
                        if buf[end] != b'\r' {
                            return Err(self.fail(ParseError::InvalidHeader));
                        }
                        self.bump_head(1)?;
                        self.finish_header()?;
                        self.state = State::HeaderLf;
                        i = end + 1;
                    }
                }

                State::HeaderLf => {
                    if b != b'\n' {
                        return Err(self.fail(ParseError::InvalidHeader));
                    }
                    self.bump_head(1)?;
                    self.state = State::HeaderStart;
                    i += 1;
                }

                State::HeadersAlmostDone => {
                    if b != b'\n' {
                        return Err(self.fail(ParseError::InvalidHeader));
                    }
                    i += 1;
                    if self.chunked && self.content_length.is_some() {
                        // ambiguous framing, refuse to guess
                        return Err(self.fail(ParseError::InvalidHeader));
                    }
                    let (method, version) = match (self.method, self.version) {
                        (Some(m), Some(v)) => (m, v),
                        _ => return Err(self.fail(ParseError::Broken)),
                    };
                    if !cb.on_headers_complete(Head { method, version }) {
                        return Err(self.fail(ParseError::Rejected));
                    }
                    if method == Method::CONNECT {
                        // tunnel established after the head; no body to parse
                        self.complete_message(cb)?;
                    } else if self.chunked {
                        self.chunk_size = 0;
                        self.chunk_digits = 0;
                        self.state = State::ChunkSize;
                    } else if let Some(n) = self.content_length.filter(|&n| n > 0) {
                        self.body_remaining = n;
                        self.state = State::Body;
                    } else {
                        self.complete_message(cb)?;
                    }
                }

                State::Body => {
                    let take = self.body_remaining.min((buf.len() - i) as u64) as usize;
                    if !cb.on_body(&buf[i..i + take]) {
                        return Err(self.fail(ParseError::Rejected));
                    }
                    self.body_remaining -= take as u64;
                    i += take;
                    if self.body_remaining == 0 {
                        self.complete_message(cb)?;
                    }
                }

                State::ChunkSize => {
                    if let Some(d) = hex_val(b) {
                        if self.chunk_digits >= 16 {
                            return Err(self.fail(ParseError::InvalidChunk));
                        }
                        self.chunk_size = (self.chunk_size << 4) | u64::from(d);
                        self.chunk_digits += 1;
                        i += 1;
                    } else if self.chunk_digits == 0 {
                        return Err(self.fail(ParseError::InvalidChunk));
                    } else if b == b';' {
                        self.state = State::ChunkExt;
                        i += 1;
                    } else if b == b'\r' {
                        self.state = State::ChunkSizeLf;
                        i += 1;
                    } else {
                        return Err(self.fail(ParseError::InvalidChunk));
                    }
                }

                State::ChunkExt => {
                    if b == b'\r' {
                        self.state = State::ChunkSizeLf;
                    } else if b == b'\n' {
                        return Err(self.fail(ParseError::InvalidChunk));
                    }
                    i += 1;
                }

                State::ChunkSizeLf => {
                    if b != b'\n' {
                        return Err(self.fail(ParseError::InvalidChunk));
                    }
                    i += 1;
                    if self.chunk_size == 0 {
                        self.state = State::TrailerStart;
                    } else {
                        self.body_remaining = self.chunk_size;
                        self.state = State::ChunkData;
                    }
                }

                State::ChunkData => {
                    let take = self.body_remaining.min((buf.len() - i) as u64) as usize;
                    if !cb.on_body(&buf[i..i + take]) {
                        return Err(self.fail(ParseError::Rejected));
                    }
                    self.body_remaining -= take as u64;
                    i += take;
                    if self.body_remaining == 0 {
                        self.state = State::ChunkDataCr;
                    }
                }

                State::ChunkDataCr => {
                    if b != b'\r' {
                        return Err(self.fail(ParseError::InvalidChunk));
                    }
                    self.state = State::ChunkDataLf;
                    i += 1;
                }

                State::ChunkDataLf => {
                    if b != b'\n' {
                        return Err(self.fail(ParseError::InvalidChunk));
                    }
                    self.chunk_size = 0;
                    self.chunk_digits = 0;
                    self.state = State::ChunkSize;
                    i += 1;
                }

                State::TrailerStart => {
                    if b == b'\r' {
                        self.bump_head(1)?;
                        self.state = State::TrailerAlmostDone;
                        i += 1;
                    } else {
                        self.state = State::TrailerLine;
                    }
                }

                State::TrailerLine => {
                    // trailers are framing noise here; skip them wholesale
                    let end = buf[i..]
                        .iter()
                        .position(|&c| c == b'\r' || c == b'\n')
                        .map(|p| i + p);
                    let stop = end.unwrap_or(buf.len());
                    self.bump_head(stop - i)?;
                    i = stop;
                    if let Some(end) = end {
                        if buf[end] != b'\r' {
                            return Err(self.fail(ParseError::InvalidHeader));
                        }
                        self.bump_head(1)?;
                        self.state = State::TrailerLf;
                        i = end + 1;
                    }
                }

                State::TrailerLf => {
                    if b != b'\n' {
                        return Err(self.fail(ParseError::InvalidHeader));
                    }
                    self.bump_head(1)?;
                    self.state = State::TrailerStart;
                    i += 1;
                }

                State::TrailerAlmostDone => {
                    if b != b'\n' {
                        return Err(self.fail(ParseError::InvalidHeader));
                    }
                    i += 1;
                    self.complete_message(cb)?;
                }

                State::Failed => {
                    return Err(self.error.unwrap_or(ParseError::Broken));
                }
            }
        }

        Ok(buf.len())
    }

    fn begin_message(&mut self) {
        self.method_buf.clear();
        self.version_buf.clear();
        self.method = None;
        self.version = None;
        self.target_len = 0;
        self.head_len = 0;
        self.sniff_field.clear();
        self.sniff_field_overflow = false;
        self.sniff_value.clear();
        self.content_length = None;
        self.chunked = false;
        self.body_remaining = 0;
        self.chunk_size = 0;
        self.chunk_digits = 0;
    }

    fn complete_message(&mut self, cb: &mut impl Callbacks) -> Result<(), ParseError> {
        if !cb.on_message_complete() {
            return Err(self.fail(ParseError::Rejected));
        }
        self.state = State::Start;
        Ok(())
    }

    fn fail(&mut self, err: ParseError) -> ParseError {
        self.state = State::Failed;
        self.error = Some(err);
        err
    }

    fn bump_head(&mut self, n: usize) -> Result<(), ParseError> {
        self.head_len += n;
        if self.head_len > MAX_HEAD_LEN {
            Err(self.fail(ParseError::HeadTooLarge))
        } else {
            Ok(())
        }
    }

    /// Keeps a lower-cased copy of the in-progress header name, just enough
    /// to recognize the two body-framing headers.
    fn sniff_field_push(&mut self, run: &[u8]) {
        if self.sniff_field_overflow {
            return;
        }
        if self.sniff_field.len() + run.len() > SNIFF_FIELD_MAX {
            self.sniff_field.clear();
            self.sniff_field_overflow = true;
            return;
        }
        self.sniff_field
            .extend(run.iter().map(u8::to_ascii_lowercase));
    }

    fn sniff_value_push(&mut self, run: &[u8]) -> Result<(), ParseError> {
        if self.sniff_field != b"content-length" && self.sniff_field != b"transfer-encoding" {
            return Ok(());
        }
        if self.sniff_value.len() + run.len() > SNIFF_VALUE_MAX {
            return Err(self.fail(ParseError::InvalidHeader));
        }
        self.sniff_value
            .extend(run.iter().map(u8::to_ascii_lowercase));
        Ok(())
    }

    /// A header line just ended; account for it if it frames the body.
    fn finish_header(&mut self) -> Result<(), ParseError> {
        if self.sniff_field == b"content-length" {
            let text = std::str::from_utf8(&self.sniff_value)
                .map(str::trim)
                .map_err(|_| ())
                .and_then(|s| s.parse::<u64>().map_err(|_| ()));
            let n = match text {
                Ok(n) => n,
                Err(()) => return Err(self.fail(ParseError::InvalidContentLength)),
            };
            if self.content_length.is_some_and(|prev| prev != n) {
                return Err(self.fail(ParseError::InvalidContentLength));
            }
            self.content_length = Some(n);
        } else if self.sniff_field == b"transfer-encoding"
            && self.sniff_value.windows(7).any(|w| w == b"chunked")
        {
            self.chunked = true;
        }
        self.sniff_field.clear();
        self.sniff_field_overflow = false;
        self.sniff_value.clear();
        Ok(())
    }
}

fn parse_version(buf: &[u8]) -> Option<Version> {
    if buf.len() != VERSION_LEN || !buf.starts_with(b"HTTP/") {
        return None;
    }
    if !buf[5].is_ascii_digit() || buf[6] != b'.' || !buf[7].is_ascii_digit() {
        return None;
    }
    Some(Version {
        major: buf[5] - b'0',
        minor: buf[7] - b'0',
    })
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn is_token_char(b: u8) -> bool {
    matches!(
        b,
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`'
            | b'|' | b'~' | b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z'
    )
}
