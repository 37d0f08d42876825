// src/checker/html.rs
// =============================================================================
// This module pulls link targets out of HTML, one token at a time.
//
// We use html5ever's tokenizer directly instead of building a DOM:
// - the page is read in small chunks as the caller asks for more links
// - we never need the whole document in memory
// - a truncated page still gives us every link seen before the cut
//
// What we yield:
// - the raw value of every `href` attribute, on start AND end tags
// - in document order, duplicates included
// - no validation: the caller resolves and filters (see checker::url)
// =============================================================================

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use std::collections::VecDeque;
use std::io::Read;

// How many bytes we read from the source per refill
const CHUNK_SIZE: usize = 8 * 1024;

// Receives tokens from html5ever and keeps the href values until the
// iterator hands them out
#[derive(Default)]
struct HrefSink {
    pending: VecDeque<String>,
}

impl TokenSink for HrefSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        // Start and end tags both arrive as TagToken
        if let Token::TagToken(tag) = token {
            for attr in tag.attrs {
                if &*attr.name.local == "href" {
                    self.pending.push_back(attr.value.to_string());
                }
            }
        }
        TokenSinkResult::Continue
    }
}

/// Lazily yields every `href` attribute value found in an HTML byte stream.
///
/// The source is only read when the already-tokenized input has run out of
/// links. A read error is treated like end-of-input: iteration stops and
/// whatever was found so far has already been yielded.
pub struct HrefExtractor<R> {
    reader: R,
    tokenizer: Tokenizer<HrefSink>,
    input: BufferQueue,
    // Bytes of a UTF-8 sequence split across two reads
    carry: Vec<u8>,
    finished: bool,
}

impl<R: Read> HrefExtractor<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            tokenizer: Tokenizer::new(HrefSink::default(), TokenizerOpts::default()),
            input: BufferQueue::new(),
            carry: Vec::new(),
            finished: false,
        }
    }

    // Reads one chunk and runs it through the tokenizer.
    // Returns false once the source is exhausted (or broken).
    fn refill(&mut self) -> bool {
        let mut chunk = [0u8; CHUNK_SIZE];
        let read = match self.reader.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => return true,
            Err(_) => 0,
        };

        if read == 0 {
            // Whatever is left in carry is an incomplete character
            if !self.carry.is_empty() {
                let rest = String::from_utf8_lossy(&self.carry).into_owned();
                self.carry.clear();
                self.feed(&rest);
            }
            self.tokenizer.end();
            return false;
        }

        self.carry.extend_from_slice(&chunk[..read]);
        let text = self.take_decodable();
        self.feed(&text);
        true
    }

    // Splits off the longest prefix of `carry` that can be decoded now,
    // leaving a trailing partial character (if any) for the next read
    fn take_decodable(&mut self) -> String {
        let keep_from = match std::str::from_utf8(&self.carry) {
            Ok(_) => self.carry.len(),
            // error_len() == None means the input ends mid-character
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            // Genuinely invalid bytes: replace them, keep nothing back
            Err(_) => self.carry.len(),
        };
        let rest = self.carry.split_off(keep_from);
        let text = String::from_utf8_lossy(&self.carry).into_owned();
        self.carry = rest;
        text
    }

    fn feed(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.input.push_back(StrTendril::from_slice(text));
        let _ = self.tokenizer.feed(&mut self.input);
    }
}

impl<R: Read> Iterator for HrefExtractor<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(href) = self.tokenizer.sink.pending.pop_front() {
                return Some(href);
            }
            if self.finished {
                return None;
            }
            if !self.refill() {
                self.finished = true;
            }
        }
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why a plain Iterator over std::io::Read?
//    - The tokenizer is synchronous and not Send, so it cannot live inside a
//      spawned async task across an .await
//    - The worker runs this on a blocking thread and hands it a Read adapter
//      over the live response body (see checker::http::BlockingBody)
//
// 2. Why the carry buffer?
//    - A read can stop in the middle of a multi-byte character
//    - html5ever wants &str, so we hold back the partial bytes until the
//      next read completes them
// -----------------------------------------------------------------------------
