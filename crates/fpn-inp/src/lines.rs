//! Streaming line reader over an arbitrary text encoding.
//!
//! Bytes are pulled in fixed chunks and pushed through an `encoding_rs`
//! decoder with replacement, so malformed sequences become U+FFFD instead of
//! aborting the pass. A leading byte-order mark is removed.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use encoding_rs::{CoderResult, Decoder, Encoding};

use crate::error::{FpnError, Result};

const CHUNK_SIZE: usize = 64 * 1024;

pub struct DecodedLines<R> {
    reader: R,
    decoder: Decoder,
    chunk: Vec<u8>,
    text: String,
    cursor: usize,
    eof: bool,
    had_replacements: bool,
}

impl DecodedLines<File> {
    pub fn open(path: impl AsRef<Path>, encoding: &'static Encoding) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| FpnError::io(path, e))?;
        Ok(Self::new(file, encoding))
    }
}

impl<R: Read> DecodedLines<R> {
    pub fn new(reader: R, encoding: &'static Encoding) -> Self {
        Self {
            reader,
            decoder: encoding.new_decoder_with_bom_removal(),
            chunk: vec![0; CHUNK_SIZE],
            text: String::new(),
            cursor: 0,
            eof: false,
            had_replacements: false,
        }
    }

    /// Whether any malformed byte sequence was replaced so far.
    pub fn had_replacements(&self) -> bool {
        self.had_replacements
    }

    fn fill(&mut self) -> io::Result<()> {
        self.text.replace_range(..self.cursor, "");
        self.cursor = 0;

        let read = loop {
            match self.reader.read(&mut self.chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        let last = read == 0;

        let mut input = &self.chunk[..read];
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(input.len())
                .unwrap_or(input.len() * 3 + 16);
            self.text.reserve(needed);
            let (result, consumed, replaced) =
                self.decoder.decode_to_string(input, &mut self.text, last);
            self.had_replacements |= replaced;
            input = &input[consumed..];
            if result == CoderResult::InputEmpty {
                break;
            }
        }

        self.eof = last;
        Ok(())
    }
}

impl<R: Read> Iterator for DecodedLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(pos) = self.text[self.cursor..].find('\n') {
                let end = self.cursor + pos;
                let line = self.text[self.cursor..end].trim_end_matches('\r').to_string();
                self.cursor = end + 1;
                return Some(Ok(line));
            }

            if self.eof {
                if self.cursor >= self.text.len() {
                    return None;
                }
                let line = self.text[self.cursor..].trim_end_matches('\r').to_string();
                self.cursor = self.text.len();
                return Some(Ok(line));
            }

            if let Err(e) = self.fill() {
                self.eof = true;
                self.text.clear();
                self.cursor = 0;
                return Some(Err(e));
            }
        }
    }
}
