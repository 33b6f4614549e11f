//! Quote and escape aware command tokenizer.
//!
//! Splits a byte window into line-terminated commands of whitespace-separated
//! arguments:
//!
//! ```text
//! login 123456\n           -> ["login", "123456"]
//! echo "hello world"\n     -> ["echo", "hello world"]
//! set 'a b' "c\"d" e\ f\n  -> ["set", "a b", "c\"d", "e f"]
//! ```
//!
//! Scanning always starts in the unquoted state at the beginning of the
//! window. Callers only ever pass windows that begin at a command boundary,
//! so no quote state has to survive between passes.

use super::args::Args;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    SingleQuote,
    DoubleQuote,
}

/// Reusable scratch space for unescaped argument text and argument spans.
///
/// Both are sized to the receive buffer capacity up front: a window never
/// holds more argument bytes, or more arguments, than it has bytes.
pub struct Tokenizer {
    scratch: Box<[u8]>,
    spans: Vec<Range<usize>>,
}

impl Tokenizer {
    pub fn new(capacity: usize) -> Self {
        Self {
            scratch: vec![0u8; capacity].into_boxed_slice(),
            spans: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.scratch.len()
    }

    /// Dispatch every complete command in `window` to `dispatch`, in order.
    ///
    /// Returns the number of trailing bytes that do not yet form a complete
    /// command. Commands with no arguments are skipped.
    pub fn tokenize<F>(&mut self, window: &[u8], mut dispatch: F) -> usize
    where
        F: FnMut(&Args<'_>),
    {
        assert!(
            window.len() <= self.scratch.len(),
            "window exceeds tokenizer capacity"
        );

        let mut remaining = window.len();
        let mut mode = Mode::Normal;
        let mut out = 0;
        let mut arg_start: Option<usize> = None;
        let mut i = 0;
        self.spans.clear();

        while i < window.len() {
            let ch = window[i];
            i += 1;

            match mode {
                Mode::Normal => match ch {
                    b' ' | b'\r' => {
                        if let Some(start) = arg_start.take() {
                            self.spans.push(start..out);
                        }
                    }
                    b'\n' => {
                        if let Some(start) = arg_start.take() {
                            self.spans.push(start..out);
                        }
                        if !self.spans.is_empty() {
                            dispatch(&Args::new(&self.scratch[..out], &self.spans));
                        }
                        self.spans.clear();
                        out = 0;
                        remaining = window.len() - i;
                    }
                    _ => {
                        if arg_start.is_none() {
                            arg_start = Some(out);
                        }
                        match ch {
                            b'\'' => mode = Mode::SingleQuote,
                            b'"' => mode = Mode::DoubleQuote,
                            b'\\' => {
                                // Escaped byte not received yet.
                                let Some(&next) = window.get(i) else { break };
                                self.emit(next, &mut out, &mut arg_start);
                                i += 1;
                            }
                            _ => self.emit(ch, &mut out, &mut arg_start),
                        }
                    }
                },
                Mode::SingleQuote => {
                    if ch == b'\'' {
                        mode = Mode::Normal;
                    } else {
                        self.emit(ch, &mut out, &mut arg_start);
                    }
                }
                Mode::DoubleQuote => match ch {
                    b'"' => mode = Mode::Normal,
                    b'\\' if i == window.len() => break,
                    b'\\' if matches!(window[i], b'\\' | b'"') => {
                        self.emit(window[i], &mut out, &mut arg_start);
                        i += 1;
                    }
                    _ => self.emit(ch, &mut out, &mut arg_start),
                },
            }
        }

        remaining
    }

    /// Append one argument byte. A NUL ends the current argument and the
    /// next byte starts a new one, so no argument ever contains NUL.
    fn emit(&mut self, byte: u8, out: &mut usize, arg_start: &mut Option<usize>) {
        if byte == 0 {
            if let Some(start) = arg_start.take() {
                self.spans.push(start..*out);
            }
            return;
        }
        if arg_start.is_none() {
            *arg_start = Some(*out);
        }
        self.scratch[*out] = byte;
        *out += 1;
    }
}
