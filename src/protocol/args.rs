//! Borrowed argument view handed to command handlers.

use std::ops::{Index, Range};

/// Arguments of a single dispatched command.
///
/// The view borrows the tokenizer's scratch area and is only valid for the
/// duration of the dispatch call. Copy out anything that must outlive it.
#[derive(Clone, Copy)]
pub struct Args<'a> {
    data: &'a [u8],
    spans: &'a [Range<usize>],
}

impl<'a> Args<'a> {
    pub(crate) fn new(data: &'a [u8], spans: &'a [Range<usize>]) -> Self {
        Self { data, spans }
    }

    /// Number of arguments, including the command name. Never zero.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// The `i`th argument as raw bytes.
    pub fn get(&self, i: usize) -> Option<&'a [u8]> {
        self.spans.get(i).map(|span| &self.data[span.clone()])
    }

    /// The `i`th argument as UTF-8, or `None` if missing or not valid UTF-8.
    pub fn str(&self, i: usize) -> Option<&'a str> {
        self.get(i).and_then(|arg| std::str::from_utf8(arg).ok())
    }

    /// The command name (first argument).
    pub fn command(&self) -> &'a [u8] {
        self.get(0).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        let (data, spans) = (self.data, self.spans);
        spans.iter().map(move |span| &data[span.clone()])
    }
}

impl<'a> Index<usize> for Args<'a> {
    type Output = [u8];

    fn index(&self, i: usize) -> &[u8] {
        &self.data[self.spans[i].clone()]
    }
}

impl std::fmt::Debug for Args<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.iter().map(String::from_utf8_lossy))
            .finish()
    }
}
