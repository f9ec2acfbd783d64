/*!
 * Length bounding for model input.
 *
 * Budgets are counted in Unicode scalar values, so a cut never lands inside
 * an encoded character. Over-budget text keeps its longest prefix that ends
 * at a sentence or word boundary close to the budget.
 */

use log::debug;

/// Upper bound on how far back a cut may move to reach a boundary
const MAX_BOUNDARY_WINDOW: usize = 200;

/// Smallest default window, so short budgets still find a nearby space
const MIN_BOUNDARY_WINDOW: usize = 32;

const SENTENCE_TERMINATORS: [char; 4] = ['.', '!', '?', '…'];

/// Outcome of bounding one text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Truncated<'a> {
    /// The kept text, always a prefix of the input
    pub text: &'a str,
    /// Whether anything was dropped
    pub truncated: bool,
    /// Character count of the input
    pub original_chars: usize,
}

impl Truncated<'_> {
    pub fn kept_chars(&self) -> usize {
        self.text.chars().count()
    }
}

/// Bounds text to a character budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    max_chars: usize,
    boundary_window: Option<usize>,
}

impl TextChunker {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            boundary_window: None,
        }
    }

    /// Override how many characters before the budget are searched for a boundary
    pub fn with_boundary_window(mut self, window: usize) -> Self {
        self.boundary_window = Some(window);
        self
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn boundary_window(&self) -> usize {
        self.boundary_window
            .unwrap_or_else(|| {
                (self.max_chars / 10)
                    .max(MIN_BOUNDARY_WINDOW)
                    .min(MAX_BOUNDARY_WINDOW)
            })
            .min(self.max_chars)
    }

    /// Keep at most `max_chars` characters of `text`.
    ///
    /// Text within budget comes back untouched. Otherwise the cut prefers the
    /// last sentence terminator in the boundary window, then the last
    /// whitespace, then the exact budget.
    pub fn truncate<'a>(&self, text: &'a str) -> Truncated<'a> {
        let mut indices = text.char_indices();
        let cut = match indices.nth(self.max_chars) {
            Some((byte_index, _)) => byte_index,
            None => {
                return Truncated {
                    text,
                    truncated: false,
                    original_chars: text.chars().count(),
                };
            }
        };
        let original_chars = self.max_chars + 1 + indices.count();

        if self.max_chars == 0 {
            return Truncated {
                text: "",
                truncated: true,
                original_chars,
            };
        }

        let prefix = &text[..cut];
        let window_start = prefix
            .char_indices()
            .nth(self.max_chars - self.boundary_window())
            .map(|(index, _)| index)
            .unwrap_or(cut);
        let cut_on_whitespace = text[cut..].starts_with(char::is_whitespace);

        let end = sentence_boundary(prefix, window_start)
            .or_else(|| cut_on_whitespace.then_some(cut))
            .or_else(|| word_boundary(prefix, window_start))
            .unwrap_or(cut);

        let kept = prefix[..end].trim_end();
        debug!(
            "Truncated text from {} to {} characters",
            original_chars,
            kept.chars().count()
        );

        Truncated {
            text: kept,
            truncated: true,
            original_chars,
        }
    }

    /// Split `text` into consecutive pieces that each fit the budget.
    ///
    /// Pieces are cut with the same boundary preference as [`truncate`] and
    /// carry no leading or trailing whitespace. A zero budget means no limit.
    ///
    /// [`truncate`]: TextChunker::truncate
    pub fn segments<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut remaining = text.trim();
        if remaining.is_empty() {
            return Vec::new();
        }
        if self.max_chars == 0 {
            return vec![remaining];
        }

        let mut pieces = Vec::new();
        while !remaining.is_empty() {
            let piece = self.truncate(remaining);
            if !piece.truncated {
                pieces.push(remaining);
                break;
            }
            pieces.push(piece.text);
            remaining = remaining[piece.text.len()..].trim_start();
        }
        pieces
    }
}

/// Byte offset just past the last terminator in the window that is followed
/// by whitespace or by the end of the prefix
fn sentence_boundary(prefix: &str, window_start: usize) -> Option<usize> {
    let window = &prefix[window_start..];
    let mut found = None;
    let mut chars = window.char_indices().peekable();
    while let Some((index, c)) = chars.next() {
        if !SENTENCE_TERMINATORS.contains(&c) {
            continue;
        }
        let followed_by_break = match chars.peek() {
            Some((_, next)) => next.is_whitespace(),
            None => true,
        };
        if followed_by_break {
            found = Some(window_start + index + c.len_utf8());
        }
    }
    found
}

/// Byte offset of the last whitespace in the window past its first character
fn word_boundary(prefix: &str, window_start: usize) -> Option<usize> {
    prefix[window_start..]
        .char_indices()
        .filter(|(index, c)| *index > 0 && c.is_whitespace())
        .map(|(index, _)| window_start + index)
        .last()
}
