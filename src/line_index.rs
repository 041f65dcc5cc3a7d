use crate::tree::Position;

/// Cumulative byte offsets of every line start in a buffer.
///
/// `line_starts[n]` is the sum of the lengths (terminator included) of all lines before
/// line `n`, so `line_starts[0]` is always 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Self {
            line_starts,
            len: text.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset of the start of `line`. Lines past the end clamp to the buffer length.
    pub fn line_start(&self, line: usize) -> usize {
        self.line_starts.get(line).copied().unwrap_or(self.len)
    }

    pub fn offset(&self, position: Position) -> usize {
        (self.line_start(position.line) + position.column).min(self.len)
    }

    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        Position {
            line,
            column: offset - self.line_starts[line],
        }
    }

    /// Start of the line that follows the one containing `position`.
    pub fn next_line_start(&self, position: Position) -> usize {
        self.line_start(position.line + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: usize, column: usize) -> Position {
        Position { line, column }
    }

    #[test]
    fn prefix_sums_include_terminators() {
        let index = LineIndex::new("ab\ncde\n\nf");
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.line_start(0), 0);
        assert_eq!(index.line_start(1), 3);
        assert_eq!(index.line_start(2), 7);
        assert_eq!(index.line_start(3), 8);
        assert_eq!(index.line_start(4), 9);
    }

    #[test]
    fn offset_and_position_are_inverse() {
        let text = "key: value\n  nested: [1, 2]\n";
        let index = LineIndex::new(text);
        for offset in 0..=text.len() {
            assert_eq!(index.offset(index.position(offset)), offset);
        }
        assert_eq!(index.position(13), pos(1, 2));
        assert_eq!(index.offset(pos(1, 10)), 21);
    }

    #[test]
    fn offsets_clamp_to_buffer_end() {
        let index = LineIndex::new("a: 1\n");
        assert_eq!(index.offset(pos(7, 3)), 5);
        assert_eq!(index.position(99), pos(1, 0));
        assert_eq!(index.next_line_start(pos(0, 2)), 5);
        assert_eq!(index.next_line_start(pos(1, 0)), 5);
    }

    #[test]
    fn empty_text_has_one_line() {
        let index = LineIndex::new("");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.position(0), pos(0, 0));
    }
}
