use std::ops::Range;

use ropey::Rope;

#[derive(Clone, Debug, Copy, Eq, PartialEq)]
pub(crate) struct EditPosition {
    pub start_byte: usize,
    pub end_byte: Option<usize>, // None for insert, Some for replace
}

/// The single text change an operation boils down to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Splice {
    position: EditPosition,
    content: String,
}

impl Splice {
    pub fn replace(range: Range<usize>, content: impl Into<String>) -> Self {
        Self {
            position: EditPosition {
                start_byte: range.start,
                end_byte: Some(range.end.max(range.start)),
            },
            content: content.into(),
        }
    }

    pub fn remove(range: Range<usize>) -> Self {
        Self::replace(range, "")
    }

    pub fn insert(at: usize, content: impl Into<String>) -> Self {
        Self {
            position: EditPosition {
                start_byte: at,
                end_byte: None,
            },
            content: content.into(),
        }
    }

    pub fn apply(&self, source: &str) -> String {
        let mut rope = Rope::from_str(source);

        let EditPosition {
            start_byte,
            end_byte,
        } = self.position;

        let start_char = rope.byte_to_char(start_byte);
        if let Some(end_byte) = end_byte {
            let end_char = rope.byte_to_char(end_byte);
            rope.remove(start_char..end_char);
        }
        rope.insert(start_char, &self.content);

        log::trace!(
            "spliced {:?} over bytes {start_byte}..{}",
            self.content,
            end_byte.unwrap_or(start_byte)
        );

        rope.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_removes_and_inserts() {
        let source = "f: [1, 2, 3]\n";
        assert_eq!(Splice::replace(7..8, "0").apply(source), "f: [1, 0, 3]\n");
        assert_eq!(Splice::remove(7..10).apply(source), "f: [1, 3]\n");
        assert_eq!(Splice::insert(11, ", 4").apply(source), "f: [1, 2, 3, 4]\n");
    }

    #[test]
    fn offsets_are_bytes() {
        let source = "a: ü\nb: 1\n";
        assert_eq!(Splice::replace(9..10, "2").apply(source), "a: ü\nb: 2\n");
        assert_eq!(Splice::replace(3..5, "u").apply(source), "a: u\nb: 1\n");
    }
}
