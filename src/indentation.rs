use std::{
    borrow::Cow,
    fmt::{self, Display, Formatter, Write},
};

/// Columns a nested block collection is pushed in by.
pub(crate) const NESTED_STEP: usize = 2;

/// A block indentation level, counted in spaces. YAML never indents with tabs.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Default)]
pub(crate) struct Indentation {
    column: usize,
}

impl Display for Indentation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for _ in 0..self.column {
            f.write_char(' ')?;
        }
        Ok(())
    }
}

impl Indentation {
    pub fn at(column: usize) -> Self {
        Self { column }
    }

    pub fn nested(self) -> Self {
        Self::at(self.column + NESTED_STEP)
    }

    fn unit_count(line: &str) -> usize {
        line.chars().take_while(|c| *c == ' ').count()
    }

    /// Smallest indentation over the non-blank lines of `source`.
    pub fn minimum(source: &str) -> usize {
        source
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(Self::unit_count)
            .min()
            .unwrap_or(0)
    }

    /// Shifts `content` so its least indented line sits at this level, keeping relative
    /// indentation. The first line is left alone unless `indent_first_line` is set, for
    /// content that continues a line already written (`key: ` or `- `).
    pub fn reindent(&self, content: &mut Cow<'_, str>, indent_first_line: bool) {
        if content.is_empty() || (!indent_first_line && !content.contains('\n')) {
            return;
        }

        let min_units = Self::minimum(content);
        let mut string = String::with_capacity(content.len() + self.column * 4);
        for (index, line) in content.lines().enumerate() {
            if index > 0 {
                string.push('\n');
            }
            if line.trim().is_empty() {
                continue;
            }
            if index == 0 && !indent_first_line {
                string.push_str(line.trim_start());
                continue;
            }
            let relative_units = Self::unit_count(line).saturating_sub(min_units);
            let new_indentation = Self::at(self.column + relative_units);
            let _ = write!(&mut string, "{new_indentation}{}", line.trim_start());
        }

        if content.ends_with('\n') {
            string.push('\n');
        }

        *content = Cow::Owned(string);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reindent(content: &str, column: usize, indent_first_line: bool) -> String {
        let mut content = Cow::Borrowed(content);
        Indentation::at(column).reindent(&mut content, indent_first_line);
        content.into_owned()
    }

    #[test]
    fn shifts_every_line_when_asked() {
        assert_eq!(
            reindent("name: test\ntest: true", 4, true),
            "    name: test\n    test: true"
        );
        assert_eq!(reindent("- foo\n- bar", 2, true), "  - foo\n  - bar");
    }

    #[test]
    fn continuation_lines_keep_relative_indentation() {
        assert_eq!(
            reindent("name: e\nlist:\n- 1\nsub:\n  x: 1", 8, false),
            "name: e\n        list:\n        - 1\n        sub:\n          x: 1"
        );
        assert_eq!(reindent("a:\n  b: 1", 4, false), "a:\n      b: 1");
    }

    #[test]
    fn single_lines_are_untouched_without_first_line() {
        assert_eq!(reindent("henlo", 6, false), "henlo");
        assert_eq!(reindent("henlo", 2, true), "  henlo");
    }

    #[test]
    fn blank_lines_stay_blank() {
        assert_eq!(reindent("a: |\n  x\n\n  y\n", 2, true), "  a: |\n    x\n\n    y\n");
    }

    #[test]
    fn display_writes_spaces() {
        assert_eq!(Indentation::at(3).to_string(), "   ");
        assert_eq!(Indentation::at(2).nested(), Indentation::at(4));
        assert_eq!(Indentation::minimum("  a\n\n    b\n"), 2);
    }
}
