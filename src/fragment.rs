use std::borrow::Cow;

use serde_yaml::Value;

use crate::{error::Result, indentation::Indentation};

/// A value rendered as YAML text, ready to be spliced into a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Fragment {
    text: String,
    container: bool,
}

impl Fragment {
    pub fn render(value: &Value) -> Result<Self> {
        let rendered = serde_yaml::to_string(value)?;
        let body = rendered
            .strip_prefix("---\n")
            .or_else(|| rendered.strip_prefix("--- "))
            .unwrap_or(&rendered);

        Ok(Self {
            text: body.trim_end_matches('\n').to_string(),
            container: is_container(value),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// A non-empty mapping or sequence, which renders in block style.
    pub fn is_container(&self) -> bool {
        self.container
    }

    pub fn is_multiline(&self) -> bool {
        self.text.contains('\n')
    }

    pub fn indented(&self, indentation: Indentation, indent_first_line: bool) -> String {
        let mut text = Cow::Borrowed(self.text.as_str());
        indentation.reindent(&mut text, indent_first_line);
        text.into_owned()
    }
}

fn is_container(value: &Value) -> bool {
    match value {
        Value::Mapping(mapping) => !mapping.is_empty(),
        Value::Sequence(sequence) => !sequence.is_empty(),
        Value::Tagged(tagged) => is_container(&tagged.value),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(yaml: &str) -> Fragment {
        Fragment::render(&serde_yaml::from_str::<Value>(yaml).unwrap()).unwrap()
    }

    #[test]
    fn scalars_render_on_one_line() {
        let henlo = fragment("henlo");
        assert_eq!(henlo.text(), "henlo");
        assert!(!henlo.is_container());
        assert!(!henlo.is_multiline());

        assert_eq!(Fragment::render(&Value::from(false)).unwrap().text(), "false");
        assert_eq!(Fragment::render(&Value::from(4)).unwrap().text(), "4");
        assert_eq!(Fragment::render(&Value::from("1")).unwrap().text(), "'1'");
    }

    #[test]
    fn containers_render_in_block_style() {
        let mapping = fragment("{name: test, test: true}");
        assert!(mapping.is_container());
        assert_eq!(mapping.text(), "name: test\ntest: true");
        assert_eq!(
            mapping.indented(Indentation::at(4), true),
            "    name: test\n    test: true"
        );

        let sequence = fragment("[foo, bar]");
        assert_eq!(sequence.text(), "- foo\n- bar");
    }

    #[test]
    fn empty_containers_are_flow_scalars() {
        let empty = fragment("{}");
        assert!(!empty.is_container());
        assert_eq!(empty.text(), "{}");
    }
}
