//! Fenced code block extraction from Markdown documents.

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};

use crate::domain::Code;

/// Extract fenced code blocks whose info string carries every attribute.
///
/// An info string such as `kotlin run-kotlin {validate=false}` is split into
/// tokens on whitespace, commas and braces. With no attributes every fenced
/// block is returned. Indented blocks have no info string and are skipped.
pub fn extract(source: &str, attributes: &[String]) -> Vec<Code> {
    let mut codes = Vec::new();
    let mut current: Option<String> = None;

    for event in Parser::new(source) {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                if info_matches(&info, attributes) {
                    current = Some(String::new());
                }
            }
            Event::Text(text) => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(buf) = current.take() {
                    codes.push(Code::new(buf));
                }
            }
            _ => {}
        }
    }

    codes
}

fn info_matches(info: &str, attributes: &[String]) -> bool {
    let tokens: Vec<&str> = info
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '{' | '}'))
        .filter(|t| !t.is_empty())
        .collect();
    attributes
        .iter()
        .all(|attr| tokens.iter().any(|t| t == attr))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn extracts_blocks_carrying_all_attributes() {
        let md = "\
# Intro

```kotlin run-kotlin
fun main() = println(1)
```

```kotlin
fun skipped() {}
```

```{kotlin, run-kotlin}
fun main() = println(2)
```
";
        let codes = extract(md, &attrs(&["kotlin", "run-kotlin"]));
        assert_eq!(
            codes,
            vec![
                Code::new("fun main() = println(1)\n"),
                Code::new("fun main() = println(2)\n"),
            ]
        );
    }

    #[test]
    fn empty_attributes_select_every_fenced_block() {
        let md = "```\na\n```\n\n    indented\n\n~~~text\nb\n~~~\n";
        let codes = extract(md, &[]);
        assert_eq!(codes, vec![Code::new("a\n"), Code::new("b\n")]);
    }

    #[test]
    fn attribute_match_is_exact_token() {
        let md = "```kotlin-script\nx\n```\n";
        assert!(extract(md, &attrs(&["kotlin"])).is_empty());
    }

    #[test]
    fn identical_blocks_are_extracted_separately() {
        let md = "Some text.\n\n```kotlin\nprintln(1)\n```\n\nOther text.\n\n```kotlin\nprintln(1)\n```\n";
        let codes = extract(md, &attrs(&["kotlin"]));
        assert_eq!(codes.len(), 2);
        assert_eq!(codes[0], codes[1]);
    }

    #[test]
    fn unterminated_fence_runs_to_end_of_document() {
        let md = "```kotlin\nfun main() {\n";
        let codes = extract(md, &attrs(&["kotlin"]));
        assert_eq!(codes, vec![Code::new("fun main() {\n")]);
    }

    #[test]
    fn document_without_code_yields_nothing() {
        assert!(extract("just prose, <b>no</b> code", &[]).is_empty());
    }
}
