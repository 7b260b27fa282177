//! Code element extraction from HTML documents.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};

use crate::domain::Code;

/// Extract the text of every element carrying all `attributes`.
///
/// An attribute matches either an HTML attribute name on the element
/// (`<div data-run>`) or one of its class tokens (`<code class="kotlin">`).
/// Elements nested inside an already matched element are not extracted
/// again. With no attributes every `<code>` element is returned.
pub fn extract(source: &str, attributes: &[String]) -> Vec<Code> {
    let document = Html::parse_document(source);

    if attributes.is_empty() {
        let Ok(selector) = Selector::parse("code") else {
            return Vec::new();
        };
        return document
            .select(&selector)
            .map(|el| Code::new(el.text().collect::<String>()))
            .collect();
    }

    let Ok(any) = Selector::parse("*") else {
        return Vec::new();
    };

    let mut matched = HashSet::new();
    let mut codes = Vec::new();
    for element in document.select(&any) {
        if !carries_all(&element, attributes) {
            continue;
        }
        if element.ancestors().any(|a| matched.contains(&a.id())) {
            continue;
        }
        matched.insert(element.id());
        codes.push(Code::new(element.text().collect::<String>()));
    }
    codes
}

fn carries_all(element: &ElementRef<'_>, attributes: &[String]) -> bool {
    let value = element.value();
    attributes
        .iter()
        .all(|attr| value.attr(attr).is_some() || value.classes().any(|c| c == attr))
}
