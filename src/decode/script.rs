//! Extraction of array literals embedded in the rendering page's scripts.
//!
//! The page inlines its chart data as a plain JavaScript assignment,
//! `var demandaReal = [ ... ];`. We walk every `<script>` element, find the
//! marker variable, and slice out the array text with bracket balancing —
//! a regex alone cannot handle the nested objects inside the array.

use scraper::{Html, Selector};

/// Find the marker assignment in any `<script>` block of the document and
/// return the array literal assigned to it.
///
/// `None` means the marker variable is absent — the provider changed the
/// page structure, which callers must classify as a decode failure rather
/// than a transport one.
pub fn extract_script_array(html: &str, marker: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script").expect("valid selector");

    for script in document.select(&selector) {
        let text: String = script.text().collect();
        if let Some(array) = extract_array_after_marker(&text, marker) {
            return Some(array);
        }
    }
    None
}

/// Slice the first bracket-balanced `[...]` that follows `marker` in `text`.
///
/// String literals inside the array are honored so brackets in values do
/// not unbalance the scan.
pub fn extract_array_after_marker(text: &str, marker: &str) -> Option<String> {
    let at = text.find(marker)?;
    let rest = &text[at + marker.len()..];
    let open = rest.find('[')?;
    let body = &rest[open..];

    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for (i, c) in body.char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => in_string = Some(c),
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(body[..=i].to_string());
                }
            }
            _ => {}
        }
    }
    // Ran off the end with brackets still open: truncated page.
    None
}
