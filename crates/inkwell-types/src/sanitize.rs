/// Escape the characters that are significant in HTML text and attributes.
///
/// `&` becomes `&amp;`, `<` and `>` become `&lt;`/`&gt;`, and both quote
/// characters become numeric references.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&#34;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Trim surrounding whitespace, then escape.
pub fn clean(input: &str) -> String {
    escape_html(input.trim())
}
