use std::collections::HashSet;

/// Tags a comment body may keep. Everything else is stripped.
const COMMENT_TAGS: [&str; 14] = [
    "a", "b", "blockquote", "br", "code", "em", "i", "li", "ol", "p", "pre", "s", "strong", "ul",
];

/// Clean comment HTML using the ammonia library.
///
/// Whitelist-based: inline formatting, lists, quotes and links survive;
/// `<script>`/`<style>` are removed together with their content, and
/// event-handler attributes are dropped. Plain text passes through with
/// `<`, `>` and `&` escaped.
pub fn clean_html(input: &str) -> String {
    ammonia::Builder::default()
        .tags(HashSet::from(COMMENT_TAGS))
        .clean(input)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_formatting_and_drops_scripts() {
        assert_eq!(clean_html("<b>bold</b><script>x()</script>"), "<b>bold</b>");
    }

    #[test]
    fn drops_disallowed_tags_but_keeps_text() {
        assert_eq!(clean_html("<h1>title</h1>"), "title");
    }

    #[test]
    fn drops_event_handlers() {
        assert_eq!(clean_html(r#"<p onclick="evil()">hi</p>"#), "<p>hi</p>");
    }
}
