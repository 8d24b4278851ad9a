use std::sync::Arc;

/// Strips script-executing constructs from user-supplied rich text.
/// Built once at startup and injected; every stored `content` value has
/// passed through `clean`.
#[derive(Clone)]
pub struct HtmlSanitizer {
    builder: Arc<ammonia::Builder<'static>>,
}

impl HtmlSanitizer {
    pub fn new() -> Self {
        // The default allow list keeps basic formatting markup and drops
        // scripts, event handlers, and javascript: URLs.
        Self {
            builder: Arc::new(ammonia::Builder::default()),
        }
    }

    pub fn clean(&self, html: &str) -> String {
        self.builder.clean(html).to_string()
    }
}

impl Default for HtmlSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_formatting_markup() {
        let sanitizer = HtmlSanitizer::new();
        let out = sanitizer.clean("<p>Hello <b>world</b></p>");
        assert!(out.contains("<b>world</b>"));
    }

    #[test]
    fn drops_scripts_and_event_handlers() {
        let sanitizer = HtmlSanitizer::new();
        let out = sanitizer.clean("<b>ok</b><script>evil()</script><img src=x onerror=alert(1)>");
        assert!(out.contains("<b>ok</b>"));
        assert!(!out.contains("script"));
        assert!(!out.contains("evil"));
        assert!(!out.contains("onerror"));
    }
}
