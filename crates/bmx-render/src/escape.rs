use std::borrow::Cow;

/// How `{{expr}}` output is escaped. `{{{expr}}}` is never escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Escaper {
    /// Escape `& < > " ' \` =` as HTML entities.
    #[default]
    Html,
    /// Print values as they are.
    None,
}

impl Escaper {
    pub fn escape<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            Escaper::Html => escape_html(text),
            Escaper::None => Cow::Borrowed(text),
        }
    }
}

fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'', '`', '=']) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '`' => out.push_str("&#x60;"),
            '=' => out.push_str("&#x3D;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Render-wide settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub escape: Escaper,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            Escaper::Html.escape("<a href=\"x\">Tom & 'Jerry'`</a>"),
            "&lt;a href&#x3D;&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&#x60;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_plain_text_is_borrowed() {
        assert!(matches!(Escaper::Html.escape("plain"), Cow::Borrowed("plain")));
        assert_eq!(Escaper::None.escape("<b>"), "<b>");
    }
}
