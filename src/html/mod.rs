
use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute, encode_text};
use url::Url;

use crate::render::{Segment, Style};

/// Link schemes that are safe to put into an `href`.
const ALLOWED_SCHEMES: [&str; 4] = ["http", "https", "tg", "mailto"];

/// Schemes that are never reinterpreted as a `host:port` target.
const REFUSED_SCHEMES: [&str; 4] = ["javascript", "data", "vbscript", "file"];

/// Options for [`HtmlRenderer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlOptions {
    /// Add `target="_blank" rel="noopener noreferrer"` to every link.
    pub open_links_in_new_tab: bool,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self { open_links_in_new_tab: true }
    }
}

/// Turns rendered segments into an HTML fragment.
#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer {
    options: HtmlOptions,
}

impl HtmlRenderer {
    /// Creates a renderer with the given options.
    pub fn new(options: HtmlOptions) -> Self {
        Self { options }
    }

    /// Renders `segments` into a `<div class="text-content">` fragment.
    pub fn render(&self, segments: &[Segment]) -> String {
        let mut html = String::from(r#"<div class="text-content">"#);
        for segment in segments {
            self.push_segment(&mut html, segment);
        }
        html.push_str("</div>");
        html
    }

    fn push_segment(&self, html: &mut String, segment: &Segment) {
        let text = encode_text(&segment.text);

        // Writing into a String cannot fail.
        let _ = match &segment.style {
            Style::Plain => write!(html, "{text}"),
            Style::Bold => write!(html, "<strong>{text}</strong>"),
            Style::Italic => write!(html, "<em>{text}</em>"),
            Style::Underline => write!(html, r#"<span class="underline">{text}</span>"#),
            Style::Strikethrough => write!(html, r#"<span class="line-through">{text}</span>"#),
            Style::Code => write!(html, "<code>{text}</code>"),
            Style::Pre { language } => {
                html.push_str("<pre><code>");
                if let Some(language) = language.as_deref().filter(|l| !l.is_empty()) {
                    let _ = write!(
                        html,
                        r#"<span class="code-language">{}</span>"#,
                        encode_text(language)
                    );
                }
                write!(html, "{text}</code></pre>")
            }
            Style::TextLink { target } | Style::Url { target } | Style::Mention { target } => {
                self.push_link(html, target, &text)
            }
            Style::Hashtag => write!(html, r#"<span class="hashtag">{text}</span>"#),
            Style::Spoiler => write!(html, r#"<span class="spoiler">{text}</span>"#),
        };
    }

    fn push_link(&self, html: &mut String, target: &str, label: &str) -> std::fmt::Result {
        let Some(href) = sanitize_href(target) else {
            tracing::debug!("Refusing to link to unsafe target: {target}");
            return write!(html, "{label}");
        };

        write!(html, r#"<a href="{}""#, encode_double_quoted_attribute(&href))?;
        if self.options.open_links_in_new_tab {
            html.push_str(r#" target="_blank" rel="noopener noreferrer""#);
        }
        write!(html, ">{label}</a>")
    }
}

/// Parses a link target the way Telegram does, allowing an implicit
/// `https://` prefix, and returns it only if its scheme is safe to link to.
pub fn sanitize_href(target: &str) -> Option<String> {
    let target = target.trim();
    if target.is_empty() {
        return None;
    }

    let url = match Url::parse(target) {
        Ok(url) if ALLOWED_SCHEMES.contains(&url.scheme()) => url,
        // `host:port/path` parses with the host as its scheme.
        Ok(url) if !REFUSED_SCHEMES.contains(&url.scheme()) && is_host_with_port(target) => {
            Url::parse(&format!("https://{target}")).ok()?
        }
        Ok(_) => return None,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("https://{target}")).ok()?
        }
        Err(_) => return None,
    };

    ALLOWED_SCHEMES.contains(&url.scheme()).then(|| url.to_string())
}

fn is_host_with_port(target: &str) -> bool {
    !target.contains("://")
        && target
            .split_once(':')
            .is_some_and(|(_, rest)| rest.starts_with(|c: char| c.is_ascii_digit()))
}

/// Escapes `text` for use in HTML element content.
pub fn escape(text: &str) -> String {
    encode_text(text).into_owned()
}
