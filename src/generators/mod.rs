// * Generators: robots.txt, sitemaps, JSON-LD, social tags, meta copy and image SEO

pub mod images;
pub mod meta;
pub mod robots;
pub mod sitemap;
pub mod social;
pub mod structured_data;

pub use robots::RobotsProfile;
pub use structured_data::StructuredDataError;

/// Escapes the five XML special characters (also safe for HTML attributes)
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml(r#"<a href="x">Tom & Jerry's</a>"#), "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;");
        assert_eq!(escape_xml("plain"), "plain");
    }
}
