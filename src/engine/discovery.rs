// * URL discovery for site-wide audits
// * sitemap.xml -> sitemap_index.xml -> well-known pages

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, Event};
use quick_xml::Reader;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::config::constants::MAX_DISCOVERED_URLS;
use crate::engine::normalization::site_url;
use crate::network::PageSource;

const SITEMAP_PATHS: [&str; 2] = ["/sitemap.xml", "/sitemap_index.xml"];
const FALLBACK_PATHS: [&str; 5] = ["/", "/about", "/contact", "/products", "/services"];

/// Extracts `<url><loc>` entries in document order, deduplicated.
/// Text and CDATA both count; parsing stops at the first malformed element.
pub fn parse_sitemap_locs(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut seen = HashSet::new();
    let mut locs = Vec::new();
    let mut in_url = false;
    let mut current: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"url" => in_url = true,
                b"loc" if in_url => current = Some(String::new()),
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"url" => in_url = false,
                b"loc" => {
                    if let Some(loc) = current.take() {
                        let loc = loc.trim().to_string();
                        if !loc.is_empty() && seen.insert(loc.clone()) {
                            locs.push(loc);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let Some(loc) = current.as_mut() {
                    match e.decode() {
                        Ok(text) => loc.push_str(&text),
                        Err(err) => debug!(position = reader.buffer_position(), error = %err, "Undecodable sitemap text"),
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(loc) = current.as_mut() {
                    loc.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if let Some(loc) = current.as_mut() {
                    push_entity(loc, &e);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!(position = reader.buffer_position(), error = %e, "Malformed sitemap XML");
                break;
            }
            _ => {}
        }
        buf.clear();
    }
    locs
}

// * `&amp;` and friends arrive as separate events
fn push_entity(out: &mut String, entity: &BytesRef) {
    if let Ok(Some(ch)) = entity.resolve_char_ref() {
        out.push(ch);
        return;
    }
    if let Ok(name) = entity.decode() {
        match resolve_predefined_entity(&name) {
            Some(value) => out.push_str(value),
            None => {
                out.push('&');
                out.push_str(&name);
                out.push(';');
            }
        }
    }
}

/// Finds up to 50 URLs for `domain`.
///
/// The first sitemap that responds wins, even when it lists nothing;
/// an empty result falls back to a handful of common pages.
pub async fn discover_urls(source: &dyn PageSource, domain: &str) -> Vec<String> {
    let mut urls = Vec::new();

    for path in SITEMAP_PATHS {
        let Some(sitemap_url) = site_url(domain, path) else {
            continue;
        };
        match source.fetch_page(&sitemap_url).await {
            Ok(page) => {
                urls = parse_sitemap_locs(&page.body);
                debug!(sitemap = %sitemap_url, count = urls.len(), "Sitemap read");
                break;
            }
            Err(e) => debug!(sitemap = %sitemap_url, error = %e, "Sitemap unavailable"),
        }
    }

    if urls.is_empty() {
        urls = FALLBACK_PATHS
            .iter()
            .filter_map(|path| site_url(domain, path))
            .collect();
    }

    urls.truncate(MAX_DISCOVERED_URLS);
    info!(domain = %domain, count = urls.len(), "URLs discovered");
    urls
}
