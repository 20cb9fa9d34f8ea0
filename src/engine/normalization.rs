use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;
use url::Url;

// * Tracking parameters dropped before URLs are compared or stored.
static TRACKING_PARAMS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "utm_source", "utm_medium", "utm_campaign", "utm_term", "utm_content",
        "gclid", "fbclid", "ref", "yclid", "_ga",
    ]
    .into()
});

// * Normalizes a URL to a deterministic representation.
// * Used for link classification, sitemap discovery and history keys.
// *
// * 1. Join href with base_url.
// * 2. Strip fragment.
// * 3. Lowercase host.
// * 4. Drop tracking parameters.
// * 5. Sort remaining query parameters.
pub fn normalize_url(href: &str, base_url: &str) -> Option<String> {
    let base = Url::parse(base_url).ok()?;
    let mut url = base.join(href.trim()).ok()?;

    url.set_fragment(None);

    if let Some(host) = url.host_str() {
        let lower_host = host.to_lowercase();
        url.set_host(Some(&lower_host)).ok()?;
    }

    let clean_pairs: BTreeMap<String, String> = url
        .query_pairs()
        .filter(|(k, _)| !TRACKING_PARAMS.contains(k.to_lowercase().as_str()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if clean_pairs.is_empty() {
        url.set_query(None);
    } else {
        let mut serializer = url.query_pairs_mut();
        serializer.clear();
        for (k, v) in clean_pairs {
            serializer.append_pair(&k, &v);
        }
    }

    Some(url.to_string())
}

/// Where a link on a page points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Internal,
    External,
    /// mailto:, tel:, javascript: and unparseable hrefs
    Other,
}

// * Classifies `href` relative to the page it was found on.
// * "www." is ignored so example.com and www.example.com count as one site.
pub fn classify_link(href: &str, page_url: &str) -> LinkKind {
    let Some(resolved) = normalize_url(href, page_url).and_then(|u| Url::parse(&u).ok()) else {
        return LinkKind::Other;
    };
    if !matches!(resolved.scheme(), "http" | "https") {
        return LinkKind::Other;
    }

    let page_host = Url::parse(page_url)
        .ok()
        .and_then(|u| u.host_str().map(bare_host));
    let link_host = resolved.host_str().map(bare_host);

    match (page_host, link_host) {
        (Some(a), Some(b)) if a == b => LinkKind::Internal,
        _ => LinkKind::External,
    }
}

fn bare_host(host: &str) -> String {
    let lower = host.to_lowercase();
    lower.strip_prefix("www.").map(str::to_string).unwrap_or(lower)
}

// * Builds "https://domain/path" from a bare domain or a full origin.
pub fn site_url(domain: &str, path: &str) -> Option<String> {
    let origin = if domain.starts_with("http://") || domain.starts_with("https://") {
        domain.to_string()
    } else {
        format!("https://{}", domain.trim_end_matches('/'))
    };
    normalize_url(path, &origin)
}

// * Host without scheme or port; accepts bare domains too.
pub fn host_of(url_or_domain: &str) -> Option<String> {
    let candidate = if url_or_domain.contains("://") {
        url_or_domain.to_string()
    } else {
        format!("https://{}", url_or_domain)
    };
    Url::parse(&candidate)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}
