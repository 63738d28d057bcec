//! Sitemap resolution
//!
//! Turns a sitemap URL into the flat list of pages a virtual user will browse.
//! Both flat `<urlset>` sitemaps and `<sitemapindex>` documents are supported;
//! an index is followed one level deep.

use crate::crawler::fetcher::Transport;
use crate::LoadstormError;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

/// `<loc>` entries of a single sitemap document, split by parent element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapDocument {
    /// `<sitemap><loc>` entries (nested sitemaps), in document order
    pub sitemaps: Vec<String>,

    /// `<url><loc>` entries (pages), in document order
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocParent {
    Sitemap,
    Url,
}

/// Parses a sitemap document and collects its `<loc>` entries
///
/// Only a `<loc>` whose direct parent is `<url>` or `<sitemap>` in the same
/// namespace is collected, so extension entries such as `<image:loc>` are
/// skipped. Namespace prefixes are otherwise ignored and `<loc>` text is
/// trimmed and unescaped. No URL validation or de-duplication happens here.
///
/// # Example
///
/// ```
/// use loadstorm::crawler::parse_sitemap;
///
/// let xml = r#"<urlset><url><loc>https://example.com/</loc></url></urlset>"#;
/// let doc = parse_sitemap(xml).unwrap();
/// assert_eq!(doc.urls, vec!["https://example.com/".to_string()]);
/// assert!(doc.sitemaps.is_empty());
/// ```
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, String> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut doc = SitemapDocument::default();
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut current_loc: Option<(LocParent, String)> = None;

    loop {
        let step = match reader.read_resolved_event() {
            Ok((ns, event)) => Ok((namespace_key(&ns), event)),
            Err(err) => Err(err),
        };
        let (namespace, event) = match step {
            Ok(resolved) => resolved,
            Err(err) => {
                return Err(format!(
                    "error at position {}: {}",
                    reader.error_position(),
                    err
                ))
            }
        };

        match event {
            Event::Start(ref e) => {
                let element = OpenElement {
                    name: e.local_name().as_ref().to_ascii_lowercase(),
                    namespace,
                };
                if element.name == b"loc" {
                    if let Some(parent) = loc_parent(stack.last(), &element) {
                        current_loc = Some((parent, String::new()));
                    }
                }
                stack.push(element);
            }
            Event::End(ref e) => {
                let name = e.local_name().as_ref().to_ascii_lowercase();
                if name == b"loc" {
                    if let Some((parent, text)) = current_loc.take() {
                        let text = text.trim().to_string();
                        match parent {
                            LocParent::Sitemap => doc.sitemaps.push(text),
                            LocParent::Url => doc.urls.push(text),
                        }
                    }
                }
                stack.pop();
            }
            Event::Text(ref e) => {
                if let Some((_, text)) = current_loc.as_mut() {
                    let unescaped = e.unescape().map_err(|err| {
                        format!("invalid text at {}: {}", reader.buffer_position(), err)
                    })?;
                    text.push_str(&unescaped);
                }
            }
            Event::CData(ref e) => {
                if let Some((_, text)) = current_loc.as_mut() {
                    text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(doc)
}

/// Element on the open-element stack: lowercased local name and namespace
struct OpenElement {
    name: Vec<u8>,
    namespace: Option<Vec<u8>>,
}

/// Identifies the namespace an element was resolved to (`None` if unbound)
fn namespace_key(ns: &ResolveResult) -> Option<Vec<u8>> {
    match ns {
        ResolveResult::Bound(namespace) => Some(namespace.0.to_vec()),
        ResolveResult::Unknown(prefix) => Some(prefix.clone()),
        ResolveResult::Unbound => None,
    }
}

/// Classifies a `<loc>` by its direct parent
///
/// The parent must be `<sitemap>` or `<url>` and share the `<loc>`'s
/// namespace.
fn loc_parent(parent: Option<&OpenElement>, loc: &OpenElement) -> Option<LocParent> {
    let parent = parent.filter(|p| p.namespace == loc.namespace)?;
    match parent.name.as_slice() {
        b"sitemap" => Some(LocParent::Sitemap),
        b"url" => Some(LocParent::Url),
        _ => None,
    }
}

/// Resolves a sitemap URL into page URLs
pub struct SitemapResolver<'a> {
    transport: &'a dyn Transport,
}

impl<'a> SitemapResolver<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// Fetches and flattens a sitemap
    ///
    /// Pages from nested sitemaps come first, in the order their `<loc>`
    /// appears in the index, followed by the top-level `<url>` entries.
    /// Duplicates and malformed entries pass through unchanged.
    ///
    /// # Errors
    ///
    /// * `LoadstormError::Fetch` - the sitemap could not be fetched or did not
    ///   return 200
    /// * `LoadstormError::SitemapParse` - the sitemap is not well-formed XML
    /// * `LoadstormError::EmptySitemap` - no page URLs were found
    pub async fn resolve(&self, sitemap_url: &str) -> Result<Vec<String>, LoadstormError> {
        let response = self
            .transport
            .get(sitemap_url)
            .await
            .map_err(|e| LoadstormError::Fetch {
                url: sitemap_url.to_string(),
                status: None,
                message: e.to_string(),
            })?;

        if !response.is_ok() {
            return Err(LoadstormError::Fetch {
                url: sitemap_url.to_string(),
                status: Some(response.status),
                message: format!("sitemap ({}) did not return 200 status", sitemap_url),
            });
        }

        let doc = parse_sitemap(&response.body).map_err(|message| LoadstormError::SitemapParse {
            url: sitemap_url.to_string(),
            message,
        })?;

        let mut urls = Vec::new();

        for nested_url in &doc.sitemaps {
            let nested = self.fetch_nested(nested_url).await;
            tracing::debug!("Nested sitemap {} listed {} urls", nested_url, nested.len());
            urls.extend(nested);
        }

        urls.extend(doc.urls);

        if urls.is_empty() {
            return Err(LoadstormError::EmptySitemap {
                url: sitemap_url.to_string(),
            });
        }

        tracing::info!(
            "Sitemap {} resolved to {} urls ({} nested sitemaps)",
            sitemap_url,
            urls.len(),
            doc.sitemaps.len()
        );

        Ok(urls)
    }

    /// Fetches one nested sitemap and returns its `<url><loc>` entries
    ///
    /// Nested sitemaps are not followed further. A nested sitemap that cannot
    /// be fetched or parsed contributes no urls.
    async fn fetch_nested(&self, url: &str) -> Vec<String> {
        let response = match self.transport.get(url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Failed to fetch nested sitemap {}: {}", url, e);
                return Vec::new();
            }
        };

        if !response.is_ok() {
            tracing::warn!(
                "Nested sitemap {} returned status {}",
                url,
                response.status
            );
            return Vec::new();
        }

        match parse_sitemap(&response.body) {
            Ok(doc) => doc.urls,
            Err(e) => {
                tracing::warn!("Failed to parse nested sitemap {}: {}", url, e);
                Vec::new()
            }
        }
    }
}
