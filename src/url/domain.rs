/// A set of domain substrings whose assets are never fetched
///
/// Matching is a plain substring test against the whole URL, not against the
/// host. `"b.com"` therefore also excludes `https://sub.b.com/x.js` and
/// `https://a.com/b.com/x.js`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainFilter {
    domains: Vec<String>,
}

impl DomainFilter {
    /// Creates a filter from the given domain substrings
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domains: domains.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if the URL contains any filtered domain
    ///
    /// # Examples
    ///
    /// ```
    /// use loadstorm::url::DomainFilter;
    ///
    /// let filter = DomainFilter::new(["googleapis.com"]);
    /// assert!(filter.excludes("https://fonts.googleapis.com/css?family=Roboto"));
    /// assert!(!filter.excludes("https://example.com/site.css"));
    /// ```
    pub fn excludes(&self, url: &str) -> bool {
        self.domains.iter().any(|domain| url.contains(domain.as_str()))
    }

    /// Appends another domain substring
    pub fn push(&mut self, domain: impl Into<String>) {
        self.domains.push(domain.into());
    }

    /// Returns the configured domain substrings in order
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
