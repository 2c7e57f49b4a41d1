//! Mirror endpoint templates.
//!
//! An endpoint is a URL template with a single `{cid}` slot. Templates
//! without a slot are treated as prefixes and the identifier is appended.

use std::fmt;
use std::sync::Arc;
use url::Url;

/// Substitution slot for the content identifier.
pub const CID_PLACEHOLDER: &str = "{cid}";

/// Identifier substituted when checking that a template is well formed.
const SAMPLE_CID: &str = "bafkqaaa";

/// Error type for endpoint construction and URL building.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// The template contains more than one `{cid}` slot.
    #[error("template `{0}` has more than one {{cid}} placeholder")]
    MultiplePlaceholders(String),
    /// Substitution produced something that is not a URL.
    #[error("`{url}` is not a valid URL: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    /// Only plain HTTP(S) mirrors are supported.
    #[error("template `{0}` must use http or https")]
    UnsupportedScheme(String),
}

/// A single upstream mirror.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    template: Arc<str>,
    host: Arc<str>,
}

impl Endpoint {
    /// Parse a template, appending `{cid}` when no slot is present.
    pub fn parse(template: &str) -> Result<Self, EndpointError> {
        let template = match template.matches(CID_PLACEHOLDER).count() {
            0 => format!("{template}{CID_PLACEHOLDER}"),
            1 => template.to_string(),
            _ => return Err(EndpointError::MultiplePlaceholders(template.to_string())),
        };

        let sample = parse_url(&template.replace(CID_PLACEHOLDER, SAMPLE_CID))?;
        if !matches!(sample.scheme(), "http" | "https") {
            return Err(EndpointError::UnsupportedScheme(template));
        }
        let host = match (sample.host_str(), sample.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => template.clone(),
        };

        Ok(Self {
            template: template.into(),
            host: host.into(),
        })
    }

    /// Parse every template, failing on the first bad one.
    pub fn parse_all<I, S>(templates: I) -> Result<Vec<Self>, EndpointError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        templates.into_iter().map(|t| Self::parse(t.as_ref())).collect()
    }

    /// Build the concrete URL for a content identifier.
    pub fn url_for(&self, identifier: &str) -> Result<Url, EndpointError> {
        parse_url(&self.template.replace(CID_PLACEHOLDER, identifier))
    }

    /// The normalized template, always containing exactly one slot.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Host (and port, if explicit) for logging.
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

fn parse_url(raw: &str) -> Result<Url, EndpointError> {
    Url::parse(raw).map_err(|source| EndpointError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}
