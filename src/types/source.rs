use serde::{Deserialize, Serialize};

/// A citation attached to an assistant answer.
///
/// When `url` is present the title is displayed as a hyperlink; otherwise it
/// is displayed as plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Display text for the citation.
    pub title: String,

    /// Optional link to the cited material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Source {
    /// Creates a source without a link.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: None,
        }
    }

    /// Creates a source that links to `url`.
    pub fn with_url(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: Some(url.into()),
        }
    }

    /// Returns the link, ignoring blank values.
    pub fn link(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_without_url_deserializes() {
        let json = serde_json::json!({"title": "Notes"});
        let source: Source = serde_json::from_value(json).unwrap();
        assert_eq!(source, Source::new("Notes"));
        assert_eq!(source.link(), None);
    }

    #[test]
    fn null_and_blank_urls_are_not_links() {
        let json = serde_json::json!({"title": "Lecture 2", "url": null});
        let source: Source = serde_json::from_value(json).unwrap();
        assert_eq!(source.link(), None);

        let source = Source::with_url("Lecture 3", "   ");
        assert_eq!(source.link(), None);
    }

    #[test]
    fn source_serialization_skips_missing_url() {
        let json = serde_json::to_value(Source::new("Notes")).unwrap();
        assert_eq!(json, serde_json::json!({"title": "Notes"}));
    }
}
