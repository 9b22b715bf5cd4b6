//! Capturing text to summarize, and the slots it is stored in.
//!
//! A capture is either the user's selection, used verbatim, or the visible
//! text of a page. It is stored as the latest capture and read back by the
//! summarize step.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::extract::{IgnoreRules, extract_document};
use crate::parse::Document;
use crate::settings::{APP_DIR, read_json, write_json};
use crate::text::is_blank;
use crate::{PrecisError, Result};

/// Stored in place of the text when a page yields nothing.
pub const NO_TEXT_PLACEHOLDER: &str =
    "Could not extract any text from this page. It might be protected, empty, or an unsupported format.";

/// Shown to the summarize step when no capture text is available.
pub const NO_CAPTURE_PLACEHOLDER: &str = "No content extracted. Please try selecting text or reloading the page.";

/// Where the text to summarize comes from.
pub enum CaptureSource<'d> {
    /// Text the user selected; the extractor is bypassed.
    Selection { text: String, url: Option<String>, title: Option<String> },
    /// A parsed page whose body is extracted.
    Page { document: &'d Document, url: Option<String> },
}

/// The latest capture: extracted text plus where it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capture {
    #[serde(rename = "currentExtractedText")]
    pub extracted_text: String,
    pub source_url: Option<String>,
    pub source_title: Option<String>,
}

impl Capture {
    /// The text to send for summarization, with a placeholder when empty.
    pub fn text_or_placeholder(&self) -> &str {
        if is_blank(&self.extracted_text) { NO_CAPTURE_PLACEHOLDER } else { &self.extracted_text }
    }

    /// Whether the stored text is the "nothing extracted" placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.extracted_text == NO_TEXT_PLACEHOLDER
    }
}

/// Produces a capture from a selection or a page.
///
/// A blank result is replaced by [`NO_TEXT_PLACEHOLDER`].
pub fn capture(source: CaptureSource<'_>, rules: &IgnoreRules) -> Capture {
    let (text, source_url, source_title) = match source {
        CaptureSource::Selection { text, url, title } => {
            debug!(chars = text.chars().count(), "using selection text");
            (text, url, title)
        }
        CaptureSource::Page { document, url } => {
            let text = extract_document(document, rules);
            debug!(chars = text.chars().count(), "extracted page text");
            (text, url, document.title())
        }
    };

    let extracted_text = if is_blank(&text) {
        warn!("no text extracted");
        NO_TEXT_PLACEHOLDER.to_string()
    } else {
        text
    };

    Capture { extracted_text, source_url, source_title }
}

/// Persists the latest [`Capture`] as JSON.
#[derive(Debug, Clone)]
pub struct CaptureStore {
    path: PathBuf,
}

impl CaptureStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store at `<data_dir>/precis/capture.json`.
    pub fn default_location() -> Result<Self> {
        let dir =
            dirs::data_dir().ok_or_else(|| PrecisError::ConfigError("no data directory on this platform".to_string()))?;
        Ok(Self::new(dir.join(APP_DIR).join("capture.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored capture, or `None` if nothing has been captured yet.
    pub fn load(&self) -> Result<Option<Capture>> {
        if !self.path.exists() {
            return Ok(None);
        }
        read_json(&self.path).map(Some)
    }

    pub fn save(&self, capture: &Capture) -> Result<()> {
        write_json(&self.path, capture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_selection_bypasses_extractor() {
        let capture = capture(
            CaptureSource::Selection {
                text: "  <script>kept verbatim</script>  ".to_string(),
                url: Some("https://example.com".to_string()),
                title: None,
            },
            &IgnoreRules::default(),
        );
        assert_eq!(capture.extracted_text, "  <script>kept verbatim</script>  ");
        assert_eq!(capture.source_url.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_page_capture_takes_title() {
        let doc = Document::parse("<html><head><title>Post</title></head><body><p>Hello</p></body></html>");
        let capture = capture(CaptureSource::Page { document: &doc, url: None }, &IgnoreRules::default());
        assert_eq!(capture.extracted_text, "Hello");
        assert_eq!(capture.source_title.as_deref(), Some("Post"));
    }

    #[test]
    fn test_blank_capture_gets_placeholder() {
        let doc = Document::parse("<body><nav>Only chrome</nav></body>");
        let capture = capture(CaptureSource::Page { document: &doc, url: None }, &IgnoreRules::default());
        assert_eq!(capture.extracted_text, NO_TEXT_PLACEHOLDER);
        assert!(capture.is_placeholder());

        let selection =
            super::capture(CaptureSource::Selection { text: " \n".to_string(), url: None, title: None }, &IgnoreRules::none());
        assert!(selection.is_placeholder());
    }

    #[test]
    fn test_text_or_placeholder() {
        assert_eq!(Capture::default().text_or_placeholder(), NO_CAPTURE_PLACEHOLDER);
        let capture = Capture { extracted_text: "abc".to_string(), ..Default::default() };
        assert_eq!(capture.text_or_placeholder(), "abc");
    }

    #[test]
    fn test_slot_names() {
        let capture = Capture {
            extracted_text: "t".to_string(),
            source_url: Some("u".to_string()),
            source_title: Some("s".to_string()),
        };
        let json = serde_json::to_value(&capture).unwrap();
        assert_eq!(json["currentExtractedText"], "t");
        assert_eq!(json["sourceUrl"], "u");
        assert_eq!(json["sourceTitle"], "s");
    }

    #[test]
    fn test_store() {
        let tmp = TempDir::new().unwrap();
        let store = CaptureStore::new(tmp.path().join("capture.json"));
        assert_eq!(store.load().unwrap(), None);

        let capture = Capture { extracted_text: "saved".to_string(), ..Default::default() };
        store.save(&capture).unwrap();
        assert_eq!(store.load().unwrap(), Some(capture));
    }
}
