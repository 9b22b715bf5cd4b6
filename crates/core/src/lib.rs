pub mod capture;
pub mod error;
pub mod extract;
#[cfg(feature = "fetch")]
pub mod fetch;
pub mod node;
#[cfg(feature = "fetch")]
pub mod ollama;
pub mod parse;
pub mod prompts;
pub mod settings;
pub mod style;
pub mod text;

pub use capture::{Capture, CaptureSource, CaptureStore, NO_CAPTURE_PLACEHOLDER, NO_TEXT_PLACEHOLDER, capture};
pub use error::{PrecisError, Result};
pub use extract::{DEFAULT_IGNORE_TAGS, IgnoreRules, extract_document, extract_text};
#[cfg(feature = "fetch")]
pub use fetch::{FetchConfig, fetch_file, fetch_stdin, fetch_url};
pub use node::{NodeKind, TreeNode};
#[cfg(feature = "fetch")]
pub use ollama::OllamaClient;
pub use parse::{Document, PageNode};
pub use prompts::{PromptLibrary, SystemPrompt, truncate};
pub use settings::{Settings, SettingsStore, parse_list};
pub use style::{ComputedStyle, Display, StyleSheet, Visibility};
pub use text::collapse_whitespace;
