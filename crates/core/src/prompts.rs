//! System prompts the user can summarize with.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::{PrecisError, Result};

/// A named system prompt sent alongside the extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemPrompt {
    pub id: String,
    pub title: String,
    pub content: String,
}

/// Ordered prompt list plus the id of the prompt used when none is requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptLibrary {
    prompts: Vec<SystemPrompt>,
    default_prompt_id: Option<String>,
}

impl PromptLibrary {
    pub fn prompts(&self) -> &[SystemPrompt] {
        &self.prompts
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn default_id(&self) -> Option<&str> {
        self.default_prompt_id.as_deref()
    }

    pub fn get(&self, id: &str) -> Option<&SystemPrompt> {
        self.prompts.iter().find(|p| p.id == id)
    }

    /// Appends a prompt and returns it.
    ///
    /// The id is the current Unix time in milliseconds, bumped past any id
    /// already in use.
    ///
    /// # Errors
    ///
    /// Returns [`PrecisError::InvalidPrompt`] when the trimmed title or content is empty.
    pub fn add(&mut self, title: &str, content: &str) -> Result<&SystemPrompt> {
        let title = title.trim();
        let content = content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(PrecisError::InvalidPrompt("title and content are required".to_string()));
        }

        let mut stamp = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or_default();
        while self.get(&stamp.to_string()).is_some() {
            stamp += 1;
        }

        self.prompts.push(SystemPrompt { id: stamp.to_string(), title: title.to_string(), content: content.to_string() });
        Ok(&self.prompts[self.prompts.len() - 1])
    }

    /// Removes a prompt, clearing the default if it pointed at it.
    pub fn remove(&mut self, id: &str) -> Result<SystemPrompt> {
        let index = self
            .prompts
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| PrecisError::UnknownPrompt(id.to_string()))?;
        if self.default_prompt_id.as_deref() == Some(id) {
            self.default_prompt_id = None;
        }
        Ok(self.prompts.remove(index))
    }

    pub fn set_default(&mut self, id: &str) -> Result<()> {
        if self.get(id).is_none() {
            return Err(PrecisError::UnknownPrompt(id.to_string()));
        }
        self.default_prompt_id = Some(id.to_string());
        Ok(())
    }

    pub fn clear_default(&mut self) {
        self.default_prompt_id = None;
    }

    /// Picks the prompt to run: the requested one, else the default, else the first.
    ///
    /// # Errors
    ///
    /// [`PrecisError::UnknownPrompt`] for a requested id that does not exist,
    /// [`PrecisError::NoPrompts`] when the library is empty.
    pub fn resolve(&self, requested: Option<&str>) -> Result<&SystemPrompt> {
        if let Some(id) = requested {
            return self.get(id).ok_or_else(|| PrecisError::UnknownPrompt(id.to_string()));
        }
        self.auto_run_prompt().or_else(|| self.prompts.first()).ok_or(PrecisError::NoPrompts)
    }

    /// The default prompt, if one is set and still present.
    ///
    /// A stale default id (its prompt was deleted elsewhere) yields `None`.
    pub fn auto_run_prompt(&self) -> Option<&SystemPrompt> {
        self.default_prompt_id.as_deref().and_then(|id| self.get(id))
    }
}

/// Shortens `text` to at most `n` characters, ending in `...` when cut.
///
/// Texts longer than `n` keep their first `n - 1` characters.
pub fn truncate(text: &str, n: usize) -> String {
    if text.chars().count() > n {
        let kept: String = text.chars().take(n.saturating_sub(1)).collect();
        format!("{kept}...")
    } else {
        text.to_string()
    }
}
