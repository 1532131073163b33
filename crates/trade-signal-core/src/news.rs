use std::fmt;

use serde::{Deserialize, Serialize};

/// A news headline reduced to the fields the oracle and the API expose.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: Option<String>,
    pub desc: Option<String>,
    /// Publisher name.
    pub source: Option<String>,
    pub url: Option<String>,
}

impl fmt::Display for NewsArticle {
    /// Single-line form used inside prompts: `title (source): description`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title.as_deref().unwrap_or("(untitled)"))?;
        if let Some(source) = self.source.as_deref().filter(|s| !s.is_empty()) {
            write!(f, " ({source})")?;
        }
        if let Some(desc) = self.desc.as_deref().filter(|s| !s.is_empty()) {
            write!(f, ": {desc}")?;
        }
        Ok(())
    }
}
