use serde_json::Value;
use std::path::Path;

use crate::db::{DocumentFormat, DocumentRepository};
use crate::error::Result;
use crate::session::ProjectSession;

/// Typed access to the keyed documents of a project.
pub struct DocumentService {
    repo: DocumentRepository,
}

impl DocumentService {
    pub fn new(session: &ProjectSession) -> Self {
        Self {
            repo: DocumentRepository::new(session),
        }
    }

    pub fn save_text(&self, key: &str, text: &str) -> Result<i64> {
        self.repo.upsert(key, DocumentFormat::Text, text)
    }

    /// Stored compactly; non-ASCII characters are kept as they are.
    pub fn save_json(&self, key: &str, data: &Value) -> Result<i64> {
        let content = serde_json::to_string(data)?;
        self.repo.upsert(key, DocumentFormat::Json, &content)
    }

    pub fn load_text(&self, key: &str) -> Result<Option<String>> {
        Ok(self.repo.get(key)?.map(|doc| doc.content))
    }

    /// `None` when the key is missing or its content is not valid JSON.
    pub fn load_json(&self, key: &str) -> Result<Option<Value>> {
        Ok(self
            .repo
            .get(key)?
            .and_then(|doc| serde_json::from_str(&doc.content).ok()))
    }

    pub fn export(&self, key: &str, output_path: &Path) -> Result<()> {
        self.repo.export_to_file(key, output_path)
    }
}
