//! JSON definition loader
//!
//! Reads definition documents from a directory or from memory and compiles
//! each one on its own, so a broken document only fails itself.

use crate::compiler::compile;
use crate::document::DefinitionDocument;
use crate::strategy::StrategyLoader;
use std::path::Path;
use workflow_types::{DefinitionLoader, WorkflowDefinition, WorkflowError, WorkflowResult};

/// One document waiting to be compiled
#[derive(Clone, Debug)]
struct Source {
    name: String,
    text: Result<String, String>,
}

/// [`DefinitionLoader`] over JSON definition documents
#[derive(Debug)]
pub struct JsonDefinitionLoader {
    sources: Vec<Source>,
    strategies: StrategyLoader,
}

impl JsonDefinitionLoader {
    /// Load from in-memory `(source name, JSON text)` pairs
    pub fn from_documents<I, N, T>(documents: I, strategies: StrategyLoader) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: Into<String>,
    {
        let sources = documents
            .into_iter()
            .map(|(name, text)| Source {
                name: name.into(),
                text: Ok(text.into()),
            })
            .collect();
        Self {
            sources,
            strategies,
        }
    }

    /// Load every `*.json` file in `dir`, in file-name order
    pub fn from_dir(dir: impl AsRef<Path>, strategies: StrategyLoader) -> WorkflowResult<Self> {
        let dir = dir.as_ref();
        let unreadable = |e: std::io::Error| WorkflowError::InvalidDocument {
            source_name: dir.display().to_string(),
            reason: e.to_string(),
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(unreadable)? {
            let path = entry.map_err(unreadable)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let sources = paths
            .into_iter()
            .map(|path| Source {
                name: path.display().to_string(),
                text: std::fs::read_to_string(&path).map_err(|e| e.to_string()),
            })
            .collect::<Vec<_>>();

        tracing::debug!(dir = %dir.display(), documents = sources.len(), "Found definition documents");
        Ok(Self {
            sources,
            strategies,
        })
    }

    /// Number of documents this loader will compile
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn load_one(&self, source: &Source) -> WorkflowResult<WorkflowDefinition> {
        let text = source
            .text
            .as_deref()
            .map_err(|reason| WorkflowError::InvalidDocument {
                source_name: source.name.clone(),
                reason: reason.to_string(),
            })?;
        let document = DefinitionDocument::from_json(&source.name, text)?;
        compile(&document, &self.strategies)
    }
}

impl DefinitionLoader for JsonDefinitionLoader {
    fn load(&self) -> Vec<WorkflowResult<WorkflowDefinition>> {
        self.sources
            .iter()
            .map(|source| {
                let result = self.load_one(source);
                if let Err(e) = &result {
                    tracing::warn!(source = %source.name, error = %e, "Failed to load workflow definition");
                }
                result
            })
            .collect()
    }
}
