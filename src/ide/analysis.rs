//! AnalysisHost and Analysis: document state and the queries over it.
//!
//! The `AnalysisHost` owns every open document and the shared type
//! collaborators. Queries run against an `Analysis` snapshot so that one
//! request sees a consistent set of documents.
//!
//! ## Usage
//!
//! ```ignore
//! let mut host = AnalysisHost::new(Arc::new(TypeCache::new()), Arc::new(NoNamespaces));
//! host.set_document("items.html", "{#for item in items}{item.name}{/for}");
//!
//! let analysis = host.analysis();
//! let diagnostics = analysis.diagnostics("items.html", &cancel)?;
//! ```

use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use text_size::{TextRange, TextSize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::base::AnalysisError;
use crate::hir::{
    DataModel, Diagnostic, NamespaceResolver, TypeProvider, Validation, ValidationEnv,
    ValidationSettings, validate,
};
use crate::parser::parse;
use crate::syntax::{NodeId, Template};

use super::navigation::{self, HoverResult, PartAt};

/// One open document.
#[derive(Clone)]
struct Document {
    template: Arc<Template>,
    data_model: Arc<DataModel>,
    project: Option<SmolStr>,
}

impl Document {
    fn new(template: Template) -> Self {
        Self {
            template: Arc::new(template),
            data_model: Arc::new(DataModel::new()),
            project: None,
        }
    }
}

/// Owns all mutable state for the IDE layer.
///
/// Apply changes via `set_document()` and `remove_document()`,
/// then get a consistent snapshot via `analysis()`.
#[derive(Clone)]
pub struct AnalysisHost {
    documents: FxHashMap<SmolStr, Document>,
    provider: Arc<dyn TypeProvider>,
    namespaces: Arc<dyn NamespaceResolver>,
    settings: ValidationSettings,
}

impl AnalysisHost {
    pub fn new(provider: Arc<dyn TypeProvider>, namespaces: Arc<dyn NamespaceResolver>) -> Self {
        Self {
            documents: FxHashMap::default(),
            provider,
            namespaces,
            settings: ValidationSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ValidationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn set_settings(&mut self, settings: ValidationSettings) {
        self.settings = settings;
    }

    pub fn settings(&self) -> &ValidationSettings {
        &self.settings
    }

    /// Parse `text` and store it under `uri`. A replaced document keeps its
    /// data model and project.
    pub fn set_document(&mut self, uri: &str, text: &str) {
        let template = parse(text);
        self.store(uri, template);
    }

    /// Parse many documents in parallel.
    pub fn set_documents<I, U, T>(&mut self, documents: I)
    where
        I: IntoIterator<Item = (U, T)>,
        U: AsRef<str> + Sync,
        T: AsRef<str> + Sync,
    {
        let documents: Vec<(U, T)> = documents.into_iter().collect();
        let parsed: Vec<(&str, Template)> = documents
            .par_iter()
            .map(|(uri, text)| (uri.as_ref(), parse(text.as_ref())))
            .collect();
        for (uri, template) in parsed {
            self.store(uri, template);
        }
    }

    fn store(&mut self, uri: &str, template: Template) {
        debug!(uri, nodes = template.node_count(), "document updated");
        match self.documents.get_mut(uri) {
            Some(document) => document.template = Arc::new(template),
            None => {
                self.documents
                    .insert(SmolStr::new(uri), Document::new(template));
            }
        }
    }

    pub fn set_data_model(&mut self, uri: &str, data_model: DataModel) -> Result<(), AnalysisError> {
        self.document_mut(uri)?.data_model = Arc::new(data_model);
        Ok(())
    }

    /// Scope key passed to the type provider for this document.
    pub fn set_project(&mut self, uri: &str, project: &str) -> Result<(), AnalysisError> {
        self.document_mut(uri)?.project = Some(SmolStr::new(project));
        Ok(())
    }

    /// Returns whether the document existed.
    pub fn remove_document(&mut self, uri: &str) -> bool {
        self.documents.remove(uri).is_some()
    }

    pub fn has_document(&self, uri: &str) -> bool {
        self.documents.contains_key(uri)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn template(&self, uri: &str) -> Option<Arc<Template>> {
        self.documents.get(uri).map(|d| Arc::clone(&d.template))
    }

    /// Get a consistent snapshot for querying.
    pub fn analysis(&self) -> Analysis<'_> {
        Analysis {
            documents: &self.documents,
            provider: self.provider.as_ref(),
            namespaces: self.namespaces.as_ref(),
            settings: &self.settings,
        }
    }

    fn document_mut(&mut self, uri: &str) -> Result<&mut Document, AnalysisError> {
        self.documents
            .get_mut(uri)
            .ok_or_else(|| AnalysisError::UnknownDocument(SmolStr::new(uri)))
    }
}

/// Read-only view of an [`AnalysisHost`].
#[derive(Clone, Copy)]
pub struct Analysis<'a> {
    documents: &'a FxHashMap<SmolStr, Document>,
    provider: &'a dyn TypeProvider,
    namespaces: &'a dyn NamespaceResolver,
    settings: &'a ValidationSettings,
}

impl<'a> Analysis<'a> {
    fn document(&self, uri: &str) -> Result<&'a Document, AnalysisError> {
        self.documents
            .get(uri)
            .ok_or_else(|| AnalysisError::UnknownDocument(SmolStr::new(uri)))
    }

    pub fn template(&self, uri: &str) -> Result<&'a Template, AnalysisError> {
        Ok(&self.document(uri)?.template)
    }

    /// Run one validation pass over a document.
    pub fn validate(&self, uri: &str, cancel: &CancellationToken) -> Result<Validation, AnalysisError> {
        let document = self.document(uri)?;
        let mut env = ValidationEnv::new(
            self.provider,
            self.namespaces,
            &document.data_model,
            self.settings,
        );
        if let Some(project) = &document.project {
            env = env.with_project(project);
        }
        validate(&document.template, &env, cancel)
    }

    /// Diagnostics of one pass; pending lookups are not awaited.
    pub fn diagnostics(
        &self,
        uri: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Diagnostic>, AnalysisError> {
        Ok(self.validate(uri, cancel)?.diagnostics)
    }

    /// Diagnostics of every document, validated in parallel, ordered by uri.
    pub fn diagnostics_all(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<(SmolStr, Vec<Diagnostic>)>, AnalysisError> {
        let mut all: Vec<(SmolStr, Vec<Diagnostic>)> = self
            .documents
            .par_iter()
            .map(|(uri, _)| Ok((uri.clone(), self.diagnostics(uri, cancel)?)))
            .collect::<Result<_, AnalysisError>>()?;
        all.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(all)
    }

    /// Validate until no lookup is pending, awaiting pending lookups between
    /// passes. Diagnostics are only reported once every dependency settled.
    pub async fn settled_diagnostics(
        &self,
        uri: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Diagnostic>, AnalysisError> {
        loop {
            let validation = self.validate(uri, cancel)?;
            if validation.is_complete() {
                return Ok(validation.diagnostics);
            }
            debug!(uri, pending = validation.pending.len(), "awaiting pending lookups");
            tokio::select! {
                _ = cancel.cancelled() => return Err(AnalysisError::Cancelled),
                _ = validation.wait_for_pending() => {}
            }
        }
    }

    /// Deepest node containing `offset`.
    pub fn node_at(&self, uri: &str, offset: TextSize) -> Result<NodeId, AnalysisError> {
        Ok(self.template(uri)?.find_node_at(offset))
    }

    pub fn matching_tag(&self, uri: &str, offset: TextSize) -> Result<Option<TextRange>, AnalysisError> {
        Ok(navigation::matching_tag(self.template(uri)?, offset))
    }

    pub fn part_at(&self, uri: &str, offset: TextSize) -> Result<Option<PartAt<'a>>, AnalysisError> {
        Ok(navigation::part_at(self.template(uri)?, offset))
    }

    pub fn hover(
        &self,
        uri: &str,
        offset: TextSize,
        cancel: &CancellationToken,
    ) -> Result<Option<HoverResult>, AnalysisError> {
        let validation = self.validate(uri, cancel)?;
        Ok(navigation::hover(self.template(uri)?, &validation, offset))
    }
}
