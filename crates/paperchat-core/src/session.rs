//! Question-answering session.
//!
//! A [`Session`] owns everything that lives for one user session: the vector
//! index, the set of processed document names, the conversation history and
//! the current answer model. The extractor and answer generator are
//! injected. There is no global state; create a session at start, call
//! [`Session::clear`] to reset, drop it at the end.
//!
//! The processed set is seeded from the document names stored in the index,
//! so a session opened on an existing index can answer questions right away
//! and still skips documents ingested by an earlier session.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::answer::{Answer, AnswerGenerator};
use crate::chunk::TextSplitter;
use crate::error::{Error, Result};
use crate::extract::TextExtractor;
use crate::index::VectorIndex;
use crate::ingest::{ingest, IngestError, IngestReport};
use crate::models::{ConversationTurn, Document, DocumentSummary, ScoredChunk};
use crate::search::{context_texts, retrieve, DEFAULT_K};
use crate::store::Store;

/// Runtime-tunable session parameters.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub splitter: TextSplitter,
    pub retrieval_k: usize,
    pub answer_model: String,
    pub available_models: Vec<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            splitter: TextSplitter::default(),
            retrieval_k: DEFAULT_K,
            answer_model: "llama3".to_string(),
            available_models: ["llama3", "mistral", "llama2", "codellama"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

pub struct Session<S: Store> {
    index: VectorIndex<S>,
    extractor: Arc<dyn TextExtractor>,
    generator: Arc<dyn AnswerGenerator>,
    settings: SessionSettings,
    processed: BTreeSet<String>,
    history: Vec<ConversationTurn>,
    current_model: String,
}

impl<S: Store> Session<S> {
    pub async fn open(
        index: VectorIndex<S>,
        extractor: Arc<dyn TextExtractor>,
        generator: Arc<dyn AnswerGenerator>,
        settings: SessionSettings,
    ) -> Result<Self> {
        if settings.retrieval_k == 0 {
            return Err(Error::Config("retrieval k must be >= 1".to_string()));
        }
        if !settings.available_models.contains(&settings.answer_model) {
            return Err(Error::UnknownModel(settings.answer_model.clone()));
        }

        let processed: BTreeSet<String> = index
            .documents()
            .await?
            .into_iter()
            .map(|d| d.name)
            .collect();
        if !processed.is_empty() {
            info!(documents = processed.len(), "resuming with existing index");
        }

        Ok(Self {
            current_model: settings.answer_model.clone(),
            index,
            extractor,
            generator,
            settings,
            processed,
            history: Vec::new(),
        })
    }

    /// Ingest a batch of uploaded documents.
    ///
    /// On an index write failure the error still carries the per-document
    /// extraction failures of the batch.
    pub async fn process_documents(
        &mut self,
        documents: Vec<Document>,
    ) -> std::result::Result<IngestReport, IngestError> {
        ingest(
            documents,
            &mut self.processed,
            &self.index,
            self.extractor.as_ref(),
            &self.settings.splitter,
        )
        .await
    }

    /// Answer a question from the indexed documents.
    ///
    /// Blank questions and questions asked before any document is processed
    /// are rejected without touching the history. A failure after that point
    /// is recorded as a failed assistant turn and returned; the index and
    /// processed set are left as they were, so the question can be retried.
    pub async fn ask(&mut self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuery);
        }
        if self.processed.is_empty() {
            return Err(Error::RetrievalPrecondition);
        }

        self.history.push(ConversationTurn::user(question));

        let result = self.answer(question).await;
        match &result {
            Ok(answer) => self.history.push(ConversationTurn::assistant(
                answer.text.clone(),
                answer.sources.clone(),
            )),
            Err(e) => {
                warn!(model = %self.current_model, "{}", e);
                self.history
                    .push(ConversationTurn::failed(format!("Error generating response: {}", e)));
            }
        }
        result
    }

    /// Retrieve the chunks most similar to `query` without generating an
    /// answer. `k` defaults to the session's retrieval k.
    ///
    /// Subject to the same guards as [`ask`](Self::ask); nothing is recorded.
    pub async fn retrieve(&self, query: &str, k: Option<usize>) -> Result<Vec<ScoredChunk>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::EmptyQuery);
        }
        if self.processed.is_empty() {
            return Err(Error::RetrievalPrecondition);
        }
        retrieve(&self.index, query, k.unwrap_or(self.settings.retrieval_k)).await
    }

    async fn answer(&self, question: &str) -> Result<Answer> {
        let hits = retrieve(&self.index, question, self.settings.retrieval_k).await?;
        let context = context_texts(&hits);
        let answer = self
            .generator
            .generate(&self.current_model, question, &context)
            .await?;
        Ok(answer)
    }

    /// Switch the answer model. Ingested data is unaffected.
    pub fn select_model(&mut self, name: &str) -> Result<()> {
        if !self.settings.available_models.iter().any(|m| m == name) {
            return Err(Error::UnknownModel(name.to_string()));
        }
        if self.current_model != name {
            info!(from = %self.current_model, to = %name, "switched answer model");
            self.current_model = name.to_string();
        }
        Ok(())
    }

    /// Discard the index, the processed set and the conversation.
    pub async fn clear(&mut self) -> Result<()> {
        self.index.reset().await?;
        self.processed.clear();
        self.history.clear();
        Ok(())
    }

    /// Processed document names, sorted.
    pub fn processed_documents(&self) -> Vec<&str> {
        self.processed.iter().map(String::as_str).collect()
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn current_model(&self) -> &str {
        &self.current_model
    }

    pub fn available_models(&self) -> &[String] {
        &self.settings.available_models
    }

    pub fn index(&self) -> &VectorIndex<S> {
        &self.index
    }

    /// Indexed documents with their chunk counts.
    pub async fn documents(&self) -> Result<Vec<DocumentSummary>> {
        self.index.documents().await
    }
}
