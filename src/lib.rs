//! # paperchat
//!
//! Ask questions about your PDF papers from the command line.
//!
//! PDFs are turned into text, split into overlapping chunks, embedded and
//! stored in a local SQLite index. Questions retrieve the closest chunks and
//! hand them to a local language model (Ollama) as context.
//!
//! ```text
//! ┌─────────┐   ┌───────────┐   ┌──────────┐   ┌──────────┐
//! │  PDFs   │──▶│ Extract + │──▶│  SQLite  │──▶│ Retrieve │──▶ Ollama
//! │         │   │   Chunk   │   │  vectors │   │   top k  │
//! └─────────┘   └───────────┘   └──────────┘   └──────────┘
//! ```
//!
//! The orchestration logic lives in [`paperchat_core`]; this crate supplies
//! the concrete I/O and the CLI.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Index connection and single-writer lock |
//! | [`migrate`] | Schema creation |
//! | [`sqlite_store`] | SQLite record store |
//! | [`extract`] | PDF text extraction |
//! | [`embedding`] | Local, Ollama and OpenAI embedding providers |
//! | [`generate`] | Ollama answer generator |
//! | [`http`] | Shared HTTP client and retry loop |
//! | [`session`] | Wiring configuration into a session |
//! | [`ingest`], [`search`], [`ask`], [`chat`], [`documents`], [`models_cmd`], [`clear`] | CLI commands |

pub mod ask;
pub mod chat;
pub mod clear;
pub mod config;
pub mod db;
pub mod documents;
pub mod embedding;
pub mod extract;
pub mod generate;
pub mod http;
pub mod ingest;
pub mod migrate;
pub mod models_cmd;
pub mod search;
pub mod session;
pub mod sqlite_store;

#[cfg(test)]
#[path = "../tests/support/pdf.rs"]
mod test_pdf;
