//! `paperchat search`: retrieval without answer generation.

use anyhow::Result;

use paperchat_core::models::ScoredChunk;

use crate::config::Config;
use crate::session::open_session;

const EXCERPT_CHARS: usize = 240;

pub async fn run_search(config: &Config, query: &str, k: Option<usize>, json: bool) -> Result<()> {
    let session = open_session(config).await?;
    let hits = session.retrieve(query, k).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (rank, hit) in hits.iter().enumerate() {
        print_hit(rank + 1, hit);
    }
    Ok(())
}

fn print_hit(rank: usize, hit: &ScoredChunk) {
    println!(
        "{}. [{:.4}] {} (chunk {})",
        rank, hit.score, hit.document_name, hit.chunk_index
    );
    println!("    {}", excerpt(&hit.text, EXCERPT_CHARS).replace('\n', " "));
    println!();
}

/// First `max` characters of `text`, with `...` appended when cut.
pub fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}
