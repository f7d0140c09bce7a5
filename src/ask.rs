//! `paperchat ask`: one question, one answer, with sources.

use anyhow::Result;

use paperchat_core::answer::Answer;
use paperchat_core::Error;

use crate::config::Config;
use crate::search::excerpt;
use crate::session::{open_session, PaperSession};

/// Characters of each source chunk shown under an answer.
pub const SOURCE_PREVIEW_CHARS: usize = 300;

pub async fn run_ask(config: &Config, question: &str, model: Option<&str>) -> Result<()> {
    let mut session = open_session(config).await?;
    if let Some(model) = model {
        session.select_model(model)?;
    }

    let answer = ask(&mut session, question).await?;
    print_answer(&answer);
    Ok(())
}

/// Ask through the session, labelling generation failures the way the
/// conversation records them.
pub async fn ask(session: &mut PaperSession, question: &str) -> Result<Answer> {
    match session.ask(question).await {
        Ok(answer) => Ok(answer),
        Err(e @ Error::Generation(_)) | Err(e @ Error::Retrieval(_)) => {
            Err(anyhow::Error::new(e).context("Error generating response"))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn print_answer(answer: &Answer) {
    println!("{}", answer.text);
    if answer.sources.is_empty() {
        return;
    }
    println!();
    println!("Sources:");
    for (i, source) in answer.sources.iter().enumerate() {
        println!("  [{}] {}", i + 1, excerpt(source, SOURCE_PREVIEW_CHARS).replace('\n', " "));
    }
}
