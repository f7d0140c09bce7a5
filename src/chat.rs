//! `paperchat chat`: a line-oriented conversation on stdin.
//!
//! Plain lines are questions. Lines starting with `/` are commands:
//!
//! | Command | Effect |
//! |---------|--------|
//! | `/upload <path>...` | Ingest PDF files or directories |
//! | `/model <name>` | Switch the answer model |
//! | `/models` | List available answer models |
//! | `/files` | List processed documents |
//! | `/history` | Show the conversation so far |
//! | `/clear` | Delete all indexed data and the conversation |
//! | `/help` | Show commands |
//! | `/quit` | Leave |

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use paperchat_core::models::Role;

use crate::ask::{ask, print_answer};
use crate::config::Config;
use crate::ingest::{ingest_documents, load_documents, print_report};
use crate::models_cmd::print_models;
use crate::session::{open_session, PaperSession};

const HELP: &str = "\
Commands:
  /upload <path>...   ingest PDF files or directories
  /model <name>       switch the answer model
  /models             list available answer models
  /files              list processed documents
  /history            show the conversation
  /clear              delete all indexed data and the conversation
  /help               show this help
  /quit               leave
Anything else is asked as a question about your documents.";

#[derive(Debug, PartialEq)]
enum ChatCommand {
    Upload(Vec<PathBuf>),
    Model(Option<String>),
    Models,
    Files,
    History,
    Clear,
    Help,
    Quit,
    Question(String),
    Empty,
    Unknown(String),
}

fn parse_line(line: &str) -> ChatCommand {
    let line = line.trim();
    if line.is_empty() {
        return ChatCommand::Empty;
    }
    if !line.starts_with('/') {
        return ChatCommand::Question(line.to_string());
    }

    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();
    match command {
        "/upload" => ChatCommand::Upload(args.iter().map(PathBuf::from).collect()),
        "/model" => ChatCommand::Model(args.first().map(|s| s.to_string())),
        "/models" => ChatCommand::Models,
        "/files" => ChatCommand::Files,
        "/history" => ChatCommand::History,
        "/clear" => ChatCommand::Clear,
        "/help" => ChatCommand::Help,
        "/quit" | "/exit" => ChatCommand::Quit,
        other => ChatCommand::Unknown(other.to_string()),
    }
}

pub async fn run_chat(config: &Config, model: Option<&str>) -> Result<()> {
    let mut session = open_session(config).await?;
    if let Some(model) = model {
        session.select_model(model)?;
    }

    println!(
        "paperchat: answering with {} over {} document(s). Type /help for commands.",
        session.current_model(),
        session.processed_documents().len()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_line(&line) {
            ChatCommand::Quit => break,
            command => handle(&mut session, command).await,
        }
    }

    Ok(())
}

async fn handle(session: &mut PaperSession, command: ChatCommand) {
    match command {
        ChatCommand::Empty | ChatCommand::Quit => {}
        ChatCommand::Question(question) => match ask(session, &question).await {
            Ok(answer) => print_answer(&answer),
            Err(e) => eprintln!("Error: {:#}", e),
        },
        ChatCommand::Upload(paths) => {
            if paths.is_empty() {
                eprintln!("Usage: /upload <path>...");
                return;
            }
            let documents = match load_documents(&paths) {
                Ok(documents) => documents,
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    return;
                }
            };
            match ingest_documents(session, documents).await {
                Ok(report) => print_report(&report),
                Err(e) => eprintln!("Error: {:#}", e),
            }
        }
        ChatCommand::Model(None) => println!("Current model: {}", session.current_model()),
        ChatCommand::Model(Some(name)) => match session.select_model(&name) {
            Ok(()) => println!("Answer model: {}", session.current_model()),
            Err(e) => eprintln!("Error: {}", e),
        },
        ChatCommand::Models => print_models(session.available_models(), session.current_model()),
        ChatCommand::Files => match session.documents().await {
            Ok(documents) if documents.is_empty() => println!("No documents processed yet."),
            Ok(documents) => {
                for doc in documents {
                    println!("  {} ({} chunks)", doc.name, doc.chunk_count);
                }
            }
            Err(e) => eprintln!("Error: {}", e),
        },
        ChatCommand::History => {
            for turn in session.history() {
                let who = match turn.role {
                    Role::User => "you",
                    Role::Assistant => "assistant",
                };
                println!("{}: {}", who, turn.content);
            }
        }
        ChatCommand::Clear => match session.clear().await {
            Ok(()) => println!("All data cleared."),
            Err(e) => eprintln!("Error: {}", e),
        },
        ChatCommand::Help => println!("{}", HELP),
        ChatCommand::Unknown(command) => {
            eprintln!("Unknown command {}. Type /help for commands.", command)
        }
    }
}
