//! Interactive chat and one-shot send
//!
//! Both load the session first so the controller has a current session to
//! route through, then hand user input to [`SessionController::send`].
//! After each send the controller has already refetched the log, so the
//! reply is printed from the reconciled messages.
//!
//! [`SessionController::send`]: crate::session::SessionController::send

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use serde_json::Value;

use crate::commands::sessions::{print_message, print_messages};
use crate::commands::{truncate, Backend};
use crate::error::Result;

/// Send one message and print the reply
pub async fn run_send(backend: &Backend, session_id: &str, text: &str) -> Result<()> {
    let session = backend.controller.load(session_id).await?;
    tracing::debug!(session_id = %session.id, "Sending one message");
    send_and_print(backend, text).await
}

/// Start an interactive chat in a session
pub async fn run_chat(backend: &Backend, session_id: &str) -> Result<()> {
    let controller = &backend.controller;
    let session = controller.load(session_id).await?;

    let (_, connected) = futures::join!(
        backend.providers.fetch(),
        backend.servers.fetch_connected()
    );

    println!();
    println!(
        "{} {} ({})",
        "Chatting in".bold(),
        session.title.cyan(),
        session.id
    );
    match session.llm_selection() {
        Some((provider, model)) => {
            if backend.providers.last_error().is_none() {
                if let Err(e) = backend.providers.validate_selection(provider, model) {
                    println!("{}", format!("Warning: {}", e).yellow());
                }
            }
            println!("Model: {}/{}", provider, model);
        }
        None => println!(
            "{}",
            "No provider/model configured; use `chatrpc sessions set-llm` first.".yellow()
        ),
    }
    if let Some(server_id) = &session.mcp_server_id {
        if connected.iter().any(|id| id == server_id) {
            println!("Tools: {}", server_id.green());
        } else {
            println!("Tools: {} {}", server_id, "(not connected)".yellow());
        }
    }
    println!("Commands: /title, /clear, /history, /quit");
    println!();
    print_messages(&controller.messages());

    let mut rl = DefaultEditor::new()?;
    backend
        .servers
        .start_periodic_check(backend.config.servers.status_check_interval());

    loop {
        if controller.check_timeout() {
            println!(
                "{}",
                "Session was idle for a while; reloading messages.".yellow()
            );
            controller.fetch_messages(&session.id).await;
            controller.reset_timeout();
        }

        let title = controller
            .current()
            .map(|s| s.title)
            .unwrap_or_else(|| session.title.clone());
        let prompt = format!("{}> ", truncate(&title, 24));

        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed)?;

                match trimmed {
                    "/quit" | "/exit" => break,
                    "/title" => {
                        if controller.generate_title(&session.id).await {
                            if let Some(current) = controller.current() {
                                println!("{}", format!("Title: {}", current.title).green());
                            }
                        } else {
                            let reason = controller.errors().response.unwrap_or_default();
                            eprintln!("{}", format!("Error: {}", reason).red());
                        }
                    }
                    "/clear" => match controller.clear(&session.id).await {
                        Ok(true) => println!("{}", "Messages cleared.".green()),
                        Ok(false) => eprintln!("{}", "Clear was not confirmed.".red()),
                        Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
                    },
                    "/history" => print_messages(&controller.messages()),
                    command if command.starts_with('/') => {
                        eprintln!("{}", format!("Unknown command: {}", command).red());
                    }
                    text => {
                        if let Err(e) = send_and_print(backend, text).await {
                            eprintln!("{}", format!("Error: {}", e).red());
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(e) => {
                tracing::error!("Readline error: {}", e);
                break;
            }
        }
    }

    backend.servers.stop_periodic_check();
    controller.shutdown();
    Ok(())
}

async fn send_and_print(backend: &Backend, text: &str) -> Result<()> {
    let controller = &backend.controller;
    let before = controller.messages().len();
    let response = controller.send(text).await?;

    let replies: Vec<_> = controller
        .messages()
        .into_iter()
        .skip(before)
        .filter(|m| m.role != "user")
        .collect();
    if replies.is_empty() {
        if let Some(text) = response_text(&response) {
            println!("{}", text);
            println!();
        }
    } else {
        for message in &replies {
            print_message(message);
        }
    }
    Ok(())
}

/// Assistant text in a chat or completion response.
pub(crate) fn response_text(response: &Value) -> Option<String> {
    match response {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => ["response", "content", "message"]
            .iter()
            .find_map(|key| match map.get(*key) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Object(inner)) => inner
                    .get("content")
                    .and_then(|c| c.as_str())
                    .map(str::to_string),
                _ => None,
            }),
        _ => None,
    }
}
