use colored::Colorize;
use prettytable::{format, Table};

use crate::cli::SessionCommand;
use crate::commands::{format_millis, truncate, Backend};
use crate::error::Result;
use crate::session::{DeliveryStatus, Message, Session, SyncState};

/// Handle session commands
pub async fn handle_sessions(backend: &Backend, command: SessionCommand) -> Result<()> {
    let controller = &backend.controller;

    match command {
        SessionCommand::List => {
            let Some(sessions) = controller.list().await else {
                let reason = controller.errors().list.unwrap_or_default();
                anyhow::bail!("Failed to list sessions: {}", reason);
            };

            if sessions.is_empty() {
                println!("{}", "No sessions found.".yellow());
                return Ok(());
            }
            print_session_table(&sessions);
        }
        SessionCommand::Create {
            title,
            provider,
            model,
            server,
        } => {
            if let (Some(p), Some(m)) = (&provider, &model) {
                validate_llm(backend, p, m).await?;
            }
            let session = controller
                .create(
                    title.as_deref().unwrap_or_default(),
                    provider.as_deref(),
                    model.as_deref(),
                    server.as_deref(),
                )
                .await?;
            println!(
                "{}",
                format!("Created session {} ({})", session.id, session.title).green()
            );
        }
        SessionCommand::Show { id } => {
            let session = controller.load(&id).await?;
            print_session(&session);
            print_messages(&controller.messages());
        }
        SessionCommand::Rename { id, title } => {
            controller.load(&id).await?;
            if !controller.rename(&id, &title).await {
                anyhow::bail!("Failed to rename session {}: {}", id, list_error(backend));
            }
            report_written(backend, &id, &format!("Renamed session {}", id));
        }
        SessionCommand::SetLlm {
            id,
            provider,
            model,
        } => {
            validate_llm(backend, &provider, &model).await?;
            controller.load(&id).await?;
            if !controller.set_provider(&id, &provider, &model).await {
                anyhow::bail!("Failed to update session {}: {}", id, list_error(backend));
            }
            report_written(
                backend,
                &id,
                &format!("Session {} now uses {}/{}", id, provider, model),
            );
        }
        SessionCommand::SetServer { id, server } => {
            controller.load(&id).await?;
            if !controller.set_server(&id, server.as_deref()).await {
                anyhow::bail!("Failed to update session {}: {}", id, list_error(backend));
            }
            let msg = match &server {
                Some(server_id) => format!("Attached tool server {} to session {}", server_id, id),
                None => format!("Detached tool server from session {}", id),
            };
            report_written(backend, &id, &msg);
        }
        SessionCommand::Delete { id } => {
            if !controller.remove(&id).await {
                anyhow::bail!("Failed to delete session {}: {}", id, list_error(backend));
            }
            println!("{}", format!("Deleted session {}", id).green());
        }
        SessionCommand::Clear { id } => {
            if controller.clear(&id).await? {
                println!("{}", format!("Cleared messages of session {}", id).green());
            } else {
                anyhow::bail!("The service did not confirm clearing session {}", id);
            }
        }
        SessionCommand::Title { id } => {
            controller.load(&id).await?;
            if !controller.generate_title(&id).await {
                let reason = controller.errors().response.unwrap_or_default();
                anyhow::bail!("Failed to generate a title for {}: {}", id, reason);
            }
            if let Some(session) = controller.current() {
                println!("{}", format!("Session {} is now titled: {}", id, session.title).green());
            }
        }
    }

    Ok(())
}

/// Check a provider/model pair against the backend's providers.
///
/// Skipped with a warning when the provider list cannot be fetched.
pub(crate) async fn validate_llm(backend: &Backend, provider: &str, model: &str) -> Result<()> {
    backend.providers.fetch().await;
    if let Some(error) = backend.providers.last_error() {
        tracing::warn!("Could not verify provider {}: {}", provider, error);
        return Ok(());
    }
    backend.providers.validate_selection(provider, model)
}

fn list_error(backend: &Backend) -> String {
    backend.controller.errors().list.unwrap_or_default()
}

fn report_written(backend: &Backend, id: &str, msg: &str) {
    let unconfirmed = backend
        .controller
        .sessions()
        .iter()
        .chain(backend.controller.current().iter())
        .any(|s| s.id == id && s.sync == SyncState::Unconfirmed);
    if unconfirmed {
        println!(
            "{}",
            format!("{} (not confirmed by the service)", msg).yellow()
        );
    } else {
        println!("{}", msg.green());
    }
}

fn print_session_table(sessions: &[Session]) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Title".bold(),
        "Provider / Model".bold(),
        "Tool Server".bold(),
        "Messages".bold(),
        "Last Updated".bold()
    ]);

    for session in sessions {
        let llm = match session.llm_selection() {
            Some((provider, model)) => format!("{}/{}", provider, model),
            None => "-".to_string(),
        };
        let server = session.mcp_server_id.as_deref().unwrap_or("-");
        let count = session
            .message_count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());

        table.add_row(prettytable::row![
            session.id.cyan(),
            truncate(&session.title, 40),
            llm,
            server,
            count,
            format_millis(session.updated_at)
        ]);
    }

    println!("\nSessions:");
    table.printstd();
    println!();
    println!(
        "Use {} to open a session.",
        "chatrpc chat <ID>".cyan()
    );
    println!();
}

fn print_session(session: &Session) {
    println!();
    println!("{} {}", "Session:".bold(), session.id.cyan());
    println!("  Title:    {}", session.title);
    println!(
        "  LLM:      {}",
        session
            .llm_selection()
            .map(|(p, m)| format!("{}/{}", p, m))
            .unwrap_or_else(|| "(not configured)".to_string())
    );
    println!(
        "  Tools:    {}",
        session.mcp_server_id.as_deref().unwrap_or("(none)")
    );
    println!("  Created:  {}", format_millis(session.created_at));
    println!("  Updated:  {}", format_millis(session.updated_at));
    println!();
}

/// Print a message log, one block per message.
pub(crate) fn print_messages(messages: &[Message]) {
    if messages.is_empty() {
        println!("{}", "No messages.".yellow());
        return;
    }
    for message in messages {
        print_message(message);
    }
}

pub(crate) fn print_message(message: &Message) {
    let role = match message.role.as_str() {
        "user" => message.role.blue().bold(),
        "assistant" => message.role.green().bold(),
        "tool" => message.role.magenta().bold(),
        _ => message.role.normal().bold(),
    };
    let marker = match message.status {
        DeliveryStatus::Confirmed => String::new(),
        DeliveryStatus::Pending => format!(" {}", "(pending)".yellow()),
        DeliveryStatus::Failed => format!(" {}", "(failed)".red()),
    };
    println!("[{}] {}{}", format_millis(message.timestamp), role, marker);
    println!("{}", message.content_text());
    if let Some(calls) = &message.tool_calls {
        for call in calls {
            let name = call
                .pointer("/function/name")
                .or_else(|| call.get("name"))
                .and_then(|v| v.as_str())
                .unwrap_or("tool");
            println!("  {} {}", "->".dimmed(), name.cyan());
        }
    }
    println!();
}
