use colored::Colorize;
use prettytable::{format, Table};

use crate::cli::ServerCommand;
use crate::commands::providers::print_report;
use crate::commands::{format_millis, truncate, Backend};
use crate::error::Result;
use crate::registry::{ServerStatus, ToolServer};

/// Handle tool-server commands
pub async fn handle_servers(backend: &Backend, command: ServerCommand) -> Result<()> {
    let registry = &backend.servers;

    match command {
        ServerCommand::List { tools } => {
            let servers = if tools {
                registry.fetch_with_tools().await
            } else {
                registry.fetch().await
            };
            if let Some(error) = registry.last_error() {
                anyhow::bail!("Failed to list tool servers: {}", error);
            }
            let servers: Vec<ToolServer> = if tools {
                servers
            } else {
                registry.fetch_connected().await;
                servers
                    .into_iter()
                    .map(|mut s| {
                        if registry.is_connected(&s.id) {
                            s.status = ServerStatus::Online;
                        }
                        s
                    })
                    .collect()
            };
            if servers.is_empty() {
                println!("{}", "No tool servers configured.".yellow());
                return Ok(());
            }

            print_server_table(&servers);
            if tools {
                for server in servers.iter().filter(|s| !s.tools.is_empty()) {
                    println!("{} {}:", "Tools of".bold(), server.name.cyan());
                    for tool in &server.tools {
                        let description = tool.description.as_deref().unwrap_or_default();
                        println!("  {} {}", tool.name.green(), truncate(description, 70));
                    }
                    println!();
                }
                if let Some(checked) = registry.last_checked() {
                    println!("Checked at {}", format_millis(checked.timestamp_millis()));
                }
            }
        }
        ServerCommand::Connect { id } => {
            let report = registry.connect(&id).await;
            print_report(&format!("Server {}", id), &report);
            if !report.success {
                anyhow::bail!("Failed to connect tool server {}", id);
            }
        }
        ServerCommand::Disconnect { id } => {
            if !registry.disconnect(&id).await {
                anyhow::bail!("Failed to disconnect tool server {}", id);
            }
            println!("{}", format!("Disconnected tool server {}", id).green());
        }
        ServerCommand::Test { id } => {
            let report = registry.test_connection(&id).await;
            print_report(&format!("Server {}", id), &report);
            if !report.success {
                anyhow::bail!("Connection test failed for tool server {}", id);
            }
        }
    }

    Ok(())
}

fn print_server_table(servers: &[ToolServer]) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row![
        "ID".bold(),
        "Name".bold(),
        "Type".bold(),
        "Target".bold(),
        "Status".bold(),
        "Tools".bold()
    ]);

    for server in servers {
        let target = match (&server.url, &server.command) {
            (Some(url), _) => url.clone(),
            (None, Some(command)) => {
                let mut parts = vec![command.clone()];
                parts.extend(server.args.iter().cloned());
                parts.join(" ")
            }
            (None, None) => "-".to_string(),
        };
        let status = match server.status {
            ServerStatus::Online => server.status.to_string().green(),
            ServerStatus::Connecting => server.status.to_string().yellow(),
            ServerStatus::Error => server.status.to_string().red(),
            ServerStatus::Offline => server.status.to_string().normal(),
        };
        let tools = if server.tools.is_empty() {
            "-".to_string()
        } else {
            server.tools.len().to_string()
        };
        table.add_row(prettytable::row![
            server.id.cyan(),
            server.name,
            server.server_type,
            truncate(&target, 40),
            status,
            tools
        ]);
        if let Some(error) = &server.error {
            table.add_row(prettytable::row!["", "", "", truncate(error, 40).red(), "", ""]);
        }
    }

    println!("\nTool servers:");
    table.printstd();
    println!();
}
