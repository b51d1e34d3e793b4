use colored::Colorize;
use prettytable::{format, Table};

use crate::cli::ProviderCommand;
use crate::commands::chat::response_text;
use crate::commands::{truncate, Backend};
use crate::error::Result;
use crate::registry::ConnectionReport;

/// Handle provider commands
pub async fn handle_providers(backend: &Backend, command: ProviderCommand) -> Result<()> {
    let registry = &backend.providers;

    match command {
        ProviderCommand::List => {
            let providers = registry.fetch().await;
            if let Some(error) = registry.last_error() {
                anyhow::bail!("Failed to list providers: {}", error);
            }
            if providers.is_empty() {
                println!("{}", "No providers configured.".yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
            table.add_row(prettytable::row![
                "Name".bold(),
                "Type".bold(),
                "API Base".bold(),
                "API Key".bold(),
                "Models".bold()
            ]);
            for provider in &providers {
                table.add_row(prettytable::row![
                    provider.name.cyan(),
                    provider.provider_type,
                    provider.api_base.as_deref().unwrap_or("-"),
                    provider.masked_key(),
                    truncate(&provider.models.join(", "), 50)
                ]);
            }

            println!("\nProviders:");
            table.printstd();
            println!();
        }
        ProviderCommand::Models { name } => {
            registry.fetch().await;
            let models = registry.models(&name).await;
            if models.is_empty() {
                println!("{}", format!("No models found for {}.", name).yellow());
                return Ok(());
            }
            println!("\nModels for {}:", name.cyan());
            for model in models {
                println!("  {}", model);
            }
            println!();
        }
        ProviderCommand::Test { name } => {
            registry.fetch().await;
            let report = registry.test_connection(&name).await;
            print_report(&format!("Provider {}", name), &report);
            if !report.success {
                anyhow::bail!("Connection test failed for provider {}", name);
            }
        }
        ProviderCommand::Send { name, text, model } => {
            let messages = [serde_json::json!({ "role": "user", "content": text })];
            let reply = registry
                .send_message(&name, &messages, model.as_deref())
                .await?;
            match response_text(&reply) {
                Some(text) => println!("{}", text),
                None => println!("{}", serde_json::to_string_pretty(&reply)?),
            }
        }
    }

    Ok(())
}

/// Print a connection report in one colored line plus any details.
pub(crate) fn print_report(subject: &str, report: &ConnectionReport) {
    let message = report.message.as_deref().unwrap_or_default();
    if report.success {
        println!("{}", format!("{}: OK {}", subject, message).trim_end().green());
    } else {
        println!("{}", format!("{}: FAILED {}", subject, message).trim_end().red());
    }
    if let Some(details) = &report.details {
        if !details.is_null() {
            println!("  {}", details);
        }
    }
}
