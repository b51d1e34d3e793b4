//! Command-line interface definition for ChatRPC
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for sessions, chatting, providers, and tool servers.

use clap::{Parser, Subcommand};

/// ChatRPC - chat session client for a JSON-RPC backend
///
/// Manage chat sessions, send messages through tool-enabled chat, and
/// inspect the LLM providers and tool servers known to the backend.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatrpc")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/chatrpc.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the JSON-RPC endpoint from config
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for ChatRPC
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Manage chat sessions
    Sessions {
        /// Session subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Send one message to a session and print the reply
    Send {
        /// Session id
        session: String,

        /// Message text
        text: String,
    },

    /// Start an interactive chat in a session
    Chat {
        /// Session id
        session: String,
    },

    /// Inspect LLM providers
    Providers {
        /// Provider subcommand
        #[command(subcommand)]
        command: ProviderCommand,
    },

    /// Inspect and connect tool servers
    Servers {
        /// Server subcommand
        #[command(subcommand)]
        command: ServerCommand,
    },
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List sessions, most recently updated first
    List,

    /// Create a session
    Create {
        /// Session title; the configured default is used when omitted
        #[arg(short, long)]
        title: Option<String>,

        /// LLM provider name
        #[arg(short, long, requires = "model")]
        provider: Option<String>,

        /// Model name
        #[arg(short, long, requires = "provider")]
        model: Option<String>,

        /// Tool server id
        #[arg(short, long)]
        server: Option<String>,
    },

    /// Show a session and its messages
    Show {
        /// Session id
        id: String,
    },

    /// Rename a session
    Rename {
        /// Session id
        id: String,

        /// New title
        title: String,
    },

    /// Set the provider and model a session routes to
    SetLlm {
        /// Session id
        id: String,

        /// LLM provider name
        provider: String,

        /// Model name
        model: String,
    },

    /// Attach or detach a tool server
    SetServer {
        /// Session id
        id: String,

        /// Tool server id; omit to detach
        server: Option<String>,
    },

    /// Delete a session
    Delete {
        /// Session id
        id: String,
    },

    /// Delete all messages of a session
    Clear {
        /// Session id
        id: String,
    },

    /// Generate a title from the session's first messages
    Title {
        /// Session id
        id: String,
    },
}

/// Provider subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ProviderCommand {
    /// List configured providers
    List,

    /// List the models of a provider
    Models {
        /// Provider name
        name: String,
    },

    /// Test the connection to a provider
    Test {
        /// Provider name
        name: String,
    },

    /// Send one message straight to a provider, outside any session
    Send {
        /// Provider name
        name: String,

        /// Message text
        text: String,

        /// Model to use; the provider's default when omitted
        #[arg(short, long)]
        model: Option<String>,
    },
}

/// Tool-server subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ServerCommand {
    /// List tool servers
    List {
        /// Include each server's tools
        #[arg(long)]
        tools: bool,
    },

    /// Connect a tool server
    Connect {
        /// Server id
        id: String,
    },

    /// Disconnect a tool server
    Disconnect {
        /// Server id
        id: String,
    },

    /// Test a tool server without keeping the connection
    Test {
        /// Server id
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_sessions_list() {
        let cli = Cli::try_parse_from(["chatrpc", "sessions", "list"]).unwrap();
        assert_eq!(cli.config, Some("config/chatrpc.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(cli.endpoint.is_none());
        assert!(matches!(
            cli.command,
            Commands::Sessions {
                command: SessionCommand::List
            }
        ));
    }

    #[test]
    fn test_cli_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "chatrpc",
            "-v",
            "-c",
            "custom.yaml",
            "--endpoint",
            "http://example.com/rpc",
            "providers",
            "list",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some("custom.yaml".to_string()));
        assert_eq!(cli.endpoint.as_deref(), Some("http://example.com/rpc"));
    }

    #[test]
    fn test_cli_parse_create_with_llm() {
        let cli = Cli::try_parse_from([
            "chatrpc",
            "sessions",
            "create",
            "--title",
            "Research",
            "--provider",
            "openai",
            "--model",
            "gpt-4",
        ])
        .unwrap();
        if let Commands::Sessions {
            command:
                SessionCommand::Create {
                    title,
                    provider,
                    model,
                    server,
                },
        } = cli.command
        {
            assert_eq!(title.as_deref(), Some("Research"));
            assert_eq!(provider.as_deref(), Some("openai"));
            assert_eq!(model.as_deref(), Some("gpt-4"));
            assert!(server.is_none());
        } else {
            panic!("Expected Sessions Create command");
        }
    }

    #[test]
    fn test_cli_create_requires_provider_and_model_together() {
        let result =
            Cli::try_parse_from(["chatrpc", "sessions", "create", "--provider", "openai"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_set_server_detach() {
        let cli = Cli::try_parse_from(["chatrpc", "sessions", "set-server", "s1"]).unwrap();
        if let Commands::Sessions {
            command: SessionCommand::SetServer { id, server },
        } = cli.command
        {
            assert_eq!(id, "s1");
            assert!(server.is_none());
        } else {
            panic!("Expected SetServer command");
        }
    }

    #[test]
    fn test_cli_parse_send() {
        let cli = Cli::try_parse_from(["chatrpc", "send", "s1", "hello there"]).unwrap();
        if let Commands::Send { session, text } = cli.command {
            assert_eq!(session, "s1");
            assert_eq!(text, "hello there");
        } else {
            panic!("Expected Send command");
        }
    }

    #[test]
    fn test_cli_parse_servers_list_with_tools() {
        let cli = Cli::try_parse_from(["chatrpc", "servers", "list", "--tools"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Servers {
                command: ServerCommand::List { tools: true }
            }
        ));
    }

    #[test]
    fn test_cli_parse_provider_send() {
        let cli = Cli::try_parse_from(["chatrpc", "providers", "send", "openai", "ping", "-m", "gpt-4"])
            .unwrap();
        match cli.command {
            Commands::Providers {
                command: ProviderCommand::Send { name, text, model },
            } => {
                assert_eq!(name, "openai");
                assert_eq!(text, "ping");
                assert_eq!(model.as_deref(), Some("gpt-4"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["chatrpc"]).is_err());
        assert!(Cli::try_parse_from(["chatrpc", "sessions"]).is_err());
    }
}
