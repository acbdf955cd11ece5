//! Interactive chat loop
//!
//! Runs the readline-based session: slash commands for conversation
//! management and attachments, and token-by-token printing of streamed
//! replies. All backend and ingestion failures surface as conversation
//! messages, so the loop itself only fails on terminal-level problems.

use crate::attachment::AttachmentStore;
use crate::config::Config;
use crate::controller::ChatController;
use crate::error::Result;
use crate::ollama::OllamaClient;
use crate::session::{ConversationId, Message, Role};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::Path;

/// Parsed REPL input
///
/// The command word is matched case-insensitively; arguments keep their
/// original form so paths and conversation ids survive untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Start a new conversation
    New,
    /// List all conversations
    Chats,
    /// Switch to the conversation with the given id
    Switch(String),
    /// Attach the file at the given path
    Attach(String),
    /// Show command help
    Help,
    /// Leave the session
    Exit,
    /// A slash command that isn't recognized
    Unknown(String),
    /// Anything else is sent to the model
    Prompt(String),
}

/// Parse a line of user input into a [`ReplCommand`]
///
/// # Arguments
///
/// * `input` - Raw line from the readline editor
///
/// # Examples
///
/// ```
/// use olloquy::repl::{parse_command, ReplCommand};
///
/// assert_eq!(parse_command("/new"), ReplCommand::New);
/// assert_eq!(
///     parse_command("/attach notes.txt"),
///     ReplCommand::Attach("notes.txt".to_string())
/// );
/// assert_eq!(parse_command("EXIT"), ReplCommand::Exit);
/// ```
pub fn parse_command(input: &str) -> ReplCommand {
    let trimmed = input.trim();
    let lowered = trimmed.to_lowercase();

    if lowered == "exit" || lowered == "quit" {
        return ReplCommand::Exit;
    }

    if !trimmed.starts_with('/') {
        return ReplCommand::Prompt(trimmed.to_string());
    }

    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (trimmed, ""),
    };

    match word.to_lowercase().as_str() {
        "/new" => ReplCommand::New,
        "/chats" => ReplCommand::Chats,
        "/switch" => ReplCommand::Switch(rest.to_string()),
        "/attach" => ReplCommand::Attach(rest.to_string()),
        "/help" => ReplCommand::Help,
        _ => ReplCommand::Unknown(word.to_string()),
    }
}

/// Start the interactive chat session
///
/// # Arguments
///
/// * `config` - Loaded and validated configuration
///
/// # Errors
///
/// Returns an error if the backend client or the readline editor cannot be
/// constructed. Failures during the session are reported in the
/// conversation log instead of ending the loop.
pub async fn run(config: Config) -> Result<()> {
    tracing::info!("Starting interactive chat session");

    let client = OllamaClient::new(config.ollama.clone())?;
    let attachments =
        AttachmentStore::with_chunk_size(&config.attachments.dir, config.attachments.chunk_size);
    let mut controller = ChatController::new(client, attachments);

    let mut rl = DefaultEditor::new()?;

    print_welcome_banner(&config);

    // The first render creates the initial conversation and shows its greeting
    print_messages(controller.active_messages());

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match parse_command(trimmed) {
                    ReplCommand::New => {
                        let id = controller.new_conversation();
                        println!("Started conversation {}", id);
                        print_messages(controller.active_messages());
                    }
                    ReplCommand::Chats => {
                        print_conversation_list(&controller);
                    }
                    ReplCommand::Switch(id) => {
                        if id.is_empty() {
                            println!("Usage: /switch <id>\n");
                            continue;
                        }
                        switch_conversation(&mut controller, id);
                    }
                    ReplCommand::Attach(path) => {
                        if path.is_empty() {
                            println!("Usage: /attach <path>\n");
                            continue;
                        }
                        attach_file(&mut controller, &path)?;
                    }
                    ReplCommand::Help => {
                        print_help();
                    }
                    ReplCommand::Exit => break,
                    ReplCommand::Unknown(word) => {
                        use colored::Colorize;

                        println!("{}", format!("Unknown command: {}", word).red());
                        println!("Type '/help' for available commands\n");
                    }
                    ReplCommand::Prompt(prompt) => {
                        rl.add_history_entry(&prompt)?;
                        stream_reply(&mut controller, &prompt).await?;
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
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                break;
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Submit a prompt and print the reply token by token
async fn stream_reply(controller: &mut ChatController, prompt: &str) -> Result<()> {
    use colored::Colorize;
    use std::io::Write;

    let mut stdout = std::io::stdout();
    print!("\n{} ", "Assistant:".cyan().bold());
    let _ = stdout.flush();

    controller
        .submit_prompt(prompt, |token| {
            print!("{}", token);
            let _ = stdout.flush();
        })
        .await?;

    println!("\n");
    Ok(())
}

/// Switch conversations and render the selected transcript
fn switch_conversation(controller: &mut ChatController, id: String) {
    use colored::Colorize;

    let id = ConversationId::from(id);
    match controller.switch_conversation(&id) {
        Ok(()) => {
            println!("Switched to conversation {}", id);
            print_messages(controller.active_messages());
        }
        Err(e) => {
            eprintln!("{}", format!("Error: {}", e).red());
        }
    }
}

/// Run the attachment flow and render the messages it appended
fn attach_file(controller: &mut ChatController, path: &str) -> Result<()> {
    let before = controller.active_messages().len();
    controller.attach_file(Path::new(path))?;

    let messages = controller.active_messages();
    print_messages(&messages[before..]);
    Ok(())
}

/// Display welcome banner at the start of the session
///
/// Shows a formatted banner with the application name, the backend host
/// and model, and basic instructions.
fn print_welcome_banner(config: &Config) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║              Olloquy Chat - Welcome!                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("Host:  {}", config.ollama.host);
    println!("Model: {}\n", config.ollama.model);
    println!("Type '/help' for available commands, 'exit' to quit\n");
}

/// Render a run of conversation messages with role prefixes
fn print_messages(messages: &[Message]) {
    use colored::Colorize;

    println!();
    for message in messages {
        match message.role {
            Role::User => println!("{} {}", "You:".bold(), message.content),
            Role::Assistant => {
                println!("{} {}", "Assistant:".cyan().bold(), message.content)
            }
        }
    }
    println!();
}

/// List all conversations, most recent first, marking the active one
fn print_conversation_list(controller: &ChatController) {
    use colored::Colorize;

    let active = controller.session().active_id().cloned();

    println!("\nConversations:");
    for (id, title) in controller.list_conversations() {
        let marker = if active.as_ref() == Some(&id) { "*" } else { " " };
        println!("{} {}  {}", marker, id.to_string().cyan(), title);
    }
    println!();
}

/// Print available commands
fn print_help() {
    println!("\nAvailable commands:");
    println!("  /new            Start a new conversation");
    println!("  /chats          List conversations, most recent first");
    println!("  /switch <id>    Switch to another conversation");
    println!("  /attach <path>  Attach a text file to the conversation");
    println!("  /help           Show this help");
    println!("  exit, quit      Leave the session");
    println!();
}
