//! Interactive chat loop

use anyhow::Result;
use console::style;
use dialoguer::Input;
use std::path::Path;

use doc_insight_core::config::Config;
use doc_insight_core::Conversation;

/// Placeholder answer for a turn still waiting on the backend
const PENDING_MARKER: &str = "AI is thinking...";
/// Shown by /history before any question has been asked
const EMPTY_TRANSCRIPT: &str = "Your conversation with the AI will appear here.";
/// Banner shown while the connectivity toggle reports offline
const OFFLINE_BANNER: &str = "You are currently offline. Please check your internet connection.";

/// Run the interactive chat loop over a loaded document
pub async fn run_chat(config: &Config, document_path: &Path) -> Result<()> {
    let document = crate::read_document(document_path)?;
    let (mut controller, connectivity) = crate::build_controller(config);

    println!("{}", style("AI Document Insight Extractor").bold().cyan());
    println!(
        "Document: {} ({} characters)",
        document_path.display(),
        document.chars().count()
    );
    println!("Commands: /key /history /clear /offline /online /quit");
    println!();

    loop {
        if !controller.is_online() {
            println!("{}", style(OFFLINE_BANNER).yellow());
        }

        let line: String = Input::new()
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()?;
        let input = line.trim().to_string();
        if input.is_empty() {
            continue;
        }

        match input.as_str() {
            "/quit" | "/exit" => break,
            "/clear" => {
                controller.reset_conversation();
                println!("Conversation cleared.");
            }
            "/history" => print_transcript(controller.conversation()),
            "/offline" => {
                connectivity.set_online(false);
                println!("Marked offline.");
            }
            "/online" => {
                connectivity.set_online(true);
                println!("Marked online.");
            }
            "/key" => {
                let key: String = Input::new()
                    .with_prompt("Enter your API Key")
                    .allow_empty(true)
                    .interact_text()?;
                match controller.set_credential(&key).await {
                    Ok(()) => {
                        println!("{}", style("API Key set successfully!").green().bold())
                    }
                    Err(_) => print_error(controller.last_error()),
                }
            }
            command if command.starts_with('/') => {
                println!("Unknown command: {}", command);
            }
            question => {
                let spinner = crate::request_spinner();
                let result = controller.submit_turn(&document, question).await;
                spinner.finish_and_clear();

                match result {
                    Ok(turn) => println!(
                        "{} {}",
                        style("AI:").green().bold(),
                        turn.ai_response.as_deref().unwrap_or(PENDING_MARKER)
                    ),
                    Err(_) => print_error(controller.last_error()),
                }
            }
        }
    }

    Ok(())
}

fn print_transcript(conversation: &Conversation) {
    if conversation.is_empty() {
        println!("{}", style(EMPTY_TRANSCRIPT).dim());
        return;
    }

    for turn in conversation.turns() {
        println!("{} {}", style("You:").cyan().bold(), turn.user_query);
        match &turn.ai_response {
            Some(answer) => println!("{} {}", style("AI:").green().bold(), answer),
            None => println!("{}", style(PENDING_MARKER).dim()),
        }
        println!();
    }
}

fn print_error(message: Option<&str>) {
    println!("{}", style(message.unwrap_or("Request failed.")).red());
}
