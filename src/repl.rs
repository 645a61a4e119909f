use anyhow::{Context, Result};
use std::io::{self, Write};

use crate::agent::Agent;
use crate::prompts;
use crate::session::Session;

/// Blocking chat loop on stdin/stdout. One turn at a time; a failed turn is
/// reported and the loop continues with history untouched.
pub async fn run_repl(agent: &Agent, session: &mut Session, model: &str) -> Result<()> {
    println!("--- Nexus AI Assistant Initiated ---");
    println!("Chat session started with {}. Type 'exit' to quit.\n", model);
    println!("Nexus: {}\n", prompts::GREETING);

    loop {
        print!("Meg: ");
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        let read = io::stdin()
            .read_line(&mut input)
            .context("Failed to read stdin")?;
        if read == 0 {
            break;
        }

        let prompt = input.trim();
        if prompt.is_empty() {
            continue;
        }
        if prompt.eq_ignore_ascii_case("exit") || prompt.eq_ignore_ascii_case("quit") {
            println!("\nNexus: Session terminated. Have a productive day, Meg.");
            break;
        }

        match agent.run_user_turn(prompt, session).await {
            Ok(answer) => println!("Nexus: {}\n", answer),
            Err(err) => eprintln!("Error: {:#}\n", err),
        }
    }

    Ok(())
}
