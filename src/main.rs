use anyhow::Result;
use std::env;
use tokio::time::Duration;

mod agent;
mod config;
mod llm_client;
mod logging;
mod prompts;
mod repl;
mod session;
mod tool_registry;
mod tools;
mod types;
mod ui;
mod utils;

#[cfg(test)]
mod mocks;

use agent::{Agent, AgentOptions};
use config::Config;
use llm_client::LlmClient;
use session::Session;
use tool_registry::ToolRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };

    let llm = LlmClient::new(
        cfg.base_url.clone(),
        cfg.api_key.clone(),
        cfg.model.clone(),
        cfg.temperature,
    )?;
    let opts = AgentOptions {
        max_tool_rounds: cfg.max_tool_rounds,
        step_timeout: Duration::from_secs(cfg.step_timeout_secs),
        ..AgentOptions::default()
    };
    let session = Session::with_system_instruction(prompts::SYSTEM_INSTRUCTION, Some(&cfg.model));

    let args: Vec<String> = env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("tui") {
        // The full-screen surface streams tokens directly; no tools here.
        let agent = Agent::new(Box::new(llm), ToolRegistry::new(), opts);
        ui::run_chat_surface(agent, session, prompts::GREETING).await
    } else {
        let registry = ToolRegistry::with_project_tools(cfg.docs_dir.clone());
        let agent = Agent::new(Box::new(llm), registry, opts);
        let mut session = session;
        repl::run_repl(&agent, &mut session, &cfg.model).await
    }
}
