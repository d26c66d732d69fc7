use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{Responder, Typewriter, render_panel, run_turn};
use crate::models::{ChatSession, Role};

const PROMPT: &str = "Please write your query";

enum Input<'a> {
    Exit,
    History,
    Empty,
    Prompt(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "/exit" | "/quit" => Input::Exit,
        "/history" => Input::History,
        "" => Input::Empty,
        prompt => Input::Prompt(prompt),
    }
}

/// Line-oriented chat on the terminal until `/exit` or end of input.
pub struct ChatLoop<'a> {
    title: String,
    responder: &'a dyn Responder,
    typewriter: Typewriter,
}

impl<'a> ChatLoop<'a> {
    pub fn new(title: impl Into<String>, responder: &'a dyn Responder, typewriter: Typewriter) -> Self {
        Self {
            title: title.into(),
            responder,
            typewriter,
        }
    }

    pub async fn run(&self) -> Result<ChatSession> {
        let mut session = ChatSession::new();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = std::io::stdout();

        println!("{}", style(&self.title).bold());
        println!(
            "{}",
            style("Type /history to review the conversation, /exit to leave.").dim()
        );

        loop {
            print!("\n{} ", style(format!("{PROMPT} >")).cyan());
            stdout.flush()?;

            let Some(line) = lines.next_line().await.context("Failed to read input")? else {
                println!();
                break;
            };

            let prompt = match parse_input(&line) {
                Input::Exit => break,
                Input::Empty => continue,
                Input::History => {
                    print_history(&session);
                    continue;
                }
                Input::Prompt(prompt) => prompt,
            };

            let spinner = thinking_spinner();
            let reply = run_turn(&mut session, self.responder, prompt).await;
            spinner.finish_and_clear();

            println!("{}", role_label(Role::Assistant));
            self.typewriter
                .write(&mut stdout, &reply.content)
                .await
                .context("Failed to write response")?;

            if let Some(panel) = &reply.panel {
                println!();
                print!("{}", style(render_panel(panel)).dim());
            }
        }

        tracing::debug!(messages = session.len(), "chat ended");
        Ok(session)
    }
}

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message("Thinking ....");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn role_label(role: Role) -> String {
    match role {
        Role::User => style("user").cyan().bold().to_string(),
        Role::Assistant => style("assistant").green().bold().to_string(),
        Role::System => style("system").yellow().to_string(),
    }
}

fn print_history(session: &ChatSession) {
    if session.is_empty() {
        println!("{}", style("No messages yet").dim());
        return;
    }
    for message in session.messages() {
        println!("{}: {}", role_label(message.role), message.content);
    }
}
