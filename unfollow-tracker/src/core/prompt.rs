/*!
Interactive terminal prompts
*/

use std::io;

use dialoguer::{Input, Password};

/// Source of answers for interactive questions
pub trait Prompter: Send + Sync {
    /// Ask for a line of visible text
    fn input(&self, prompt: &str) -> io::Result<String>;

    /// Ask for a secret without echoing it
    fn secret(&self, prompt: &str) -> io::Result<String>;
}

pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn input(&self, prompt: &str) -> io::Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .interact_text()
            .map(|answer| answer.trim().to_string())
            .map_err(|e| io::Error::other(e.to_string()))
    }

    fn secret(&self, prompt: &str) -> io::Result<String> {
        Password::new()
            .with_prompt(prompt)
            .interact()
            .map_err(|e| io::Error::other(e.to_string()))
    }
}
