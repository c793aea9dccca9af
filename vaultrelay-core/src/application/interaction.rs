//! Terminal prompts and output for the interactive session.

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};
use tokio::sync::Mutex;

#[async_trait]
pub trait UserInteraction: Send + Sync {
    /// Print a block of text for the user.
    async fn show(&self, text: &str) -> io::Result<()>;

    /// Ask a free-text question and return the trimmed answer.
    async fn ask(&self, question: &str) -> io::Result<String>;

    /// Ask a yes/no question.
    async fn confirm(&self, question: &str) -> io::Result<bool> {
        let answer = self.ask(question).await?;
        Ok(is_affirmative(&answer))
    }
}

/// `y` or `yes`, case-insensitive.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Stdin/stdout backed interaction.
pub struct ConsoleInteraction {
    input: Mutex<Lines<BufReader<Stdin>>>,
    output: Mutex<Stdout>,
}

impl ConsoleInteraction {
    pub fn new() -> Self {
        Self {
            input: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
            output: Mutex::new(tokio::io::stdout()),
        }
    }
}

impl Default for ConsoleInteraction {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserInteraction for ConsoleInteraction {
    async fn show(&self, text: &str) -> io::Result<()> {
        let mut output = self.output.lock().await;
        output.write_all(text.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await
    }

    async fn ask(&self, question: &str) -> io::Result<String> {
        {
            let mut output = self.output.lock().await;
            output.write_all(question.as_bytes()).await?;
            if !question.ends_with(' ') {
                output.write_all(b"\n").await?;
            }
            output.flush().await?;
        }
        let line = self.input.lock().await.next_line().await?;
        match line {
            Some(line) => Ok(line.trim().to_string()),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "standard input closed",
            )),
        }
    }
}
