// Line-oriented terminal surface for the draft loop.

use std::io::{Stdout, Write};

use async_trait::async_trait;
use crossterm::style::Stylize;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// The interactive surface the draft loop talks to.
///
/// `prompt` returns `None` once input is exhausted (EOF / Ctrl-D).
#[async_trait]
pub trait Console: Send {
    async fn prompt(&mut self, question: &str) -> anyhow::Result<Option<String>>;

    /// Print a line of ordinary output.
    fn say(&mut self, text: &str) -> anyhow::Result<()>;

    /// Print a section heading.
    fn heading(&mut self, text: &str) -> anyhow::Result<()>;

    /// Print an error or rejection message.
    fn warn(&mut self, text: &str) -> anyhow::Result<()>;

    /// Print a fragment of streamed text without a trailing newline.
    fn stream_fragment(&mut self, fragment: &str) -> anyhow::Result<()>;
}

/// Console backed by the process's stdin and stdout.
pub struct StdConsole {
    lines: Lines<BufReader<Stdin>>,
    out: Stdout,
}

impl StdConsole {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            out: std::io::stdout(),
        }
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Console for StdConsole {
    async fn prompt(&mut self, question: &str) -> anyhow::Result<Option<String>> {
        write!(self.out, "{} ", question.bold().green())?;
        self.out.flush()?;
        let line = self.lines.next_line().await?;
        Ok(line.map(|l| l.trim_end_matches('\r').to_string()))
    }

    fn say(&mut self, text: &str) -> anyhow::Result<()> {
        writeln!(self.out, "{text}")?;
        Ok(())
    }

    fn heading(&mut self, text: &str) -> anyhow::Result<()> {
        writeln!(self.out, "\n{}", text.bold().cyan())?;
        Ok(())
    }

    fn warn(&mut self, text: &str) -> anyhow::Result<()> {
        writeln!(self.out, "{}", text.red())?;
        Ok(())
    }

    fn stream_fragment(&mut self, fragment: &str) -> anyhow::Result<()> {
        write!(self.out, "{fragment}")?;
        self.out.flush()?;
        Ok(())
    }
}
