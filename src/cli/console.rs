use anyhow::{Context, Result};
use std::{fmt::Display, io::Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Line-based prompt I/O over any reader/writer pair.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `message` and reads one trimmed line. `None` means the input stream ended.
    pub async fn prompt(&mut self, message: &str) -> Result<Option<String>> {
        write!(self.output, "{message}").context("Failed to write prompt")?;
        self.output.flush().context("Failed to flush prompt")?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .await
            .context("Failed to read from input")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    pub fn say(&mut self, line: impl Display) -> Result<()> {
        writeln!(self.output, "{line}").context("Failed to write to console")
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}
