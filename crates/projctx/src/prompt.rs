//! Line-based prompter for terminal use.
//!
//! Questions are written to the output stream and answered one line at a
//! time from the input stream. End of input counts as cancellation.

use async_trait::async_trait;
use projctx_core::prompt::{Prompter, QuickPickItem};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};
use tokio::sync::Mutex;

struct Streams<R, W> {
    input: R,
    output: W,
}

pub struct LinePrompter<R, W> {
    streams: Mutex<Streams<R, W>>,
    /// Accept every confirmation without asking
    assume_yes: bool,
}

impl LinePrompter<BufReader<Stdin>, Stdout> {
    /// Prompter over the process's stdin and stdout
    pub fn stdio(assume_yes: bool) -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), assume_yes)
    }
}

impl<R, W> LinePrompter<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(input: R, output: W, assume_yes: bool) -> Self {
        Self {
            streams: Mutex::new(Streams { input, output }),
            assume_yes,
        }
    }

    /// Give back the output stream, for inspecting what was written
    pub fn into_output(self) -> W {
        self.streams.into_inner().output
    }

    async fn write(&self, text: &str) {
        let mut streams = self.streams.lock().await;
        if let Err(e) = write_flush(&mut streams.output, text).await {
            tracing::warn!("Failed to write prompt output: {}", e);
        }
    }

    /// Write `question` and read one answer line, without its line ending
    async fn ask(&self, question: &str) -> Option<String> {
        let mut streams = self.streams.lock().await;
        if let Err(e) = write_flush(&mut streams.output, question).await {
            tracing::warn!("Failed to write prompt: {}", e);
            return None;
        }

        let mut line = String::new();
        match streams.input.read_line(&mut line).await {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => {
                tracing::warn!("Failed to read answer: {}", e);
                None
            }
        }
    }
}

async fn write_flush<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> std::io::Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.flush().await
}

#[async_trait]
impl<R, W> Prompter for LinePrompter<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn confirm(&self, message: &str, accept: &str) -> bool {
        if self.assume_yes {
            self.write(&format!("{message} {accept}\n")).await;
            return true;
        }
        let Some(answer) = self.ask(&format!("{message}\n{accept}? [y/N] ")).await else {
            return false;
        };
        let answer = answer.trim();
        answer.eq_ignore_ascii_case("y")
            || answer.eq_ignore_ascii_case("yes")
            || answer.eq_ignore_ascii_case(accept)
    }

    async fn input(&self, prompt: &str, placeholder: Option<&str>) -> Option<String> {
        let question = match placeholder {
            Some(hint) => format!("{prompt} ({hint}): "),
            None => format!("{prompt}: "),
        };
        self.ask(&question).await
    }

    async fn pick(&self, placeholder: &str, items: &[QuickPickItem]) -> Option<usize> {
        let mut menu = String::new();
        for (i, item) in items.iter().enumerate() {
            menu.push_str(&format!("{:>3}) {}", i + 1, item.label));
            if let Some(description) = &item.description {
                menu.push_str(&format!("  {description}"));
            }
            if let Some(detail) = &item.detail {
                menu.push_str(&format!("  [{detail}]"));
            }
            menu.push('\n');
        }
        menu.push_str(&format!("{placeholder}: "));

        let answer = self.ask(&menu).await?;
        let answer = answer.trim();
        match answer.parse::<usize>() {
            Ok(n) if (1..=items.len()).contains(&n) => Some(n - 1),
            _ => items.iter().position(|item| item.label == answer),
        }
    }

    async fn show_info(&self, message: &str) {
        self.write(&format!("{message}\n")).await;
    }

    async fn show_warning(&self, message: &str) {
        self.write(&format!("warning: {message}\n")).await;
    }

    async fn show_error(&self, message: &str) {
        self.write(&format!("error: {message}\n")).await;
    }
}
