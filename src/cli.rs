use std::fmt::Display;
use std::io::Write;
use std::path::Path;

use clap::builder::styling::{AnsiColor, Color, Style, Styles};
use clap::{ArgAction, CommandFactory, Parser, ValueEnum};
use clap_complete::aot::{Generator, Shell, generate};
use clap_complete_nushell::Nushell;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tracing::{info, warn};

use crate::ai::prompt::PromptKind;
use crate::ai::{self, API_KEY_ENV, Backend, DEFAULT_LOCAL_ENDPOINT, GenerationConfig};
use crate::{AppResult, git};

const STYLES: Styles = Styles::styled()
    .header(Style::new().bold())
    .usage(Style::new().bold())
    .error(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))))
    .literal(
        Style::new()
            .bold()
            .fg_color(Some(Color::Ansi(AnsiColor::Green))),
    )
    .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))))
    .valid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
    .invalid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightRed))))
    .context(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Magenta))))
    .context_value(
        Style::new()
            .bold()
            .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
    );

/// Long-form CLI description shown in `--help`.
const LONG_ABOUT: &str = "GitEcho - AI-powered Git change summarizer

Fetches a git diff (against the parent commit, or a base of your choosing),
sends it to a language model, and prints a plain-English summary or a
suggested commit message.

The model is either the OpenAI API (authenticated with \x1b[1mOPENAI_API_KEY\x1b[22m)
or any local OpenAI-compatible server such as \x1b]8;;https://ollama.com\x1b\\\x1b[4;36mOllama\x1b[24;39m\x1b]8;;\x1b\\.";

const DEFAULT_MODEL: &str = "gpt-4";

/// Diff characters kept before prompt construction, to avoid token overflow.
const MAX_DIFF_CHARS: usize = 8000;

/// Summarize Git diffs using AI.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = Some(LONG_ABOUT), styles = STYLES)]
pub struct Cli {
    /// Only output a commit message suggestion instead of a summary
    #[arg(long = "commit-msg", default_value_t = false, action = ArgAction::SetTrue)]
    pub commit_msg: bool,

    /// Base branch to diff from (default: HEAD~1)
    #[arg(long)]
    pub base: Option<String>,

    /// LLM model to use
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Use a local LLM endpoint
    #[arg(long, default_value_t = false, action = ArgAction::SetTrue)]
    pub local: bool,

    /// Local LLM endpoint URL (e.g., http://localhost:11434/v1/chat/completions)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Write a completion script for the given shell to stdout and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completion: Option<CompletionShell>,

    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,
}

/// Supported completion targets for shell auto-completion.
#[derive(ValueEnum, Clone, Debug)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
    Nushell,
}

impl Display for CompletionShell {
    /// Render the canonical shell name string.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CompletionShell::Bash => "bash",
            CompletionShell::Zsh => "zsh",
            CompletionShell::Fish => "fish",
            CompletionShell::PowerShell => "powershell",
            CompletionShell::Elvish => "elvish",
            CompletionShell::Nushell => "nushell",
        };
        write!(f, "{}", s)
    }
}

impl Generator for &CompletionShell {
    fn generate(&self, cmd: &clap::builder::Command, buf: &mut dyn Write) {
        match self {
            CompletionShell::Bash => Shell::Bash.generate(cmd, buf),
            CompletionShell::Zsh => Shell::Zsh.generate(cmd, buf),
            CompletionShell::Fish => Shell::Fish.generate(cmd, buf),
            CompletionShell::PowerShell => Shell::PowerShell.generate(cmd, buf),
            CompletionShell::Elvish => Shell::Elvish.generate(cmd, buf),
            CompletionShell::Nushell => Nushell.generate(cmd, buf),
        }
    }

    fn file_name(&self, name: &str) -> String {
        match self {
            CompletionShell::Bash => Shell::Bash.file_name(name),
            CompletionShell::Zsh => Shell::Zsh.file_name(name),
            CompletionShell::Fish => Shell::Fish.file_name(name),
            CompletionShell::PowerShell => Shell::PowerShell.file_name(name),
            CompletionShell::Elvish => Shell::Elvish.file_name(name),
            CompletionShell::Nushell => Nushell.file_name(name),
        }
    }
}

impl Cli {
    /// Resolve the generation configuration, reading the API key from the
    /// environment.
    pub fn generation_config(&self) -> GenerationConfig {
        self.generation_config_with_key(std::env::var(API_KEY_ENV).ok())
    }

    /// Same as [`Cli::generation_config`], with the credential injected.
    pub fn generation_config_with_key(&self, api_key: Option<String>) -> GenerationConfig {
        GenerationConfig {
            backend: if self.local {
                Backend::Local
            } else {
                Backend::Remote
            },
            model: self.model.clone(),
            endpoint: self.endpoint.clone(),
            api_key: api_key.filter(|key| !key.is_empty()),
            prompt: if self.commit_msg {
                PromptKind::CommitMessage
            } else {
                PromptKind::Summary
            },
        }
    }

    /// Execute the whole workflow: fetch the diff, hand it to the model,
    /// print the result.
    #[tracing::instrument(name = "Running gitecho", level = "debug", skip(self))]
    pub async fn run(&self) -> AppResult<()> {
        if let Some(shell) = &self.completion {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "gitecho", &mut std::io::stdout());
            return Ok(());
        }

        let cwd = std::env::current_dir()?;
        if let Some(summary) = self.run_in(&cwd).await? {
            print!("{}", render_summary(&summary));
        }

        Ok(())
    }

    /// The fetch → truncate → generate sequence, against the repository at
    /// `repo`. Returns `None` when the diff is empty and there is nothing to
    /// summarize; the generator is never consulted in that case.
    async fn run_in(&self, repo: &Path) -> AppResult<Option<String>> {
        if !self.local {
            warn!("Using OpenAI API. Your code will be sent to OpenAI servers.");
            info!("To keep your code local, use: --local --endpoint {DEFAULT_LOCAL_ENDPOINT}");
        }

        info!("Fetching git diff...");
        let diff = git::fetch_diff_in(repo, self.base.as_deref()).await?;
        let diff = ai::prompt::truncate_chars(&diff, MAX_DIFF_CHARS);
        if diff.is_empty() {
            info!("No changes to summarize.");
            return Ok(None);
        }

        info!("Generating AI summary...");
        let config = self.generation_config();
        let summary = ai::generate_summary(diff, &config).await?;

        Ok(Some(summary))
    }
}

/// The final stdout block: the literal banner with the model's reply under it.
fn render_summary(summary: &str) -> String {
    format!("\n====== AI Summary ======\n\n{summary}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::repo_fixtures::seeded_repo;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_the_documented_interface() {
        let cli = Cli::try_parse_from(["gitecho"]).unwrap();
        assert_eq!(cli.model, "gpt-4");
        assert!(cli.base.is_none());
        assert!(cli.endpoint.is_none());
        assert!(!cli.local);
        assert!(!cli.commit_msg);
    }

    #[test]
    fn flags_parse_into_the_generation_config() {
        let cli = Cli::try_parse_from([
            "gitecho",
            "--local",
            "--commit-msg",
            "--model",
            "llama3",
            "--base",
            "main",
            "--endpoint",
            "http://127.0.0.1:8080/v1/chat/completions",
        ])
        .unwrap();

        assert_eq!(cli.base.as_deref(), Some("main"));

        let config = cli.generation_config_with_key(None);
        assert_eq!(config.backend, Backend::Local);
        assert_eq!(config.model, "llama3");
        assert_eq!(config.prompt, PromptKind::CommitMessage);
        assert_eq!(
            config.endpoint.as_deref(),
            Some("http://127.0.0.1:8080/v1/chat/completions")
        );
    }

    #[test]
    fn empty_api_key_counts_as_missing() {
        let cli = Cli::try_parse_from(["gitecho"]).unwrap();
        let config = cli.generation_config_with_key(Some(String::new()));
        assert_eq!(config.backend, Backend::Remote);
        assert!(config.api_key.is_none());
    }

    #[tokio::test]
    async fn empty_diff_short_circuits_before_the_generator() {
        let server = MockServer::start().await;
        // Verified on drop: the generator must never reach the endpoint.
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let repo = seeded_repo();
        let endpoint = format!("{}/v1/chat/completions", server.uri());
        // HEAD against a clean tree produces an empty diff.
        let cli = Cli::try_parse_from([
            "gitecho",
            "--local",
            "--endpoint",
            endpoint.as_str(),
            "--base",
            "HEAD",
        ])
        .unwrap();

        let result = cli.run_in(repo.path()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn run_sequence_ends_with_the_banner_and_model_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "Changed greeting text."}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let repo = seeded_repo();
        let endpoint = format!("{}/v1/chat/completions", server.uri());
        let cli =
            Cli::try_parse_from(["gitecho", "--local", "--endpoint", endpoint.as_str()]).unwrap();

        let summary = cli
            .run_in(repo.path())
            .await
            .unwrap()
            .expect("a non-empty diff must produce a summary");
        assert_eq!(summary, "Changed greeting text.");
        assert!(
            render_summary(&summary)
                .ends_with("====== AI Summary ======\n\nChanged greeting text.\n")
        );
    }
}
