use std::collections::HashMap;

/// Upper bound on diff characters embedded in any prompt.
pub const MAX_PROMPT_CHARS: usize = 6000;

static SUMMARY_TEMPLATE: PromptTemplate =
    PromptTemplate::new(include_str!("prompts/summary_prompt.md"));
static COMMIT_MESSAGE_TEMPLATE: PromptTemplate =
    PromptTemplate::new(include_str!("prompts/commit_message_prompt.md"));

/// A template for AI prompts that supports variable substitution.
pub struct PromptTemplate {
    template: &'static str,
}

impl PromptTemplate {
    pub const fn new(template: &'static str) -> Self {
        Self { template }
    }

    /// Render the template by replacing `{{key}}` with the corresponding value.
    pub fn render(&self, vars: &HashMap<&str, &str>) -> String {
        let mut output = self.template.to_string();
        for (k, v) in vars {
            let placeholder = format!("{{{{{}}}}}", k);
            output = output.replace(&placeholder, v);
        }
        output
    }
}

/// Which instruction set the model receives: a paragraph summary of the
/// change, or a one-line commit message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptKind {
    #[default]
    Summary,
    CommitMessage,
}

impl PromptKind {
    /// System message for the two-message remote conversation.
    pub fn system_instruction(&self) -> &'static str {
        match self {
            PromptKind::Summary => "You are a helpful assistant.",
            PromptKind::CommitMessage => {
                "You are a helpful assistant that writes git commit messages."
            }
        }
    }

    /// User message for the remote conversation, with the diff embedded in a
    /// code fence.
    pub fn user_prompt(&self, diff: &str) -> String {
        let template = match self {
            PromptKind::Summary => &SUMMARY_TEMPLATE,
            PromptKind::CommitMessage => &COMMIT_MESSAGE_TEMPLATE,
        };
        let mut vars = HashMap::new();
        vars.insert("diff", truncate_chars(diff, MAX_PROMPT_CHARS));
        template.render(&vars)
    }

    /// Single user message for the local backend: instruction prefix plus the
    /// truncated diff.
    pub fn local_prompt(&self, diff: &str) -> String {
        let instruction = match self {
            PromptKind::Summary => "Summarize the following code diff in plain English:",
            PromptKind::CommitMessage => {
                "Write a one-line git commit message for the following code diff:"
            }
        };
        format!(
            "{instruction}\n{}",
            truncate_chars(diff, MAX_PROMPT_CHARS)
        )
    }
}

/// Truncate to at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
