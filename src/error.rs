use thiserror::Error;

/// Unified application error type to simplify bubbling errors through async flows.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to get git diff: {0}")]
    GitInvocation(#[from] std::io::Error),
    #[error("Git diff output was not valid UTF-8: {0}")]
    Utf8Parse(#[from] std::str::Utf8Error),
    #[error("Failed to connect to local LLM: {0}")]
    LocalBackend(#[source] reqwest::Error),
    #[error("OpenAI API call failed: {0}")]
    RemoteBackend(#[source] reqwest::Error),
    #[error("Failed to build the HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("Malformed response from the model server at `{0}`: {1}")]
    MalformedResponse(
        String,
        #[source] serde_path_to_error::Error<serde_json::Error>,
    ),
    #[error("Model server at `{0}` returned no choices")]
    EmptyChoices(String),
}

/// Convenience alias for results that bubble `AppError`.
pub type AppResult<T> = Result<T, AppError>;
