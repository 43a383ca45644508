use std::path::Path;
use std::str;

use tokio::process::Command;
use tracing::debug;

use crate::AppResult;

/// Fallback reference when no `--base` is given.
const DEFAULT_BASE_REF: &str = "HEAD~1";

/// Run `git diff` against the given base reference (or the parent commit)
/// inside `repo` and capture its stdout.
///
/// A non-zero exit status from git is not treated as a failure: whatever
/// diff text made it to stdout is returned, and an empty string means there
/// is nothing to summarize. Only a failure to launch the process or
/// non-UTF-8 output bubbles up as an error.
#[tracing::instrument(name = "Fetching git diff", level = "debug", skip(repo))]
pub async fn fetch_diff_in<P: AsRef<Path>>(repo: P, base: Option<&str>) -> AppResult<String> {
    let base_ref = base.unwrap_or(DEFAULT_BASE_REF);
    let output = Command::new("git")
        .arg("diff")
        .arg(base_ref)
        .current_dir(repo.as_ref())
        .output()
        .await?;

    if !output.status.success() {
        debug!(
            "git diff exited with {}; using whatever stdout it produced",
            output.status
        );
    }

    Ok(str::from_utf8(&output.stdout)?.to_string())
}

/// Scratch git repositories for tests of anything that shells out to git.
#[cfg(test)]
pub(crate) mod repo_fixtures {
    use std::path::Path;
    use std::process::Command as StdCommand;

    pub fn git(repo: &Path, args: &[&str]) {
        let status = StdCommand::new("git")
            .args(args)
            .current_dir(repo)
            .env("GIT_AUTHOR_NAME", "test")
            .env("GIT_AUTHOR_EMAIL", "test@example.com")
            .env("GIT_COMMITTER_NAME", "test")
            .env("GIT_COMMITTER_EMAIL", "test@example.com")
            .status()
            .expect("failed to run git");
        assert!(status.success(), "git {:?} failed", args);
    }

    /// Repository with two commits; the second rewrites the greeting line.
    pub fn seeded_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        git(dir.path(), &["init", "-q", "-b", "main"]);
        std::fs::write(dir.path().join("greeting.py"), "print('hello')\n").unwrap();
        git(dir.path(), &["add", "."]);
        git(dir.path(), &["commit", "-q", "-m", "initial"]);
        std::fs::write(dir.path().join("greeting.py"), "print('hi')\n").unwrap();
        git(dir.path(), &["add", "."]);
        git(dir.path(), &["commit", "-q", "-m", "change greeting"]);
        dir
    }
}
