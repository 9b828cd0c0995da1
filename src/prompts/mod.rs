//! Prompt templates: cached loading with a remote override, and safe
//! placeholder substitution.

pub mod store;
pub mod template;

pub use store::PromptStore;
pub use template::format_prompt;

/// Template used to turn an email into an issue-creation request.
pub const GITHUB_ISSUE_PROMPT: &str = "github_issue.txt";
