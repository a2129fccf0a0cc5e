// Jailbreak keyword screening
// Author: kelexine (https://github.com/kelexine)
//
// A case-insensitive substring test against the configured keyword list.
// Obfuscated phrasing ("i g n o r e") passes; that is the documented behavior.

/// Fixed reply for prompts refused by the filter.
pub const REFUSAL_MESSAGE: &str = "I cannot comply with that request due to security policies.";

/// Returns true if any keyword occurs anywhere in the prompt, ignoring case.
pub fn is_violation<S: AsRef<str>>(prompt: &str, keywords: &[S]) -> bool {
    let prompt = prompt.to_lowercase();
    keywords
        .iter()
        .any(|kw| prompt.contains(&kw.as_ref().to_lowercase()))
}

/// Keyword filter with the keyword list lowercased once up front.
#[derive(Debug, Clone, Default)]
pub struct SafetyFilter {
    keywords: Vec<String>,
}

impl SafetyFilter {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        Self {
            keywords: keywords
                .iter()
                .map(|kw| kw.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Same result as [`is_violation`] for the keywords this filter was built with.
    pub fn is_violation(&self, prompt: &str) -> bool {
        let prompt = prompt.to_lowercase();
        self.keywords.iter().any(|kw| prompt.contains(kw.as_str()))
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}
