use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Built-in content-policy words, always active. Deployment-specific words
/// come in via `BLOCKLIST_WORDS` and are merged on top.
static BUILTIN_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["spamlink.example", "free crypto airdrop", "t.me/joinchat"]
        .into_iter()
        .collect()
});

/// Case-sensitive substring blocklist. Matching is intentionally exact: the
/// configured words are treated as literal fragments, with no normalization
/// or case folding.
pub struct Blocklist {
    words: Vec<String>,
}

impl Blocklist {
    pub fn new(configured: &[String]) -> Self {
        let mut words: Vec<String> = BUILTIN_WORDS.iter().map(|w| w.to_string()).collect();
        for word in configured {
            if !words.iter().any(|w| w == word) {
                words.push(word.clone());
            }
        }
        Self { words }
    }

    /// First blocked fragment contained in `text`, if any.
    pub fn matches<'a>(&'a self, text: &str) -> Option<&'a str> {
        self.words
            .iter()
            .find(|word| text.contains(word.as_str()))
            .map(|w| w.as_str())
    }
}
