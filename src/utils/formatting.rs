use crate::platform::UserId;

/// Format a user mention.
pub fn mention_user(user: UserId) -> String {
    format!("<@{}>", user)
}

/// Truncate a string to a maximum length, adding ellipsis if needed.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mentions_use_the_numeric_id() {
        assert_eq!(mention_user(UserId(42)), "<@42>");
    }

    #[test]
    fn truncation_preserves_short_strings() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }
}
