use std::time::Duration;

/// Parse the moderation duration grammar `<integer><unit>` with unit one of
/// s/m/h/d. Anything else is rejected, including counts whose total seconds
/// overflow.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let input = input.trim();
    let unit = input.chars().last()?;
    let digits = &input[..input.len() - unit.len_utf8()];

    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        'd' => 86400,
        _ => return None,
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;
    amount.checked_mul(multiplier).map(Duration::from_secs)
}

/// Human-readable duration for notices.
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();

    if total_secs < 60 {
        format!("{} second{}", total_secs, plural(total_secs))
    } else if total_secs < 3600 {
        let mins = total_secs / 60;
        format!("{} minute{}", mins, plural(mins))
    } else if total_secs < 86400 {
        let hours = total_secs / 3600;
        format!("{} hour{}", hours, plural(hours))
    } else {
        let days = total_secs / 86400;
        format!("{} day{}", days, plural(days))
    }
}

fn plural(n: u64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
