/// Number of leading characters hidden by [`mask_email`].
pub const MASKED_PREFIX_CHARS: usize = 5;

/// Hides the first five characters of an email for log output.
///
/// Shorter inputs are masked entirely.
pub fn mask_email(email: &str) -> String {
    let hidden = email.chars().take(MASKED_PREFIX_CHARS).count();
    let rest: String = email.chars().skip(MASKED_PREFIX_CHARS).collect();
    format!("{}{}", "*".repeat(hidden), rest)
}
