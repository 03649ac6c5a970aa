use regex::Regex;
use std::sync::OnceLock;

fn ansi_escape() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1B\[[0-9;?]*[ -/]*[@-~]").ok()).as_ref()
}

/// Make text posted by other users safe to print on one terminal line:
/// strip CSI escape sequences and control characters, collapse whitespace,
/// cut to `max_chars`.
pub fn sanitize_for_terminal(s: &str, max_chars: usize) -> String {
    let no_ansi = match ansi_escape() {
        Some(re) => re.replace_all(s, "").into_owned(),
        None => s.to_string(),
    };

    let cleaned: String = no_ansi
        .chars()
        .map(|ch| if ch.is_whitespace() { ' ' } else { ch })
        .filter(|ch| !ch.is_control())
        .collect();

    cleaned
        .split(' ')
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(max_chars)
        .collect()
}
