const LINK_MARKERS: [&str; 2] = ["youtube.com", "youtu.be"];

/// Returns the first YouTube link found in `text`, with `https://` added when
/// the user left the scheme out.
pub fn find_youtube_link(text: &str) -> Option<String> {
    let token = text
        .split_whitespace()
        .find(|word| LINK_MARKERS.iter().any(|marker| word.contains(marker)))?;

    let token = token.trim_matches(|c: char| matches!(c, '<' | '>' | '(' | ')' | '"' | '\''));

    if token.starts_with("http://") || token.starts_with("https://") {
        Some(token.to_string())
    } else {
        Some(format!("https://{}", token))
    }
}
