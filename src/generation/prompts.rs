use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n?```").expect("valid fence regex")
});

/// User message for the narration script.
///
/// Without document content the question alone is the prompt.
pub fn script_user_message(content: Option<&str>, question: &str) -> String {
    match content.map(str::trim).filter(|c| !c.is_empty()) {
        Some(content) => format!("{}\n\nUser's Question: {}", content, question.trim()),
        None => question.trim().to_string(),
    }
}

/// Strip the Markdown code fence models like to wrap HTML in.
///
/// When several fenced blocks are present the one containing `<section` wins.
pub fn clean_markup(response: &str) -> String {
    let fenced: Vec<&str> = FENCED_BLOCK
        .captures_iter(response)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();

    let body = fenced
        .iter()
        .find(|block| block.contains("<section"))
        .or_else(|| fenced.first())
        .copied()
        .unwrap_or(response);

    body.trim().to_string()
}
