//! Post-generation checks that keep replies in character.

/// Longest reply we send, in sentences.
pub const MAX_SENTENCES: usize = 2;

const BLOCKED_WORDS: &[&str] = &[
    "fuck", "fucking", "shit", "bitch", "bastard", "asshole", "idiot", "stupid", "moron",
    "damn", "bloody", "chutiya", "madarchod", "bhenchod", "behenchod", "saala", "kamina",
    "harami", "gandu",
];

const SECRET_WORDS: &[&str] = &["otp", "pin", "cvv", "password", "code"];

const SPEAKER_LABELS: &[&str] = &["you:", "me:", "reply:", "response:"];

/// Clean up a raw model reply, or reject it.
///
/// Rejects empty text, profanity and anything that reads like handing over a
/// credential. Accepted replies are flattened onto one line and cut to
/// [`MAX_SENTENCES`] sentences.
pub fn sanitize_reply(raw: &str) -> Option<String> {
    let text = strip_wrapping(raw);
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return None;
    }

    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    if words.iter().any(|w| BLOCKED_WORDS.contains(w)) {
        return None;
    }
    if discloses_secret(&words) {
        return None;
    }

    Some(first_sentences(&text, MAX_SENTENCES))
}

fn strip_wrapping(raw: &str) -> &str {
    let mut text = raw.trim();
    for label in SPEAKER_LABELS {
        if text.len() >= label.len()
            && text.is_char_boundary(label.len())
            && text[..label.len()].eq_ignore_ascii_case(label)
        {
            text = text[label.len()..].trim_start();
            break;
        }
    }
    text.trim_matches(|c: char| c == '"' || c == '\u{201c}' || c == '\u{201d}')
        .trim()
}

/// A credential word next to something that looks like its value.
fn discloses_secret(words: &[&str]) -> bool {
    let mentions_secret = words.iter().any(|w| SECRET_WORDS.contains(w));
    mentions_secret
        && words
            .iter()
            .any(|w| (4..=8).contains(&w.len()) && w.chars().all(|c| c.is_ascii_digit()))
}

/// The first `max` sentences of `text`. Runs such as `...` or `?!` end a
/// single sentence.
fn first_sentences(text: &str, max: usize) -> String {
    let mut count = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !is_terminator(c) {
            continue;
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if !is_terminator(next) {
                break;
            }
            end = j + next.len_utf8();
            chars.next();
        }
        if chars.peek().is_none_or(|&(_, next)| next.is_whitespace()) {
            count += 1;
            if count == max {
                return text[..end].trim().to_string();
            }
        }
    }
    text.trim().to_string()
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '\u{0964}')
}
