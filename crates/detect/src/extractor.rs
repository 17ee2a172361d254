//! Pulls actionable identifiers out of free text.

use std::sync::LazyLock;

use {
    decoy_common::{Category, IntelligenceRecord, Message},
    regex::{Captures, Regex},
    url::Url,
};

static URL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).ok());

static UPI_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[\w.\-]+@[A-Za-z]{2,}[A-Za-z0-9.\-]*").ok());

// Digit groups joined by at most one space or dash.
static NUMBER_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\+?\d(?:[ \-]?\d)*").ok());

/// Longest digit block that may be one piece of a number written in groups.
const MAX_BLOCK: usize = 6;

static CODE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\b\d{6}\b").ok());

static IFSC_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{4}0[A-Z0-9]{6}\b").ok());

/// UPI-only handles. `local@handle.<tld>` is still a UPI id for these; no
/// mail domain lives under them.
const UPI_HANDLES: &[&str] = &[
    "ybl", "oksbi", "okaxis", "okicici", "okhdfcbank", "ibl", "apl", "axl", "upi", "ptyes",
    "ptaxis", "pthdfc", "ptsbi", "waaxis", "wasbi", "wahdfcbank", "waicici", "jupiteraxis",
    "fbl", "okbizaxis", "ikwik",
];

const EMAIL_SUFFIXES: &[&str] = &[".com", ".net", ".org", ".gov", ".edu", ".in", ".co"];

const SAFE_DOMAINS: &[&str] = &[
    "google.com",
    "facebook.com",
    "twitter.com",
    "instagram.com",
    "linkedin.com",
    "youtube.com",
    "gov.in",
    "nic.in",
    "rbi.org.in",
];

const SUSPICIOUS_KEYWORDS: &[&str] = &[
    "urgent", "immediately", "blocked", "suspended", "verify", "otp", "pin", "password",
    "cvv", "transfer", "send money", "prize", "winner", "lottery", "refund", "cashback",
    "click here", "update now", "confirm", "validate", "bank account", "upi", "payment",
    "amount", "arrest", "legal action", "police", "fine", "penalty", "customer care",
    "helpline", "support", "jaldi", "turant", "abhi", "block", "band",
];

const URL_TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', ')', '\'', '"'];

/// Scan `text` and union everything found into a copy of `existing`.
///
/// Blank input returns `existing` unchanged.
pub fn extract(text: &str, existing: &IntelligenceRecord) -> IntelligenceRecord {
    existing.merged(&scan(text))
}

/// Categories the correspondent has already handed over, counting every
/// scammer turn in `history` plus `current`.
pub fn supplied_items(history: &[Message], current: &str) -> Vec<Category> {
    let mut seen = scan(current);
    for msg in history.iter().filter(|m| m.is_from_scammer()) {
        seen.merge(&scan(&msg.text));
    }
    Category::ALL
        .into_iter()
        .filter(|c| *c != Category::SuspiciousKeyword && !seen.entries(*c).is_empty())
        .collect()
}

/// Everything identifiable in a single piece of text.
pub fn scan(text: &str) -> IntelligenceRecord {
    let mut found = IntelligenceRecord::new();
    if text.trim().is_empty() {
        return found;
    }

    let masked = collect_links(text, &mut found);
    collect_upi_ids(&masked, &mut found);
    collect_numbers(&masked, &mut found);
    collect_keywords(text, &masked, &mut found);
    found
}

// ── Links ───────────────────────────────────────────────────────────────────

/// Record non-safe links and return `text` with every link blanked out so the
/// other scanners do not pick up fragments of it.
fn collect_links(text: &str, found: &mut IntelligenceRecord) -> String {
    let Some(re) = URL_RE.as_ref() else {
        return text.to_string();
    };

    for m in re.find_iter(text) {
        let link = m.as_str().trim_end_matches(URL_TRAILING);
        let Ok(parsed) = Url::parse(link) else {
            continue;
        };
        let Some(host) = parsed.host_str() else {
            continue;
        };
        if !is_safe_host(host) {
            found.insert(Category::PhishingLink, link);
        }
    }

    re.replace_all(text, |caps: &Captures| " ".repeat(caps[0].len()))
        .into_owned()
}

fn is_safe_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    SAFE_DOMAINS.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|rest| rest.ends_with('.'))
    })
}

// ── UPI ids ─────────────────────────────────────────────────────────────────

fn collect_upi_ids(text: &str, found: &mut IntelligenceRecord) {
    let Some(re) = UPI_RE.as_ref() else {
        return;
    };
    for m in re.find_iter(text) {
        let candidate = m.as_str().trim_end_matches(['.', '-']).to_lowercase();
        if is_upi_id(&candidate) {
            found.insert(Category::UpiId, candidate);
        }
    }
}

fn is_upi_id(candidate: &str) -> bool {
    let Some((local, provider)) = candidate.split_once('@') else {
        return false;
    };
    if local.is_empty() || provider.is_empty() {
        return false;
    }
    let Some((handle, tld)) = provider.split_once('.') else {
        // A bare handle (`ybl`, `paytm`, `okaxis`) is never a mail domain.
        return true;
    };
    let email_like = EMAIL_SUFFIXES.iter().any(|suffix| provider.ends_with(suffix));
    if !email_like {
        return true;
    }
    !tld.contains('.') && UPI_HANDLES.contains(&handle)
}

// ── Phone numbers and bank accounts ─────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum NumberKind {
    Phone(String),
    Account(String),
}

fn collect_numbers(text: &str, found: &mut IntelligenceRecord) {
    let Some(re) = NUMBER_RE.as_ref() else {
        return;
    };
    for m in re.find_iter(text) {
        if touches_word(text, m.start(), m.end()) {
            continue;
        }
        let groups: Vec<String> = m.as_str().split_whitespace().map(digits_of).collect();
        for number in split_run(&groups) {
            match number {
                NumberKind::Phone(n) => found.insert(Category::PhoneNumber, n),
                NumberKind::Account(n) => found.insert(Category::BankAccount, n),
            };
        }
    }
}

/// Space-separated digit groups may be one number written in blocks or
/// several numbers side by side. Mobiles are claimed first, widest span
/// first; whatever groups are left over can still join into an account.
fn split_run(groups: &[String]) -> Vec<NumberKind> {
    let n = groups.len();
    let mut claimed = vec![false; n];
    let mut out = Vec::new();

    let mut i = 0;
    while i < n {
        let hit = (i + 1..=n)
            .rev()
            .find_map(|j| mobile_span(&groups[i..j]).map(|m| (j, m)));
        match hit {
            Some((j, mobile)) => {
                claimed[i..j].fill(true);
                out.push(NumberKind::Phone(mobile));
                i = j;
            },
            None => i += 1,
        }
    }

    let mut i = 0;
    while i < n {
        if claimed[i] {
            i += 1;
            continue;
        }
        let free_end = (i..n).find(|&k| claimed[k]).unwrap_or(n);
        let hit = (i + 1..=free_end)
            .rev()
            .find_map(|j| account_span(&groups[i..j]).map(|a| (j, a)));
        match hit {
            Some((j, account)) => {
                out.push(NumberKind::Account(account));
                i = j;
            },
            None => i += 1,
        }
    }
    out
}

/// Digits of a span of groups. Joining only happens across short blocks; a
/// group that is already a full-length number stands alone.
fn joined(span: &[String]) -> Option<String> {
    if span.len() > 1 && span.iter().any(|g| g.len() > MAX_BLOCK) {
        return None;
    }
    Some(span.concat())
}

fn mobile_span(span: &[String]) -> Option<String> {
    let digits = joined(span)?;
    as_mobile(&digits).map(str::to_string)
}

fn account_span(span: &[String]) -> Option<String> {
    let digits = joined(span)?;
    ((9..=18).contains(&digits.len()) && !digits.starts_with("20") && as_mobile(&digits).is_none())
        .then_some(digits)
}

/// The 10-digit mobile number behind `digits`, allowing a `91` or `0` prefix.
fn as_mobile(digits: &str) -> Option<&str> {
    let core = match digits.len() {
        10 => digits,
        11 => digits.strip_prefix('0')?,
        12 => digits.strip_prefix("91")?,
        _ => return None,
    };
    core.starts_with(['6', '7', '8', '9']).then_some(core)
}

fn digits_of(run: &str) -> String {
    run.chars().filter(char::is_ascii_digit).collect()
}

/// True if the match is glued to a letter or digit on either side.
fn touches_word(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    [before, after]
        .into_iter()
        .flatten()
        .any(|c| c.is_alphanumeric() || c == '_')
}

// ── Keywords ────────────────────────────────────────────────────────────────

fn collect_keywords(text: &str, masked: &str, found: &mut IntelligenceRecord) {
    let lower = text.to_lowercase();
    for keyword in SUSPICIOUS_KEYWORDS {
        if lower.contains(keyword) {
            found.insert(Category::SuspiciousKeyword, *keyword);
        }
    }

    if let Some(re) = CODE_RE.as_ref() {
        for m in re.find_iter(masked) {
            found.insert(Category::SuspiciousKeyword, format!("Code: {}", m.as_str()));
        }
    }

    if let Some(re) = IFSC_RE.as_ref() {
        for m in re.find_iter(masked) {
            found.insert(Category::SuspiciousKeyword, format!("IFSC: {}", m.as_str()));
        }
    }
}
