//! Scam likelihood scoring from keyword categories and compound patterns.
//!
//! Weights are kept in hundredths so that threshold comparisons are exact.

use std::{collections::BTreeSet, sync::LazyLock};

use {decoy_common::Message, regex::Regex};

/// A message (or a history) at or above this score is treated as a scam.
pub const SCAM_THRESHOLD: f64 = 0.30;

const THRESHOLD_HUNDREDTHS: u32 = 30;
const PATTERN_WEIGHT: u32 = 15;
const PATTERN_CAP: u32 = 30;

struct KeywordCategory {
    label: &'static str,
    weight: u32,
    keywords: &'static [&'static str],
}

// Categories are disjoint: a keyword belongs to exactly one of them.
const CATEGORIES: &[KeywordCategory] = &[
    KeywordCategory {
        label: "urgency tactics",
        weight: 15,
        keywords: &[
            "immediately", "urgent", "now", "today", "hurry", "quick", "fast",
            "limited time", "act now", "don't delay", "expire", "deadline", "expiring",
            "last chance", "final notice", "action required", "attention", "alert",
            "notice", "overdue", "disconnection",
            // Hindi (romanised)
            "turant", "jaldi", "abhi", "aaj hi", "fauran", "saavdhan",
        ],
    },
    KeywordCategory {
        label: "threatening language",
        weight: 25,
        keywords: &[
            "blocked", "suspended", "locked", "frozen", "deactivated", "legal action",
            "arrest", "court", "penalty", "fine", "case filed", "warrant", "crime", "kyc",
            "expiry", "suspicious", "unusual", "unauthorized", "fraud", "hacked",
            "compromised", "security alert", "warning", "investigation",
            "under surveillance", "held", "detained", "lapsed", "closed", "disabled",
            "invalid",
            // Hindi (romanised)
            "band", "block", "jail", "thana", "case",
        ],
    },
    KeywordCategory {
        label: "financial terms",
        weight: 20,
        keywords: &[
            "bank account", "otp", "pin", "password", "cvv", "card number", "upi",
            "transfer", "payment", "refund", "cashback", "prize", "lottery", "winner",
            "reward", "bonus", "free money", "won", "congratulations", "claim", "lakh",
            "crore", "jackpot", "atm", "credit card", "debit card", "loan", "approved",
            "selected", "iphone", "samsung", "gift", "voucher", "offer", "shopping",
            "salary", "income", "profit", "investment", "return", "double", "insurance",
            "premium", "policy", "duty", "tax", "fee", "charge", "electricity", "bill",
            "light", "power", "meter", "gold", "coin", "car", "bike", "laptop", "job",
            "hiring", "vacancy", "interview",
            // Hindi (romanised)
            "khata", "paisa", "rupees", "rs", "inaam", "naukri",
        ],
    },
    KeywordCategory {
        label: "authority impersonation",
        weight: 15,
        keywords: &[
            "rbi", "reserve bank", "sbi", "hdfc", "icici", "axis", "government",
            "income tax", "customs", "police", "cbi", "customer care", "support",
            "helpline", "official",
        ],
    },
    KeywordCategory {
        label: "information request",
        weight: 10,
        keywords: &[
            "share", "send", "give", "provide", "enter", "click", "verify", "confirm",
            "update", "validate", "submit", "link", "http", "www", "open", "visit",
            "login", "register", "call", "contact", "dial", "press", "tap", "download",
            "install",
            // Hindi (romanised)
            "bhejo", "do", "batao", "dijiye", "karo",
        ],
    },
];

const PATTERN_SOURCES: &[(&str, &str)] = &[
    ("upi_request", r"(share|send|give).*(upi|vpa|@)"),
    ("otp_request", r"(share|send|give|enter).*(otp|code|pin)"),
    ("link_click", r"(click|open|visit).*(link|url|http)"),
    ("money_request", r"(send|transfer|pay).*(money|amount|rs|₹|\d+)"),
    ("kyc_scam", r"(kyc|update|verify).*(account|bank|details|wallet)"),
    (
        "job_scam",
        r"(job|work|hiring|vacancy|earning|salary).*(daily|guaranteed|apply|hr)",
    ),
    (
        "electricity_scam",
        r"(electricity|bill|light|power).*(disconnect|unpaid|cut|update)",
    ),
    (
        "customs_scam",
        r"(customs|parcel|package|delivery).*(hold|held|duty|tax|fee)",
    ),
    ("account_threat", r"(account|khata).*(block|suspend|freeze|band)"),
    (
        "prize_scam",
        r"(won|winner|prize|lottery|congratulations).*(lakh|crore|rs|₹|\d+)",
    ),
];

static PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    PATTERN_SOURCES
        .iter()
        .filter_map(|(name, source)| Regex::new(source).ok().map(|re| (*name, re)))
        .collect()
});

/// Verdict for a single message.
#[derive(Debug, Clone, PartialEq)]
pub struct ScamScore {
    pub is_scam: bool,
    /// Uncapped sum of all contributions.
    pub score: f64,
    /// `score` clamped to `[0, 1]`.
    pub confidence: f64,
    pub matched_keywords: BTreeSet<String>,
    /// Names of the compound patterns that fired.
    pub patterns: Vec<&'static str>,
    pub notes: String,
}

impl ScamScore {
    fn empty(notes: &str) -> Self {
        Self {
            is_scam: false,
            score: 0.0,
            confidence: 0.0,
            matched_keywords: BTreeSet::new(),
            patterns: Vec::new(),
            notes: notes.to_string(),
        }
    }

    fn confidence_hundredths(&self) -> u32 {
        (self.confidence * 100.0).round() as u32
    }
}

/// Score a single message.
pub fn score(text: &str) -> ScamScore {
    if text.trim().is_empty() {
        return ScamScore::empty("no text provided");
    }

    let lower = text.to_lowercase();
    let mut total: u32 = 0;
    let mut matched_keywords = BTreeSet::new();
    let mut notes_parts: Vec<String> = Vec::new();

    for category in CATEGORIES {
        let found: Vec<&str> = category
            .keywords
            .iter()
            .copied()
            .filter(|kw| lower.contains(kw))
            .collect();
        if found.is_empty() {
            continue;
        }
        total += category.weight;
        matched_keywords.extend(found.into_iter().map(str::to_string));
        notes_parts.push(category.label.to_string());
    }

    let patterns: Vec<&'static str> = PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(&lower))
        .map(|(name, _)| *name)
        .collect();
    total += (patterns.len() as u32 * PATTERN_WEIGHT).min(PATTERN_CAP);
    notes_parts.extend(patterns.iter().map(|name| format!("pattern: {name}")));

    let notes = if notes_parts.is_empty() {
        "No scam indicators found".to_string()
    } else {
        format!("Scammer used {}", notes_parts.join(", "))
    };

    let score = f64::from(total) / 100.0;
    ScamScore {
        is_scam: total >= THRESHOLD_HUNDREDTHS,
        score,
        confidence: score.min(1.0),
        matched_keywords,
        patterns,
        notes,
    }
}

/// Cumulative verdict over the scammer-authored turns of a history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryScore {
    pub score: f64,
    pub keywords: BTreeSet<String>,
}

impl HistoryScore {
    pub fn is_scam(&self) -> bool {
        self.score >= SCAM_THRESHOLD
    }
}

/// Re-score every scammer turn, summing at half weight and capping at 1.0.
pub fn score_history(history: &[Message]) -> HistoryScore {
    // Summed in hundredths; halving happens once at the end.
    let mut hundredths: u32 = 0;
    let mut keywords = BTreeSet::new();

    for msg in history.iter().filter(|m| m.is_from_scammer()) {
        let verdict = score(&msg.text);
        hundredths += verdict.confidence_hundredths();
        keywords.extend(verdict.matched_keywords);
    }

    HistoryScore {
        score: f64::from(hundredths.min(200)) / 200.0,
        keywords,
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, std::collections::HashSet};

    #[test]
    fn all_patterns_compile() {
        assert_eq!(PATTERNS.len(), PATTERN_SOURCES.len());
    }

    #[test]
    fn categories_are_disjoint() {
        let mut seen = HashSet::new();
        for category in CATEGORIES {
            for kw in category.keywords {
                assert!(seen.insert(*kw), "keyword {kw:?} is in two categories");
            }
        }
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\n\t ")]
    fn blank_input_is_not_a_scam(#[case] text: &str) {
        let verdict = score(text);
        assert!(!verdict.is_scam);
        assert_eq!(verdict.confidence, 0.0);
        assert!(verdict.matched_keywords.is_empty());
        assert_eq!(verdict.notes, "no text provided");
    }

    #[test]
    fn two_categories_cross_the_threshold() {
        let verdict = score("urgent otp");
        assert_eq!(verdict.score, 0.35);
        assert!(verdict.is_scam);
        assert!(verdict.matched_keywords.contains("urgent"));
        assert!(verdict.matched_keywords.contains("otp"));
    }

    #[test]
    fn exactly_at_threshold_is_a_scam() {
        // urgency (0.15) + authority (0.15)
        let verdict = score("Hurry, SBI");
        assert_eq!(verdict.score, 0.30);
        assert!(verdict.is_scam);
    }

    #[rstest]
    #[case("hurry")]
    #[case("sbi")]
    #[case("hello there, how are you")]
    fn below_threshold_is_not_a_scam(#[case] text: &str) {
        assert!(!score(text).is_scam);
    }

    #[test]
    fn no_indicators_note() {
        let verdict = score("hello there, how are you");
        assert_eq!(verdict.notes, "No scam indicators found");
        assert_eq!(verdict.score, 0.0);
    }

    #[test]
    fn pattern_bonus_is_capped() {
        let text = "Share your UPI, share the OTP, click the link, transfer money 500 \
                    and verify account now";
        let verdict = score(text);
        assert!(verdict.patterns.len() > 2);
        // urgency + financial + request + capped patterns
        assert_eq!(verdict.score, 0.75);
    }

    #[test]
    fn confidence_is_clamped() {
        let text = "URGENT: SBI account blocked! Share OTP now, click link to verify KYC, \
                    transfer Rs 5000 or police arrest. Congratulations you won 10 lakh prize";
        let verdict = score(text);
        assert!(verdict.score > 1.0);
        assert_eq!(verdict.confidence, 1.0);
    }

    #[test]
    fn scoring_is_deterministic() {
        let text = "Your electricity bill is unpaid, power will be cut tonight";
        assert_eq!(score(text), score(text));
        assert!(score(text).patterns.contains(&"electricity_scam"));
    }

    #[test]
    fn blocked_account_message() {
        let verdict = score(
            "URGENT: Your SBI account is blocked. Share OTP and account number 912345678901 now.",
        );
        assert!(verdict.is_scam);
        assert!(verdict.notes.contains("urgency tactics"));
        assert!(verdict.notes.contains("threatening language"));
        assert!(verdict.notes.starts_with("Scammer used "));
    }

    #[test]
    fn history_counts_only_scammer_turns_at_half_weight() {
        let history = vec![
            Message::scammer("urgent otp"),
            Message::agent("urgent otp urgent otp"),
            Message::scammer("hurry"),
        ];
        let cumulative = score_history(&history);
        // (0.35 + 0.15) / 2
        assert_eq!(cumulative.score, 0.25);
        assert!(!cumulative.is_scam());
        assert!(cumulative.keywords.contains("hurry"));
    }

    #[test]
    fn history_can_cross_threshold_on_its_own() {
        let history = vec![
            Message::scammer("urgent otp"),
            Message::scammer("blocked"),
        ];
        // (0.35 + 0.25) / 2 = 0.30
        assert!(score_history(&history).is_scam());
    }

    #[test]
    fn history_is_capped() {
        let loud = "URGENT: SBI account blocked! Share OTP now, click link to verify KYC";
        let history: Vec<_> = (0..5).map(|_| Message::scammer(loud)).collect();
        assert_eq!(score_history(&history).score, 1.0);
    }
}
