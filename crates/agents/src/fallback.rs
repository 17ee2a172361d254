//! Canned in-character replies for when no provider produced anything usable.

use decoy_common::Category;

const GENERIC: [&str; 4] = [
    "Sir I am very tensed now. Please tell me exactly what to do step by step?",
    "Ok ok I understand. But please give me your number so I can call and understand better?",
    "Sir please help me. I dont want any problem with my account. Tell me what you need from me?",
    "I am ready to do whatever you say sir. Just tell me clearly what information you need?",
];

/// Stand-in for `GENERIC[1]` once a phone number has been shared.
const GENERIC_NUMBER_GIVEN: &str =
    "Ok ok I understand. I saved the number you gave, I will call after some time when my son comes home.";

fn mentions(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

/// Pick a reply from the incoming message, the turn number and what the
/// correspondent has already handed over. Never empty.
pub fn fallback_reply(message: &str, turn: usize, supplied: &[Category]) -> &'static str {
    let lower = message.to_lowercase();
    let given = |category| supplied.contains(&category);

    if turn == 0 {
        return if mentions(&lower, &["block", "suspend", "freeze"]) {
            "Oh my god! What happened to my account? Please sir help me what should I do?"
        } else if mentions(&lower, &["prize", "winner", "lottery"]) {
            "Really? I won something? But I dont remember entering any contest sir. Please tell me more details?"
        } else if mentions(&lower, &["otp", "verify"]) {
            "Verification for what sir? I am confused. Can you please explain properly?"
        } else {
            "Hello sir, I received your message but I am not understanding fully. Can you please explain what is the problem?"
        };
    }

    if mentions(&lower, &["upi", "vpa", "@"]) {
        return if given(Category::UpiId) {
            "Sir I typed the UPI ID you gave but it is showing some error. Do you have another one?"
        } else {
            "Ok sir, I will send. But which UPI ID exactly? Please write clearly so I dont make mistake."
        };
    }
    if mentions(&lower, &["bank", "account"]) {
        return if given(Category::BankAccount) {
            "Sir the account number is not going through, my app says invalid. Can you check it once?"
        } else {
            "Sir I have 2 bank accounts - SBI and PNB. Which one you are talking about? What is the problem exactly?"
        };
    }
    if mentions(&lower, &["link", "click", "http"]) {
        return if given(Category::PhishingLink) {
            "Sir I clicked but the page is not opening, only white screen. Is there another link?"
        } else {
            "Ok I will click. Can you send the link again? My phone is old sometimes links dont open properly."
        };
    }
    if mentions(&lower, &["otp", "code"]) {
        return "Sir OTP ke liye I need to open my phone. Which bank's OTP you need? Let me check.";
    }
    if mentions(&lower, &["call", "phone", "whatsapp"]) {
        return if given(Category::PhoneNumber) {
            "Sir I tried calling that number but it is not connecting. Do you have any other number?"
        } else {
            "Yes please call me sir. My number is... wait, what is your number? I will give missed call."
        };
    }
    if mentions(&lower, &["money", "transfer", "send", "pay"]) {
        return if given(Category::UpiId) || given(Category::BankAccount) {
            "Sir I am trying to send to the details you gave but my app is showing payment failed. Let me try again slowly."
        } else {
            "How much I need to send? And to which account/UPI? I am ready to send but tell me clearly."
        };
    }

    match turn % GENERIC.len() {
        1 if given(Category::PhoneNumber) => GENERIC_NUMBER_GIVEN,
        i => GENERIC[i],
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("Your account will be BLOCKED today", "What happened to my account")]
    #[case("Congratulations winner!", "I won something")]
    #[case("Please verify now", "Verification for what")]
    #[case("hello", "not understanding fully")]
    fn first_turn_openers(#[case] message: &str, #[case] expected: &str) {
        assert!(fallback_reply(message, 0, &[]).contains(expected));
    }

    #[test]
    fn follow_up_by_topic() {
        assert!(fallback_reply("send to my upi", 2, &[]).contains("which UPI ID"));
        assert!(fallback_reply("click http://x.in", 2, &[]).contains("send the link again"));
        assert!(fallback_reply("share the code", 2, &[]).contains("OTP"));
        assert!(fallback_reply("pay now", 2, &[]).contains("How much"));
    }

    #[test]
    fn stalls_on_supplied_items() {
        let reply = fallback_reply("pay to scam@ybl", 3, &[Category::UpiId]);
        assert!(reply.contains("showing some error"));
        let reply = fallback_reply("call 9876543210", 3, &[Category::PhoneNumber]);
        assert!(reply.contains("not connecting"));
    }

    #[test]
    fn money_request_respects_supplied_payment_details() {
        for supplied in [
            vec![Category::UpiId],
            vec![Category::BankAccount],
            vec![Category::UpiId, Category::BankAccount],
        ] {
            let reply = fallback_reply("pay now fast", 3, &supplied);
            assert!(!reply.contains("which account"), "{reply}");
            assert!(reply.contains("payment failed"));
        }
    }

    #[test]
    fn generic_pool_skips_number_request_once_given() {
        let reply = fallback_reply("hmm ok", 1, &[Category::PhoneNumber]);
        assert_eq!(reply, GENERIC_NUMBER_GIVEN);
        assert!(!reply.contains("give me your number"));
        assert_eq!(fallback_reply("hmm ok", 2, &[Category::PhoneNumber]), GENERIC[2]);
    }

    #[test]
    fn no_reply_asks_for_what_was_supplied() {
        let supplied = [
            Category::UpiId,
            Category::BankAccount,
            Category::PhishingLink,
            Category::PhoneNumber,
        ];
        for message in ["hmm", "pay now", "send upi", "bank account", "click link", "call me"] {
            for turn in 1..8 {
                let reply = fallback_reply(message, turn, &supplied).to_lowercase();
                for ask in ["which upi", "which account", "send the link", "your number"] {
                    assert!(!reply.contains(ask), "{message} / {turn}: {reply}");
                }
            }
        }
    }

    #[test]
    fn generic_pool_rotates() {
        assert_eq!(fallback_reply("hmm", 1, &[]), GENERIC[1]);
        assert_eq!(fallback_reply("hmm", 4, &[]), GENERIC[0]);
    }

    #[test]
    fn never_empty() {
        for turn in 0..8 {
            assert!(!fallback_reply("", turn, &[]).is_empty());
        }
    }
}
