use {
    decoy_common::{Category, Message},
    decoy_config::PersonaConfig,
};

/// Number of prior turns shown to the model.
pub const CONTEXT_TURNS: usize = 6;

/// The victim character we play.
#[derive(Debug, Clone)]
pub struct Persona {
    pub name: String,
    pub age: u32,
    /// Replaces the built-in character description.
    pub character: Option<String>,
}

impl Default for Persona {
    fn default() -> Self {
        Self::from(&PersonaConfig::default())
    }
}

impl From<&PersonaConfig> for Persona {
    fn from(cfg: &PersonaConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            age: cfg.age,
            character: cfg.system_prompt.clone(),
        }
    }
}

/// Build the system prompt for one reply.
///
/// `supplied` lists what the correspondent has already handed over; the model
/// is told to stall on those instead of asking again.
pub fn build_system_prompt(persona: &Persona, supplied: &[Category]) -> String {
    let name = &persona.name;
    let mut prompt = match &persona.character {
        Some(custom) => format!("{custom}\n\n"),
        None => format!(
            "You are roleplaying as {name}, a {age}-year-old person from a small town who is \
             not very tech-savvy. You received an unexpected message about your bank account \
             and you need to respond naturally.\n\n",
            age = persona.age,
        ),
    };

    prompt.push_str(concat!(
        "## Your character\n\n",
        "- Simple, trusting person who worries about money\n",
        "- Not good with technology or banking terms\n",
        "- Makes occasional spelling mistakes\n",
        "- Polite and respectful (uses \"sir\", \"please\")\n",
        "- Asks many questions to understand better\n\n",
        "## Safety\n\n",
        "- Never use profanity, abusive language or insults, even if the other person is abusive.\n",
        "- If the other person becomes aggressive, respond with fear or confusion, never aggression.\n",
        "- Never actually complete a payment, share a real OTP, PIN or password, or help with \
         anything illegal. Only pretend to go along.\n",
        "- Waste their time by being slow and confused, not by being rude.\n\n",
        "## How to respond\n\n",
        "- Stay in character at all times.\n",
        "- Act worried and confused and ask for details: which bank account, which link, \
         which UPI ID, which phone number.\n",
        "- Use simple English.\n",
        "- Reply with at most 2 short sentences and nothing else.\n",
    ));

    if !supplied.is_empty() {
        prompt.push_str("\n## Already given to you\n\n");
        for category in supplied {
            prompt.push_str("- ");
            prompt.push_str(describe(*category));
            prompt.push('\n');
        }
        prompt.push_str(
            "\nDo not ask for these again. Say they are not working (the link is not \
             opening, the UPI ID shows an error, the number is not connecting) and ask \
             for another one or for help.\n",
        );
    }

    prompt
}

fn describe(category: Category) -> &'static str {
    match category {
        Category::BankAccount => "their bank account number",
        Category::UpiId => "their UPI ID",
        Category::PhoneNumber => "their phone number",
        Category::PhishingLink => "a link to open",
        Category::SuspiciousKeyword => "some instructions",
    }
}

/// Render the last few turns plus the current message as a transcript that
/// ends with our own empty turn.
pub fn build_context(history: &[Message], current: &str) -> String {
    let start = history.len().saturating_sub(CONTEXT_TURNS);
    let mut context = String::new();
    for msg in &history[start..] {
        context.push_str(msg.sender.transcript_label());
        context.push_str(": ");
        context.push_str(msg.text.trim());
        context.push('\n');
    }
    context.push_str("Scammer: ");
    context.push_str(current.trim());
    context.push_str("\nYou: ");
    context
}

/// Chat messages handed to every provider in the chain.
pub fn build_messages(
    persona: &Persona,
    history: &[Message],
    current: &str,
    supplied: &[Category],
) -> Vec<serde_json::Value> {
    vec![
        serde_json::json!({
            "role": "system",
            "content": build_system_prompt(persona, supplied),
        }),
        serde_json::json!({
            "role": "user",
            "content": build_context(history, current),
        }),
    ]
}
