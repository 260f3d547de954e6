//! Canned counterpart replies for the demo chat.
//!
//! Rules are checked in order against the lowercased outgoing text; the
//! first match wins. With no match, one of the generic acknowledgements is
//! picked at random.

use rand::seq::SliceRandom;
use rand::Rng;

enum Trigger {
    /// Any keyword appears anywhere in the text
    Contains(&'static [&'static str]),
    /// Any keyword appears as a whole word
    Word(&'static [&'static str]),
}

impl Trigger {
    fn matches(&self, text: &str) -> bool {
        match self {
            Trigger::Contains(keywords) => keywords.iter().any(|k| text.contains(k)),
            Trigger::Word(keywords) => text
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| keywords.contains(&word)),
        }
    }
}

struct ReplyRule {
    trigger: Trigger,
    response: &'static str,
}

const RULES: &[ReplyRule] = &[
    ReplyRule {
        trigger: Trigger::Contains(&["price", "cost", "negotiable"]),
        response: "The price is slightly negotiable for serious buyers. Would you like to discuss it over a call?",
    },
    ReplyRule {
        trigger: Trigger::Contains(&["visit", "see the property", "viewing"]),
        response: "Sure! I'm available for a site visit this weekend. What time works best for you?",
    },
    ReplyRule {
        trigger: Trigger::Contains(&["available", "availability"]),
        response: "Yes, the property is still available. A few people have shown interest, so I'd suggest visiting soon.",
    },
    ReplyRule {
        trigger: Trigger::Contains(&["document", "papers", "title deed"]),
        response: "All documents are clear and verified. I can share copies of the sale deed and approvals once we meet.",
    },
    ReplyRule {
        trigger: Trigger::Word(&["hi", "hello", "hey", "namaste"]),
        response: "Hello! Thanks for your interest in the property. How can I help you?",
    },
];

pub const FALLBACK_REPLIES: [&str; 4] = [
    "Thanks for your message! I'll get back to you shortly.",
    "Got it. Let me check and reply with the details.",
    "Sounds good. Feel free to ask if you have any other questions about the property.",
    "Thank you for reaching out. When would be a good time to talk?",
];

/// Reply for a keyword rule, if any rule matches
pub fn keyword_reply(outgoing: &str) -> Option<&'static str> {
    let text = outgoing.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.trigger.matches(&text))
        .map(|rule| rule.response)
}

/// Pick the counterpart's reply to `outgoing`
pub fn canned_reply<R: Rng + ?Sized>(outgoing: &str, rng: &mut R) -> &'static str {
    keyword_reply(outgoing).unwrap_or_else(|| {
        FALLBACK_REPLIES
            .choose(rng)
            .copied()
            .unwrap_or(FALLBACK_REPLIES[0])
    })
}
