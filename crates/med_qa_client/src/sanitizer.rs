//! Outbound text sanitizer. Masks profanity before a message is stored or sent.

use std::collections::HashSet;

/// Text transform applied to every user message before it leaves the input box.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, text: &str) -> String;
}

const DEFAULT_WORDS: &[&str] = &[
    "arse", "arsehole", "ass", "asshole", "bastard", "bitch", "bollocks", "bullshit", "crap",
    "cunt", "damn", "dick", "dickhead", "fuck", "fucked", "fucker", "fucking", "motherfucker",
    "piss", "pissed", "prick", "shit", "shitty", "slut", "twat", "wanker", "whore",
];

/// Word-list profanity filter. Whole-word, case-insensitive; each hit becomes
/// a run of `*` of the same length.
#[derive(Debug, Clone)]
pub struct ProfanityFilter {
    words: HashSet<String>,
}

impl Default for ProfanityFilter {
    fn default() -> Self {
        Self::with_words(std::iter::empty::<&str>())
    }
}

impl ProfanityFilter {
    /// Built-in list plus `extra` words.
    pub fn with_words<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = DEFAULT_WORDS
            .iter()
            .map(|w| w.to_string())
            .chain(extra.into_iter().map(|w| w.as_ref().to_lowercase()))
            .collect();
        Self { words }
    }

    fn is_profane(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }
}

impl Sanitizer for ProfanityFilter {
    fn sanitize(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut word = String::new();
        let flush = |word: &mut String, out: &mut String| {
            if self.is_profane(word) {
                out.extend(std::iter::repeat('*').take(word.chars().count()));
            } else {
                out.push_str(word);
            }
            word.clear();
        };
        for c in text.chars() {
            if c.is_ascii_alphabetic() {
                word.push(c);
            } else {
                flush(&mut word, &mut out);
                out.push(c);
            }
        }
        flush(&mut word, &mut out);
        out
    }
}
