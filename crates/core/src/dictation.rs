//! Cleanup pass for dictated free text.
//!
//! Speech engines hand back a stream of words with punctuation spoken out
//! loud. [`polish_transcript`] turns the spoken marks into characters, fixes
//! the spacing around them, capitalizes sentence starts and guarantees a
//! terminal punctuation mark. Purely lexical; no attempt at understanding.

struct SpokenMark {
    phrase: &'static [&'static str],
    mark: &'static str,
    /// `true` for marks that attach to the following word, like `(`.
    attaches_forward: bool,
}

const SPOKEN_MARKS: &[SpokenMark] = &[
    SpokenMark {
        phrase: &["full", "stop"],
        mark: ".",
        attaches_forward: false,
    },
    SpokenMark {
        phrase: &["period"],
        mark: ".",
        attaches_forward: false,
    },
    SpokenMark {
        phrase: &["comma"],
        mark: ",",
        attaches_forward: false,
    },
    SpokenMark {
        phrase: &["question", "mark"],
        mark: "?",
        attaches_forward: false,
    },
    SpokenMark {
        phrase: &["exclamation", "mark"],
        mark: "!",
        attaches_forward: false,
    },
    SpokenMark {
        phrase: &["colon"],
        mark: ":",
        attaches_forward: false,
    },
    SpokenMark {
        phrase: &["semicolon"],
        mark: ";",
        attaches_forward: false,
    },
    SpokenMark {
        phrase: &["ellipsis"],
        mark: "…",
        attaches_forward: false,
    },
    SpokenMark {
        phrase: &["open", "parenthesis"],
        mark: "(",
        attaches_forward: true,
    },
    SpokenMark {
        phrase: &["close", "parenthesis"],
        mark: ")",
        attaches_forward: false,
    },
];

/// Characters that close a sentence; nothing is appended after these.
const TERMINAL_MARKS: [char; 5] = ['.', '!', '?', '…', ')'];

/// Polishes a raw dictation transcript into presentable prose.
///
/// An empty or whitespace-only transcript polishes to the empty string.
pub fn polish_transcript(input: &str) -> String {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    if tokens.is_empty() {
        return String::new();
    }

    let mut text = String::with_capacity(input.len());
    let mut glue_next = false;
    let mut index = 0;
    while index < tokens.len() {
        match spoken_mark_at(&tokens, index) {
            Some(mark) => {
                if mark.attaches_forward {
                    if !text.is_empty() && !glue_next {
                        text.push(' ');
                    }
                    text.push_str(mark.mark);
                    glue_next = true;
                } else {
                    text.push_str(mark.mark);
                    glue_next = false;
                }
                index += mark.phrase.len();
            }
            None => {
                if !text.is_empty() && !glue_next {
                    text.push(' ');
                }
                text.push_str(tokens[index]);
                glue_next = false;
                index += 1;
            }
        }
    }

    if !text.ends_with(TERMINAL_MARKS) {
        text.push('.');
    }
    capitalize_sentences(&text)
}

fn spoken_mark_at(tokens: &[&str], index: usize) -> Option<&'static SpokenMark> {
    SPOKEN_MARKS.iter().find(|mark| {
        tokens[index..]
            .iter()
            .zip(mark.phrase)
            .filter(|(token, word)| token.eq_ignore_ascii_case(word))
            .count()
            == mark.phrase.len()
    })
}

fn capitalize_sentences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut boundary = true;
    for ch in text.chars() {
        if boundary && ch.is_alphabetic() {
            out.extend(ch.to_uppercase());
            boundary = false;
            continue;
        }
        if matches!(ch, '.' | '!' | '?' | '…') {
            boundary = true;
        } else if !ch.is_whitespace() {
            boundary = false;
        }
        out.push(ch);
    }
    out
}
