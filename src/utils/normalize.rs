//! Normalisation of LLM free text into a bracketed list of double-quoted strings.
//!
//! Models asked for "a Python list" answer with single quotes, typographic
//! quotes, inline `#` comments, stray quotes mid-sentence, padding around
//! separators and prose before or after the list. [`normalize`] rewrites all
//! of that into something like `["first", "second"]` so that
//! [`super::literal::parse_literal_list`] can read it.
//!
//! The work is split into stages, each a pure `&str -> String` function:
//!
//! 1. [`fold_quotes`] - drop tabs, fold typographic quotes, turn every
//!    single quote that is not an in-word apostrophe into `"`
//! 2. [`strip_comments`] - drop `#` comments up to (not including) the next `"`
//! 3. [`clean_delimiters`] - drop quotes that do not delimit an element and
//!    formatting spaces outside elements
//! 4. [`tidy_separators`] - tighten brackets, force `", "` between elements
//! 5. [`trim_to_brackets`] - cut everything outside the outermost `[...]`
//!
//! Normalisation is total: text with no list in it comes out as something
//! the extractor will reject, never as a panic.

use std::sync::LazyLock;

use regex::Regex;

static OPEN_BRACKET_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\s+").expect("valid regex"));
static CLOSE_BRACKET_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\]").expect("valid regex"));
static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*,\s*").expect("valid regex"));

/// Scanner state while deciding which characters of a list survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// No `[` seen yet; text is copied verbatim.
    BeforeList,
    /// Inside the list, between elements.
    OutsideQuotes,
    /// Inside a quoted element.
    InsideQuotes,
}

/// Runs every normalisation stage in order.
pub fn normalize(raw: &str) -> String {
    let folded = fold_quotes(raw);
    let uncommented = strip_comments(&folded);
    let cleaned = clean_delimiters(&uncommented);
    let tidied = tidy_separators(&cleaned);
    trim_to_brackets(&tidied).to_string()
}

/// Drops tabs and rewrites quote characters.
///
/// A `'` between two word characters is an apostrophe (`don't`) and is kept;
/// every other `'` becomes `"`. Typographic quotes are folded to their ASCII
/// counterparts first so they go through the same rule.
pub fn fold_quotes(text: &str) -> String {
    let chars: Vec<char> = text
        .chars()
        .filter(|&c| c != '\t')
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => '"',
            other => other,
        })
        .collect();

    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        if c != '\'' {
            out.push(c);
            continue;
        }
        let after_word = i > 0 && is_word_char(chars[i - 1]);
        let before_word = chars.get(i + 1).is_some_and(|&next| is_word_char(next));
        out.push(if after_word && before_word { '\'' } else { '"' });
    }
    out
}

/// Removes `#` comments.
///
/// A comment runs from `#` up to the next `"`, which is kept. Comments are
/// assumed never to contain a `"` themselves. A comment with no closing quote
/// swallows the rest of the text.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_comment = false;
    for c in text.chars() {
        if c == '#' {
            in_comment = true;
        } else if c == '"' && in_comment {
            in_comment = false;
            out.push(c);
        } else if !in_comment {
            out.push(c);
        }
    }
    out
}

/// Decides for every quote whether it delimits an element, and drops
/// formatting spaces between elements.
///
/// Everything before the first `[` is copied unchanged. After it, a `"` is
/// kept only if the nearest preceding non-blank character is `[` or `,`, or
/// the nearest following one is `]` or `,`; other quotes are dropped. A space
/// outside an element is dropped when it starts the text, follows a space,
/// `,` or `[`, or precedes a space, `,`, `]` or the end of the text.
pub fn clean_delimiters(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut state = ScanState::BeforeList;

    for (i, &c) in chars.iter().enumerate() {
        match state {
            ScanState::BeforeList => {
                if c == '[' {
                    state = ScanState::OutsideQuotes;
                }
                out.push(c);
            }
            _ if c == '"' => {
                if is_structural_quote(&chars, i) {
                    state = match state {
                        ScanState::InsideQuotes => ScanState::OutsideQuotes,
                        _ => ScanState::InsideQuotes,
                    };
                    out.push(c);
                }
            }
            ScanState::OutsideQuotes if c == ' ' && is_formatting_space(&chars, i) => {}
            _ => out.push(c),
        }
    }
    out
}

/// Removes blanks just inside the brackets and forces `", "` between elements.
pub fn tidy_separators(text: &str) -> String {
    let text = OPEN_BRACKET_SPACE.replace_all(text, "[");
    let text = CLOSE_BRACKET_SPACE.replace_all(&text, "]");
    SEPARATOR.replace_all(&text, ", ").into_owned()
}

/// Cuts the text down to the span from the first `[` to the last `]`.
///
/// Text without such a pair is returned unchanged.
pub fn trim_to_brackets(text: &str) -> &str {
    match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text,
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_blank(c: &char) -> bool {
    matches!(c, ' ' | '\n')
}

fn is_structural_quote(chars: &[char], i: usize) -> bool {
    let before = chars[..i].iter().rev().find(|c| !is_blank(c));
    let after = chars[i + 1..].iter().find(|c| !is_blank(c));
    matches!(before, Some('[' | ',')) || matches!(after, Some(']' | ','))
}

fn is_formatting_space(chars: &[char], i: usize) -> bool {
    if i == 0 || matches!(chars[i - 1], ' ' | ',' | '[') {
        return true;
    }
    match chars.get(i + 1) {
        Some(next) => matches!(next, ' ' | ',' | ']'),
        None => true,
    }
}
