//! Text normalization and personal-data scrubbing applied before any scorer sees the text.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\w.+-]+@[\w-]+(?:\.[\w-]+)+").expect("email pattern is valid")
});

/// Seven or more consecutive digits: phone numbers, document numbers.
static LONG_DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\d{7,}").expect("digit-run pattern is valid"));

/// Header of a labeled personal-data field, e.g. `Nombre y Apellidos:` or `Domicilio:`.
/// Only recognized at the start of a line or right after `;` / `|`, so words such as
/// "móvil" or "dirección" inside a sentence are left alone.
static PERSONAL_FIELD_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)(?:^|[;|])[ \t]*(?:nombres?\s+y\s+apellidos?|nombre\s+completo|nombres?|apellidos?|domicilio|direcci[oó]n|nacionalidad|lugar\s+de\s+nacimiento|fecha\s+de\s+nacimiento|estado\s+civil|dni|tel[eé]fono|celular|m[oó]vil|correo(?:\s+electr[oó]nico)?|e-?mail|full\s+name|address|nationality|place\s+of\s+birth|date\s+of\s+birth|phone)\s*:",
    )
    .expect("field label pattern is valid")
});

/// Lowercases, trims, and collapses whitespace runs to a single space.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Removes emails, long digit runs, and labeled personal fields, then normalizes.
///
/// A labeled field is dropped together with its value, which runs until the next
/// recognized label or the next sentence boundary (newline, `.`, `;`, `|`).
pub fn clean_personal_info(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let without_emails = EMAIL.replace_all(text, " ");
    let without_phones = LONG_DIGIT_RUN.replace_all(&without_emails, " ");
    let without_fields = strip_labeled_fields(&without_phones);
    normalize(&without_fields)
}

fn strip_labeled_fields(text: &str) -> String {
    let labels: Vec<_> = PERSONAL_FIELD_LABEL.find_iter(text).collect();
    if labels.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (i, label) in labels.iter().enumerate() {
        out.push_str(&text[cursor..label.start()]);
        out.push(' ');

        let next_label = labels.get(i + 1).map_or(text.len(), |m| m.start());
        let value = &text[label.end()..next_label];
        cursor = value
            .find(['\n', '.', ';', '|'])
            .map_or(next_label, |offset| label.end() + offset);
    }
    out.push_str(&text[cursor..]);
    out
}

/// Normalized text with every non-alphanumeric character turned into a space.
pub fn token_text(text: &str) -> String {
    let spaced: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    normalize(&spaced)
}

/// [`token_text`] padded on both sides, so that `" phrase "` lookups only hit whole tokens.
pub fn padded_tokens(text: &str) -> String {
    format!(" {} ", token_text(text))
}
