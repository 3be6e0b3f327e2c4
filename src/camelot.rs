//! Musical key labels to Camelot wheel codes.
//!
//! Keys are written the way the analyzer reports them: `"<tonic> <major|minor>"`.
//! Every black-key tonic is listed under both its sharp and its flat spelling.

/// Key label -> Camelot code. Majors carry the `B` suffix, minors `A`.
pub static CAMELOT_KEYS: &[(&str, &str)] = &[
    // Major keys
    ("C major", "8B"),
    ("G major", "9B"),
    ("D major", "10B"),
    ("A major", "11B"),
    ("E major", "12B"),
    ("B major", "1B"),
    ("F# major", "2B"),
    ("Gb major", "2B"),
    ("Db major", "3B"),
    ("C# major", "3B"),
    ("Ab major", "4B"),
    ("G# major", "4B"),
    ("Eb major", "5B"),
    ("D# major", "5B"),
    ("Bb major", "6B"),
    ("A# major", "6B"),
    ("F major", "7B"),
    // Minor keys
    ("A minor", "8A"),
    ("E minor", "9A"),
    ("B minor", "10A"),
    ("F# minor", "11A"),
    ("Gb minor", "11A"),
    ("C# minor", "12A"),
    ("Db minor", "12A"),
    ("Ab minor", "1A"),
    ("G# minor", "1A"),
    ("Eb minor", "2A"),
    ("D# minor", "2A"),
    ("Bb minor", "3A"),
    ("A# minor", "3A"),
    ("F minor", "4A"),
    ("C minor", "5A"),
    ("G minor", "6A"),
    ("D minor", "7A"),
];

/// Translates a key label to its Camelot code.
///
/// Labels missing from the table are returned untouched; no case or
/// whitespace normalization is attempted.
pub fn to_camelot(label: &str) -> &str {
    CAMELOT_KEYS
        .iter()
        .find(|(key, _)| *key == label)
        .map(|(_, code)| *code)
        .unwrap_or(label)
}
