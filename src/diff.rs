//! Minimal update encoding for fixed-position text fields.
//!
//! The panel can only move the cursor and print from there, so an update is either
//! nothing, one positional patch, or a rewrite of the whole field. Fields whose width
//! changed and updates touching more than one region are always rewritten in full.

/// Outcome of comparing a field's previous text with its next text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// Both texts are identical.
    None,
    /// A single contiguous run changed; print `text` at byte `offset`.
    Targeted { offset: usize, text: String },
    /// Rewrite the field from its origin.
    FullRewrite(String),
}

/// A maximal run of differing byte positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffSpan {
    pub offset: usize,
    pub len: usize,
}

/// Collect the maximal runs of differing bytes between two equal-length buffers.
pub fn diff_spans(old: &[u8], new: &[u8]) -> Vec<DiffSpan> {
    debug_assert_eq!(old.len(), new.len());
    let mut spans: Vec<DiffSpan> = Vec::new();
    for (idx, (a, b)) in old.iter().zip(new).enumerate() {
        if a == b {
            continue;
        }
        match spans.last_mut() {
            Some(span) if span.offset + span.len == idx => span.len += 1,
            _ => spans.push(DiffSpan {
                offset: idx,
                len: 1,
            }),
        }
    }
    spans
}

/// Compute the update needed to turn `old` into `new` on the panel.
pub fn diff(old: &str, new: &str) -> Update {
    if old.len() != new.len() {
        return Update::FullRewrite(new.to_string());
    }
    let spans = diff_spans(old.as_bytes(), new.as_bytes());
    match spans.as_slice() {
        [] => Update::None,
        [span] => match new.get(span.offset..span.offset + span.len) {
            Some(text) => Update::Targeted {
                offset: span.offset,
                text: text.to_string(),
            },
            // The run splits a multi-byte character; there is no valid patch text.
            None => Update::FullRewrite(new.to_string()),
        },
        _ => Update::FullRewrite(new.to_string()),
    }
}

/// Strip everything the panel cannot render, including line breaks that would
/// otherwise end a protocol line early.
pub fn clean_text(text: &str) -> String {
    text.chars()
        .filter(|ch| matches!(ch, ' '..='~'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targeted(offset: usize, text: &str) -> Update {
        Update::Targeted {
            offset,
            text: text.to_string(),
        }
    }

    fn apply(old: &str, offset: usize, text: &str) -> String {
        format!("{}{}{}", &old[..offset], text, &old[offset + text.len()..])
    }

    #[test]
    fn diff_matches_known_cases() {
        assert_eq!(diff("foo", "Foo"), targeted(0, "F"));
        assert_eq!(diff("foo", "fOO"), targeted(1, "OO"));
        assert_eq!(diff("f", "foo"), Update::FullRewrite("foo".to_string()));
        assert_eq!(diff("foo", "FoO"), Update::FullRewrite("FoO".to_string()));
        assert_eq!(diff("foo", "foo"), Update::None);
    }

    #[test]
    fn identical_texts_produce_no_update() {
        for text in ["", "a", "volume 42", "  padded  "] {
            assert_eq!(diff(text, text), Update::None);
        }
    }

    #[test]
    fn single_run_patch_reconstructs_new_text() {
        let cases = [
            ("12:00:00", "12:00:01"),
            ("12:00:58", "12:00:59"),
            ("vol 09", "vol 10"),
            ("abcdef", "XYZdef"),
            ("abcdef", "abcXYZ"),
        ];
        for (old, new) in cases {
            match diff(old, new) {
                Update::Targeted { offset, text } => {
                    assert_eq!(apply(old, offset, &text), new, "{old} -> {new}");
                }
                other => panic!("expected targeted update for {old} -> {new}, got {other:?}"),
            }
        }
    }

    #[test]
    fn length_change_always_rewrites() {
        assert_eq!(diff("abc", "abcd"), Update::FullRewrite("abcd".to_string()));
        assert_eq!(diff("abcd", "abc"), Update::FullRewrite("abc".to_string()));
        assert_eq!(diff("", "x"), Update::FullRewrite("x".to_string()));
        assert_eq!(diff("x", ""), Update::FullRewrite(String::new()));
    }

    #[test]
    fn disjoint_runs_rewrite() {
        assert_eq!(
            diff("12:59:59", "13:00:00"),
            Update::FullRewrite("13:00:00".to_string())
        );
        assert_eq!(
            diff("12:00:59", "12:01:00"),
            Update::FullRewrite("12:01:00".to_string())
        );
        assert_eq!(diff("aXbXc", "aYbYc"), Update::FullRewrite("aYbYc".to_string()));
    }

    #[test]
    fn spans_are_maximal_runs() {
        let spans = diff_spans(b"abcdefgh", b"aBCdeFgH");
        assert_eq!(
            spans,
            vec![
                DiffSpan { offset: 1, len: 2 },
                DiffSpan { offset: 5, len: 1 },
                DiffSpan { offset: 7, len: 1 },
            ]
        );
        assert!(diff_spans(b"same", b"same").is_empty());
    }

    #[test]
    fn split_multibyte_character_falls_back_to_rewrite() {
        // "é" and "è" share their first UTF-8 byte.
        assert_eq!(diff("é", "è"), Update::FullRewrite("è".to_string()));
    }

    #[test]
    fn clean_text_keeps_printable_ascii() {
        assert_eq!(clean_text("vol 10"), "vol 10");
        assert_eq!(clean_text("line\nbreak\r"), "linebreak");
        assert_eq!(clean_text("caf\u{e9} \u{2603}"), "caf ");
        assert_eq!(clean_text("~!@#"), "~!@#");
    }
}
