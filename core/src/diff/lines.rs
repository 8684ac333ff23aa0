use std::borrow::Cow;

/// Appends `\n` unless `text` already ends with one.
pub fn normalize_trailing_newline(text: &str) -> Cow<'_, str> {
    if text.ends_with('\n') {
        Cow::Borrowed(text)
    } else {
        let mut owned = String::with_capacity(text.len() + 1);
        owned.push_str(text);
        owned.push('\n');
        Cow::Owned(owned)
    }
}

/// Lines of the normalized text, without their newline.
///
/// An empty text normalizes to `"\n"` and therefore has one empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return vec![""];
    }
    text.split_terminator('\n').collect()
}

/// Inverse of [`split_lines`]; `trailing_newline` restores the terminator.
pub fn join_lines<S: AsRef<str>>(lines: &[S], trailing_newline: bool) -> String {
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(line.as_ref());
    }
    if trailing_newline && !lines.is_empty() {
        out.push('\n');
    }
    out
}

/// True when both texts are equal once each ends with a newline.
pub fn same_text(a: &str, b: &str) -> bool {
    normalize_trailing_newline(a) == normalize_trailing_newline(b)
}
