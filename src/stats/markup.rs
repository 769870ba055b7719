//! Best-effort markup stripping and word counting
//!
//! Content arrives as rich-text HTML written by an editor, but nothing
//! guarantees it is well formed. The stripper is a small scanner rather than a
//! full parser: anything it cannot recognise as markup is kept as literal
//! text, so a broken record still yields a word count instead of an error.

/// Remove tags, comments, declarations and processing instructions.
///
/// Tags are removed without inserting whitespace, so `<p>a</p><p>b</p>`
/// becomes `ab`. A `<` that does not start a tag, or a tag that never closes,
/// is kept verbatim. Runs in linear time on malformed input.
pub fn strip_markup(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    let mut comments_unclosed = false;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        match scan_markup(candidate, comments_unclosed) {
            Scan::Markup(len) => rest = &candidate[len..],
            Scan::Literal => {
                out.push('<');
                rest = &candidate[1..];
            }
            Scan::UnclosedComment => {
                comments_unclosed = true;
                out.push('<');
                rest = &candidate[1..];
            }
            // No '>' is left, so nothing after this point can be markup.
            Scan::NoCloser => {
                rest = candidate;
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Count maximal whitespace-delimited tokens after stripping markup.
pub fn count_words(html: &str) -> u64 {
    strip_markup(html).split_whitespace().count() as u64
}

enum Scan {
    /// Markup of this many bytes starts here
    Markup(usize),
    /// Not markup; keep the `<`
    Literal,
    /// A comment opener with no `-->` anywhere after it
    UnclosedComment,
    /// A construct with no `>` anywhere after it
    NoCloser,
}

/// Classify the construct at the start of `s`, which begins with `<`.
///
/// Once a comment search has failed, later comment openers are literal
/// without searching again.
fn scan_markup(s: &str, comments_unclosed: bool) -> Scan {
    let mut chars = s[1..].chars();
    match chars.next() {
        Some('!') if s.starts_with("<!--") => {
            if comments_unclosed {
                return Scan::Literal;
            }
            match s[4..].find("-->") {
                Some(end) => Scan::Markup(4 + end + 3),
                None => Scan::UnclosedComment,
            }
        }
        Some('!') | Some('?') => match s.find('>') {
            Some(end) => Scan::Markup(end + 1),
            None => Scan::NoCloser,
        },
        Some('/') => match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => tag_end(s),
            _ => Scan::Literal,
        },
        Some(c) if c.is_ascii_alphabetic() => tag_end(s),
        _ => Scan::Literal,
    }
}

/// Find the closing `>` of a tag, skipping over quoted attribute values.
///
/// Stops at the next `<`, quoted or not, so each scan covers only the text
/// up to the following candidate.
fn tag_end(s: &str) -> Scan {
    let mut quote: Option<char> = None;
    for (idx, c) in s.char_indices().skip(1) {
        match (quote, c) {
            // A new tag opening before this one closed means the first was
            // never a tag.
            (_, '<') => return Scan::Literal,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => return Scan::Markup(idx + 1),
            (None, _) => {}
        }
    }
    Scan::Literal
}
