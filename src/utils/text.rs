//! Text processing utilities.

/// Minimum non-whitespace characters for a page to count as having a text layer.
pub const MIN_CONTENT_LENGTH: usize = 8;

/// Check if extracted page text is worth sending to the model.
///
/// Scanned pages without OCR come back empty or as a handful of stray glyphs.
pub fn has_meaningful_content(content: &str) -> bool {
    content.chars().filter(|c| !c.is_whitespace()).count() >= MIN_CONTENT_LENGTH
}

/// Trim every line and collapse runs of blank lines into one.
pub fn collapse_blank_lines(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut blank_run = false;

    for line in content.lines().map(str::trim) {
        if line.is_empty() {
            blank_run = true;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        blank_run = false;
    }

    out
}
