//! Shared utility functions: byte-safe truncation and terminal table layout

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Truncate a string to at most `max_bytes`, backing off to a UTF-8 boundary.
///
/// ```
/// use lungora_console::util::truncate_utf8_safe;
///
/// assert_eq!(truncate_utf8_safe("hello world", 5), "hello");
/// assert_eq!(truncate_utf8_safe("日本語", 4), "日");
/// ```
pub fn truncate_utf8_safe(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Fit `s` into `max_width` terminal columns, ending with `…` when cut.
/// Wide characters (CJK, emoji) count as two columns.
pub fn fit_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    // Leave a column for the ellipsis
    let target = max_width.saturating_sub(1);
    let mut width = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > target {
            break;
        }
        width += w;
        out.push(c);
    }
    if max_width > 0 {
        out.push('…');
    }
    out
}

/// Render rows as an aligned plain-text table with a header rule.
///
/// Cells are flattened to one line and capped at `max_cell` columns.
pub fn render_table(headers: &[&str], rows: &[Vec<String>], max_cell: usize) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| fit_width(&cell.replace(['\n', '\r', '\t'], " "), max_cell))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.width());
        }
    }

    let mut out = String::new();
    push_row(&mut out, headers.iter().copied(), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    push_row(&mut out, rule.iter().map(String::as_str), &widths);
    for row in &cells {
        push_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let mut line = String::new();
    for (cell, width) in cells.zip(widths) {
        if !line.is_empty() {
            line.push_str("  ");
        }
        line.push_str(cell);
        line.push_str(&" ".repeat(width.saturating_sub(cell.width())));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_at_utf8_boundary() {
        // Each character is 3 bytes
        let s = "日本語";
        assert_eq!(truncate_utf8_safe(s, 4), "日");
        assert_eq!(truncate_utf8_safe(s, 6), "日本");
        assert_eq!(truncate_utf8_safe(s, 0), "");
        assert_eq!(truncate_utf8_safe("hello", 10), "hello");
    }

    #[test]
    fn test_fit_width_counts_columns() {
        assert_eq!(fit_width("short", 10), "short");
        assert_eq!(fit_width("Pulmonology", 6), "Pulmo…");
        // Two columns per character, so only two fit before the ellipsis
        assert_eq!(fit_width("日本語テキスト", 5), "日本…");
        assert_eq!(fit_width("abc", 0), "");
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let table = render_table(
            &["ID", "Name"],
            &[
                vec!["1".to_string(), "Dr. Amal".to_string()],
                vec!["12".to_string(), "Dr. Omar\nHassan".to_string()],
            ],
            40,
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "ID  Name");
        assert_eq!(lines[1], "──  ───────────────");
        assert_eq!(lines[2], "1   Dr. Amal");
        assert_eq!(lines[3], "12  Dr. Omar Hassan");
    }
}
