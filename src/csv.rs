//! Semicolon-delimited CSV codec, quote and CRLF tolerant.
//!
//! Listing titles, locations and descriptions are full of commas, so the
//! pipeline standardizes on `;`. Cells containing the separator, a quote or
//! a line break are double-quoted on write; `""` escapes a literal quote.

pub const SEP: char = ';';

/// Parse delimited text into rows of cells. Blank lines are skipped and an
/// unterminated quote runs to the end of input.
pub fn parse(text: &str) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    cell.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            SEP if !in_quotes => row.push(std::mem::take(&mut cell)),
            '\r' | '\n' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(std::mem::take(&mut cell));
                // a single empty cell means a blank line, not a record
                if row.len() > 1 || !row[0].is_empty() {
                    rows.push(std::mem::take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => cell.push(ch),
        }
    }

    if !cell.is_empty() || !row.is_empty() {
        row.push(cell);
        rows.push(row);
    }
    rows
}

fn quoted(cell: &str) -> String {
    let must_quote = cell.contains(SEP)
        || cell.contains('"')
        || cell.contains('\n')
        || cell.contains('\r');
    if must_quote {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    let mut first = true;
    for cell in cells {
        if !first {
            out.push(SEP);
        }
        out.push_str(&quoted(cell));
        first = false;
    }
    out.push('\n');
}

/// Render a header and rows as one string with `\n` line endings. Output is
/// byte-stable for identical input, which keeps reruns diffable.
pub fn to_string(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    push_line(&mut out, header.iter().copied());
    for row in rows {
        push_line(&mut out, row.iter().map(|c| c.as_str()));
    }
    out
}
