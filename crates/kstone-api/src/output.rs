// Decoders for the two output shapes the CLI produces.
//
// `list --quiet --format csv` prints a quoted header row followed by one
// quoted row per entity. `show --format shell` prints `key="value"` lines;
// an empty body means the entity does not exist.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::Error;

/// One entity as printed by the tool: attribute name to raw string value,
/// in output order.
pub type Record = IndexMap<String, String>;

// ── CSV ──────────────────────────────────────────────────────────────

/// Decode `--format csv` output into one record per data row.
///
/// Header names are normalised to lower-case with spaces replaced by `_`,
/// so `"Domain ID"` becomes `domain_id`. Values are unquoted but otherwise
/// kept verbatim: `True`/`False` stay strings.
pub fn parse_csv(input: &str) -> Result<Vec<Record>, Error> {
    let mut rows = split_csv_rows(input)?.into_iter();

    let Some((_, header)) = rows.next() else {
        return Ok(Vec::new());
    };
    let header: Vec<String> = header.iter().map(|h| normalize_key(h)).collect();

    rows.map(|(line, fields)| {
        if fields.len() != header.len() {
            return Err(Error::Parse {
                format: "csv",
                line,
                reason: format!(
                    "expected {} fields, found {}",
                    header.len(),
                    fields.len()
                ),
            });
        }
        Ok(header.iter().cloned().zip(fields).collect())
    })
    .collect()
}

fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// Split CSV text into rows of unquoted fields, tagged with the 1-based
/// line each row starts on. Quoted fields may span lines. Blank lines are
/// dropped.
fn split_csv_rows(input: &str) -> Result<Vec<(usize, Vec<String>)>, Error> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut row_has_data = false;
    let mut line = 1;
    let mut row_line = 1;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                row_has_data = true;
            }
            ',' => {
                row.push(std::mem::take(&mut field));
                row_has_data = true;
            }
            '\n' => {
                if row_has_data || !field.is_empty() {
                    row.push(std::mem::take(&mut field));
                    rows.push((row_line, std::mem::take(&mut row)));
                }
                row_has_data = false;
                line += 1;
                row_line = line;
            }
            '\r' => {}
            _ => {
                field.push(c);
                row_has_data = true;
            }
        }
    }

    if in_quotes {
        return Err(Error::Parse {
            format: "csv",
            line: row_line,
            reason: "unterminated quoted field".into(),
        });
    }
    if row_has_data || !field.is_empty() {
        row.push(field);
        rows.push((row_line, row));
    }
    Ok(rows)
}

// ── Shell assignments ────────────────────────────────────────────────

/// Decode `--format shell` output.
///
/// Returns `None` when the body holds no assignments: the tool prints
/// nothing for an entity that does not exist, and callers must be able to
/// tell that apart from a failed invocation.
pub fn parse_shell(input: &str) -> Option<Record> {
    let mut record = Record::new();
    let mut lines = input.lines().enumerate().peekable();

    while let Some((idx, raw)) = lines.next() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            debug!(line = idx + 1, text = line, "skipping non-assignment line");
            continue;
        };

        let mut value = value.to_owned();
        // A quoted value may contain raw newlines; keep reading until the
        // closing quote. A value ending in a backslash looks unterminated,
        // so the next assignment always starts a new key.
        if value.starts_with('"') {
            while !closes_quote(&value) {
                let Some((_, next)) = lines.next_if(|(_, next)| !is_assignment(next)) else {
                    break;
                };
                value.push('\n');
                value.push_str(next);
            }
        }

        record.insert(key.trim().to_owned(), unquote(value.trim()));
    }

    if record.is_empty() { None } else { Some(record) }
}

fn closes_quote(value: &str) -> bool {
    value.len() >= 2 && value.ends_with('"') && !value.ends_with("\\\"")
}

/// `key=...` where the key is a bare identifier, as the tool prints it.
fn is_assignment(line: &str) -> bool {
    line.trim().split_once('=').is_some_and(|(key, _)| {
        !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value[1..value.len() - 1].replace("\\\"", "\"")
    } else if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        value[1..value.len() - 1].to_owned()
    } else {
        value.to_owned()
    }
}
