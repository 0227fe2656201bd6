//! Minimal `.properties` reader
//!
//! Supports `key=value`, `key: value` and `key value` lines, `#` / `!`
//! comments, backslash line continuations and the usual escapes
//! (`\=`, `\:`, `\ `, `\\`, `\t`, `\n`, `\r`, `\f`, `\uXXXX`).

use std::collections::HashMap;

/// Parse properties text into a key/value map (later keys win)
pub fn parse(content: &str) -> HashMap<String, String> {
    logical_lines(content)
        .iter()
        .filter_map(|line| parse_line(line))
        .collect()
}

/// Join continued lines and drop blanks and comments
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<String> = None;

    for raw in content.lines() {
        let line = raw.trim_start();

        let mut buffer = match current.take() {
            Some(buffer) => buffer,
            None if line.is_empty() || line.starts_with('#') || line.starts_with('!') => continue,
            None => String::new(),
        };

        if ends_with_continuation(line) {
            buffer.push_str(&line[..line.len() - 1]);
            current = Some(buffer);
        } else {
            buffer.push_str(line);
            lines.push(buffer);
        }
    }

    lines.extend(current);
    lines
}

/// An odd number of trailing backslashes continues the line
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let mut key_end = line.len();
    let mut escaped = false;
    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || c.is_whitespace() {
            key_end = idx;
            break;
        }
    }

    let rest = line[key_end..].trim_start();
    let rest = rest
        .strip_prefix('=')
        .or_else(|| rest.strip_prefix(':'))
        .unwrap_or(rest)
        .trim_start();

    let key = unescape(&line[..key_end]);
    if key.is_empty() {
        return None;
    }
    Some((key, unescape(rest)))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                let valid = hex.len() == 4 && hex.chars().all(|c| c.is_ascii_hexdigit());
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if valid => {
                        out.push(decoded);
                        chars.nth(3);
                    }
                    _ => out.push('u'),
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}
