//! Content-based language guessing.
//!
//! Cheap, sample-bounded checks: shebangs first, then structural shapes that
//! identify a format outright, then keyword scoring for general-purpose
//! languages. Labels are canonical ids (see [`super::canonical`]).

const SAMPLE_MAX_BYTES: usize = 64 * 1024;
const SAMPLE_MAX_LINES: usize = 512;
const KEYWORD_THRESHOLD: usize = 2;

type ShapeCheck = fn(&str, &str) -> bool;

/// Ordered structural checks; the first match wins.
const SHAPES: &[(&str, ShapeCheck)] = &[
    ("json", looks_like_json),
    ("html", looks_like_html),
    ("xml", looks_like_xml),
    ("python", looks_like_python),
    ("toml", looks_like_toml),
    ("yaml", looks_like_yaml),
    ("sql", looks_like_sql),
    ("shell", looks_like_shell),
    ("markdown", looks_like_markdown),
    ("css", looks_like_css),
];

/// Keyword tables scored when no structural shape matched. Ties go to the
/// earlier entry.
const KEYWORDS: &[(&str, &[&str])] = &[
    (
        "rust",
        &[
            "fn ", "impl ", "crate::", "let ", "mut ", "pub ", "struct ", "enum ", "match ",
            "trait ", "println!",
        ],
    ),
    (
        "python",
        &["def ", "import ", "self.", "elif ", "print(", "__init__", "lambda "],
    ),
    (
        "javascript",
        &[
            "function", "const ", "let ", "=>", "console.", "document.", "require(", "export ",
        ],
    ),
    (
        "go",
        &["package ", "func ", "fmt.", "defer ", ":= ", "chan ", "go func"],
    ),
    (
        "java",
        &[
            "public class",
            "import java.",
            "system.out",
            " implements ",
            " extends ",
            "void main",
        ],
    ),
    (
        "cs",
        &["using system", "namespace ", "console.write", " async task", " get; set;"],
    ),
    ("cpp", &["#include", "std::", "cout", "template <", "nullptr"]),
    ("c", &["#include", "int main", "printf(", "malloc(", "->"]),
    ("ruby", &["def ", "end\n", "puts ", "require '", ".each do", "attr_accessor"]),
    ("php", &["<?php", "$this->", "echo ", "function ", "=> $"]),
    ("lua", &["local ", "function ", "require(", "elseif", "pairs(", " then\n"]),
    ("perl", &["use strict;", "use warnings;", "my $", "sub ", "print \""]),
    ("powershell", &["write-host", "get-childitem", "$psversiontable", "param(", "$env:"]),
];

/// Best-effort language guess for `content`.
///
/// # Returns
/// Canonical language id when a strong pattern is found, otherwise `None`.
pub(crate) fn detect(content: &str) -> Option<&'static str> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }
    let sample = utf8_prefix(trimmed, SAMPLE_MAX_BYTES);
    let lower = sample.to_ascii_lowercase();

    if let Some(label) = shebang_interpreter(sample).and_then(|name| interpreter_language(&name))
    {
        return Some(label);
    }

    SHAPES
        .iter()
        .find(|(_, check)| check(sample, lower.as_str()))
        .map(|(label, _)| *label)
        .or_else(|| best_keyword_match(&lower))
}

fn best_keyword_match(lower: &str) -> Option<&'static str> {
    let mut best: Option<(&'static str, usize)> = None;
    for (label, keywords) in KEYWORDS {
        let hits = keywords.iter().filter(|kw| lower.contains(**kw)).count();
        if hits < KEYWORD_THRESHOLD {
            continue;
        }
        match best {
            Some((_, best_hits)) if best_hits >= hits => {}
            _ => best = Some((*label, hits)),
        }
    }
    best.map(|(label, _)| label)
}

fn sample_lines(sample: &str) -> impl Iterator<Item = &str> {
    sample
        .lines()
        .take(SAMPLE_MAX_LINES)
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

fn shebang_interpreter(sample: &str) -> Option<String> {
    let first_line = sample.lines().next()?.trim();
    let command = first_line.strip_prefix("#!")?.trim();
    let mut parts = command.split_whitespace();
    let mut interpreter = parts.next()?;
    if path_basename(interpreter) == "env" {
        interpreter = parts.find(|arg| !arg.starts_with('-'))?;
    }
    let basename = path_basename(interpreter);
    (!basename.is_empty()).then(|| basename.to_ascii_lowercase())
}

fn interpreter_language(interpreter: &str) -> Option<&'static str> {
    let name = interpreter.trim_end_matches(|ch: char| ch.is_ascii_digit() || ch == '.');
    match name {
        "python" | "pypy" => Some("python"),
        "node" | "nodejs" | "deno" | "bun" => Some("javascript"),
        "sh" | "bash" | "zsh" | "ksh" | "dash" | "ash" | "fish" => Some("shell"),
        "perl" => Some("perl"),
        "ruby" => Some("ruby"),
        "php" => Some("php"),
        "lua" => Some("lua"),
        "pwsh" => Some("powershell"),
        _ => None,
    }
}

fn path_basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn looks_like_json(sample: &str, _lower: &str) -> bool {
    let opens = sample.starts_with('{') || sample.starts_with('[');
    let closes = sample.ends_with('}') || sample.ends_with(']');
    opens && closes && sample.contains('"') && (sample.contains(':') || sample.starts_with('['))
}

fn looks_like_html(sample: &str, lower: &str) -> bool {
    const TAGS: [&str; 7] = [
        "<head", "<body", "<div", "<span", "<script", "<style", "<p>",
    ];
    if lower.contains("<!doctype html") || lower.contains("<html") {
        return true;
    }
    sample.starts_with('<') && TAGS.iter().filter(|tag| lower.contains(**tag)).count() >= 2
}

fn looks_like_xml(sample: &str, lower: &str) -> bool {
    lower.starts_with("<?xml") || (sample.starts_with('<') && lower.contains("</"))
}

fn looks_like_python(sample: &str, _lower: &str) -> bool {
    sample_lines(sample).any(|line| {
        let definition = ["def ", "async def ", "class "]
            .iter()
            .any(|prefix| line.starts_with(prefix));
        if definition && (line.ends_with(':') || line.contains("):")) {
            return true;
        }
        let Some((module, imported)) = line
            .strip_prefix("from ")
            .and_then(|rest| rest.split_once(" import "))
        else {
            return false;
        };
        !module.trim().is_empty()
            && !imported.trim().is_empty()
            && module
                .trim()
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '.')
    })
}

fn looks_like_toml(sample: &str, _lower: &str) -> bool {
    let has_table_header = sample_lines(sample)
        .any(|line| line.starts_with('[') && line.ends_with(']') && line.len() > 2);
    let has_assignment = sample_lines(sample).any(|line| {
        !line.starts_with('#') && !line.starts_with('[') && line.contains(" = ") && !line.contains("==")
    });
    has_table_header && has_assignment
}

fn yaml_key_is_plain(key: &str) -> bool {
    let key = key.trim();
    let quoted = key.len() >= 2
        && ((key.starts_with('"') && key.ends_with('"'))
            || (key.starts_with('\'') && key.ends_with('\'')));
    quoted
        || (!key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.' | '/')))
}

fn is_yaml_line(line: &str) -> bool {
    if line.starts_with("- ") || line == "-" {
        return true;
    }
    let Some((key, value)) = line.split_once(':') else {
        return false;
    };
    let value = value.trim();
    yaml_key_is_plain(key)
        && (value.is_empty() || line[key.len() + 1..].starts_with(' '))
        && !value.contains(';')
        && !value.ends_with('{')
}

fn looks_like_yaml(sample: &str, _lower: &str) -> bool {
    let mut lines = sample_lines(sample).filter(|line| !line.starts_with('#')).peekable();
    let doc_start = lines.next_if_eq(&"---").is_some();
    let mut yaml_lines = 0usize;
    let mut other_lines = 0usize;
    for line in lines {
        if is_yaml_line(line) {
            yaml_lines += 1;
        } else {
            other_lines += 1;
        }
    }
    let required = if doc_start { 1 } else { 2 };
    yaml_lines >= required && yaml_lines >= other_lines
}

fn looks_like_sql(sample: &str, _lower: &str) -> bool {
    sample_lines(sample).any(|line| {
        if line.starts_with("--") {
            return false;
        }
        let line = line.to_ascii_lowercase();
        (line.starts_with("select ") && line.contains(" from "))
            || (line.starts_with("insert into ") && line.contains(" values"))
            || (line.starts_with("update ") && line.contains(" set "))
            || (line.starts_with("delete from ") && (line.contains(" where ") || line.ends_with(';')))
            || ["create table ", "alter table ", "drop table "]
                .iter()
                .any(|prefix| line.starts_with(prefix))
    })
}

fn looks_like_shell(_sample: &str, lower: &str) -> bool {
    let hits = [
        lower.contains("echo ") && lower.contains('$'),
        lower.contains("\nfi"),
        lower.contains("\ndone"),
        lower.contains("if ["),
        lower.contains("; then"),
        lower.contains("case ") && lower.contains("esac"),
    ]
    .iter()
    .filter(|hit| **hit)
    .count();
    hits >= 2 && lower.contains('\n')
}

fn is_markdown_heading(line: &str) -> bool {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    (1..=6).contains(&hashes) && line.as_bytes().get(hashes) == Some(&b' ')
}

fn looks_like_markdown(sample: &str, _lower: &str) -> bool {
    if sample.contains("```") || sample.contains("](") {
        return true;
    }
    sample_lines(sample).any(|line| is_markdown_heading(line) || line.starts_with("> "))
}

fn looks_like_css(_sample: &str, lower: &str) -> bool {
    const PROPERTIES: [&str; 8] = [
        "color:", "background", "margin", "padding", "font-", "display:", "position:", "border",
    ];
    lower.contains('{')
        && lower.contains('}')
        && lower.contains(':')
        && lower.contains(';')
        && !lower.contains("=>")
        && !lower.contains("function")
        && PROPERTIES.iter().any(|property| lower.contains(property))
}

fn utf8_prefix(content: &str, max_bytes: usize) -> &str {
    if content.len() <= max_bytes {
        return content;
    }
    let mut end = max_bytes;
    while end > 0 && !content.is_char_boundary(end) {
        end -= 1;
    }
    &content[..end]
}
