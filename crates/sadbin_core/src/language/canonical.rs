//! Language alias canonicalization.

/// Convert aliases, file extensions and legacy names to canonical short ids.
///
/// # Returns
/// Canonical, lowercase id (or empty string for empty/whitespace input).
pub fn canonicalize(language: &str) -> String {
    let lowered = language.trim().to_ascii_lowercase();
    let canonical = match lowered.as_str() {
        "csharp" | "c#" => "cs",
        "c++" | "cc" | "cxx" | "hpp" => "cpp",
        "bash" | "sh" | "zsh" | "ksh" => "shell",
        "pwsh" | "ps1" => "powershell",
        "yml" => "yaml",
        "jsonl" => "json",
        "js" | "mjs" | "cjs" => "javascript",
        "ts" => "typescript",
        "md" | "mdown" | "markdn" => "markdown",
        "plaintext" | "plain text" | "plain" | "txt" => "text",
        "py" | "py3" | "python3" => "python",
        "rs" => "rust",
        "rb" => "ruby",
        "kt" => "kotlin",
        "m" | "mm" | "objc" | "objective-c" => "objectivec",
        "pl" | "pm" => "perl",
        "ex" | "exs" => "elixir",
        "htm" | "xhtml" => "html",
        "golang" => "go",
        _ => return lowered,
    };
    canonical.to_string()
}
