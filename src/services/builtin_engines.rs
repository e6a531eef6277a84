//! Engine kernels shipped with the host linker.

use crate::domain::Preferences;
use crate::ports::{EngineError, FormatterEngine};

pub const TRAILING_WHITESPACE: &str = "trailing-whitespace";
pub const END_WITH_NEWLINE: &str = "end-with-newline";
pub const INDENT: &str = "indent";
pub const IMPORT_ORDER: &str = "import-order";

const DEFAULT_IMPORT_ORDER: &str = "java,javax,org,com";
const DEFAULT_INDENT_SIZE: usize = 4;

/// Strips whitespace at the end of every line.
pub struct TrailingWhitespace;

impl TrailingWhitespace {
    pub fn create(_preferences: &Preferences) -> Result<Box<dyn FormatterEngine>, EngineError> {
        Ok(Box::new(TrailingWhitespace))
    }
}

impl FormatterEngine for TrailingWhitespace {
    fn format(&self, input: &str) -> Result<String, EngineError> {
        Ok(map_lines(input, |line| line.trim_end().to_string()))
    }
}

/// Ends non-empty input with exactly one newline.
pub struct EndWithNewline;

impl EndWithNewline {
    pub fn create(_preferences: &Preferences) -> Result<Box<dyn FormatterEngine>, EngineError> {
        Ok(Box::new(EndWithNewline))
    }
}

impl FormatterEngine for EndWithNewline {
    fn format(&self, input: &str) -> Result<String, EngineError> {
        let trimmed = input.trim_end();
        if trimmed.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("{}\n", trimmed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndentStyle {
    Spaces,
    Tabs,
}

/// Normalizes leading indentation to spaces or tabs.
///
/// Preferences: `indent.style` (`spaces` | `tabs`), `indent.size` (columns per tab).
pub struct Indent {
    style: IndentStyle,
    size: usize,
}

impl Indent {
    pub fn create(preferences: &Preferences) -> Result<Box<dyn FormatterEngine>, EngineError> {
        let style = match preferences.get("indent.style").unwrap_or("spaces") {
            "spaces" => IndentStyle::Spaces,
            "tabs" => IndentStyle::Tabs,
            other => return Err(EngineError::new(format!("unknown indent.style '{}'", other))),
        };
        let size = match preferences.get("indent.size") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| EngineError::new(format!("invalid indent.size '{}'", raw)))?,
            None => DEFAULT_INDENT_SIZE,
        };
        Ok(Box::new(Indent { style, size }))
    }

    fn reindent(&self, line: &str) -> String {
        let body = line.trim_start_matches([' ', '\t']);
        let leading = &line[..line.len() - body.len()];
        let columns: usize = leading.chars().map(|c| if c == '\t' { self.size } else { 1 }).sum();
        let indent = match self.style {
            IndentStyle::Spaces => " ".repeat(columns),
            IndentStyle::Tabs => {
                format!("{}{}", "\t".repeat(columns / self.size), " ".repeat(columns % self.size))
            }
        };
        format!("{}{}", indent, body)
    }
}

impl FormatterEngine for Indent {
    fn format(&self, input: &str) -> Result<String, EngineError> {
        Ok(map_lines(input, |line| self.reindent(line)))
    }
}

/// Sorts each contiguous block of `import` statements by configured prefix groups.
///
/// Preference: `import.order`, comma separated prefixes.
pub struct ImportOrder {
    groups: Vec<String>,
}

impl ImportOrder {
    pub fn create(preferences: &Preferences) -> Result<Box<dyn FormatterEngine>, EngineError> {
        let groups = preferences
            .get("import.order")
            .unwrap_or(DEFAULT_IMPORT_ORDER)
            .split(',')
            .map(|group| group.trim().to_string())
            .filter(|group| !group.is_empty())
            .collect();
        Ok(Box::new(ImportOrder { groups }))
    }

    fn rank(&self, import: &str) -> (usize, String) {
        let path = import
            .trim_start_matches("import")
            .trim_start()
            .trim_start_matches("static ")
            .trim()
            .to_string();
        let group = self
            .groups
            .iter()
            .position(|prefix| path == *prefix || path.starts_with(&format!("{}.", prefix)))
            .unwrap_or(self.groups.len());
        (group, path)
    }

    fn flush(&self, block: &mut Vec<String>, output: &mut Vec<String>) {
        block.sort_by_key(|import| self.rank(import));
        block.dedup();
        output.append(block);
    }
}

impl FormatterEngine for ImportOrder {
    fn format(&self, input: &str) -> Result<String, EngineError> {
        let mut output = Vec::new();
        let mut block = Vec::new();
        for (idx, line) in input.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.starts_with("import ") {
                if !trimmed.ends_with(';') {
                    return Err(EngineError::new(format!(
                        "line {}: malformed import '{}'",
                        idx + 1,
                        trimmed
                    )));
                }
                block.push(trimmed.to_string());
                continue;
            }
            self.flush(&mut block, &mut output);
            output.push(line.to_string());
        }
        self.flush(&mut block, &mut output);

        let mut formatted = output.join("\n");
        if input.ends_with('\n') {
            formatted.push('\n');
        }
        Ok(formatted)
    }
}

fn map_lines(input: &str, mut transform: impl FnMut(&str) -> String) -> String {
    let mut formatted = String::with_capacity(input.len());
    for line in input.split_inclusive('\n') {
        let (content, ending) = match line.strip_suffix("\r\n") {
            Some(content) => (content, "\r\n"),
            None => match line.strip_suffix('\n') {
                Some(content) => (content, "\n"),
                None => (line, ""),
            },
        };
        formatted.push_str(&transform(content));
        formatted.push_str(ending);
    }
    formatted
}
