use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::PytsError;

pub const CONFIG_FILE_NAME: &str = "pyts.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CompileOptions {
    /// Semantic and type errors suppress code generation, like lexical/syntax errors do.
    #[serde(default = "default_block_on_semantic")]
    pub block_on_semantic: bool,
    /// Spaces per indentation level in the generated TypeScript.
    #[serde(default = "default_indent")]
    pub indent: usize,
    /// Annotate untyped declarations with a type inferred from the literal shape.
    #[serde(default = "default_infer_types")]
    pub infer_types: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            block_on_semantic: default_block_on_semantic(),
            indent: default_indent(),
            infer_types: default_infer_types(),
        }
    }
}

fn default_block_on_semantic() -> bool {
    true
}

fn default_indent() -> usize {
    2
}

fn default_infer_types() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PytsToml {
    #[serde(default)]
    compile: CompileOptions,
}

pub fn parse_config(text: &str, origin: &str) -> Result<CompileOptions, PytsError> {
    let parsed: PytsToml = toml::from_str(text)
        .map_err(|err| PytsError::Config(format!("failed to parse {origin}: {err}")))?;
    if parsed.compile.indent == 0 || parsed.compile.indent > 8 {
        return Err(PytsError::Config(format!(
            "{origin}: compile.indent must be between 1 and 8, got {}",
            parsed.compile.indent
        )));
    }
    Ok(parsed.compile)
}

pub fn read_config(path: &Path) -> Result<CompileOptions, PytsError> {
    let text = std::fs::read_to_string(path)?;
    parse_config(&text, &path.display().to_string())
}

/// Loads `pyts.toml` from `dir` when present, defaults otherwise.
pub fn discover_config(dir: &Path) -> Result<CompileOptions, PytsError> {
    let candidate = dir.join(CONFIG_FILE_NAME);
    if candidate.is_file() {
        return read_config(&candidate);
    }
    Ok(CompileOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_table_uses_defaults() {
        let options = parse_config("", "inline").expect("empty config");
        assert_eq!(options, CompileOptions::default());
    }

    #[test]
    fn partial_table_keeps_other_defaults() {
        let options =
            parse_config("[compile]\nblock_on_semantic = false\n", "inline").expect("config");
        assert!(!options.block_on_semantic);
        assert_eq!(options.indent, 2);
        assert!(options.infer_types);
    }

    #[test]
    fn rejects_zero_indent() {
        let err = parse_config("[compile]\nindent = 0\n", "inline").unwrap_err();
        assert!(matches!(err, PytsError::Config(message) if message.contains("indent")));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            parse_config("[compile\n", "inline"),
            Err(PytsError::Config(_))
        ));
    }
}
