use std::io;
use std::path::PathBuf;
use thiserror::Error;


/// A malformed template, located by line and column (both 1-based).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message} at line {line}, column {column}")]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl SyntaxError {
    pub(crate) fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let before = &source[..offset.min(source.len())];
        let line_start = before.rfind('\n').map_or(0, |eol| eol + 1);
        SyntaxError {
            message: message.into(),
            line: before.matches('\n').count() + 1,
            column: before[line_start..].chars().count() + 1,
        }
    }
}


#[derive(Error, Debug)]
pub enum Error {
    #[error("template resource `{name}` could not be found")]
    ResourceNotFound { name: String },

    #[error("template resource `{name}` could not be read")]
    ResourceRead {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("template `{name}` could not be compiled")]
    TemplateCompilation {
        name: String,
        #[source]
        source: SyntaxError,
    },

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("helper `{name}` failed: {message}")]
    Helper { name: String, message: String },

    #[error("template `{name}` is nested more than {limit} levels deep")]
    Recursion { name: String, limit: usize },

    #[error("failed to write rendered output")]
    Write(#[source] io::Error),

    #[error("failed to read configuration {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// The template name could not be mapped to readable content.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(self, Error::ResourceNotFound { .. } | Error::ResourceRead { .. })
    }

    /// The template source is not valid Mustache.
    pub fn is_compilation_failure(&self) -> bool {
        matches!(self, Error::TemplateCompilation { .. } | Error::Syntax(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_location_is_one_based() {
        let error = SyntaxError::at("ab\ncd{{", 5, "unclosed tag");
        assert_eq!(error.line, 2);
        assert_eq!(error.column, 3);
        assert_eq!(error.to_string(), "unclosed tag at line 2, column 3");
    }

    #[test]
    fn errors_are_classified() {
        let missing = Error::ResourceNotFound { name: "x".to_owned() };
        assert!(missing.is_resolution_failure());
        assert!(!missing.is_compilation_failure());

        let syntax = Error::Syntax(SyntaxError::at("", 0, "bad"));
        assert!(syntax.is_compilation_failure());
        assert!(!syntax.is_resolution_failure());
    }
}
