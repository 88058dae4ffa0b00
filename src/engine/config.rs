use std::fs;
use std::path::{Path, PathBuf};
use serde::Deserialize;
use crate::engine::mustache::CODE_BLOCK_TEMPLATE;
use crate::error::{Error, Result};


/// Settings of a [MustacheTemplateEngine](crate::MustacheTemplateEngine).
///
/// ```
/// use mustache::EngineConfig;
///
/// let config = EngineConfig::from_yaml(r#"
///   templates:
///     roots: [docs/templates]
///     format: asciidoctor
/// "#).unwrap();
///
/// assert!(!config.escape_html);
/// assert_eq!(config.code_block_template, "code-block");
/// assert_eq!(config.templates.extension, "snippet");
/// ```
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineConfig {
    /// Rendered output is documentation text, not HTML.
    pub escape_html: bool,
    pub code_block_template: String,
    pub templates: ResolverConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            escape_html: false,
            code_block_template: CODE_BLOCK_TEMPLATE.to_owned(),
            templates: ResolverConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a `.json` file as JSON and anything else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(
            |source| Error::ConfigRead { path: path.to_owned(), source }
        )?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => EngineConfig::from_json(&text),
            _ => EngineConfig::from_yaml(&text),
        }
    }
}


#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    pub roots: Vec<PathBuf>,
    pub format: Option<String>,
    pub extension: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            roots: Vec::new(),
            format: None,
            extension: "snippet".to_owned(),
        }
    }
}
