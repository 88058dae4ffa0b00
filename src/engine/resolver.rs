use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;
use tracing::{debug, trace};
use crate::engine::config::ResolverConfig;
use crate::error::{Error, Result};


/// Maps a logical template name to readable content.
pub trait TemplateResourceResolver: Send + Sync {
    fn resolve_template_resource(&self, name: &str) -> Result<Box<dyn Read + Send>>;
}


/// Looks templates up on disk.
///
/// Every root is tried in order. Within a root a format-specific template,
/// `<root>/<format>/<name>.<extension>`, wins over the generic
/// `<root>/<name>.<extension>`.
#[derive(Debug, Clone)]
pub struct StandardTemplateResourceResolver {
    roots: Vec<PathBuf>,
    format: Option<String>,
    extension: String,
}

impl StandardTemplateResourceResolver {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        StandardTemplateResourceResolver::from_config(&ResolverConfig {
            roots: vec![root.into()],
            ..ResolverConfig::default()
        })
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        StandardTemplateResourceResolver {
            roots: config.roots.clone(),
            format: config.format.clone(),
            extension: config.extension.clone(),
        }
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_owned());
        self
    }

    fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let file_name = if self.extension.is_empty() {
            name.to_owned()
        } else {
            format!("{}.{}", name, self.extension)
        };
        self.roots.iter()
            .flat_map(|root| {
                let specific = self.format.as_ref().map(|format| root.join(format).join(&file_name));
                specific.into_iter().chain(Some(root.join(&file_name)))
            })
            .collect::<Vec<_>>()
    }
}

impl TemplateResourceResolver for StandardTemplateResourceResolver {
    fn resolve_template_resource(&self, name: &str) -> Result<Box<dyn Read + Send>> {
        for path in self.candidates(name) {
            match path.metadata() {
                Ok(metadata) if metadata.is_file() => {
                    let file = File::open(&path)
                        .map_err(|source| Error::ResourceRead { name: name.to_owned(), source })?;
                    debug!(template = name, path = %path.display(), "resolved template");
                    return Ok(Box::new(file));
                },
                Ok(_) => {
                    trace!(template = name, path = %path.display(), "not a file");
                },
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    trace!(template = name, path = %path.display(), "no template");
                },
                Err(source) => {
                    return Err(Error::ResourceRead { name: name.to_owned(), source });
                },
            }
        }
        Err(Error::ResourceNotFound { name: name.to_owned() })
    }
}


/// Templates held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MapTemplateResourceResolver {
    templates: HashMap<String, String>
}

impl MapTemplateResourceResolver {
    pub fn new() -> Self {
        MapTemplateResourceResolver::default()
    }

    pub fn with_template(mut self, name: &str, source: &str) -> Self {
        self.insert(name, source);
        self
    }

    pub fn insert(&mut self, name: &str, source: &str) {
        self.templates.insert(name.to_owned(), source.to_owned());
    }
}

impl TemplateResourceResolver for MapTemplateResourceResolver {
    fn resolve_template_resource(&self, name: &str) -> Result<Box<dyn Read + Send>> {
        match self.templates.get(name) {
            Some(source) => Ok(Box::new(Cursor::new(source.clone().into_bytes()))),
            None => Err(Error::ResourceNotFound { name: name.to_owned() })
        }
    }
}
