use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;
use crate::engine::config::EngineConfig;
use crate::engine::resolver::{StandardTemplateResourceResolver, TemplateResourceResolver};
use crate::engine::{Template, TemplateEngine};
use crate::error::{Error, Result};
use crate::template::{self, Compiler, TemplateStore};
use crate::value::{Context, Fragment, Lambda, Value};


/// Name the code block helper is bound to in every rendering context.
pub const CODE_BLOCK_HELPER: &str = "codeBlock";

/// Template the code block helper renders its content through.
pub const CODE_BLOCK_TEMPLATE: &str = "code-block";


/// A [TemplateEngine] compiling Mustache templates found by a
/// [TemplateResourceResolver].
///
/// Output is documentation text, so by default `{{name}}` is not HTML-escaped.
/// Every template can use the `codeBlock` helper:
///
/// ```
/// use mustache::{Context, MapTemplateResourceResolver, MustacheTemplateEngine, TemplateEngine};
/// use mustache::engine::Template as _;
///
/// let resolver = MapTemplateResourceResolver::new()
///     .with_template("request", "{{#codeBlock}}{{method}} {{path}}{{/codeBlock}}")
///     .with_template("code-block", "[source,{{language}}]\n----\n{{code}}\n----");
/// let engine = MustacheTemplateEngine::new(resolver);
///
/// let mut context = Context::new();
/// context.insert("language".to_owned(), "http".into());
/// context.insert("method".to_owned(), "GET".into());
/// context.insert("path".to_owned(), "/items?a=<b>".into());
///
/// let template = engine.compile_template("request").unwrap();
/// assert_eq!(
///     template.render(&context).unwrap(),
///     "[source,http]\n----\nGET /items?a=<b>\n----"
/// );
/// ```
pub struct MustacheTemplateEngine {
    inner: Arc<Inner>
}

struct Inner {
    resolver: Box<dyn TemplateResourceResolver>,
    compiler: Compiler,
    default_context: Context,
}

impl MustacheTemplateEngine {
    pub fn new<R: TemplateResourceResolver + 'static>(resolver: R) -> Self {
        MustacheTemplateEngine::with_config(resolver, &EngineConfig::default())
    }

    pub fn with_config<R: TemplateResourceResolver + 'static>(
        resolver: R, config: &EngineConfig
    ) -> Self {
        let mut default_context = Context::new();
        default_context.insert(
            CODE_BLOCK_HELPER.to_owned(),
            Value::lambda(CodeBlock { template: config.code_block_template.clone() })
        );
        let inner = Inner {
            resolver: Box::new(resolver),
            compiler: Compiler::new().escape_html(config.escape_html),
            default_context,
        };
        MustacheTemplateEngine { inner: Arc::new(inner) }
    }

    /// An engine reading templates from the configured directories.
    pub fn from_config(config: &EngineConfig) -> Self {
        MustacheTemplateEngine::with_config(
            StandardTemplateResourceResolver::from_config(&config.templates),
            config
        )
    }
}

impl TemplateEngine for MustacheTemplateEngine {
    fn compile_template(&self, name: &str) -> Result<Box<dyn Template>> {
        Ok(Box::new(self.inner.compile(name)?))
    }
}

impl Inner {
    fn compile(self: &Arc<Self>, name: &str) -> Result<MustacheTemplate> {
        let template = self.load(name)?;
        debug!(template = name, "compiled template");
        Ok(MustacheTemplate {
            template,
            engine: Arc::clone(self),
        })
    }

    fn load(&self, name: &str) -> Result<template::Template> {
        let mut source = String::new();
        self.resolver.resolve_template_resource(name)?
            .read_to_string(&mut source)
            .map_err(|source| Error::ResourceRead { name: name.to_owned(), source })?;
        self.compiler.compile(&source).map_err(
            |source| Error::TemplateCompilation { name: name.to_owned(), source }
        )
    }
}

// Partials and code block templates of one render, loaded through the
// resolver on first use. A missing one is an error.
struct Partials<'e> {
    engine: &'e Inner,
    compiled: Mutex<HashMap<String, Arc<template::Template>>>,
}

impl<'e> Partials<'e> {
    fn new(engine: &'e Inner) -> Self {
        Partials { engine, compiled: Mutex::new(HashMap::new()) }
    }
}

impl TemplateStore for Partials<'_> {
    fn get(&self, name: &str) -> Result<Option<Arc<template::Template>>> {
        let mut compiled = self.compiled.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(template) = compiled.get(name) {
            return Ok(Some(Arc::clone(template)));
        }
        let template = Arc::new(self.engine.load(name)?);
        debug!(template = name, "compiled partial");
        compiled.insert(name.to_owned(), Arc::clone(&template));
        Ok(Some(template))
    }
}


/// A compiled template, rendered with the engine's default context beneath
/// the caller's.
pub struct MustacheTemplate {
    template: template::Template,
    engine: Arc<Inner>,
}

impl Template for MustacheTemplate {
    fn render(&self, context: &Context) -> Result<String> {
        let mut combined = self.engine.default_context.clone();
        combined.extend(context.iter().map(|(k, v)| (k.clone(), v.clone())));
        let partials = Partials::new(&self.engine);
        self.template.render_with_partials(&Value::Map(combined), &partials)
    }
}


// Renders its section, then hands the result to the code block template as
// `code` alongside everything else in scope.
struct CodeBlock {
    template: String,
}

impl Lambda for CodeBlock {
    fn execute(&self, fragment: &Fragment<'_>) -> Result<String> {
        let mut context = fragment.merged_context();
        context.insert("code".to_owned(), Value::Text(fragment.execute()?));
        fragment.render_partial(&self.template, &Value::Map(context))?
            .ok_or_else(|| Error::ResourceNotFound { name: self.template.clone() })
    }
}
