//! Named templates for documentation snippets.
//!
//! A [TemplateEngine] turns a template name into a [Template] ready to
//! render a [Context](crate::Context).
use std::io::Write;
use crate::error::{Error, Result};
use crate::value::Context;

pub mod config;
pub mod mustache;
pub mod resolver;

pub use self::config::{EngineConfig, ResolverConfig};
pub use self::mustache::{
    MustacheTemplate, MustacheTemplateEngine, CODE_BLOCK_HELPER, CODE_BLOCK_TEMPLATE
};
pub use self::resolver::{
    MapTemplateResourceResolver, StandardTemplateResourceResolver, TemplateResourceResolver
};


pub trait TemplateEngine {
    /// Resolves and compiles the template called `name`.
    fn compile_template(&self, name: &str) -> Result<Box<dyn Template>>;
}


pub trait Template: Send + Sync {
    fn render(&self, context: &Context) -> Result<String>;

    /// Renders fully before writing, so a failed render writes nothing.
    fn render_to(&self, context: &Context, out: &mut dyn Write) -> Result<()> {
        let text = self.render(context)?;
        out.write_all(text.as_bytes()).map_err(Error::Write)
    }
}
