//! Mustache templates for documentation snippets.
//!
//! A mustache [Template] compiled from source is rendered against a [Value],
//! getting partials from a [TemplateStore]. On top of it, the [engine]
//! module resolves templates by name and compiles them without HTML
//! escaping, since snippets are AsciiDoc, Markdown or plain text.
//!
//! All core Mustache features are supported, as well as dynamic
//! partials. A [Value::Lambda] used as a section receives the section as a
//! [Fragment] and replaces it with whatever it returns.
//!
//!
//! # Samples
//!
//! ## Hello world
//!
//! ```
//! use mustache::{Template, JsonValue, Value};
//!
//! let text = "hello, {{you}}!";
//! let data = r#"{
//!     "you": "world"
//! }"#;
//!
//! let template = Template::from(text).unwrap();
//! let context = Value::from(serde_json::from_str::<JsonValue>(data).unwrap());
//!
//! let result = template.render(&context).unwrap();
//!
//! assert_eq!(result, "hello, world!")
//! ```
//!
//! ## Hello team
//!
//! ```
//! use mustache::{Template, YamlValue, Value};
//! let text = r#"
//!   {{#team}}
//!   hello, {{address}} {{name}}!
//!   {{/team}}
//! "#;
//! let data = r#"
//!   team:
//!     - name: john
//!       address: little
//!     - name: 42
//!       address: citizen
//! "#;
//!
//! let template = Template::from(text).unwrap();
//! let context = Value::from(serde_yaml::from_str::<YamlValue>(data).unwrap());
//!
//! let result = template.render(&context).unwrap();
//! assert_eq!(result, r#"
//!   hello, little john!
//!   hello, citizen 42!
//! "#);
//! ```
//!
//! ## Snippets
//!
//! ```no_run
//! use std::path::Path;
//! use mustache::{Context, EngineConfig, MustacheTemplateEngine, TemplateEngine};
//! use mustache::engine::Template as _;
//!
//! # fn main() -> mustache::Result<()> {
//! let config = EngineConfig::load(Path::new("snippets.yml"))?;
//! let engine = MustacheTemplateEngine::from_config(&config);
//! let template = engine.compile_template("http-request")?;
//! template.render_to(&Context::new(), &mut std::io::stdout())?;
//! # Ok(())
//! # }
//! ```
mod template;
mod reader;
mod context;
mod value;
mod json;
mod yaml;
mod error;
pub mod engine;

pub use self::template::{Compiler, Template, TemplateStore, TemplateMap};
pub use self::value::{Context, Fragment, Lambda, Value};
pub use self::json::JsonValue;
pub use self::yaml::YamlValue;
pub use self::error::{Error, Result, SyntaxError};
pub use self::engine::{
    EngineConfig, MapTemplateResourceResolver, MustacheTemplate, MustacheTemplateEngine,
    ResolverConfig, StandardTemplateResourceResolver, TemplateEngine, TemplateResourceResolver,
};
