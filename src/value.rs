use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use serde::Serialize;
use crate::context::{nested_depth, Stack};
use crate::error::Result;
use crate::template::{Segment, Segments, TemplateStore};


/// Data supplied at render time, keyed by name.
pub type Context = HashMap<String, Value>;


/// A function invocable from template syntax.
///
/// Used as a section, `{{#name}}...{{/name}}`, the lambda receives the
/// section as a [Fragment] and its output replaces the section verbatim.
/// Used as an interpolation, `{{name}}`, it receives an empty fragment and
/// its output is escaped like any other value.
pub trait Lambda: Send + Sync {
    fn execute(&self, fragment: &Fragment<'_>) -> Result<String>;
}

impl<F> Lambda for F
where F: Fn(&Fragment<'_>) -> Result<String> + Send + Sync {
    fn execute(&self, fragment: &Fragment<'_>) -> Result<String> {
        self(fragment)
    }
}


#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Text(String),
    Map(Context),
    List(Vec<Value>),
    Lambda(Arc<dyn Lambda>),
}

impl Value {
    pub fn text(text: impl Into<String>) -> Value {
        Value::Text(text.into())
    }

    pub fn lambda<L: Lambda + 'static>(lambda: L) -> Value {
        Value::Lambda(Arc::new(lambda))
    }

    /// Wraps a closure as a lambda.
    pub fn from_fn<F>(fun: F) -> Value
    where F: Fn(&Fragment<'_>) -> Result<String> + Send + Sync + 'static {
        Value::Lambda(Arc::new(fun))
    }

    /// Converts any serializable value, going through its JSON form.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
        Ok(Value::from(serde_json::to_value(value)?))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(name),
            _ => None
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::List(items) => !items.is_empty(),
            _ => true
        }
    }

    pub(crate) fn to_text(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Text(text) => text.clone(),
            _ => String::new()
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Text(text) => write!(f, "Text({:?})", text),
            Value::Map(map) => f.debug_map().entries(map.iter()).finish(),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Lambda(_) => write!(f, "Lambda {{...}}"),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Context> for Value {
    fn from(map: Context) -> Self {
        Value::Map(map)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}


/// The section a lambda is invoked for.
pub struct Fragment<'f> {
    source: &'f str,
    body: Option<&'f Segments>,
    stack: &'f Stack<'f>,
    partials: Option<&'f dyn TemplateStore>,
}

impl<'f> Fragment<'f> {
    pub(crate) fn new(
        source: &'f str, body: Option<&'f Segments>, stack: &'f Stack<'f>,
        partials: Option<&'f dyn TemplateStore>,
    ) -> Self {
        Fragment { source, body, stack, partials }
    }

    /// The unrendered template text between the section tags.
    pub fn source(&self) -> &str {
        self.source
    }

    /// Renders the section content in the current context.
    pub fn execute(&self) -> Result<String> {
        match self.body {
            Some(body) => body.render(self.stack, self.partials),
            None => Ok(String::new())
        }
    }

    /// Renders the section content with `value` pushed on the context.
    pub fn execute_with(&self, value: &Value) -> Result<String> {
        match self.body {
            Some(body) => body.render(&self.stack.push(value), self.partials),
            None => Ok(String::new())
        }
    }

    /// The innermost context at the point of invocation.
    pub fn context(&self) -> &Value {
        self.stack.top()
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.stack.lookup(name)
    }

    /// Flattens every mapping on the context stack into one, inner names
    /// shadowing outer ones.
    pub fn merged_context(&self) -> Context {
        let mut merged = Context::new();
        for frame in self.stack.frames() {
            if let Value::Map(map) = frame {
                merged.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        merged
    }

    /// Renders the partial `name` against `context` alone, nested one level
    /// below the section. `None` when there is no such partial.
    pub fn render_partial(&self, name: &str, context: &Value) -> Result<Option<String>> {
        let stack = Stack::with_depth(context, nested_depth(name, self.stack.depth())?);
        match self.partials {
            Some(store) => match store.get(name)? {
                Some(template) => template.render_internal(&stack, self.partials).map(Some),
                None => Ok(None)
            },
            None => Ok(None)
        }
    }
}
