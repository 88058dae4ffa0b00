use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};
use crate::context::Stack;
use crate::error::{Result, SyntaxError};
use crate::reader::{tokenize, Located, Token};
use crate::value::{Fragment, Lambda, Value};


/// Compilation settings shared by every template it compiles.
#[derive(Clone, Copy, Debug)]
pub struct Compiler {
    escape_html: bool
}

impl Compiler {
    pub fn new() -> Self {
        Compiler { escape_html: true }
    }

    /// Whether `{{name}}` escapes HTML. `{{{name}}}` and `{{&name}}` never do.
    pub fn escape_html(self, escape_html: bool) -> Self {
        Compiler { escape_html }
    }

    pub fn compile(&self, input: &str) -> std::result::Result<Template, SyntaxError> {
        let mut parser = Parser {
            source: input,
            tokens: tokenize(input)?.into_iter(),
            escape_html: self.escape_html,
        };
        let (segments, _) = parser.parse(None)?;
        Ok(Template {
            source: input.to_owned(),
            compiler: *self,
            segments,
            indented: Mutex::new(HashMap::new()),
        })
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new()
    }
}


#[derive(Debug)]
pub struct Template {
    source: String,
    compiler: Compiler,
    segments: Segments,
    // compiled copies of the source with indented lines, keyed by indent
    indented: Mutex<HashMap<String, Arc<Template>>>,
}

impl Template {
    pub fn from(input: &str) -> std::result::Result<Self, SyntaxError> {
        Compiler::new().compile(input)
    }

    pub fn render(&self, context: &Value) -> Result<String> {
        let stack = Stack::new(context);
        self.render_internal(&stack, None)
    }

    pub fn render_with_partials(
        &self, context: &Value, partials: &dyn TemplateStore
    ) -> Result<String> {
        let stack = Stack::new(context);
        self.render_internal(&stack, Some(partials))
    }

    pub(crate) fn render_internal(
        &self, stack: &Stack, partials: Option<&dyn TemplateStore>,
    ) -> Result<String> {
        self.segments.render(stack, partials)
    }

    /// This template with `indent` put in front of every source line, the
    /// way a standalone partial tag includes it.
    fn indented(&self, indent: &str) -> Result<Arc<Template>> {
        let mut indented = self.indented.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(template) = indented.get(indent) {
            return Ok(Arc::clone(template));
        }
        let source = self.source.split_inclusive('\n')
            .map(|line| [indent, line].concat())
            .collect::<String>();
        let template = Arc::new(self.compiler.compile(&source)?);
        indented.insert(indent.to_owned(), Arc::clone(&template));
        Ok(template)
    }
}


struct Parser<'a> {
    source: &'a str,
    tokens: std::vec::IntoIter<Located<'a>>,
    escape_html: bool,
}

impl<'a> Parser<'a> {
    // returns the segments up to the close of `section`, along with the
    // offset where the section content ends
    fn parse(
        &mut self, section: Option<(&'a str, usize)>
    ) -> std::result::Result<(Segments, usize), SyntaxError> {
        let mut segments = Segments::new();
        while let Some(Located { token, offset }) = self.tokens.next() {
            match token {
                Token::Text { text } => {
                    segments.push(Box::new(TextSegment::new(text)))
                },
                Token::Value { name, escaped } => {
                    segments.push(Box::new(ValueSegment::new(name, escaped && self.escape_html)))
                },
                Token::Section { name, inverted, body_start } => {
                    let (children, body_end) = self.parse(Some((name, offset)))?;
                    if inverted {
                        segments.push(Box::new(InvertedSectionSegment::new(name, children)))
                    } else {
                        let source = self.source.get(body_start..body_end).unwrap_or_default();
                        segments.push(Box::new(SectionSegment::new(name, source, children)))
                    }
                },
                Token::Close { name, body_end } => {
                    return match section {
                        Some((open, _)) if open == name => Ok((segments, body_end)),
                        Some((open, _)) => Err(SyntaxError::at(
                            self.source, offset,
                            format!("closing tag `{}` does not match open section `{}`", name, open)
                        )),
                        None => Err(SyntaxError::at(
                            self.source, offset,
                            format!("unexpected closing tag `{}`", name)
                        )),
                    };
                },
                Token::Partial { name, dynamic, indent } => {
                    segments.push(Box::new(PartialSegment::new(name, dynamic, indent)))
                },
                Token::Comment | Token::Delimiters => {
                },
            }
        }
        match section {
            Some((name, offset)) => Err(SyntaxError::at(
                self.source, offset, format!("unclosed section `{}`", name)
            )),
            None => Ok((segments, self.source.len()))
        }
    }
}


pub(crate) trait Segment: Debug + Send + Sync {
    fn render(
        &self, stack: &Stack, partials: Option<&dyn TemplateStore>
    ) -> Result<String>;
}

pub(crate) type Segments = Vec<Box<dyn Segment>>;

impl Segment for Segments {
    fn render(
        &self, stack: &Stack, partials: Option<&dyn TemplateStore>
    ) -> Result<String> {
        self.iter()
            .map(|child| child.render(stack, partials))
            .collect::<Result<Vec<_>>>()
            .map(|parts| parts.concat())
    }
}


#[derive(Debug)]
struct TextSegment {
    text: String
}

impl TextSegment {
    fn new(text: &str) -> Self {
        TextSegment {
            text: text.to_owned()
        }
    }
}

impl Segment for TextSegment {
    fn render(
        &self, _stack: &Stack, _partials: Option<&dyn TemplateStore>
    ) -> Result<String> {
        Ok(self.text.clone())
    }
}


#[derive(Debug)]
struct ValueSegment {
    name: String,
    is_escaped: bool
}

impl ValueSegment {
    fn new(name: &str, is_escaped: bool) -> Self {
        ValueSegment {
            name: name.to_owned(),
            is_escaped
        }
    }
}

impl Segment for ValueSegment {
    fn render(
        &self, stack: &Stack, partials: Option<&dyn TemplateStore>
    ) -> Result<String> {
        let text = match stack.lookup(&self.name) {
            Some(Value::Lambda(lambda)) =>
                lambda.execute(&Fragment::new("", None, stack, partials))?,
            Some(value) => value.to_text(),
            None => String::new()
        };
        match self.is_escaped {
            true => Ok(html_escape(&text)),
            false => Ok(text)
        }
    }
}


#[derive(Debug)]
struct SectionSegment {
    name: String,
    source: String,
    children: Segments
}

impl SectionSegment {
    fn new(name: &str, source: &str, children: Segments) -> Self {
        SectionSegment {
            name: name.to_owned(),
            source: source.to_owned(),
            children
        }
    }
}

impl Segment for SectionSegment {
    fn render(
        &self, stack: &Stack, partials: Option<&dyn TemplateStore>
    ) -> Result<String> {
        match stack.lookup(&self.name) {
            Some(Value::Lambda(lambda)) => lambda.execute(&Fragment::new(
                &self.source, Some(&self.children), stack, partials
            )),
            Some(Value::List(items)) => items.iter()
                .map(|item| self.children.render(&stack.push(item), partials))
                .collect::<Result<Vec<_>>>()
                .map(|parts| parts.concat()),
            Some(value) if value.is_truthy() =>
                self.children.render(&stack.push(value), partials),
            _ => Ok(String::new())
        }
    }
}


#[derive(Debug)]
struct InvertedSectionSegment {
    name: String,
    children: Segments
}

impl InvertedSectionSegment {
    fn new(name: &str, children: Segments) -> Self {
        InvertedSectionSegment {
            name: name.to_owned(),
            children
        }
    }
}

impl Segment for InvertedSectionSegment {
    fn render(
        &self, stack: &Stack, partials: Option<&dyn TemplateStore>
    ) -> Result<String> {
        match stack.lookup(&self.name) {
            Some(value) if value.is_truthy() => Ok(String::new()),
            _ => self.children.render(stack, partials)
        }
    }
}


#[derive(Debug)]
struct PartialSegment {
    name: String,
    is_dynamic: bool,
    indent: String
}

impl PartialSegment {
    fn new(name: &str, is_dynamic: bool, indent: &str) -> Self {
        PartialSegment {
            name: name.to_owned(),
            is_dynamic,
            indent: indent.to_owned()
        }
    }
}

impl Segment for PartialSegment {
    fn render(
        &self, stack: &Stack, partials: Option<&dyn TemplateStore>
    ) -> Result<String> {
        let store = match partials {
            Some(store) => store,
            None => return Ok(String::new())
        };
        let name = if self.is_dynamic {
            match stack.lookup(&self.name) {
                Some(value) => value.to_text(),
                None => return Ok(String::new())
            }
        } else {
            self.name.clone()
        };
        let stack = stack.nested(&name)?;
        match store.get(&name)? {
            Some(template) if self.indent.is_empty() =>
                template.render_internal(&stack, partials),
            Some(template) =>
                template.indented(&self.indent)?.render_internal(&stack, partials),
            None => Ok(String::new())
        }
    }
}

fn html_escape(input: &str) -> String {
    input.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
        .replace('`', "&#96;")
        .replace('=', "&#61;")
}


/// Source of partials, looked up by name at render time.
pub trait TemplateStore: Send + Sync {
    fn get(&self, name: &str) -> Result<Option<Arc<Template>>>;
}


/// Partials compiled up front. Unknown names render as empty text.
#[derive(Debug, Default)]
pub struct TemplateMap {
    compiler: Compiler,
    templates: HashMap<String, Arc<Template>>
}

impl TemplateMap {
    pub fn new() -> Self {
        TemplateMap::with_compiler(Compiler::new())
    }

    pub fn with_compiler(compiler: Compiler) -> Self {
        TemplateMap { compiler, templates: HashMap::new() }
    }

    pub fn load(&mut self, name: &str, input: &str) -> Result<()> {
        let template = self.compiler.compile(input)?;
        self.templates.insert(name.to_owned(), Arc::new(template));
        Ok(())
    }
}

impl TemplateStore for TemplateMap {
    fn get(&self, name: &str) -> Result<Option<Arc<Template>>> {
        Ok(self.templates.get(name).cloned())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::value::Context;

    fn context(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(
            entries.into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect::<Context>()
        )
    }

    fn render(text: &str, data: &Value) -> String {
        Template::from(text).unwrap().render(data).unwrap()
    }

    #[test]
    fn escapes_by_default() {
        let data = context(vec![("v", Value::text("<a href=\"x\">&</a>"))]);
        assert_eq!(
            render("{{v}}|{{{v}}}", &data),
            "&lt;a href&#61;&quot;x&quot;&gt;&amp;&lt;/a&gt;|<a href=\"x\">&</a>"
        );
    }

    #[test]
    fn escaping_can_be_disabled() {
        let data = context(vec![("v", Value::text("<b>"))]);
        let template = Compiler::new().escape_html(false).compile("{{v}}").unwrap();
        assert_eq!(template.render(&data).unwrap(), "<b>");
    }

    #[test]
    fn list_section_iterates() {
        let data = context(vec![(
            "items",
            Value::List(vec![Value::text("a"), Value::text("b")])
        )]);
        assert_eq!(render("{{#items}}[{{.}}]{{/items}}", &data), "[a][b]");
    }

    #[test]
    fn inverted_section_on_missing_and_empty() {
        let data = context(vec![("empty", Value::List(vec![]))]);
        assert_eq!(render("{{^missing}}m{{/missing}}{{^empty}}e{{/empty}}", &data), "me");
    }

    #[test]
    fn lambda_sees_raw_section_source() {
        let data = context(vec![
            ("name", Value::text("x")),
            ("raw", Value::from_fn(|fragment: &Fragment<'_>| Ok(fragment.source().to_owned()))),
        ]);
        assert_eq!(render("{{#raw}}{{name}}{{/raw}}", &data), "{{name}}");
    }

    #[test]
    fn lambda_can_execute_section() {
        let data = context(vec![
            ("name", Value::text("x")),
            ("upper", Value::from_fn(|fragment: &Fragment<'_>| {
                Ok(fragment.execute()?.to_uppercase())
            })),
        ]);
        assert_eq!(render("{{#upper}}hi {{name}}{{/upper}}", &data), "HI X");
    }

    #[test]
    fn lambda_in_interpolation_is_escaped() {
        let data = context(vec![
            ("tag", Value::from_fn(|_: &Fragment<'_>| Ok("<br>".to_owned()))),
        ]);
        assert_eq!(render("{{tag}}{{&tag}}", &data), "&lt;br&gt;<br>");
    }

    #[test]
    fn partial_indentation() {
        let mut partials = TemplateMap::new();
        partials.load("p", "a\nb{{v}}\n").unwrap();
        let data = context(vec![("v", Value::text("!"))]);
        let template = Template::from("x\n  {{>p}}\ny").unwrap();
        assert_eq!(
            template.render_with_partials(&data, &partials).unwrap(),
            "x\n  a\n  b!\ny"
        );
    }

    #[test]
    fn indentation_reaches_section_content() {
        let mut partials = TemplateMap::new();
        partials.load("p", "{{#a}}<{{v}}>{{/a}}\n{{#items}}\n{{.}}\n{{/items}}\n").unwrap();
        let data = context(vec![
            ("a", Value::Bool(true)),
            ("v", Value::text("x")),
            ("items", Value::List(vec![Value::text("1"), Value::text("2")])),
        ]);
        let template = Template::from("  {{>p}}\n").unwrap();
        assert_eq!(
            template.render_with_partials(&data, &partials).unwrap(),
            "  <x>\n  1\n  2\n"
        );
    }

    #[test]
    fn recursive_partials_follow_data() {
        let mut partials = TemplateMap::new();
        partials.load("node", "{{name}}({{#children}}{{>node}}{{/children}})").unwrap();
        let leaf = |name: &str| context(vec![("name", Value::text(name)), ("children", Value::List(vec![]))]);
        let data = context(vec![
            ("name", Value::text("root")),
            ("children", Value::List(vec![leaf("a"), leaf("b")])),
        ]);
        let template = Template::from("{{>node}}").unwrap();
        assert_eq!(
            template.render_with_partials(&data, &partials).unwrap(),
            "root(a()b())"
        );
    }

    #[test]
    fn endless_partial_recursion_fails() {
        let mut partials = TemplateMap::new();
        partials.load("again", "x{{>again}}").unwrap();
        let template = Template::from("{{>again}}").unwrap();
        let error = template.render_with_partials(&context(vec![]), &partials).unwrap_err();
        assert!(matches!(error, Error::Recursion { ref name, .. } if name == "again"));
    }

    #[test]
    fn dynamic_partial() {
        let mut partials = TemplateMap::new();
        partials.load("item", "<{{v}}>").unwrap();
        let data = context(vec![("kind", Value::text("item")), ("v", Value::text("1"))]);
        let template = Template::from("{{>*kind}}{{>missing}}").unwrap();
        assert_eq!(template.render_with_partials(&data, &partials).unwrap(), "<1>");
    }

    #[test]
    fn unbalanced_sections_fail() {
        let error = Template::from("{{#a}}\n{{#b}}\n{{/a}}").unwrap_err();
        assert_eq!(error.message, "closing tag `a` does not match open section `b`");
        assert_eq!(error.line, 3);

        let error = Template::from("x {{#a}} y").unwrap_err();
        assert_eq!(error.message, "unclosed section `a`");

        let error = Template::from("x {{/a}}").unwrap_err();
        assert_eq!(error.message, "unexpected closing tag `a`");
    }
}
