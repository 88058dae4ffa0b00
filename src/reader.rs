use crate::error::SyntaxError;


/// A token and the byte offset where it starts in the source.
#[derive(PartialEq, Debug)]
pub(crate) struct Located<'a> {
    pub(crate) token: Token<'a>,
    pub(crate) offset: usize,
}

#[derive(PartialEq, Debug)]
pub(crate) enum Token<'a> {
    Text { text: &'a str },
    Value { name: &'a str, escaped: bool },
    // body_start is the offset of the first byte of the section content
    Section { name: &'a str, inverted: bool, body_start: usize },
    // body_end is the offset right after the last byte of the section content
    Close { name: &'a str, body_end: usize },
    Partial { name: &'a str, dynamic: bool, indent: &'a str },
    Comment,
    Delimiters,
}

impl<'a> Token<'a> {
    fn is_text(&self) -> bool {
        matches!(self, Token::Text { .. })
    }

    fn can_stand_alone(&self) -> bool {
        !matches!(self, Token::Text { .. } | Token::Value { .. })
    }

    fn is_blank(&self) -> bool {
        match self {
            Token::Text { text, .. } => {
                let text = text.strip_suffix('\n').unwrap_or(text);
                let text = text.strip_suffix('\r').unwrap_or(text);
                text.chars().all(|c| c == ' ' || c == '\t')
            },
            _ => true
        }
    }
}


/// Splits Mustache source into tokens.
///
/// Text is cut at every line end, so a text token never spans lines. Once a
/// line is complete it is checked for being standalone: a single section,
/// inverted, closing, partial, comment or delimiters tag surrounded only by
/// whitespace. Such a line leaves no text behind.
pub(crate) fn tokenize(input: &str) -> Result<Vec<Located<'_>>, SyntaxError> {
    Reader::new(input).run()
}

struct Reader<'a> {
    input: &'a str,
    open_delimiter: &'a str,
    close_delimiter: &'a str,
    pos: usize,
    line_start: usize,
    first_on_line: usize,
    tokens: Vec<Located<'a>>,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Reader {
            input,
            open_delimiter: "{{",
            close_delimiter: "}}",
            pos: 0,
            line_start: 0,
            first_on_line: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Located<'a>>, SyntaxError> {
        let input = self.input;
        while self.pos < input.len() {
            match input[self.pos..].find(self.open_delimiter) {
                Some(0) => self.read_tag()?,
                Some(p) => self.read_text(self.pos + p),
                None => self.read_text(input.len()),
            }
        }
        self.end_line(input.len());
        Ok(self.tokens)
    }

    fn read_text(&mut self, end: usize) {
        let input = self.input;
        while self.pos < end {
            let chunk = &input[self.pos..end];
            let len = chunk.find('\n').map_or(chunk.len(), |eol| eol + 1);
            let text = &chunk[..len];
            self.push(Token::Text { text }, self.pos);
            self.pos += len;
            if text.ends_with('\n') {
                self.end_line(self.pos);
            }
        }
    }

    fn read_tag(&mut self) -> Result<(), SyntaxError> {
        let start = self.pos;
        let inner_start = start + self.open_delimiter.len();
        let input = self.input;
        let rest = &input[inner_start..];
        let close = match rest.chars().next() {
            Some('{') => ["}", self.close_delimiter].concat(),
            Some('=') => ["=", self.close_delimiter].concat(),
            _ => self.close_delimiter.to_owned(),
        };
        let len = rest.find(&close)
            .ok_or_else(|| self.error(start, "unclosed tag"))?;
        let after = inner_start + len + close.len();
        let token = self.tag(rest[..len].trim(), start, after)?;
        self.push(token, start);
        self.pos = after;
        Ok(())
    }

    fn tag(
        &mut self, text: &'a str, start: usize, after: usize
    ) -> Result<Token<'a>, SyntaxError> {
        let mut chars = text.chars();
        let sigil = chars.next().ok_or_else(|| self.error(start, "empty tag"))?;
        let rest = chars.as_str().trim();
        let token = match sigil {
            '#' | '^' => Token::Section {
                name: self.name(rest, start)?,
                inverted: sigil == '^',
                body_start: after,
            },
            '/' => Token::Close {
                name: self.name(rest, start)?,
                body_end: start,
            },
            '>' => {
                let (rest, dynamic) = match rest.strip_prefix('*') {
                    Some(rest) => (rest.trim_start(), true),
                    None => (rest, false),
                };
                Token::Partial { name: self.name(rest, start)?, dynamic, indent: "" }
            },
            '!' => Token::Comment,
            '=' => {
                let (open, close) = self.delimiters(rest, start)?;
                self.open_delimiter = open;
                self.close_delimiter = close;
                Token::Delimiters
            },
            '&' | '{' => Token::Value {
                name: self.name(rest, start)?,
                escaped: false,
            },
            _ => Token::Value {
                name: self.name(text, start)?,
                escaped: true,
            },
        };
        Ok(token)
    }

    fn name(&self, text: &'a str, start: usize) -> Result<&'a str, SyntaxError> {
        if text == "." {
            Ok(text)
        } else if text.is_empty() {
            Err(self.error(start, "missing tag name"))
        } else if text.starts_with('.') || text.ends_with('.')
            || text.contains("..") || text.contains(char::is_whitespace) {
            Err(self.error(start, format!("invalid tag name `{}`", text)))
        } else {
            Ok(text)
        }
    }

    fn delimiters(&self, text: &'a str, start: usize) -> Result<(&'a str, &'a str), SyntaxError> {
        let words = text.split_whitespace().collect::<Vec<_>>();
        match words.as_slice() {
            [open, close] if !text.contains('=') => Ok((*open, *close)),
            _ => Err(self.error(start, "invalid delimiters tag")),
        }
    }

    fn push(&mut self, token: Token<'a>, offset: usize) {
        self.tokens.push(Located { token, offset });
    }

    fn end_line(&mut self, next_line: usize) {
        let line = &self.tokens[self.first_on_line..];
        let mut tags = line.iter().filter(|it| !it.token.is_text());
        let standalone = match (tags.next(), tags.next()) {
            (Some(tag), None) =>
                tag.token.can_stand_alone() && line.iter().all(|it| it.token.is_blank()),
            _ => false
        };
        if standalone {
            self.strip_line(next_line);
        }
        self.line_start = next_line;
        self.first_on_line = self.tokens.len();
    }

    // drop the whitespace of a standalone line, moving section bounds to
    // whole lines and keeping the indentation of a partial
    fn strip_line(&mut self, next_line: usize) {
        let line = self.tokens.split_off(self.first_on_line);
        let indent = match line.first() {
            Some(Located { token: Token::Text { text, .. }, .. }) => *text,
            _ => ""
        };
        let line_start = self.line_start;
        for Located { token, offset } in line {
            let token = match token {
                Token::Text { .. } => continue,
                Token::Section { name, inverted, .. } =>
                    Token::Section { name, inverted, body_start: next_line },
                Token::Close { name, .. } =>
                    Token::Close { name, body_end: line_start },
                Token::Partial { name, dynamic, .. } =>
                    Token::Partial { name, dynamic, indent },
                other => other
            };
            self.push(token, offset);
        }
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> SyntaxError {
        SyntaxError::at(self.input, offset, message)
    }
}
