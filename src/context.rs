use crate::error::{Error, Result};
use crate::value::Value;


static NULL: Value = Value::Null;

/// How deep partials and code blocks may be nested inside each other.
pub(crate) const MAX_DEPTH: usize = 32;

/// The chain of values a template is rendered against, innermost last,
/// along with how many templates deep the rendering is.
#[derive(Clone, Debug)]
pub(crate) struct Stack<'a> {
    frames: Vec<&'a Value>,
    depth: usize,
}

impl<'a> Stack<'a> {
    pub(crate) fn new(root: &'a Value) -> Self {
        Stack::with_depth(root, 0)
    }

    pub(crate) fn with_depth(root: &'a Value, depth: usize) -> Self {
        Stack {
            frames: vec![root],
            depth,
        }
    }

    pub(crate) fn push(&self, frame: &'a Value) -> Stack<'a> {
        let mut frames = self.frames.clone();
        frames.push(frame);
        Stack { frames, depth: self.depth }
    }

    /// The same frames, for rendering the template `name` one level deeper.
    pub(crate) fn nested(&self, name: &str) -> Result<Stack<'a>> {
        Ok(Stack {
            frames: self.frames.clone(),
            depth: nested_depth(name, self.depth)?,
        })
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn top(&self) -> &'a Value {
        self.frames.last().copied().unwrap_or(&NULL)
    }

    pub(crate) fn frames(&self) -> impl Iterator<Item = &'a Value> + '_ {
        self.frames.iter().copied()
    }

    /// Resolves a possibly dotted name. The first part is searched from the
    /// innermost frame outwards, the remaining parts only inside what the
    /// first part resolved to.
    pub(crate) fn lookup(&self, name: &str) -> Option<&'a Value> {
        if name == "." {
            return Some(self.top());
        }
        let mut parts = name.split('.');
        let head = parts.next()?;
        let found = self.frames.iter()
            .rev()
            .copied()
            .find_map(|frame| frame.get(head))?;
        parts.try_fold(found, |value, part| value.get(part))
    }
}

pub(crate) fn nested_depth(name: &str, depth: usize) -> Result<usize> {
    if depth < MAX_DEPTH {
        Ok(depth + 1)
    } else {
        Err(Error::Recursion { name: name.to_owned(), limit: MAX_DEPTH })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Context;

    fn map(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(
            entries.into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect::<Context>()
        )
    }

    #[test]
    fn inner_frame_shadows_outer() {
        let outer = map(vec![("a", Value::text("outer")), ("b", Value::text("b"))]);
        let inner = map(vec![("a", Value::text("inner"))]);
        let root = Stack::new(&outer);
        let stack = root.push(&inner);
        assert_eq!(stack.lookup("a").map(Value::to_text), Some("inner".to_owned()));
        assert_eq!(stack.lookup("b").map(Value::to_text), Some("b".to_owned()));
        assert_eq!(root.lookup("a").map(Value::to_text), Some("outer".to_owned()));
    }

    #[test]
    fn dotted_names_do_not_fall_back() {
        let outer = map(vec![("a", map(vec![("b", Value::text("outer"))]))]);
        let inner = map(vec![("a", map(vec![]))]);
        let stack = Stack::new(&outer).push(&inner);
        assert!(stack.lookup("a.b").is_none());
        assert!(Stack::new(&outer).lookup("a.b").is_some());
    }

    #[test]
    fn implicit_iterator_is_top_frame() {
        let root = map(vec![]);
        let item = Value::text("item");
        let stack = Stack::new(&root).push(&item);
        assert_eq!(stack.lookup(".").map(Value::to_text), Some("item".to_owned()));
    }

    #[test]
    fn nesting_is_limited() {
        let root = map(vec![]);
        let mut stack = Stack::new(&root).push(&root);
        for _ in 0..MAX_DEPTH {
            stack = stack.nested("p").unwrap();
        }
        assert_eq!(stack.depth(), MAX_DEPTH);
        assert_eq!(stack.frames().count(), 2);
        let error = stack.nested("p").unwrap_err();
        assert!(matches!(error, Error::Recursion { ref name, limit: MAX_DEPTH } if name == "p"));
    }
}
