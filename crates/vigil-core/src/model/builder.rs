//! Incremental construction of a [`Model`].

use id_arena::Arena;

use super::{
    Accessibility, Language, Model, ModelError, Modifiers, Node, NodeId, NodeKind, ParameterKind,
};
use crate::span::Span;

/// Description of one declaration handed to [`ModelBuilder::open`] or [`ModelBuilder::leaf`].
#[derive(Debug, Clone)]
pub struct Decl {
    kind: NodeKind,
    span: Span,
    name: Option<(String, Span)>,
    accessibility: Option<(Accessibility, Option<Span>)>,
    modifiers: Modifiers,
    parameter_kind: Option<ParameterKind>,
    type_name: Option<String>,
    base_types: Vec<String>,
}

impl Decl {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            name: None,
            accessibility: None,
            modifiers: Modifiers::default(),
            parameter_kind: None,
            type_name: None,
            base_types: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>, name_span: Span) -> Self {
        self.name = Some((name.into(), name_span));
        self
    }

    /// `keyword` is the span of the accessibility keyword when it is written out.
    pub fn accessibility(mut self, accessibility: Accessibility, keyword: Option<Span>) -> Self {
        self.accessibility = Some((accessibility, keyword));
        self
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn static_(mut self) -> Self {
        self.modifiers.is_static = true;
        self
    }

    pub fn abstract_(mut self) -> Self {
        self.modifiers.is_abstract = true;
        self
    }

    pub fn sealed(mut self) -> Self {
        self.modifiers.is_sealed = true;
        self
    }

    pub fn partial(mut self) -> Self {
        self.modifiers.is_partial = true;
        self
    }

    pub fn generated(mut self) -> Self {
        self.modifiers.is_generated = true;
        self
    }

    pub fn parameter_kind(mut self, kind: ParameterKind) -> Self {
        self.parameter_kind = Some(kind);
        self
    }

    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn base_type(mut self, base: impl Into<String>) -> Self {
        self.base_types.push(base.into());
        self
    }
}

/// Builds a model top-down. `open` pushes a container, `close` pops it, `leaf`
/// adds a childless node to the current container.
///
/// Errors are recorded on the first invalid call and returned by [`finish`](Self::finish),
/// so front ends can lower a whole tree without threading `Result` through every step.
pub struct ModelBuilder {
    language: Language,
    source: String,
    arena: Arena<Node>,
    root: NodeId,
    stack: Vec<NodeId>,
    error: Option<ModelError>,
}

impl ModelBuilder {
    pub fn new(language: Language, source: impl Into<String>) -> Self {
        let source = source.into();
        let mut arena = Arena::new();
        let span = Span::new(0, source.len());
        let root = arena.alloc_with_id(|id| Node {
            id,
            kind: NodeKind::CompilationUnit,
            span,
            name: None,
            name_span: None,
            accessibility: None,
            accessibility_span: None,
            modifiers: Modifiers::default(),
            parameter_kind: None,
            type_name: None,
            base_types: Vec::new(),
            parent: None,
            children: Vec::new(),
        });

        Self {
            language,
            source,
            arena,
            root,
            stack: vec![root],
            error: None,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn open(&mut self, decl: Decl) -> NodeId {
        let id = self.alloc(decl);
        self.stack.push(id);
        id
    }

    pub fn leaf(&mut self, decl: Decl) -> NodeId {
        self.alloc(decl)
    }

    pub fn close(&mut self) {
        if self.stack.len() <= 1 {
            self.record(ModelError::Unbalanced("close without matching open"));
            return;
        }
        self.stack.pop();
    }

    pub fn finish(self) -> Result<Model, ModelError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.stack.len() != 1 {
            return Err(ModelError::Unbalanced("open without matching close"));
        }
        Ok(Model::from_parts(
            self.language,
            self.source,
            self.arena,
            self.root,
        ))
    }

    /// First whole-word occurrence of `needle`.
    pub fn find(&self, needle: &str) -> Result<Span, ModelError> {
        self.find_nth(needle, 0)
    }

    /// The `occurrence`-th (zero based) whole-word occurrence of `needle`.
    pub fn find_nth(&self, needle: &str, occurrence: usize) -> Result<Span, ModelError> {
        find_word(&self.source, needle, 0)
            .nth(occurrence)
            .ok_or_else(|| ModelError::TextNotFound {
                needle: needle.to_string(),
                occurrence,
            })
    }

    /// First whole-word occurrence of `needle` at or after byte offset `from`.
    pub fn find_after(&self, needle: &str, from: usize) -> Result<Span, ModelError> {
        find_word(&self.source, needle, from)
            .next()
            .ok_or_else(|| ModelError::TextNotFound {
                needle: needle.to_string(),
                occurrence: 0,
            })
    }

    fn alloc(&mut self, decl: Decl) -> NodeId {
        let parent = self.stack.last().copied().unwrap_or(self.root);
        let text_len = self.source.len();

        let spans = std::iter::once(decl.span)
            .chain(decl.name.as_ref().map(|(_, s)| *s))
            .chain(decl.accessibility.and_then(|(_, s)| s));
        for span in spans {
            if !span.is_valid_for(&self.source) {
                self.record(ModelError::InvalidSpan {
                    kind: decl.kind,
                    span,
                    text_len,
                });
            }
        }

        let (name, name_span) = match decl.name {
            Some((name, span)) => (Some(name), Some(span)),
            None => (None, None),
        };
        let (accessibility, accessibility_span) = match decl.accessibility {
            Some((accessibility, span)) => (Some(accessibility), span),
            None => (None, None),
        };

        let id = self.arena.alloc_with_id(|id| Node {
            id,
            kind: decl.kind,
            span: decl.span,
            name,
            name_span,
            accessibility,
            accessibility_span,
            modifiers: decl.modifiers,
            parameter_kind: decl.parameter_kind,
            type_name: decl.type_name,
            base_types: decl.base_types,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.arena[parent].children.push(id);
        id
    }

    fn record(&mut self, error: ModelError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Occurrences of `needle` in `text` that are not glued to surrounding identifier characters.
pub(crate) fn find_word<'a>(
    text: &'a str,
    needle: &'a str,
    from: usize,
) -> impl Iterator<Item = Span> + 'a {
    let starts_word = needle.chars().next().is_some_and(is_ident_char);
    let ends_word = needle.chars().last().is_some_and(is_ident_char);
    let from = from.min(text.len());

    text.get(from..)
        .unwrap_or("")
        .match_indices(needle)
        .map(move |(i, _)| from + i)
        .filter(move |&start| {
            let end = start + needle.len();
            let before_ok =
                !starts_word || !text[..start].chars().next_back().is_some_and(is_ident_char);
            let after_ok = !ends_word || !text[end..].chars().next().is_some_and(is_ident_char);
            before_ok && after_ok
        })
        .map(move |start| Span::new(start, needle.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_produces_compilation_unit() {
        let model = ModelBuilder::new(Language::CSharp, "class C {}").finish().unwrap();
        assert_eq!(model.root().kind, NodeKind::CompilationUnit);
        assert_eq!(model.root().span, Span::new(0, 10));
        assert!(model.is_empty());
    }

    #[test]
    fn leaf_attaches_to_open_container() {
        let mut builder = ModelBuilder::new(Language::CSharp, "class C { int f; }");
        let class = builder.open(Decl::new(NodeKind::Class, Span::new(0, 18)));
        let field = builder.leaf(Decl::new(NodeKind::Field, Span::new(10, 6)));
        builder.close();
        let model = builder.finish().unwrap();

        assert_eq!(model.node(field).parent, Some(class));
        assert_eq!(model.node(class).children, vec![field]);
    }

    #[test]
    fn out_of_range_span_is_reported_on_finish() {
        let mut builder = ModelBuilder::new(Language::CSharp, "class C {}");
        builder.leaf(Decl::new(NodeKind::Class, Span::new(5, 50)));
        let err = builder.finish().unwrap_err();
        assert!(matches!(err, ModelError::InvalidSpan { text_len: 10, .. }));
    }

    #[test]
    fn unclosed_container_is_an_error() {
        let mut builder = ModelBuilder::new(Language::CSharp, "class C {}");
        builder.open(Decl::new(NodeKind::Class, Span::new(0, 10)));
        assert!(matches!(builder.finish(), Err(ModelError::Unbalanced(_))));
    }

    #[test]
    fn closing_the_root_is_an_error() {
        let mut builder = ModelBuilder::new(Language::CSharp, "");
        builder.close();
        assert!(matches!(builder.finish(), Err(ModelError::Unbalanced(_))));
    }

    #[test]
    fn find_matches_whole_words_only() {
        let builder = ModelBuilder::new(Language::CSharp, "class Cat { C c; }");
        assert_eq!(builder.find("C").unwrap(), Span::new(12, 1));
        assert_eq!(builder.find_nth("c", 0).unwrap(), Span::new(14, 1));
        assert!(builder.find_nth("C", 1).is_err());
    }

    #[test]
    fn find_after_skips_earlier_occurrences() {
        let builder = ModelBuilder::new(Language::CSharp, "T a; T b;");
        assert_eq!(builder.find_after("T", 1).unwrap(), Span::new(5, 1));
    }
}
