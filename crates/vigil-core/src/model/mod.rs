//! Language-neutral syntax/semantic model
//!
//! Every front end lowers its own tree into this vocabulary through
//! [`ModelBuilder`]. Rules only ever see a [`Model`]; it is immutable once built
//! and safe to share between threads.

mod builder;
pub mod typescript;

pub use builder::{Decl, ModelBuilder};
pub use typescript::TypeScriptProvider;

use id_arena::{Arena, Id};
use serde::Serialize;

use crate::span::Span;

pub type NodeId = Id<Node>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Language {
    CSharp,
    VisualBasic,
    TypeScript,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum NodeKind {
    CompilationUnit,
    Namespace,
    Class,
    Struct,
    Interface,
    Enum,
    Method,
    Constructor,
    Property,
    Field,
    Parameter,
    TypeParameter,
    Attribute,
    TypeReference,
}

impl NodeKind {
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            NodeKind::Class | NodeKind::Struct | NodeKind::Interface | NodeKind::Enum
        )
    }

    pub fn is_member(&self) -> bool {
        matches!(
            self,
            NodeKind::Method | NodeKind::Constructor | NodeKind::Property | NodeKind::Field
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Accessibility {
    Private,
    Internal,
    Protected,
    ProtectedInternal,
    Public,
}

impl Accessibility {
    /// Whether code outside the defining assembly/module can reach the declaration.
    pub fn is_exposed(&self) -> bool {
        matches!(
            self,
            Accessibility::Public | Accessibility::Protected | Accessibility::ProtectedInternal
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ParameterKind {
    Value,
    Ref,
    Out,
    Params,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Modifiers {
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_sealed: bool,
    pub is_partial: bool,
    /// Produced by a code generator; fixers must not rewrite it.
    pub is_generated: bool,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub span: Span,
    pub name: Option<String>,
    pub name_span: Option<Span>,
    pub accessibility: Option<Accessibility>,
    pub accessibility_span: Option<Span>,
    pub modifiers: Modifiers,
    pub parameter_kind: Option<ParameterKind>,
    pub type_name: Option<String>,
    pub base_types: Vec<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// The span a diagnostic about this node should point at.
    pub fn report_span(&self) -> Span {
        self.name_span.unwrap_or(self.span)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    #[error("{message} at {line}:{column}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("span {span} of {kind:?} node is outside the source text (length {text_len})")]
    InvalidSpan {
        kind: NodeKind,
        span: Span,
        text_len: usize,
    },
    #[error("text '{needle}' (occurrence {occurrence}) not found in source")]
    TextNotFound { needle: String, occurrence: usize },
    #[error("unbalanced model construction: {0}")]
    Unbalanced(&'static str),
}

/// Builds the model for one compilation unit of a single language.
pub trait ModelProvider: Send + Sync {
    fn language(&self) -> Language;
    fn build(&self, source: &str) -> Result<Model, ModelError>;
}

/// Adapts a closure into a [`ModelProvider`].
pub struct FnProvider<F> {
    language: Language,
    build: F,
}

pub fn provider_fn<F>(language: Language, build: F) -> FnProvider<F>
where
    F: Fn(&str) -> Result<Model, ModelError> + Send + Sync,
{
    FnProvider { language, build }
}

impl<F> ModelProvider for FnProvider<F>
where
    F: Fn(&str) -> Result<Model, ModelError> + Send + Sync,
{
    fn language(&self) -> Language {
        self.language
    }

    fn build(&self, source: &str) -> Result<Model, ModelError> {
        (self.build)(source)
    }
}

pub struct Model {
    language: Language,
    source: String,
    arena: Arena<Node>,
    root: NodeId,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("language", &self.language)
            .field("source_len", &self.source.len())
            .field("node_count", &self.arena.len())
            .finish()
    }
}

impl Model {
    pub(crate) fn from_parts(
        language: Language,
        source: String,
        arena: Arena<Node>,
        root: NodeId,
    ) -> Self {
        Self {
            language,
            source,
            arena,
            root,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Node {
        &self.arena[self.root]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.arena[id]
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() <= 1
    }

    pub fn text(&self, span: Span) -> Option<&str> {
        self.source.get(span.range())
    }

    pub fn parent(&self, node: &Node) -> Option<&Node> {
        node.parent.map(|p| &self.arena[p])
    }

    pub fn children<'a>(&'a self, node: &'a Node) -> impl Iterator<Item = &'a Node> + 'a {
        node.children.iter().map(move |&c| &self.arena[c])
    }

    pub fn children_of_kind<'a>(
        &'a self,
        node: &'a Node,
        kind: NodeKind,
    ) -> impl Iterator<Item = &'a Node> + 'a {
        self.children(node).filter(move |c| c.kind == kind)
    }

    /// The node itself followed by its ancestors up to the compilation unit.
    pub fn ancestors<'a>(&'a self, node: &'a Node) -> AncestorIter<'a> {
        AncestorIter {
            model: self,
            current: Some(node),
        }
    }

    /// Pre-order traversal of the whole tree, root first.
    pub fn walk(&self) -> PreOrderIter<'_> {
        PreOrderIter {
            model: self,
            stack: vec![self.root],
        }
    }

    pub fn containing_type<'a>(&'a self, node: &'a Node) -> Option<&'a Node> {
        self.ancestors(node).skip(1).find(|n| n.kind.is_type())
    }

    pub fn type_parameters<'a>(&'a self, node: &'a Node) -> impl Iterator<Item = &'a Node> + 'a {
        self.children_of_kind(node, NodeKind::TypeParameter)
    }

    pub fn has_attribute(&self, node: &Node, name: &str) -> bool {
        self.children_of_kind(node, NodeKind::Attribute)
            .any(|a| attribute_name_matches(a.name(), name))
    }

    /// Whether the declaration can be reached from outside its assembly or module.
    ///
    /// Every accessibility on the ancestor chain must be exposed, and protected
    /// members of sealed types are not reachable.
    pub fn is_externally_visible(&self, node: &Node) -> bool {
        for current in self.ancestors(node) {
            let Some(accessibility) = current.accessibility else {
                continue;
            };
            if !accessibility.is_exposed() {
                return false;
            }
            if matches!(
                accessibility,
                Accessibility::Protected | Accessibility::ProtectedInternal
            ) && self
                .containing_type(current)
                .is_some_and(|t| t.modifiers.is_sealed)
            {
                return false;
            }
        }
        true
    }

    /// Type references named `name` whose span lies within `within`.
    pub fn references_to<'a>(
        &'a self,
        name: &'a str,
        within: Span,
    ) -> impl Iterator<Item = &'a Node> + 'a {
        self.walk().filter(move |n| {
            n.kind == NodeKind::TypeReference && n.name() == name && within.contains(n.span)
        })
    }

    /// Whether a type parameter called `name`, declared on an ancestor of `node`
    /// strictly below `scope`, hides the declaration a rename targets.
    ///
    /// With `scope` set to `None` every ancestor up to the compilation unit counts.
    pub fn is_shadowed(&self, node: &Node, name: &str, scope: Option<&Node>) -> bool {
        self.ancestors(node)
            .skip(1)
            .take_while(|ancestor| scope.is_none_or(|s| s.id != ancestor.id))
            .any(|ancestor| self.type_parameters(ancestor).any(|p| p.name() == name))
    }
}

/// `Foo` matches `Foo` and `FooAttribute`.
fn attribute_name_matches(actual: &str, expected: &str) -> bool {
    let actual = actual.rsplit('.').next().unwrap_or(actual);
    let expected = expected.strip_suffix("Attribute").unwrap_or(expected);
    actual == expected || actual.strip_suffix("Attribute") == Some(expected)
}

pub struct AncestorIter<'a> {
    model: &'a Model,
    current: Option<&'a Node>,
}

impl<'a> Iterator for AncestorIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.current?;
        self.current = self.model.parent(node);
        Some(node)
    }
}

pub struct PreOrderIter<'a> {
    model: &'a Model,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = &self.model.arena[id];
        self.stack.extend(node.children.iter().rev().copied());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_model() -> Model {
        let source = "public sealed class Outer { protected void M(int x) {} }";
        let mut builder = ModelBuilder::new(Language::CSharp, source);
        let class_name = builder.find("Outer").unwrap();
        builder.open(
            Decl::new(NodeKind::Class, Span::new(0, source.len()))
                .named("Outer", class_name)
                .accessibility(Accessibility::Public, None)
                .sealed(),
        );
        let method_name = builder.find("M").unwrap();
        builder.open(
            Decl::new(NodeKind::Method, builder.find("protected void M(int x) {}").unwrap())
                .named("M", method_name)
                .accessibility(Accessibility::Protected, None),
        );
        let x = builder.find("x").unwrap();
        builder.leaf(
            Decl::new(NodeKind::Parameter, x)
                .named("x", x)
                .parameter_kind(ParameterKind::Value),
        );
        builder.close();
        builder.close();
        builder.finish().unwrap()
    }

    #[test]
    fn walk_is_pre_order() {
        let model = sample_model();
        let kinds: Vec<_> = model.walk().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::CompilationUnit,
                NodeKind::Class,
                NodeKind::Method,
                NodeKind::Parameter
            ]
        );
    }

    #[test]
    fn ancestors_start_with_node_itself() {
        let model = sample_model();
        let param = model.walk().find(|n| n.kind == NodeKind::Parameter).unwrap();
        let names: Vec<_> = model.ancestors(param).map(|n| n.kind).collect();
        assert_eq!(names.first(), Some(&NodeKind::Parameter));
        assert_eq!(names.last(), Some(&NodeKind::CompilationUnit));
    }

    #[test]
    fn protected_member_of_sealed_type_is_not_visible() {
        let model = sample_model();
        let method = model.walk().find(|n| n.kind == NodeKind::Method).unwrap();
        assert!(!model.is_externally_visible(method));
        let class = model.walk().find(|n| n.kind == NodeKind::Class).unwrap();
        assert!(model.is_externally_visible(class));
    }

    #[test]
    fn containing_type_skips_the_node_itself() {
        let model = sample_model();
        let class = model.walk().find(|n| n.kind == NodeKind::Class).unwrap();
        assert!(model.containing_type(class).is_none());
        let method = model.walk().find(|n| n.kind == NodeKind::Method).unwrap();
        assert_eq!(model.containing_type(method).map(|t| t.name()), Some("Outer"));
    }

    #[test]
    fn attribute_names_match_with_or_without_suffix() {
        assert!(attribute_name_matches("AttributeUsage", "AttributeUsage"));
        assert!(attribute_name_matches("AttributeUsageAttribute", "AttributeUsage"));
        assert!(attribute_name_matches("AttributeUsage", "AttributeUsageAttribute"));
        assert!(attribute_name_matches("System.AttributeUsage", "AttributeUsage"));
        assert!(!attribute_name_matches("Serializable", "AttributeUsage"));
    }
}
