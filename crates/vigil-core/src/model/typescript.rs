//! TypeScript front end
//!
//! Parses with SWC and lowers declarations into the language-neutral model.
//! Exported top-level declarations are public, everything else at module level
//! is internal; class members without a modifier are public.

use swc_common::sync::Lrc;
use swc_common::{FileName, SourceMap, Spanned};
use swc_ecma_ast as ast;
use swc_ecma_parser::{Syntax, TsSyntax, parse_file_as_module};
use swc_ecma_visit::{Visit, VisitWith};

use super::builder::find_word;
use super::{
    Accessibility, Decl, Language, Model, ModelBuilder, ModelError, Modifiers, ModelProvider,
    NodeKind, ParameterKind,
};
use crate::span::Span;

const ACCESSIBILITY_KEYWORDS: &[&str] = &["public", "protected", "private"];

#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptProvider {
    tsx: bool,
}

impl TypeScriptProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tsx() -> Self {
        Self { tsx: true }
    }

    fn syntax(&self) -> Syntax {
        Syntax::Typescript(TsSyntax {
            tsx: self.tsx,
            decorators: true,
            ..Default::default()
        })
    }
}

impl ModelProvider for TypeScriptProvider {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn build(&self, source: &str) -> Result<Model, ModelError> {
        let source_map: Lrc<SourceMap> = Default::default();
        let fm = source_map
            .new_source_file(FileName::Custom("input.ts".into()).into(), source.to_string());

        let mut recovered_errors = Vec::new();
        let result = parse_file_as_module(
            &fm,
            self.syntax(),
            ast::EsVersion::latest(),
            None,
            &mut recovered_errors,
        );

        let to_model_error = |e: swc_ecma_parser::error::Error| {
            let loc = source_map.lookup_char_pos(e.span().lo);
            ModelError::Parse {
                line: loc.line,
                column: loc.col_display,
                message: e.kind().msg().to_string(),
            }
        };

        let module = result.map_err(to_model_error)?;
        if let Some(error) = recovered_errors.into_iter().next() {
            return Err(to_model_error(error));
        }

        let mut lowering = Lowering {
            builder: ModelBuilder::new(Language::TypeScript, source),
            source,
            base: fm.start_pos.0,
            exported: false,
        };
        module.visit_with(&mut lowering);
        lowering.builder.finish()
    }
}

struct Lowering<'a> {
    builder: ModelBuilder,
    source: &'a str,
    base: u32,
    exported: bool,
}

impl Lowering<'_> {
    fn span(&self, span: swc_common::Span) -> Span {
        let lo = span.lo.0.saturating_sub(self.base) as usize;
        let hi = span.hi.0.saturating_sub(self.base) as usize;
        Span::from_range(lo..hi)
    }

    fn text(&self, span: Span) -> String {
        self.source.get(span.range()).unwrap_or_default().to_string()
    }

    fn module_accessibility(&mut self) -> Accessibility {
        if std::mem::take(&mut self.exported) {
            Accessibility::Public
        } else {
            Accessibility::Internal
        }
    }

    /// Locates the explicit accessibility keyword closest before `hi`, searching back
    /// to `lo` or the start of the line holding `hi`, whichever comes first.
    fn keyword_span(&self, lo: usize, hi: usize, keyword: &str) -> Option<Span> {
        let line_start = self.source.get(..hi)?.rfind('\n').map_or(0, |i| i + 1);
        let lo = lo.min(line_start);
        let region = self.source.get(lo..hi)?;
        find_word(region, keyword, 0)
            .last()
            .map(|s| Span::new(lo + s.start, s.len))
    }

    fn member_accessibility(
        &self,
        declared: Option<ast::Accessibility>,
        member: swc_common::Span,
        key: swc_common::Span,
    ) -> (Accessibility, Option<Span>) {
        let accessibility = match declared {
            Some(ast::Accessibility::Private) => Accessibility::Private,
            Some(ast::Accessibility::Protected) => Accessibility::Protected,
            Some(ast::Accessibility::Public) | None => Accessibility::Public,
        };
        let keyword = match declared {
            Some(ast::Accessibility::Private) => ACCESSIBILITY_KEYWORDS[2],
            Some(ast::Accessibility::Protected) => ACCESSIBILITY_KEYWORDS[1],
            Some(ast::Accessibility::Public) => ACCESSIBILITY_KEYWORDS[0],
            None => return (accessibility, None),
        };
        let lo = self.span(member).start;
        let hi = self.span(key).start;
        (accessibility, self.keyword_span(lo, hi, keyword))
    }

    fn heritage_names(&self, exprs: &[ast::TsExprWithTypeArgs]) -> Vec<(String, Span)> {
        exprs
            .iter()
            .filter_map(|e| self.expr_name(&e.expr))
            .collect()
    }

    fn expr_name(&self, expr: &ast::Expr) -> Option<(String, Span)> {
        match expr {
            ast::Expr::Ident(ident) => Some((ident.sym.to_string(), self.span(ident.span))),
            _ => None,
        }
    }

    fn reference(&mut self, name: String, span: Span) {
        self.builder
            .leaf(Decl::new(NodeKind::TypeReference, span).named(name, span));
    }

    fn type_annotation(&self, ann: Option<&ast::TsTypeAnn>) -> Option<String> {
        ann.map(|a| self.text(self.span(a.type_ann.span())))
    }

    fn lower_class(&mut self, ident: Option<&ast::Ident>, class: &ast::Class) {
        let accessibility = self.module_accessibility();
        let span = self.span(class.span);

        let mut heritage = Vec::new();
        if let Some(super_class) = &class.super_class {
            heritage.extend(self.expr_name(super_class));
        }
        heritage.extend(self.heritage_names(&class.implements));

        let mut decl = Decl::new(NodeKind::Class, span)
            .accessibility(accessibility, None)
            .modifiers(Modifiers {
                is_abstract: class.is_abstract,
                ..Default::default()
            });
        if let Some(ident) = ident {
            decl = decl.named(ident.sym.to_string(), self.span(ident.span));
        }
        for (name, _) in &heritage {
            decl = decl.base_type(name.clone());
        }

        self.builder.open(decl);
        for (name, span) in heritage {
            self.reference(name, span);
        }
        class.visit_children_with(self);
        self.builder.close();
    }

    fn lower_parameter(&mut self, pat: &ast::Pat, span: Span, decorators: &[ast::Decorator]) {
        let (kind, ident, type_ann) = match pat {
            ast::Pat::Ident(binding) => {
                let kind = if binding.id.optional {
                    ParameterKind::Optional
                } else {
                    ParameterKind::Value
                };
                (kind, Some(&binding.id), binding.type_ann.as_deref())
            }
            ast::Pat::Rest(rest) => {
                let ident = match &*rest.arg {
                    ast::Pat::Ident(binding) => Some(&binding.id),
                    _ => None,
                };
                (ParameterKind::Params, ident, rest.type_ann.as_deref())
            }
            ast::Pat::Assign(assign) => {
                let (ident, type_ann) = match &*assign.left {
                    ast::Pat::Ident(binding) => (Some(&binding.id), binding.type_ann.as_deref()),
                    _ => (None, None),
                };
                (ParameterKind::Optional, ident, type_ann)
            }
            _ => (ParameterKind::Value, None, None),
        };

        let mut decl = Decl::new(NodeKind::Parameter, span).parameter_kind(kind);
        if let Some(ident) = ident {
            decl = decl.named(ident.sym.to_string(), self.span(ident.span));
        }
        if let Some(type_name) = self.type_annotation(type_ann) {
            decl = decl.type_name(type_name);
        }

        self.builder.open(decl);
        for decorator in decorators {
            decorator.visit_with(self);
        }
        pat.visit_with(self);
        self.builder.close();
    }
}

impl Visit for Lowering<'_> {
    fn visit_export_decl(&mut self, node: &ast::ExportDecl) {
        self.exported = true;
        node.visit_children_with(self);
        self.exported = false;
    }

    fn visit_export_default_decl(&mut self, node: &ast::ExportDefaultDecl) {
        self.exported = true;
        node.visit_children_with(self);
        self.exported = false;
    }

    fn visit_class_decl(&mut self, node: &ast::ClassDecl) {
        self.lower_class(Some(&node.ident), &node.class);
    }

    fn visit_class_expr(&mut self, node: &ast::ClassExpr) {
        self.lower_class(node.ident.as_ref(), &node.class);
    }

    fn visit_ts_interface_decl(&mut self, node: &ast::TsInterfaceDecl) {
        let accessibility = self.module_accessibility();
        let heritage = self.heritage_names(&node.extends);

        let mut decl = Decl::new(NodeKind::Interface, self.span(node.span))
            .named(node.id.sym.to_string(), self.span(node.id.span))
            .accessibility(accessibility, None);
        for (name, _) in &heritage {
            decl = decl.base_type(name.clone());
        }

        self.builder.open(decl);
        for (name, span) in heritage {
            self.reference(name, span);
        }
        if let Some(type_params) = &node.type_params {
            type_params.visit_with(self);
        }
        node.body.visit_with(self);
        self.builder.close();
    }

    fn visit_ts_enum_decl(&mut self, node: &ast::TsEnumDecl) {
        let accessibility = self.module_accessibility();
        self.builder.open(
            Decl::new(NodeKind::Enum, self.span(node.span))
                .named(node.id.sym.to_string(), self.span(node.id.span))
                .accessibility(accessibility, None),
        );
        for member in &node.members {
            let name_span = self.span(member.id.span());
            self.builder.leaf(
                Decl::new(NodeKind::Field, self.span(member.span))
                    .named(self.text(name_span), name_span)
                    .accessibility(Accessibility::Public, None)
                    .static_(),
            );
        }
        self.builder.close();
    }

    fn visit_ts_module_decl(&mut self, node: &ast::TsModuleDecl) {
        let accessibility = self.module_accessibility();
        let name_span = self.span(node.id.span());
        self.builder.open(
            Decl::new(NodeKind::Namespace, self.span(node.span))
                .named(self.text(name_span), name_span)
                .accessibility(accessibility, None),
        );
        node.visit_children_with(self);
        self.builder.close();
    }

    fn visit_fn_decl(&mut self, node: &ast::FnDecl) {
        let accessibility = self.module_accessibility();
        self.builder.open(
            Decl::new(NodeKind::Method, self.span(node.function.span))
                .named(node.ident.sym.to_string(), self.span(node.ident.span))
                .accessibility(accessibility, None)
                .static_(),
        );
        node.function.visit_with(self);
        self.builder.close();
    }

    fn visit_fn_expr(&mut self, node: &ast::FnExpr) {
        let mut decl = Decl::new(NodeKind::Method, self.span(node.function.span))
            .accessibility(Accessibility::Private, None);
        if let Some(ident) = &node.ident {
            decl = decl.named(ident.sym.to_string(), self.span(ident.span));
        }
        self.builder.open(decl);
        node.function.visit_with(self);
        self.builder.close();
    }

    fn visit_class_method(&mut self, node: &ast::ClassMethod) {
        let key_span = node.key.span();
        let (accessibility, keyword) =
            self.member_accessibility(node.accessibility, node.span, key_span);
        let kind = match node.kind {
            ast::MethodKind::Method => NodeKind::Method,
            ast::MethodKind::Getter | ast::MethodKind::Setter => NodeKind::Property,
        };
        let name_span = self.span(key_span);

        self.builder.open(
            Decl::new(kind, self.span(node.span))
                .named(self.text(name_span), name_span)
                .accessibility(accessibility, keyword)
                .modifiers(Modifiers {
                    is_static: node.is_static,
                    is_abstract: node.is_abstract,
                    ..Default::default()
                }),
        );
        node.function.visit_with(self);
        self.builder.close();
    }

    fn visit_private_method(&mut self, node: &ast::PrivateMethod) {
        let name_span = self.span(node.key.span);
        self.builder.open(
            Decl::new(NodeKind::Method, self.span(node.span))
                .named(self.text(name_span), name_span)
                .accessibility(Accessibility::Private, None)
                .modifiers(Modifiers {
                    is_static: node.is_static,
                    ..Default::default()
                }),
        );
        node.function.visit_with(self);
        self.builder.close();
    }

    fn visit_constructor(&mut self, node: &ast::Constructor) {
        let key_span = node.key.span();
        let (accessibility, keyword) =
            self.member_accessibility(node.accessibility, node.span, key_span);

        self.builder.open(
            Decl::new(NodeKind::Constructor, self.span(node.span))
                .named("constructor", self.span(key_span))
                .accessibility(accessibility, keyword),
        );
        node.visit_children_with(self);
        self.builder.close();
    }

    fn visit_class_prop(&mut self, node: &ast::ClassProp) {
        let key_span = node.key.span();
        let (accessibility, keyword) =
            self.member_accessibility(node.accessibility, node.span, key_span);
        let name_span = self.span(key_span);

        let mut decl = Decl::new(NodeKind::Field, self.span(node.span))
            .named(self.text(name_span), name_span)
            .accessibility(accessibility, keyword)
            .modifiers(Modifiers {
                is_static: node.is_static,
                is_abstract: node.is_abstract,
                ..Default::default()
            });
        if let Some(type_name) = self.type_annotation(node.type_ann.as_deref()) {
            decl = decl.type_name(type_name);
        }

        self.builder.open(decl);
        node.visit_children_with(self);
        self.builder.close();
    }

    fn visit_private_prop(&mut self, node: &ast::PrivateProp) {
        let name_span = self.span(node.key.span);
        self.builder.open(
            Decl::new(NodeKind::Field, self.span(node.span))
                .named(self.text(name_span), name_span)
                .accessibility(Accessibility::Private, None)
                .modifiers(Modifiers {
                    is_static: node.is_static,
                    ..Default::default()
                }),
        );
        node.visit_children_with(self);
        self.builder.close();
    }

    fn visit_ts_property_signature(&mut self, node: &ast::TsPropertySignature) {
        let name_span = self.span(node.key.span());
        let mut decl = Decl::new(NodeKind::Property, self.span(node.span))
            .named(self.text(name_span), name_span)
            .accessibility(Accessibility::Public, None);
        if let Some(type_name) = self.type_annotation(node.type_ann.as_deref()) {
            decl = decl.type_name(type_name);
        }
        self.builder.open(decl);
        node.visit_children_with(self);
        self.builder.close();
    }

    fn visit_ts_method_signature(&mut self, node: &ast::TsMethodSignature) {
        let name_span = self.span(node.key.span());
        self.builder.open(
            Decl::new(NodeKind::Method, self.span(node.span))
                .named(self.text(name_span), name_span)
                .accessibility(Accessibility::Public, None)
                .abstract_(),
        );
        if let Some(type_params) = &node.type_params {
            type_params.visit_with(self);
        }
        for param in &node.params {
            let span = self.span(param.span());
            match param {
                ast::TsFnParam::Ident(binding) => {
                    self.lower_parameter(&ast::Pat::Ident(binding.clone()), span, &[])
                }
                ast::TsFnParam::Rest(rest) => {
                    self.lower_parameter(&ast::Pat::Rest(rest.clone()), span, &[])
                }
                ast::TsFnParam::Array(_) | ast::TsFnParam::Object(_) => {
                    self.builder.open(
                        Decl::new(NodeKind::Parameter, span).parameter_kind(ParameterKind::Value),
                    );
                    param.visit_children_with(self);
                    self.builder.close();
                }
            }
        }
        if let Some(type_ann) = &node.type_ann {
            type_ann.visit_with(self);
        }
        self.builder.close();
    }

    fn visit_param(&mut self, node: &ast::Param) {
        let span = self.span(node.span);
        self.lower_parameter(&node.pat, span, &node.decorators);
    }

    fn visit_ts_param_prop(&mut self, node: &ast::TsParamProp) {
        let span = self.span(node.span);
        match &node.param {
            ast::TsParamPropParam::Ident(binding) => {
                self.lower_parameter(&ast::Pat::Ident(binding.clone()), span, &node.decorators)
            }
            ast::TsParamPropParam::Assign(assign) => {
                self.lower_parameter(&ast::Pat::Assign(assign.clone()), span, &node.decorators)
            }
        }
    }

    fn visit_ts_type_param(&mut self, node: &ast::TsTypeParam) {
        self.builder.open(
            Decl::new(NodeKind::TypeParameter, self.span(node.span))
                .named(node.name.sym.to_string(), self.span(node.name.span)),
        );
        node.visit_children_with(self);
        self.builder.close();
    }

    fn visit_ts_type_ref(&mut self, node: &ast::TsTypeRef) {
        if let ast::TsEntityName::Ident(ident) = &node.type_name {
            self.reference(ident.sym.to_string(), self.span(ident.span));
        }
        if let Some(type_params) = &node.type_params {
            type_params.visit_with(self);
        }
    }

    fn visit_decorator(&mut self, node: &ast::Decorator) {
        let callee = match &*node.expr {
            ast::Expr::Call(call) => match &call.callee {
                ast::Callee::Expr(expr) => Some(&**expr),
                _ => None,
            },
            expr => Some(expr),
        };
        let name_span = callee.map(|e| self.span(e.span()));
        let mut decl = Decl::new(NodeKind::Attribute, self.span(node.span));
        if let Some(name_span) = name_span {
            decl = decl.named(self.text(name_span), name_span);
        }
        self.builder.leaf(decl);
    }
}
