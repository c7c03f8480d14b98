//! Render dispatch
//!
//! The renderer walks the head first, handing each node to its head
//! component, then renders the resolved body depth-first. Unknown tags are
//! reported and skipped so the rest of the document still renders.

use mailforge_dom::{AttributeResolver, Attributes, ElementNode, RenderContext, ResolvedNode};

use crate::component::{BodyComponent, Component, Registry};
use crate::{CompileError, Diagnostic, GlobalData, HeadValue, Target};

/// Drives head handling and body rendering for one compile
pub struct Renderer<'r> {
    registry: &'r Registry,
    global: GlobalData,
    diagnostics: Vec<Diagnostic>,
}

impl<'r> Renderer<'r> {
    pub fn new(registry: &'r Registry, global: GlobalData) -> Self {
        Self {
            registry,
            global,
            diagnostics: Vec::new(),
        }
    }

    pub fn global(&self) -> &GlobalData {
        &self.global
    }

    pub fn global_mut(&mut self) -> &mut GlobalData {
        &mut self.global
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_parts(self) -> (GlobalData, Vec<Diagnostic>) {
        (self.global, self.diagnostics)
    }

    /// Apply one head node. Body components found in the head render into
    /// the raw head fragments.
    pub fn handle_head(&mut self, node: &ElementNode) -> Result<(), CompileError> {
        match self.registry.get(&node.tag_name) {
            Some(Component::Head(component)) => {
                let component = component.clone();
                component.handle(node, self)
            }
            Some(Component::Body(_)) => {
                let resolved = AttributeResolver::new(self.global.tables()).resolve(node);
                let html = self.render(&resolved, &RenderContext::new())?;
                if !html.trim().is_empty() {
                    self.global.add("head_raw", HeadValue::Text(html))?;
                }
                Ok(())
            }
            None => {
                self.unknown(&node.tag_name, node.line);
                Ok(())
            }
        }
    }

    /// Render one resolved node. Unknown tags render nothing.
    pub fn render(&mut self, node: &ResolvedNode, context: &RenderContext) -> Result<String, CompileError> {
        let component = match self.registry.get(&node.tag_name) {
            Some(Component::Body(component)) => component.clone(),
            Some(Component::Head(_)) => {
                tracing::warn!("<{}> is a head element, skipped in body", node.tag_name);
                self.report(Diagnostic::new(
                    &node.tag_name,
                    node.line,
                    format!("{} can only be used inside mj-head", node.tag_name),
                ));
                return Ok(String::new());
            }
            None => {
                self.unknown(&node.tag_name, node.line);
                return Ok(String::new());
            }
        };

        if !self.global.styles().has_head_style(component.tag_name()) {
            if let Some(style) = component.head_style(&self.global) {
                self.global.add_head_style(component.tag_name(), style);
            }
        }

        let attributes = merged_attributes(component.as_ref(), node, context);
        let mut element = Element {
            node,
            component: component.as_ref(),
            attributes,
            context: context.clone(),
            renderer: self,
        };
        component.render(&mut element)
    }

    /// Merged attributes `node` renders with under `context`
    pub fn attributes_for(&self, node: &ResolvedNode, context: &RenderContext) -> Attributes {
        match self.registry.get(&node.tag_name) {
            Some(Component::Body(component)) => merged_attributes(component.as_ref(), node, context),
            _ => node.attributes.clone(),
        }
    }

    /// True for registered raw components, which parents do not wrap
    pub fn is_raw(&self, tag_name: &str) -> bool {
        matches!(self.registry.get(tag_name), Some(Component::Body(c)) if c.is_raw())
    }

    fn unknown(&mut self, tag_name: &str, line: Option<usize>) {
        tracing::warn!("Unknown element <{}>", tag_name);
        self.report(Diagnostic::unknown_element(tag_name, line));
    }
}

/// Component defaults, then `mj-all`, then attributes passed by the parent,
/// then the resolved attributes of the node
fn merged_attributes(component: &dyn BodyComponent, node: &ResolvedNode, context: &RenderContext) -> Attributes {
    let mut attributes: Attributes = component
        .default_attributes()
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    attributes.extend(node.global_attributes.clone());
    attributes.extend(context.inherited_attributes().clone());
    attributes.extend(node.attributes.clone());
    attributes
}

/// A body node being rendered, with its merged attributes
pub struct Element<'a, 'r> {
    node: &'a ResolvedNode,
    component: &'a dyn BodyComponent,
    attributes: Attributes,
    context: RenderContext,
    renderer: &'a mut Renderer<'r>,
}

impl<'a, 'r> Element<'a, 'r> {
    pub fn tag_name(&self) -> &str {
        &self.node.tag_name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Attribute value, treating an empty string as unset
    pub fn non_empty_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|v| !v.is_empty())
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Whether the author set `name` on the element itself
    pub fn is_explicit(&self, name: &str) -> bool {
        self.node.is_explicit(name)
    }

    /// Verbatim inner markup, trimmed
    pub fn content(&self) -> &str {
        self.node.content_or_empty().trim()
    }

    pub fn children(&self) -> &'a [ResolvedNode] {
        &self.node.children
    }

    pub fn line(&self) -> Option<usize> {
        self.node.line
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// The context this element hands to its children
    pub fn child_context(&self) -> RenderContext {
        self.component.child_context(self)
    }

    pub fn global(&self) -> &GlobalData {
        &self.renderer.global
    }

    pub fn global_mut(&mut self) -> &mut GlobalData {
        &mut self.renderer.global
    }

    pub fn target(&self) -> Target {
        self.renderer.global.target()
    }

    pub fn is_raw(&self, child: &ResolvedNode) -> bool {
        self.renderer.is_raw(&child.tag_name)
    }

    /// Attributes `child` will render with under `context`
    pub fn child_attributes(&self, child: &ResolvedNode, context: &RenderContext) -> Attributes {
        self.renderer.attributes_for(child, context)
    }

    /// Children that are not raw passthrough
    pub fn non_raw_children(&self) -> Vec<&'a ResolvedNode> {
        self.children().iter().filter(|c| !self.is_raw(c)).collect()
    }

    pub fn render_child(&mut self, child: &ResolvedNode, context: &RenderContext) -> Result<String, CompileError> {
        self.renderer.render(child, context)
    }

    /// Render every child with the child context, concatenated
    pub fn render_children(&mut self) -> Result<String, CompileError> {
        let context = self.child_context();
        let mut out = String::new();
        for child in self.children() {
            out.push_str(&self.render_child(child, &context)?);
        }
        Ok(out)
    }

    /// Render every child, handing `attributes` to each
    pub fn render_children_with(&mut self, attributes: Attributes) -> Result<String, CompileError> {
        let context = self.child_context().with_inherited_attributes(attributes);
        let mut out = String::new();
        for child in self.children() {
            out.push_str(&self.render_child(child, &context)?);
        }
        Ok(out)
    }

    pub fn report(&mut self, message: impl Into<String>) {
        let diagnostic = Diagnostic::new(self.node.tag_name.clone(), self.node.line, message);
        self.renderer.report(diagnostic);
    }
}
