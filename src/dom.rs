//! HTML parser – turns note markup into a small DOM tree.
//!
//! Notes come from a rich-text editor, so the markup is well-formed in the
//! common case but not guaranteed to be. html5ever builds the tree with the
//! browser error-recovery rules; this module only keeps what content
//! extraction needs from it.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{parse_document, ParseOpts};
use markup5ever::{Attribute, ExpandedName, LocalName, Namespace, QualName};

/// The tag name of an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Img,
    Body,
    Html,
    Head,
    /// Any other element, lower-cased.
    Other(String),
}

impl Tag {
    pub fn from_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "img" => Tag::Img,
            "body" => Tag::Body,
            "html" => Tag::Html,
            "head" => Tag::Head,
            _ => Tag::Other(name),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Tag::Img => "img",
            Tag::Body => "body",
            Tag::Html => "html",
            Tag::Head => "head",
            Tag::Other(name) => name,
        }
    }
}

/// A node in the DOM tree.
#[derive(Debug, Clone, PartialEq)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

impl DomNode {
    /// Concatenated text of this node and all of its descendants, in
    /// document order, with no separators inserted.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            DomNode::Text(text) => out.push_str(text),
            DomNode::Element(elem) => {
                for child in &elem.children {
                    child.collect_text(out);
                }
            }
        }
    }
}

/// An element node carrying tag, attributes, and children.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    pub fn src(&self) -> Option<&str> {
        self.attr("src")
    }

    pub fn alt(&self) -> Option<&str> {
        self.attr("alt")
    }

    /// Every `<img>` strictly below this element, depth-first in document
    /// order.
    pub fn descendant_images(&self) -> Vec<&ElementNode> {
        let mut found = Vec::new();
        collect_images(&self.children, &mut found);
        found
    }
}

fn collect_images<'a>(nodes: &'a [DomNode], found: &mut Vec<&'a ElementNode>) {
    for node in nodes {
        if let DomNode::Element(elem) = node {
            if elem.tag == Tag::Img {
                found.push(elem);
            }
            collect_images(&elem.children, found);
        }
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse note markup as an HTML document and return its top-level nodes.
///
/// Tree construction follows the HTML5 algorithm, so implied end tags
/// (`<p>`, `<li>`, ...) and the full named-entity table behave the way an
/// editor's own renderer sees them. Comments, doctype and processing
/// instructions are dropped; `<template>` contents are not part of the tree.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    let document = parse_document(NoteSink::default(), ParseOpts::default())
        .one(StrTendril::from(html));
    convert_children(&document)
}

type NodeRef = Rc<SinkNode>;

/// Tree node built by [`NoteSink`] while html5ever runs.
struct SinkNode {
    data: SinkData,
    parent: RefCell<Option<Weak<SinkNode>>>,
    children: RefCell<Vec<NodeRef>>,
}

enum SinkData {
    Document,
    Element {
        name: QualName,
        attrs: RefCell<Vec<Attribute>>,
        template_contents: Option<NodeRef>,
    },
    Text(RefCell<String>),
    Comment,
}

impl SinkNode {
    fn new(data: SinkData) -> NodeRef {
        Rc::new(SinkNode {
            data,
            parent: RefCell::new(None),
            children: RefCell::new(Vec::new()),
        })
    }

    fn parent(&self) -> Option<NodeRef> {
        self.parent.borrow().as_ref().and_then(Weak::upgrade)
    }
}

/// html5ever tree sink producing [`SinkNode`]s.
struct NoteSink {
    document: NodeRef,
    /// Returned by `elem_name` for non-element handles, which the tree
    /// builder never asks about.
    unnamed: QualName,
}

impl Default for NoteSink {
    fn default() -> Self {
        Self {
            document: SinkNode::new(SinkData::Document),
            unnamed: QualName::new(None, Namespace::from(""), LocalName::from("")),
        }
    }
}

fn append_node(parent: &NodeRef, child: NodeRef) {
    *child.parent.borrow_mut() = Some(Rc::downgrade(parent));
    parent.children.borrow_mut().push(child);
}

fn detach(target: &NodeRef) {
    if let Some(parent) = target.parent.borrow_mut().take().and_then(|w| w.upgrade()) {
        parent.children.borrow_mut().retain(|c| !Rc::ptr_eq(c, target));
    }
}

/// Append `text` to `node` if it is a text node.
fn merge_text(node: Option<&NodeRef>, text: &str) -> bool {
    match node.map(|n| &n.data) {
        Some(SinkData::Text(existing)) => {
            existing.borrow_mut().push_str(text);
            true
        }
        _ => false,
    }
}

impl TreeSink for NoteSink {
    type Handle = NodeRef;
    type Output = NodeRef;
    type ElemName<'a> = ExpandedName<'a>;

    fn finish(self) -> Self::Output {
        self.document
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        log::trace!("HTML parse error: {msg}");
    }

    fn get_document(&self) -> Self::Handle {
        self.document.clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> ExpandedName<'a> {
        match &target.data {
            SinkData::Element { name, .. } => name.expanded(),
            _ => self.unnamed.expanded(),
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        flags: ElementFlags,
    ) -> Self::Handle {
        SinkNode::new(SinkData::Element {
            name,
            attrs: RefCell::new(attrs),
            template_contents: flags.template.then(|| SinkNode::new(SinkData::Document)),
        })
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        SinkNode::new(SinkData::Comment)
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        SinkNode::new(SinkData::Comment)
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        match child {
            NodeOrText::AppendNode(node) => append_node(parent, node),
            NodeOrText::AppendText(text) => {
                if !merge_text(parent.children.borrow().last(), &text) {
                    append_node(parent, SinkNode::new(SinkData::Text(RefCell::new(text.to_string()))));
                }
            }
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if element.parent().is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        match &target.data {
            SinkData::Element {
                template_contents: Some(contents),
                ..
            } => contents.clone(),
            _ => target.clone(),
        }
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let Some(parent) = sibling.parent() else {
            return;
        };
        let Some(index) = parent
            .children
            .borrow()
            .iter()
            .position(|c| Rc::ptr_eq(c, sibling))
        else {
            return;
        };

        let node = match new_node {
            NodeOrText::AppendText(text) => {
                let children = parent.children.borrow();
                let previous = index.checked_sub(1).and_then(|i| children.get(i));
                if merge_text(previous, &text) {
                    return;
                }
                SinkNode::new(SinkData::Text(RefCell::new(text.to_string())))
            }
            NodeOrText::AppendNode(node) => {
                detach(&node);
                node
            }
        };
        // Detaching may have shifted the sibling.
        let index = parent
            .children
            .borrow()
            .iter()
            .position(|c| Rc::ptr_eq(c, sibling))
            .unwrap_or(index);
        *node.parent.borrow_mut() = Some(Rc::downgrade(&parent));
        parent.children.borrow_mut().insert(index, node);
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let SinkData::Element { attrs: existing, .. } = &target.data else {
            return;
        };
        let mut existing = existing.borrow_mut();
        for attr in attrs {
            if !existing.iter().any(|e| e.name == attr.name) {
                existing.push(attr);
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        detach(target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let children = std::mem::take(&mut *node.children.borrow_mut());
        for child in children {
            append_node(new_parent, child);
        }
    }
}

fn convert_children(node: &NodeRef) -> Vec<DomNode> {
    node.children.borrow().iter().filter_map(convert).collect()
}

fn convert(node: &NodeRef) -> Option<DomNode> {
    match &node.data {
        SinkData::Text(text) => Some(DomNode::Text(text.borrow().clone())),
        SinkData::Element { name, attrs, .. } => {
            let mut elem = ElementNode::new(Tag::from_name(&name.local));
            for attr in attrs.borrow().iter() {
                elem.attributes
                    .entry(attr.name.local.to_string())
                    .or_insert_with(|| attr.value.to_string());
            }
            elem.children = convert_children(node);
            Some(DomNode::Element(elem))
        }
        SinkData::Document | SinkData::Comment => None,
    }
}

/// Return the children of `<body>` if the markup is a full document, or the
/// nodes unchanged for a fragment.
pub fn body_children(nodes: &[DomNode]) -> Vec<DomNode> {
    for node in nodes {
        if let DomNode::Element(e) = node {
            if e.tag == Tag::Body {
                return e.children.clone();
            }
            if e.tag == Tag::Html {
                if let Some(body) = e.children.iter().find(
                    |c| matches!(c, DomNode::Element(inner) if inner.tag == Tag::Body),
                ) {
                    return body_children(std::slice::from_ref(body));
                }
                return e
                    .children
                    .iter()
                    .filter(|c| !matches!(c, DomNode::Element(inner) if inner.tag == Tag::Head))
                    .cloned()
                    .collect();
            }
        }
    }
    nodes.to_vec()
}
