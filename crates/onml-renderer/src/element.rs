//! Declarative element trees.
//!
//! A fresh tree is built for every render pass and handed to the renderer,
//! which never mutates it. Host elements carry a kind string and props;
//! components are plain functions from props to another node and own no
//! host instance of their own.

use serde_json::Value;
use smartstring::alias::String as SmartString;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Props other than `children`
pub type Attributes = BTreeMap<SmartString, Value>;

/// A function component
#[derive(Clone)]
pub struct Component {
    name: SmartString,
    render: Rc<dyn Fn(&Props) -> Node>,
}

impl Component {
    pub fn new(name: impl Into<SmartString>, render: impl Fn(&Props) -> Node + 'static) -> Self {
        Self {
            name: name.into(),
            render: Rc::new(render),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render(&self, props: &Props) -> Node {
        (self.render)(props)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone)]
pub enum ElementKind {
    Host(SmartString),
    Component(Component),
}

/// Value of `props.children`
#[derive(Debug, Clone, Default)]
pub enum Children {
    #[default]
    None,
    /// Plain string or number content
    Text(SmartString),
    Nodes(Vec<Node>),
}

#[derive(Debug, Clone, Default)]
pub struct Props {
    attributes: Attributes,
    children: Children,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn set(&mut self, key: impl Into<SmartString>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// The `prop` attribute, `null` when absent
    pub fn prop(&self) -> &Value {
        self.get("prop").unwrap_or(&Value::Null)
    }

    pub fn is_hidden(&self) -> bool {
        self.get("hidden").is_some_and(is_truthy)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    pub fn set_children(&mut self, children: Children) {
        self.children = children;
    }
}

/// JavaScript-style truthiness of a JSON value
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    pub kind: ElementKind,
    pub props: Props,
}

impl Element {
    /// Host element of the given kind
    pub fn new(kind: impl Into<SmartString>) -> Self {
        Self {
            kind: ElementKind::Host(kind.into()),
            props: Props::new(),
        }
    }

    pub fn component(component: Component) -> Self {
        Self {
            kind: ElementKind::Component(component),
            props: Props::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<SmartString>, value: impl Into<Value>) -> Self {
        self.props.set(key, value);
        self
    }

    /// Shorthand for the `prop` attribute
    pub fn prop(self, value: impl Into<Value>) -> Self {
        self.attr("prop", value)
    }

    /// Set string or number content, replacing any children
    pub fn text(mut self, text: impl fmt::Display) -> Self {
        self.props.children = Children::Text(SmartString::from(text.to_string()));
        self
    }

    /// Append a child node. Existing text content becomes the first child.
    pub fn child(mut self, child: impl Into<Node>) -> Self {
        let child = child.into();
        self.props.children = match std::mem::take(&mut self.props.children) {
            Children::None => Children::Nodes(vec![child]),
            Children::Text(text) => Children::Nodes(vec![Node::Text(text), child]),
            Children::Nodes(mut nodes) => {
                nodes.push(child);
                Children::Nodes(nodes)
            }
        };
        self
    }

    pub fn children<I, N>(self, children: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        children.into_iter().fold(self, |el, child| el.child(child))
    }
}

/// A declarative node as passed to `render`
#[derive(Debug, Clone, Default)]
pub enum Node {
    #[default]
    Empty,
    Text(SmartString),
    Element(Element),
    Fragment(Vec<Node>),
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.into())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Text(text.into())
    }
}

impl From<i64> for Node {
    fn from(number: i64) -> Self {
        Node::Text(SmartString::from(number.to_string()))
    }
}

impl From<f64> for Node {
    fn from(number: f64) -> Self {
        Node::Text(SmartString::from(number.to_string()))
    }
}

impl From<Vec<Node>> for Node {
    fn from(nodes: Vec<Node>) -> Self {
        Node::Fragment(nodes)
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(node: Option<T>) -> Self {
        node.map_or(Node::Empty, Into::into)
    }
}

/// A node reduced to something the host tree can hold
#[derive(Debug, Clone)]
pub enum ResolvedNode {
    Host { kind: SmartString, props: Props },
    Text(SmartString),
}

impl Node {
    /// Flatten fragments, drop empty nodes and expand components until only
    /// host elements and text remain, in declaration order.
    pub fn resolve(&self) -> Vec<ResolvedNode> {
        let mut out = Vec::new();
        self.resolve_into(&mut out);
        out
    }

    fn resolve_into(&self, out: &mut Vec<ResolvedNode>) {
        match self {
            Node::Empty => {}
            Node::Text(text) => out.push(ResolvedNode::Text(text.clone())),
            Node::Fragment(nodes) => {
                for node in nodes {
                    node.resolve_into(out);
                }
            }
            Node::Element(element) => match &element.kind {
                ElementKind::Host(kind) => out.push(ResolvedNode::Host {
                    kind: kind.clone(),
                    props: element.props.clone(),
                }),
                ElementKind::Component(component) => {
                    component.render(&element.props).resolve_into(out)
                }
            },
        }
    }
}

impl Children {
    /// Host-level child list. Text content becomes a single text child.
    pub fn resolve(&self) -> Vec<ResolvedNode> {
        match self {
            Children::None => Vec::new(),
            Children::Text(text) => vec![ResolvedNode::Text(text.clone())],
            Children::Nodes(nodes) => {
                let mut out = Vec::new();
                for node in nodes {
                    node.resolve_into(&mut out);
                }
                out
            }
        }
    }
}
