//! Node kinds of the linked program graph.
//!
//! Nodes live in an arena owned by [`crate::Program`] and point at each other
//! through [`NodeId`]s. A node *owns* the ids returned by
//! [`NodeKind::children`]; every other id it holds (reference targets,
//! superclasses, instantiated classes) is a link to a node owned elsewhere.

use super::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Node { kind, span: None }
    }

    pub fn with_span(kind: NodeKind, span: Span) -> Self {
        Node {
            kind,
            span: Some(span),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum NodeKind {
    Root(Root),
    Package(Package),
    Import(Import),
    Entry(Entry),
    Body(Body),
    Module(Module),
    Method(Method),
    Parameter(Parameter),
    Field(Field),
    Variable(Variable),
    Send(MessageSend),
    Assignment(Assignment),
    Return(Return),
    If(If),
    Reference(Reference),
    SelfRef,
    Super(SuperCall),
    Literal(Literal),
    New(New),
    Throw(Throw),
    Try(Try),
    Catch(Catch),
    NamedArgument(NamedArgument),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Root {
    pub members: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(default)]
    pub imports: Vec<NodeId>,
    pub members: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    pub entity: String,
    #[serde(default)]
    pub generic: bool,
}

/// A named runnable block (`program main { ... }`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub body: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub sentences: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleKind {
    Class,
    Singleton,
    Mixin,
}

/// A class, singleton object or mixin: the unit of method ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub module_kind: ModuleKind,
    /// `None` for object literals and closures.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub superclass: Option<NodeId>,
    #[serde(default)]
    pub mixins: Vec<NodeId>,
    pub members: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub parameters: Vec<NodeId>,
    #[serde(default)]
    pub body: Option<NodeId>,
    #[serde(default)]
    pub native: bool,
    /// Fully-qualified name of the module this method is declared to return.
    #[serde(default)]
    pub return_type: Option<String>,
}

impl Method {
    /// Neither a body nor a native implementation.
    pub fn is_abstract(&self) -> bool {
        self.body.is_none() && !self.native
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub vararg: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub value: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub value: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSend {
    pub receiver: NodeId,
    pub message: String,
    #[serde(default)]
    pub args: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// A `Reference` to the assigned declaration.
    pub variable: NodeId,
    pub value: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Return {
    #[serde(default)]
    pub value: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct If {
    pub condition: NodeId,
    pub then_body: NodeId,
    pub else_body: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    /// Declaration this reference was resolved to by the linker.
    pub target: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuperCall {
    #[serde(default)]
    pub args: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub value: LiteralValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
    /// `[a, b]` / `#{a, b}`: `module` is the collection class being built.
    Collection { module: NodeId, elements: Vec<NodeId> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct New {
    pub instantiated: NodeId,
    #[serde(default)]
    pub args: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Throw {
    pub exception: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Try {
    pub body: NodeId,
    #[serde(default)]
    pub catches: Vec<NodeId>,
    #[serde(default)]
    pub always: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catch {
    pub parameter: NodeId,
    #[serde(default)]
    pub parameter_type: Option<NodeId>,
    pub body: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedArgument {
    pub name: String,
    pub value: NodeId,
}

impl NodeKind {
    /// Ids owned by this node, in source order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Root(root) => root.members.clone(),
            NodeKind::Package(p) => p.imports.iter().chain(&p.members).copied().collect(),
            NodeKind::Import(_) | NodeKind::Reference(_) | NodeKind::SelfRef => vec![],
            NodeKind::Entry(e) => vec![e.body],
            NodeKind::Body(b) => b.sentences.clone(),
            NodeKind::Module(m) => m.members.clone(),
            NodeKind::Method(m) => m.parameters.iter().copied().chain(m.body).collect(),
            NodeKind::Parameter(_) => vec![],
            NodeKind::Field(f) => f.value.into_iter().collect(),
            NodeKind::Variable(v) => v.value.into_iter().collect(),
            NodeKind::Send(s) => std::iter::once(s.receiver).chain(s.args.iter().copied()).collect(),
            NodeKind::Assignment(a) => vec![a.variable, a.value],
            NodeKind::Return(r) => r.value.into_iter().collect(),
            NodeKind::If(i) => vec![i.condition, i.then_body, i.else_body],
            NodeKind::Super(s) => s.args.clone(),
            NodeKind::Literal(l) => match &l.value {
                LiteralValue::Collection { elements, .. } => elements.clone(),
                _ => vec![],
            },
            NodeKind::New(n) => n.args.clone(),
            NodeKind::Throw(t) => vec![t.exception],
            NodeKind::Try(t) => std::iter::once(t.body)
                .chain(t.catches.iter().copied())
                .chain(t.always)
                .collect(),
            NodeKind::Catch(c) => vec![c.parameter, c.body],
            NodeKind::NamedArgument(n) => vec![n.value],
        }
    }

    /// Ids this node points at without owning them.
    pub fn links(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Reference(r) => vec![r.target],
            NodeKind::Module(m) => m.superclass.into_iter().chain(m.mixins.iter().copied()).collect(),
            NodeKind::Literal(Literal {
                value: LiteralValue::Collection { module, .. },
            }) => vec![*module],
            NodeKind::New(n) => vec![n.instantiated],
            NodeKind::Catch(c) => c.parameter_type.into_iter().collect(),
            _ => vec![],
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeKind::Root(_) => "Root",
            NodeKind::Package(_) => "Package",
            NodeKind::Import(_) => "Import",
            NodeKind::Entry(_) => "Entry",
            NodeKind::Body(_) => "Body",
            NodeKind::Module(m) => match m.module_kind {
                ModuleKind::Class => "Class",
                ModuleKind::Singleton => "Singleton",
                ModuleKind::Mixin => "Mixin",
            },
            NodeKind::Method(_) => "Method",
            NodeKind::Parameter(_) => "Parameter",
            NodeKind::Field(_) => "Field",
            NodeKind::Variable(_) => "Variable",
            NodeKind::Send(_) => "Send",
            NodeKind::Assignment(_) => "Assignment",
            NodeKind::Return(_) => "Return",
            NodeKind::If(_) => "If",
            NodeKind::Reference(_) => "Reference",
            NodeKind::SelfRef => "Self",
            NodeKind::Super(_) => "Super",
            NodeKind::Literal(_) => "Literal",
            NodeKind::New(_) => "New",
            NodeKind::Throw(_) => "Throw",
            NodeKind::Try(_) => "Try",
            NodeKind::Catch(_) => "Catch",
            NodeKind::NamedArgument(_) => "NamedArgument",
        }
    }

    /// The user-facing name a node declares or mentions, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            NodeKind::Package(p) => Some(&p.name),
            NodeKind::Entry(e) => Some(&e.name),
            NodeKind::Module(m) => m.name.as_deref(),
            NodeKind::Method(m) => Some(&m.name),
            NodeKind::Parameter(p) => Some(&p.name),
            NodeKind::Field(f) => Some(&f.name),
            NodeKind::Variable(v) => Some(&v.name),
            NodeKind::Send(s) => Some(&s.message),
            NodeKind::Reference(r) => Some(&r.name),
            NodeKind::NamedArgument(n) => Some(&n.name),
            _ => None,
        }
    }

    pub fn as_module(&self) -> Option<&Module> {
        match self {
            NodeKind::Module(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&Method> {
        match self {
            NodeKind::Method(m) => Some(m),
            _ => None,
        }
    }

    /// Packages, entries and modules: the nodes that take part in qualified names.
    pub fn is_entity(&self) -> bool {
        matches!(
            self,
            NodeKind::Package(_) | NodeKind::Entry(_) | NodeKind::Module(_)
        )
    }
}
