//! Programmatic construction of linked program graphs.
//!
//! ```rust
//! use mallard_ast::ProgramBuilder;
//!
//! let mut b = ProgramBuilder::new();
//! let one = b.number(1.0);
//! let two = b.number(2.0);
//! let sum = b.send(one, "+", vec![two]);
//! b.entry("main", vec![sum]);
//! let program = b.build().unwrap();
//! assert!(program.len() > 3);
//! ```

use crate::ast::*;
use crate::prelude::{self, LangModules};
use crate::program::{LinkError, Program, ProgramGraph};
use crate::span::Span;

/// Allocates nodes bottom-up: every constructor returns the new node's id,
/// to be handed to the constructor of its parent.
pub struct ProgramBuilder {
    nodes: Vec<Node>,
    top_level: Vec<NodeId>,
    lang: LangModules,
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramBuilder {
    /// A builder with the `mallard.lang` prelude already installed.
    pub fn new() -> Self {
        let mut builder = ProgramBuilder {
            nodes: Vec::new(),
            top_level: Vec::new(),
            lang: LangModules::default(),
        };
        builder.lang = prelude::install(&mut builder);
        builder
    }

    pub fn lang(&self) -> &LangModules {
        &self.lang
    }

    pub fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind));
        id
    }

    pub fn push_spanned(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::with_span(kind, span));
        id
    }

    pub fn set_span(&mut self, id: NodeId, span: Span) {
        if let Some(node) = self.nodes.get_mut(id.index()) {
            node.span = Some(span);
        }
    }

    /// Declares the return type of a method by qualified module name.
    pub fn annotate_return(&mut self, method: NodeId, fqn: &str) {
        if let Some(Node {
            kind: NodeKind::Method(m),
            ..
        }) = self.nodes.get_mut(method.index())
        {
            m.return_type = Some(fqn.to_string());
        }
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.index()).map(|n| &n.kind)
    }

    // ---------------------------------------------------------------------
    // Entities
    // ---------------------------------------------------------------------

    /// Adds a top-level package holding `members`.
    pub fn package(&mut self, name: &str, members: Vec<NodeId>) -> NodeId {
        self.package_with_imports(name, vec![], members)
    }

    pub fn package_with_imports(
        &mut self,
        name: &str,
        imports: Vec<NodeId>,
        members: Vec<NodeId>,
    ) -> NodeId {
        let id = self.push(NodeKind::Package(Package {
            name: name.to_string(),
            imports,
            members,
        }));
        self.top_level.push(id);
        id
    }

    pub fn import(&mut self, entity: &str) -> NodeId {
        self.push(NodeKind::Import(Import {
            entity: entity.to_string(),
            generic: entity.ends_with(".*"),
        }))
    }

    /// Adds a top-level runnable block.
    pub fn entry(&mut self, name: &str, sentences: Vec<NodeId>) -> NodeId {
        let body = self.body(sentences);
        let id = self.push(NodeKind::Entry(Entry {
            name: name.to_string(),
            body,
        }));
        self.top_level.push(id);
        id
    }

    pub fn module(
        &mut self,
        module_kind: ModuleKind,
        name: Option<&str>,
        superclass: Option<NodeId>,
        mixins: Vec<NodeId>,
        members: Vec<NodeId>,
    ) -> NodeId {
        self.push(NodeKind::Module(Module {
            module_kind,
            name: name.map(str::to_string),
            superclass,
            mixins,
            members,
        }))
    }

    /// A class inheriting from `Object`.
    pub fn class(&mut self, name: &str, members: Vec<NodeId>) -> NodeId {
        let object = self.lang.object;
        self.module(ModuleKind::Class, Some(name), Some(object), vec![], members)
    }

    pub fn subclass(&mut self, name: &str, superclass: NodeId, members: Vec<NodeId>) -> NodeId {
        self.module(ModuleKind::Class, Some(name), Some(superclass), vec![], members)
    }

    pub fn singleton(&mut self, name: &str, members: Vec<NodeId>) -> NodeId {
        let object = self.lang.object;
        self.module(ModuleKind::Singleton, Some(name), Some(object), vec![], members)
    }

    /// An anonymous object literal.
    pub fn object_literal(&mut self, members: Vec<NodeId>) -> NodeId {
        let object = self.lang.object;
        self.module(ModuleKind::Singleton, None, Some(object), vec![], members)
    }

    pub fn mixin(&mut self, name: &str, members: Vec<NodeId>) -> NodeId {
        self.module(ModuleKind::Mixin, Some(name), None, vec![], members)
    }

    /// `{ p1, p2 => sentences }`: an anonymous `Closure` singleton with an
    /// `apply` method.
    pub fn closure(&mut self, parameters: Vec<NodeId>, sentences: Vec<NodeId>) -> NodeId {
        let apply = self.method("apply", parameters, sentences);
        let closure = self.lang.closure;
        self.module(ModuleKind::Singleton, None, Some(closure), vec![], vec![apply])
    }

    // ---------------------------------------------------------------------
    // Members
    // ---------------------------------------------------------------------

    pub fn method(&mut self, name: &str, parameters: Vec<NodeId>, sentences: Vec<NodeId>) -> NodeId {
        let body = self.body(sentences);
        self.push(NodeKind::Method(Method {
            name: name.to_string(),
            parameters,
            body: Some(body),
            native: false,
            return_type: None,
        }))
    }

    pub fn native_method(
        &mut self,
        name: &str,
        parameters: Vec<NodeId>,
        return_type: Option<&str>,
    ) -> NodeId {
        self.push(NodeKind::Method(Method {
            name: name.to_string(),
            parameters,
            body: None,
            native: true,
            return_type: return_type.map(str::to_string),
        }))
    }

    pub fn abstract_method(&mut self, name: &str, parameters: Vec<NodeId>) -> NodeId {
        self.push(NodeKind::Method(Method {
            name: name.to_string(),
            parameters,
            body: None,
            native: false,
            return_type: None,
        }))
    }

    pub fn parameter(&mut self, name: &str) -> NodeId {
        self.push(NodeKind::Parameter(Parameter {
            name: name.to_string(),
            vararg: false,
        }))
    }

    pub fn vararg_parameter(&mut self, name: &str) -> NodeId {
        self.push(NodeKind::Parameter(Parameter {
            name: name.to_string(),
            vararg: true,
        }))
    }

    pub fn field(&mut self, name: &str, value: Option<NodeId>) -> NodeId {
        self.push(NodeKind::Field(Field {
            name: name.to_string(),
            read_only: false,
            value,
        }))
    }

    // ---------------------------------------------------------------------
    // Sentences
    // ---------------------------------------------------------------------

    pub fn body(&mut self, sentences: Vec<NodeId>) -> NodeId {
        self.push(NodeKind::Body(Body { sentences }))
    }

    /// `var name = value`
    pub fn variable(&mut self, name: &str, value: Option<NodeId>) -> NodeId {
        self.push(NodeKind::Variable(Variable {
            name: name.to_string(),
            read_only: false,
            value,
        }))
    }

    /// `const name = value`
    pub fn constant(&mut self, name: &str, value: NodeId) -> NodeId {
        self.push(NodeKind::Variable(Variable {
            name: name.to_string(),
            read_only: true,
            value: Some(value),
        }))
    }

    /// `target = value`, where `target` is the assigned declaration. A fresh
    /// reference to it becomes the assignment's left-hand side.
    pub fn assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
        let variable = self.reference(target);
        self.push(NodeKind::Assignment(Assignment { variable, value }))
    }

    pub fn ret(&mut self, value: Option<NodeId>) -> NodeId {
        self.push(NodeKind::Return(Return { value }))
    }

    pub fn if_else(
        &mut self,
        condition: NodeId,
        then_sentences: Vec<NodeId>,
        else_sentences: Vec<NodeId>,
    ) -> NodeId {
        let then_body = self.body(then_sentences);
        let else_body = self.body(else_sentences);
        self.push(NodeKind::If(If {
            condition,
            then_body,
            else_body,
        }))
    }

    pub fn throw(&mut self, exception: NodeId) -> NodeId {
        self.push(NodeKind::Throw(Throw { exception }))
    }

    pub fn try_catch(
        &mut self,
        sentences: Vec<NodeId>,
        catches: Vec<NodeId>,
        always: Option<Vec<NodeId>>,
    ) -> NodeId {
        let body = self.body(sentences);
        let always = always.map(|sentences| self.body(sentences));
        self.push(NodeKind::Try(Try {
            body,
            catches,
            always,
        }))
    }

    pub fn catch(
        &mut self,
        parameter: NodeId,
        parameter_type: Option<NodeId>,
        sentences: Vec<NodeId>,
    ) -> NodeId {
        let body = self.body(sentences);
        self.push(NodeKind::Catch(Catch {
            parameter,
            parameter_type,
            body,
        }))
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    pub fn send(&mut self, receiver: NodeId, message: &str, args: Vec<NodeId>) -> NodeId {
        self.push(NodeKind::Send(MessageSend {
            receiver,
            message: message.to_string(),
            args,
        }))
    }

    /// A reference named after its target's label.
    pub fn reference(&mut self, target: NodeId) -> NodeId {
        let name = self
            .kind(target)
            .and_then(NodeKind::label)
            .unwrap_or("?")
            .to_string();
        self.push(NodeKind::Reference(Reference { name, target }))
    }

    pub fn self_ref(&mut self) -> NodeId {
        self.push(NodeKind::SelfRef)
    }

    pub fn super_call(&mut self, args: Vec<NodeId>) -> NodeId {
        self.push(NodeKind::Super(SuperCall { args }))
    }

    pub fn new_instance(&mut self, class: NodeId, args: Vec<NodeId>) -> NodeId {
        self.push(NodeKind::New(New {
            instantiated: class,
            args,
        }))
    }

    pub fn named_argument(&mut self, name: &str, value: NodeId) -> NodeId {
        self.push(NodeKind::NamedArgument(NamedArgument {
            name: name.to_string(),
            value,
        }))
    }

    pub fn literal(&mut self, value: LiteralValue) -> NodeId {
        self.push(NodeKind::Literal(Literal { value }))
    }

    pub fn number(&mut self, value: f64) -> NodeId {
        self.literal(LiteralValue::Number(value))
    }

    pub fn string(&mut self, value: &str) -> NodeId {
        self.literal(LiteralValue::String(value.to_string()))
    }

    pub fn boolean(&mut self, value: bool) -> NodeId {
        self.literal(LiteralValue::Boolean(value))
    }

    pub fn null(&mut self) -> NodeId {
        self.literal(LiteralValue::Null)
    }

    /// `[e1, e2, ...]`
    pub fn list(&mut self, elements: Vec<NodeId>) -> NodeId {
        let module = self.lang.list;
        self.literal(LiteralValue::Collection { module, elements })
    }

    /// `#{e1, e2, ...}`
    pub fn set(&mut self, elements: Vec<NodeId>) -> NodeId {
        let module = self.lang.set;
        self.literal(LiteralValue::Collection { module, elements })
    }

    /// Closes the graph under a fresh root and links it.
    pub fn build(self) -> Result<Program, LinkError> {
        Program::from_graph(self.into_graph())
    }

    /// Closes the graph under a fresh root without linking it.
    pub fn into_graph(mut self) -> ProgramGraph {
        let members = std::mem::take(&mut self.top_level);
        let root = self.push(NodeKind::Root(Root { members }));
        ProgramGraph {
            nodes: self.nodes,
            root,
        }
    }
}
