use crate::ast::{Method, Module, ModuleKind, Node, NodeId, NodeKind};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Namespace holding the built-in modules.
pub const LANG_NAMESPACE: &str = "mallard.lang";

/// Raw, serializable form of a program: a node arena plus its root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramGraph {
    pub nodes: Vec<Node>,
    pub root: NodeId,
}

/// Built-in modules the type system needs to know by identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Builtins {
    pub object: NodeId,
    pub number: NodeId,
    pub string: NodeId,
    pub boolean: NodeId,
    pub closure: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// A node mentions an id outside the arena.
    DanglingNode { from: NodeId, to: NodeId },
    /// The declared root is missing or is not a `Root` node.
    NotARoot { root: NodeId },
    /// A node is owned by more than one parent (or owns one of its ancestors).
    MultipleParents { node: NodeId, first: NodeId, second: NodeId },
    /// A built-in module could not be found under its qualified name.
    MissingBuiltin { fqn: String },
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::DanglingNode { from, to } => {
                write!(f, "node {} refers to missing node {}", from, to)
            }
            LinkError::NotARoot { root } => write!(f, "node {} is not a program root", root),
            LinkError::MultipleParents {
                node,
                first,
                second,
            } => write!(
                f,
                "node {} is owned by both {} and {}",
                node, first, second
            ),
            LinkError::MissingBuiltin { fqn } => write!(f, "built-in module '{}' not found", fqn),
        }
    }
}

impl std::error::Error for LinkError {}

/// A fully linked program graph: the arena plus parent links, a
/// qualified-name index and the resolved built-ins.
#[derive(Debug, Clone)]
pub struct Program {
    graph: ProgramGraph,
    parents: Vec<Option<NodeId>>,
    fqn_index: HashMap<String, NodeId>,
    builtins: Builtins,
}

impl Serialize for Program {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.graph.serialize(serializer)
    }
}

impl Program {
    pub fn from_graph(graph: ProgramGraph) -> Result<Self, LinkError> {
        let size = graph.nodes.len();
        let root = graph.root;
        if !matches!(graph.nodes.get(root.index()), Some(Node { kind: NodeKind::Root(_), .. })) {
            return Err(LinkError::NotARoot { root });
        }

        for (index, node) in graph.nodes.iter().enumerate() {
            let from = NodeId(index as u32);
            for to in node.kind.children().into_iter().chain(node.kind.links()) {
                if to.index() >= size {
                    return Err(LinkError::DanglingNode { from, to });
                }
            }
        }

        // Parents are assigned walking down from the root, so parent chains
        // always end at the root and never loop.
        let mut parents: Vec<Option<NodeId>> = vec![None; size];
        let mut pending = vec![root];
        while let Some(parent) = pending.pop() {
            for child in graph.nodes[parent.index()].kind.children() {
                if child == root {
                    return Err(LinkError::MultipleParents {
                        node: child,
                        first: parent,
                        second: parent,
                    });
                }
                if let Some(first) = parents[child.index()] {
                    return Err(LinkError::MultipleParents {
                        node: child,
                        first,
                        second: parent,
                    });
                }
                parents[child.index()] = Some(parent);
                pending.push(child);
            }
        }

        let mut program = Program {
            graph,
            parents,
            fqn_index: HashMap::new(),
            builtins: Builtins {
                object: root,
                number: root,
                string: root,
                boolean: root,
                closure: None,
            },
        };
        program.fqn_index = program
            .ids()
            .filter(|id| program.kind(*id).is_entity())
            .filter_map(|id| program.fully_qualified_name(id).map(|fqn| (fqn, id)))
            .collect();
        program.builtins = program.resolve_builtins()?;
        Ok(program)
    }

    fn resolve_builtins(&self) -> Result<Builtins, LinkError> {
        let module = |name: &str| -> Result<NodeId, LinkError> {
            let fqn = format!("{}.{}", LANG_NAMESPACE, name);
            match self.node_by_fqn(&fqn) {
                Some(id) if self.module(id).is_some() => Ok(id),
                _ => Err(LinkError::MissingBuiltin { fqn }),
            }
        };
        Ok(Builtins {
            object: module("Object")?,
            number: module("Number")?,
            string: module("String")?,
            boolean: module("Boolean")?,
            closure: module("Closure").ok(),
        })
    }

    pub fn graph(&self) -> &ProgramGraph {
        &self.graph
    }

    pub fn into_graph(self) -> ProgramGraph {
        self.graph
    }

    pub fn root(&self) -> NodeId {
        self.graph.root
    }

    pub fn len(&self) -> usize {
        self.graph.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.graph.nodes.len()).map(|i| NodeId(i as u32))
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.graph.nodes.get(id.index())
    }

    /// Panics on ids that do not belong to this program.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.graph.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn module(&self, id: NodeId) -> Option<&Module> {
        self.get(id).and_then(|n| n.kind.as_module())
    }

    pub fn method(&self, id: NodeId) -> Option<&Method> {
        self.get(id).and_then(|n| n.kind.as_method())
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(id.index()).copied().flatten()
    }

    /// Parent, grandparent, ... up to the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            program: self,
            next: self.parent(id),
        }
    }

    /// Every node below `id`, breadth first.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut response = Vec::new();
        let mut next = 0;
        let mut current = id;
        loop {
            response.extend(self.kind(current).children());
            match response.get(next) {
                Some(child) => current = *child,
                None => break,
            }
            next += 1;
        }
        response
    }

    /// Every module in the program, in arena order.
    pub fn modules(&self) -> impl Iterator<Item = (NodeId, &Module)> + '_ {
        self.ids()
            .filter_map(move |id| self.module(id).map(|module| (id, module)))
    }

    /// Display name of a module; anonymous singletons are named after
    /// their superclass and id (`Closure#42`).
    pub fn module_name(&self, id: NodeId) -> String {
        match self.module(id) {
            Some(Module {
                name: Some(name), ..
            }) => name.clone(),
            Some(module) => {
                let base = module
                    .superclass
                    .and_then(|sup| self.module(sup))
                    .and_then(|sup| sup.name.clone())
                    .unwrap_or_else(|| "Object".to_string());
                format!("{}#{}", base, id.0)
            }
            None => self
                .get(id)
                .and_then(|n| n.kind.label())
                .unwrap_or("?")
                .to_string(),
        }
    }

    pub fn fully_qualified_name(&self, id: NodeId) -> Option<String> {
        let label = match self.kind(id) {
            NodeKind::Package(p) => p.name.clone(),
            NodeKind::Entry(e) => e.name.clone(),
            NodeKind::Module(Module { name: Some(name), .. }) => name.clone(),
            NodeKind::Module(module) => {
                let base = module
                    .superclass
                    .filter(|sup| self.module(*sup).is_some_and(|m| m.name.is_some()))
                    .and_then(|sup| self.fully_qualified_name(sup))
                    .unwrap_or_else(|| "Object".to_string());
                format!("{}#{}", base, id.0)
            }
            _ => return None,
        };
        match self.parent(id) {
            Some(parent) if matches!(self.kind(parent), NodeKind::Package(_)) => {
                let prefix = self.fully_qualified_name(parent)?;
                Some(format!("{}.{}", prefix, label))
            }
            _ => Some(label),
        }
    }

    pub fn node_by_fqn(&self, fqn: &str) -> Option<NodeId> {
        self.fqn_index.get(fqn).copied()
    }

    /// An anonymous singleton built from a closure literal.
    pub fn is_closure(&self, id: NodeId) -> bool {
        match (self.module(id), self.builtins.closure) {
            (Some(module), Some(closure)) => {
                module.module_kind == ModuleKind::Singleton
                    && module.name.is_none()
                    && module.superclass == Some(closure)
            }
            _ => false,
        }
    }

    pub fn enclosing_method(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id).find(|a| self.method(*a).is_some())
    }

    /// Nearest module around `id`, looking through closure wrappers.
    pub fn enclosing_module(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .find(|a| self.module(*a).is_some() && !self.is_closure(*a))
    }

    /// Nearest package around `id`.
    pub fn enclosing_package(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .find(|a| matches!(self.kind(*a), NodeKind::Package(_)))
    }
}

pub struct Ancestors<'p> {
    program: &'p Program,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.program.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Body, Root};
    use crate::ProgramBuilder;

    #[test]
    fn rejects_graph_without_root() {
        let graph = ProgramGraph {
            nodes: vec![Node::new(NodeKind::Body(Body { sentences: vec![] }))],
            root: NodeId(0),
        };
        assert_eq!(
            Program::from_graph(graph).unwrap_err(),
            LinkError::NotARoot { root: NodeId(0) }
        );
    }

    #[test]
    fn rejects_dangling_children() {
        let graph = ProgramGraph {
            nodes: vec![Node::new(NodeKind::Root(Root {
                members: vec![NodeId(7)],
            }))],
            root: NodeId(0),
        };
        assert!(matches!(
            Program::from_graph(graph),
            Err(LinkError::DanglingNode { to: NodeId(7), .. })
        ));
    }

    #[test]
    fn rejects_shared_children() {
        let graph = ProgramGraph {
            nodes: vec![
                Node::new(NodeKind::Body(Body { sentences: vec![] })),
                Node::new(NodeKind::Body(Body {
                    sentences: vec![NodeId(0)],
                })),
                Node::new(NodeKind::Root(Root {
                    members: vec![NodeId(0), NodeId(1)],
                })),
            ],
            root: NodeId(2),
        };
        assert!(matches!(
            Program::from_graph(graph),
            Err(LinkError::MultipleParents { node: NodeId(0), .. })
        ));
    }

    #[test]
    fn requires_builtins() {
        let graph = ProgramGraph {
            nodes: vec![Node::new(NodeKind::Root(Root { members: vec![] }))],
            root: NodeId(0),
        };
        assert!(matches!(
            Program::from_graph(graph),
            Err(LinkError::MissingBuiltin { .. })
        ));
    }

    #[test]
    fn qualified_names_follow_packages() {
        let mut b = ProgramBuilder::new();
        let bird = b.class("Bird", vec![]);
        b.package("zoo", vec![bird]);
        let program = b.build().unwrap();

        assert_eq!(
            program.fully_qualified_name(bird).as_deref(),
            Some("zoo.Bird")
        );
        assert_eq!(program.node_by_fqn("zoo.Bird"), Some(bird));
        assert_eq!(
            program.node_by_fqn("mallard.lang.Number"),
            Some(program.builtins().number)
        );
    }

    #[test]
    fn descendants_are_breadth_first() {
        // class Bird { method fly(x) { x.go(1) } }
        let mut b = ProgramBuilder::new();
        let x = b.parameter("x");
        let rx = b.reference(x);
        let one = b.number(1.0);
        let go = b.send(rx, "go", vec![one]);
        let fly = b.method("fly", vec![x], vec![go]);
        let bird = b.class("Bird", vec![fly]);
        b.package("zoo", vec![bird]);
        let program = b.build().unwrap();

        let body = program.method(fly).and_then(|m| m.body).unwrap();
        assert_eq!(program.descendants(bird), vec![fly, x, body, go, rx, one]);
        assert!(program.descendants(one).is_empty());
    }

    #[test]
    fn closures_are_skipped_when_looking_for_the_enclosing_module() {
        let mut b = ProgramBuilder::new();
        let inner_self = b.self_ref();
        let closure = b.closure(vec![], vec![inner_self]);
        let method = b.method("run", vec![], vec![closure]);
        let duck = b.class("Duck", vec![method]);
        b.package("pond", vec![duck]);
        let program = b.build().unwrap();

        assert!(program.is_closure(closure));
        assert_eq!(program.enclosing_module(inner_self), Some(duck));
        assert_ne!(program.enclosing_method(inner_self), Some(method));
        assert!(program.module_name(closure).starts_with("Closure#"));
    }
}
