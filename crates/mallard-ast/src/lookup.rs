//! Module hierarchy and method lookup.

use crate::ast::{Method, ModuleKind, NodeId, NodeKind};
use crate::program::Program;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupOptions {
    /// Also answer with methods that have neither body nor native implementation.
    pub allow_abstract: bool,
}

impl LookupOptions {
    pub fn allowing_abstract() -> Self {
        LookupOptions {
            allow_abstract: true,
        }
    }
}

impl Program {
    /// Linearized ancestry of `module`: the module itself, each mixin's
    /// hierarchy in declaration order, then the superclass' hierarchy.
    /// Modules reached twice keep their first position.
    pub fn hierarchy(&self, module: NodeId) -> Vec<NodeId> {
        let mut seen = Vec::new();
        self.collect_hierarchy(module, &mut seen);
        seen
    }

    fn collect_hierarchy(&self, module: NodeId, seen: &mut Vec<NodeId>) {
        if seen.contains(&module) {
            return;
        }
        let Some(m) = self.module(module) else {
            return;
        };
        seen.push(module);
        for mixin in &m.mixins {
            self.collect_hierarchy(*mixin, seen);
        }
        if m.module_kind != ModuleKind::Mixin {
            if let Some(superclass) = m.superclass {
                self.collect_hierarchy(superclass, seen);
            }
        }
    }

    pub fn inherits(&self, module: NodeId, other: NodeId) -> bool {
        self.hierarchy(module).contains(&other)
    }

    /// Methods declared directly in `module`.
    pub fn methods_of(&self, module: NodeId) -> impl Iterator<Item = (NodeId, &Method)> + '_ {
        self.module(module)
            .into_iter()
            .flat_map(|m| m.members.iter().copied())
            .filter_map(move |id| self.method(id).map(|method| (id, method)))
    }

    pub fn matches_signature(&self, method: &Method, name: &str, arity: usize) -> bool {
        if method.name != name {
            return false;
        }
        let has_vararg = method.parameters.iter().any(|p| {
            matches!(self.get(*p).map(|n| &n.kind), Some(NodeKind::Parameter(param)) if param.vararg)
        });
        let declared = method.parameters.len();
        (has_vararg && declared - 1 <= arity) || declared == arity
    }

    /// First method answering `name/arity` along the hierarchy of `module`.
    pub fn lookup_method(
        &self,
        module: NodeId,
        name: &str,
        arity: usize,
        options: LookupOptions,
    ) -> Option<NodeId> {
        self.hierarchy(module).into_iter().find_map(|ancestor| {
            self.methods_of(ancestor)
                .find(|(_, method)| {
                    (options.allow_abstract || !method.is_abstract())
                        && self.matches_signature(method, name, arity)
                })
                .map(|(id, _)| id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProgramBuilder;

    #[test]
    fn hierarchy_puts_mixins_before_the_superclass() {
        let mut b = ProgramBuilder::new();
        let flies = b.mixin("Flies", vec![]);
        let animal = b.class("Animal", vec![]);
        let bird = b.module(ModuleKind::Class, Some("Bird"), Some(animal), vec![flies], vec![]);
        b.package("zoo", vec![flies, animal, bird]);
        let program = b.build().unwrap();

        let object = program.builtins().object;
        assert_eq!(program.hierarchy(bird), vec![bird, flies, animal, object]);
        assert!(program.inherits(bird, flies));
        assert!(!program.inherits(animal, bird));
    }

    #[test]
    fn lookup_prefers_the_closest_definition() {
        let mut b = ProgramBuilder::new();
        let general = b.native_method("speak", vec![], None);
        let animal = b.class("Animal", vec![general]);
        let one = b.number(1.0);
        let specific = b.method("speak", vec![], vec![one]);
        let duck = b.module(ModuleKind::Class, Some("Duck"), Some(animal), vec![], vec![specific]);
        b.package("zoo", vec![animal, duck]);
        let program = b.build().unwrap();

        let found = program.lookup_method(duck, "speak", 0, LookupOptions::default());
        assert_eq!(found, Some(specific));
        let found = program.lookup_method(animal, "speak", 0, LookupOptions::default());
        assert_eq!(found, Some(general));
        assert_eq!(
            program.lookup_method(duck, "speak", 1, LookupOptions::default()),
            None
        );
    }

    #[test]
    fn abstract_methods_need_to_be_allowed() {
        let mut b = ProgramBuilder::new();
        let x = b.parameter("x");
        let shape = b.abstract_method("area", vec![x]);
        let figure = b.class("Figure", vec![shape]);
        b.package("geo", vec![figure]);
        let program = b.build().unwrap();

        assert_eq!(
            program.lookup_method(figure, "area", 1, LookupOptions::default()),
            None
        );
        assert_eq!(
            program.lookup_method(figure, "area", 1, LookupOptions::allowing_abstract()),
            Some(shape)
        );
    }

    #[test]
    fn varargs_accept_any_trailing_count() {
        let mut b = ProgramBuilder::new();
        let first = b.parameter("first");
        let rest = b.vararg_parameter("rest");
        let log = b.native_method("log", vec![first, rest], None);
        let logger = b.singleton("logger", vec![log]);
        b.package("util", vec![logger]);
        let program = b.build().unwrap();

        for arity in 1..4 {
            assert_eq!(
                program.lookup_method(logger, "log", arity, LookupOptions::default()),
                Some(log)
            );
        }
        assert_eq!(
            program.lookup_method(logger, "log", 0, LookupOptions::default()),
            None
        );
    }
}
