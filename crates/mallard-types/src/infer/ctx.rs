use super::ty::{Type, TypeVarId};
use super::var::{PendingSend, TypeVariable, VarOrigin};
use crate::error::TypeError;
use mallard_ast::ast::NodeId;
use mallard_ast::Program;
use rustc_hash::FxHashMap;
use tracing::trace;

/// Arena of type variables plus the node → variable registry.
#[derive(Default, Debug)]
pub struct TypeCtx {
    vars: Vec<TypeVariable>,
    by_node: FxHashMap<NodeId, TypeVarId>,
}

impl TypeCtx {
    pub fn new() -> Self {
        Self {
            vars: Vec::new(),
            by_node: FxHashMap::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeVariable> + '_ {
        self.vars.iter()
    }

    /// Panics on ids not allocated by this context.
    pub fn var(&self, id: TypeVarId) -> &TypeVariable {
        &self.vars[id.index()]
    }

    fn var_mut(&mut self, id: TypeVarId) -> &mut TypeVariable {
        &mut self.vars[id.index()]
    }

    pub fn lookup(&self, node: NodeId) -> Option<TypeVarId> {
        self.by_node.get(&node).copied()
    }

    /// The variable of `node`, created on first request.
    pub fn var_for(&mut self, node: NodeId) -> TypeVarId {
        if let Some(id) = self.lookup(node) {
            return id;
        }
        let id = self.alloc(VarOrigin::Node(node));
        self.by_node.insert(node, id);
        trace!(var = %id, %node, "new type variable");
        id
    }

    pub fn fresh_synthetic(&mut self, label: &'static str) -> TypeVarId {
        let id = self.alloc(VarOrigin::Synthetic(label));
        trace!(var = %id, origin = %self.var(id).origin(), "new type variable");
        id
    }

    fn alloc(&mut self, origin: VarOrigin) -> TypeVarId {
        let id = TypeVarId(self.vars.len() as u32);
        self.vars.push(TypeVariable::new(id, origin));
        id
    }

    pub fn ty(&self, id: TypeVarId) -> Type {
        self.var(id).ty()
    }

    /// Current type of `node`; ANY for nodes that never got a variable.
    pub fn type_of_node(&self, node: NodeId) -> Type {
        self.lookup(node).map_or_else(Type::any, |id| self.ty(id))
    }

    pub fn name_of(&self, id: TypeVarId, program: &Program) -> String {
        self.ty(id).name(self, program)
    }

    pub fn has_type(&self, id: TypeVarId, candidate: &Type) -> Result<bool, TypeError> {
        self.var(id).has_type(candidate)
    }

    pub fn set_type(&mut self, id: TypeVarId, ty: Type) -> Result<(), TypeError> {
        self.var_mut(id).set_type(ty)
    }

    pub fn add_min_type(&mut self, id: TypeVarId, ty: Type) -> Result<bool, TypeError> {
        self.var_mut(id).add_min_type(ty)
    }

    pub fn add_max_type(&mut self, id: TypeVarId, ty: Type) -> Result<bool, TypeError> {
        self.var_mut(id).add_max_type(ty)
    }

    /// Slot of a structural type held by `id`.
    pub fn at_param(&self, id: TypeVarId, slot: &str) -> Result<TypeVarId, TypeError> {
        self.ty(id).at_param(slot)
    }

    /// Records that values of `sub` flow into `sup`, in both directions
    /// of the graph.
    pub fn is_supertype_of(&mut self, sup: TypeVarId, sub: TypeVarId) {
        let upper = self.var_mut(sup);
        if !upper.subtypes.contains(&sub) {
            upper.subtypes.push(sub);
        }
        let lower = self.var_mut(sub);
        if !lower.supertypes.contains(&sup) {
            lower.supertypes.push(sup);
        }
    }

    pub fn is_subtype_of(&mut self, sub: TypeVarId, sup: TypeVarId) {
        self.is_supertype_of(sup, sub);
    }

    /// One-directional edge: only `from` learns that its lower bounds flow
    /// into `to`. Answers whether the edge is new.
    pub fn add_supertype_edge(&mut self, from: TypeVarId, to: TypeVarId) -> bool {
        let var = self.var_mut(from);
        if var.supertypes.contains(&to) {
            false
        } else {
            var.supertypes.push(to);
            true
        }
    }

    pub fn add_send(&mut self, receiver: TypeVarId, send: PendingSend) {
        self.var_mut(receiver).sends.push(send);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_variable_per_node() {
        let mut ctx = TypeCtx::new();
        let a = ctx.var_for(NodeId(3));
        let b = ctx.var_for(NodeId(3));
        let c = ctx.var_for(NodeId(4));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.lookup(NodeId(4)), Some(c));
        assert_eq!(ctx.lookup(NodeId(5)), None);
    }

    #[test]
    fn synthetic_variables_have_no_node() {
        let mut ctx = TypeCtx::new();
        let slot = ctx.fresh_synthetic("method return");
        assert!(ctx.var(slot).is_synthetic());
        assert_eq!(ctx.var(slot).node(), None);
        assert!(ctx.type_of_node(NodeId(0)).is_any());
    }

    #[test]
    fn subtype_edges_are_recorded_on_both_ends() {
        let mut ctx = TypeCtx::new();
        let sup = ctx.var_for(NodeId(0));
        let sub = ctx.var_for(NodeId(1));
        ctx.is_supertype_of(sup, sub);
        ctx.is_subtype_of(sub, sup);
        assert_eq!(ctx.var(sup).subtypes(), &[sub]);
        assert_eq!(ctx.var(sub).supertypes(), &[sup]);
    }

    #[test]
    fn one_directional_edges_leave_the_target_untouched() {
        let mut ctx = TypeCtx::new();
        let from = ctx.fresh_synthetic("method return");
        let to = ctx.var_for(NodeId(9));
        assert!(ctx.add_supertype_edge(from, to));
        assert!(!ctx.add_supertype_edge(from, to));
        assert_eq!(ctx.var(from).supertypes(), &[to]);
        assert!(ctx.var(to).subtypes().is_empty());
    }
}
