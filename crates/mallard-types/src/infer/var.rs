use super::ty::{Type, TypeVarId};
use crate::error::TypeError;
use mallard_ast::ast::NodeId;
use std::fmt;

/// What a type variable stands for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VarOrigin {
    /// The value of a program node.
    Node(NodeId),
    /// A slot of a structural type: a method return, a collection element.
    Synthetic(&'static str),
}

impl fmt::Display for VarOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarOrigin::Node(node) => write!(f, "{}", node),
            VarOrigin::Synthetic(label) => write!(f, "synthetic {}", label),
        }
    }
}

/// A message sent to a variable's value, waiting for a receiver type that
/// can answer it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingSend {
    pub send: NodeId,
    pub message: String,
    pub arity: usize,
    pub args: Vec<TypeVarId>,
    /// Variable holding the send's own value.
    pub result: TypeVarId,
}

/// Bounds collected for one value.
///
/// `min_types` are types the value certainly may take (evidence from
/// producers); `max_types` are types it may at most take (evidence from
/// consumers). Both lists only grow.
#[derive(Clone, Debug)]
pub struct TypeVariable {
    id: TypeVarId,
    origin: VarOrigin,
    min_types: Vec<Type>,
    max_types: Vec<Type>,
    frozen: bool,
    pub(crate) subtypes: Vec<TypeVarId>,
    pub(crate) supertypes: Vec<TypeVarId>,
    pub(crate) sends: Vec<PendingSend>,
}

impl TypeVariable {
    pub(crate) fn new(id: TypeVarId, origin: VarOrigin) -> Self {
        TypeVariable {
            id,
            origin,
            min_types: Vec::new(),
            max_types: Vec::new(),
            frozen: false,
            subtypes: Vec::new(),
            supertypes: Vec::new(),
            sends: Vec::new(),
        }
    }

    pub fn id(&self) -> TypeVarId {
        self.id
    }

    pub fn origin(&self) -> &VarOrigin {
        &self.origin
    }

    pub fn node(&self) -> Option<NodeId> {
        match self.origin {
            VarOrigin::Node(node) => Some(node),
            VarOrigin::Synthetic(_) => None,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self.origin, VarOrigin::Synthetic(_))
    }

    pub fn min_types(&self) -> &[Type] {
        &self.min_types
    }

    pub fn max_types(&self) -> &[Type] {
        &self.max_types
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Variables whose types flow into this one.
    pub fn subtypes(&self) -> &[TypeVarId] {
        &self.subtypes
    }

    /// Variables this one's types flow into.
    pub fn supertypes(&self) -> &[TypeVarId] {
        &self.supertypes
    }

    pub fn sends(&self) -> &[PendingSend] {
        &self.sends
    }

    /// The current best answer for this variable.
    ///
    /// A single upper bound wins over a single lower bound. With several
    /// candidates on both sides the lower bounds are reported.
    pub fn ty(&self) -> Type {
        let (min, max) = (&self.min_types, &self.max_types);
        if min.is_empty() && max.is_empty() {
            return Type::any();
        }
        if max.len() == 1 {
            return max[0].clone();
        }
        if min.len() == 1 {
            return min[0].clone();
        }
        if min.len() > 1 {
            return Type::union(min.iter().cloned());
        }
        Type::union(max.iter().cloned())
    }

    pub fn has_any_type(&self) -> Result<bool, TypeError> {
        self.ty().contains(&Type::any())
    }

    /// Whether one of the current candidate types covers `candidate`.
    pub fn has_type(&self, candidate: &Type) -> Result<bool, TypeError> {
        for ty in self.ty().as_list() {
            if ty.contains(candidate)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Adds a lower bound; answers whether the variable changed.
    pub fn add_min_type(&mut self, ty: Type) -> Result<bool, TypeError> {
        if self.covers(&ty)? {
            return Ok(false);
        }
        self.ensure_open()?;
        self.min_types.push(ty);
        Ok(true)
    }

    /// Adds an upper bound; answers whether the variable changed.
    pub fn add_max_type(&mut self, ty: Type) -> Result<bool, TypeError> {
        if self.covers(&ty)? {
            return Ok(false);
        }
        self.ensure_open()?;
        self.max_types.push(ty);
        Ok(true)
    }

    /// Fixes the variable to `ty`. Further bounds it does not already
    /// cover are rejected.
    pub fn set_type(&mut self, ty: Type) -> Result<(), TypeError> {
        self.add_min_type(ty)?;
        self.frozen = true;
        Ok(())
    }

    fn covers(&self, ty: &Type) -> Result<bool, TypeError> {
        for bound in self.max_types.iter().chain(&self.min_types) {
            if bound.contains(ty)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn ensure_open(&self) -> Result<(), TypeError> {
        if self.frozen {
            Err(TypeError::FrozenVariable {
                var: self.id,
                node: self.node(),
            })
        } else {
            Ok(())
        }
    }
}
