use super::ctx::TypeCtx;
use crate::error::TypeError;
use mallard_ast::ast::NodeId;
use mallard_ast::{LookupOptions, Program};
use std::fmt;
use std::hash::{Hash, Hasher};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub struct TypeVarId(pub u32);

impl TypeVarId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TypeVarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

impl fmt::Display for TypeVarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

impl Hash for TypeVarId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// Slot holding a method's (or closure's) return type.
pub const RETURN: &str = "RETURN";
/// Slot holding a collection literal's element type.
pub const ELEMENT: &str = "ELEMENT";
/// Prefix of positional parameter slots: `PARAM0`, `PARAM1`, ...
pub const PARAM: &str = "PARAM";

/// Nested parametric types deeper than this render as `...`.
const MAX_RENDER_DEPTH: usize = 8;

pub fn param_slot(index: usize) -> String {
    format!("{}{}", PARAM, index)
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AtomicType {
    /// No information yet.
    Any,
    /// No value.
    Void,
}

impl AtomicType {
    pub fn name(self) -> &'static str {
        match self {
            AtomicType::Any => "ANY",
            AtomicType::Void => "VOID",
        }
    }
}

/// A candidate type. Slots of parametric and method types point back into
/// the variable arena, so rendering a type needs the [`TypeCtx`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Type {
    Atomic(AtomicType),
    /// Nominal type of a class, singleton or mixin.
    Module(NodeId),
    /// A module with named type-variable slots, e.g. `List<ELEMENT>`.
    Parametric {
        module: NodeId,
        slots: Vec<(String, TypeVarId)>,
    },
    /// `PARAM0..N` plus `RETURN`; a parametric type with no module behind it.
    Method { slots: Vec<(String, TypeVarId)> },
    /// Alternatives; never nested.
    Union(Vec<Type>),
}

impl Type {
    #[inline]
    pub fn any() -> Self {
        Type::Atomic(AtomicType::Any)
    }
    #[inline]
    pub fn void() -> Self {
        Type::Atomic(AtomicType::Void)
    }
    #[inline]
    pub fn module(module: NodeId) -> Self {
        Type::Module(module)
    }

    pub fn parametric(module: NodeId, slots: Vec<(String, TypeVarId)>) -> Self {
        Type::Parametric { module, slots }
    }

    pub fn method(params: &[TypeVarId], ret: TypeVarId) -> Self {
        let mut slots: Vec<(String, TypeVarId)> = params
            .iter()
            .enumerate()
            .map(|(i, p)| (param_slot(i), *p))
            .collect();
        slots.push((RETURN.to_string(), ret));
        Type::Method { slots }
    }

    /// Builds a union, flattening nested unions and dropping repeated
    /// members. A single alternative is returned as is.
    pub fn union(types: impl IntoIterator<Item = Type>) -> Self {
        let mut members: Vec<Type> = Vec::new();
        for ty in types {
            let flat = match ty {
                Type::Union(inner) => inner,
                other => vec![other],
            };
            for member in flat {
                if !members.contains(&member) {
                    members.push(member);
                }
            }
        }
        if members.len() == 1 {
            members.remove(0)
        } else {
            Type::Union(members)
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Type::Atomic(_) => "atomic",
            Type::Module(_) => "module",
            Type::Parametric { .. } => "parametric",
            Type::Method { .. } => "method",
            Type::Union(_) => "union",
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Type::Atomic(AtomicType::Any))
    }

    /// The module behind a module-shaped type.
    pub fn module_id(&self) -> Option<NodeId> {
        match self {
            Type::Module(module) | Type::Parametric { module, .. } => Some(*module),
            _ => None,
        }
    }

    /// Whether a value of type `other` is covered by `self`.
    ///
    /// A union covers whatever one of its members covers; every other type
    /// only covers itself. Testing a union inside a union is unsupported.
    pub fn contains(&self, other: &Type) -> Result<bool, TypeError> {
        match (self, other) {
            (Type::Union(_), Type::Union(_)) => Err(TypeError::UnsupportedOperation {
                op: "contains",
                shape: "union",
            }),
            (Type::Union(members), _) => {
                for member in members {
                    if member.contains(other)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            _ => Ok(self == other),
        }
    }

    /// Structural method resolution; only module-shaped types own methods.
    pub fn lookup_method(
        &self,
        program: &Program,
        name: &str,
        arity: usize,
        options: LookupOptions,
    ) -> Result<Option<NodeId>, TypeError> {
        match self.module_id() {
            Some(module) => Ok(program.lookup_method(module, name, arity, options)),
            None => Err(TypeError::UnsupportedOperation {
                op: "lookup_method",
                shape: self.shape(),
            }),
        }
    }

    pub fn at_param(&self, name: &str) -> Result<TypeVarId, TypeError> {
        match self {
            Type::Parametric { slots, .. } | Type::Method { slots } => slots
                .iter()
                .find(|(slot, _)| slot == name)
                .map(|(_, var)| *var)
                .ok_or_else(|| TypeError::InvariantViolation {
                    msg: format!("type has no '{}' slot", name),
                }),
            _ => Err(TypeError::UnsupportedOperation {
                op: "at_param",
                shape: self.shape(),
            }),
        }
    }

    /// Every alternative this type stands for.
    pub fn as_list(&self) -> &[Type] {
        match self {
            Type::Union(members) => members,
            _ => std::slice::from_ref(self),
        }
    }

    /// Human-readable rendering. Slots render with their variable's
    /// current type, so the result is only stable once inference is done.
    pub fn name(&self, ctx: &TypeCtx, program: &Program) -> String {
        self.render(ctx, program, 0)
    }

    fn render(&self, ctx: &TypeCtx, program: &Program, depth: usize) -> String {
        if depth > MAX_RENDER_DEPTH {
            return "...".to_string();
        }
        let slot = |var: TypeVarId| ctx.ty(var).render(ctx, program, depth + 1);
        match self {
            Type::Atomic(atomic) => atomic.name().to_string(),
            Type::Module(module) => program.module_name(*module),
            Type::Parametric { module, slots } => {
                let inner: Vec<String> = slots.iter().map(|(_, var)| slot(*var)).collect();
                format!("{}<{}>", program.module_name(*module), inner.join(", "))
            }
            Type::Method { slots } => {
                let params: Vec<String> = slots
                    .iter()
                    .filter(|(name, _)| name != RETURN)
                    .map(|(_, var)| slot(*var))
                    .collect();
                let ret = slots
                    .iter()
                    .find(|(name, _)| name == RETURN)
                    .map(|(_, var)| slot(*var))
                    .unwrap_or_else(|| AtomicType::Void.name().to_string());
                format!("({}) => {}", params.join(", "), ret)
            }
            Type::Union(members) => {
                let inner: Vec<String> = members
                    .iter()
                    .map(|m| m.render(ctx, program, depth + 1))
                    .collect();
                format!("({})", inner.join(" | "))
            }
        }
    }
}
