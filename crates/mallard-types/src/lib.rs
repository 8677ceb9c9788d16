#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]
#![forbid(unsafe_code)]

mod checker;
mod config;
mod error;


pub use checker::{infer_program, TypeChecker};
pub use config::{InferConfig, UnresolvedPolicy};
pub use error::TypeError;

// inference lives in its own namespace
pub mod infer {
    pub mod constraint;
    pub mod ctx;
    pub mod solver;
    pub mod ty;
    pub mod var;

    pub use constraint::InferCtx;
    pub use ctx::TypeCtx;
    pub use solver::Solver;
    pub use ty::{AtomicType, Type, TypeVarId, ELEMENT, PARAM, RETURN};
    pub use var::{PendingSend, TypeVariable, VarOrigin};

    #[cfg(test)]
    mod tests;
}

// Short names for dependents.
pub mod prelude {
    pub use crate::checker::{infer_program, TypeChecker};
    pub use crate::config::{InferConfig, UnresolvedPolicy};
    pub use crate::error::TypeError;
    pub use crate::infer::{
        ctx::TypeCtx,
        ty::{Type, TypeVarId},
        var::TypeVariable,
    };
}
