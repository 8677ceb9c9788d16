// Errors raised while generating or solving type constraints

use super::infer::ty::TypeVarId;
use mallard_ast::ast::NodeId;
use mallard_ast::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum TypeError {
    /// A new bound was added to a variable whose type is fixed
    FrozenVariable { var: TypeVarId, node: Option<NodeId> },
    /// An operation that is undefined for this shape of type
    UnsupportedOperation {
        op: &'static str,
        shape: &'static str,
    },
    /// No method answers the message on (one of) the receiver's types
    UnresolvedMessage {
        send: NodeId,
        message: String,
        arity: usize,
        receiver: String,
        span: Option<Span>,
    },
    /// A `return` outside of any method
    MissingEnclosingMethod { node: NodeId },
    /// A `self` or `super` outside of any module
    MissingEnclosingModule { node: NodeId },
    /// A return-type annotation naming no module
    UnknownModule { fqn: String, node: NodeId },
    /// Constraint generation nested too deep (pathological input)
    DepthLimitExceeded { node: NodeId },
    /// Internal invariant violation (indicates a bug in the inference engine)
    InvariantViolation { msg: String },
}

impl std::fmt::Display for TypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TypeError::FrozenVariable { var, node } => match node {
                Some(node) => write!(f, "Type of node {} ({}) is already fixed", node, var),
                None => write!(f, "Type variable {} is already fixed", var),
            },
            TypeError::UnsupportedOperation { op, shape } => {
                write!(f, "Operation '{}' is not supported on {} types", op, shape)
            }
            TypeError::UnresolvedMessage {
                send,
                message,
                arity,
                receiver,
                span,
            } => {
                write!(
                    f,
                    "No method {}/{} for receiver {} (send {}",
                    message, arity, receiver, send
                )?;
                if let Some(span) = span {
                    write!(f, " at {}..{}", span.start, span.end)?;
                }
                write!(f, ")")
            }
            TypeError::MissingEnclosingMethod { node } => {
                write!(f, "Return {} is not inside a method", node)
            }
            TypeError::MissingEnclosingModule { node } => {
                write!(f, "Node {} refers to self outside of a module", node)
            }
            TypeError::UnknownModule { fqn, node } => {
                write!(f, "Unknown module '{}' declared by {}", fqn, node)
            }
            TypeError::DepthLimitExceeded { node } => {
                write!(
                    f,
                    "Type inference depth limit exceeded at {} (pathological input)",
                    node
                )
            }
            TypeError::InvariantViolation { msg } => {
                write!(f, "Internal error: {}", msg)
            }
        }
    }
}

impl std::error::Error for TypeError {}
