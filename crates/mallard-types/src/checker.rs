// crates/mallard-types/src/checker.rs
// Entry point for callers: runs generation and solving over a program and
// answers per-node type queries.

use super::config::InferConfig;
use super::error::TypeError;
use super::infer::ty::Type;
use super::infer::var::TypeVariable;
use super::infer::{InferCtx, Solver, TypeCtx};
use mallard_ast::ast::NodeId;
use mallard_ast::Program;
use tracing::debug;

/// Type checker bound to one program
pub struct TypeChecker<'p> {
    program: &'p Program,
    config: InferConfig,
    ctx: TypeCtx,
    diagnostics: Vec<TypeError>,
    rounds: usize,
}

impl<'p> TypeChecker<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self::with_config(program, InferConfig::default())
    }

    pub fn with_config(program: &'p Program, config: InferConfig) -> Self {
        Self {
            program,
            config,
            ctx: TypeCtx::new(),
            diagnostics: Vec::new(),
            rounds: 0,
        }
    }

    /// Infers types for the whole program.
    ///
    /// Every call starts over from an empty context; results of a previous
    /// run are discarded. Unresolved messages either abort or end up in
    /// [`TypeChecker::diagnostics`], depending on the configured policy.
    pub fn infer(&mut self) -> Result<(), TypeError> {
        self.ctx = TypeCtx::new();
        self.diagnostics.clear();
        self.rounds = 0;

        InferCtx::new(self.program, &mut self.ctx, &self.config).generate()?;
        debug!(variables = self.ctx.len(), "solving constraints");

        let mut solver = Solver::new(self.program, &mut self.ctx, &self.config);
        solver.solve()?;
        self.rounds = solver.rounds();
        self.diagnostics = solver.into_diagnostics();
        Ok(())
    }

    /// Rendered type of `node`: `"ANY"` when nothing is known about it.
    pub fn type_of(&self, node: NodeId) -> String {
        self.resolved_type(node).name(&self.ctx, self.program)
    }

    pub fn resolved_type(&self, node: NodeId) -> Type {
        self.ctx.type_of_node(node)
    }

    pub fn type_variable(&self, node: NodeId) -> Option<&TypeVariable> {
        self.ctx.lookup(node).map(|id| self.ctx.var(id))
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn config(&self) -> &InferConfig {
        &self.config
    }

    pub fn ctx(&self) -> &TypeCtx {
        &self.ctx
    }

    pub fn diagnostics(&self) -> &[TypeError] {
        &self.diagnostics
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }
}

/// Runs inference with the default configuration.
pub fn infer_program(program: &Program) -> Result<TypeChecker<'_>, TypeError> {
    let mut checker = TypeChecker::new(program);
    checker.infer()?;
    Ok(checker)
}
