//! Constraint solver
//!
//! Runs the propagation rules over the variable graph until none of them
//! changes anything. Each step tries the rules in priority order and stops
//! at the first one that makes progress:
//!
//! 1. lower bounds flow to supertypes, upper bounds flow to subtypes;
//! 2. messages sent to typed receivers are bound to the answering method;
//! 3. receivers with no lower bound get an upper bound from every module
//!    that understands all their messages.
//!
//! Bounds only grow and are drawn from a finite set of types, so the loop
//! terminates.

use super::ctx::TypeCtx;
use super::ty::{Type, TypeVarId, RETURN};
use super::var::PendingSend;
use crate::config::{InferConfig, UnresolvedPolicy};
use crate::error::TypeError;
use mallard_ast::ast::NodeId;
use mallard_ast::{LookupOptions, Program};
use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};

pub struct Solver<'a> {
    program: &'a Program,
    ctx: &'a mut TypeCtx,
    config: &'a InferConfig,
    modules: Vec<NodeId>,
    rounds: usize,
    diagnostics: Vec<TypeError>,
    reported: FxHashSet<(NodeId, String)>,
}

impl<'a> Solver<'a> {
    pub fn new(program: &'a Program, ctx: &'a mut TypeCtx, config: &'a InferConfig) -> Self {
        Solver {
            program,
            ctx,
            config,
            modules: program.modules().map(|(id, _)| id).collect(),
            rounds: 0,
            diagnostics: Vec::new(),
            reported: FxHashSet::default(),
        }
    }

    /// Steps until a fixpoint is reached.
    pub fn solve(&mut self) -> Result<(), TypeError> {
        while self.step()? {}
        info!(
            rounds = self.rounds,
            variables = self.ctx.len(),
            unresolved = self.diagnostics.len(),
            "type inference reached a fixpoint"
        );
        Ok(())
    }

    /// Applies the first rule that makes progress. Answers whether
    /// anything changed.
    pub fn step(&mut self) -> Result<bool, TypeError> {
        self.rounds += 1;
        Ok(self.propagate()? || self.bind_messages()? || self.max_types_from_messages()?)
    }

    /// Steps taken so far, the final no-op one included.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn diagnostics(&self) -> &[TypeError] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<TypeError> {
        self.diagnostics
    }

    fn var_ids(&self) -> impl Iterator<Item = TypeVarId> {
        (0..self.ctx.len()).map(|i| TypeVarId(i as u32))
    }

    fn propagate(&mut self) -> Result<bool, TypeError> {
        let mut changed = false;
        for id in self.var_ids() {
            changed |= self.propagate_min_types(id)?;
            changed |= self.propagate_max_types(id)?;
        }
        Ok(changed)
    }

    fn propagate_min_types(&mut self, id: TypeVarId) -> Result<bool, TypeError> {
        let var = self.ctx.var(id);
        if var.min_types().is_empty() || var.supertypes().is_empty() {
            return Ok(false);
        }
        let types = var.min_types().to_vec();
        let targets = var.supertypes().to_vec();
        let mut changed = false;
        for ty in &types {
            for target in &targets {
                if !self.ctx.has_type(*target, ty)? && self.ctx.add_min_type(*target, ty.clone())? {
                    debug!(from = %id, to = %target, ty = ?ty, "propagated min type");
                    changed = true;
                }
            }
        }
        Ok(changed)
    }

    fn propagate_max_types(&mut self, id: TypeVarId) -> Result<bool, TypeError> {
        let var = self.ctx.var(id);
        if var.max_types().is_empty() || var.subtypes().is_empty() {
            return Ok(false);
        }
        let types = var.max_types().to_vec();
        let targets = var.subtypes().to_vec();
        let mut changed = false;
        for ty in &types {
            for target in &targets {
                if !self.ctx.has_type(*target, ty)? && self.ctx.add_max_type(*target, ty.clone())? {
                    debug!(from = %id, to = %target, ty = ?ty, "propagated max type");
                    changed = true;
                }
            }
        }
        Ok(changed)
    }

    /// For every typed receiver, links the return slot of each answering
    /// method to the value of the send.
    fn bind_messages(&mut self) -> Result<bool, TypeError> {
        let program = self.program;
        let mut changed = false;
        for id in self.var_ids() {
            let var = self.ctx.var(id);
            if var.sends().is_empty() || var.has_any_type()? {
                continue;
            }
            let ty = var.ty();
            let sends = var.sends().to_vec();
            for receiver in ty.as_list() {
                for send in &sends {
                    let method = receiver.lookup_method(
                        program,
                        &send.message,
                        send.arity,
                        LookupOptions::allowing_abstract(),
                    )?;
                    let Some(method) = method else {
                        let receiver = receiver.name(self.ctx, program);
                        self.unresolved(send, receiver)?;
                        continue;
                    };
                    let signature = self.ctx.lookup(method).ok_or_else(|| {
                        TypeError::InvariantViolation {
                            msg: format!("method {} has no declared signature", method),
                        }
                    })?;
                    let ret = self.ctx.at_param(signature, RETURN)?;
                    if self.ctx.add_supertype_edge(ret, send.result) {
                        debug!(send = %send.send, message = %send.message, %method, "bound message");
                        changed = true;
                    }
                }
            }
        }
        Ok(changed)
    }

    /// Receivers known only through the messages they get are bounded by
    /// every module that understands all of them.
    fn max_types_from_messages(&mut self) -> Result<bool, TypeError> {
        let program = self.program;
        let options = LookupOptions::allowing_abstract();
        let mut changed = false;
        for id in self.var_ids() {
            let var = self.ctx.var(id);
            if var.sends().is_empty() || !var.min_types().is_empty() {
                continue;
            }
            let sends = var.sends().to_vec();

            for send in &sends {
                let understood = self.modules.iter().any(|module| {
                    program
                        .lookup_method(*module, &send.message, send.arity, options)
                        .is_some()
                });
                if !understood {
                    let receiver = self.ctx.name_of(id, program);
                    self.unresolved(send, receiver)?;
                }
            }

            let candidates: Vec<NodeId> = self
                .modules
                .iter()
                .copied()
                .filter(|module| {
                    sends.iter().all(|send| {
                        program
                            .lookup_method(*module, &send.message, send.arity, options)
                            .is_some()
                    })
                })
                .collect();
            for module in candidates {
                let ty = Type::module(module);
                if !self.ctx.has_type(id, &ty)? && self.ctx.add_max_type(id, ty)? {
                    debug!(var = %id, module = %program.module_name(module), "max type from messages");
                    changed = true;
                }
            }
        }
        Ok(changed)
    }

    fn unresolved(&mut self, send: &PendingSend, receiver: String) -> Result<(), TypeError> {
        let error = TypeError::UnresolvedMessage {
            send: send.send,
            message: send.message.clone(),
            arity: send.arity,
            receiver: receiver.clone(),
            span: self.program.node(send.send).span,
        };
        match self.config.unresolved {
            UnresolvedPolicy::Abort => Err(error),
            UnresolvedPolicy::Collect => {
                if self.reported.insert((send.send, receiver)) {
                    warn!(%error, "unresolved message");
                    self.diagnostics.push(error);
                }
                Ok(())
            }
        }
    }
}
