// crates/mallard-types/src/infer/constraint.rs
// Constraint generation: one walk over the program graph that creates a
// type variable per relevant node and links them with bounds and edges.

use super::ctx::TypeCtx;
use super::ty::{Type, TypeVarId, ELEMENT, RETURN};
use super::var::PendingSend;
use crate::config::InferConfig;
use crate::error::TypeError;
use mallard_ast::ast::{
    Assignment, If, LiteralValue, Method, MessageSend, ModuleKind, NodeId, NodeKind,
};
use mallard_ast::Program;
use tracing::debug;

pub struct InferCtx<'a> {
    program: &'a Program,
    ctx: &'a mut TypeCtx,
    config: &'a InferConfig,
    depth: u32,
}

impl<'a> InferCtx<'a> {
    pub fn new(program: &'a Program, ctx: &'a mut TypeCtx, config: &'a InferConfig) -> Self {
        InferCtx {
            program,
            ctx,
            config,
            depth: 0,
        }
    }

    /// Declares every signature, then walks the program from its root.
    pub fn generate(&mut self) -> Result<(), TypeError> {
        self.declare_signatures()?;
        let root = self.program.root();
        self.visit(root)?;
        debug!(variables = self.ctx.len(), "constraints generated");
        Ok(())
    }

    /// Gives every method its signature and every singleton its own
    /// type, skipped packages included. Sends resolved during solving can
    /// then rely on these variables being there.
    fn declare_signatures(&mut self) -> Result<(), TypeError> {
        let program = self.program;
        for id in program.ids() {
            match program.kind(id) {
                NodeKind::Method(method) => {
                    self.declare_method(id, method)?;
                }
                NodeKind::Module(module) if module.module_kind == ModuleKind::Singleton => {
                    let var = self.ctx.var_for(id);
                    self.ctx.set_type(var, Type::module(id))?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn declare_method(&mut self, id: NodeId, method: &Method) -> Result<TypeVarId, TypeError> {
        if let Some(var) = self.ctx.lookup(id) {
            return Ok(var);
        }
        let params: Vec<TypeVarId> = method
            .parameters
            .iter()
            .map(|p| self.ctx.var_for(*p))
            .collect();
        let ret = self.ctx.fresh_synthetic("method return");
        let var = self.ctx.var_for(id);
        self.ctx.set_type(var, Type::method(&params, ret))?;

        if let Some(fqn) = &method.return_type {
            let module = self
                .program
                .node_by_fqn(fqn)
                .filter(|m| self.program.module(*m).is_some())
                .ok_or_else(|| TypeError::UnknownModule {
                    fqn: fqn.clone(),
                    node: id,
                })?;
            self.ctx.set_type(ret, Type::module(module))?;
        }
        Ok(var)
    }

    /// Enter a level of nesting
    fn enter_depth(&mut self, node: NodeId) -> Result<(), TypeError> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            Err(TypeError::DepthLimitExceeded { node })
        } else {
            Ok(())
        }
    }

    /// Exit a level of nesting
    fn exit_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Generates constraints for `id` and its subtree. Answers the node's
    /// variable, if the node has a value.
    pub fn visit(&mut self, id: NodeId) -> Result<Option<TypeVarId>, TypeError> {
        self.enter_depth(id)?;
        let result = self.visit_inner(id);
        self.exit_depth();
        result
    }

    fn visit_all(&mut self, ids: &[NodeId]) -> Result<(), TypeError> {
        for id in ids {
            self.visit(*id)?;
        }
        Ok(())
    }

    /// Visits an expression, always answering a variable.
    fn expr(&mut self, id: NodeId) -> Result<TypeVarId, TypeError> {
        match self.visit(id)? {
            Some(var) => Ok(var),
            None => Ok(self.ctx.var_for(id)),
        }
    }

    fn visit_inner(&mut self, id: NodeId) -> Result<Option<TypeVarId>, TypeError> {
        let program = self.program;
        match program.kind(id) {
            NodeKind::Root(root) => {
                self.visit_all(&root.members)?;
                Ok(None)
            }
            NodeKind::Package(package) => {
                let name = program
                    .fully_qualified_name(id)
                    .unwrap_or_else(|| package.name.clone());
                if self.config.skips_package(&name) {
                    debug!(package = %name, "skipping package");
                    return Ok(None);
                }
                self.visit_all(&package.imports)?;
                self.visit_all(&package.members)?;
                Ok(None)
            }
            NodeKind::Import(_) => Ok(None),
            NodeKind::Entry(entry) => {
                self.visit(entry.body)?;
                Ok(None)
            }
            NodeKind::Body(body) => {
                self.visit_all(&body.sentences)?;
                Ok(None)
            }
            NodeKind::Module(module) => {
                self.visit_all(&module.members)?;
                Ok(Some(self.ctx.var_for(id)))
            }
            NodeKind::Method(method) => {
                let var = self.declare_method(id, method)?;
                self.visit_all(&method.parameters)?;
                if let Some(body) = method.body {
                    self.visit(body)?;
                }
                Ok(Some(var))
            }
            NodeKind::Parameter(_) => Ok(Some(self.ctx.var_for(id))),
            NodeKind::Field(field) => self.infer_declaration(id, field.value),
            NodeKind::Variable(variable) => self.infer_declaration(id, variable.value),
            NodeKind::Send(send) => self.infer_send(id, send),
            NodeKind::Assignment(assignment) => self.infer_assignment(id, assignment),
            NodeKind::Return(ret) => self.infer_return(id, ret.value),
            NodeKind::If(branch) => self.infer_if(id, branch),
            NodeKind::Reference(reference) => {
                let target = self.ctx.var_for(reference.target);
                let var = self.ctx.var_for(id);
                self.ctx.is_supertype_of(var, target);
                Ok(Some(var))
            }
            NodeKind::SelfRef => self.infer_self(id),
            NodeKind::Super(call) => {
                for arg in &call.args {
                    self.expr(*arg)?;
                }
                self.infer_self(id)
            }
            NodeKind::Literal(literal) => self.infer_literal(id, &literal.value),
            NodeKind::New(new) => {
                for arg in &new.args {
                    self.expr(*arg)?;
                }
                let var = self.ctx.var_for(id);
                self.ctx.set_type(var, Type::module(new.instantiated))?;
                Ok(Some(var))
            }
            // Placeholders: a variable, no constraints, no descent.
            NodeKind::Throw(_) | NodeKind::Try(_) | NodeKind::NamedArgument(_) => {
                Ok(Some(self.ctx.var_for(id)))
            }
            NodeKind::Catch(_) => Ok(None),
        }
    }

    fn infer_declaration(
        &mut self,
        id: NodeId,
        value: Option<NodeId>,
    ) -> Result<Option<TypeVarId>, TypeError> {
        let value = value.map(|v| self.expr(v)).transpose()?;
        let var = self.ctx.var_for(id);
        if let Some(value) = value {
            self.ctx.is_supertype_of(var, value);
        }
        Ok(Some(var))
    }

    fn infer_send(&mut self, id: NodeId, send: &MessageSend) -> Result<Option<TypeVarId>, TypeError> {
        let receiver = self.expr(send.receiver)?;
        let args = send
            .args
            .iter()
            .map(|arg| self.expr(*arg))
            .collect::<Result<Vec<_>, _>>()?;
        let result = self.ctx.var_for(id);
        self.ctx.add_send(
            receiver,
            PendingSend {
                send: id,
                message: send.message.clone(),
                arity: send.args.len(),
                args,
                result,
            },
        );
        Ok(Some(result))
    }

    /// The assigned declaration takes the value's types; the assignment
    /// itself is a statement.
    fn infer_assignment(
        &mut self,
        id: NodeId,
        assignment: &Assignment,
    ) -> Result<Option<TypeVarId>, TypeError> {
        let target = self.expr(assignment.variable)?;
        let value = self.expr(assignment.value)?;
        let declaration = match self.program.kind(assignment.variable) {
            NodeKind::Reference(reference) => self.ctx.var_for(reference.target),
            _ => target,
        };
        self.ctx.is_supertype_of(declaration, value);
        let var = self.ctx.var_for(id);
        self.ctx.set_type(var, Type::void())?;
        Ok(Some(var))
    }

    fn infer_return(
        &mut self,
        id: NodeId,
        value: Option<NodeId>,
    ) -> Result<Option<TypeVarId>, TypeError> {
        let program = self.program;
        let method_id = program
            .enclosing_method(id)
            .ok_or(TypeError::MissingEnclosingMethod { node: id })?;
        let method = program
            .method(method_id)
            .ok_or_else(|| TypeError::InvariantViolation {
                msg: format!("enclosing method {} is not a method", method_id),
            })?;
        let method_var = self.declare_method(method_id, method)?;
        let ret = self.ctx.at_param(method_var, RETURN)?;
        match value {
            Some(value) => {
                let value = self.expr(value)?;
                self.ctx.is_supertype_of(ret, value);
            }
            None => self.ctx.set_type(ret, Type::void())?,
        }
        let var = self.ctx.var_for(id);
        self.ctx.set_type(var, Type::void())?;
        Ok(Some(var))
    }

    /// Conditions must be booleans; the `if` takes the value of the last
    /// sentence of each non-empty branch.
    fn infer_if(&mut self, id: NodeId, branch: &If) -> Result<Option<TypeVarId>, TypeError> {
        let condition = self.expr(branch.condition)?;
        let boolean = self.program.builtins().boolean;
        self.ctx.add_max_type(condition, Type::module(boolean))?;

        self.visit(branch.then_body)?;
        self.visit(branch.else_body)?;

        let var = self.ctx.var_for(id);
        for body in [branch.then_body, branch.else_body] {
            if let NodeKind::Body(body) = self.program.kind(body) {
                if let Some(last) = body.sentences.last() {
                    let last = self.ctx.var_for(*last);
                    self.ctx.is_supertype_of(var, last);
                }
            }
        }
        Ok(Some(var))
    }

    /// `self` and `super` have the type of the enclosing module, looking
    /// through closures.
    fn infer_self(&mut self, id: NodeId) -> Result<Option<TypeVarId>, TypeError> {
        let module = self
            .program
            .enclosing_module(id)
            .ok_or(TypeError::MissingEnclosingModule { node: id })?;
        let var = self.ctx.var_for(id);
        self.ctx.set_type(var, Type::module(module))?;
        Ok(Some(var))
    }

    fn infer_literal(
        &mut self,
        id: NodeId,
        value: &LiteralValue,
    ) -> Result<Option<TypeVarId>, TypeError> {
        let builtins = *self.program.builtins();
        let ty = match value {
            LiteralValue::Number(_) => Some(Type::module(builtins.number)),
            LiteralValue::String(_) => Some(Type::module(builtins.string)),
            LiteralValue::Boolean(_) => Some(Type::module(builtins.boolean)),
            LiteralValue::Null => None,
            LiteralValue::Collection { module, elements } => {
                let element = self.ctx.fresh_synthetic("collection element");
                for e in elements {
                    let e = self.expr(*e)?;
                    self.ctx.is_supertype_of(element, e);
                }
                Some(Type::parametric(
                    *module,
                    vec![(ELEMENT.to_string(), element)],
                ))
            }
        };
        let var = self.ctx.var_for(id);
        if let Some(ty) = ty {
            self.ctx.set_type(var, ty)?;
        }
        Ok(Some(var))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mallard_ast::ProgramBuilder;

    fn generate(program: &Program, config: &InferConfig) -> Result<TypeCtx, TypeError> {
        let mut ctx = TypeCtx::new();
        InferCtx::new(program, &mut ctx, config).generate()?;
        Ok(ctx)
    }

    #[test]
    fn every_method_gets_a_signature() {
        let mut b = ProgramBuilder::new();
        let x = b.parameter("x");
        let rx = b.reference(x);
        let m = b.method("echo", vec![x], vec![rx]);
        let echo = b.class("Echo", vec![m]);
        b.package("app", vec![echo]);
        let lang = *b.lang();
        let program = b.build().unwrap();
        let ctx = generate(&program, &InferConfig::default()).unwrap();

        let sig = ctx.ty(ctx.lookup(m).unwrap());
        assert_eq!(sig.at_param("PARAM0").unwrap(), ctx.lookup(x).unwrap());
        assert!(ctx.var(sig.at_param(RETURN).unwrap()).is_synthetic());

        // prelude methods are declared even though their package is skipped
        let plus = program
            .lookup_method(lang.number, "+", 1, Default::default())
            .unwrap();
        let ret = ctx.at_param(ctx.lookup(plus).unwrap(), RETURN).unwrap();
        assert_eq!(ctx.ty(ret), Type::module(lang.number));
    }

    #[test]
    fn skipped_packages_get_no_constraints() {
        let mut b = ProgramBuilder::new();
        let one = b.number(1.0);
        let v = b.variable("v", Some(one));
        b.package("mallard.extra", vec![]);
        let m = b.method("run", vec![], vec![v]);
        let c = b.class("Hidden", vec![m]);
        b.package("mallard.extra.deep", vec![c]);
        let program = b.build().unwrap();
        let ctx = generate(&program, &InferConfig::default()).unwrap();

        assert!(ctx.lookup(m).is_some());
        assert!(ctx.lookup(v).is_none());
        assert!(ctx.lookup(one).is_none());
    }

    #[test]
    fn unknown_return_annotations_are_reported() {
        let mut b = ProgramBuilder::new();
        let m = b.native_method("weird", vec![], Some("app.Nowhere"));
        let c = b.class("Weird", vec![m]);
        b.package("app", vec![c]);
        let program = b.build().unwrap();

        let err = generate(&program, &InferConfig::default()).unwrap_err();
        assert_eq!(
            err,
            TypeError::UnknownModule {
                fqn: "app.Nowhere".to_string(),
                node: m,
            }
        );
    }

    #[test]
    fn return_outside_a_method_is_an_error() {
        let mut b = ProgramBuilder::new();
        let r = b.ret(None);
        b.entry("main", vec![r]);
        let program = b.build().unwrap();

        let err = generate(&program, &InferConfig::default()).unwrap_err();
        assert_eq!(err, TypeError::MissingEnclosingMethod { node: r });
    }

    #[test]
    fn self_outside_a_module_is_an_error() {
        let mut b = ProgramBuilder::new();
        let s = b.self_ref();
        b.entry("main", vec![s]);
        let program = b.build().unwrap();

        let err = generate(&program, &InferConfig::default()).unwrap_err();
        assert_eq!(err, TypeError::MissingEnclosingModule { node: s });
    }

    #[test]
    fn depth_limit_prevents_stack_overflow() {
        let mut b = ProgramBuilder::new();
        let mut expr = b.number(0.0);
        for _ in 0..40 {
            let one = b.number(1.0);
            expr = b.send(one, "+", vec![expr]);
        }
        b.entry("main", vec![expr]);
        let program = b.build().unwrap();

        let config = InferConfig {
            max_depth: 16,
            ..InferConfig::default()
        };
        let result = generate(&program, &config);
        assert!(matches!(result, Err(TypeError::DepthLimitExceeded { .. })));
        assert!(generate(&program, &InferConfig::default()).is_ok());
    }

    #[test]
    fn placeholders_do_not_descend() {
        let mut b = ProgramBuilder::new();
        let one = b.number(1.0);
        let p = b.parameter("e");
        let catch = b.catch(p, None, vec![]);
        let t = b.try_catch(vec![one], vec![catch], None);
        b.entry("main", vec![t]);
        let program = b.build().unwrap();
        let ctx = generate(&program, &InferConfig::default()).unwrap();

        assert!(ctx.type_of_node(t).is_any());
        assert!(ctx.lookup(one).is_none());
        assert!(ctx.lookup(p).is_none());
    }
}
