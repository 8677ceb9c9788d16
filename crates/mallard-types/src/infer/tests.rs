use super::{InferCtx, Solver, Type, TypeCtx};
use crate::config::InferConfig;
use mallard_ast::ast::NodeId;
use mallard_ast::{Program, ProgramBuilder};

struct Pond {
    program: Program,
    x: NodeId,
    call: NodeId,
}

/// Two unrelated classes answering `foo`, one that does not, and a method
/// that only sends `foo` to its parameter.
fn pond() -> Pond {
    let mut b = ProgramBuilder::new();

    let one = b.number(1.0);
    let r = b.ret(Some(one));
    let foo_a = b.method("foo", vec![], vec![r]);
    let a = b.class("A", vec![foo_a]);

    let text = b.string("a");
    let r = b.ret(Some(text));
    let foo_b = b.method("foo", vec![], vec![r]);
    let bb = b.class("B", vec![foo_b]);

    let bar = b.method("bar", vec![], vec![]);
    let c = b.class("C", vec![bar]);

    let x = b.parameter("x");
    let rx = b.reference(x);
    let call = b.send(rx, "foo", vec![]);
    let m = b.method("poke", vec![x], vec![call]);
    let client = b.class("Client", vec![m]);

    b.package("pond", vec![a, bb, c, client]);
    Pond {
        program: b.build().unwrap(),
        x,
        call,
    }
}

fn generated(program: &Program, config: &InferConfig) -> TypeCtx {
    let mut ctx = TypeCtx::new();
    InferCtx::new(program, &mut ctx, config).generate().unwrap();
    ctx
}

/// (lower bounds, upper bounds, supertypes) per variable.
fn sizes(ctx: &TypeCtx) -> Vec<(usize, usize, usize)> {
    ctx.iter()
        .map(|v| (v.min_types().len(), v.max_types().len(), v.supertypes().len()))
        .collect()
}

#[test]
fn bounds_never_shrink_between_steps() {
    let pond = pond();
    let config = InferConfig::default();
    let mut ctx = generated(&pond.program, &config);
    let mut before = sizes(&ctx);

    let mut solver = Solver::new(&pond.program, &mut ctx, &config);
    while solver.step().unwrap() {}
    drop(solver);

    let after = sizes(&ctx);
    assert_eq!(before.len(), after.len(), "solving creates no variables");
    for (b, a) in before.iter().zip(&after) {
        assert!(a.0 >= b.0 && a.1 >= b.1 && a.2 >= b.2);
    }

    before = after;
    let mut solver = Solver::new(&pond.program, &mut ctx, &config);
    assert!(solver.step().is_ok());
    drop(solver);
    assert_eq!(sizes(&ctx), before);
}

#[test]
fn every_step_of_a_solve_changes_something_but_the_last() {
    let pond = pond();
    let config = InferConfig::default();
    let mut ctx = generated(&pond.program, &config);

    let mut solver = Solver::new(&pond.program, &mut ctx, &config);
    solver.solve().unwrap();
    let rounds = solver.rounds();
    assert!(rounds > 1);
    assert!(!solver.step().unwrap());
    assert_eq!(solver.rounds(), rounds + 1);
}

#[test]
fn fixpoint_is_idempotent() {
    let pond = pond();
    let config = InferConfig::default();
    let mut ctx = generated(&pond.program, &config);

    Solver::new(&pond.program, &mut ctx, &config).solve().unwrap();
    let x = ctx.type_of_node(pond.x);
    let call = ctx.type_of_node(pond.call);

    let mut again = Solver::new(&pond.program, &mut ctx, &config);
    again.solve().unwrap();
    assert_eq!(again.rounds(), 1);
    drop(again);
    assert_eq!(ctx.type_of_node(pond.x), x);
    assert_eq!(ctx.type_of_node(pond.call), call);
}

#[test]
fn parameters_are_bounded_by_the_modules_that_understand_them() {
    let pond = pond();
    let config = InferConfig::default();
    let mut ctx = generated(&pond.program, &config);
    Solver::new(&pond.program, &mut ctx, &config).solve().unwrap();

    let a = pond.program.node_by_fqn("pond.A").unwrap();
    let b = pond.program.node_by_fqn("pond.B").unwrap();
    assert_eq!(
        ctx.type_of_node(pond.x),
        Type::Union(vec![Type::module(a), Type::module(b)])
    );
    let x = ctx.var(ctx.lookup(pond.x).unwrap());
    assert!(x.min_types().is_empty());
    assert_eq!(x.max_types().len(), 2);
}

#[test]
fn results_do_not_depend_on_the_run() {
    let first = pond();
    let second = pond();
    let config = InferConfig::default();

    let mut one = generated(&first.program, &config);
    Solver::new(&first.program, &mut one, &config).solve().unwrap();
    let mut two = generated(&second.program, &config);
    Solver::new(&second.program, &mut two, &config).solve().unwrap();

    let names = |ctx: &TypeCtx, program: &Program| -> Vec<String> {
        program
            .ids()
            .map(|id| ctx.type_of_node(id).name(ctx, program))
            .collect()
    };
    assert_eq!(names(&one, &first.program), names(&two, &second.program));
}
