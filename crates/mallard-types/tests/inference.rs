//! Whole-program scenarios through the public API.

use mallard_ast::{Program, ProgramBuilder, ProgramGraph};
use mallard_types::{infer_program, InferConfig, TypeChecker, TypeError, UnresolvedPolicy};

#[test]
fn collection_protocol_comes_from_the_prelude() {
    let mut b = ProgramBuilder::new();
    let one = b.number(1.0);
    let two = b.number(2.0);
    let list = b.list(vec![one, two]);
    let l = b.variable("l", Some(list));
    let rl = b.reference(l);
    let size = b.send(rl, "size", vec![]);
    let rl2 = b.reference(l);
    let three = b.number(3.0);
    let add = b.send(rl2, "add", vec![three]);
    b.entry("main", vec![l, size, add]);
    let program = b.build().unwrap();

    let tc = infer_program(&program).unwrap();
    assert_eq!(tc.type_of(l), "List<Number>");
    assert_eq!(tc.type_of(size), "Number");
    assert_eq!(tc.type_of(add), "ANY");
}

#[test]
fn overriding_methods_win_over_inherited_ones() {
    let mut b = ProgramBuilder::new();
    let dots = b.string("...");
    let r = b.ret(Some(dots));
    let general = b.method("speak", vec![], vec![r]);
    let animal = b.class("Animal", vec![general]);
    let one = b.number(1.0);
    let r = b.ret(Some(one));
    let specific = b.method("speak", vec![], vec![r]);
    let duck = b.subclass("Duck", animal, vec![specific]);
    b.package("zoo", vec![animal, duck]);
    let new = b.new_instance(duck, vec![]);
    let call = b.send(new, "speak", vec![]);
    b.entry("main", vec![call]);
    let program = b.build().unwrap();

    let tc = infer_program(&program).unwrap();
    assert_eq!(tc.type_of(call), "Number");
}

#[test]
fn recursive_methods_reach_a_fixpoint() {
    // method count(n) { return if (n.even()) 0 else self.count(n) }
    let mut b = ProgramBuilder::new();
    let n = b.parameter("n");
    let rn = b.reference(n);
    let even = b.send(rn, "even", vec![]);
    let zero = b.number(0.0);
    let me = b.self_ref();
    let rn2 = b.reference(n);
    let again = b.send(me, "count", vec![rn2]);
    let branch = b.if_else(even, vec![zero], vec![again]);
    let ret = b.ret(Some(branch));
    let count = b.method("count", vec![n], vec![ret]);
    let counter = b.class("Counter", vec![count]);
    b.package("math", vec![counter]);
    let program = b.build().unwrap();

    let tc = infer_program(&program).unwrap();
    assert_eq!(tc.type_of(again), "Number");
    assert_eq!(tc.type_of(branch), "Number");
    assert_eq!(tc.type_of(n), "Number");
    assert_eq!(tc.type_of(count), "(Number) => Number");
}

#[test]
fn serialized_graphs_infer_like_built_ones() {
    let mut b = ProgramBuilder::new();
    let one = b.number(1.0);
    let two = b.number(2.0);
    let sum = b.send(one, "+", vec![two]);
    let x = b.variable("x", Some(sum));
    b.entry("main", vec![x]);
    let program = b.build().unwrap();

    let json = serde_json::to_string(&program).unwrap();
    let graph: ProgramGraph = serde_json::from_str(&json).unwrap();
    let reloaded = Program::from_graph(graph).unwrap();

    let built = infer_program(&program).unwrap();
    let loaded = infer_program(&reloaded).unwrap();
    for id in program.ids() {
        assert_eq!(built.type_of(id), loaded.type_of(id));
    }
    assert_eq!(loaded.type_of(x), "Number");
}

#[test]
fn collecting_reports_each_receiver_once() {
    let mut b = ProgramBuilder::new();
    let one = b.number(1.0);
    let text = b.string("a");
    let cond = b.boolean(true);
    let either = b.if_else(cond, vec![one], vec![text]);
    let v = b.variable("v", Some(either));
    let rv = b.reference(v);
    let quack = b.send(rv, "quack", vec![]);
    b.entry("main", vec![v, quack]);
    let program = b.build().unwrap();

    let config = InferConfig {
        unresolved: UnresolvedPolicy::Collect,
        ..InferConfig::default()
    };
    let mut tc = TypeChecker::with_config(&program, config);
    tc.infer().unwrap();

    let receivers: Vec<&str> = tc
        .diagnostics()
        .iter()
        .map(|d| match d {
            TypeError::UnresolvedMessage { receiver, .. } => receiver.as_str(),
            other => panic!("unexpected diagnostic {:?}", other),
        })
        .collect();
    assert_eq!(receivers, vec!["Number", "String"]);
    assert_eq!(tc.type_of(v), "(Number | String)");
}
