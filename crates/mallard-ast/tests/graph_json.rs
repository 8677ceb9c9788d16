//! The serialized graph is the interchange format with external front ends.

use mallard_ast::ast::{NodeKind, NodeId};
use mallard_ast::{Program, ProgramBuilder, ProgramGraph};

#[test]
fn serialized_program_links_back_to_the_same_graph() {
    let mut b = ProgramBuilder::new();
    let x = b.parameter("x");
    let rx = b.reference(x);
    let quack = b.send(rx, "quack", vec![]);
    let m = b.method("poke", vec![x], vec![quack]);
    let duck = b.class("Duck", vec![m]);
    b.package("pond", vec![duck]);
    let program = b.build().expect("build failed");

    let json = serde_json::to_string(&program).expect("serialize");
    let graph: ProgramGraph = serde_json::from_str(&json).expect("deserialize");
    let reloaded = Program::from_graph(graph).expect("link failed");

    assert_eq!(reloaded.graph(), program.graph());
    assert_eq!(reloaded.parent(rx), Some(quack));
    assert_eq!(reloaded.node_by_fqn("pond.Duck"), Some(duck));
}

#[test]
fn nodes_are_tagged_by_kind() {
    let json = r#"{ "kind": "Send", "receiver": 3, "message": "quack", "args": [] }"#;
    let node: mallard_ast::ast::Node = serde_json::from_str(json).expect("deserialize");
    match node.kind {
        NodeKind::Send(send) => {
            assert_eq!(send.receiver, NodeId(3));
            assert_eq!(send.message, "quack");
        }
        other => panic!("expected a send, got {:?}", other),
    }
    assert!(node.span.is_none());
}

#[test]
fn self_references_carry_no_payload() {
    let json = r#"{ "kind": "SelfRef", "span": { "start": 4, "end": 8 } }"#;
    let node: mallard_ast::ast::Node = serde_json::from_str(json).expect("deserialize");
    assert_eq!(node.kind, NodeKind::SelfRef);
    assert_eq!(node.span.map(|s| s.end), Some(8));
}
