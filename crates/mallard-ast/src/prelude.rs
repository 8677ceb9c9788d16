//! The `mallard.lang` package: built-in modules with native methods.
//!
//! Native methods carry return-type annotations so that sends into the
//! prelude resolve to concrete types without analyzing any method body.

use crate::ast::{ModuleKind, NodeId};
use crate::builder::ProgramBuilder;
use crate::program::LANG_NAMESPACE;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LangModules {
    pub package: NodeId,
    pub object: NodeId,
    pub number: NodeId,
    pub string: NodeId,
    pub boolean: NodeId,
    pub collection: NodeId,
    pub list: NodeId,
    pub set: NodeId,
    pub exception: NodeId,
    pub closure: NodeId,
}

const NUMBER: &str = "mallard.lang.Number";
const STRING: &str = "mallard.lang.String";
const BOOLEAN: &str = "mallard.lang.Boolean";

/// (message, parameter count, return type)
type Signature = (&'static str, usize, Option<&'static str>);

const OBJECT_METHODS: &[Signature] = &[
    ("==", 1, Some(BOOLEAN)),
    ("!=", 1, Some(BOOLEAN)),
    ("identity", 0, Some(NUMBER)),
    ("toString", 0, Some(STRING)),
    ("className", 0, Some(STRING)),
];

const NUMBER_METHODS: &[Signature] = &[
    ("+", 1, Some(NUMBER)),
    ("-", 1, Some(NUMBER)),
    ("*", 1, Some(NUMBER)),
    ("/", 1, Some(NUMBER)),
    ("%", 1, Some(NUMBER)),
    ("<", 1, Some(BOOLEAN)),
    (">", 1, Some(BOOLEAN)),
    ("<=", 1, Some(BOOLEAN)),
    (">=", 1, Some(BOOLEAN)),
    ("abs", 0, Some(NUMBER)),
    ("max", 1, Some(NUMBER)),
    ("min", 1, Some(NUMBER)),
    ("even", 0, Some(BOOLEAN)),
];

const STRING_METHODS: &[Signature] = &[
    ("+", 1, Some(STRING)),
    ("size", 0, Some(NUMBER)),
    ("isEmpty", 0, Some(BOOLEAN)),
    ("toUpperCase", 0, Some(STRING)),
    ("startsWith", 1, Some(BOOLEAN)),
];

const BOOLEAN_METHODS: &[Signature] = &[
    ("&&", 1, Some(BOOLEAN)),
    ("and", 1, Some(BOOLEAN)),
    ("||", 1, Some(BOOLEAN)),
    ("or", 1, Some(BOOLEAN)),
    ("negate", 0, Some(BOOLEAN)),
];

const COLLECTION_METHODS: &[Signature] = &[
    ("size", 0, Some(NUMBER)),
    ("isEmpty", 0, Some(BOOLEAN)),
    ("contains", 1, Some(BOOLEAN)),
    ("add", 1, None),
    ("remove", 1, None),
    ("anyOne", 0, None),
];

const LIST_METHODS: &[Signature] = &[("first", 0, None), ("last", 0, None), ("get", 1, None)];

const EXCEPTION_METHODS: &[Signature] = &[("message", 0, Some(STRING))];

pub(crate) fn install(b: &mut ProgramBuilder) -> LangModules {
    let object_members = natives(b, OBJECT_METHODS);
    let object = b.module(ModuleKind::Class, Some("Object"), None, vec![], object_members);

    let number = class(b, "Number", object, NUMBER_METHODS);
    let string = class(b, "String", object, STRING_METHODS);
    let boolean = class(b, "Boolean", object, BOOLEAN_METHODS);
    let collection = class(b, "Collection", object, COLLECTION_METHODS);
    let list = class(b, "List", collection, LIST_METHODS);
    let set = class(b, "Set", collection, &[]);
    let exception = class(b, "Exception", object, EXCEPTION_METHODS);

    let args = b.vararg_parameter("args");
    let apply = b.native_method("apply", vec![args], None);
    let closure = b.module(ModuleKind::Class, Some("Closure"), Some(object), vec![], vec![apply]);

    let package = b.package(
        LANG_NAMESPACE,
        vec![
            object, number, string, boolean, collection, list, set, exception, closure,
        ],
    );

    LangModules {
        package,
        object,
        number,
        string,
        boolean,
        collection,
        list,
        set,
        exception,
        closure,
    }
}

fn class(b: &mut ProgramBuilder, name: &str, superclass: NodeId, methods: &[Signature]) -> NodeId {
    let members = natives(b, methods);
    b.module(ModuleKind::Class, Some(name), Some(superclass), vec![], members)
}

fn natives(b: &mut ProgramBuilder, methods: &[Signature]) -> Vec<NodeId> {
    methods
        .iter()
        .map(|(name, arity, return_type)| {
            let parameters = (0..*arity)
                .map(|i| b.parameter(&format!("p{}", i)))
                .collect();
            b.native_method(name, parameters, *return_type)
        })
        .collect()
}
