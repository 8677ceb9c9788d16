#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]

pub mod span {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Span {
        pub start: u32,
        pub end: u32,
    }
}

pub mod ast;
pub mod builder;
mod lookup;
pub mod prelude;
mod program;

pub use builder::ProgramBuilder;
pub use lookup::LookupOptions;
pub use program::{Ancestors, Builtins, LinkError, Program, ProgramGraph, LANG_NAMESPACE};
