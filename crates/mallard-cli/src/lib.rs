#![forbid(unsafe_code)]

pub mod report;

pub use report::{load_config, load_program, parse_program, type_rows, TypeRow};
