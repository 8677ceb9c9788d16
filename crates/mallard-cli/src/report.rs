//! Loading serialized programs and rendering inference results.

use anyhow::{bail, Context, Result};
use mallard_ast::ast::NodeId;
use mallard_ast::{Program, ProgramBuilder, ProgramGraph};
use mallard_types::{InferConfig, TypeChecker, TypeError};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Maximum program graph size in bytes (16MB)
pub const MAX_GRAPH_SIZE: usize = 16_000_000;

pub fn load_program(path: &Path) -> Result<Program> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read program graph '{}'", path.display()))?;
    if json.len() > MAX_GRAPH_SIZE {
        bail!(
            "program graph exceeds {}MB limit ({} bytes)",
            MAX_GRAPH_SIZE / 1_000_000,
            json.len()
        );
    }
    let program = parse_program(&json)
        .with_context(|| format!("Invalid program graph '{}'", path.display()))?;
    debug!(path = %path.display(), nodes = program.len(), "loaded program graph");
    Ok(program)
}

pub fn parse_program(json: &str) -> Result<Program> {
    let graph: ProgramGraph = serde_json::from_str(json)?;
    Ok(Program::from_graph(graph)?)
}

pub fn load_config(path: &Path) -> Result<InferConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config '{}'", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Invalid config '{}'", path.display()))
}

/// The graph of a program holding nothing but the prelude.
pub fn prelude_graph() -> ProgramGraph {
    ProgramBuilder::new().into_graph()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeRow {
    pub node: NodeId,
    pub kind: &'static str,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: String,
}

/// One row per node that got a type variable, in node order. Nodes in
/// skipped namespaces are left out unless `all` is set.
pub fn type_rows(checker: &TypeChecker<'_>, all: bool) -> Vec<TypeRow> {
    let program = checker.program();
    let mut nodes: Vec<NodeId> = checker.ctx().iter().filter_map(|var| var.node()).collect();
    nodes.sort();
    nodes
        .into_iter()
        .filter(|node| all || !in_skipped_namespace(program, checker.config(), *node))
        .map(|node| {
            let kind = program.kind(node);
            TypeRow {
                node,
                kind: kind.kind_name(),
                name: kind.label().map(str::to_string),
                ty: checker.type_of(node),
            }
        })
        .collect()
}

fn in_skipped_namespace(program: &Program, config: &InferConfig, node: NodeId) -> bool {
    program
        .enclosing_package(node)
        .and_then(|package| program.fully_qualified_name(package))
        .is_some_and(|name| config.skips_package(&name))
}

/// `#12 Send foo : Number`, one line per row.
pub fn render_pretty(rows: &[TypeRow]) -> String {
    rows.iter()
        .map(|row| {
            format!(
                "{} {} {} : {}",
                row.node,
                row.kind,
                row.name.as_deref().unwrap_or("-"),
                row.ty
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_diagnostics(diagnostics: &[TypeError]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("warning: {}", d))
        .collect::<Vec<_>>()
        .join("\n")
}
