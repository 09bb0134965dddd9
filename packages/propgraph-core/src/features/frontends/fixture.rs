//! Line-based fixture frontend
//!
//! Parses a deliberately tiny language (extension `.sim`) so integration
//! tests can drive the orchestrator end to end without a real grammar:
//!
//! ```text
//! var <name> = <literal>
//! var <name> = <operand> <op> <operand>
//! print <name>
//! include <file>
//! ```
//!
//! where operands are names or integer/float literals and `<op>` is one of
//! the binary operator codes. `include` lines are followed only when the run
//! asks for it; `#` comment lines are skipped, or matched to the next
//! statement when the run asks for that.

use super::{FrontendOptions, LanguageFrontend};
use crate::errors::{PropGraphError, Result};
use crate::features::scopes::ScopeManager;
use crate::features::value_evaluation::Value;
use crate::graph::{AccessKind, BinaryOp, NodeId, PropertyGraph};
use crate::shared::models::{PhysicalLocation, Span};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Default)]
pub struct FixtureFrontend {
    types: Vec<String>,
}

impl FixtureFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_operand(
        &mut self,
        token: &str,
        graph: &mut PropertyGraph,
        scopes: &mut ScopeManager,
    ) -> NodeId {
        if let Some(value) = parse_literal(token) {
            self.record_type(&value);
            graph.literal(value)
        } else {
            let refers_to = scopes.resolve(token);
            graph.reference(token, refers_to, AccessKind::Read)
        }
    }

    fn record_type(&mut self, value: &Value) {
        let name = match value {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
        };
        if !self.types.iter().any(|t| t == name) {
            self.types.push(name.to_string());
        }
    }

    /// Parses `source` into the translation unit `tu`. Included files land
    /// in the same unit.
    #[allow(clippy::too_many_arguments)]
    fn parse_into(
        &mut self,
        path: &Path,
        source: &str,
        options: &FrontendOptions,
        graph: &mut PropertyGraph,
        scopes: &mut ScopeManager,
        tu: NodeId,
    ) -> Result<()> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut pending_comment: Option<String> = None;

        for (line_no, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix('#') {
                if options.match_comments_to_nodes {
                    let comment = comment.trim().to_string();
                    pending_comment = Some(match pending_comment.take() {
                        Some(existing) => format!("{existing}\n{comment}"),
                        None => comment,
                    });
                }
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if let ["include", target] = tokens.as_slice() {
                self.load_include(path, target, line_no, options, graph, scopes, tu)?;
                continue;
            }

            let statement = match tokens.as_slice() {
                ["var", name, "=", init] => {
                    let init = self.parse_operand(init, graph, scopes);
                    let decl = graph.variable_declaration(*name, Some(init))?;
                    scopes.add_declaration(*name, decl);
                    graph.declaration_statement(vec![decl])?
                }
                ["var", name, "=", lhs, op, rhs] => {
                    let op = parse_operator(op).ok_or_else(|| {
                        PropGraphError::parse(&file_name, format!("unknown operator `{op}`"))
                    })?;
                    let lhs = self.parse_operand(lhs, graph, scopes);
                    let rhs = self.parse_operand(rhs, graph, scopes);
                    let init = graph.binary_op(op, lhs, rhs)?;
                    let decl = graph.variable_declaration(*name, Some(init))?;
                    scopes.add_declaration(*name, decl);
                    graph.declaration_statement(vec![decl])?
                }
                ["print", name] => {
                    let arg = graph.reference(*name, scopes.resolve(name), AccessKind::Read);
                    graph.call("print", vec![arg])?
                }
                _ => {
                    return Err(PropGraphError::parse(
                        &file_name,
                        format!("cannot parse line {}: `{line}`", line_no + 1),
                    ))
                }
            };
            let line = line_no as u32 + 1;
            graph.set_location(
                statement,
                PhysicalLocation::new(path, Span::new(line, 0, line, raw.len() as u32)),
            );
            graph.set_code(statement, raw);
            if let Some(comment) = pending_comment.take() {
                graph.set_comment(statement, comment);
            }
            graph.append_statement(tu, statement)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn load_include(
        &mut self,
        from: &Path,
        target: &str,
        line_no: usize,
        options: &FrontendOptions,
        graph: &mut PropertyGraph,
        scopes: &mut ScopeManager,
        tu: NodeId,
    ) -> Result<()> {
        if !options.load_includes {
            debug!(include = target, "include loading disabled, skipping");
            return Ok(());
        }
        let resolved = options.resolve_include(from, target).ok_or_else(|| {
            PropGraphError::parse(
                from.to_string_lossy(),
                format!("cannot resolve include `{target}` at line {}", line_no + 1),
            )
        })?;
        if !options.include_allowed(&resolved) {
            debug!(file = %resolved.display(), "include filtered out");
            return Ok(());
        }
        let source = std::fs::read_to_string(&resolved)?;
        self.parse_into(&resolved, &source, options, graph, scopes, tu)
    }
}

fn parse_literal(token: &str) -> Option<Value> {
    if let Ok(i) = token.parse::<i64>() {
        return Some(Value::Int(i));
    }
    if let Ok(f) = token.parse::<f64>() {
        return Some(Value::Float(f));
    }
    None
}

fn parse_operator(token: &str) -> Option<BinaryOp> {
    use BinaryOp::*;
    Some(match token {
        "+" => Add,
        "-" => Sub,
        "*" => Mul,
        "/" => Div,
        "<<" => Shl,
        ">>" => Shr,
        "&" => BitAnd,
        "|" => BitOr,
        "^" => BitXor,
        ">" => Gt,
        ">=" => Ge,
        "<" => Lt,
        "<=" => Le,
        "==" => Eq,
        "!=" => Ne,
        _ => return None,
    })
}

impl LanguageFrontend for FixtureFrontend {
    fn name(&self) -> &'static str {
        "fixture"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["sim"]
    }

    fn registered_types(&self) -> Vec<String> {
        self.types.clone()
    }

    fn parse(
        &mut self,
        path: &Path,
        options: &FrontendOptions,
        graph: &mut PropertyGraph,
        scopes: &mut ScopeManager,
    ) -> Result<NodeId> {
        let source = std::fs::read_to_string(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let tu = graph.translation_unit(&file_name);
        self.parse_into(path, &source, options, graph, scopes, tu)?;
        Ok(tu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;
    use std::io::Write;

    fn parse_source(source: &str) -> (PropertyGraph, ScopeManager, NodeId) {
        parse_source_with(source, &FrontendOptions::default())
    }

    fn parse_source_with(
        source: &str,
        options: &FrontendOptions,
    ) -> (PropertyGraph, ScopeManager, NodeId) {
        let mut file = tempfile::Builder::new().suffix(".sim").tempfile().unwrap();
        file.write_all(source.as_bytes()).unwrap();

        let mut graph = PropertyGraph::new();
        let mut scopes = ScopeManager::new();
        let tu = FixtureFrontend::new()
            .parse(file.path(), options, &mut graph, &mut scopes)
            .unwrap();
        (graph, scopes, tu)
    }

    #[test]
    fn test_parse_declarations_and_references() {
        let (graph, scopes, tu) = parse_source("var a = 2\nvar b = a + 3\nprint b\n");

        assert_eq!(graph.ast_children(tu).len(), 3);
        let a = scopes.resolve("a").unwrap();
        assert!(matches!(
            graph.node(a).kind,
            NodeKind::VariableDeclaration { .. }
        ));

        // the reference inside `a + 3` is already resolved
        let resolved = graph.nodes().any(|n| {
            matches!(n.kind, NodeKind::Reference { refers_to: Some(d), .. } if d == a)
        });
        assert!(resolved);
    }

    #[test]
    fn test_parse_error_on_bad_line() {
        let mut file = tempfile::Builder::new().suffix(".sim").tempfile().unwrap();
        file.write_all(b"var = nope").unwrap();

        let mut graph = PropertyGraph::new();
        let mut scopes = ScopeManager::new();
        let err = FixtureFrontend::new()
            .parse(
                file.path(),
                &FrontendOptions::default(),
                &mut graph,
                &mut scopes,
            )
            .unwrap_err();
        assert!(matches!(err, PropGraphError::Parse { .. }));
    }

    #[test]
    fn test_includes_are_loaded_only_on_request() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lib.sim"), "var shared = 5\n").unwrap();
        let main = dir.path().join("main.sim");
        std::fs::write(&main, "include lib.sim\nprint shared\n").unwrap();

        let parse = |options: &FrontendOptions| {
            let mut graph = PropertyGraph::new();
            let mut scopes = ScopeManager::new();
            let tu = FixtureFrontend::new()
                .parse(&main, options, &mut graph, &mut scopes)
                .unwrap();
            (graph, scopes, tu)
        };

        // disabled: the include line is skipped
        let (graph, scopes, tu) = parse(&FrontendOptions::default());
        assert_eq!(graph.ast_children(tu).len(), 1);
        assert!(scopes.resolve("shared").is_none());

        // enabled: the included declaration lands in the same unit
        let options = FrontendOptions {
            load_includes: true,
            ..FrontendOptions::default()
        };
        let (graph, scopes, tu) = parse(&options);
        assert_eq!(graph.ast_children(tu).len(), 2);
        assert!(scopes.resolve("shared").is_some());

        // a blocklisted include is dropped again
        let options = FrontendOptions {
            load_includes: true,
            include_blocklist: vec![dir.path().to_path_buf()],
            ..FrontendOptions::default()
        };
        let (graph, _, tu) = parse(&options);
        assert_eq!(graph.ast_children(tu).len(), 1);
    }

    #[test]
    fn test_comments_match_to_the_next_statement_on_request() {
        let source = "# the answer\nvar a = 42\n";

        let options = FrontendOptions {
            match_comments_to_nodes: true,
            ..FrontendOptions::default()
        };
        let (graph, _, tu) = parse_source_with(source, &options);
        let statement = graph.ast_children(tu)[0];
        assert_eq!(graph.node(statement).comment.as_deref(), Some("the answer"));

        let (graph, _, tu) = parse_source(source);
        let statement = graph.ast_children(tu)[0];
        assert_eq!(graph.node(statement).comment, None);
    }
}
