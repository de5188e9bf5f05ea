//! Canonical text rendering of validation failures.
//!
//! ```text
//! validating https://pod.example/profile as https://example.org/shapes#Profile:
//!     Missing property: http://www.w3.org/1999/02/22-rdf-syntax-ns#type
//!   OR
//!   Missing property: http://www.w3.org/1999/02/22-rdf-syntax-ns#type
//! ```

use crate::outcome::Failure;

const INDENT: usize = 4;

/// Render the failures of one node into lines: a header, then each failure
/// indented four spaces. Later branches of a failed disjunction are
/// introduced by an `OR` line and sit two columns further left.
pub fn render_failures(node: &str, shape: &str, failures: &[Failure]) -> Vec<String> {
    let mut lines = vec![format!("validating {node} as {shape}:")];
    render_into(failures, INDENT, &mut lines);
    lines
}

fn render_into(failures: &[Failure], indent: usize, lines: &mut Vec<String>) {
    for failure in failures {
        match failure {
            Failure::Alternatives(branches) => {
                let outdent = indent.saturating_sub(2);
                for (index, branch) in branches.iter().enumerate() {
                    if index == 0 {
                        render_into(branch, indent, lines);
                    } else {
                        lines.push(format!("{}OR", pad(outdent)));
                        render_into(branch, outdent, lines);
                    }
                }
            }
            Failure::ShapeReference { node, shape, failures } => {
                lines.push(format!("{}validating {node} as {shape}:", pad(indent)));
                render_into(failures, indent + INDENT, lines);
            }
            leaf => lines.push(format!("{}{leaf}", pad(indent))),
        }
    }
}

fn pad(width: usize) -> String {
    " ".repeat(width)
}
