//! Textual edge notation.
//!
//! An edge is written `A <m1>-<m2> B` where each mark is `-` (tail), `>`/`<`
//! (arrow) or `o` (circle), e.g. `X --> Y`, `X <-> Y`, `X o-> Y`.

use serde::{Deserialize, Serialize};

use super::Endpoint;
use crate::error::GraphError;

/// Serialized shape of a graph: node names plus edges in notation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Node names in id order.
    pub nodes: Vec<String>,
    /// Edges in insertion order, e.g. `"X --> Y"`.
    #[serde(default)]
    pub edges: Vec<String>,
}

fn invalid(input: &str, reason: impl Into<String>) -> GraphError {
    GraphError::InvalidEdgeNotation {
        input: input.to_string(),
        reason: reason.into(),
    }
}

/// Parses `"A --> B"` into `(A, mark at A, mark at B, B)`.
pub fn parse_edge(input: &str) -> Result<(String, Endpoint, Endpoint, String), GraphError> {
    let mut parts = input.split_whitespace();
    let (Some(a), Some(mark), Some(b), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid(input, "expected '<node> <mark> <node>'"));
    };

    let chars: Vec<char> = mark.chars().collect();
    let [left, middle, right] = chars.as_slice() else {
        return Err(invalid(input, "edge mark must be three characters"));
    };
    if *middle != '-' {
        return Err(invalid(input, "unknown edge mark"));
    }
    let at_a = match left {
        '<' => Endpoint::Arrow,
        '-' => Endpoint::Tail,
        'o' => Endpoint::Circle,
        _ => return Err(invalid(input, "unknown edge mark")),
    };
    let at_b = match right {
        '>' => Endpoint::Arrow,
        '-' => Endpoint::Tail,
        'o' => Endpoint::Circle,
        _ => return Err(invalid(input, "unknown edge mark")),
    };
    Ok((a.to_string(), at_a, at_b, b.to_string()))
}

/// Formats an edge as `"A <mark> B"`.
#[must_use]
pub fn format_edge(a: &str, at_a: Endpoint, at_b: Endpoint, b: &str) -> String {
    let left = match at_a {
        Endpoint::Tail => '-',
        Endpoint::Arrow => '<',
        Endpoint::Circle => 'o',
    };
    let right = match at_b {
        Endpoint::Tail => '-',
        Endpoint::Arrow => '>',
        Endpoint::Circle => 'o',
    };
    format!("{a} {left}-{right} {b}")
}
