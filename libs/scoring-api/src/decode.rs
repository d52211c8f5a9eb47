//! Response decoding

use crate::literal::{parse_literal, Literal};
use crate::models::ScoreTriple;
use crate::ScoringError;

/// Decode a scoring response body.
///
/// The body is double encoded: the outer JSON value is a string, and that
/// string holds a list literal of `[id_a, id_b, score]` triples. Triples are
/// returned in server order; nothing is re-sorted.
pub fn decode_score_response(body: &str) -> Result<Vec<ScoreTriple>, ScoringError> {
    let inner: String = serde_json::from_str(body)?;
    decode_triple_list(&inner)
}

/// Decode the inner list literal once the JSON string layer is removed
pub fn decode_triple_list(literal: &str) -> Result<Vec<ScoreTriple>, ScoringError> {
    let items = match parse_literal(literal)? {
        Literal::List(items) => items,
        _ => {
            return Err(ScoringError::Literal {
                offset: 0,
                message: "expected a list of triples".to_string(),
            })
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| to_triple(index, item))
        .collect()
}

fn to_triple(index: usize, item: &Literal) -> Result<ScoreTriple, ScoringError> {
    let fields = match item {
        Literal::List(fields) if fields.len() == 3 => fields,
        Literal::List(fields) => {
            return Err(ScoringError::Triple {
                index,
                message: format!("expected 3 fields, got {}", fields.len()),
            })
        }
        _ => {
            return Err(ScoringError::Triple {
                index,
                message: "expected a list or tuple".to_string(),
            })
        }
    };

    let text = |field: &Literal, name: &str| {
        field.as_text().ok_or_else(|| ScoringError::Triple {
            index,
            message: format!("{} must be a string or number", name),
        })
    };

    Ok(ScoreTriple {
        id_a: text(&fields[0], "id_a")?,
        id_b: text(&fields[1], "id_b")?,
        score: fields[2].as_f64().ok_or_else(|| ScoringError::Triple {
            index,
            message: "score must be numeric".to_string(),
        })?,
    })
}
