//! Filter evaluation for in-memory documents.
//!
//! This module evaluates MongoDB-style filter documents (`{"age": {"$gte": 21}}`)
//! against stored BSON documents. It covers the commonly used query operators:
//! comparisons, set membership, existence, array operators, regular
//! expressions and the logical combinators.

use std::cmp::Ordering;
use bson::{Bson, DateTime, Document, oid::ObjectId};
use regex::{Regex, RegexBuilder};

use doctext_core::error::{DocTextError, DocTextResult};

/// Server error code reported for malformed query operators.
pub(crate) const BAD_VALUE: i32 = 2;

/// Comparable view of a BSON value.
///
/// Numeric types are normalized to `f64` so that `Int32(3)`, `Int64(3)` and
/// `Double(3.0)` compare equal, as they do on the server. Variants are
/// declared in the server's canonical cross-type sort order.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Number(f64),
    String(&'a str),
    Document(&'a Document),
    Array(&'a [Bson]),
    ObjectId(ObjectId),
    Bool(bool),
    DateTime(DateTime),
    /// Types without a meaningful in-memory ordering.
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null | Bson::Undefined => Comparable::Null,
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Document(doc) => Comparable::Document(doc),
            Bson::Array(arr) => Comparable::Array(arr),
            Bson::ObjectId(oid) => Comparable::ObjectId(*oid),
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> Comparable<'a> {
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 1,
            Comparable::Number(_) => 2,
            Comparable::String(_) => 3,
            Comparable::Document(_) => 4,
            Comparable::Array(_) => 5,
            Comparable::ObjectId(_) => 7,
            Comparable::Bool(_) => 8,
            Comparable::DateTime(_) => 9,
            Comparable::Other(_) => 10,
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Document(a), Comparable::Document(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && values_equal(va, vb))
            },
            (Comparable::Array(a), Comparable::Array(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|(va, vb)| values_equal(va, vb))
            },
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    /// Orders values of the same type bracket; values of different brackets
    /// are unordered, which makes range operators ignore them.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::Document(a), Comparable::Document(b)) => {
                for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                    match total_cmp(va, vb).then_with(|| ka.cmp(kb)) {
                        Ordering::Equal => continue,
                        ordering => return Some(ordering),
                    }
                }
                Some(a.len().cmp(&b.len()))
            },
            (Comparable::Array(a), Comparable::Array(b)) => {
                for (va, vb) in a.iter().zip(b.iter()) {
                    match total_cmp(va, vb) {
                        Ordering::Equal => continue,
                        ordering => return Some(ordering),
                    }
                }
                Some(a.len().cmp(&b.len()))
            },
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Equality with numeric normalization.
pub(crate) fn values_equal(left: &Bson, right: &Bson) -> bool {
    Comparable::from(left) == Comparable::from(right)
}

/// Total order used for sorting: type bracket first, then value.
pub(crate) fn total_cmp(left: &Bson, right: &Bson) -> Ordering {
    let (left, right) = (Comparable::from(left), Comparable::from(right));

    left.rank()
        .cmp(&right.rank())
        .then_with(|| left.partial_cmp(&right).unwrap_or(Ordering::Equal))
}

/// Collects every value reachable through a dotted `path`.
///
/// Arrays met along the way are traversed element-wise, and a numeric path
/// segment also indexes into an array, mirroring how the server resolves
/// `"items.price"` or `"items.0"`.
pub(crate) fn resolve<'a>(document: &'a Document, path: &str) -> Vec<&'a Bson> {
    let segments = path.split('.').collect::<Vec<_>>();
    let mut found = Vec::new();

    if let Some(value) = document.get(segments[0]) {
        collect(value, &segments[1..], &mut found);
    }

    found
}

fn collect<'a>(value: &'a Bson, path: &[&str], found: &mut Vec<&'a Bson>) {
    let Some((head, rest)) = path.split_first() else {
        found.push(value);
        return;
    };

    match value {
        Bson::Document(doc) => {
            if let Some(next) = doc.get(*head) {
                collect(next, rest, found);
            }
        },
        Bson::Array(items) => {
            if let Ok(index) = head.parse::<usize>() {
                if let Some(item) = items.get(index) {
                    collect(item, rest, found);
                }
            }
            for item in items {
                if item.as_document().is_some() {
                    collect(item, path, found);
                }
            }
        },
        _ => {},
    }
}

/// Whether `value` is an operator expression such as `{"$gt": 1}`.
pub(crate) fn is_operator_document(value: &Document) -> bool {
    value
        .keys()
        .next()
        .is_some_and(|key| key.starts_with('$'))
}

fn bad_value(message: impl Into<String>) -> DocTextError {
    DocTextError::server_with_code(BAD_VALUE, message)
}

/// Evaluates a filter document against documents.
pub(crate) struct DocumentEvaluator<'a> {
    filter: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(filter: &'a Document) -> Self {
        Self { filter }
    }

    /// Returns whether `document` satisfies the filter.
    ///
    /// # Errors
    ///
    /// Returns a server error with code 2 for unknown or malformed operators.
    pub fn matches(&self, document: &Document) -> DocTextResult<bool> {
        matches_document(document, self.filter)
    }

    /// Returns the documents satisfying the filter, in their original order.
    pub fn filter_documents<'d>(
        &self,
        documents: impl IntoIterator<Item = &'d Document>,
    ) -> DocTextResult<Vec<&'d Document>> {
        let mut matched = Vec::new();

        for document in documents {
            if self.matches(document)? {
                matched.push(document);
            }
        }

        Ok(matched)
    }
}

pub(crate) fn matches_document(document: &Document, filter: &Document) -> DocTextResult<bool> {
    for (key, condition) in filter {
        let matched = match key.as_str() {
            "$and" => {
                let mut all = true;
                for clause in clauses(key, condition)? {
                    if !matches_document(document, clause)? {
                        all = false;
                        break;
                    }
                }
                all
            },
            "$or" => {
                let mut any = false;
                for clause in clauses(key, condition)? {
                    if matches_document(document, clause)? {
                        any = true;
                        break;
                    }
                }
                any
            },
            "$nor" => {
                let mut none = true;
                for clause in clauses(key, condition)? {
                    if matches_document(document, clause)? {
                        none = false;
                        break;
                    }
                }
                none
            },
            "$comment" => true,
            operator if operator.starts_with('$') => {
                return Err(bad_value(format!("unknown top level operator: {operator}")));
            },
            field => matches_field(&resolve(document, field), condition)?,
        };

        if !matched {
            return Ok(false);
        }
    }

    Ok(true)
}

fn clauses<'f>(operator: &str, condition: &'f Bson) -> DocTextResult<Vec<&'f Document>> {
    let Bson::Array(items) = condition else {
        return Err(bad_value(format!("{operator} must be an array")));
    };

    if items.is_empty() {
        return Err(bad_value(format!("{operator} argument must be a non-empty array")));
    }

    items
        .iter()
        .map(|item| {
            item.as_document()
                .ok_or_else(|| bad_value(format!("{operator} argument's entries must be objects")))
        })
        .collect()
}

/// Applies a field condition (a literal or an operator document) to the
/// values resolved for that field.
pub(crate) fn matches_field(candidates: &[&Bson], condition: &Bson) -> DocTextResult<bool> {
    match condition {
        Bson::Document(operators) if is_operator_document(operators) => {
            for (operator, operand) in operators {
                if !apply_operator(candidates, operator, operand, operators)? {
                    return Ok(false);
                }
            }
            Ok(true)
        },
        value => matches_value(candidates, value),
    }
}

/// Equality, except that a regular expression value matches strings it accepts.
fn matches_value(candidates: &[&Bson], value: &Bson) -> DocTextResult<bool> {
    match value {
        Bson::RegularExpression(regex) => Ok(equals_any(candidates, value)
            || regex_any(candidates, &build_regex(regex.pattern.as_str(), regex.options.as_str())?)),
        _ => Ok(equals_any(candidates, value)),
    }
}

fn matches_any_value(candidates: &[&Bson], values: &[Bson]) -> DocTextResult<bool> {
    for value in values {
        if matches_value(candidates, value)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Candidates plus the elements of any array candidate.
fn flatten<'a>(candidates: &[&'a Bson]) -> Vec<&'a Bson> {
    let mut flat = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        flat.push(*candidate);
        if let Bson::Array(items) = candidate {
            flat.extend(items.iter());
        }
    }

    flat
}

fn equals_any(candidates: &[&Bson], value: &Bson) -> bool {
    if candidates.is_empty() {
        return matches!(value, Bson::Null);
    }

    flatten(candidates)
        .into_iter()
        .any(|candidate| values_equal(candidate, value))
}

fn compare_any(candidates: &[&Bson], value: &Bson, accept: fn(Ordering) -> bool) -> bool {
    let value = Comparable::from(value);

    flatten(candidates)
        .into_iter()
        .any(|candidate| {
            Comparable::from(candidate)
                .partial_cmp(&value)
                .is_some_and(accept)
        })
}

fn build_regex(pattern: &str, options: &str) -> DocTextResult<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(options.contains('i'))
        .multi_line(options.contains('m'))
        .dot_matches_new_line(options.contains('s'))
        .ignore_whitespace(options.contains('x'))
        .build()
        .map_err(|e| bad_value(format!("invalid regular expression: {e}")))
}

fn regex_any(candidates: &[&Bson], regex: &Regex) -> bool {
    flatten(candidates)
        .into_iter()
        .any(|candidate| matches!(candidate, Bson::String(s) if regex.is_match(s)))
}

fn array_operand<'o>(operator: &str, operand: &'o Bson) -> DocTextResult<&'o Vec<Bson>> {
    match operand {
        Bson::Array(items) => Ok(items),
        _ => Err(bad_value(format!("{operator} needs an array"))),
    }
}

fn apply_operator(
    candidates: &[&Bson],
    operator: &str,
    operand: &Bson,
    siblings: &Document,
) -> DocTextResult<bool> {
    Ok(match operator {
        "$eq" => equals_any(candidates, operand),
        "$ne" => !equals_any(candidates, operand),
        "$gt" => compare_any(candidates, operand, |o| o == Ordering::Greater),
        "$gte" => compare_any(candidates, operand, |o| o != Ordering::Less),
        "$lt" => compare_any(candidates, operand, |o| o == Ordering::Less),
        "$lte" => compare_any(candidates, operand, |o| o != Ordering::Greater),
        "$in" => matches_any_value(candidates, array_operand(operator, operand)?)?,
        "$nin" => !matches_any_value(candidates, array_operand(operator, operand)?)?,
        "$exists" => !candidates.is_empty() == truthy(operand),
        "$size" => {
            let size = number(operand)
                .ok_or_else(|| bad_value("$size needs a number"))?;
            candidates
                .iter()
                .any(|candidate| matches!(candidate, Bson::Array(items) if items.len() as f64 == size))
        },
        "$all" => {
            let values = array_operand(operator, operand)?;
            if values.is_empty() {
                return Ok(false);
            }
            for value in values {
                if !matches_value(candidates, value)? {
                    return Ok(false);
                }
            }
            true
        },
        "$elemMatch" => {
            let Bson::Document(condition) = operand else {
                return Err(bad_value("$elemMatch needs an Object"));
            };
            let mut any = false;
            for candidate in candidates {
                let Bson::Array(items) = candidate else { continue };
                for item in items {
                    let matched = match item {
                        Bson::Document(element) if !is_operator_document(condition) => {
                            matches_document(element, condition)?
                        },
                        _ => matches_field(&[item], operand)?,
                    };
                    if matched {
                        any = true;
                        break;
                    }
                }
                if any {
                    break;
                }
            }
            any
        },
        "$regex" => {
            let Bson::String(pattern) = operand else {
                return Err(bad_value("$regex has to be a string"));
            };
            let options = match siblings.get("$options") {
                Some(Bson::String(options)) => options.as_str(),
                _ => "",
            };
            regex_any(candidates, &build_regex(pattern, options)?)
        },
        "$options" => {
            if !siblings.contains_key("$regex") {
                return Err(bad_value("$options needs a $regex"));
            }
            true
        },
        "$not" => match operand {
            Bson::Document(inner) if is_operator_document(inner) => {
                !matches_field(candidates, operand)?
            },
            Bson::RegularExpression(_) => !matches_value(candidates, operand)?,
            _ => return Err(bad_value("$not needs a regex or a document")),
        },
        "$mod" => {
            let operands = array_operand(operator, operand)?;
            let (Some(divisor), Some(remainder)) = (
                operands.first().and_then(number),
                operands.get(1).and_then(number),
            ) else {
                return Err(bad_value("malformed mod, needs to be an array of two numbers"));
            };
            if divisor == 0.0 {
                return Err(bad_value("divisor cannot be 0"));
            }
            flatten(candidates)
                .into_iter()
                .filter_map(number)
                .any(|value| (value.trunc() % divisor.trunc()) == remainder.trunc())
        },
        unknown => return Err(bad_value(format!("unknown operator: {unknown}"))),
    })
}

/// Numeric value of a BSON number.
pub(crate) fn number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(*v as f64),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

/// Truthiness as the server interprets flags such as `$exists` or projections.
pub(crate) fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Null | Bson::Undefined => false,
        other => number(other).is_none_or(|n| n != 0.0),
    }
}
