//! Update operators and document rewriting for the in-memory store.

use std::cmp::Ordering;
use bson::{Bson, DateTime, Document, doc, oid::ObjectId};

use doctext_core::error::{DocTextError, DocTextResult};

use crate::evaluator::{
    self, BAD_VALUE, is_operator_document, matches_document, matches_field, number, total_cmp,
    values_equal,
};

pub(crate) const FAILED_TO_PARSE: i32 = 9;
pub(crate) const TYPE_MISMATCH: i32 = 14;
pub(crate) const PATH_NOT_VIABLE: i32 = 28;
pub(crate) const IMMUTABLE_FIELD: i32 = 66;
pub(crate) const PROJECTION_PATH_COLLISION: i32 = 31250;
pub(crate) const MIXED_PROJECTION: i32 = 31254;

fn error(code: i32, message: impl Into<String>) -> DocTextError {
    DocTextError::server_with_code(code, message)
}

/// Rejects update documents that are empty or that contain plain fields.
pub(crate) fn validate_update(update: &Document) -> DocTextResult<()> {
    if update.is_empty() {
        return Err(error(FAILED_TO_PARSE, "update document must not be empty"));
    }

    match update.keys().find(|key| !key.starts_with('$')) {
        Some(key) => Err(error(
            FAILED_TO_PARSE,
            format!("update document requires atomic operators, found field '{key}'"),
        )),
        None => Ok(()),
    }
}

/// Rejects replacement documents that contain update operators.
pub(crate) fn validate_replacement(replacement: &Document) -> DocTextResult<()> {
    match replacement.keys().find(|key| key.starts_with('$')) {
        Some(key) => Err(error(
            FAILED_TO_PARSE,
            format!("replacement document must not contain update operators, found '{key}'"),
        )),
        None => Ok(()),
    }
}

/// Returns `document` with `_id` as its first field, generating one if absent.
pub(crate) fn with_id_first(document: Document) -> Document {
    let id = document
        .get("_id")
        .cloned()
        .unwrap_or_else(|| Bson::ObjectId(ObjectId::new()));
    let mut ordered = doc! { "_id": id };

    for (key, value) in document {
        if key != "_id" {
            ordered.insert(key, value);
        }
    }

    ordered
}

/// Builds the replacement stored in place of `existing`, keeping its `_id`.
pub(crate) fn replace_document(existing: &Document, replacement: &Document) -> DocTextResult<Document> {
    let id = existing.get("_id").cloned().unwrap_or(Bson::Null);

    if let Some(new_id) = replacement.get("_id") {
        if !values_equal(new_id, &id) {
            return Err(immutable_id());
        }
    }

    let mut replaced = replacement.clone();
    replaced.insert("_id", id);
    Ok(with_id_first(replaced))
}

fn immutable_id() -> DocTextError {
    error(
        IMMUTABLE_FIELD,
        "performing an update on the path '_id' would modify the immutable field '_id'",
    )
}

/// Seeds an upserted document from the equality conditions of `filter`.
pub(crate) fn seed_from_filter(filter: &Document) -> DocTextResult<Document> {
    let mut seeded = Document::new();
    seed_into(&mut seeded, filter)?;
    Ok(seeded)
}

fn seed_into(seeded: &mut Document, filter: &Document) -> DocTextResult<()> {
    for (key, condition) in filter {
        if key == "$and" {
            if let Bson::Array(clauses) = condition {
                for clause in clauses.iter().filter_map(Bson::as_document) {
                    seed_into(seeded, clause)?;
                }
            }
            continue;
        }
        if key.starts_with('$') {
            continue;
        }

        match condition {
            Bson::Document(operators) if is_operator_document(operators) => {
                if let Some(value) = operators.get("$eq") {
                    set_path(seeded, key, value.clone())?;
                }
            },
            value => set_path(seeded, key, value.clone())?,
        }
    }

    Ok(())
}

/// Applies the operators of `update` to `document` in place.
///
/// `inserting` enables `$setOnInsert`, which is otherwise ignored.
pub(crate) fn apply_update(document: &mut Document, update: &Document, inserting: bool) -> DocTextResult<()> {
    let original_id = document.get("_id").cloned();

    for (operator, fields) in update {
        let Bson::Document(fields) = fields else {
            return Err(error(
                FAILED_TO_PARSE,
                format!("modifiers operate on fields but {operator} was given a non-document value"),
            ));
        };

        for (path, value) in fields {
            apply_operator(document, operator, path, value, inserting)?;
        }
    }

    if let Some(original_id) = original_id {
        match document.get("_id") {
            Some(id) if values_equal(id, &original_id) => {},
            _ => return Err(immutable_id()),
        }
    }

    Ok(())
}

fn apply_operator(
    document: &mut Document,
    operator: &str,
    path: &str,
    value: &Bson,
    inserting: bool,
) -> DocTextResult<()> {
    match operator {
        "$set" => set_path(document, path, value.clone()),
        "$setOnInsert" => {
            if inserting {
                set_path(document, path, value.clone())?;
            }
            Ok(())
        },
        "$unset" => {
            remove_path(document, path);
            Ok(())
        },
        "$inc" => arithmetic(document, path, value, "$inc", Arithmetic::Add),
        "$mul" => arithmetic(document, path, value, "$mul", Arithmetic::Multiply),
        "$min" | "$max" => {
            let wanted = if operator == "$min" { Ordering::Less } else { Ordering::Greater };
            let replace = match get_path(document, path) {
                Some(current) => total_cmp(value, current) == wanted,
                None => true,
            };
            if replace {
                set_path(document, path, value.clone())?;
            }
            Ok(())
        },
        "$rename" => {
            let Bson::String(target) = value else {
                return Err(error(BAD_VALUE, format!("the 'to' field for $rename must be a string: {path}")));
            };
            if let Some(moved) = remove_path(document, path) {
                set_path(document, target, moved)?;
            }
            Ok(())
        },
        "$push" | "$addToSet" => {
            let items = match value {
                Bson::Document(modifiers) if modifiers.contains_key("$each") => match modifiers.get("$each") {
                    Some(Bson::Array(items)) => items.clone(),
                    _ => return Err(error(BAD_VALUE, "the argument to $each must be an array")),
                },
                single => vec![single.clone()],
            };
            let mut array = array_at(document, path, operator)?;
            for item in items {
                if operator == "$push" || !array.iter().any(|existing| values_equal(existing, &item)) {
                    array.push(item);
                }
            }
            set_path(document, path, Bson::Array(array))
        },
        "$pull" => {
            if get_path(document, path).is_none() {
                return Ok(());
            }
            let array = array_at(document, path, operator)?;
            let mut kept = Vec::with_capacity(array.len());
            for item in array {
                if !pull_matches(&item, value)? {
                    kept.push(item);
                }
            }
            set_path(document, path, Bson::Array(kept))
        },
        "$pop" => {
            if get_path(document, path).is_none() {
                return Ok(());
            }
            let mut array = array_at(document, path, operator)?;
            match number(value) {
                Some(n) if n < 0.0 => {
                    if !array.is_empty() {
                        array.remove(0);
                    }
                },
                Some(_) => {
                    array.pop();
                },
                None => return Err(error(FAILED_TO_PARSE, "expected a number in: $pop")),
            }
            set_path(document, path, Bson::Array(array))
        },
        "$currentDate" => set_path(document, path, Bson::DateTime(DateTime::now())),
        unknown => Err(error(FAILED_TO_PARSE, format!("unknown modifier: {unknown}"))),
    }
}

fn pull_matches(item: &Bson, condition: &Bson) -> DocTextResult<bool> {
    match (item, condition) {
        (_, Bson::Document(operators)) if is_operator_document(operators) => matches_field(&[item], condition),
        (Bson::Document(element), Bson::Document(query)) => matches_document(element, query),
        _ => Ok(values_equal(item, condition)),
    }
}

fn array_at(document: &Document, path: &str, operator: &str) -> DocTextResult<Vec<Bson>> {
    match get_path(document, path) {
        None => Ok(Vec::new()),
        Some(Bson::Array(items)) => Ok(items.clone()),
        Some(_) => Err(error(
            BAD_VALUE,
            format!("the field '{path}' must be an array to apply {operator}"),
        )),
    }
}

#[derive(Clone, Copy)]
enum Arithmetic {
    Add,
    Multiply,
}

fn arithmetic(
    document: &mut Document,
    path: &str,
    operand: &Bson,
    operator: &str,
    kind: Arithmetic,
) -> DocTextResult<()> {
    if number(operand).is_none() {
        return Err(error(
            TYPE_MISMATCH,
            format!("cannot {operator} with non-numeric argument: {path}"),
        ));
    }

    let current = match get_path(document, path) {
        Some(current) if number(current).is_some() => current.clone(),
        Some(_) => {
            return Err(error(
                TYPE_MISMATCH,
                format!("cannot apply {operator} to a value of non-numeric type: {path}"),
            ));
        },
        None => match kind {
            Arithmetic::Add => Bson::Int32(0),
            Arithmetic::Multiply => return set_path(document, path, zero_like(operand)),
        },
    };

    set_path(document, path, combine(&current, operand, kind))
}

fn zero_like(value: &Bson) -> Bson {
    match value {
        Bson::Int64(_) => Bson::Int64(0),
        Bson::Double(_) => Bson::Double(0.0),
        _ => Bson::Int32(0),
    }
}

/// Combines two numbers, widening the result type the way the server does.
fn combine(left: &Bson, right: &Bson, kind: Arithmetic) -> Bson {
    let int = |a: i64, b: i64| match kind {
        Arithmetic::Add => a.checked_add(b),
        Arithmetic::Multiply => a.checked_mul(b),
    };
    let float = |a: f64, b: f64| match kind {
        Arithmetic::Add => a + b,
        Arithmetic::Multiply => a * b,
    };

    match (left, right) {
        (Bson::Int32(a), Bson::Int32(b)) => match int(*a as i64, *b as i64) {
            Some(result) => i32::try_from(result)
                .map(Bson::Int32)
                .unwrap_or(Bson::Int64(result)),
            None => Bson::Double(float(*a as f64, *b as f64)),
        },
        (Bson::Int32(_) | Bson::Int64(_), Bson::Int32(_) | Bson::Int64(_)) => {
            let (a, b) = (int_of(left), int_of(right));
            int(a, b)
                .map(Bson::Int64)
                .unwrap_or_else(|| Bson::Double(float(a as f64, b as f64)))
        },
        _ => Bson::Double(float(
            number(left).unwrap_or_default(),
            number(right).unwrap_or_default(),
        )),
    }
}

fn int_of(value: &Bson) -> i64 {
    match value {
        Bson::Int32(v) => *v as i64,
        Bson::Int64(v) => *v,
        _ => 0,
    }
}

/// Reads the single value at a dotted path, indexing arrays numerically.
pub(crate) fn get_path<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Bson::Document(doc) => doc.get(segment)?,
            Bson::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Writes `value` at a dotted path, creating intermediate documents.
pub(crate) fn set_path(document: &mut Document, path: &str, value: Bson) -> DocTextResult<()> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };

    let Some(rest) = rest else {
        document.insert(head, value);
        return Ok(());
    };

    if !document.contains_key(head) {
        document.insert(head, Document::new());
    }

    match document.get_mut(head) {
        Some(Bson::Document(child)) => set_path(child, rest, value),
        Some(Bson::Array(items)) => set_in_array(items, rest, value),
        Some(other) => Err(not_viable(rest, head, other)),
        None => Ok(()),
    }
}

fn set_in_array(items: &mut Vec<Bson>, path: &str, value: Bson) -> DocTextResult<()> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    let index = head.parse::<usize>().map_err(|_| {
        error(PATH_NOT_VIABLE, format!("cannot create field '{head}' in an array"))
    })?;

    while items.len() <= index {
        items.push(Bson::Null);
    }

    match rest {
        None => {
            items[index] = value;
            Ok(())
        },
        Some(rest) => {
            if matches!(items[index], Bson::Null) {
                items[index] = Bson::Document(Document::new());
            }
            match &mut items[index] {
                Bson::Document(child) => set_path(child, rest, value),
                Bson::Array(nested) => set_in_array(nested, rest, value),
                other => Err(not_viable(rest, head, other)),
            }
        },
    }
}

fn not_viable(field: &str, parent: &str, found: &Bson) -> DocTextError {
    let field = field.split('.').next().unwrap_or(field);
    error(
        PATH_NOT_VIABLE,
        format!("cannot create field '{field}' in element {{{parent}: {found}}}"),
    )
}

/// Removes and returns the value at a dotted path.
pub(crate) fn remove_path(document: &mut Document, path: &str) -> Option<Bson> {
    match path.split_once('.') {
        None => document.remove(path),
        Some((head, rest)) => match document.get_mut(head)? {
            Bson::Document(child) => remove_path(child, rest),
            Bson::Array(items) => {
                let (index, rest) = match rest.split_once('.') {
                    Some((index, rest)) => (index, Some(rest)),
                    None => (rest, None),
                };
                let index = index.parse::<usize>().ok()?;
                match rest {
                    // Unsetting an array element leaves a null in its place.
                    None => items
                        .get_mut(index)
                        .map(|slot| std::mem::replace(slot, Bson::Null)),
                    Some(rest) => match items.get_mut(index)? {
                        Bson::Document(child) => remove_path(child, rest),
                        _ => None,
                    },
                }
            },
            _ => None,
        },
    }
}

/// Rejects projections that mix inclusions with exclusions or name overlapping paths.
///
/// `_id` may be excluded from an inclusion projection and included in an
/// exclusion projection.
pub(crate) fn validate_projection(projection: &Document) -> DocTextResult<()> {
    let mut inclusive = None;
    for (key, value) in projection.iter().filter(|(key, _)| key.as_str() != "_id") {
        let included = evaluator::truthy(value);
        match inclusive {
            None => inclusive = Some(included),
            Some(true) if !included => {
                return Err(error(
                    MIXED_PROJECTION,
                    format!("Cannot do exclusion on field {key} in inclusion projection"),
                ));
            },
            Some(false) if included => {
                return Err(error(
                    MIXED_PROJECTION,
                    format!("Cannot do inclusion on field {key} in exclusion projection"),
                ));
            },
            Some(_) => {},
        }
    }

    let keys = projection.keys().collect::<Vec<_>>();
    for (position, key) in keys.iter().enumerate() {
        for other in &keys[position + 1..] {
            let (shorter, longer) = if key.len() <= other.len() { (key, other) } else { (other, key) };
            if longer.strip_prefix(shorter.as_str()).is_some_and(|rest| rest.is_empty() || rest.starts_with('.')) {
                return Err(error(PROJECTION_PATH_COLLISION, format!("Path collision at {longer}")));
            }
        }
    }
    Ok(())
}

/// Applies a projection document, keeping `_id` unless it is excluded.
pub(crate) fn project(document: &Document, projection: &Document) -> DocTextResult<Document> {
    validate_projection(projection)?;

    let inclusive = projection
        .iter()
        .any(|(key, value)| key != "_id" && evaluator::truthy(value));
    let keep_id = projection.get("_id").is_none_or(evaluator::truthy);

    if inclusive {
        let mut projected = Document::new();
        if keep_id {
            if let Some(id) = document.get("_id") {
                projected.insert("_id", id.clone());
            }
        }
        for (key, value) in projection {
            if key == "_id" || !evaluator::truthy(value) {
                continue;
            }
            if let Some(found) = get_path(document, key) {
                // Dotted inclusions are rebuilt as nested documents.
                set_path(&mut projected, key, found.clone())?;
            }
        }
        Ok(projected)
    } else {
        let mut projected = document.clone();
        for (key, _) in projection {
            if key != "_id" {
                remove_path(&mut projected, key);
            }
        }
        if !keep_id {
            projected.remove("_id");
        }
        Ok(projected)
    }
}
