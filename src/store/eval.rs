//! Query evaluation for the in-memory store
//!
//! Supports the operator subset issued by the catalog service:
//! - filters: equality (with array membership), `$eq`, `$ne`, `$lt`, `$lte`,
//!   `$gt`, `$gte`, `$in`
//! - projections: inclusion by (dotted) path, `_id` suppression, and
//!   computed fields in aggregation `$project`
//! - expressions: `"$path"`, `$round`, `$concat`, `$toString`, `$literal`
//! - stages: `$match`, `$unwind`, `$group` (`$first`, `$sum`, `$avg`,
//!   `$min`, `$max`), `$sort`, `$project`, `$limit`
//!
//! Anything else is rejected rather than silently ignored.

use std::cmp::Ordering;

use mongodb::bson::{Bson, Document};

use crate::error::{CatalogError, ErrorInfo, QueryError, Result};
use crate::utils::convert::bson_to_string;
use crate::utils::number::format_number;

fn unsupported(what: impl Into<String>) -> CatalogError {
    QueryError::Rejected(ErrorInfo::new("memory.unsupported", what)).into()
}

/* ========================= Numbers ========================= */

/// Read a numeric value as f64
fn bson_to_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Double(v) => Some(*v),
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        _ => None,
    }
}

/// Round to `places` decimal places, ties to even, as `$round` does
fn round_half_even(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let factor = 10f64.powi(places);
    let scaled = value * factor;
    let floor = scaled.floor();
    let diff = scaled - floor;

    let rounded = if (diff - 0.5).abs() < 1e-9 {
        if floor % 2.0 == 0.0 { floor } else { floor + 1.0 }
    } else {
        scaled.round()
    };

    rounded / factor
}

/* ========================= Paths ========================= */

/// Stand-in for missing fields when ordering
static NULL: Bson = Bson::Null;

/// Look up a dotted path
pub(super) fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Bson::Document(inner) => inner.get(part)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Set a dotted path, creating intermediate documents
fn set_path(doc: &mut Document, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            doc.insert(path, value);
        }
        Some((head, rest)) => {
            if !matches!(doc.get(head), Some(Bson::Document(_))) {
                doc.insert(head, Document::new());
            }
            if let Some(Bson::Document(inner)) = doc.get_mut(head) {
                set_path(inner, rest, value);
            }
        }
    }
}

/* ========================= Comparison ========================= */

/// Canonical cross-type ordering rank
fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::MaxKey => 13,
        _ => 12,
    }
}

/// Total order over BSON values, numbers compared by value
pub(super) fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    let (rank_a, rank_b) = (type_rank(a), type_rank(b));
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }

    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.cmp(y),
        (Bson::Array(x), Bson::Array(y)) => {
            for (left, right) in x.iter().zip(y.iter()) {
                let ord = compare_bson(left, right);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => match (bson_to_f64(a), bson_to_f64(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}

fn values_equal(a: &Bson, b: &Bson) -> bool {
    match (bson_to_f64(a), bson_to_f64(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/* ========================= Filters ========================= */

/// Whether `doc` satisfies `filter`
pub(super) fn matches(doc: &Document, filter: &Document) -> Result<bool> {
    for (key, condition) in filter {
        if key.starts_with('$') {
            return Err(unsupported(format!("top-level filter operator {key}")));
        }

        let value = get_path(doc, key);
        let satisfied = match condition {
            Bson::Document(ops) if ops.keys().next().is_some_and(|k| k.starts_with('$')) => {
                let mut all = true;
                for (op, operand) in ops {
                    if !match_operator(value, op, operand)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            _ => match_equality(value, condition),
        };

        if !satisfied {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Equality with array membership, missing matches only null
fn match_equality(value: Option<&Bson>, expected: &Bson) -> bool {
    match value {
        None => matches!(expected, Bson::Null),
        Some(Bson::Array(items)) if !matches!(expected, Bson::Array(_)) => {
            items.iter().any(|item| values_equal(item, expected))
        }
        Some(actual) => values_equal(actual, expected),
    }
}

/// Ordered comparison; only same-type values are comparable
fn match_comparison(value: Option<&Bson>, operand: &Bson, accept: fn(Ordering) -> bool) -> bool {
    let compare_one = |actual: &Bson| {
        type_rank(actual) == type_rank(operand) && accept(compare_bson(actual, operand))
    };

    match value {
        None => false,
        Some(Bson::Array(items)) => items.iter().any(compare_one),
        Some(actual) => compare_one(actual),
    }
}

fn match_operator(value: Option<&Bson>, op: &str, operand: &Bson) -> Result<bool> {
    let matched = match op {
        "$eq" => match_equality(value, operand),
        "$ne" => !match_equality(value, operand),
        "$lt" => match_comparison(value, operand, |o| o == Ordering::Less),
        "$lte" => match_comparison(value, operand, |o| o != Ordering::Greater),
        "$gt" => match_comparison(value, operand, |o| o == Ordering::Greater),
        "$gte" => match_comparison(value, operand, |o| o != Ordering::Less),
        "$in" => match operand {
            Bson::Array(candidates) => candidates
                .iter()
                .any(|candidate| match_equality(value, candidate)),
            _ => return Err(unsupported("$in needs an array")),
        },
        other => return Err(unsupported(format!("filter operator {other}"))),
    };
    Ok(matched)
}

/* ========================= Sort ========================= */

/// Stable sort by a `{field: 1 | -1}` specification
pub(super) fn sort_documents(docs: &mut [Document], spec: &Document) -> Result<()> {
    let mut keys = Vec::with_capacity(spec.len());
    for (field, direction) in spec {
        let descending = match bson_to_f64(direction) {
            Some(d) if d == 1.0 => false,
            Some(d) if d == -1.0 => true,
            _ => return Err(unsupported(format!("sort direction for '{field}'"))),
        };
        keys.push((field.as_str(), descending));
    }

    docs.sort_by(|a, b| {
        for (field, descending) in &keys {
            let left = get_path(a, field).unwrap_or(&NULL);
            let right = get_path(b, field).unwrap_or(&NULL);
            let ord = compare_bson(left, right);
            let ord = if *descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
    Ok(())
}

/* ========================= Projection & expressions ========================= */

fn is_flag(value: &Bson) -> Option<bool> {
    match value {
        Bson::Boolean(b) => Some(*b),
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => bson_to_f64(value).map(|n| n != 0.0),
        _ => None,
    }
}

/// Apply an inclusion projection, possibly with computed fields
pub(super) fn project(doc: &Document, spec: &Document) -> Result<Document> {
    let mut output = Document::new();

    let id_spec = spec.get("_id");
    if id_spec.is_none() || id_spec.and_then(is_flag) == Some(true) {
        if let Some(id) = doc.get("_id") {
            output.insert("_id", id.clone());
        }
    }

    for (key, value) in spec {
        match is_flag(value) {
            Some(true) if key != "_id" => {
                if let Some(found) = get_path(doc, key) {
                    set_path(&mut output, key, found.clone());
                }
            }
            Some(true) => {}
            Some(false) if key == "_id" => {}
            Some(false) => {
                return Err(unsupported(format!("exclusion of '{key}'")));
            }
            None => {
                if let Some(computed) = eval_expr(doc, value)? {
                    set_path(&mut output, key, computed);
                }
            }
        }
    }

    Ok(output)
}

/// Evaluate an aggregation expression; `None` means the value is missing
pub(super) fn eval_expr(doc: &Document, expr: &Bson) -> Result<Option<Bson>> {
    match expr {
        Bson::String(s) if s.starts_with('$') => Ok(get_path(doc, &s[1..]).cloned()),
        Bson::Document(op_doc) if op_doc.len() == 1 => {
            let (op, args) = op_doc
                .iter()
                .next()
                .ok_or_else(|| unsupported("empty expression"))?;
            if !op.starts_with('$') {
                return Ok(Some(expr.clone()));
            }
            eval_operator(doc, op, args).map(Some)
        }
        other => Ok(Some(other.clone())),
    }
}

fn eval_operator(doc: &Document, op: &str, args: &Bson) -> Result<Bson> {
    match op {
        "$literal" => Ok(args.clone()),
        "$toString" => {
            let value = eval_expr(doc, args)?.unwrap_or(Bson::Null);
            Ok(match value {
                Bson::Null => Bson::Null,
                Bson::Double(n) => Bson::String(format_number(n)),
                other => Bson::String(bson_to_string(&other)),
            })
        }
        "$concat" => {
            let Bson::Array(parts) = args else {
                return Err(unsupported("$concat needs an array"));
            };
            let mut out = String::new();
            for part in parts {
                match eval_expr(doc, part)? {
                    Some(Bson::String(s)) => out.push_str(&s),
                    None | Some(Bson::Null) => return Ok(Bson::Null),
                    Some(_) => return Err(unsupported("$concat only supports strings")),
                }
            }
            Ok(Bson::String(out))
        }
        "$round" => {
            let (value_expr, places) = match args {
                Bson::Array(items) if items.len() == 2 => {
                    let places = bson_to_f64(&items[1])
                        .ok_or_else(|| unsupported("$round place must be a number"))?;
                    (&items[0], places as i32)
                }
                Bson::Array(items) if items.len() == 1 => (&items[0], 0),
                _ => return Err(unsupported("$round needs [value, place]")),
            };
            Ok(match eval_expr(doc, value_expr)?.unwrap_or(Bson::Null) {
                Bson::Double(n) => Bson::Double(round_half_even(n, places)),
                Bson::Null => Bson::Null,
                other @ (Bson::Int32(_) | Bson::Int64(_)) => other,
                _ => return Err(unsupported("$round only supports numbers")),
            })
        }
        other => Err(unsupported(format!("expression operator {other}"))),
    }
}

/* ========================= Group ========================= */

enum Accumulator {
    First(Option<Bson>),
    Sum { int: i64, float: f64, is_float: bool },
    Avg { total: f64, count: u64 },
    Min(Option<Bson>),
    Max(Option<Bson>),
}

impl Accumulator {
    fn new(op: &str) -> Result<Self> {
        Ok(match op {
            "$first" => Accumulator::First(None),
            "$sum" => Accumulator::Sum {
                int: 0,
                float: 0.0,
                is_float: false,
            },
            "$avg" => Accumulator::Avg {
                total: 0.0,
                count: 0,
            },
            "$min" => Accumulator::Min(None),
            "$max" => Accumulator::Max(None),
            other => return Err(unsupported(format!("accumulator {other}"))),
        })
    }

    fn feed(&mut self, value: Option<Bson>) {
        match self {
            Accumulator::First(slot) => {
                if slot.is_none() {
                    *slot = Some(value.unwrap_or(Bson::Null));
                }
            }
            Accumulator::Sum {
                int,
                float,
                is_float,
            } => match value {
                Some(Bson::Int32(n)) => *int += i64::from(n),
                Some(Bson::Int64(n)) => *int += n,
                Some(Bson::Double(n)) => {
                    *float += n;
                    *is_float = true;
                }
                _ => {}
            },
            Accumulator::Avg { total, count } => {
                if let Some(n) = value.as_ref().and_then(bson_to_f64) {
                    *total += n;
                    *count += 1;
                }
            }
            Accumulator::Min(slot) => keep_extreme(slot, value, Ordering::Less),
            Accumulator::Max(slot) => keep_extreme(slot, value, Ordering::Greater),
        }
    }

    fn finish(self) -> Bson {
        match self {
            Accumulator::First(slot) | Accumulator::Min(slot) | Accumulator::Max(slot) => {
                slot.unwrap_or(Bson::Null)
            }
            Accumulator::Sum {
                int,
                float,
                is_float,
            } => {
                if is_float {
                    Bson::Double(float + int as f64)
                } else if let Ok(small) = i32::try_from(int) {
                    Bson::Int32(small)
                } else {
                    Bson::Int64(int)
                }
            }
            Accumulator::Avg { total, count } => {
                if count == 0 {
                    Bson::Null
                } else {
                    Bson::Double(total / count as f64)
                }
            }
        }
    }
}

/// Replace `slot` when `value` orders `want` relative to it; nulls are skipped
fn keep_extreme(slot: &mut Option<Bson>, value: Option<Bson>, want: Ordering) {
    let Some(candidate) = value.filter(|v| !matches!(v, Bson::Null)) else {
        return;
    };
    let replace = slot
        .as_ref()
        .is_none_or(|current| compare_bson(&candidate, current) == want);
    if replace {
        *slot = Some(candidate);
    }
}

/// `$group` stage; groups keep first-seen order
pub(super) fn group(docs: Vec<Document>, spec: &Document) -> Result<Vec<Document>> {
    let id_expr = spec
        .get("_id")
        .ok_or_else(|| unsupported("$group requires _id"))?;

    let mut fields: Vec<(&str, &str, &Bson)> = Vec::new();
    for (name, acc) in spec {
        if name == "_id" {
            continue;
        }
        let Bson::Document(acc_doc) = acc else {
            return Err(unsupported(format!("accumulator for '{name}'")));
        };
        let (op, arg) = acc_doc
            .iter()
            .next()
            .ok_or_else(|| unsupported(format!("empty accumulator for '{name}'")))?;
        fields.push((name.as_str(), op.as_str(), arg));
    }

    let mut groups: Vec<(Bson, Vec<Accumulator>)> = Vec::new();
    for doc in &docs {
        let key = eval_expr(doc, id_expr)?.unwrap_or(Bson::Null);
        let index = match groups.iter().position(|(k, _)| values_equal(k, &key)) {
            Some(index) => index,
            None => {
                let accumulators = fields
                    .iter()
                    .map(|(_, op, _)| Accumulator::new(op))
                    .collect::<Result<Vec<_>>>()?;
                groups.push((key, accumulators));
                groups.len() - 1
            }
        };

        for (acc, (_, _, arg)) in groups[index].1.iter_mut().zip(&fields) {
            acc.feed(eval_expr(doc, arg)?);
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key, accumulators)| {
            let mut out = Document::new();
            out.insert("_id", key);
            for (acc, (name, _, _)) in accumulators.into_iter().zip(&fields) {
                out.insert(*name, acc.finish());
            }
            out
        })
        .collect())
}

/* ========================= Unwind & pipeline ========================= */

/// `$unwind` stage; missing, null and empty arrays are dropped
fn unwind(docs: Vec<Document>, path: &str) -> Result<Vec<Document>> {
    let field = path
        .strip_prefix('$')
        .ok_or_else(|| unsupported("$unwind path must start with '$'"))?;

    let mut out = Vec::new();
    for doc in docs {
        match get_path(&doc, field).cloned() {
            None | Some(Bson::Null) => {}
            Some(Bson::Array(items)) => {
                for item in items {
                    let mut copy = doc.clone();
                    set_path(&mut copy, field, item);
                    out.push(copy);
                }
            }
            Some(_) => out.push(doc),
        }
    }
    Ok(out)
}

/// Run an aggregation pipeline over a snapshot of documents
pub(super) fn run_pipeline(
    mut docs: Vec<Document>,
    pipeline: &[Document],
) -> Result<Vec<Document>> {
    for stage in pipeline {
        let (name, spec) = match stage.iter().next() {
            Some(entry) if stage.len() == 1 => entry,
            _ => return Err(unsupported("pipeline stage must have exactly one key")),
        };

        docs = match (name.as_str(), spec) {
            ("$match", Bson::Document(filter)) => {
                let mut kept = Vec::with_capacity(docs.len());
                for doc in docs {
                    if matches(&doc, filter)? {
                        kept.push(doc);
                    }
                }
                kept
            }
            ("$unwind", Bson::String(path)) => unwind(docs, path)?,
            ("$unwind", Bson::Document(opts)) => {
                let path = opts
                    .get_str("path")
                    .map_err(|_| unsupported("$unwind requires a path"))?;
                unwind(docs, path)?
            }
            ("$group", Bson::Document(spec)) => group(docs, spec)?,
            ("$sort", Bson::Document(spec)) => {
                sort_documents(&mut docs, spec)?;
                docs
            }
            ("$project", Bson::Document(spec)) => docs
                .iter()
                .map(|doc| project(doc, spec))
                .collect::<Result<Vec<_>>>()?,
            ("$limit", limit) => {
                let n = bson_to_f64(limit).ok_or_else(|| unsupported("$limit must be a number"))?;
                docs.truncate(n.max(0.0) as usize);
                docs
            }
            (other, _) => return Err(unsupported(format!("pipeline stage {other}"))),
        };
    }
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_get_path_dotted() {
        let d = doc! { "specifications": { "ram": "12GB" } };
        assert_eq!(
            get_path(&d, "specifications.ram"),
            Some(&Bson::String("12GB".into()))
        );
        assert_eq!(get_path(&d, "specifications.storage"), None);
    }

    #[test]
    fn test_matches_lt_and_equality() {
        let d = doc! { "category": "Electronics", "price": 45000 };
        let filter = doc! { "category": "Electronics", "price": { "$lt": 50000.0 } };
        assert!(matches(&d, &filter).unwrap());
        assert!(!matches(&d, &doc! { "price": { "$lt": 45000 } }).unwrap());
        assert!(!matches(&d, &doc! { "category": "Fashion" }).unwrap());
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(round_half_even(4.333333, 2), 4.33);
        assert_eq!(round_half_even(4.666666, 2), 4.67);
        assert_eq!(round_half_even(2.5, 0), 2.0);
        assert_eq!(round_half_even(3.5, 0), 4.0);
        assert_eq!(round_half_even(4.0, 2), 4.0);
    }

    #[test]
    fn test_numeric_reads() {
        assert_eq!(bson_to_f64(&Bson::Int32(4)), Some(4.0));
        assert_eq!(bson_to_f64(&Bson::Int64(50)), Some(50.0));
        assert_eq!(bson_to_f64(&Bson::String("4".into())), None);
    }

    #[test]
    fn test_matches_array_membership() {
        let d = doc! { "tags": ["smartphone", "5g"] };
        assert!(matches(&d, &doc! { "tags": "5g" }).unwrap());
        assert!(!matches(&d, &doc! { "tags": "laptop" }).unwrap());
    }

    #[test]
    fn test_comparison_ignores_other_types() {
        let d = doc! { "price": "cheap" };
        assert!(!matches(&d, &doc! { "price": { "$lt": 100 } }).unwrap());
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let d = doc! { "name": "x" };
        assert!(matches(&d, &doc! { "name": { "$regex": "x" } }).is_err());
    }

    #[test]
    fn test_sort_multi_key() {
        let mut docs = vec![
            doc! { "k": 1, "id": "b" },
            doc! { "k": 2, "id": "a" },
            doc! { "k": 1, "id": "a" },
        ];
        sort_documents(&mut docs, &doc! { "k": -1, "id": 1 }).unwrap();
        let ids: Vec<_> = docs
            .iter()
            .map(|d| format!("{}{}", d.get_i32("k").unwrap(), d.get_str("id").unwrap()))
            .collect();
        assert_eq!(ids, vec!["2a", "1a", "1b"]);
    }

    #[test]
    fn test_project_suppresses_id_and_keeps_nested() {
        let d = doc! {
            "_id": 7,
            "name": "Phone",
            "specifications": { "ram": "8GB", "storage": "128GB" },
        };
        let out = project(&d, &doc! { "_id": 0, "name": 1, "specifications.ram": 1 }).unwrap();
        assert_eq!(out, doc! { "name": "Phone", "specifications": { "ram": "8GB" } });
    }

    #[test]
    fn test_expression_concat_to_string() {
        let d = doc! { "min_price": 1299.0, "max_price": 12999 };
        let expr = Bson::Document(doc! {
            "$concat": [
                "Rs. ",
                { "$toString": "$min_price" },
                " - Rs. ",
                { "$toString": "$max_price" },
            ]
        });
        assert_eq!(
            eval_expr(&d, &expr).unwrap(),
            Some(Bson::String("Rs. 1299 - Rs. 12999".into()))
        );
    }

    #[test]
    fn test_group_accumulators() {
        let docs = vec![
            doc! { "c": "A", "p": 10 },
            doc! { "c": "B", "p": 5.5 },
            doc! { "c": "A", "p": 20 },
        ];
        let out = group(
            docs,
            &doc! {
                "_id": "$c",
                "n": { "$sum": 1 },
                "avg": { "$avg": "$p" },
                "lo": { "$min": "$p" },
                "hi": { "$max": "$p" },
            },
        )
        .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0], doc! { "_id": "A", "n": 2, "avg": 15.0, "lo": 10, "hi": 20 });
        assert_eq!(out[1].get_i32("n").unwrap(), 1);
    }

    #[test]
    fn test_unwind_drops_empty_arrays() {
        let docs = vec![
            doc! { "id": 1, "r": [ { "x": 1 }, { "x": 2 } ] },
            doc! { "id": 2, "r": [] },
            doc! { "id": 3 },
        ];
        let out = unwind(docs, "$r").unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(get_path(&out[1], "r.x"), Some(&Bson::Int32(2)));
    }

    #[test]
    fn test_unsupported_stage() {
        let err = run_pipeline(vec![], &[doc! { "$lookup": {} }]).unwrap_err();
        assert!(err.to_string().contains("$lookup"));
    }
}
