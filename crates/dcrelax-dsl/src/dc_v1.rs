//! Denial-constraint text dialect: `dc_v1`
//!
//! One constraint per line. Blank lines and lines starting with `#` or `--`
//! are skipped. Two line forms are accepted and may be mixed in one file:
//!
//! - infix: `t1.A = t2.A AND t1.B <> t2.B`
//! - tuple-prefixed: `t1&t2&EQ(t1.A,t2.A)&IQ(t1.B,t2.B)`
//!
//! A line is tuple-prefixed when it contains `&` outside a string literal.
//!
//! Operands are either attribute references with an explicit tuple prefix
//! (`t1.Attr`, `t2.Attr`) or literals: double-quoted strings, single-quoted
//! strings, or signed decimal numbers. Literal text is kept verbatim.
//!
//! Parsing is all-or-nothing: the first malformed constraint aborts the whole
//! file, because downstream consumers index relaxations by constraint position.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char as pchar, digit1},
    combinator::{all_consuming, map, opt, recognize},
    sequence::{pair, tuple},
    IResult,
};
use thiserror::Error;

use crate::predicate::{ConstraintSet, DenialConstraint, Operand, Operator, Predicate, TupleSide};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DcParseError {
    #[error(
        "malformed constraint #{constraint_index} on line {line}{}: {message}\n  in: {text}",
        predicate_label(.predicate_index)
    )]
    MalformedConstraint {
        line: usize,
        constraint_index: usize,
        /// `None` when the error is not attributable to a single predicate.
        predicate_index: Option<usize>,
        text: String,
        message: String,
    },
}

fn predicate_label(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(", predicate #{i}"),
        None => String::new(),
    }
}

type LineError = (Option<usize>, String);

// ============================================================================
// Entry points
// ============================================================================

pub fn parse_dc_v1(text: &str) -> Result<ConstraintSet, DcParseError> {
    let mut constraints = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() || is_comment(line) {
            continue;
        }

        let constraint_index = constraints.len();
        let predicates = parse_constraint_line(line).map_err(|(predicate_index, message)| {
            DcParseError::MalformedConstraint {
                line: line_no,
                constraint_index,
                predicate_index,
                text: line.to_string(),
                message,
            }
        })?;
        constraints.push(DenialConstraint::new(predicates, line, line_no));
    }

    Ok(ConstraintSet::new(constraints))
}

/// Parse a single constraint (either line form) into its predicates.
pub fn parse_constraint_v1(text: &str) -> Result<Vec<Predicate>, String> {
    parse_constraint_line(text.trim()).map_err(|(index, message)| match index {
        Some(i) => format!("predicate #{i}: {message}"),
        None => message,
    })
}

/// Parse a single infix predicate such as `t1.A <= t2.A` or `t1.C="f"`.
pub fn parse_predicate_v1(text: &str) -> Result<Predicate, String> {
    if has_unterminated_quote(text) {
        return Err(format!("unterminated string literal in `{}`", text.trim()));
    }
    parse_infix_predicate(text)
}

/// Format a constraint set back into canonical infix `dc_v1` text.
pub fn format_dc_v1(set: &ConstraintSet) -> String {
    let mut out = String::new();
    for constraint in set {
        out.push_str(&constraint.to_string());
        out.push('\n');
    }
    out
}

// ============================================================================
// Line forms
// ============================================================================

fn is_comment(line: &str) -> bool {
    line.starts_with('#') || line.starts_with("--")
}

fn parse_constraint_line(line: &str) -> Result<Vec<Predicate>, LineError> {
    if has_unterminated_quote(line) {
        return Err((None, "unterminated string literal".to_string()));
    }
    if split_outside_quotes(line, b'&').len() > 1 {
        parse_tuple_prefixed(line)
    } else {
        parse_infix(line)
    }
}

fn parse_infix(line: &str) -> Result<Vec<Predicate>, LineError> {
    split_conjuncts(line)
        .into_iter()
        .enumerate()
        .map(|(i, part)| {
            if part.trim().is_empty() {
                return Err((Some(i), "empty predicate".to_string()));
            }
            parse_infix_predicate(part).map_err(|message| (Some(i), message))
        })
        .collect()
}

fn parse_tuple_prefixed(line: &str) -> Result<Vec<Predicate>, LineError> {
    let mut declared: Vec<TupleSide> = Vec::new();
    let mut predicates: Vec<Predicate> = Vec::new();

    for segment in split_outside_quotes(line, b'&') {
        let segment = segment.trim();
        if predicates.is_empty() {
            if let Some(side) = TupleSide::from_name(segment) {
                if declared.contains(&side) {
                    return Err((None, format!("tuple `{side}` declared twice")));
                }
                declared.push(side);
                continue;
            }
        }

        let index = predicates.len();
        if declared.is_empty() {
            return Err((
                None,
                "expected tuple declarations before predicates (`t1&t2&...`)".to_string(),
            ));
        }
        let predicate = parse_coded_predicate(segment).map_err(|m| (Some(index), m))?;
        for (side, name) in predicate.attributes() {
            if !declared.contains(&side) {
                return Err((
                    Some(index),
                    format!("`{side}.{name}` references undeclared tuple `{side}`"),
                ));
            }
        }
        predicates.push(predicate);
    }

    if predicates.is_empty() {
        return Err((None, "constraint declares tuples but no predicates".to_string()));
    }
    Ok(predicates)
}

/// `EQ(t1.A,t2.A)` style predicate.
fn parse_coded_predicate(segment: &str) -> Result<Predicate, String> {
    let Some((code, rest)) = segment.split_once('(') else {
        return Err(format!("expected `CODE(lhs,rhs)`, got `{segment}`"));
    };
    let Some(inner) = rest.trim_end().strip_suffix(')') else {
        return Err(format!("missing closing `)` in `{segment}`"));
    };
    let code = code.trim();
    let operator = Operator::from_code(code).ok_or_else(|| {
        format!("unknown predicate operator `{code}` (expected EQ, IQ, LT, GT, LTE or GTE)")
    })?;

    let args = split_outside_quotes(inner, b',');
    if args.len() != 2 {
        return Err(format!(
            "`{code}` expects exactly two operands, found {}",
            args.len()
        ));
    }
    build_predicate(args[0], operator, args[1])
}

fn parse_infix_predicate(text: &str) -> Result<Predicate, String> {
    let text = text.trim();
    let runs = operator_runs(text);
    if runs.len() != 1 {
        return Err(format!(
            "expected exactly one comparison operator in `{text}`, found {}",
            runs.len()
        ));
    }
    let (start, end) = runs[0];
    let symbol = &text[start..end];
    let operator =
        Operator::from_symbol(symbol).ok_or_else(|| format!("unknown operator `{symbol}`"))?;
    build_predicate(&text[..start], operator, &text[end..])
}

fn build_predicate(lhs: &str, operator: Operator, rhs: &str) -> Result<Predicate, String> {
    let left = parse_operand(lhs)?;
    let right = parse_operand(rhs)?;
    if left.is_literal() && right.is_literal() {
        return Err(format!("predicate compares two literals: {left}{operator}{right}"));
    }
    Ok(Predicate::new(left, operator, right))
}

// ============================================================================
// Operands (nom)
// ============================================================================

fn parse_operand(text: &str) -> Result<Operand, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("missing operand".to_string());
    }
    all_consuming(operand)(text)
        .map(|(_, o)| o)
        .map_err(|_| {
            format!("operand `{text}` is neither a literal nor a `t1.`/`t2.` attribute reference")
        })
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn parse_ident(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        take_while1(is_ident_start),
        take_while(is_ident_continue),
    )))(input)
}

fn tuple_side(input: &str) -> IResult<&str, TupleSide> {
    alt((
        map(tag("t1"), |_| TupleSide::T1),
        map(tag("t2"), |_| TupleSide::T2),
    ))(input)
}

fn attribute_ref(input: &str) -> IResult<&str, Operand> {
    let (input, (side, _, name)) = tuple((tuple_side, pchar('.'), parse_ident))(input)?;
    Ok((input, Operand::attribute(side, name)))
}

fn double_quoted(input: &str) -> IResult<&str, &str> {
    recognize(tuple((pchar('"'), take_while(|c: char| c != '"'), pchar('"'))))(input)
}

fn single_quoted(input: &str) -> IResult<&str, &str> {
    recognize(tuple((pchar('\''), take_while(|c: char| c != '\''), pchar('\''))))(input)
}

fn number(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(alt((pchar('-'), pchar('+')))),
        digit1,
        opt(pair(pchar('.'), digit1)),
    )))(input)
}

fn literal(input: &str) -> IResult<&str, Operand> {
    map(alt((double_quoted, single_quoted, number)), |text: &str| {
        Operand::literal(text)
    })(input)
}

fn operand(input: &str) -> IResult<&str, Operand> {
    alt((attribute_ref, literal))(input)
}

// ============================================================================
// Quote-aware scanning
// ============================================================================

fn has_unterminated_quote(s: &str) -> bool {
    let mut quote: Option<u8> = None;
    for b in s.bytes() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None => {}
        }
    }
    quote.is_some()
}

fn split_outside_quotes(s: &str, sep: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0usize;
    let mut quote: Option<u8> = None;
    for (idx, b) in s.bytes().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == sep => {
                parts.push(&s[start..idx]);
                start = idx + 1;
            }
            None => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Split on the `AND` keyword (case-insensitive, whitespace on both sides).
fn split_conjuncts(line: &str) -> Vec<&str> {
    let bytes = line.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if is_and_keyword(bytes, i) => {
                parts.push(&line[start..i]);
                start = i + 3;
                i += 3;
                continue;
            }
            None => {}
        }
        i += 1;
    }
    parts.push(&line[start..]);
    parts
}

fn is_and_keyword(bytes: &[u8], i: usize) -> bool {
    i > 0
        && bytes[i - 1].is_ascii_whitespace()
        && bytes.len() > i + 3
        && bytes[i..i + 3].eq_ignore_ascii_case(b"and")
        && bytes[i + 3].is_ascii_whitespace()
}

/// Maximal runs of `<`, `>`, `=` outside string literals, as byte ranges.
fn operator_runs(s: &str) -> Vec<(usize, usize)> {
    let mut runs: Vec<(usize, usize)> = Vec::new();
    let mut quote: Option<u8> = None;
    let mut current: Option<usize> = None;

    for (idx, b) in s.bytes().enumerate() {
        let is_op = quote.is_none() && matches!(b, b'<' | b'>' | b'=');
        match (is_op, current) {
            (true, None) => current = Some(idx),
            (false, Some(start)) => {
                runs.push((start, idx));
                current = None;
            }
            _ => {}
        }
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None => {}
        }
    }
    if let Some(start) = current {
        runs.push((start, s.len()));
    }
    runs
}
