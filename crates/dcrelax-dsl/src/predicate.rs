//! Predicate model for denial constraints.
//!
//! A predicate is one atomic comparison `left <op> right` where each operand is
//! either an attribute of one of the two tuple variables (`t1.A`, `t2.B`) or a
//! literal constant carried verbatim from the source text.
//!
//! Notes:
//! - Literals keep their original quoting (`"f"`, `'m'`, `42`). Nothing in this
//!   crate re-quotes or re-types a literal.
//! - `Display` for `Predicate` is the compact canonical form (`t1.B<>t2.B`)
//!   that relaxed templates embed for the predicates they leave unchanged.

use serde::{Deserialize, Serialize};

pub type Name = String;

// ============================================================================
// Tuple sides and operators
// ============================================================================

/// One of the two tuple variables a DC ranges over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TupleSide {
    T1,
    T2,
}

impl TupleSide {
    pub const ALL: [TupleSide; 2] = [TupleSide::T1, TupleSide::T2];

    pub fn as_str(self) -> &'static str {
        match self {
            TupleSide::T1 => "t1",
            TupleSide::T2 => "t2",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "t1" => Some(TupleSide::T1),
            "t2" => Some(TupleSide::T2),
            _ => None,
        }
    }
}

impl std::fmt::Display for TupleSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Operator {
    pub const ALL: [Operator; 6] = [
        Operator::Eq,
        Operator::Neq,
        Operator::Lt,
        Operator::Gt,
        Operator::Le,
        Operator::Ge,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Neq => "<>",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Le => "<=",
            Operator::Ge => ">=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    /// Keyword used by the tuple-prefixed (`t1&t2&EQ(..)`) dialect.
    pub fn code(self) -> &'static str {
        match self {
            Operator::Eq => "EQ",
            Operator::Neq => "IQ",
            Operator::Lt => "LT",
            Operator::Gt => "GT",
            Operator::Le => "LTE",
            Operator::Ge => "GTE",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.code() == code)
    }

    /// The operator that keeps the comparison meaning when its operands are
    /// swapped: `<`/`>` and `<=`/`>=` trade places, `=` and `<>` are fixed.
    pub fn mirrored(self) -> Self {
        match self {
            Operator::Eq => Operator::Eq,
            Operator::Neq => Operator::Neq,
            Operator::Lt => Operator::Gt,
            Operator::Gt => Operator::Lt,
            Operator::Le => Operator::Ge,
            Operator::Ge => Operator::Le,
        }
    }

    pub fn is_symmetric(self) -> bool {
        matches!(self, Operator::Eq | Operator::Neq)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

// ============================================================================
// Operands and predicates
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "snake_case")]
pub enum Operand {
    Attribute { side: TupleSide, name: Name },
    /// Literal constant, quotes included, exactly as written in the source.
    Literal { text: String },
}

impl Operand {
    pub fn attribute(side: TupleSide, name: impl Into<Name>) -> Self {
        Operand::Attribute {
            side,
            name: name.into(),
        }
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Operand::Literal { text: text.into() }
    }

    pub fn as_attribute(&self) -> Option<(TupleSide, &str)> {
        match self {
            Operand::Attribute { side, name } => Some((*side, name.as_str())),
            Operand::Literal { .. } => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Operand::Literal { .. })
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Attribute { side, name } => write!(f, "{side}.{name}"),
            Operand::Literal { text } => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperandPosition {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Predicate {
    pub left: Operand,
    pub operator: Operator,
    pub right: Operand,
}

impl Predicate {
    pub fn new(left: Operand, operator: Operator, right: Operand) -> Self {
        Self {
            left,
            operator,
            right,
        }
    }

    pub fn operand(&self, position: OperandPosition) -> &Operand {
        match position {
            OperandPosition::Left => &self.left,
            OperandPosition::Right => &self.right,
        }
    }

    /// Attribute-to-attribute predicates can be relaxed from either tuple side.
    pub fn is_symmetric(&self) -> bool {
        !self.left.is_literal() && !self.right.is_literal()
    }

    /// Positions of the attribute operands, `t1` before `t2`, left before
    /// right when both operands sit on the same tuple.
    ///
    /// Empty only for a literal-to-literal predicate, which the parser never
    /// produces.
    pub fn relaxable_operands(&self) -> Vec<OperandPosition> {
        let mut positions: Vec<(TupleSide, OperandPosition)> =
            [OperandPosition::Left, OperandPosition::Right]
                .into_iter()
                .filter_map(|pos| self.operand(pos).as_attribute().map(|(side, _)| (side, pos)))
                .collect();
        // Stable: same-side operands keep left-then-right.
        positions.sort_by_key(|(side, _)| *side);
        positions.into_iter().map(|(_, pos)| pos).collect()
    }

    /// Same comparison with operands swapped.
    pub fn mirrored(&self) -> Predicate {
        Predicate {
            left: self.right.clone(),
            operator: self.operator.mirrored(),
            right: self.left.clone(),
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = (TupleSide, &str)> {
        [&self.left, &self.right]
            .into_iter()
            .filter_map(Operand::as_attribute)
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.left, self.operator, self.right)
    }
}

// ============================================================================
// Constraints
// ============================================================================

/// An ordered conjunction of predicates. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenialConstraint {
    predicates: Vec<Predicate>,
    source: String,
    line: usize,
}

impl DenialConstraint {
    pub fn new(predicates: Vec<Predicate>, source: impl Into<String>, line: usize) -> Self {
        Self {
            predicates,
            source: source.into(),
            line,
        }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Raw (trimmed) source text of the constraint.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// 1-based line number in the source text; 0 when built programmatically.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Distinct tuple variables referenced by the predicates, `t1` first.
    pub fn tuple_names(&self) -> Vec<TupleSide> {
        let mut sides: Vec<TupleSide> = self
            .predicates
            .iter()
            .flat_map(|p| p.attributes().map(|(side, _)| side))
            .collect();
        sides.sort();
        sides.dedup();
        sides
    }

    pub fn is_single_tuple(&self) -> bool {
        self.tuple_names().len() < 2
    }

    /// Distinct attribute names, in order of first appearance.
    pub fn attributes(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for (_, name) in self.predicates.iter().flat_map(Predicate::attributes) {
            if !out.contains(&name) {
                out.push(name);
            }
        }
        out
    }
}

impl std::fmt::Display for DenialConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{predicate}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSet {
    constraints: Vec<DenialConstraint>,
}

impl ConstraintSet {
    pub fn new(constraints: Vec<DenialConstraint>) -> Self {
        Self { constraints }
    }

    pub fn constraints(&self) -> &[DenialConstraint] {
        &self.constraints
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DenialConstraint> {
        self.constraints.iter()
    }

    pub fn get(&self, index: usize) -> Option<&DenialConstraint> {
        self.constraints.get(index)
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn predicate_count(&self) -> usize {
        self.constraints.iter().map(DenialConstraint::len).sum()
    }

    /// Every attribute constrained by the set, in order of first appearance.
    pub fn constrained_attributes(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for name in self.constraints.iter().flat_map(DenialConstraint::attributes) {
            if !out.contains(&name) {
                out.push(name);
            }
        }
        out
    }
}

impl<'a> IntoIterator for &'a ConstraintSet {
    type Item = &'a DenialConstraint;
    type IntoIter = std::slice::Iter<'a, DenialConstraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.constraints.iter()
    }
}
