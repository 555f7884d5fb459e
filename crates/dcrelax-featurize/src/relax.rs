//! Relaxation generator.
//!
//! For predicate `p` of constraint `c` and an attribute operand `x` of `p`,
//! the relaxed form of `c` is:
//!
//! - a candidate-pool match for the row that owns `x`,
//! - the pool's `attr_name` pinned to `x`'s attribute,
//! - `p` with `x` replaced by the pool's `attr_val`,
//! - every other predicate of `c`, unchanged and in order.
//!
//! Relaxed sets borrow from the source constraint and are rendered
//! immediately; nothing here mutates a predicate list.

use dcrelax_dsl::dc_v1::parse_dc_v1;
use dcrelax_dsl::predicate::Name;
use dcrelax_dsl::{
    AttributeLookup, ConstraintSet, DcParseError, DenialConstraint, Operand, OperandPosition,
    Operator, Predicate, TupleSide,
};
use serde::Serialize;
use thiserror::Error;

use crate::config::RelaxConfig;
use crate::render::TemplateRenderer;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelaxError {
    #[error(transparent)]
    Parse(#[from] DcParseError),

    #[error(
        "unknown attribute `{attribute}` in constraint #{constraint_index}, predicate #{predicate_index}\n  in: {text}"
    )]
    UnknownAttribute {
        attribute: Name,
        constraint_index: usize,
        predicate_index: usize,
        text: String,
    },

    /// A predicate without any attribute operand. The parser rejects these, so
    /// hitting this means the constraint set was built by hand incorrectly.
    #[error(
        "predicate #{predicate_index} of constraint #{constraint_index} has no attribute operand to relax\n  in: {text}"
    )]
    EmptyPredicateRelax {
        constraint_index: usize,
        predicate_index: usize,
        text: String,
    },
}

/// One emitted template plus the metadata a featurizer needs to attribute it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelaxationEntry {
    pub template: String,
    pub attribute: Name,
    pub side: TupleSide,
    pub source_constraint_index: usize,
    pub predicate_index: usize,
    /// Tuple variables the source constraint ranges over.
    pub tuple_names: Vec<TupleSide>,
}

/// The relaxed predicate: the candidate value takes the place of the operand
/// at `candidate`, compared against `opposite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaxedComparison<'a> {
    pub candidate: OperandPosition,
    /// Operator exactly as written in the source predicate.
    pub operator: Operator,
    pub opposite: &'a Operand,
}

impl RelaxedComparison<'_> {
    /// Operator read as `candidate <op> opposite`.
    ///
    /// Relaxing the right operand of `t1.B > t2.B` gives `t1.B > cand`, which
    /// is `cand < t1.B`.
    pub fn candidate_operator(&self) -> Operator {
        match self.candidate {
            OperandPosition::Left => self.operator,
            OperandPosition::Right => self.operator.mirrored(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaxedPredicateSet<'a> {
    pub side: TupleSide,
    pub attribute: &'a str,
    pub comparison: RelaxedComparison<'a>,
    /// Every other predicate of the constraint, in definition order.
    pub others: Vec<&'a Predicate>,
}

/// Relax the operand at `position` of predicate `predicate_index`.
///
/// Returns `None` when the index is out of range or the operand is a literal.
pub fn relax_predicate(
    constraint: &DenialConstraint,
    predicate_index: usize,
    position: OperandPosition,
) -> Option<RelaxedPredicateSet<'_>> {
    let predicate = constraint.predicates().get(predicate_index)?;
    let (side, attribute) = predicate.operand(position).as_attribute()?;
    let opposite = match position {
        OperandPosition::Left => &predicate.right,
        OperandPosition::Right => &predicate.left,
    };
    let others = constraint
        .predicates()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != predicate_index)
        .map(|(_, p)| p)
        .collect();

    Some(RelaxedPredicateSet {
        side,
        attribute,
        comparison: RelaxedComparison {
            candidate: position,
            operator: predicate.operator,
            opposite,
        },
        others,
    })
}

/// Relax every attribute operand of every constraint, in contract order.
///
/// Either the full sequence is produced or the first error is returned.
pub fn generate_relaxations<C>(
    set: &ConstraintSet,
    catalog: &C,
    config: &RelaxConfig,
) -> Result<Vec<RelaxationEntry>, RelaxError>
where
    C: AttributeLookup + ?Sized,
{
    let renderer = TemplateRenderer::new(config);
    let entries = set
        .iter()
        .enumerate()
        .try_fold(Vec::new(), |mut out, (constraint_index, constraint)| {
            out.extend(relax_constraint(
                constraint_index,
                constraint,
                catalog,
                &renderer,
            )?);
            Ok::<_, RelaxError>(out)
        })?;

    tracing::debug!(
        constraints = set.len(),
        relaxations = entries.len(),
        "generated relaxations"
    );
    Ok(entries)
}

/// Parse constraint text, then relax it.
pub fn relax_dc_text<C>(
    text: &str,
    catalog: &C,
    config: &RelaxConfig,
) -> Result<Vec<RelaxationEntry>, RelaxError>
where
    C: AttributeLookup + ?Sized,
{
    let set = parse_dc_v1(text)?;
    generate_relaxations(&set, catalog, config)
}

fn relax_constraint<C>(
    constraint_index: usize,
    constraint: &DenialConstraint,
    catalog: &C,
    renderer: &TemplateRenderer<'_>,
) -> Result<Vec<RelaxationEntry>, RelaxError>
where
    C: AttributeLookup + ?Sized,
{
    check_attributes(constraint_index, constraint, catalog)?;

    let tuple_names = constraint.tuple_names();
    let mut out = Vec::new();

    for (predicate_index, predicate) in constraint.predicates().iter().enumerate() {
        let empty = || RelaxError::EmptyPredicateRelax {
            constraint_index,
            predicate_index,
            text: constraint.source().to_string(),
        };

        let positions = predicate.relaxable_operands();
        if positions.is_empty() {
            return Err(empty());
        }

        for position in positions {
            let relaxed =
                relax_predicate(constraint, predicate_index, position).ok_or_else(empty)?;
            let template = renderer.render(&relaxed);
            tracing::trace!(
                constraint = constraint_index,
                predicate = predicate_index,
                side = %relaxed.side,
                attribute = relaxed.attribute,
                %template,
                "relaxed predicate"
            );
            out.push(RelaxationEntry {
                template,
                attribute: relaxed.attribute.to_string(),
                side: relaxed.side,
                source_constraint_index: constraint_index,
                predicate_index,
                tuple_names: tuple_names.clone(),
            });
        }
    }

    tracing::debug!(
        constraint = constraint_index,
        predicates = constraint.len(),
        relaxations = out.len(),
        "relaxed denial constraint"
    );
    Ok(out)
}

fn check_attributes<C>(
    constraint_index: usize,
    constraint: &DenialConstraint,
    catalog: &C,
) -> Result<(), RelaxError>
where
    C: AttributeLookup + ?Sized,
{
    for (predicate_index, predicate) in constraint.predicates().iter().enumerate() {
        for (_, attribute) in predicate.attributes() {
            if !catalog.contains_attribute(attribute) {
                return Err(RelaxError::UnknownAttribute {
                    attribute: attribute.to_string(),
                    constraint_index,
                    predicate_index,
                    text: constraint.source().to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcrelax_dsl::AttributeCatalog;

    fn catalog() -> AttributeCatalog {
        AttributeCatalog::new(["A", "B", "C", "D", "E"])
    }

    #[test]
    fn literal_predicates_yield_one_relaxation() {
        let entries = relax_dc_text(
            "t1.C = \"f\" AND t2.C = \"m\"",
            &catalog(),
            &RelaxConfig::default(),
        )
        .unwrap();
        let sides: Vec<_> = entries.iter().map(|e| (e.predicate_index, e.side)).collect();
        assert_eq!(sides, vec![(0, TupleSide::T1), (1, TupleSide::T2)]);
    }

    #[test]
    fn relax_predicate_borrows_other_predicates_in_order() {
        let set = parse_dc_v1("t1.A=t2.A AND t1.B<t2.B AND t1.C=\"x\"").unwrap();
        let dc = &set.constraints()[0];

        let relaxed = relax_predicate(dc, 1, OperandPosition::Right).unwrap();
        assert_eq!(relaxed.side, TupleSide::T2);
        assert_eq!(relaxed.attribute, "B");
        assert_eq!(relaxed.comparison.operator, Operator::Lt);
        assert_eq!(relaxed.comparison.candidate_operator(), Operator::Gt);
        assert_eq!(
            relaxed.comparison.opposite,
            &Operand::attribute(TupleSide::T1, "B")
        );
        let others: Vec<String> = relaxed.others.iter().map(|p| p.to_string()).collect();
        assert_eq!(others, vec!["t1.A=t2.A", "t1.C=\"x\""]);

        assert!(relax_predicate(dc, 2, OperandPosition::Right).is_none());
        assert!(relax_predicate(dc, 3, OperandPosition::Left).is_none());
    }

    #[test]
    fn unknown_attribute_is_reported_with_location() {
        let err = relax_dc_text(
            "t1.A = t2.A\nt1.B = t2.B AND t1.Zip <> t2.Zip",
            &catalog(),
            &RelaxConfig::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RelaxError::UnknownAttribute {
                attribute: "Zip".to_string(),
                constraint_index: 1,
                predicate_index: 1,
                text: "t1.B = t2.B AND t1.Zip <> t2.Zip".to_string(),
            }
        );
    }

    #[test]
    fn malformed_text_propagates_parse_error() {
        let err = relax_dc_text("t1.A = A", &catalog(), &RelaxConfig::default()).unwrap_err();
        assert!(matches!(err, RelaxError::Parse(_)));
    }

    #[test]
    fn literal_only_predicate_is_a_contract_failure() {
        let dc = DenialConstraint::new(
            vec![
                Predicate::new(
                    Operand::attribute(TupleSide::T1, "A"),
                    Operator::Eq,
                    Operand::attribute(TupleSide::T2, "A"),
                ),
                Predicate::new(Operand::literal("1"), Operator::Lt, Operand::literal("2")),
            ],
            "hand-built",
            0,
        );
        let err = generate_relaxations(
            &ConstraintSet::new(vec![dc]),
            &catalog(),
            &RelaxConfig::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RelaxError::EmptyPredicateRelax {
                constraint_index: 0,
                predicate_index: 1,
                text: "hand-built".to_string(),
            }
        );
    }

    #[test]
    fn single_tuple_constraints_report_one_tuple_name() {
        let entries = relax_dc_text(
            "t1.A = \"x\" AND t1.B <> t1.C",
            &catalog(),
            &RelaxConfig::default(),
        )
        .unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.tuple_names == vec![TupleSide::T1]));
        assert!(entries.iter().all(|e| e.side == TupleSide::T1));
    }
}
