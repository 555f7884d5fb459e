//! Denial-constraint (DC) surface language
//!
//! This crate defines the typed model of a denial constraint (predicates over
//! the tuple variables `t1`/`t2`) and the `dc_v1` text parser that produces it.
//!
//! A DC is read as "no tuple pair may satisfy all of these predicates at
//! once". Constraint order and predicate order are preserved exactly as
//! written: downstream consumers index relaxations by position, so the parser
//! never reorders or deduplicates anything.

pub mod catalog;
pub mod dc_v1;
pub mod digest;
pub mod predicate;

pub use catalog::{AttributeCatalog, AttributeLookup};
pub use dc_v1::{parse_dc_v1, DcParseError};
pub use predicate::{
    ConstraintSet, DenialConstraint, Operand, OperandPosition, Operator, Predicate, TupleSide,
};
