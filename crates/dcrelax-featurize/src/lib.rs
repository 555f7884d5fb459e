//! Denial-constraint relaxation
//!
//! For every (constraint, predicate, attribute operand) of a constraint set,
//! the generator replaces that operand with a reference to the candidate
//! pool (`postab`) and renders the result as a query template:
//!
//! ```text
//! postab.tid = t1.__ind AND postab.attr_name ='A' AND postab.attr_val=t2.A AND  t1.B<>t2.B
//! ```
//!
//! Evaluating a template answers "does candidate value V for this cell keep
//! the original constraint violated?". Executing templates is left to the
//! caller.
//!
//! Output order is a contract: constraints in set order, then predicates in
//! definition order, then `t1` before `t2`.

pub mod config;
pub mod relax;
pub mod render;

pub use config::{ConfigError, RelaxConfig};
pub use relax::{
    generate_relaxations, relax_dc_text, relax_predicate, RelaxError, RelaxationEntry,
    RelaxedComparison, RelaxedPredicateSet,
};
pub use render::TemplateRenderer;
