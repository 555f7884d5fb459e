//! Template renderer.
//!
//! Output must byte-match templates produced by earlier releases, including
//! the asymmetric `='A'` / `= 'A'` spacing and the double space after each
//! trailing `AND`. Golden tests pin both.

use dcrelax_dsl::OperandPosition;

use crate::config::RelaxConfig;
use crate::relax::RelaxedPredicateSet;

#[derive(Debug, Clone, Copy)]
pub struct TemplateRenderer<'c> {
    config: &'c RelaxConfig,
}

impl<'c> TemplateRenderer<'c> {
    pub fn new(config: &'c RelaxConfig) -> Self {
        Self { config }
    }

    pub fn render(&self, relaxed: &RelaxedPredicateSet<'_>) -> String {
        let pool = self.config.pool_alias.as_str();
        let comparison = &relaxed.comparison;

        let mut out = format!(
            "{pool}.tid = {}.{} AND ",
            relaxed.side, self.config.index_name
        );
        match comparison.candidate {
            OperandPosition::Left => out.push_str(&format!(
                "{pool}.attr_name ='{}' AND {pool}.attr_val{}{}",
                relaxed.attribute, comparison.operator, comparison.opposite
            )),
            OperandPosition::Right => out.push_str(&format!(
                "{pool}.attr_name = '{}' AND {}{}{pool}.attr_val",
                relaxed.attribute, comparison.opposite, comparison.operator
            )),
        }
        for other in &relaxed.others {
            out.push_str(" AND  ");
            out.push_str(&other.to_string());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relax::relax_predicate;
    use dcrelax_dsl::dc_v1::parse_dc_v1;

    fn render_one(
        text: &str,
        predicate: usize,
        position: OperandPosition,
        config: &RelaxConfig,
    ) -> String {
        let set = parse_dc_v1(text).unwrap();
        let relaxed = relax_predicate(&set.constraints()[0], predicate, position).unwrap();
        TemplateRenderer::new(config).render(&relaxed)
    }

    #[test]
    fn left_candidate_layout() {
        let s = render_one(
            "t1.A=t2.A AND t1.B<>t2.B",
            0,
            OperandPosition::Left,
            &RelaxConfig::default(),
        );
        assert_eq!(
            s,
            "postab.tid = t1.__ind AND postab.attr_name ='A' AND postab.attr_val=t2.A AND  t1.B<>t2.B"
        );
    }

    #[test]
    fn right_candidate_layout() {
        let s = render_one(
            "t1.A=t2.A AND t1.B>t2.B",
            1,
            OperandPosition::Right,
            &RelaxConfig::default(),
        );
        assert_eq!(
            s,
            "postab.tid = t2.__ind AND postab.attr_name = 'B' AND t1.B>postab.attr_val AND  t1.A=t2.A"
        );
    }

    #[test]
    fn literal_on_the_left_stays_verbatim() {
        let s = render_one("'x' <= t2.C", 0, OperandPosition::Right, &RelaxConfig::default());
        assert_eq!(s, "postab.tid = t2.__ind AND postab.attr_name = 'C' AND 'x'<=postab.attr_val");
    }

    #[test]
    fn configured_names_are_used() {
        let config = RelaxConfig::default()
            .with_index_name("_tid_")
            .with_pool_alias("cand");
        let s = render_one("t1.C>=\"f\" AND t1.E=t2.E", 0, OperandPosition::Left, &config);
        assert_eq!(
            s,
            "cand.tid = t1._tid_ AND cand.attr_name ='C' AND cand.attr_val>=\"f\" AND  t1.E=t2.E"
        );
    }
}
