//! Composable record predicates
//!
//! A `Predicate` is a small expression tree over records that renders into a
//! parameterised SQL boolean expression. The rendered SQL expects the records
//! table to be aliased as `r`. Joins through tags and comments are written as
//! `EXISTS` sub-selects, so a matching record appears once no matter how many
//! of its tags or comments match.

use sqlx::{QueryBuilder, Sqlite};

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every record
    Always,
    /// Case-insensitive substring of the description
    DescriptionContains(String),
    /// Record carries a tag with exactly this name
    HasTag(String),
    /// Any comment contains the term, case-insensitively
    CommentContains(String),
    /// Case-insensitive exact match on the primary color
    ColorIs(String),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Conjunction that drops `Always` operands.
    pub fn all_of(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
        let mut parts: Vec<Predicate> = predicates
            .into_iter()
            .filter(|p| *p != Predicate::Always)
            .collect();

        match parts.len() {
            0 => Predicate::Always,
            1 => parts.remove(0),
            _ => Predicate::And(parts),
        }
    }

    /// Disjunction over a category's terms.
    ///
    /// No terms means the category was not supplied, which constrains nothing.
    pub fn any_of(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
        let mut parts: Vec<Predicate> = predicates.into_iter().collect();

        if parts.iter().any(|p| *p == Predicate::Always) {
            return Predicate::Always;
        }

        match parts.len() {
            0 => Predicate::Always,
            1 => parts.remove(0),
            _ => Predicate::Or(parts),
        }
    }

    pub fn is_always(&self) -> bool {
        matches!(self, Predicate::Always)
    }

    /// Append this predicate as a SQL boolean expression.
    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            Predicate::Always => {
                qb.push("1 = 1");
            }
            Predicate::DescriptionContains(term) => {
                qb.push("instr(r.description_folded, ");
                qb.push_bind(term.to_lowercase());
                qb.push(") > 0");
            }
            Predicate::HasTag(name) => {
                qb.push(
                    "EXISTS (SELECT 1 FROM record_tags rt JOIN tags t ON t.id = rt.tag_id \
                     WHERE rt.record_id = r.id AND t.name = ",
                );
                qb.push_bind(name.clone());
                qb.push(")");
            }
            Predicate::CommentContains(term) => {
                qb.push(
                    "EXISTS (SELECT 1 FROM comments c \
                     WHERE c.record_id = r.id AND instr(c.text_folded, ",
                );
                qb.push_bind(term.to_lowercase());
                qb.push(") > 0)");
            }
            Predicate::ColorIs(color) => {
                qb.push("r.primary_color = ");
                qb.push_bind(color.to_lowercase());
            }
            Predicate::And(parts) => push_joined(qb, parts, " AND ", "1 = 1"),
            Predicate::Or(parts) => push_joined(qb, parts, " OR ", "0 = 1"),
        }
    }
}

fn push_joined(
    qb: &mut QueryBuilder<'_, Sqlite>,
    parts: &[Predicate],
    separator: &str,
    empty: &str,
) {
    if parts.is_empty() {
        qb.push(empty);
        return;
    }

    qb.push("(");
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            qb.push(separator);
        }
        part.push_sql(qb);
    }
    qb.push(")");
}
