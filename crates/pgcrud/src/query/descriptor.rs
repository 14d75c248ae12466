use super::modifier::{Columns, Expression, Join, Modifier, Projected, Slice};
use crate::filter::{Filter, FilterSpec};
use crate::row::Row;

/// The terminal operation of a chain and its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Create(Row),
    Read(FilterSpec),
    Update(Row),
    Delete(FilterSpec),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Create(_) => "create",
            Operation::Read(_) => "read",
            Operation::Update(_) => "update",
            Operation::Delete(_) => "delete",
        }
    }
}

/// Merged state of one query chain, ready to be compiled.
#[derive(Debug, Clone)]
pub struct QueryDescriptor {
    pub operation: Operation,
    /// AND-ed filters, in declaration order.
    pub filters: Vec<Filter>,
    /// AND-ed raw expressions, in declaration order.
    pub expressions: Vec<Expression>,
    pub fields: Option<Vec<Projected>>,
    pub sort: Option<Columns>,
    pub aggregate: Option<Columns>,
    pub slice: Option<Slice>,
    pub join: Option<Join>,
    /// Bulk update/delete unlocked with `all()`.
    pub all: bool,
}

impl QueryDescriptor {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            filters: Vec::new(),
            expressions: Vec::new(),
            fields: None,
            sort: None,
            aggregate: None,
            slice: None,
            join: None,
            all: false,
        }
    }

    /// Merge a chain of modifiers, given in declaration order.
    ///
    /// Filters and expressions accumulate. For single-valued modifiers the
    /// one declared last, closest to the terminal verb, wins.
    pub fn merge(operation: Operation, modifiers: &[Modifier], all: bool) -> Self {
        let mut desc = Self::new(operation);
        desc.all = all;
        for modifier in modifiers {
            match modifier {
                Modifier::Filter(filter) => desc.filters.push(filter.clone()),
                Modifier::Expression(expr) => desc.expressions.push(expr.clone()),
                Modifier::Slice(slice) => desc.slice = Some(*slice),
                Modifier::Sort(sort) => desc.sort = Some(sort.clone()),
                Modifier::Fields(fields) => desc.fields = Some(fields.clone()),
                Modifier::Aggregate(group) => desc.aggregate = Some(group.clone()),
                Modifier::Join(join) => desc.join = Some(join.clone()),
            }
        }
        desc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_declared_single_valued_modifier_wins() {
        let modifiers = vec![
            Modifier::Sort("a".into()),
            Modifier::Slice(Slice { offset: 1, count: 2 }),
            Modifier::Sort("b".into()),
            Modifier::Filter(Filter::new([("x", 1)])),
            Modifier::Filter(Filter::negated(false)),
        ];
        let desc = QueryDescriptor::merge(Operation::Read(FilterSpec::MatchAll), &modifiers, false);
        assert_eq!(desc.sort, Some(Columns::from("b")));
        assert_eq!(desc.slice, Some(Slice { offset: 1, count: 2 }));
        assert_eq!(desc.filters.len(), 2);
        assert!(desc.filters[1].is_negated());
        assert!(!desc.all);
    }

    #[test]
    fn operation_names() {
        assert_eq!(Operation::Delete(FilterSpec::MatchAll).name(), "delete");
        assert_eq!(Operation::Create(Row::new()).name(), "create");
    }
}
