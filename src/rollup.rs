use crate::aggregate::aggregate_by;
use crate::models::{FactRecord, GroupAggregate};
use crate::plan::AggregationPlan;

/// Appends rollup rows to `detail` when the plan asks for them.
///
/// Rollup is hierarchical: each level drops the innermost remaining group
/// dimension and recomputes the means from `records`, so subtotals are
/// means over records rather than means of group means. With dimensions
/// `[AgeBucket, Gender]` this adds one row per age bucket followed by the
/// grand total; with a single dimension only the grand total is added.
pub fn expand(
    records: &[&FactRecord],
    mut detail: Vec<GroupAggregate>,
    plan: &AggregationPlan,
) -> Vec<GroupAggregate> {
    if !plan.rollup || plan.group_dimensions.is_empty() {
        return detail;
    }

    for level in (0..plan.group_dimensions.len()).rev() {
        detail.extend(aggregate_by(records, &plan.group_dimensions[..level], plan));
    }
    detail
}
