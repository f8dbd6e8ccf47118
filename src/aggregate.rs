use std::collections::{BTreeMap, HashMap};

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{Dimension, FactRecord, GroupAggregate, Label, Measure};
use crate::plan::AggregationPlan;

/// Running mean over the non-null values of one measure.
///
/// Sums in decimal so that a mean landing on a two-decimal midpoint, such as
/// `(1.00 + 1.01) / 2`, rounds the way the stored values read.
#[derive(Debug, Clone, Copy, Default)]
struct MeanAccumulator {
    sum: Decimal,
    count: u64,
}

impl MeanAccumulator {
    fn add(&mut self, value: Option<f64>) {
        // NaN and infinities have no decimal form and count as null.
        if let Some(value) = value.and_then(Decimal::from_f64) {
            self.sum += value;
            self.count += 1;
        }
    }

    fn finalize(self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        round_decimal(self.sum / Decimal::from(self.count)).to_f64()
    }
}

fn round_decimal(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds half away from zero to two decimals, at the decimal value the
/// float prints as rather than its binary expansion.
pub fn round2(value: f64) -> f64 {
    Decimal::from_f64(value)
        .and_then(|decimal| round_decimal(decimal).to_f64())
        .unwrap_or(value)
}

/// Null-safe grouped means over `records` along `plan.group_dimensions`.
///
/// Groups come out in order of first appearance. A plan without group
/// dimensions always yields exactly one row, with null measures when
/// `records` is empty.
pub fn aggregate(records: &[&FactRecord], plan: &AggregationPlan) -> Vec<GroupAggregate> {
    aggregate_by(records, &plan.group_dimensions, plan)
}

/// Groups by `dimensions`, labelling every other planned dimension `All`.
pub(crate) fn aggregate_by(
    records: &[&FactRecord],
    dimensions: &[Dimension],
    plan: &AggregationPlan,
) -> Vec<GroupAggregate> {
    let mut order: Vec<Vec<Label>> = Vec::new();
    let mut groups: HashMap<Vec<Label>, Vec<MeanAccumulator>> = HashMap::new();

    if dimensions.is_empty() {
        order.push(Vec::new());
        groups.insert(Vec::new(), vec![MeanAccumulator::default(); plan.measures.len()]);
    }

    for record in records {
        let key: Vec<Label> = dimensions
            .iter()
            .map(|dimension| Label::of(record, *dimension))
            .collect();

        let accumulators = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            vec![MeanAccumulator::default(); plan.measures.len()]
        });

        for (accumulator, measure) in accumulators.iter_mut().zip(&plan.measures) {
            accumulator.add(record.measure(*measure));
        }
    }

    order
        .into_iter()
        .filter_map(|key| {
            let accumulators = groups.remove(&key)?;
            Some(GroupAggregate {
                labels: labels_for(&key, dimensions, plan),
                values: values_for(&plan.measures, accumulators),
            })
        })
        .collect()
}

fn labels_for(
    key: &[Label],
    dimensions: &[Dimension],
    plan: &AggregationPlan,
) -> BTreeMap<Dimension, Label> {
    let mut labels: BTreeMap<Dimension, Label> = plan.pinned.iter().copied().collect();
    for dimension in &plan.group_dimensions {
        labels.insert(*dimension, Label::All);
    }
    for (dimension, label) in dimensions.iter().zip(key) {
        labels.insert(*dimension, *label);
    }
    labels
}

fn values_for(
    measures: &[Measure],
    accumulators: Vec<MeanAccumulator>,
) -> BTreeMap<Measure, Option<f64>> {
    measures
        .iter()
        .copied()
        .zip(accumulators.into_iter().map(MeanAccumulator::finalize))
        .collect()
}
