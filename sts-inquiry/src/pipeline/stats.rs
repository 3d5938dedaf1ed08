//! Missing-value tolerant aggregates.
//!
//! Every aggregate skips missing values. An input without any present value
//! (empty, or all `None`) yields `None` instead of an error, whatever the
//! aggregate.

use std::collections::HashMap;
use std::hash::Hash;

/// Numeric aggregate selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Mean,
    Min,
    Max,
}

/// Apply `stat` to the present values. `NaN` counts as missing.
pub fn statistic<I>(stat: Statistic, values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut present = values.into_iter().flatten().filter(|v| !v.is_nan());
    let first = present.next()?;

    match stat {
        Statistic::Mean => {
            let (sum, count) = present.fold((first, 1usize), |(sum, count), v| (sum + v, count + 1));
            Some(sum / count as f64)
        }
        Statistic::Min => Some(present.fold(first, f64::min)),
        Statistic::Max => Some(present.fold(first, f64::max)),
    }
}

/// Arithmetic mean of the present values.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    statistic(Statistic::Mean, values)
}

/// Minimum of the present values.
pub fn min<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    statistic(Statistic::Min, values)
}

/// Most frequent present value.
///
/// Ties go to the value encountered first.
pub fn mode<T, I>(values: I) -> Option<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = Option<T>>,
{
    // value -> (count, first position)
    let mut counts: HashMap<T, (usize, usize)> = HashMap::new();
    for (pos, value) in values.into_iter().flatten().enumerate() {
        counts.entry(value).or_insert((0, pos)).0 += 1;
    }

    counts
        .into_iter()
        .max_by(|(_, (count_a, pos_a)), (_, (count_b, pos_b))| {
            count_a.cmp(count_b).then(pos_b.cmp(pos_a))
        })
        .map(|(value, _)| value)
}
