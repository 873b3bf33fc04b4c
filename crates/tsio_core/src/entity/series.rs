//! Timestamp-indexed value series.

use chrono::{DateTime, Utc};
use std::collections::btree_map::{self, Entry};
use std::collections::BTreeMap;
use std::fmt;

/// An ordered series of numeric observations keyed by timestamp.
///
/// Timestamps are unique and iterate in ascending order. Missing
/// observations are never stored: merging a null or NaN observation removes
/// whatever was held at that timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSeries {
    points: BTreeMap<DateTime<Utc>, f64>,
}

impl ValueSeries {
    /// Creates an empty series.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the series holds no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the observation at exactly `at`.
    #[must_use]
    pub fn get(&self, at: &DateTime<Utc>) -> Option<f64> {
        self.points.get(at).copied()
    }

    /// Returns true if there is an observation at exactly `at`.
    #[must_use]
    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        self.points.contains_key(at)
    }

    /// Returns the earliest observation.
    #[must_use]
    pub fn first(&self) -> Option<(DateTime<Utc>, f64)> {
        self.points.iter().next().map(|(t, v)| (*t, *v))
    }

    /// Returns the latest observation.
    #[must_use]
    pub fn last(&self) -> Option<(DateTime<Utc>, f64)> {
        self.points.iter().next_back().map(|(t, v)| (*t, *v))
    }

    /// Iterates observations in ascending timestamp order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.points.iter().map(|(t, v)| (*t, *v))
    }

    /// Iterates timestamps in ascending order.
    pub fn timestamps(&self) -> impl DoubleEndedIterator<Item = DateTime<Utc>> + '_ {
        self.points.keys().copied()
    }

    /// Merges `incoming` observations into the series.
    ///
    /// Incoming observations take priority over held ones. Within
    /// `incoming`, the first observation for a timestamp wins. A `None` or
    /// NaN observation that wins removes the timestamp.
    pub fn merge<I>(&mut self, incoming: I)
    where
        I: IntoIterator<Item = (DateTime<Utc>, Option<f64>)>,
    {
        let mut winners: BTreeMap<DateTime<Utc>, Option<f64>> = BTreeMap::new();
        for (at, value) in incoming {
            if let Entry::Vacant(slot) = winners.entry(at) {
                slot.insert(value.filter(|v| !v.is_nan()));
            }
        }

        for (at, value) in winners {
            match value {
                Some(v) => {
                    self.points.insert(at, v);
                }
                None => {
                    self.points.remove(&at);
                }
            }
        }
    }

    /// Merges another series into this one, the other series winning.
    pub fn merge_series(&mut self, other: &ValueSeries) {
        self.merge(other.iter().map(|(t, v)| (t, Some(v))));
    }

    /// Looks up the value at `at`.
    ///
    /// With `last_available`, the observation at the greatest timestamp not
    /// after `at` is used; otherwise only an exact match counts. `fill` is
    /// returned when nothing qualifies.
    #[must_use]
    pub fn value_at(&self, at: &DateTime<Utc>, last_available: bool, fill: f64) -> f64 {
        let found = if last_available {
            self.points.range(..=*at).next_back().map(|(_, v)| *v)
        } else {
            self.get(at)
        };
        found.unwrap_or(fill)
    }

    /// Looks up several timestamps at once. See [`ValueSeries::value_at`].
    #[must_use]
    pub fn values_at(&self, ats: &[DateTime<Utc>], last_available: bool, fill: f64) -> Vec<f64> {
        ats.iter()
            .map(|at| self.value_at(at, last_available, fill))
            .collect()
    }

    /// Removes every observation.
    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl FromIterator<(DateTime<Utc>, f64)> for ValueSeries {
    fn from_iter<T: IntoIterator<Item = (DateTime<Utc>, f64)>>(iter: T) -> Self {
        let mut series = ValueSeries::new();
        series.merge(iter.into_iter().map(|(t, v)| (t, Some(v))));
        series
    }
}

impl<'a> IntoIterator for &'a ValueSeries {
    type Item = (&'a DateTime<Utc>, &'a f64);
    type IntoIter = btree_map::Iter<'a, DateTime<Utc>, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl fmt::Display for ValueSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "(no values)");
        }
        for (at, value) in self.iter() {
            writeln!(f, "{}    {value}", at.to_rfc3339())?;
        }
        Ok(())
    }
}
