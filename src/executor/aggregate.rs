use rust_decimal::Decimal;

/// Running sum and count over a stream of fixed-point values.
///
/// Only the two accumulators are kept, never the values themselves. All
/// arithmetic stays in `Decimal`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningMean {
    sum: Decimal,
    count: u64,
}

impl RunningMean {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, value: Decimal) {
        self.sum += value;
        self.count += 1;
    }

    pub fn sum(&self) -> Decimal {
        self.sum
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// `None` when nothing was observed.
    pub fn mean(&self) -> Option<Decimal> {
        if self.count == 0 {
            return None;
        }
        Some(self.sum / Decimal::from(self.count))
    }
}

impl Extend<Decimal> for RunningMean {
    fn extend<I: IntoIterator<Item = Decimal>>(&mut self, values: I) {
        for value in values {
            self.observe(value);
        }
    }
}

impl FromIterator<Decimal> for RunningMean {
    fn from_iter<I: IntoIterator<Item = Decimal>>(values: I) -> Self {
        let mut mean = Self::new();
        mean.extend(values);
        mean
    }
}

/// Mean of `values`, consumed one at a time.
pub fn average<I: IntoIterator<Item = Decimal>>(values: I) -> Option<Decimal> {
    values.into_iter().collect::<RunningMean>().mean()
}
