//! Recorder: the entry point an instrumentation host holds for one session.
//!
//! It picks a tally from [`TallyConfig`], owns the single lock around it, and
//! writes the final report. Every method may be called from any thread.

use crate::bounded::BoundedAggregator;
use crate::config::{TallyConfig, TallyMode};
use crate::counter_aggregator::CounterAggregator;
use crate::error::{ReportError, Result};
use crate::int_key::IntKey;
use crate::report::{self, KeyResolver};
use crate::shared::{EventTotal, Shared};
use crate::tally::Tally;
use std::io::Write;

#[derive(Debug)]
pub enum Recorder<K> {
    Detailed(Shared<CounterAggregator<K>>),
    Bounded(Shared<BoundedAggregator<K>>),
    TotalOnly(EventTotal),
}

impl<K: IntKey> Recorder<K> {
    pub fn new(config: TallyConfig) -> Result<Self> {
        let recorder = match config.mode {
            TallyMode::Detailed => {
                Recorder::Detailed(Shared::new(CounterAggregator::with_config(config.table)?))
            }
            TallyMode::Bounded { limit } => Recorder::Bounded(Shared::new(
                BoundedAggregator::with_config(limit, config.table)?,
            )),
            TallyMode::TotalOnly => Recorder::TotalOnly(EventTotal::new()),
        };
        log::debug!("recorder created in {:?} mode", config.mode);
        Ok(recorder)
    }

    /// Count one event for `key`.
    pub fn record(&self, key: K) -> Result<()> {
        match self {
            Recorder::Detailed(shared) => shared.with(|agg| agg.record(key)),
            Recorder::Bounded(shared) => shared.with(|agg| agg.record(key)),
            Recorder::TotalOnly(total) => {
                total.record();
                Ok(())
            }
        }
    }

    pub fn total(&self) -> u64 {
        match self {
            Recorder::Detailed(shared) => shared.with(|agg| agg.total()),
            Recorder::Bounded(shared) => shared.with(|agg| agg.total()),
            Recorder::TotalOnly(total) => total.get(),
        }
    }

    /// Number of keys a report would list; zero in total-only mode.
    pub fn distinct(&self) -> usize {
        match self {
            Recorder::Detailed(shared) => shared.with(|agg| agg.distinct()),
            Recorder::Bounded(shared) => shared.with(|agg| agg.distinct()),
            Recorder::TotalOnly(_) => 0,
        }
    }

    /// Write the final report while holding the lock.
    ///
    /// In total-only mode only the summary line is written.
    pub fn write_report<R, W>(&self, resolver: &R, out: &mut W) -> std::result::Result<(), ReportError>
    where
        R: KeyResolver<K>,
        W: Write,
    {
        let lines = match self {
            Recorder::Detailed(shared) => {
                shared.with(|agg| report::write_report(&*agg, resolver, out))?
            }
            Recorder::Bounded(shared) => {
                shared.with(|agg| report::write_report(&*agg, resolver, out))?
            }
            Recorder::TotalOnly(total) => {
                report::write_summary(total.get(), 0, out)?;
                0
            }
        };
        log::debug!("report written with {} key lines", lines);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableConfig;

    fn hex(key: u64) -> std::result::Result<String, std::convert::Infallible> {
        Ok(format!("m{:x}", key))
    }

    #[test]
    fn detailed_mode_counts_per_key() {
        let r = Recorder::new(TallyConfig::default()).unwrap();
        for k in [7u64, 7, 7, 9, 9, 7] {
            r.record(k).unwrap();
        }
        assert_eq!(r.total(), 6);
        assert_eq!(r.distinct(), 2);
        let mut out = Vec::new();
        r.write_report(&hex, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "4\tm7\n2\tm9\n6 events in 2 keys.\n"
        );
    }

    #[test]
    fn bounded_mode_caps_records() {
        let config = TallyConfig::new(TallyMode::Bounded { limit: 2 })
            .with_table(TableConfig::new(16));
        let r = Recorder::new(config).unwrap();
        for k in 0..5u64 {
            r.record(k).unwrap();
        }
        assert_eq!(r.total(), 5);
        assert_eq!(r.distinct(), 2);
    }

    #[test]
    fn total_only_mode_reports_summary() {
        let r: Recorder<u64> = Recorder::new(TallyConfig::new(TallyMode::TotalOnly)).unwrap();
        for k in 0..10u64 {
            r.record(k).unwrap();
        }
        assert_eq!(r.distinct(), 0);
        let mut out = Vec::new();
        r.write_report(&hex, &mut out).unwrap();
        assert_eq!(out, b"10 events in 0 keys.\n");
    }

    #[test]
    fn invalid_config_fails_creation() {
        let bad = TallyConfig::default().with_table(TableConfig::new(0));
        assert!(Recorder::<u64>::new(bad).is_err());
        let bad = TallyConfig::new(TallyMode::Bounded { limit: 0 });
        assert!(Recorder::<u64>::new(bad).is_err());
    }
}
