//! Final report: one line per record, then a summary.
//!
//! ```text
//! 4\tclass LFoo; -> bar()V
//! 2\tclass LFoo; -> baz(I)I
//! 6 events in 2 keys.
//! ```
//!
//! Lines follow enumeration order, which is storage order and unrelated to
//! when keys were first seen. Identities come from a caller-supplied
//! [`KeyResolver`]; a key that fails to resolve is logged and printed as
//! `<unresolved KEY>`.

use crate::error::ReportError;
use crate::int_key::IntKey;
use crate::tally::Tally;
use core::fmt::Display;
use core::ops::ControlFlow;
use std::io::Write;

/// Turns a key handle into a human-readable identity.
pub trait KeyResolver<K> {
    type Error: Display;

    fn resolve(&self, key: K) -> Result<String, Self::Error>;
}

impl<K, E, F> KeyResolver<K> for F
where
    F: Fn(K) -> Result<String, E>,
    E: Display,
{
    type Error = E;

    fn resolve(&self, key: K) -> Result<String, E> {
        self(key)
    }
}

/// Write one `count\tidentity` line per record, then the summary line.
///
/// Returns the number of record lines written.
pub fn write_report<K, T, R, W>(tally: &T, resolver: &R, out: &mut W) -> Result<usize, ReportError>
where
    K: IntKey,
    T: Tally<K>,
    R: KeyResolver<K>,
    W: Write,
{
    let mut lines = 0;
    let flow = tally.enumerate(|record| {
        let identity = match resolver.resolve(record.key) {
            Ok(identity) => identity,
            Err(e) => {
                log::warn!("cannot resolve identity of key {:?}: {}", record.key, e);
                format!("<unresolved {:?}>", record.key)
            }
        };
        match writeln!(out, "{}\t{}", record.count, identity) {
            Ok(()) => {
                lines += 1;
                ControlFlow::Continue(())
            }
            Err(e) => ControlFlow::Break(e),
        }
    });
    if let ControlFlow::Break(e) = flow {
        return Err(e.into());
    }
    write_summary(tally.total(), tally.distinct(), out)?;
    Ok(lines)
}

/// Write the closing `N events in M keys.` line.
pub fn write_summary<W: Write>(total: u64, distinct: usize, out: &mut W) -> Result<(), ReportError> {
    writeln!(out, "{} events in {} keys.", total, distinct)?;
    Ok(())
}
