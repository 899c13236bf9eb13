//! System load averages for diagnostics.

use std::{fs, io};

const LOADAVG_PATH: &str = "/proc/loadavg";

/// 1, 5 and 15 minute load averages.
pub type LoadAverage = (f64, f64, f64);

/// Reads the current load averages from `/proc/loadavg`.
pub fn read_load() -> io::Result<LoadAverage> {
    parse_loadavg(&fs::read_to_string(LOADAVG_PATH)?)
}

/// Formats each load average with two decimals.
pub fn format_load((one, five, fifteen): LoadAverage) -> (String, String, String) {
    (
        format!("{one:.2}"),
        format!("{five:.2}"),
        format!("{fifteen:.2}"),
    )
}

fn parse_loadavg(content: &str) -> io::Result<LoadAverage> {
    let mut fields = content.split_whitespace().map(str::parse::<f64>);
    let mut next = || match fields.next() {
        Some(Ok(value)) => Ok(value),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("malformed {LOADAVG_PATH}: {:?}", content.trim()),
        )),
    };
    Ok((next()?, next()?, next()?))
}
