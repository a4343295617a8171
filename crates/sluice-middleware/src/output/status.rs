//! Status matchers.

use std::fmt;
use std::str::FromStr;

use http::StatusCode;
use sluice_core::ConfigError;

const MIN_STATUS: u16 = 100;
const MAX_STATUS: u16 = 599;

/// An inclusive range of status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatusRange {
    start: u16,
    end: u16,
}

impl StatusRange {
    /// Creates a range; both ends must lie in `100..=599` and be ordered.
    pub fn new(start: u16, end: u16) -> Result<Self, String> {
        if !(MIN_STATUS..=MAX_STATUS).contains(&start) || !(MIN_STATUS..=MAX_STATUS).contains(&end) {
            return Err(format!("status codes must be between {MIN_STATUS} and {MAX_STATUS}"));
        }
        if start > end {
            return Err(format!("range start {start} is after its end {end}"));
        }
        Ok(Self { start, end })
    }

    /// First code of the range.
    #[must_use]
    pub const fn start(&self) -> u16 {
        self.start
    }

    /// Last code of the range.
    #[must_use]
    pub const fn end(&self) -> u16 {
        self.end
    }

    /// Returns true if `code` lies in the range.
    #[must_use]
    pub const fn contains(&self, code: u16) -> bool {
        self.start <= code && code <= self.end
    }

    /// Returns true if the ranges share at least one code.
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// A parsed status matcher.
///
/// | Syntax | Accepts |
/// |--------|---------|
/// | `200` | exactly 200 |
/// | `200,201,204` | any listed code |
/// | `200-299` | the inclusive range |
/// | `2xx` | the whole class |
/// | `*` | every code from 100 to 599 |
///
/// Forms can be mixed in a comma list: `"200,4xx"`.
///
/// ```
/// use sluice_middleware::output::StatusSpec;
///
/// let ok: StatusSpec = "2xx".parse().unwrap();
/// let created: StatusSpec = "201".parse().unwrap();
/// assert!(ok.overlaps(&created));
/// assert!(ok.matches(http::StatusCode::NO_CONTENT));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSpec {
    source: String,
    ranges: Vec<StatusRange>,
}

impl StatusSpec {
    /// The matcher as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The normalized ranges, sorted and merged.
    #[must_use]
    pub fn ranges(&self) -> &[StatusRange] {
        &self.ranges
    }

    /// Returns true if the matcher accepts `status`.
    #[must_use]
    pub fn matches(&self, status: StatusCode) -> bool {
        self.matches_code(status.as_u16())
    }

    /// Returns true if the matcher accepts the numeric `code`.
    #[must_use]
    pub fn matches_code(&self, code: u16) -> bool {
        self.ranges.iter().any(|range| range.contains(code))
    }

    /// Returns true if some status code is accepted by both matchers.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.ranges
            .iter()
            .any(|a| other.ranges.iter().any(|b| a.intersects(b)))
    }
}

fn parse_code(token: &str) -> Result<u16, String> {
    token
        .parse::<u16>()
        .map_err(|_| format!("`{token}` is not a status code"))
}

fn parse_token(token: &str) -> Result<StatusRange, String> {
    if token == "*" {
        return StatusRange::new(MIN_STATUS, MAX_STATUS);
    }

    let bytes = token.as_bytes();
    if bytes.len() == 3 && bytes[1].eq_ignore_ascii_case(&b'x') && bytes[2].eq_ignore_ascii_case(&b'x') {
        let class = match bytes[0] {
            digit @ b'1'..=b'5' => u16::from(digit - b'0'),
            _ => return Err(format!("`{token}` is not a status class")),
        };
        return StatusRange::new(class * 100, class * 100 + 99);
    }

    if let Some((start, end)) = token.split_once('-') {
        return StatusRange::new(parse_code(start.trim())?, parse_code(end.trim())?);
    }

    let code = parse_code(token)?;
    StatusRange::new(code, code)
}

fn normalize(mut ranges: Vec<StatusRange>) -> Vec<StatusRange> {
    ranges.sort();
    let mut merged: Vec<StatusRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end.saturating_add(1) => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}

impl FromStr for StatusSpec {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let source = input.trim();
        if source.is_empty() {
            return Err(ConfigError::invalid_status(input, "empty status matcher"));
        }

        let ranges = source
            .split(',')
            .map(|token| {
                let token = token.trim();
                if token.is_empty() {
                    return Err("empty entry in status list".to_string());
                }
                parse_token(token)
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| ConfigError::invalid_status(input, reason))?;

        Ok(Self {
            source: source.to_string(),
            ranges: normalize(ranges),
        })
    }
}

impl fmt::Display for StatusSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
