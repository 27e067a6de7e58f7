// ── Model version normalisation and comparison ──
//
// Vendors publish YANG model versions as semantic versions ("4.0.0"),
// revision dates ("2021-03-15") or free-form strings. Versions are
// classified once and compared within their class.
//
// Cross-class ordering is fixed: Semantic > Date > Raw. A device advertising
// a semantic version is assumed to be newer than a date-revision
// requirement. Raw strings compare lexicographically.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Classification of a version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VersionKind {
    Semantic,
    Date,
    Raw,
}

/// A parsed, comparable version.
#[derive(Debug, Clone)]
pub enum NormalizedVersion {
    Semantic {
        major: u64,
        minor: u64,
        patch: u64,
        raw: String,
    },
    Date {
        date: NaiveDate,
        raw: String,
    },
    Raw(String),
}

impl NormalizedVersion {
    /// Classify and parse a version string. Never fails; anything that is
    /// neither semver nor a date is kept as `Raw`.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if let Some((major, minor, patch)) = parse_semantic(trimmed) {
            return Self::Semantic {
                major,
                minor,
                patch,
                raw: trimmed.to_owned(),
            };
        }
        if let Some(date) = parse_date(trimmed) {
            return Self::Date {
                date,
                raw: trimmed.to_owned(),
            };
        }
        Self::Raw(trimmed.to_owned())
    }

    pub fn kind(&self) -> VersionKind {
        match self {
            Self::Semantic { .. } => VersionKind::Semantic,
            Self::Date { .. } => VersionKind::Date,
            Self::Raw(_) => VersionKind::Raw,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Semantic { raw, .. } | Self::Date { raw, .. } | Self::Raw(raw) => raw,
        }
    }

    fn class_rank(&self) -> u8 {
        match self {
            Self::Semantic { .. } => 2,
            Self::Date { .. } => 1,
            Self::Raw(_) => 0,
        }
    }
}

/// `MAJOR.MINOR.PATCH` with an optional `-pre` or `+build` suffix, which is
/// ignored for ordering.
fn parse_semantic(s: &str) -> Option<(u64, u64, u64)> {
    let core = s.split(['-', '+']).next()?;
    let mut parts = core.split('.');
    let major = parse_component(parts.next()?)?;
    let minor = parse_component(parts.next()?)?;
    let patch = parse_component(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch))
}

fn parse_component(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// `YYYY-MM-DD` or `YYYY/MM/DD`.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let sep = if s.contains('-') { '-' } else { '/' };
    let mut parts = s.split(sep);
    let y = parts.next()?;
    let m = parts.next()?;
    let d = parts.next()?;
    if parts.next().is_some() || y.len() != 4 || m.len() != 2 || d.len() != 2 {
        return None;
    }
    let year: i32 = parse_component(y)?.try_into().ok()?;
    let month: u32 = parse_component(m)?.try_into().ok()?;
    let day: u32 = parse_component(d)?.try_into().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

impl Ord for NormalizedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (
                Self::Semantic {
                    major: a1,
                    minor: a2,
                    patch: a3,
                    ..
                },
                Self::Semantic {
                    major: b1,
                    minor: b2,
                    patch: b3,
                    ..
                },
            ) => (a1, a2, a3).cmp(&(b1, b2, b3)),
            (Self::Date { date: a, .. }, Self::Date { date: b, .. }) => a.cmp(b),
            (Self::Raw(a), Self::Raw(b)) => a.cmp(b),
            _ => self.class_rank().cmp(&other.class_rank()),
        }
    }
}

impl PartialOrd for NormalizedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Equality follows ordering: `1.0.0-rc1` equals `1.0.0`.
impl PartialEq for NormalizedVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NormalizedVersion {}

impl fmt::Display for NormalizedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compare two optional version strings.
///
/// Returns `None` (incomparable) when either side is missing or blank.
pub fn compare_versions(a: Option<&str>, b: Option<&str>) -> Option<Ordering> {
    let a = a.map(str::trim).filter(|s| !s.is_empty())?;
    let b = b.map(str::trim).filter(|s| !s.is_empty())?;
    Some(NormalizedVersion::parse(a).cmp(&NormalizedVersion::parse(b)))
}
