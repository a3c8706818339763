//! Version numbers and version ranges
//!
//! ## Representation
//!
//! A [`Version`] is a fixed-point number with three decimal places, stored as
//! a signed count of thousandths. Whole-numbered format revisions and
//! fractional markers such as `1.5` share one ordered domain, and boundary
//! tests are exact integer comparisons.
//!
//! ## Ranges
//!
//! A [`VersionRange`] is the half-open interval `[min, max)`. Either bound may
//! be absent (unbounded). `min == max` denotes the single version `min`. A
//! range with both bounds absent is unconditional: it is the only range that
//! matches when no version is known at all.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A format version number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Thousandths per whole version
    pub const SCALE: i64 = 1000;

    /// Smallest representable step between two versions
    pub const EPSILON: Version = Version(1);

    /// Largest whole version number
    pub const MAX_WHOLE: i64 = i64::MAX / Self::SCALE;

    /// Smallest whole version number
    pub const MIN_WHOLE: i64 = i64::MIN / Self::SCALE;

    /// Whole version number
    ///
    /// # Panics
    ///
    /// Panics when `whole` lies outside `MIN_WHOLE..=MAX_WHOLE`. Use
    /// [`Version::checked_new`] for values read from a stream.
    pub const fn new(whole: i64) -> Self {
        match Self::checked_new(whole) {
            Some(version) => version,
            None => panic!("whole version number out of range"),
        }
    }

    /// Whole version number, or `None` outside `MIN_WHOLE..=MAX_WHOLE`
    pub const fn checked_new(whole: i64) -> Option<Self> {
        match whole.checked_mul(Self::SCALE) {
            Some(raw) => Some(Version(raw)),
            None => None,
        }
    }

    /// Version from a raw count of thousandths
    pub const fn from_raw(thousandths: i64) -> Self {
        Version(thousandths)
    }

    /// Version from a floating-point marker, rounded to the nearest thousandth
    ///
    /// Returns `None` for NaN, infinities and values outside the representable range.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let scaled = (value * Self::SCALE as f64).round();
        if scaled < i64::MIN as f64 || scaled >= i64::MAX as f64 {
            return None;
        }
        Some(Version(scaled as i64))
    }

    /// Raw count of thousandths
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Floating-point value
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    /// Whole part when the version has no fractional component
    pub fn as_whole(self) -> Option<i64> {
        if self.0 % Self::SCALE == 0 {
            Some(self.0 / Self::SCALE)
        } else {
            None
        }
    }

    /// The version immediately preceding this one
    pub fn pred(self) -> Self {
        Version(self.0.saturating_sub(Self::EPSILON.0))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::SCALE;
        let frac = (self.0 % Self::SCALE).abs();
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let sign = if self.0 < 0 && whole == 0 { "-" } else { "" };
        let digits = format!("{:03}", frac);
        write!(f, "{}{}.{}", sign, whole, digits.trim_end_matches('0'))
    }
}

impl From<i32> for Version {
    fn from(whole: i32) -> Self {
        Version::new(whole as i64)
    }
}

/// Half-open version interval `[min, max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VersionRange {
    /// Inclusive lower bound
    pub min: Option<Version>,
    /// Exclusive upper bound (inclusive when equal to `min`)
    pub max: Option<Version>,
}

impl VersionRange {
    /// Range with explicit bounds
    pub const fn new(min: Option<Version>, max: Option<Version>) -> Self {
        VersionRange { min, max }
    }

    /// The unconditional range
    pub const fn any() -> Self {
        VersionRange {
            min: None,
            max: None,
        }
    }

    /// Every version from `min` onwards
    pub const fn from(min: Version) -> Self {
        VersionRange {
            min: Some(min),
            max: None,
        }
    }

    /// Every version below `max`
    pub const fn below(max: Version) -> Self {
        VersionRange {
            min: None,
            max: Some(max),
        }
    }

    /// Every version in `[min, max)`
    pub const fn between(min: Version, max: Version) -> Self {
        VersionRange {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Exactly one version
    pub const fn exact(version: Version) -> Self {
        VersionRange {
            min: Some(version),
            max: Some(version),
        }
    }

    /// Both bounds absent
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Single-version range
    pub fn is_exact(&self) -> bool {
        self.min.is_some() && self.min == self.max
    }

    /// `min <= max` when both are present
    pub fn is_valid(&self) -> bool {
        match (self.min, self.max) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        }
    }

    /// Whether `version` falls inside the range
    ///
    /// An absent version is only matched by the unconditional range.
    pub fn contains(&self, version: Option<Version>) -> bool {
        let v = match version {
            Some(v) => v,
            None => return self.is_unbounded(),
        };
        if self.is_exact() {
            return self.min == Some(v);
        }
        let above_min = self.min.map_or(true, |min| v >= min);
        let below_max = self.max.map_or(true, |max| v < max);
        above_min && below_max
    }

    /// Whether every version of `other` is inside this range
    pub fn covers(&self, other: &VersionRange) -> bool {
        if other.is_exact() {
            return self.contains(other.min);
        }
        if self.is_exact() {
            return false;
        }
        let lower = match (self.min, other.min) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => a <= b,
        };
        let upper = match (self.max, other.max) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => b <= a,
        };
        lower && upper
    }

    /// Whether the two ranges share at least one version
    pub fn overlaps(&self, other: &VersionRange) -> bool {
        if self.is_exact() {
            return other.contains(self.min);
        }
        if other.is_exact() {
            return self.contains(other.min);
        }
        let starts_before_other_ends = match (self.min, other.max) {
            (Some(min), Some(max)) => min < max,
            _ => true,
        };
        let other_starts_before_end = match (other.min, self.max) {
            (Some(min), Some(max)) => min < max,
            _ => true,
        };
        starts_before_other_ends && other_starts_before_end
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_exact() {
            if let Some(v) = self.min {
                return write!(f, "[{}]", v);
            }
        }
        let bound = |b: Option<Version>| b.map_or_else(|| "*".to_string(), |v| v.to_string());
        write!(f, "[{}, {})", bound(self.min), bound(self.max))
    }
}

/// A value that applies over a version range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranged<V> {
    /// Versions the value applies to
    pub range: VersionRange,
    /// The value
    pub value: V,
}

impl<V> Ranged<V> {
    /// Value scoped to `range`
    pub fn new(range: VersionRange, value: V) -> Self {
        Ranged { range, value }
    }

    /// Value that applies to every version
    pub fn always(value: V) -> Self {
        Ranged {
            range: VersionRange::any(),
            value,
        }
    }
}

/// First pair of intersecting ranges, if any
pub fn find_overlap<V>(entries: &[Ranged<V>]) -> Option<(VersionRange, VersionRange)> {
    for (i, a) in entries.iter().enumerate() {
        for b in &entries[i + 1..] {
            if a.range.overlaps(&b.range) {
                return Some((a.range, b.range));
            }
        }
    }
    None
}
