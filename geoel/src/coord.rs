//! Fixed-point geographic coordinates.
//!
//! A [`GeoCoord`] stores one angular axis value as a signed integer count of
//! *subseconds* (1/60 arc-second), so 216 000 units make one degree. Every
//! derived field (degrees, minutes, seconds, subseconds, hemisphere letter)
//! is computed from that integer on read, which keeps them consistent by
//! construction.
//!
//! # Text Formats
//!
//! [`GeoCoord::parse`] accepts these shapes, each with an optional leading
//! sign or a hemisphere letter anywhere in the text (`N`/`S` for latitudes,
//! `E`/`W` for longitudes):
//!
//! | Shape        | Example       |
//! |--------------|---------------|
//! | `D:M`        | `47:30`       |
//! | `DMM`        | `4730`        |
//! | `D:M:S`      | `47:30:15`    |
//! | `DMMSS`      | `473015`      |
//! | `D:M:S:T`    | `47:30:15:30` |
//! | `D`, `D.fff` | `47`, `47.5`  |
//! | `D:M.fff`    | `47:30.25`    |
//! | `DMM.fff`    | `4730.25`     |
//! | `D:M:S.fff`  | `47:30:15.5`  |
//! | `DMMSS.fff`  | `473015.5`    |
//!
//! Before matching, quotes and blanks are dropped, `,` becomes `.`, and
//! `°`/`'` become `:`, so `47°30'15" N` and `47,5 N` are accepted as well.
//! Shapes are tried in the order above and the first match wins. A bare
//! integer of three or more digits is therefore read as `DMM` or `DMMSS`:
//! `120` is 1°20′, and 120° has to be written `120.0` or `120:00`.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Fixed-point units per degree.
pub const UNITS_PER_DEGREE: i32 = 60 * 60 * 60;

/// Fixed-point units per arc-minute.
pub const UNITS_PER_MINUTE: i32 = 60 * 60;

/// Fixed-point units per arc-second.
pub const UNITS_PER_SECOND: i32 = 60;

const HALF_TURN: i32 = 180 * UNITS_PER_DEGREE;
const FULL_TURN: i32 = 360 * UNITS_PER_DEGREE;

/// Which geographic axis a coordinate measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// North/south position, -90° to +90°.
    Latitude,
    /// East/west position, -180° to +180°.
    Longitude,
}

impl Axis {
    /// Hemisphere letter for values >= 0.
    pub fn positive_letter(self) -> char {
        match self {
            Axis::Latitude => 'N',
            Axis::Longitude => 'E',
        }
    }

    /// Hemisphere letter for values < 0.
    pub fn negative_letter(self) -> char {
        match self {
            Axis::Latitude => 'S',
            Axis::Longitude => 'W',
        }
    }

    /// Largest absolute value in whole degrees.
    pub fn max_degrees(self) -> i32 {
        match self {
            Axis::Latitude => 90,
            Axis::Longitude => 180,
        }
    }

    /// Zero-padded digit count used when printing whole degrees.
    pub fn degree_digits(self) -> usize {
        match self {
            Axis::Latitude => 2,
            Axis::Longitude => 3,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Latitude => f.write_str("latitude"),
            Axis::Longitude => f.write_str("longitude"),
        }
    }
}

/// Why a coordinate string was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The text matches none of the accepted shapes.
    #[error("Unrecognized coordinate format: {input:?}")]
    Unrecognized { input: String },

    /// A hemisphere letter from the other axis, e.g. `E` on a latitude.
    #[error("Hemisphere letter '{letter}' is not valid for a {axis}")]
    WrongHemisphere { letter: char, axis: Axis },

    /// Minutes/seconds/subseconds >= 60, or more degrees than the axis allows.
    #[error("Coordinate component out of range: {input:?}")]
    OutOfRange { input: String },
}

/// A single latitude or longitude value in fixed-point subsecond units.
///
/// Comparisons look at the fixed-point value only.
#[derive(Debug, Clone, Copy)]
pub struct GeoCoord {
    axis: Axis,
    decimal: i32,
}

impl GeoCoord {
    /// The zero coordinate (equator / prime meridian) on `axis`.
    pub const fn zero(axis: Axis) -> Self {
        Self { axis, decimal: 0 }
    }

    /// Build from a raw fixed-point value.
    pub const fn from_decimal(axis: Axis, decimal: i32) -> Self {
        Self { axis, decimal }
    }

    /// Build from decimal degrees, rounding to the nearest subsecond.
    pub fn from_degrees(axis: Axis, value: f64) -> Self {
        let mut coord = Self::zero(axis);
        coord.set_from_degrees(value);
        coord
    }

    /// Shorthand for `from_degrees(Axis::Latitude, value)`.
    pub fn latitude(value: f64) -> Self {
        Self::from_degrees(Axis::Latitude, value)
    }

    /// Shorthand for `from_degrees(Axis::Longitude, value)`.
    pub fn longitude(value: f64) -> Self {
        Self::from_degrees(Axis::Longitude, value)
    }

    /// Build from sexagesimal components. `negative` selects the southern or
    /// western hemisphere.
    pub fn from_components(
        axis: Axis,
        negative: bool,
        degrees: u32,
        minutes: u32,
        seconds: u32,
        subseconds: u32,
    ) -> Self {
        let units = degrees as i32 * UNITS_PER_DEGREE
            + minutes as i32 * UNITS_PER_MINUTE
            + seconds as i32 * UNITS_PER_SECOND
            + subseconds as i32;
        Self {
            axis,
            decimal: if negative { -units } else { units },
        }
    }

    /// Overwrite the value from decimal degrees.
    ///
    /// Values beyond the fixed-point range saturate and NaN becomes zero.
    pub fn set_from_degrees(&mut self, value: f64) {
        self.decimal = (value * UNITS_PER_DEGREE as f64).round() as i32;
    }

    /// Parse one of the accepted text formats.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] when the text matches no shape, carries a
    /// hemisphere letter of the other axis, or has out-of-range fields.
    ///
    /// # Example
    ///
    /// ```
    /// use geoel::{Axis, GeoCoord};
    ///
    /// let lat = GeoCoord::parse(Axis::Latitude, "47:30:00 N").unwrap();
    /// assert_eq!(lat.degrees(), 47);
    /// assert_eq!(lat.minutes(), 30);
    /// assert_eq!(lat.direction(), 'N');
    /// ```
    pub fn parse(axis: Axis, text: &str) -> Result<Self, ParseError> {
        let normalized = normalize(axis, text)?;

        for (regex, fields) in PATTERNS.iter() {
            let Some(caps) = regex.captures(&normalized) else {
                continue;
            };

            let negative = &caps[1] == "-";

            let mut values = [0i32; 4];
            for (i, value) in values.iter_mut().enumerate().take(*fields) {
                *value = caps[i + 2]
                    .parse()
                    .map_err(|_| ParseError::Unrecognized {
                        input: text.to_string(),
                    })?;
            }
            let [degrees, minutes, seconds, subseconds] = values;

            if minutes >= 60 || seconds >= 60 || subseconds >= 60 {
                return Err(ParseError::OutOfRange {
                    input: text.to_string(),
                });
            }

            let mut units = degrees * UNITS_PER_DEGREE
                + minutes * UNITS_PER_MINUTE
                + seconds * UNITS_PER_SECOND
                + subseconds;

            if let Some(fraction) = caps.get(fields + 2) {
                let fraction: f64 = format!("0.{}", fraction.as_str())
                    .parse()
                    .map_err(|_| ParseError::Unrecognized {
                        input: text.to_string(),
                    })?;
                let unit = [UNITS_PER_DEGREE, UNITS_PER_MINUTE, UNITS_PER_SECOND][fields - 1];
                units += (fraction * unit as f64).round() as i32;
            }

            if units > axis.max_degrees() * UNITS_PER_DEGREE {
                return Err(ParseError::OutOfRange {
                    input: text.to_string(),
                });
            }

            return Ok(Self {
                axis,
                decimal: if negative { -units } else { units },
            });
        }

        Err(ParseError::Unrecognized {
            input: text.to_string(),
        })
    }

    /// Parse like [`parse`](Self::parse), but yield zero for malformed text.
    ///
    /// This keeps compatibility with stored data written by tools that never
    /// validated their input.
    pub fn parse_lenient(axis: Axis, text: &str) -> Self {
        Self::parse(axis, text).unwrap_or(Self::zero(axis))
    }

    /// Overwrite the value from text, resetting to zero when malformed.
    pub fn set_from_str(&mut self, text: &str) {
        *self = Self::parse_lenient(self.axis, text);
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// The raw fixed-point value in subsecond units.
    pub fn decimal(&self) -> i32 {
        self.decimal
    }

    /// Whole degrees of the absolute value.
    pub fn degrees(&self) -> u32 {
        self.decimal.unsigned_abs() / UNITS_PER_DEGREE as u32
    }

    /// Whole arc-minutes (0-59) of the absolute value.
    pub fn minutes(&self) -> u32 {
        self.decimal.unsigned_abs() % UNITS_PER_DEGREE as u32 / UNITS_PER_MINUTE as u32
    }

    /// Whole arc-seconds (0-59) of the absolute value.
    pub fn seconds(&self) -> u32 {
        self.decimal.unsigned_abs() % UNITS_PER_MINUTE as u32 / UNITS_PER_SECOND as u32
    }

    /// Subseconds (0-59) of the absolute value.
    pub fn subseconds(&self) -> u32 {
        self.decimal.unsigned_abs() % UNITS_PER_SECOND as u32
    }

    /// Arc-seconds into the current degree, `minutes * 60 + seconds`.
    pub fn seconds_in_degree(&self) -> u32 {
        self.decimal.unsigned_abs() % UNITS_PER_DEGREE as u32 / UNITS_PER_SECOND as u32
    }

    /// Southern or western hemisphere.
    pub fn is_negative(&self) -> bool {
        self.decimal < 0
    }

    /// Hemisphere letter: `N`/`S` for latitudes, `E`/`W` for longitudes.
    pub fn direction(&self) -> char {
        if self.is_negative() {
            self.axis.negative_letter()
        } else {
            self.axis.positive_letter()
        }
    }

    /// Floating-point degrees, for display and export only.
    pub fn to_degrees(&self) -> f64 {
        self.decimal as f64 / UNITS_PER_DEGREE as f64
    }

    /// Snap down to the nearest multiple of `raster`.
    ///
    /// Uses floor semantics on negative values, so `-0°00'01"` snapped to a
    /// 3" raster becomes `-0°00'03"`, never zero.
    pub fn to_raster_left(&self, raster: &GeoCoord) -> GeoCoord {
        let step = i64::from(raster.decimal.unsigned_abs());
        if step == 0 {
            return *self;
        }
        Self {
            axis: self.axis,
            decimal: saturate(i64::from(self.decimal).div_euclid(step) * step),
        }
    }

    /// Snap up to the nearest multiple of `raster`.
    pub fn to_raster_right(&self, raster: &GeoCoord) -> GeoCoord {
        let step = i64::from(raster.decimal.unsigned_abs());
        if step == 0 {
            return *self;
        }
        let value = i64::from(self.decimal);
        let left = value.div_euclid(step) * step;
        Self {
            axis: self.axis,
            decimal: saturate(if left == value { left } else { left + step }),
        }
    }

    /// Whether this value is an exact multiple of `raster`.
    pub fn is_on_raster(&self, raster: &GeoCoord) -> bool {
        let step = i64::from(raster.decimal.unsigned_abs());
        step == 0 || i64::from(self.decimal).rem_euclid(step) == 0
    }

    /// Multiply by `factor`, rounding to the nearest subsecond.
    pub fn scale(&self, factor: f64) -> GeoCoord {
        Self {
            axis: self.axis,
            decimal: normalize_decimal(
                self.axis,
                (self.decimal as f64 * factor).round() as i64,
            ),
        }
    }

    /// Midpoint of two values on the same axis.
    pub fn mean(a: &GeoCoord, b: &GeoCoord) -> GeoCoord {
        let sum = a.decimal as i64 + b.decimal as i64;
        Self {
            axis: a.axis,
            decimal: sum.div_euclid(2) as i32,
        }
    }
}

/// Longitudes wrap into (-180°, +180°]; latitudes are left alone.
fn normalize_decimal(axis: Axis, decimal: i64) -> i32 {
    match axis {
        Axis::Latitude => decimal as i32,
        Axis::Longitude => {
            let wrapped = decimal.rem_euclid(FULL_TURN as i64) as i32;
            if wrapped > HALF_TURN {
                wrapped - FULL_TURN
            } else {
                wrapped
            }
        }
    }
}

impl Add for GeoCoord {
    type Output = GeoCoord;

    fn add(self, rhs: GeoCoord) -> GeoCoord {
        Self {
            axis: self.axis,
            decimal: normalize_decimal(self.axis, self.decimal as i64 + rhs.decimal as i64),
        }
    }
}

impl Sub for GeoCoord {
    type Output = GeoCoord;

    fn sub(self, rhs: GeoCoord) -> GeoCoord {
        Self {
            axis: self.axis,
            decimal: normalize_decimal(self.axis, self.decimal as i64 - rhs.decimal as i64),
        }
    }
}

impl AddAssign for GeoCoord {
    fn add_assign(&mut self, rhs: GeoCoord) {
        *self = *self + rhs;
    }
}

impl SubAssign for GeoCoord {
    fn sub_assign(&mut self, rhs: GeoCoord) {
        *self = *self - rhs;
    }
}

impl PartialEq for GeoCoord {
    fn eq(&self, other: &Self) -> bool {
        self.decimal == other.decimal
    }
}

impl Eq for GeoCoord {}

impl PartialOrd for GeoCoord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GeoCoord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.decimal.cmp(&other.decimal)
    }
}

impl fmt::Display for GeoCoord {
    /// Canonical `DD:MM:SS H` form (`DDD` for longitudes). Non-zero
    /// subseconds are appended as a fourth field.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:0width$}:{:02}:{:02}",
            self.degrees(),
            self.minutes(),
            self.seconds(),
            width = self.axis.degree_digits()
        )?;
        if self.subseconds() != 0 {
            write!(f, ":{:02}", self.subseconds())?;
        }
        write!(f, " {}", self.direction())
    }
}

/// Accepted shapes paired with the number of integer fields each captures.
/// A trailing capture group, when present, holds the decimal fraction of the
/// last integer field.
static PATTERNS: Lazy<Vec<(Regex, usize)>> = Lazy::new(|| {
    [
        (r"^([-+]?)(\d{1,3}):(\d{1,2})$", 2),
        (r"^([-+]?)(\d{1,3})(\d{2})$", 2),
        (r"^([-+]?)(\d{1,3}):(\d{1,2}):(\d{1,2})$", 3),
        (r"^([-+]?)(\d{1,3})(\d{2})(\d{2})$", 3),
        (r"^([-+]?)(\d{1,3}):(\d{1,2}):(\d{1,2}):(\d{1,2})$", 4),
        (r"^([-+]?)(\d{1,3})(?:\.(\d+))?$", 1),
        (r"^([-+]?)(\d{1,3}):(\d{1,2})\.(\d+)$", 2),
        (r"^([-+]?)(\d{1,3})(\d{2})\.(\d+)$", 2),
        (r"^([-+]?)(\d{1,3}):(\d{1,2}):(\d{1,2})\.(\d+)$", 3),
        (r"^([-+]?)(\d{1,3})(\d{2})(\d{2})\.(\d+)$", 3),
    ]
    .into_iter()
    .map(|(pattern, fields)| {
        (
            Regex::new(pattern).expect("coordinate pattern is valid"),
            fields,
        )
    })
    .collect()
});

/// Clamp a widened subsecond count back into the stored range.
fn saturate(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Strip decoration and fold a hemisphere letter into a leading sign.
fn normalize(axis: Axis, text: &str) -> Result<String, ParseError> {
    let mut sign = None;
    let mut body = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            ' ' | '\t' | '"' | '\u{2033}' => {}
            ',' => body.push('.'),
            '°' | '\'' | '\u{2032}' => body.push(':'),
            c if c.is_ascii_alphabetic() => {
                let letter = c.to_ascii_uppercase();
                if letter == axis.positive_letter() {
                    sign = Some('+');
                } else if letter == axis.negative_letter() {
                    sign = Some('-');
                } else if matches!(letter, 'N' | 'S' | 'E' | 'W') {
                    return Err(ParseError::WrongHemisphere { letter, axis });
                } else {
                    return Err(ParseError::Unrecognized {
                        input: text.to_string(),
                    });
                }
            }
            c => body.push(c),
        }
    }

    let body = body.trim_end_matches(':');
    Ok(match sign {
        Some(sign) => format!("{sign}{body}"),
        None => body.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lat(text: &str) -> GeoCoord {
        GeoCoord::parse(Axis::Latitude, text).unwrap()
    }

    fn lon(text: &str) -> GeoCoord {
        GeoCoord::parse(Axis::Longitude, text).unwrap()
    }

    #[test]
    fn test_canonical_roundtrip() {
        for text in ["47:30:00 N", "00:00:00 N", "33:52:10 S", "89:59:59:59 N"] {
            assert_eq!(lat(text).to_string(), text);
            assert_eq!(lat(&lat(text).to_string()), lat(text));
        }
        for text in ["008:15:30 E", "122:25:05 W", "180:00:00 E"] {
            assert_eq!(lon(text).to_string(), text);
        }
    }

    #[test]
    fn test_fields_of_parsed_value() {
        let c = lon("008:15:30 E");
        assert_eq!(c.decimal(), 8 * 216_000 + 15 * 3_600 + 30 * 60);
        assert_eq!(
            (c.degrees(), c.minutes(), c.seconds(), c.subseconds()),
            (8, 15, 30, 0)
        );
        assert_eq!(c.direction(), 'E');
    }

    #[test]
    fn test_all_shapes() {
        let expected = lat("47:30:15:30");
        assert_eq!(lat("47:30"), GeoCoord::from_components(Axis::Latitude, false, 47, 30, 0, 0));
        assert_eq!(lat("4730"), lat("47:30"));
        assert_eq!(lat("47:30:15"), GeoCoord::from_components(Axis::Latitude, false, 47, 30, 15, 0));
        assert_eq!(lat("473015"), lat("47:30:15"));
        assert_eq!(expected.subseconds(), 30);
        assert_eq!(lat("47.5"), lat("47:30"));
        assert_eq!(lat("47:30.25"), lat("47:30:15"));
        assert_eq!(lat("4730.25"), lat("47:30:15"));
        assert_eq!(lat("47:30:15.5"), expected);
        assert_eq!(lat("473015.5"), expected);
        assert_eq!(lat("47"), GeoCoord::from_components(Axis::Latitude, false, 47, 0, 0, 0));
    }

    #[test]
    fn test_bare_integers_read_as_packed_minutes() {
        assert_eq!(lon("120"), GeoCoord::from_components(Axis::Longitude, false, 1, 20, 0, 0));
        assert_eq!(lon("120.0"), GeoCoord::longitude(120.0));
        assert_eq!(lon("120:00"), lon("120.0"));
        assert_eq!(lon("120 W").decimal(), -(UNITS_PER_DEGREE + 20 * UNITS_PER_MINUTE));
        assert_eq!(lon("8"), GeoCoord::longitude(8.0));
        assert_eq!(lat("12030"), GeoCoord::from_components(Axis::Latitude, false, 1, 20, 30, 0));
    }

    #[test]
    fn test_decorations_and_hemispheres() {
        assert_eq!(lat("47°30'15\" N"), lat("47:30:15"));
        assert_eq!(lat("47,5 N"), lat("47:30"));
        assert_eq!(lat("S 33:52"), lat("-33:52"));
        assert!(lat("33:52 S").is_negative());
        assert_eq!(lon("W 8.25"), GeoCoord::from_components(Axis::Longitude, true, 8, 15, 0, 0));
        assert_eq!(lon("e 8.25").direction(), 'E');
        assert_eq!(lat("\"47°30'\""), lat("47:30"));
    }

    #[test]
    fn test_fraction_rounds_to_subseconds() {
        // 1/3 of a second is 20 subseconds
        assert_eq!(lat("0:0:0.3333").subseconds(), 20);
        // 0.9999 s rounds up into the next second
        let c = lat("0:0:0.9999");
        assert_eq!((c.seconds(), c.subseconds()), (1, 0));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            GeoCoord::parse(Axis::Latitude, "abc"),
            Err(ParseError::Unrecognized { .. })
        ));
        assert!(matches!(
            GeoCoord::parse(Axis::Latitude, "47:75"),
            Err(ParseError::OutOfRange { .. })
        ));
        assert!(matches!(
            GeoCoord::parse(Axis::Latitude, "91:00"),
            Err(ParseError::OutOfRange { .. })
        ));
        assert_eq!(
            GeoCoord::parse(Axis::Latitude, "E 47"),
            Err(ParseError::WrongHemisphere {
                letter: 'E',
                axis: Axis::Latitude
            })
        );
        assert!(GeoCoord::parse(Axis::Latitude, "").is_err());
        assert!(GeoCoord::parse(Axis::Latitude, "-47:30 S").is_err());
    }

    #[test]
    fn test_lenient_parse_zeroes() {
        assert_eq!(GeoCoord::parse_lenient(Axis::Latitude, "garbage").decimal(), 0);

        let mut c = GeoCoord::latitude(12.0);
        c.set_from_str("not a coordinate");
        assert_eq!(c.decimal(), 0);
        assert_eq!(c.axis(), Axis::Latitude);

        c.set_from_str("12:30 S");
        assert_eq!(c, GeoCoord::latitude(-12.5));
    }

    #[test]
    fn test_component_derivation_is_consistent() {
        for negative in [false, true] {
            for degrees in [0, 1, 47, 89] {
                for minutes in [0, 1, 30, 59] {
                    for seconds in [0, 29, 59] {
                        for subseconds in [0, 1, 59] {
                            let c = GeoCoord::from_components(
                                Axis::Latitude,
                                negative,
                                degrees,
                                minutes,
                                seconds,
                                subseconds,
                            );
                            assert_eq!(
                                (c.degrees(), c.minutes(), c.seconds(), c.subseconds()),
                                (degrees, minutes, seconds, subseconds)
                            );
                            let is_zero = c.decimal() == 0;
                            let expected = if negative && !is_zero { 'S' } else { 'N' };
                            assert_eq!(c.direction(), expected);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_from_degrees() {
        let c = GeoCoord::latitude(47.5);
        assert_eq!(c.decimal(), 10_260_000);
        assert_eq!(c.to_degrees(), 47.5);

        let c = GeoCoord::longitude(-8.25);
        assert_eq!(c.direction(), 'W');
        assert_eq!((c.degrees(), c.minutes()), (8, 15));
    }

    #[test]
    fn test_raster_snapping() {
        let grid = GeoCoord::from_components(Axis::Latitude, false, 0, 0, 3, 0);
        let step = grid.decimal();

        for decimal in [-1_000_003, -181, -180, -179, -1, 0, 1, 179, 180, 181, 10_260_001] {
            let c = GeoCoord::from_decimal(Axis::Latitude, decimal);
            let left = c.to_raster_left(&grid);
            let right = c.to_raster_right(&grid);

            assert!(left <= c && c <= right, "{decimal}");
            assert_eq!(left.decimal().rem_euclid(step), 0);
            assert_eq!(right.decimal().rem_euclid(step), 0);
            assert!(right.decimal() - left.decimal() <= step);
            assert_eq!(left == right, c.is_on_raster(&grid));
        }

        let c = GeoCoord::from_decimal(Axis::Latitude, -1);
        assert_eq!(c.to_raster_left(&grid).decimal(), -180);
        assert_eq!(c.to_raster_right(&grid).decimal(), 0);
    }

    #[test]
    fn test_raster_snapping_at_range_limits() {
        let grid = GeoCoord::from_components(Axis::Longitude, false, 0, 0, 3, 0);

        let huge = GeoCoord::longitude(1.0e9);
        assert_eq!(huge.decimal(), i32::MAX);
        assert_eq!(huge.to_raster_right(&grid).decimal(), i32::MAX);
        assert!(huge.to_raster_left(&grid) <= huge);

        let tiny = GeoCoord::latitude(-1.0e12);
        assert_eq!(tiny.decimal(), i32::MIN);
        assert_eq!(tiny.to_raster_left(&grid).decimal(), i32::MIN);
        assert!(tiny.to_raster_right(&grid) >= tiny);

        let widest = GeoCoord::from_decimal(Axis::Latitude, i32::MIN);
        assert_eq!(tiny.to_raster_left(&widest), tiny);
        assert!(tiny.is_on_raster(&widest));
        assert_eq!(GeoCoord::latitude(f64::NAN).decimal(), 0);
    }

    #[test]
    fn test_longitude_wraparound() {
        let a = GeoCoord::longitude(170.0);
        let b = GeoCoord::longitude(20.0);
        assert_eq!(a + b, GeoCoord::longitude(-170.0));
        assert_eq!(GeoCoord::longitude(-170.0) - b, GeoCoord::longitude(170.0));
        assert_eq!(
            GeoCoord::longitude(-90.0) - GeoCoord::longitude(90.0),
            GeoCoord::longitude(180.0)
        );

        let mut c = GeoCoord::longitude(179.0);
        c += GeoCoord::longitude(1.0);
        assert_eq!(c.decimal(), 180 * UNITS_PER_DEGREE);

        // latitudes do not wrap
        let l = GeoCoord::latitude(80.0) + GeoCoord::latitude(20.0);
        assert_eq!(l.to_degrees(), 100.0);
    }

    #[test]
    fn test_scale_and_mean() {
        let c = GeoCoord::latitude(10.0);
        assert_eq!(c.scale(0.5), GeoCoord::latitude(5.0));
        assert_eq!(
            GeoCoord::mean(&GeoCoord::latitude(10.0), &GeoCoord::latitude(-20.0)),
            GeoCoord::latitude(-5.0)
        );
    }

    #[test]
    fn test_ordering() {
        let a = GeoCoord::latitude(-1.0);
        let b = GeoCoord::latitude(1.0);
        assert!(a < b);
        assert!(b > a);
        assert!(a <= GeoCoord::from_decimal(Axis::Latitude, a.decimal()));
        assert_ne!(a, b);
        assert_eq!(a.max(b), b);
    }
}
