//! Stateless helpers: date serials, format classification, cell references.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use regex::{Captures, Regex};
use thiserror::Error;

use crate::spec::EnumDateEpoch;

const N_MS_PER_DAY: f64 = 86_400_000.0;
const N_YEAR_MIN: i32 = 1900;
const N_YEAR_MAX: i32 = 9999;

////////////////////////////////////////////////////////////////////////////////
// #region DateSerial

/// Why a numeric serial could not be read as a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EnumSerialError {
    /// `NaN` or infinite.
    #[error("date serial is not finite")]
    NotFinite,
    /// Outside 1900-01-01 ..= 9999-12-31.
    #[error("date serial out of supported range")]
    OutOfRange,
}

fn derive_epoch_origin(epoch: EnumDateEpoch) -> NaiveDateTime {
    let (n_year, n_month, n_day) = match epoch {
        EnumDateEpoch::Windows1900 => (1899, 12, 30),
        EnumDateEpoch::Mac1904 => (1904, 1, 1),
    };
    NaiveDate::from_ymd_opt(n_year, n_month, n_day)
        .unwrap_or_default()
        .and_time(Default::default())
}

/// Convert a spreadsheet date serial to a date-time.
///
/// Whole days count from the epoch origin, the fraction is rounded to the
/// millisecond. In the 1900 system serials below 60 shift by one day to skip
/// the phantom 1900-02-29.
pub fn convert_serial_to_datetime(
    value: f64,
    epoch: EnumDateEpoch,
) -> Result<NaiveDateTime, EnumSerialError> {
    if !value.is_finite() {
        return Err(EnumSerialError::NotFinite);
    }

    let mut n_days = value.floor();
    let n_ms = ((value - n_days) * N_MS_PER_DAY).round_ties_even() as i64;
    if epoch == EnumDateEpoch::Windows1900 && (0.0..60.0).contains(&value) {
        n_days += 1.0;
    }
    if n_days.abs() > 4_000_000.0 {
        return Err(EnumSerialError::OutOfRange);
    }

    let dt = TimeDelta::try_days(n_days as i64)
        .zip(TimeDelta::try_milliseconds(n_ms))
        .and_then(|(delta_days, delta_ms)| {
            derive_epoch_origin(epoch)
                .checked_add_signed(delta_days)?
                .checked_add_signed(delta_ms)
        })
        .ok_or(EnumSerialError::OutOfRange)?;

    if !(N_YEAR_MIN..=N_YEAR_MAX).contains(&chrono::Datelike::year(&dt)) {
        return Err(EnumSerialError::OutOfRange);
    }
    Ok(dt)
}

/// Convert a date-time to a 1900-system serial (the writer's date system).
pub fn derive_excel_serial(dt: &NaiveDateTime) -> f64 {
    let delta = *dt - derive_epoch_origin(EnumDateEpoch::Windows1900);
    let n_serial = delta.num_milliseconds() as f64 / N_MS_PER_DAY;
    if n_serial < 61.0 {
        n_serial - 1.0
    } else {
        n_serial
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FormatClassification

static RE_FMT_STRIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""[^"]*"|\[[^\]]*\]|[_\\]."#).expect("format strip pattern must compile")
});
static RE_FMT_ELAPSED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(?:hh?|mm?|ss?)\]$").expect("elapsed token pattern must compile")
});

/// Whether a number format code displays a date or time.
///
/// Only the first `;` section counts. Quoted literals, `\x` escapes, `_x`
/// paddings and bracketed tokens (except `[h]`, `[mm]`, `[ss]` elapsed
/// markers) are removed before searching for any of `d m h y s`.
pub fn is_date_format(fmt: &str) -> bool {
    let c_section = fmt.split(';').next().unwrap_or_default();
    let c_stripped = RE_FMT_STRIP.replace_all(c_section, |caps: &Captures<'_>| {
        let c_token = &caps[0];
        if RE_FMT_ELAPSED.is_match(c_token) {
            c_token.to_string()
        } else {
            String::new()
        }
    });
    c_stripped.chars().any(|chr| "dmhysDMHYS".contains(chr))
}

/// Whether header text contains any date keyword.
pub fn is_header_date_like(header_text: Option<&str>, keywords: &[String]) -> bool {
    header_text.is_some_and(|text| keywords.iter().any(|kw| text.contains(kw.as_str())))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellReference

/// Split an `A1` reference into zero-based `(row, col)`.
pub fn split_cell_reference(reference: &str) -> Option<(usize, usize)> {
    let n_len_letters = reference
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .count();
    if n_len_letters == 0 {
        return None;
    }

    let mut n_col = 0usize;
    for byte in reference[..n_len_letters].bytes() {
        n_col = n_col
            .checked_mul(26)?
            .checked_add(usize::from(byte.to_ascii_uppercase() - b'A') + 1)?;
    }
    let n_row: usize = reference[n_len_letters..].parse().ok()?;
    if n_row == 0 {
        return None;
    }
    Some((n_row - 1, n_col - 1))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    fn dt(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(hh, mm, ss))
            .expect("valid datetime")
    }

    #[test]
    fn test_convert_serial_windows_epoch() {
        let ep = EnumDateEpoch::Windows1900;
        assert_eq!(convert_serial_to_datetime(1.0, ep), Ok(dt(1900, 1, 1, 0, 0, 0)));
        assert_eq!(convert_serial_to_datetime(59.0, ep), Ok(dt(1900, 2, 28, 0, 0, 0)));
        assert_eq!(convert_serial_to_datetime(61.0, ep), Ok(dt(1900, 3, 1, 0, 0, 0)));
        assert_eq!(
            convert_serial_to_datetime(45292.5, ep),
            Ok(dt(2024, 1, 1, 12, 0, 0))
        );
    }

    #[test]
    fn test_convert_serial_mac_epoch() {
        let got = convert_serial_to_datetime(0.0, EnumDateEpoch::Mac1904).expect("in range");
        assert_eq!(got, dt(1904, 1, 1, 0, 0, 0));

        let got = convert_serial_to_datetime(43830.25, EnumDateEpoch::Mac1904).expect("in range");
        assert_eq!((got.year(), got.month(), got.day()), (2024, 1, 1));
        assert_eq!(got.hour(), 6);
    }

    #[test]
    fn test_convert_serial_rejects_invalid() {
        let ep = EnumDateEpoch::Windows1900;
        assert_eq!(
            convert_serial_to_datetime(f64::NAN, ep),
            Err(EnumSerialError::NotFinite)
        );
        assert_eq!(
            convert_serial_to_datetime(1e12, ep),
            Err(EnumSerialError::OutOfRange)
        );
        assert_eq!(
            convert_serial_to_datetime(-5.0, ep),
            Err(EnumSerialError::OutOfRange)
        );
    }

    #[test]
    fn test_derive_excel_serial_inverts_conversion() {
        assert_eq!(derive_excel_serial(&dt(1900, 1, 1, 0, 0, 0)), 1.0);
        assert_eq!(derive_excel_serial(&dt(1900, 3, 1, 0, 0, 0)), 61.0);
        assert_eq!(derive_excel_serial(&dt(2024, 1, 1, 12, 0, 0)), 45292.5);
    }

    #[test]
    fn test_is_date_format() {
        assert!(is_date_format("yyyy-mm-dd"));
        assert!(is_date_format("mm-dd-yy"));
        assert!(is_date_format(r#"m"月"d"日""#));
        assert!(is_date_format("[h]:mm:ss"));
        assert!(is_date_format("[$-409]h:mm AM/PM"));

        assert!(!is_date_format("General"));
        assert!(!is_date_format("0.00"));
        assert!(!is_date_format("#,##0_);[Red](#,##0)"));
        assert!(!is_date_format(r#""days"0"#));
        assert!(!is_date_format("@"));
        assert!(!is_date_format("0;[Red]yyyy"));
    }

    #[test]
    fn test_is_header_date_like() {
        let l_keywords = vec!["时间".to_string(), "到货".to_string()];
        assert!(is_header_date_like(Some("到货时间"), &l_keywords));
        assert!(is_header_date_like(Some("销售时间(本地)"), &l_keywords));
        assert!(!is_header_date_like(Some("City"), &l_keywords));
        assert!(!is_header_date_like(None, &l_keywords));
    }

    #[test]
    fn test_split_cell_reference() {
        assert_eq!(split_cell_reference("A1"), Some((0, 0)));
        assert_eq!(split_cell_reference("AB12"), Some((11, 27)));
        assert_eq!(split_cell_reference("xfd3"), Some((2, 16_383)));
        assert_eq!(split_cell_reference("12"), None);
        assert_eq!(split_cell_reference("A0"), None);
    }
}
