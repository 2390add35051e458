//! Icing product filename conventions.
//!
//! Files are named
//! `icing_YYYYMMDDTHH_step{N}h_YYYYMMDDTHH_level{L}hPa.tif`, where the first
//! timestamp is the model run and the second the valid time.

use chrono::NaiveDate;
use std::path::Path;

/// Selection keys extracted from an icing filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcingFileInfo {
    /// Run date, `YYYYMMDD`
    pub date: String,
    /// Run hour, `HH`
    pub run: String,
    /// Forecast step in hours
    pub step: u32,
    /// Pressure level in hPa
    pub level: u32,
}

/// Parse an icing filename (or a path ending in one).
///
/// Returns `None` for anything not following the naming convention.
pub fn parse_icing_filename(file_path: &str) -> Option<IcingFileInfo> {
    let filename = Path::new(file_path).file_name().and_then(|s| s.to_str())?;

    let rest = filename.strip_prefix("icing_")?;
    let (date, run, rest) = split_timestamp(rest)?;

    let rest = rest.strip_prefix("_step")?;
    let (step, rest) = split_number(rest)?;
    let rest = rest.strip_prefix("h_")?;

    // valid time, not used for selection
    let (_, _, rest) = split_timestamp(rest)?;

    let rest = rest.strip_prefix("_level")?;
    let (level, rest) = split_number(rest)?;
    if rest != "hPa.tif" {
        return None;
    }

    Some(IcingFileInfo {
        date: date.to_string(),
        run: run.to_string(),
        step,
        level,
    })
}

/// Split a leading `YYYYMMDDTHH` into date, hour and remainder.
fn split_timestamp(s: &str) -> Option<(&str, &str, &str)> {
    let date = s.get(..8)?;
    let hour = s.get(9..11)?;
    if !is_digits(date) || s.as_bytes().get(8) != Some(&b'T') || !is_digits(hour) {
        return None;
    }
    Some((date, hour, &s[11..]))
}

/// Split a leading run of ASCII digits.
fn split_number(s: &str) -> Option<(u32, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let value = s[..end].parse().ok()?;
    Some((value, &s[end..]))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Display form of a `YYYYMMDD` date: `DD/MM/YYYY`.
///
/// Returns `None` if the input is not a valid calendar date.
pub fn format_date(date: &str) -> Option<String> {
    NaiveDate::parse_from_str(date, "%Y%m%d")
        .ok()
        .map(|d| d.format("%d/%m/%Y").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_icing_filename() {
        let info = parse_icing_filename("icing_20251109T00_step6h_20251109T06_level850hPa.tif").unwrap();
        assert_eq!(info.date, "20251109");
        assert_eq!(info.run, "00");
        assert_eq!(info.step, 6);
        assert_eq!(info.level, 850);
    }

    #[test]
    fn test_parse_with_directory() {
        let info = parse_icing_filename(
            "data/20251109/step_120h/icing_20251109T12_step120h_20251114T12_level150hPa.tif",
        )
        .unwrap();
        assert_eq!(info.run, "12");
        assert_eq!(info.step, 120);
        assert_eq!(info.level, 150);
    }

    #[test]
    fn test_parse_rejects_other_names() {
        for name in [
            "icing_20251109T00_step6h_level850hPa.tif",
            "icing_20251109T00_step6h_20251109T06_level850hPa.tiff",
            "wind_20251109T00_step6h_20251109T06_level850hPa.tif",
            "icing_2025119T00_step6h_20251109T06_level850hPa.tif",
            "icing_20251109T00_stepXh_20251109T06_level850hPa.tif",
            "icing_20251109T00_step6h_20251109T06_levelhPa.tif",
            "",
        ] {
            assert!(parse_icing_filename(name).is_none(), "{}", name);
        }
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("20251109").as_deref(), Some("09/11/2025"));
        assert_eq!(format_date("20251332"), None);
        assert_eq!(format_date("2025"), None);
    }
}
