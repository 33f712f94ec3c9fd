//! Calendar date formatting.
//!
//! Formats containing `%` are handed to chrono's strftime. Anything else is read as a
//! Qt-style pattern (`yyyy-MM-dd`, `dddd d MMMM`, `'week' d`), which is what existing
//! guid scripts pass to `--forms-date-format`.

use std::fmt::Write as _;

use chrono::{Datelike, NaiveDate};

pub const DEFAULT_FORMAT: &str = "%Y-%m-%d";

/// Formats `date` with an optional user format.
pub fn format_date(date: NaiveDate, format: Option<&str>) -> String {
    let format = format.unwrap_or(DEFAULT_FORMAT);
    if format.contains('%') {
        let mut out = String::new();
        // Invalid strftime specifiers make the Display impl fail.
        if write!(out, "{}", date.format(format)).is_err() {
            tracing::warn!(format, "invalid date format, using default");
            return date.format(DEFAULT_FORMAT).to_string();
        }
        out
    } else {
        format_qt(date, format)
    }
}

fn format_qt(date: NaiveDate, pattern: &str) -> String {
    let mut out = String::new();
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            let start = i + 1;
            let mut end = start;
            while end < chars.len() && chars[end] != '\'' {
                end += 1;
            }
            if end == start {
                out.push('\'');
            } else {
                out.extend(&chars[start..end]);
            }
            i = end + 1;
            continue;
        }

        if !matches!(c, 'd' | 'M' | 'y') {
            out.push(c);
            i += 1;
            continue;
        }

        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }
        i += run;

        match c {
            'd' => {
                let mut left = run;
                while left > 0 {
                    let take = left.min(4);
                    match take {
                        1 => write!(out, "{}", date.day()),
                        2 => write!(out, "{:02}", date.day()),
                        3 => write!(out, "{}", date.format("%a")),
                        _ => write!(out, "{}", date.format("%A")),
                    }
                    .ok();
                    left -= take;
                }
            }
            'M' => {
                let mut left = run;
                while left > 0 {
                    let take = left.min(4);
                    match take {
                        1 => write!(out, "{}", date.month()),
                        2 => write!(out, "{:02}", date.month()),
                        3 => write!(out, "{}", date.format("%b")),
                        _ => write!(out, "{}", date.format("%B")),
                    }
                    .ok();
                    left -= take;
                }
            }
            _ => {
                let mut left = run;
                while left >= 4 {
                    write!(out, "{:04}", date.year()).ok();
                    left -= 4;
                }
                while left >= 2 {
                    write!(out, "{:02}", date.year().rem_euclid(100)).ok();
                    left -= 2;
                }
                if left == 1 {
                    out.push('y');
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, 7).unwrap()
    }

    #[test]
    fn default_is_iso() {
        assert_eq!(format_date(date(), None), "2020-03-07");
    }

    #[test]
    fn strftime_patterns() {
        assert_eq!(format_date(date(), Some("%d/%m/%Y")), "07/03/2020");
    }

    #[test]
    fn qt_patterns() {
        assert_eq!(format_date(date(), Some("yyyy-MM-dd")), "2020-03-07");
        assert_eq!(format_date(date(), Some("d.M.yy")), "7.3.20");
        assert_eq!(format_date(date(), Some("dddd d MMMM yyyy")), "Saturday 7 March 2020");
        assert_eq!(format_date(date(), Some("ddd MMM")), "Sat Mar");
    }

    #[test]
    fn qt_quoted_literals() {
        assert_eq!(format_date(date(), Some("'day' d")), "day 7");
        assert_eq!(format_date(date(), Some("d''M")), "7'3");
    }
}
