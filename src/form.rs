//! Field rules and value normalization shared by the page forms.

use std::{collections::BTreeSet, fmt, str::FromStr};

use time::{macros::format_description, Date};

/// Message shown under any field that fails its rule.
pub const INVALID_FIELD: &str = "正しく入力してください";

#[derive(Debug, Clone, Copy, Default)]
pub struct Rule {
    pub required: bool,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
}

impl Rule {
    pub const fn required() -> Self {
        Rule { required: true, min_len: None, max_len: None }
    }

    pub const fn min(mut self, len: usize) -> Self {
        self.min_len = Some(len);
        self
    }

    pub const fn max(mut self, len: usize) -> Self {
        self.max_len = Some(len);
        self
    }

    /// Lengths count chars; an empty optional field skips the length checks.
    pub fn check(&self, value: &str) -> bool {
        let len = value.chars().count();
        if len == 0 {
            return !self.required;
        }
        self.min_len.is_none_or(|min| len >= min) && self.max_len.is_none_or(|max| len <= max)
    }
}

/// Names of the fields that failed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeSet<&'static str>);

impl FieldErrors {
    pub fn check(&mut self, field: &'static str, rule: Rule, value: &str) {
        if !rule.check(value) {
            self.0.insert(field);
        }
    }

    pub fn add(&mut self, field: &'static str) {
        self.0.insert(field);
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Error markup for `field`, or nothing when it passed.
    pub fn html(&self, field: &str) -> &'static str {
        if self.has(field) {
            r#"<p class="small text-danger">正しく入力してください</p>"#
        } else {
            ""
        }
    }
}

/// How a submitted calendar date is written into outgoing payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateStyle {
    /// `2024-1-5`: month and day without zero padding.
    #[default]
    Unpadded,
    /// `2024-01-05`
    Iso,
}

impl FromStr for DateStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unpadded" => Ok(DateStyle::Unpadded),
            "iso" => Ok(DateStyle::Iso),
            other => Err(format!("expected `unpadded` or `iso`, got `{other}`")),
        }
    }
}

impl fmt::Display for DateStyle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DateStyle::Unpadded => f.write_str("unpadded"),
            DateStyle::Iso => f.write_str("iso"),
        }
    }
}

pub fn parse_date(value: &str) -> Option<Date> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// Rewrites an HTML `YYYY-MM-DD` date in `style`. The value is taken as a
/// calendar date; no timezone is applied.
pub fn normalize_date(value: &str, style: DateStyle) -> Option<String> {
    let date = parse_date(value)?;
    let (year, month, day) = (date.year(), u8::from(date.month()), date.day());
    Some(match style {
        DateStyle::Unpadded => format!("{year}-{month}-{day}"),
        DateStyle::Iso => format!("{year:04}-{month:02}-{day:02}"),
    })
}

/// Joins a normalized date and a time the way the backend expects.
pub fn join_datetime(date: &str, time: &str) -> String {
    format!("{date}T{time}")
}
