//! Conversion between "X ft Y in" height labels and stored centimetres.
//!
//! Labels come straight from client dropdowns, so parsing is lenient about
//! spacing and case but bounded in length: anything outside the grammar is
//! treated as "no value" rather than an error.

use serde::{Deserialize, Serialize};

const CM_PER_INCH: f64 = 2.54;
const MAX_LABEL_LEN: usize = 24;
const MAX_EDGE_WHITESPACE: usize = 3;
const MAX_INNER_WHITESPACE: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightOption {
    pub label: String,
    pub cm: i32,
}

/// Parse `<feet> ft <inches> in` (inches optional) into whole centimetres.
pub fn label_to_cm(label: &str) -> Option<i32> {
    if label.len() > MAX_LABEL_LEN {
        return None;
    }

    let leading = label.len() - label.trim_start().len();
    let trailing = label.len() - label.trim_end().len();
    if leading > MAX_EDGE_WHITESPACE || trailing > MAX_EDGE_WHITESPACE {
        return None;
    }

    let mut scanner = Scanner::new(label.trim());
    let feet = scanner.number(1)?;
    scanner.whitespace(0)?;
    scanner.keyword("ft")?;

    if scanner.is_done() {
        return Some(inches_to_cm(feet * 12));
    }

    scanner.whitespace(0)?;
    let inches = scanner.number(2)?;
    if inches >= 12 {
        return None;
    }
    scanner.whitespace(0)?;
    scanner.keyword("in")?;

    if !scanner.is_done() {
        return None;
    }

    Some(inches_to_cm(feet * 12 + inches))
}

/// Render centimetres as the nearest whole-inch label.
pub fn cm_to_label(cm: f64) -> Option<String> {
    if !cm.is_finite() || cm <= 0.0 {
        return None;
    }
    let total_inches = (cm / CM_PER_INCH).round() as i64;
    Some(format_inches(total_inches))
}

/// Every whole-inch height between `min_feet` ft 0 in and `max_feet` ft 0 in.
pub fn height_options(min_feet: u32, max_feet: u32) -> Vec<HeightOption> {
    let (lo, hi) = if min_feet <= max_feet {
        (min_feet, max_feet)
    } else {
        (max_feet, min_feet)
    };

    (lo * 12..=hi * 12)
        .map(|inches| HeightOption {
            label: format_inches(i64::from(inches)),
            cm: inches_to_cm(inches),
        })
        .collect()
}

fn inches_to_cm(inches: u32) -> i32 {
    (f64::from(inches) * CM_PER_INCH).round() as i32
}

fn format_inches(total_inches: i64) -> String {
    format!("{} ft {} in", total_inches / 12, total_inches % 12)
}

/// Single-pass cursor over an ASCII label; every loop is bounded.
struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn is_done(&self) -> bool {
        self.pos == self.bytes.len()
    }

    /// Between 1 and `max_digits` ASCII digits.
    fn number(&mut self, max_digits: usize) -> Option<u32> {
        let start = self.pos;
        let mut value: u32 = 0;
        while self.pos < self.bytes.len() && self.pos - start < max_digits {
            let b = self.bytes[self.pos];
            if !b.is_ascii_digit() {
                break;
            }
            value = value * 10 + u32::from(b - b'0');
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        // A further digit means the number was longer than allowed.
        if self.bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
            return None;
        }
        Some(value)
    }

    fn whitespace(&mut self, min: usize) -> Option<()> {
        let start = self.pos;
        while self.pos < self.bytes.len()
            && self.pos - start < MAX_INNER_WHITESPACE
            && self.bytes[self.pos].is_ascii_whitespace()
        {
            self.pos += 1;
        }
        if self.bytes.get(self.pos).is_some_and(u8::is_ascii_whitespace) {
            return None;
        }
        (self.pos - start >= min).then_some(())
    }

    fn keyword(&mut self, word: &str) -> Option<()> {
        let end = self.pos + word.len();
        let candidate = self.bytes.get(self.pos..end)?;
        if candidate.eq_ignore_ascii_case(word.as_bytes()) {
            self.pos = end;
            Some(())
        } else {
            None
        }
    }
}
