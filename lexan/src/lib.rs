// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>
use std::cmp::Ordering;
use std::fmt;

/// A position within some piece of source text, identified by a human
/// friendly line number and offset together with a label naming the
/// text's origin (e.g. a file name). `Location`s are totally ordered so
/// that two locations belonging to the same label sort by position and
/// diagnostics that name several locations can be printed in a
/// deterministic order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    line_number: usize,
    offset: usize,
    label: String,
}

impl Location {
    pub fn new(label: &str) -> Self {
        Self {
            line_number: 1,
            offset: 1,
            label: label.to_string(),
        }
    }

    pub fn new_at(label: &str, line_number: usize, offset: usize) -> Self {
        Self {
            line_number,
            offset,
            label: label.to_string(),
        }
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn incr_line_number(&mut self) {
        self.line_number += 1;
        self.offset = 1;
    }

    pub fn incr_offset(&mut self) {
        self.offset += 1;
    }
}

impl fmt::Display for Location {
    fn fmt(&self, dest: &mut fmt::Formatter) -> fmt::Result {
        if self.label.is_empty() {
            write!(dest, "{}:{}", self.line_number, self.offset)
        } else if self.label.contains(' ') || self.label.contains('\t') {
            write!(
                dest,
                "\"{}\":{}:{}",
                self.label, self.line_number, self.offset
            )
        } else {
            write!(dest, "{}:{}:{}", self.label, self.line_number, self.offset)
        }
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> Ordering {
        self.label
            .cmp(&other.label)
            .then(self.line_number.cmp(&other.line_number))
            .then(self.offset.cmp(&other.offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_location() {
        let location = Location::new_at("whatever", 10, 15);
        assert_eq!(format!("{}", location), "whatever:10:15");
        let location = Location::new_at("", 9, 23);
        assert_eq!(format!("{}", location), "9:23");
    }

    #[test]
    fn location_cmp_orders_by_label_then_position() {
        let a = Location::new_at("file", 1, 1);
        let b = Location::new_at("file", 1, 2);
        let c = Location::new_at("file", 2, 1);
        assert!(a < b);
        assert!(b < c);
        assert!(a < c);
    }
}
