//! Component-name scanner for Tapestry templates
//!
//! Given a document snapshot and a cursor offset, decides whether the cursor
//! sits on a markup token naming a component and returns the token's text and
//! exact span. Recognised contexts:
//!
//! ```text
//! <t:alerts/>        namespaced tag        (preceded by ':')
//! <layout>           bare tag              (preceded by '<')
//! t:type="grid"      double-quoted value   (enclosed in '"')
//! t:type='grid'      single-quoted value   (enclosed in '\'')
//! ```
//!
//! All offsets are character offsets into the rope. The scan never fails: any
//! offset or document it cannot make sense of yields `None`.

use ropey::{Rope, RopeSlice};

/// A half-open span of characters in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub offset: usize,
    pub length: usize,
}

impl Region {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.offset && offset < self.end()
    }
}

/// A successful scan: the component name and where it sits in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentNameMatch {
    pub region: Region,
    pub name: String,
}

/// Finds the component name under `offset`, if any.
///
/// Only documents whose very first character is `<` are scanned. This is a
/// cheap approximation of "is this a template": a template with a leading
/// byte-order mark, whitespace or text before its first tag is not scanned.
pub fn find_component_name_at(document: &Rope, offset: usize) -> Option<ComponentNameMatch> {
    if !is_template(document) {
        return None;
    }

    let line_index = document.try_char_to_line(offset).ok()?;
    let line_start = document.try_line_to_char(line_index).ok()?;
    let line = line_content(document.line(line_index));

    let offset_in_line = offset - line_start;
    if offset_in_line >= line.len() {
        return None;
    }

    if !is_token_char(line[offset_in_line]) {
        return None;
    }

    let mut left = offset_in_line;
    let mut right = offset_in_line;

    while left > 0 && is_token_char(line[left - 1]) {
        left -= 1;
    }

    while right + 1 < line.len() && is_token_char(line[right + 1]) {
        right += 1;
    }

    if !is_valid_location_for_component_name(&line, left, right) {
        return None;
    }

    //  <t:alerts/>
    //           ^
    let right_trim = usize::from(line[right] == '/');
    let name_end = right + 1 - right_trim;

    // `right` is inclusive, so the cursor on the last character is rejected too
    if offset_in_line < left || offset_in_line >= right - right_trim {
        return None;
    }

    let name: String = line[left..name_end].iter().collect();

    Some(ComponentNameMatch {
        region: Region::new(line_start + left, name_end - left),
        name,
    })
}

/// Checks the first character of the document for `<`.
pub fn is_template(document: &Rope) -> bool {
    document.get_char(0) == Some('<')
}

/// Any character that is not whitespace and not one of `< > : ' "`.
pub fn is_token_char(ch: char) -> bool {
    !ch.is_whitespace() && !matches!(ch, '<' | '>' | ':' | '\'' | '"')
}

fn is_valid_location_for_component_name(line: &[char], left: usize, right: usize) -> bool {
    if left == 0 {
        return false;
    }

    let left_char = line[left - 1];

    //  <t:component
    //    ^
    //  <component xmlns="http://tapestry.apache.org/schema/tapestry_5_3.xsd"
    //  ^
    if left_char == ':' || left_char == '<' {
        return true;
    }

    let Some(&right_char) = line.get(right + 1) else {
        return false;
    };

    //  <div t:type='component'
    //              ^         ^
    matches!((left_char, right_char), ('"', '"') | ('\'', '\''))
}

/// Characters of a line without its terminator.
fn line_content(line: RopeSlice<'_>) -> Vec<char> {
    line.slice(..line_len_without_terminator(line)).chars().collect()
}

/// Length in characters of a rope line, excluding any line break ropey splits on.
pub fn line_len_without_terminator(line: RopeSlice<'_>) -> usize {
    let mut len = line.len_chars();
    match len.checked_sub(1).map(|last| line.char(last)) {
        Some('\n') => {
            len -= 1;
            if len > 0 && line.char(len - 1) == '\r' {
                len -= 1;
            }
        }
        Some('\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}') => {
            len -= 1;
        }
        _ => {}
    }
    len
}
