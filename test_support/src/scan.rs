//! Reader for generated project text.
//!
//! This is not a parser for the property-list format. It relies on the layout
//! the generator writes: one record head per line, tab indentation, and
//! `/* Begin <isa> section */` markers on lines of their own.

use indexmap::IndexMap;

/// Length of an object identifier.
const ID_LEN: usize = 24;

fn is_id(token: &str) -> bool {
    token.len() == ID_LEN
        && token
            .bytes()
            .all(|byte| byte.is_ascii_digit() || (b'A'..=b'F').contains(&byte))
}

/// The identifier whose record `line` opens, if any.
fn defined_on(line: &str) -> Option<&str> {
    let trimmed = line.trim_start_matches('\t');
    let token = trimmed.get(..ID_LEN)?;
    let after = trimmed.get(ID_LEN..)?;
    let opens = after.starts_with(" = {") || (after.starts_with(" /*") && after.contains("*/ = {"));
    (is_id(token) && opens).then_some(token)
}

fn depth(line: &str) -> usize {
    line.len() - line.trim_start_matches('\t').len()
}

/// A generated project held as text.
#[derive(Debug, Clone)]
pub struct ProjectScan {
    text: String,
}

impl ProjectScan {
    /// Wrap the project `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The project text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Identifiers of every record, in order of appearance.
    pub fn defined_ids(&self) -> Vec<&str> {
        self.text.lines().filter_map(defined_on).collect()
    }

    /// Every identifier token in the text, definitions included.
    pub fn referenced_ids(&self) -> Vec<&str> {
        self.text
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|token| is_id(token))
            .collect()
    }

    /// Number of records per section, in section order.
    pub fn section_counts(&self) -> IndexMap<String, usize> {
        let mut counts = IndexMap::new();
        let mut current: Option<String> = None;
        for line in self.text.lines() {
            if let Some(isa) = line
                .strip_prefix("/* Begin ")
                .and_then(|rest| rest.strip_suffix(" section */"))
            {
                counts.insert(isa.to_owned(), 0);
                current = Some(isa.to_owned());
            } else if line.starts_with("/* End ") {
                current = None;
            } else if let (Some(isa), Some(_)) = (&current, defined_on(line)) {
                if let Some(count) = counts.get_mut(isa) {
                    *count += 1;
                }
            }
        }
        counts
    }

    /// Identifier named by the `rootObject` entry.
    pub fn root_object(&self) -> Option<&str> {
        self.text.lines().find_map(|line| {
            line.trim_start_matches('\t')
                .strip_prefix("rootObject = ")
                .and_then(|rest| rest.get(..ID_LEN))
        })
    }

    /// Full text of the record defining `id`.
    pub fn record(&self, id: &str) -> Option<String> {
        let lines: Vec<&str> = self.text.lines().collect();
        let start = lines.iter().position(|line| defined_on(line) == Some(id))?;
        Some(record_from(&lines, start))
    }

    /// Full text of every record whose `isa` is `isa`, in order.
    pub fn records(&self, isa: &str) -> Vec<String> {
        let marker = format!("isa = {isa};");
        let lines: Vec<&str> = self.text.lines().collect();
        lines
            .iter()
            .enumerate()
            .filter(|(_, line)| defined_on(line).is_some())
            .map(|(start, _)| record_from(&lines, start))
            .filter(|text| text.contains(&marker))
            .collect()
    }

    /// The single record of type `isa` containing `needle`.
    pub fn record_with(&self, isa: &str, needle: &str) -> Option<String> {
        let mut matches = self
            .records(isa)
            .into_iter()
            .filter(|text| text.contains(needle));
        let found = matches.next()?;
        matches.next().is_none().then_some(found)
    }
}

fn record_from(lines: &[&str], start: usize) -> String {
    let Some(head) = lines.get(start) else {
        return String::new();
    };
    if head.trim_end().ends_with("};") {
        return (*head).to_owned();
    }
    let level = depth(head);
    let mut body = vec![*head];
    for &line in lines.iter().skip(start + 1) {
        body.push(line);
        if depth(line) == level && line.trim_start_matches('\t') == "};" {
            break;
        }
    }
    body.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SAMPLE: &str = "\
// !$*UTF8*$!
{
\tobjects = {

/* Begin PBXBuildFile section */
\t\t0123456789ABCDEF01234567 /* /src/main.c */ = { isa = PBXBuildFile; fileRef = 89ABCDEF0123456789ABCDEF /* /src/main.c */; };
/* End PBXBuildFile section */

/* Begin PBXGroup section */
\t\tAAAAAAAAAAAAAAAAAAAAAAAA = {
\t\t\tisa = PBXGroup;
\t\t\tchildren = (
\t\t\t\tBBBBBBBBBBBBBBBBBBBBBBBB /* Sources */,
\t\t\t);
\t\t};
\t\tBBBBBBBBBBBBBBBBBBBBBBBB /* Sources */ = {
\t\t\tisa = PBXGroup;
\t\t\tchildren = (
\t\t\t);
\t\t};
/* End PBXGroup section */
\t};
\trootObject = AAAAAAAAAAAAAAAAAAAAAAAA /* Project object */;
}
";

    #[rstest]
    fn list_items_are_references_not_definitions() {
        let scan = ProjectScan::new(SAMPLE);
        assert_eq!(
            scan.defined_ids(),
            [
                "0123456789ABCDEF01234567",
                "AAAAAAAAAAAAAAAAAAAAAAAA",
                "BBBBBBBBBBBBBBBBBBBBBBBB"
            ]
        );
        assert_eq!(scan.referenced_ids().len(), 6);
    }

    #[rstest]
    fn sections_count_their_records() {
        let counts = ProjectScan::new(SAMPLE).section_counts();
        assert_eq!(counts.get("PBXBuildFile"), Some(&1));
        assert_eq!(counts.get("PBXGroup"), Some(&2));
    }

    #[rstest]
    fn records_span_to_their_closing_brace() {
        let scan = ProjectScan::new(SAMPLE);
        assert_eq!(scan.root_object(), Some("AAAAAAAAAAAAAAAAAAAAAAAA"));
        let main = scan.record("AAAAAAAAAAAAAAAAAAAAAAAA").expect("main group");
        assert_eq!(main.lines().count(), 6);
        assert_eq!(scan.records("PBXGroup").len(), 2);
        assert!(scan.record_with("PBXGroup", "/* Sources */ = {").is_some());
    }
}
