//! Removal of quoted history ("-----Original Message-----" and friends) from
//! message bodies.

use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone, Default)]
pub struct QuoteTrimmer {
    delimiters: Vec<Regex>,
}

impl QuoteTrimmer {
    /// Compiles the delimiter patterns in order; blank entries are skipped.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        let delimiters = patterns
            .iter()
            .map(AsRef::as_ref)
            .filter(|pattern| !pattern.trim().is_empty())
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .multi_line(true)
                    .case_insensitive(true)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { delimiters })
    }

    pub fn is_empty(&self) -> bool {
        self.delimiters.is_empty()
    }

    /// Cuts the body right before the first delimiter (in configured order)
    /// that matches anywhere, trimming surrounding whitespace. Bodies without
    /// a match come back unchanged.
    pub fn trim<'a>(&self, body: &'a str) -> &'a str {
        if body.is_empty() {
            return body;
        }
        self.delimiters
            .iter()
            .find_map(|delimiter| delimiter.find(body))
            .map(|found| body[..found.start()].trim())
            .unwrap_or(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outlook_trimmer() -> QuoteTrimmer {
        QuoteTrimmer::new(&[
            "^-+ ?Original Message ?-+",
            "",
            "^From: .+$",
            "^On .+ wrote:$",
        ])
        .unwrap()
    }

    #[test]
    fn cuts_before_first_matching_delimiter() {
        let body = "Thanks, shipped.\n\n-----Original Message-----\nFrom: a@example.com\nold text";
        assert_eq!(outlook_trimmer().trim(body), "Thanks, shipped.");
    }

    #[test]
    fn earlier_delimiters_take_priority_over_earlier_positions() {
        let trimmer = QuoteTrimmer::new(&["^On .+ wrote:$", "^From: .+$"]).unwrap();
        let body = "Reply\nFrom: someone@example.com\nmore\nOn Mon, Bob wrote:\nquoted";
        assert_eq!(trimmer.trim(body), "Reply\nFrom: someone@example.com\nmore");
    }

    #[test]
    fn matching_is_case_insensitive_and_multiline() {
        let body = "ok\n----- original message -----\nquoted";
        assert_eq!(outlook_trimmer().trim(body), "ok");
    }

    #[test]
    fn body_without_delimiter_is_unchanged() {
        let body = "  no quotes here  \n";
        assert_eq!(outlook_trimmer().trim(body), body);
    }

    #[test]
    fn empty_inputs_are_untouched() {
        assert_eq!(outlook_trimmer().trim(""), "");
        let none = QuoteTrimmer::new::<&str>(&[]).unwrap();
        assert!(none.is_empty());
        assert_eq!(none.trim("From: x\nbody"), "From: x\nbody");
    }

    #[test]
    fn blank_patterns_are_skipped() {
        let trimmer = QuoteTrimmer::new(&["", "   ", "^>"]).unwrap();
        assert!(!trimmer.is_empty());
        assert_eq!(trimmer.trim("top\n> quoted"), "top");
    }

    #[test]
    fn trimming_is_idempotent() {
        let trimmer = outlook_trimmer();
        let bodies = [
            "Thanks\n\nOn Tue, Ann wrote:\n> old",
            "  padded reply  \n\nFrom: b@example.com\n",
            "plain body",
            "",
            "From: first line is a header\nrest",
            "a\n-- Original Message --\nb\n-----Original Message-----\nc",
        ];
        for body in bodies {
            let once = trimmer.trim(body);
            assert_eq!(trimmer.trim(once), once, "body: {:?}", body);
        }
    }

    #[test]
    fn invalid_pattern_is_reported() {
        assert!(QuoteTrimmer::new(&["(unclosed"]).is_err());
    }
}
