//! Document type annotations (`@type <type> <major>.<minor>`)
//!
//! Every document archived by [CollecTor](https://collector.torproject.org/formats.html)
//! starts with a single annotation line declaring its type and format version.
//! This module parses that line and checks it against a set of accepted
//! annotations.

use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use crate::error::AnnotationError;

//
// External dependencies
//
use log::debug;

/// Keyword every annotation line starts with
pub const ANNOTATION_KEYWORD: &str = "@type";

/// A document's declared type and version.
///
/// Major and minor version are kept as the literal strings found in the
/// document, so `1.0` and `01.0` are different annotations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Annotation {
    pub doc_type: String,
    pub major: String,
    pub minor: String,
}

impl Annotation {
    pub fn new(
        doc_type: impl Into<String>,
        major: impl Into<String>,
        minor: impl Into<String>,
    ) -> Annotation {
        Annotation {
            doc_type: doc_type.into(),
            major: major.into(),
            minor: minor.into(),
        }
    }

    /// Parse an annotation from a document's first line.
    ///
    /// The line is split on single spaces and must consist of exactly the
    /// keyword, the type and a `MAJOR.MINOR` version.
    pub fn parse(line: &str) -> Result<Annotation, AnnotationError> {
        let words = line.split(' ').collect::<Vec<&str>>();
        match words[..] {
            [ANNOTATION_KEYWORD, doc_type, version] => {
                let version = version.split('.').collect::<Vec<&str>>();
                match version[..] {
                    [major, minor] => Ok(Annotation::new(doc_type, major, minor)),
                    _ => Err(AnnotationError::malformed(line)),
                }
            }
            _ => Err(AnnotationError::malformed(line)),
        }
    }

    /// Read the first line of `reader` and parse it as an annotation.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Annotation, AnnotationError> {
        let line = read_first_line(reader)?;
        Annotation::parse(&line)
    }

    /// Open the file at `path` and parse the annotation in its first line.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Annotation, AnnotationError> {
        let file = File::open(path.as_ref())?;
        Annotation::from_reader(BufReader::new(file))
    }
}

impl FromStr for Annotation {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Annotation::parse(s)
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {}.{}",
            ANNOTATION_KEYWORD, self.doc_type, self.major, self.minor
        )
    }
}

/// Check that `line` carries one of the `accepted` annotations.
pub fn validate(line: &str, accepted: &HashSet<Annotation>) -> Result<(), AnnotationError> {
    let observed = Annotation::parse(line)?;
    if accepted.contains(&observed) {
        return Ok(());
    }

    debug!("Rejecting annotation {:?}", line);
    let mut accepted = accepted.iter().cloned().collect::<Vec<_>>();
    accepted.sort_unstable();
    Err(AnnotationError::Unsupported {
        line: line.to_string(),
        accepted,
    })
}

/// Read the first line of `reader` and [`validate`] it.
///
/// Only the annotation line is consumed from the reader.
pub fn check_annotation<R: BufRead>(
    reader: R,
    accepted: &HashSet<Annotation>,
) -> Result<(), AnnotationError> {
    let line = read_first_line(reader)?;
    validate(&line, accepted)
}

/// First line of the reader, without its line terminator
fn read_first_line<R: BufRead>(mut reader: R) -> Result<String, AnnotationError> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted(items: &[(&str, &str, &str)]) -> HashSet<Annotation> {
        items
            .iter()
            .map(|(t, major, minor)| Annotation::new(*t, *major, *minor))
            .collect()
    }

    #[test]
    fn parse_and_render() {
        let line = "@type server-descriptor 1.0";
        let annotation = Annotation::parse(line).unwrap();
        assert_eq!(annotation, Annotation::new("server-descriptor", "1", "0"));
        assert_eq!(annotation.to_string(), line);

        let annotation: Annotation = "@type bridge-extra-info 1.3".parse().unwrap();
        assert_eq!(annotation.doc_type, "bridge-extra-info");
        assert_eq!(annotation.major, "1");
        assert_eq!(annotation.minor, "3");
    }

    #[test]
    fn parse_malformed() {
        for line in [
            "",
            "@type",
            "@type server-descriptor",
            "@type server-descriptor 1",
            "@type server-descriptor 1.0.1",
            "@type server-descriptor 1.0 extra",
            "@type  server-descriptor 1.0",
            "@type server-descriptor 1.0 ",
            "@kind server-descriptor 1.0",
        ] {
            match Annotation::parse(line) {
                Err(AnnotationError::Malformed { line: raw }) => assert_eq!(raw, line),
                other => panic!("{:?} parsed as {:?}", line, other),
            }
        }
    }

    #[test]
    fn validate_exact_match() {
        let accepted = accepted(&[("T", "1", "0")]);
        assert!(validate("@type T 1.0", &accepted).is_ok());

        for line in ["@type T 1.00", "@type T 01.0", "@type t 1.0", "@type T 1.1"] {
            match validate(line, &accepted) {
                Err(AnnotationError::Unsupported { line: raw, accepted }) => {
                    assert_eq!(raw, line);
                    assert_eq!(accepted, vec![Annotation::new("T", "1", "0")]);
                }
                other => panic!("{:?} validated as {:?}", line, other),
            }
        }
    }

    #[test]
    fn validate_malformed_before_lookup() {
        let accepted = accepted(&[("T", "1", "0")]);
        assert!(matches!(
            validate("@type T", &accepted),
            Err(AnnotationError::Malformed { .. })
        ));
        assert!(matches!(
            validate("@type T 1.0", &HashSet::new()),
            Err(AnnotationError::Unsupported { .. })
        ));
    }

    #[test]
    fn unsupported_message_lists_accepted() {
        let accepted = accepted(&[("b", "1", "0"), ("a", "1", "0")]);
        let err = validate("@type c 1.0", &accepted).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported file annotation '@type c 1.0' (accepted: @type a 1.0, @type b 1.0)"
        );
    }

    #[test]
    fn reader_first_line() {
        let text = "@type extra-info 1.0\r\nextra-info foo 0123\n";
        let annotation = Annotation::from_reader(text.as_bytes()).unwrap();
        assert_eq!(annotation, Annotation::new("extra-info", "1", "0"));

        let accepted = accepted(&[("extra-info", "1", "0")]);
        assert!(check_annotation(text.as_bytes(), &accepted).is_ok());
        assert!(check_annotation("@type extra-info 1.0".as_bytes(), &accepted).is_ok());
        assert!(matches!(
            check_annotation("".as_bytes(), &accepted),
            Err(AnnotationError::Malformed { .. })
        ));
    }

    #[test]
    fn missing_file() {
        let err = Annotation::from_path("/nonexistent/tordissect/annotation").unwrap_err();
        assert!(matches!(err, AnnotationError::Read(_)));
    }
}
