//! Document kinds archived by CollecTor

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::annotation::{self, Annotation};
use crate::dissect::Delimiter;
use crate::error::AnnotationError;

//
// External dependencies
//
use lazy_static::lazy_static;
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Last line of every signed descriptor
pub const SIGNATURE_END: &str = "-----END SIGNATURE-----\n";

/// A document type as named in its `@type` annotation
#[derive(Debug, Clone, Copy, EnumString, EnumIter, IntoStaticStr, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    #[strum(serialize = "network-status-consensus-3")]
    Consensus,
    #[strum(serialize = "network-status-microdesc-consensus-3")]
    MicrodescConsensus,
    #[strum(serialize = "server-descriptor")]
    ServerDescriptor,
    #[strum(serialize = "extra-info")]
    ExtraInfo,
    #[strum(serialize = "microdescriptor")]
    Microdescriptor,
    #[strum(serialize = "bridge-network-status")]
    BridgeNetworkStatus,
    #[strum(serialize = "bridge-server-descriptor")]
    BridgeServerDescriptor,
    #[strum(serialize = "bridge-extra-info")]
    BridgeExtraInfo,
}

lazy_static! {
    static ref ACCEPTED: HashMap<DocumentKind, HashSet<Annotation>> = DocumentKind::iter()
        .map(|kind| {
            let name: &'static str = kind.into();
            let accepted: HashSet<Annotation> = kind
                .versions()
                .iter()
                .map(|(major, minor)| Annotation::new(name, *major, *minor))
                .collect();
            (kind, accepted)
        })
        .collect();
}

impl DocumentKind {
    /// Format versions CollecTor has published for this kind
    fn versions(self) -> &'static [(&'static str, &'static str)] {
        match self {
            DocumentKind::BridgeNetworkStatus | DocumentKind::BridgeServerDescriptor => {
                &[("1", "0"), ("1", "1"), ("1", "2")]
            }
            DocumentKind::BridgeExtraInfo => &[("1", "1"), ("1", "2"), ("1", "3")],
            _ => &[("1", "0")],
        }
    }

    /// The annotations a document of this kind may start with.
    pub fn accepted(self) -> &'static HashSet<Annotation> {
        &ACCEPTED[&self]
    }

    /// Check that `line` is an annotation this kind accepts.
    pub fn validate(self, line: &str) -> Result<(), AnnotationError> {
        annotation::validate(line, self.accepted())
    }

    /// Look up the kind of a supported annotation.
    pub fn from_annotation(annotation: &Annotation) -> Option<DocumentKind> {
        let kind = annotation.doc_type.parse::<DocumentKind>().ok()?;
        if kind.accepted().contains(annotation) {
            Some(kind)
        } else {
            None
        }
    }

    /// Delimiter cutting an archive of this kind into single documents.
    ///
    /// Only signed documents have one: everything else lacks a closing line,
    /// so the last record of an archive could not be told apart from the
    /// trailing text.
    pub fn delimiter(self) -> Option<Delimiter> {
        match self {
            DocumentKind::ServerDescriptor
            | DocumentKind::ExtraInfo
            | DocumentKind::BridgeServerDescriptor
            | DocumentKind::BridgeExtraInfo => {
                Some(Delimiter::new(SIGNATURE_END, SIGNATURE_END.len(), 0))
            }
            _ => None,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name: &'static str = (*self).into();
        write!(f, "{}", name)
    }
}
