//! Splitting bulk Tor directory documents into records.
//!
//! Archives from [CollecTor](https://collector.torproject.org/) are large flat
//! files made of a `@type` annotation followed by many concatenated records
//! (descriptors, status entries, ...). This crate checks the annotation and
//! cuts the archive into raw record blurbs, streaming them from a producer
//! thread so they can be consumed while the rest is still being cut.
//! The records themselves are not interpreted.

pub mod annotation;
#[doc(inline)]
pub use annotation::Annotation;

pub mod dissect;
#[doc(inline)]
pub use dissect::{Delimiter, Dissection, Dissector};

pub mod convert;

pub mod error;

pub mod kind;
#[doc(inline)]
pub use kind::DocumentKind;
