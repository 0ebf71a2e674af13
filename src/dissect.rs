//! Cutting flat documents into record blurbs
//!
//! Archives of Tor documents are plain concatenations of records. A
//! [`Delimiter`] names the literal pattern that marks a record boundary and
//! where exactly the cut is made relative to each match. [`Blurbs`] performs
//! the cutting synchronously over the document's bytes, while a [`Dissector`] runs it on a
//! producer thread and hands the blurbs to the caller through a bounded
//! channel as they are found.
//!
//! ```no_run
//! # use tordissect::dissect::{Delimiter, Dissector};
//! let delimiter = Delimiter::new("-----END SIGNATURE-----\n", 24, 0);
//! let dissection = Dissector::default()
//!     .dissect_path("2022-01-server-descriptors", delimiter)
//!     .unwrap();
//! for unit in dissection {
//!     let blurb = unit.unwrap();
//!     println!("{}", blurb.len());
//! }
//! ```

use std::cmp;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

use crate::error::DissectError;

//
// External dependencies
//
use derive_builder::Builder;
use log::{debug, trace, warn};
use memchr::memmem::Finder;

/// One unit handed from the producer to the consumer: a blurb, or the error
/// that ended the dissection.
///
/// Bytes of a blurb that are not valid UTF-8 are replaced with U+FFFD; the
/// other blurbs of the document are unaffected.
pub type QueueUnit = Result<String, DissectError>;

/// Describes how a document is cut into blurbs.
///
/// Each match of `pattern` ends a record `offset` bytes after the start of
/// the match. The first `skip` records are cut off but not emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter {
    pub pattern: String,
    pub offset: usize,
    pub skip: usize,
}

impl Delimiter {
    pub fn new(pattern: impl Into<String>, offset: usize, skip: usize) -> Delimiter {
        Delimiter {
            pattern: pattern.into(),
            offset,
            skip,
        }
    }

    /// Make sure every cut advances through the document.
    pub fn check(&self) -> Result<(), DissectError> {
        let reason = if self.pattern.is_empty() {
            "pattern must not be empty"
        } else if self.offset == 0 {
            "offset must be at least 1"
        } else {
            return Ok(());
        };
        Err(DissectError::InvalidDelimiter {
            pattern: self.pattern.clone(),
            offset: self.offset,
            reason,
        })
    }
}

/// Iterator over the blurbs of a document held in memory.
///
/// Cutting works on raw bytes, so content that is not valid UTF-8 is cut
/// like any other. Text after the last match of the pattern is not a blurb
/// and is never emitted.
pub struct Blurbs<'a> {
    rest: &'a [u8],
    finder: Finder<'static>,
    offset: usize,
    skip: usize,
    emitted: usize,
    skipped: usize,
}

impl<'a> Blurbs<'a> {
    /// Start cutting `content`. The delimiter is owned by this run, so its
    /// skip counter only ever affects this run.
    pub fn new(content: &'a [u8], delimiter: Delimiter) -> Result<Blurbs<'a>, DissectError> {
        delimiter.check()?;
        Ok(Blurbs::unchecked(content, delimiter))
    }

    /// Callers must have run [`Delimiter::check`] already.
    fn unchecked(content: &'a [u8], delimiter: Delimiter) -> Blurbs<'a> {
        Blurbs {
            rest: content,
            finder: Finder::new(delimiter.pattern.as_bytes()).into_owned(),
            offset: delimiter.offset,
            skip: delimiter.skip,
            emitted: 0,
            skipped: 0,
        }
    }

    /// The part of the document that has not been cut yet
    pub fn remainder(&self) -> &'a [u8] {
        self.rest
    }

    /// Number of blurbs emitted so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Number of matches absorbed by the skip counter so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<'a> Iterator for Blurbs<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        loop {
            let position = self.finder.find(self.rest)?;
            let cut = cmp::min(position.saturating_add(self.offset), self.rest.len());
            let (blurb, rest) = self.rest.split_at(cut);
            self.rest = rest;

            if self.skip > 0 {
                self.skip -= 1;
                self.skipped += 1;
                trace!("Skipping {} bytes ({} skips left)", cut, self.skip);
                continue;
            }

            self.emitted += 1;
            trace!("Cut blurb {} ({} bytes)", self.emitted, cut);
            return Some(blurb);
        }
    }
}

/// Runs dissections on a producer thread.
///
/// Blurbs are sent through a channel holding at most `capacity` units; the
/// producer blocks while the channel is full. A capacity of 0 hands over
/// every unit directly.
#[derive(Debug, Clone, Builder)]
#[builder(default)]
pub struct Dissector {
    capacity: usize,
    #[builder(setter(into))]
    thread_name: String,
}

impl Default for Dissector {
    fn default() -> Dissector {
        Dissector {
            capacity: 64,
            thread_name: String::from("tordissect"),
        }
    }
}

impl Dissector {
    pub fn builder() -> DissectorBuilder {
        DissectorBuilder::default()
    }

    /// Read all of `reader` on a new thread and stream its blurbs.
    ///
    /// An invalid delimiter is rejected before anything is read. A failing
    /// read shows up as the only unit of the returned dissection.
    pub fn dissect<R>(
        &self,
        mut reader: R,
        delimiter: Delimiter,
    ) -> Result<Dissection, DissectError>
    where
        R: Read + Send + 'static,
    {
        self.spawn(delimiter, move || {
            let mut content = Vec::new();
            reader.read_to_end(&mut content)?;
            Ok(content)
        })
    }

    /// Like [`Dissector::dissect`], but reads the file at `path`.
    ///
    /// Failing to open the file is reported like any other read failure.
    pub fn dissect_path(
        &self,
        path: impl AsRef<Path>,
        delimiter: Delimiter,
    ) -> Result<Dissection, DissectError> {
        let path = path.as_ref().to_path_buf();
        self.spawn(delimiter, move || fs::read(path))
    }

    fn spawn<F>(&self, delimiter: Delimiter, read: F) -> Result<Dissection, DissectError>
    where
        F: FnOnce() -> io::Result<Vec<u8>> + Send + 'static,
    {
        delimiter.check()?;
        let (tx, rx) = mpsc::sync_channel(self.capacity);
        let handle = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || produce(read, delimiter, tx))
            .map_err(DissectError::Spawn)?;
        Ok(Dissection { rx, handle })
    }
}

/// Producer loop. The channel closes when `tx` is dropped, which happens on
/// every way out of this function, unwinding included.
fn produce<F>(read: F, delimiter: Delimiter, tx: SyncSender<QueueUnit>)
where
    F: FnOnce() -> io::Result<Vec<u8>>,
{
    let content = match read() {
        Ok(content) => content,
        Err(err) => {
            debug!("Reading document failed: {}", err);
            let _ = tx.send(Err(DissectError::Read(err)));
            return;
        }
    };
    debug!(
        "Dissecting {} bytes at {:?} (offset {}, skip {})",
        content.len(),
        delimiter.pattern,
        delimiter.offset,
        delimiter.skip
    );

    let mut blurbs = Blurbs::unchecked(&content, delimiter);
    for (sent, blurb) in blurbs.by_ref().enumerate() {
        let blurb = String::from_utf8_lossy(blurb).into_owned();
        if tx.send(Ok(blurb)).is_err() {
            warn!(
                "Consumer went away, stopping dissection after {} blurbs",
                sent
            );
            return;
        }
    }
    debug!(
        "Dissection finished: {} blurbs, {} skipped, {} trailing bytes discarded",
        blurbs.emitted(),
        blurbs.skipped(),
        blurbs.remainder().len()
    );
}

/// The consuming end of a running dissection.
///
/// Iterating yields the units in the order they were produced and ends once
/// the producer is done. Dropping it makes the producer stop at its next
/// hand-off.
pub struct Dissection {
    rx: Receiver<QueueUnit>,
    handle: JoinHandle<()>,
}

impl Dissection {
    /// Stop consuming and wait for the producer thread to exit.
    ///
    /// Returns the producer's panic payload if it panicked.
    pub fn join(self) -> thread::Result<()> {
        let Dissection { rx, handle } = self;
        drop(rx);
        handle.join()
    }
}

impl Iterator for Dissection {
    type Item = QueueUnit;

    fn next(&mut self) -> Option<QueueUnit> {
        self.rx.recv().ok()
    }
}

/// Dissect `reader` with a default [`Dissector`].
pub fn dissect<R>(reader: R, delimiter: Delimiter) -> Result<Dissection, DissectError>
where
    R: Read + Send + 'static,
{
    Dissector::default().dissect(reader, delimiter)
}
