//! Loading TOML sources into node trees and saving node trees to sinks.
//!
//! A [`Loader`] is an immutable value built once through [`Loader::builder`].
//! It owns a [`Source`] to read from, a [`Sink`] to write to, the parsing and
//! writing engines, and a [`LoaderConfig`].
//!
//! Loading runs `open → read → parse → populate`; saving runs
//! `serialize → encode → open → write → close`. A failing load leaves the
//! target node unchanged, and a failing save leaves the sink untouched because
//! the whole tree is validated and encoded before the sink is opened.
//!
//! ## Examples
//!
//! ```rust
//! use toml_node::{Loader, StringSink, StringSource};
//!
//! let sink = StringSink::new();
//! let loader = Loader::builder()
//!     .source(StringSource::new("[server]\nport = 8080\n"))
//!     .sink(sink.clone())
//!     .build();
//!
//! let mut root = loader.load().unwrap();
//! root.at_mut(["server", "host"]).set("localhost");
//! loader.save(&root).unwrap();
//!
//! assert!(sink.contents().contains("host = \"localhost\""));
//! ```

use crate::context::ConversionSettings;
use crate::engine::{DocumentParser, DocumentWriter, TomlEngine};
use crate::error::{Error, IoOperation, Result};
use crate::node::{ConfigNode, NodeOptions};
use crate::options::{Charset, HeaderMode, IntegerOverflow};
use crate::populate;
use crate::serialize;
use chrono::{FixedOffset, Offset, Utc};
use log::debug;
use tempfile::NamedTempFile;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Something a loader reads TOML bytes from.
pub trait Source: Send + Sync {
    /// Opens the source for reading.
    ///
    /// Returns `Ok(None)` when the source does not exist yet, which loads as
    /// an empty configuration.
    fn open(&self) -> io::Result<Option<Box<dyn Read + '_>>>;
}

/// Something a loader writes TOML bytes to.
pub trait Sink: Send + Sync {
    fn open(&self) -> io::Result<Box<dyn SinkWriter + '_>>;
}

/// An open sink. Written bytes become visible once [`finish`](SinkWriter::finish) succeeds.
pub trait SinkWriter: Write {
    fn finish(self: Box<Self>) -> io::Result<()>;
}

/// A TOML file on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathSource {
    path: PathBuf,
}

impl PathSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PathSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Source for PathSource {
    fn open(&self) -> io::Result<Option<Box<dyn Read + '_>>> {
        match File::open(&self.path) {
            Ok(file) => Ok(Some(Box::new(BufReader::new(file)))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Fixed in-memory text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringSource {
    text: String,
}

impl StringSource {
    pub fn new(text: impl Into<String>) -> Self {
        StringSource { text: text.into() }
    }
}

impl Source for StringSource {
    fn open(&self) -> io::Result<Option<Box<dyn Read + '_>>> {
        Ok(Some(Box::new(self.text.as_bytes())))
    }
}

/// Closures producing the raw bytes of a source.
impl<F> Source for F
where
    F: Fn() -> io::Result<Vec<u8>> + Send + Sync,
{
    fn open(&self) -> io::Result<Option<Box<dyn Read + '_>>> {
        Ok(Some(Box::new(Cursor::new(self()?))))
    }
}

/// A TOML file on disk, replaced atomically.
///
/// Bytes go to a uniquely named temporary file in the destination's
/// directory, which is persisted over the destination once writing finished.
/// Missing parent directories are created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathSink {
    path: PathBuf,
}

impl PathSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PathSink { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl Sink for PathSink {
    fn open(&self) -> io::Result<Box<dyn SinkWriter + '_>> {
        if self.path.file_name().is_none() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} does not name a file", self.path.display()),
            ));
        }
        let directory = self.directory();
        fs::create_dir_all(directory)?;
        let temp = NamedTempFile::new_in(directory)?;
        Ok(Box::new(AtomicFileWriter {
            file: BufWriter::new(temp),
            destination: &self.path,
        }))
    }
}

/// Dropping the writer without finishing deletes the temporary file.
struct AtomicFileWriter<'a> {
    file: BufWriter<NamedTempFile>,
    destination: &'a Path,
}

impl Write for AtomicFileWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl SinkWriter for AtomicFileWriter<'_> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let AtomicFileWriter { file, destination } = *self;
        let temp = file.into_inner().map_err(|e| e.into_error())?;
        temp.as_file().sync_all()?;
        temp.persist(destination).map_err(|e| e.error)?;
        Ok(())
    }
}

/// A shared in-memory sink.
///
/// Clones share one buffer, so a clone handed to a loader can be inspected
/// afterwards through the original.
#[derive(Clone, Debug, Default)]
pub struct StringSink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl StringSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last completed write, as raw bytes.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        match self.buffer.lock() {
            Ok(buffer) => buffer.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// The last completed write, decoded as UTF-8.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes()).into_owned()
    }
}

impl Sink for StringSink {
    fn open(&self) -> io::Result<Box<dyn SinkWriter + '_>> {
        Ok(Box::new(BufferedWriter {
            buffer: Vec::new(),
            commit: move |bytes: Vec<u8>| -> io::Result<()> {
                let mut shared = self
                    .buffer
                    .lock()
                    .map_err(|_| io::Error::new(io::ErrorKind::Other, "sink buffer poisoned"))?;
                *shared = bytes;
                Ok(())
            },
        }))
    }
}

/// Closures receiving the complete output in one call.
impl<F> Sink for F
where
    F: Fn(&[u8]) -> io::Result<()> + Send + Sync,
{
    fn open(&self) -> io::Result<Box<dyn SinkWriter + '_>> {
        Ok(Box::new(BufferedWriter {
            buffer: Vec::new(),
            commit: move |bytes: Vec<u8>| self(&bytes),
        }))
    }
}

struct BufferedWriter<C> {
    buffer: Vec<u8>,
    commit: C,
}

impl<C> Write for BufferedWriter<C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<C> SinkWriter for BufferedWriter<C>
where
    C: FnOnce(Vec<u8>) -> io::Result<()>,
{
    fn finish(self: Box<Self>) -> io::Result<()> {
        let BufferedWriter { buffer, commit } = *self;
        commit(buffer)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoadStage {
    SourceOpened,
    Parsed,
    Populated,
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SaveStage {
    Serialized,
    SinkOpened,
    Written,
    Done,
}

/// Options a [`Loader`] was built with.
#[derive(Clone, Debug, PartialEq)]
pub struct LoaderConfig {
    pub charset: Charset,
    /// Options given to every node the loader creates.
    pub node_options: NodeOptions,
    pub integer_overflow: IntegerOverflow,
    /// Offset UTC instants are written in.
    pub zone_offset: FixedOffset,
    pub header_mode: HeaderMode,
    /// Header written by [`HeaderMode::Preset`], and by [`HeaderMode::Preserve`]
    /// when the saved root has no comment.
    pub header: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            charset: Charset::default(),
            node_options: NodeOptions::default(),
            integer_overflow: IntegerOverflow::default(),
            zone_offset: Utc.fix(),
            header_mode: HeaderMode::default(),
            header: None,
        }
    }
}

impl LoaderConfig {
    /// The conversion settings derived from this configuration.
    #[must_use]
    pub fn settings(&self) -> ConversionSettings {
        ConversionSettings::new()
            .with_node_options(self.node_options.clone())
            .with_integer_overflow(self.integer_overflow)
            .with_zone_offset(self.zone_offset)
    }
}

/// Builder for [`Loader`].
#[derive(Default)]
pub struct LoaderBuilder {
    config: LoaderConfig,
    source: Option<Arc<dyn Source>>,
    sink: Option<Arc<dyn Sink>>,
    parser: Option<Arc<dyn DocumentParser>>,
    writer: Option<Arc<dyn DocumentWriter>>,
}

impl LoaderBuilder {
    /// Reads from and writes to the file at `path`.
    #[must_use]
    pub fn path(self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.source(PathSource::new(path.clone()))
            .sink(PathSink::new(path))
    }

    #[must_use]
    pub fn source(mut self, source: impl Source + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    #[must_use]
    pub fn sink(mut self, sink: impl Sink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    #[must_use]
    pub fn charset(mut self, charset: Charset) -> Self {
        self.config.charset = charset;
        self
    }

    #[must_use]
    pub fn node_options(mut self, node_options: NodeOptions) -> Self {
        self.config.node_options = node_options;
        self
    }

    #[must_use]
    pub fn integer_overflow(mut self, integer_overflow: IntegerOverflow) -> Self {
        self.config.integer_overflow = integer_overflow;
        self
    }

    #[must_use]
    pub fn zone_offset(mut self, zone_offset: FixedOffset) -> Self {
        self.config.zone_offset = zone_offset;
        self
    }

    #[must_use]
    pub fn header_mode(mut self, header_mode: HeaderMode) -> Self {
        self.config.header_mode = header_mode;
        self
    }

    #[must_use]
    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.config.header = Some(header.into());
        self
    }

    #[must_use]
    pub fn parser(mut self, parser: impl DocumentParser + 'static) -> Self {
        self.parser = Some(Arc::new(parser));
        self
    }

    #[must_use]
    pub fn writer(mut self, writer: impl DocumentWriter + 'static) -> Self {
        self.writer = Some(Arc::new(writer));
        self
    }

    /// Uses `engine` for both parsing and writing.
    #[must_use]
    pub fn engine(self, engine: TomlEngine) -> Self {
        self.parser(engine.clone()).writer(engine)
    }

    #[must_use]
    pub fn build(self) -> Loader {
        Loader {
            config: self.config,
            source: self.source,
            sink: self.sink,
            parser: self.parser.unwrap_or_else(|| Arc::new(TomlEngine::new())),
            writer: self.writer.unwrap_or_else(|| Arc::new(TomlEngine::new())),
        }
    }
}

/// Loads and saves node trees as TOML.
///
/// A loader holds no state between calls besides its configuration, so one
/// instance can serve any number of loads and saves.
#[derive(Clone)]
pub struct Loader {
    config: LoaderConfig,
    source: Option<Arc<dyn Source>>,
    sink: Option<Arc<dyn Sink>>,
    parser: Arc<dyn DocumentParser>,
    writer: Arc<dyn DocumentWriter>,
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("config", &self.config)
            .field("can_load", &self.can_load())
            .field("can_save", &self.can_save())
            .finish()
    }
}

impl Loader {
    #[must_use]
    pub fn builder() -> LoaderBuilder {
        LoaderBuilder::default()
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Whether a source is configured.
    pub fn can_load(&self) -> bool {
        self.source.is_some()
    }

    /// Whether a sink is configured.
    pub fn can_save(&self) -> bool {
        self.sink.is_some()
    }

    /// An empty root map carrying the configured node options.
    ///
    /// This is the node a missing source loads as, and it saves as an empty
    /// document.
    #[must_use]
    pub fn create_node(&self) -> ConfigNode {
        let mut root = ConfigNode::root(self.config.node_options.clone());
        root.set_empty_map();
        root
    }

    /// Loads the source into a new root node.
    ///
    /// A source that does not exist loads as an empty map.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] when no source is configured or it cannot be read
    /// - [`Error::Parse`] for malformed TOML
    /// - [`Error::RangeOverflow`] for over-wide integers under the strict policy
    pub fn load(&self) -> Result<ConfigNode> {
        let mut root = self.create_node();
        self.load_into(&mut root)?;
        Ok(root)
    }

    /// Loads the source into an existing node, merging tables into its map.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Loader::load); `target` is unchanged on failure.
    pub fn load_into(&self, target: &mut ConfigNode) -> Result<()> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| Error::io_msg(IoOperation::Open, "no source configured"))?;

        let reader = source.open().map_err(|e| Error::io(IoOperation::Open, &e))?;
        let Some(mut reader) = reader else {
            debug!("load: source does not exist, keeping an empty configuration");
            if target.is_null() {
                target.set_empty_map();
            }
            return Ok(());
        };
        debug!("load: {:?}", LoadStage::SourceOpened);

        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| Error::io(IoOperation::Read, &e))?;
        drop(reader);

        let text = self.config.charset.decode(bytes).map_err(|offset| {
            Error::io_msg(
                IoOperation::Read,
                &format!(
                    "invalid {} sequence at byte {}",
                    self.config.charset.as_str(),
                    offset
                ),
            )
        })?;
        self.populate_from(&text, target)
    }

    /// Parses `text` into a new root node, without touching the source.
    ///
    /// # Errors
    ///
    /// [`Error::Parse`] or [`Error::RangeOverflow`].
    pub fn load_str(&self, text: &str) -> Result<ConfigNode> {
        let mut root = self.create_node();
        self.populate_from(text, &mut root)?;
        Ok(root)
    }

    fn populate_from(&self, text: &str, target: &mut ConfigNode) -> Result<()> {
        let table = self.parser.parse(text)?;
        debug!("load: {:?} ({} top-level keys)", LoadStage::Parsed, table.len());

        populate::populate_table(&table, target, &self.config.settings())?;
        debug!("load: {:?}", LoadStage::Populated);

        if self.config.header_mode == HeaderMode::Preserve {
            if let Some(header) = read_header(text) {
                target.set_comment(header);
            }
        }
        debug!("load: {:?}", LoadStage::Done);
        Ok(())
    }

    /// Serializes `root` and writes it to the sink.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRootShape`], [`Error::InvalidKey`] or
    ///   [`Error::UnrepresentableValue`] before anything is written
    /// - [`Error::Io`] when no sink is configured, the text cannot be encoded
    ///   in the configured charset, or the sink fails
    pub fn save(&self, root: &ConfigNode) -> Result<()> {
        let sink = self
            .sink
            .as_ref()
            .ok_or_else(|| Error::io_msg(IoOperation::Open, "no sink configured"))?;

        let text = self.save_to_string(root)?;
        let charset = self.config.charset;
        let bytes = charset.encode(&text).map_err(|c| {
            Error::io_msg(
                IoOperation::Write,
                &format!("{:?} cannot be encoded as {}", c, charset.as_str()),
            )
        })?;

        let mut writer = sink.open().map_err(|e| Error::io(IoOperation::Open, &e))?;
        debug!("save: {:?}", SaveStage::SinkOpened);

        writer
            .write_all(&bytes)
            .map_err(|e| Error::io(IoOperation::Write, &e))?;
        debug!("save: {:?} ({} bytes)", SaveStage::Written, bytes.len());

        writer
            .finish()
            .map_err(|e| Error::io(IoOperation::Close, &e))?;
        debug!("save: {:?}", SaveStage::Done);
        Ok(())
    }

    /// Serializes `root` to TOML text, including the header.
    ///
    /// # Errors
    ///
    /// Same as [`serialize::serialize`], plus [`Error::Encode`] from the writer.
    pub fn save_to_string(&self, root: &ConfigNode) -> Result<String> {
        let table = serialize::serialize(root, &self.config.settings())?;
        let body = self.writer.write(&table)?;
        debug!("save: {:?}", SaveStage::Serialized);

        let header = match self.config.header_mode {
            HeaderMode::Preserve => root.comment().or(self.config.header.as_deref()),
            HeaderMode::Preset => self.config.header.as_deref(),
            HeaderMode::None => None,
        };
        Ok(match header {
            Some(header) => with_header(header, &body),
            None => body,
        })
    }
}

/// Reads the leading `#` comment block of a document.
///
/// The block counts as a header only when a blank line or the end of the
/// text follows it; otherwise it belongs to the first entry.
fn read_header(text: &str) -> Option<String> {
    let mut lines = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        match trimmed.strip_prefix('#') {
            Some(comment) => lines.push(comment.strip_prefix(' ').unwrap_or(comment)),
            None if trimmed.is_empty() => break,
            None => return None,
        }
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn with_header(header: &str, body: &str) -> String {
    let mut out = String::with_capacity(header.len() + body.len() + 8);
    for line in header.lines() {
        if line.is_empty() {
            out.push_str("#\n");
        } else {
            out.push_str("# ");
            out.push_str(line);
            out.push('\n');
        }
    }
    if !body.is_empty() {
        out.push('\n');
        out.push_str(body);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_header() {
        assert_eq!(
            read_header("# Generated\n# by hand\n\ntitle = 1\n"),
            Some("Generated\nby hand".to_string())
        );
        assert_eq!(read_header("#only comment"), Some("only comment".to_string()));
        assert_eq!(read_header("# attached\ntitle = 1\n"), None);
        assert_eq!(read_header("title = 1\n"), None);
        assert_eq!(read_header(""), None);
    }

    #[test]
    fn test_with_header() {
        assert_eq!(
            with_header("line one\n\nline two", "a = 1\n"),
            "# line one\n#\n# line two\n\na = 1\n"
        );
        assert_eq!(with_header("only", ""), "# only\n");
    }

    #[test]
    fn test_without_source_or_sink() {
        let loader = Loader::builder().build();
        assert!(!loader.can_load());
        assert!(!loader.can_save());
        assert!(matches!(
            loader.load(),
            Err(Error::Io {
                operation: IoOperation::Open,
                ..
            })
        ));
        let mut root = ConfigNode::new();
        root.child_mut("a").set(1);
        assert!(matches!(
            loader.save(&root),
            Err(Error::Io {
                operation: IoOperation::Open,
                ..
            })
        ));
    }

    #[test]
    fn test_closure_source_and_sink() {
        let written = Arc::new(Mutex::new(String::new()));
        let target = Arc::clone(&written);
        let loader = Loader::builder()
            .source(|| -> io::Result<Vec<u8>> { Ok(b"answer = 42\n".to_vec()) })
            .sink(move |bytes: &[u8]| -> io::Result<()> {
                *target.lock().unwrap() = String::from_utf8_lossy(bytes).into_owned();
                Ok(())
            })
            .build();

        let root = loader.load().unwrap();
        assert_eq!(root.child("answer").unwrap().as_i64(), Some(42));
        loader.save(&root).unwrap();
        assert_eq!(written.lock().unwrap().trim(), "answer = 42");
    }

    #[test]
    fn test_source_errors_name_the_operation() {
        let loader = Loader::builder()
            .source(|| -> io::Result<Vec<u8>> {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
            })
            .build();
        match loader.load().unwrap_err() {
            Error::Io { operation, message } => {
                assert_eq!(operation, IoOperation::Open);
                assert!(message.contains("denied"));
            }
            other => panic!("expected an IO error, got {:?}", other),
        }
    }

    #[test]
    fn test_sink_errors_name_the_operation() {
        let loader = Loader::builder()
            .sink(|_: &[u8]| -> io::Result<()> {
                Err(io::Error::new(io::ErrorKind::Other, "disk full"))
            })
            .build();
        let mut root = ConfigNode::new();
        root.child_mut("a").set(1);
        assert!(matches!(
            loader.save(&root),
            Err(Error::Io {
                operation: IoOperation::Close,
                ..
            })
        ));
    }

    #[test]
    fn test_config_settings() {
        let loader = Loader::builder()
            .integer_overflow(IntegerOverflow::Saturate)
            .build();
        let settings = loader.config().settings();
        assert_eq!(settings.integer_overflow, IntegerOverflow::Saturate);
        assert_eq!(settings.zone_offset.local_minus_utc(), 0);
    }
}
