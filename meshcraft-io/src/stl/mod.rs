//! STL reading and writing
//!
//! Both encodings are supported. In [`StlMode::Auto`] the first 80 bytes
//! decide: a header starting with `solid` is tried as ASCII first, anything
//! else goes straight to the binary reader. Since binary headers are free
//! text, an ASCII failure falls back to binary parsing of the same bytes.

pub mod ascii;
pub mod binary;

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use meshcraft_core::{Mesh, StlEncoding};
use tracing::{debug, trace, warn};

use crate::error::{IoError, IoResult};
use crate::stamp::Stamp;

pub use ascii::{AsciiFacets, LineSource, LookaheadState};
pub use binary::{FacetRecord, HEADER_SIZE, MAX_COUNT};

/// Which STL encoding to read or write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StlMode {
    /// Detect on read, keep the mesh's own encoding on write
    #[default]
    Auto,
    Ascii,
    Binary,
}

impl From<StlEncoding> for StlMode {
    fn from(encoding: StlEncoding) -> Self {
        match encoding {
            StlEncoding::Ascii => StlMode::Ascii,
            StlEncoding::Binary => StlMode::Binary,
        }
    }
}

/// Options for STL writing
#[derive(Debug, Clone)]
pub struct StlWriteOptions {
    pub mode: StlMode,
    /// Recompute facet normals from the vertices before writing
    pub update_normals: bool,
    /// Producer and time written into the binary header, taken at write
    /// time when unset
    pub stamp: Option<Stamp>,
}

impl Default for StlWriteOptions {
    fn default() -> Self {
        Self {
            mode: StlMode::Auto,
            update_normals: true,
            stamp: None,
        }
    }
}

impl StlWriteOptions {
    /// Binary output with recomputed normals
    pub fn binary() -> Self {
        Self::default().with_mode(StlMode::Binary)
    }

    /// ASCII output with recomputed normals
    pub fn ascii() -> Self {
        Self::default().with_mode(StlMode::Ascii)
    }

    pub fn with_mode(mut self, mode: StlMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_update_normals(mut self, update_normals: bool) -> Self {
        self.update_normals = update_normals;
        self
    }

    pub fn with_stamp(mut self, stamp: Stamp) -> Self {
        self.stamp = Some(stamp);
        self
    }
}

/// Input the STL reader can optionally reposition.
trait Input: Read {
    /// Step back `bytes` that were read past the end of a solid.
    /// Returns `false` when the input cannot move backwards.
    fn unread(&mut self, bytes: usize) -> IoResult<bool>;

    /// Move to just after a header of `header_len` bytes.
    /// Returns `false` when the input cannot move backwards.
    fn restart_after_header(&mut self, header_len: usize) -> IoResult<bool>;

    fn can_restart(&self) -> bool;
}

struct SeekableInput<'a, R> {
    inner: &'a mut R,
    start: u64,
}

impl<'a, R: Read + Seek> SeekableInput<'a, R> {
    fn new(inner: &'a mut R) -> IoResult<Self> {
        let start = inner.stream_position()?;
        Ok(Self { inner, start })
    }

    /// Treat the current position as the start of the next solid.
    fn mark(&mut self) -> IoResult<()> {
        self.start = self.inner.stream_position()?;
        Ok(())
    }

    /// Step over whitespace. Returns `false` at end of input.
    fn skip_whitespace(&mut self) -> IoResult<bool> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(false),
                Ok(_) if byte[0].is_ascii_whitespace() => continue,
                Ok(_) => {
                    self.inner.seek(SeekFrom::Current(-1))?;
                    return Ok(true);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl<R: Read> Read for SeekableInput<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read + Seek> Input for SeekableInput<'_, R> {
    fn unread(&mut self, bytes: usize) -> IoResult<bool> {
        trace!(bytes, "rewinding past end of solid");
        self.inner.seek(SeekFrom::Current(-(bytes as i64)))?;
        Ok(true)
    }

    fn restart_after_header(&mut self, header_len: usize) -> IoResult<bool> {
        self.inner
            .seek(SeekFrom::Start(self.start + header_len as u64))?;
        Ok(true)
    }

    fn can_restart(&self) -> bool {
        true
    }
}

struct StreamInput<'a, R> {
    inner: &'a mut R,
}

impl<R: Read> Read for StreamInput<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read> Input for StreamInput<'_, R> {
    fn unread(&mut self, _bytes: usize) -> IoResult<bool> {
        Ok(false)
    }

    fn restart_after_header(&mut self, _header_len: usize) -> IoResult<bool> {
        Ok(false)
    }

    fn can_restart(&self) -> bool {
        false
    }
}

/// Read up to [`HEADER_SIZE`] bytes, fewer only at end of input.
fn read_header<R: Read>(reader: &mut R) -> IoResult<Vec<u8>> {
    let mut header = Vec::with_capacity(HEADER_SIZE);
    reader.take(HEADER_SIZE as u64).read_to_end(&mut header)?;
    Ok(header)
}

fn is_blank(header: &[u8]) -> bool {
    header.iter().all(u8::is_ascii_whitespace)
}

/// Whether the header starts with `solid`, in any case.
pub fn looks_like_ascii(header: &[u8]) -> bool {
    header
        .get(..5)
        .is_some_and(|word| word.eq_ignore_ascii_case(b"solid"))
}

fn read_ascii_solid<I: Input>(header: &[u8], input: &mut I, detecting: bool) -> IoResult<Mesh> {
    let (mesh, remaining) = ascii::read_ascii(header, &mut *input, detecting)?;
    if remaining > 0 && !input.unread(remaining)? {
        debug!(remaining, "input is not seekable, dropping bytes after endsolid");
    }
    Ok(mesh)
}

fn read_solid<I: Input>(input: &mut I, mode: StlMode) -> IoResult<Mesh> {
    let header = read_header(input)?;

    match mode {
        StlMode::Binary => binary::read_binary(&header, input),
        StlMode::Ascii => read_ascii_solid(&header, input, false),
        StlMode::Auto => {
            if is_blank(&header) {
                return Err(IoError::FormatDetection {
                    ascii: "empty input".to_string(),
                    binary: "empty input".to_string(),
                });
            }
            if !looks_like_ascii(&header) {
                return binary::read_binary(&header, input);
            }

            // A seekable input can always restart, so it skips the
            // header line shortcut and accepts long solid lines.
            let require_header_line = !input.can_restart();
            let ascii_err = match read_ascii_solid(&header, input, require_header_line) {
                Ok(mesh) => return Ok(mesh),
                Err(e) => e,
            };
            let Some(recoverable) = ascii_err.ascii_recoverability() else {
                return Err(ascii_err);
            };
            if !recoverable && !input.restart_after_header(header.len())? {
                return Err(ascii_err);
            }

            warn!(error = %ascii_err, "ASCII STL parse failed, retrying as binary");
            binary::read_binary(&header, input).map_err(|binary_err| IoError::FormatDetection {
                ascii: ascii_err.to_string(),
                binary: binary_err.to_string(),
            })
        }
    }
}

/// Read one mesh from a seekable reader.
///
/// After an ASCII solid the reader is left right after its `endsolid` line.
pub fn read_stl<R: Read + Seek>(reader: &mut R, mode: StlMode) -> IoResult<Mesh> {
    let mut input = SeekableInput::new(reader)?;
    read_solid(&mut input, mode)
}

/// Read one mesh from a reader that cannot seek.
///
/// An ASCII failure falls back to binary only while it is still recoverable.
/// Bytes after an ASCII solid's `endsolid` line may be consumed.
pub fn read_stl_stream<R: Read>(reader: &mut R, mode: StlMode) -> IoResult<Mesh> {
    let mut input = StreamInput { inner: reader };
    read_solid(&mut input, mode)
}

/// Read every solid from a seekable reader.
///
/// A binary input yields a single mesh. ASCII solids are read one after the
/// other until only whitespace remains.
pub fn read_stl_solids<R: Read + Seek>(reader: &mut R) -> IoResult<Vec<Mesh>> {
    let mut input = SeekableInput::new(reader)?;
    let first = read_solid(&mut input, StlMode::Auto)?;
    if first.encoding() == StlEncoding::Binary {
        return Ok(vec![first]);
    }

    let mut solids = vec![first];
    while input.skip_whitespace()? {
        input.mark()?;
        let header = read_header(&mut input)?;
        solids.push(read_ascii_solid(&header, &mut input, false)?);
    }
    debug!(count = solids.len(), "read ASCII solids");
    Ok(solids)
}

/// Load an STL file
pub fn load_stl<P: AsRef<Path>>(path: P, mode: StlMode) -> IoResult<Mesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IoError::open(path, e))?;
    let mut reader = BufReader::new(file);
    let mesh = read_stl(&mut reader, mode)?;
    debug!(
        path = %path.display(),
        triangles = mesh.len(),
        encoding = ?mesh.encoding(),
        "loaded STL"
    );
    Ok(mesh)
}

/// Write `mesh` as STL. Normals are recomputed into the output when
/// `options.update_normals` is set; the mesh itself is not modified.
pub fn write_stl<W: Write>(
    mesh: &Mesh,
    writer: &mut W,
    name: &str,
    options: &StlWriteOptions,
) -> IoResult<()> {
    let encoding = match options.mode {
        StlMode::Auto => mesh.encoding(),
        StlMode::Ascii => StlEncoding::Ascii,
        StlMode::Binary => StlEncoding::Binary,
    };

    let normals = if options.update_normals {
        Cow::Owned(mesh.computed_normals())
    } else {
        Cow::Borrowed(mesh.normals())
    };

    match encoding {
        StlEncoding::Binary => {
            let stamp = options.stamp.clone().unwrap_or_else(Stamp::now);
            binary::write_binary(mesh, &normals, writer, name, &stamp)
        }
        StlEncoding::Ascii => ascii::write_ascii(mesh, &normals, writer, name),
    }
}

/// Save an STL file, named after the file name component of `path`
pub fn save_stl<P: AsRef<Path>>(mesh: &Mesh, path: P, options: &StlWriteOptions) -> IoResult<()> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_stl(mesh, &mut writer, &name, options)?;
    writer.flush()?;

    debug!(path = %path.display(), triangles = mesh.len(), mode = ?options.mode, "saved STL");
    Ok(())
}
