//! ASCII STL reading and writing
//!
//! The reader never slurps the input. Lines are cut from a byte buffer that
//! starts out holding the peeked header and is refilled from the underlying
//! reader in fixed-size chunks. A line may straddle any number of chunks.

use std::io::{ErrorKind, Read, Write};

use meshcraft_core::{Mesh, StlEncoding, Vector3f};

use super::binary::FacetRecord;
use crate::error::{IoError, IoResult};

/// Default refill chunk size in bytes.
pub const CHUNK_SIZE: usize = 4096;

/// Longest line accepted before the input is treated as not ASCII.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// How much of the stream the line source has consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookaheadState {
    /// Only the peeked header bytes have been examined.
    InHeaderLookahead,
    /// At least one chunk beyond the header has been pulled in.
    Streaming,
}

impl LookaheadState {
    /// A failure in this state still lets a binary reader start from the header.
    pub fn is_recoverable(self) -> bool {
        self == LookaheadState::InHeaderLookahead
    }
}

/// Chunked line splitter over a reader, seeded with already consumed bytes.
pub struct LineSource<R> {
    reader: R,
    buffer: Vec<u8>,
    pos: usize,
    state: LookaheadState,
    chunk_size: usize,
    line_number: usize,
}

impl<R: Read> LineSource<R> {
    pub fn new(header: &[u8], reader: R) -> Self {
        Self::with_chunk_size(header, reader, CHUNK_SIZE)
    }

    pub fn with_chunk_size(header: &[u8], reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buffer: header.to_vec(),
            pos: 0,
            state: LookaheadState::InHeaderLookahead,
            chunk_size: chunk_size.max(1),
            line_number: 0,
        }
    }

    pub fn state(&self) -> LookaheadState {
        self.state
    }

    /// Number of the last line handed out, starting at 1.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Bytes pulled from the reader but not yet handed out as lines.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.pos
    }

    /// Whether the unread part of the buffer holds a line break.
    pub fn buffered_line_break(&self) -> bool {
        self.buffer[self.pos..].contains(&b'\n')
    }

    /// Next line without its terminator, or `None` at end of input.
    ///
    /// A trailing `\r` is removed and invalid UTF-8 is replaced.
    pub fn next_line(&mut self) -> IoResult<Option<String>> {
        let mut line = Vec::new();
        loop {
            let rest = &self.buffer[self.pos..];
            if let Some(end) = rest.iter().position(|&b| b == b'\n') {
                line.extend_from_slice(&rest[..end]);
                self.pos += end + 1;
                return Ok(Some(self.finish_line(line)));
            }

            line.extend_from_slice(rest);
            self.pos = self.buffer.len();
            if line.len() > MAX_LINE_LENGTH {
                return Err(self.error_at(
                    self.line_number + 1,
                    format!("line longer than {MAX_LINE_LENGTH} bytes"),
                ));
            }
            if !self.refill()? {
                if line.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.finish_line(line)));
            }
        }
    }

    /// Grammar error at the current line, flagged recoverable while still
    /// inside the header lookahead.
    pub fn error(&self, message: impl Into<String>) -> IoError {
        self.error_at(self.line_number, message)
    }

    fn error_at(&self, line: usize, message: impl Into<String>) -> IoError {
        IoError::AsciiParse {
            line,
            message: message.into(),
            recoverable: self.state.is_recoverable(),
        }
    }

    fn refill(&mut self) -> IoResult<bool> {
        self.state = LookaheadState::Streaming;
        self.buffer.resize(self.chunk_size, 0);
        let read = loop {
            match self.reader.read(&mut self.buffer) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        self.buffer.truncate(read);
        self.pos = 0;
        Ok(read > 0)
    }

    fn finish_line(&mut self, mut line: Vec<u8>) -> String {
        self.line_number += 1;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        String::from_utf8_lossy(&line).into_owned()
    }
}

enum Step<T> {
    Item(T),
    EndSolid,
}

/// Streaming parser for one `solid ... endsolid` block.
///
/// Yields one [`FacetRecord`] per facet. An `endsolid` line wherever a facet
/// keyword is expected ends the solid, dropping any partial facet.
pub struct AsciiFacets<R> {
    source: LineSource<R>,
    name: String,
    done: bool,
}

impl<R: Read> AsciiFacets<R> {
    /// Parse the `solid` line.
    ///
    /// With `require_header_line` set, a header lookahead holding no line
    /// break at all is rejected before anything else is read. Binary files
    /// whose header happens to start with "solid" fail here, recoverably.
    pub fn open(mut source: LineSource<R>, require_header_line: bool) -> IoResult<Self> {
        if require_header_line
            && source.state().is_recoverable()
            && !source.buffered_line_break()
        {
            return Err(source.error_at(1, "no line break in header"));
        }

        let first = loop {
            match source.next_line()? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => break line,
                None => return Err(source.error("empty input")),
            }
        };

        let first = first.trim();
        if !first.to_ascii_lowercase().starts_with("solid") {
            return Err(source.error(format!("{first:?} should start with \"solid\"")));
        }
        let name = first["solid".len()..].trim().to_string();

        Ok(Self {
            source,
            name,
            done: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bytes read past the end of the solid that a seekable caller should
    /// step back over.
    pub fn remaining(&self) -> usize {
        self.source.remaining()
    }

    /// Next non-blank line, lower-cased.
    fn next_words(&mut self) -> IoResult<String> {
        loop {
            match self.source.next_line()? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => return Ok(line.trim().to_ascii_lowercase()),
                None => {
                    return Err(self
                        .source
                        .error("unexpected end of input before \"endsolid\""))
                }
            }
        }
    }

    /// Match `keyword` at the start of the next line and return the tokens
    /// that follow it.
    fn expect(&mut self, keyword: &str) -> IoResult<Step<Vec<String>>> {
        let line = self.next_words()?;
        if line.starts_with("endsolid") {
            return Ok(Step::EndSolid);
        }

        let mut tokens = line.split_whitespace();
        for word in keyword.split_whitespace() {
            if tokens.next() != Some(word) {
                return Err(self
                    .source
                    .error(format!("{line:?} should start with {keyword:?}")));
            }
        }
        Ok(Step::Item(tokens.map(str::to_string).collect()))
    }

    fn expect_vector(&mut self, keyword: &str) -> IoResult<Step<[f32; 3]>> {
        let tokens = match self.expect(keyword)? {
            Step::Item(tokens) => tokens,
            Step::EndSolid => return Ok(Step::EndSolid),
        };

        let values: Vec<f32> = tokens
            .iter()
            .map(|t| t.parse::<f32>())
            .collect::<Result<_, _>>()
            .map_err(|_| self.source.error(format!("incorrect value {:?}", tokens.join(" "))))?;

        match values[..] {
            [x, y, z] => Ok(Step::Item([x, y, z])),
            _ => Err(self.source.error(format!(
                "expected 3 values after {keyword:?}, got {}",
                values.len()
            ))),
        }
    }

    fn read_facet(&mut self) -> IoResult<Step<FacetRecord>> {
        macro_rules! step {
            ($e:expr) => {
                match $e? {
                    Step::Item(item) => item,
                    Step::EndSolid => return Ok(Step::EndSolid),
                }
            };
        }

        let normal = step!(self.expect_vector("facet normal"));
        step!(self.expect("outer loop"));
        let mut vertices = [[0f32; 3]; 3];
        for vertex in vertices.iter_mut() {
            *vertex = step!(self.expect_vector("vertex"));
        }
        step!(self.expect("endloop"));
        step!(self.expect("endfacet"));

        Ok(Step::Item(FacetRecord::new(normal, vertices, 0)))
    }
}

impl<R: Read> Iterator for AsciiFacets<R> {
    type Item = IoResult<FacetRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_facet() {
            Ok(Step::Item(record)) => Some(Ok(record)),
            Ok(Step::EndSolid) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Read one ASCII solid. Returns the mesh and the number of buffered bytes
/// beyond its `endsolid` line.
pub fn read_ascii<R: Read>(
    header: &[u8],
    reader: R,
    require_header_line: bool,
) -> IoResult<(Mesh, usize)> {
    read_ascii_chunked(header, reader, require_header_line, CHUNK_SIZE)
}

pub(crate) fn read_ascii_chunked<R: Read>(
    header: &[u8],
    reader: R,
    require_header_line: bool,
    chunk_size: usize,
) -> IoResult<(Mesh, usize)> {
    let source = LineSource::with_chunk_size(header, reader, chunk_size);
    let mut facets = AsciiFacets::open(source, require_header_line)?;

    let mut mesh = Mesh::with_capacity(facets.name(), StlEncoding::Ascii, 0);
    for record in facets.by_ref() {
        let record = record?;
        mesh.push_triangle(record.triangle(), record.normal_vector(), 0);
    }

    Ok((mesh, facets.remaining()))
}

/// Write `mesh` as ASCII STL with the given facet normals
pub fn write_ascii<W: Write>(
    mesh: &Mesh,
    normals: &[Vector3f],
    writer: &mut W,
    name: &str,
) -> IoResult<()> {
    writeln!(writer, "solid {name}")?;
    for (triangle, normal) in mesh.triangles().iter().zip(normals) {
        writeln!(
            writer,
            "  facet normal {:.6} {:.6} {:.6}",
            normal.x, normal.y, normal.z
        )?;
        writeln!(writer, "    outer loop")?;
        for v in triangle.vertices() {
            writeln!(writer, "      vertex {:.6} {:.6} {:.6}", v.x, v.y, v.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid {name}")?;
    Ok(())
}
