//! Format registry for extension-based reading and writing
//!
//! Each supported format is a [`MeshCodec`] trait object. The registry maps
//! file extensions to codecs so callers can load and save without naming
//! the format.

use std::collections::HashMap;
use std::path::Path;

use meshcraft_core::Mesh;

use crate::error::{IoError, IoResult};
use crate::obj::{load_obj, save_obj, ObjWriteOptions};
use crate::stl::{load_stl, save_stl, StlMode, StlWriteOptions};

/// Mesh file formats known to this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshFormat {
    Stl,
    Obj,
}

impl MeshFormat {
    /// Detect format from a file extension, case-insensitively
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "stl" => Some(MeshFormat::Stl),
            "obj" => Some(MeshFormat::Obj),
            _ => None,
        }
    }

    /// Canonical file extension
    pub fn extension(self) -> &'static str {
        match self {
            MeshFormat::Stl => "stl",
            MeshFormat::Obj => "obj",
        }
    }
}

/// Reader and writer for one mesh format
pub trait MeshCodec: Send + Sync {
    fn format(&self) -> MeshFormat;

    /// Lower-case extensions this codec handles
    fn extensions(&self) -> &[&'static str];

    fn read_mesh(&self, path: &Path) -> IoResult<Mesh>;

    fn write_mesh(&self, mesh: &Mesh, path: &Path) -> IoResult<()>;
}

/// STL codec with fixed read mode and write options
#[derive(Debug, Clone, Default)]
pub struct StlCodec {
    pub read_mode: StlMode,
    pub write_options: StlWriteOptions,
}

impl MeshCodec for StlCodec {
    fn format(&self) -> MeshFormat {
        MeshFormat::Stl
    }

    fn extensions(&self) -> &[&'static str] {
        &["stl"]
    }

    fn read_mesh(&self, path: &Path) -> IoResult<Mesh> {
        load_stl(path, self.read_mode)
    }

    fn write_mesh(&self, mesh: &Mesh, path: &Path) -> IoResult<()> {
        save_stl(mesh, path, &self.write_options)
    }
}

/// OBJ codec with fixed write options
#[derive(Debug, Clone, Default)]
pub struct ObjCodec {
    pub write_options: ObjWriteOptions,
}

impl MeshCodec for ObjCodec {
    fn format(&self) -> MeshFormat {
        MeshFormat::Obj
    }

    fn extensions(&self) -> &[&'static str] {
        &["obj"]
    }

    fn read_mesh(&self, path: &Path) -> IoResult<Mesh> {
        load_obj(path)
    }

    fn write_mesh(&self, mesh: &Mesh, path: &Path) -> IoResult<()> {
        save_obj(mesh, path, &self.write_options)
    }
}

/// Registry of codecs keyed by format and extension
pub struct IoRegistry {
    codecs: HashMap<MeshFormat, Box<dyn MeshCodec>>,
    extensions: HashMap<String, MeshFormat>,
}

impl IoRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            codecs: HashMap::new(),
            extensions: HashMap::new(),
        }
    }

    /// Register a codec, replacing any codec for the same format
    pub fn register(&mut self, codec: Box<dyn MeshCodec>) {
        let format = codec.format();
        self.extensions.retain(|_, f| *f != format);
        for ext in codec.extensions() {
            self.extensions.insert(ext.to_ascii_lowercase(), format);
        }
        self.codecs.insert(format, codec);
    }

    pub fn codec(&self, format: MeshFormat) -> Option<&dyn MeshCodec> {
        self.codecs.get(&format).map(|c| c.as_ref())
    }

    /// Codec handling the extension of `path`
    pub fn codec_for_path(&self, path: &Path) -> IoResult<&dyn MeshCodec> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        self.extensions
            .get(&extension)
            .and_then(|format| self.codec(*format))
            .ok_or(IoError::UnknownFormat { extension })
    }

    pub fn read_mesh(&self, path: &Path) -> IoResult<Mesh> {
        self.codec_for_path(path)?.read_mesh(path)
    }

    pub fn write_mesh(&self, mesh: &Mesh, path: &Path) -> IoResult<()> {
        self.codec_for_path(path)?.write_mesh(mesh, path)
    }

    /// Registered extensions, sorted
    pub fn supported_extensions(&self) -> Vec<String> {
        let mut exts: Vec<String> = self.extensions.keys().cloned().collect();
        exts.sort();
        exts
    }
}

impl Default for IoRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(StlCodec::default()));
        registry.register(Box::new(ObjCodec::default()));
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, NaiveDateTime, TimeDelta};
    use meshcraft_core::{Triangle, Vector3f};
    use std::thread::sleep;
    use std::time::Duration;
    use tempfile::tempdir;

    struct UpperStl;

    impl MeshCodec for UpperStl {
        fn format(&self) -> MeshFormat {
            MeshFormat::Stl
        }

        fn extensions(&self) -> &[&'static str] {
            &["STLA"]
        }

        fn read_mesh(&self, _path: &Path) -> IoResult<Mesh> {
            Ok(Mesh::new())
        }

        fn write_mesh(&self, _mesh: &Mesh, _path: &Path) -> IoResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(MeshFormat::from_path("a/b/part.STL"), Some(MeshFormat::Stl));
        assert_eq!(MeshFormat::from_path("part.obj"), Some(MeshFormat::Obj));
        assert_eq!(MeshFormat::from_path("part.ply"), None);
        assert_eq!(MeshFormat::from_path("noext"), None);
        assert_eq!(MeshFormat::Obj.extension(), "obj");
    }

    #[test]
    fn test_default_registry() {
        let registry = IoRegistry::default();
        assert_eq!(registry.supported_extensions(), vec!["obj", "stl"]);
        assert_eq!(
            registry.codec(MeshFormat::Stl).map(|c| c.format()),
            Some(MeshFormat::Stl)
        );
        let codec = registry.codec_for_path(Path::new("x.Obj")).unwrap();
        assert_eq!(codec.format(), MeshFormat::Obj);
    }

    #[test]
    fn test_unknown_extension() {
        let registry = IoRegistry::default();
        match registry.read_mesh(Path::new("cloud.ply")) {
            Err(IoError::UnknownFormat { extension }) => assert_eq!(extension, "ply"),
            other => panic!("unexpected result {other:?}"),
        }
        assert!(matches!(
            IoRegistry::new().codec_for_path(Path::new("a.stl")),
            Err(IoError::UnknownFormat { .. })
        ));
    }

    #[test]
    fn test_register_replaces_codec() {
        let mut registry = IoRegistry::default();
        registry.register(Box::new(UpperStl));
        assert_eq!(registry.supported_extensions(), vec!["obj", "stla"]);
        assert!(registry.codec_for_path(Path::new("a.stl")).is_err());
        assert!(registry.read_mesh(Path::new("a.stla")).unwrap().is_empty());
    }

    #[test]
    fn test_dispatch_by_extension() {
        let dir = tempdir().unwrap();
        let mut mesh = Mesh::new();
        mesh.push_triangle(
            Triangle::from_coords([[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]]),
            Vector3f::zeros(),
            0,
        );

        let registry = IoRegistry::default();
        for name in ["tri.stl", "tri.obj"] {
            let path = dir.path().join(name);
            registry.write_mesh(&mesh, &path).unwrap();
            let back = registry.read_mesh(&path).unwrap();
            assert_eq!(back.triangles(), mesh.triangles());
            assert_eq!(back.normals()[0], Vector3f::new(0.0, 0.0, 1.0));
        }
    }

    #[test]
    fn test_long_lived_registry_stamps_each_write() {
        assert!(StlCodec::default().write_options.stamp.is_none());
        assert!(ObjCodec::default().write_options.stamp.is_none());

        let dir = tempdir().unwrap();
        let mut mesh = Mesh::new();
        mesh.push_triangle(
            Triangle::from_coords([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
            Vector3f::zeros(),
            0,
        );

        let created = Local::now().naive_local();
        let registry = IoRegistry::default();
        sleep(Duration::from_millis(50));

        let path = dir.path().join("late.stl");
        registry.write_mesh(&mesh, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        let header = String::from_utf8_lossy(&bytes[..80]).into_owned();
        let words: Vec<&str> = header.split_whitespace().collect();
        let written = format!("{} {}", words[2], words[3]);
        let written = NaiveDateTime::parse_from_str(&written, "%Y-%m-%d %H:%M:%S%.f").unwrap();
        assert!(written >= created + TimeDelta::milliseconds(40), "{header}");
    }
}
