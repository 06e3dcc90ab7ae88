//! [`AttributeBackend`] implementation on top of `h5attr-format`.
//!
//! A [`H5File`] keeps the whole file visible as one byte slice, either
//! memory-mapped with `memmap2` or read into an owned buffer, together with
//! its parsed superblock. Every read walks the group hierarchy from the root;
//! nothing below the superblock is cached between calls.

use std::fs;
use std::path::{Path, PathBuf};

use h5attr_format::attribute::{self, AttributeMessage};
use h5attr_format::data_read;
use h5attr_format::dataspace::DataspaceKind;
use h5attr_format::group;
use h5attr_format::object_header::ObjectHeader;
use h5attr_format::signature;
use h5attr_format::superblock::Superblock;
use h5attr_format::FormatError;
use memmap2::Mmap;

use crate::backend::AttributeBackend;
use crate::config::StoreConfig;
use crate::error::{Error, Result};

enum FileBytes {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl FileBytes {
    fn as_bytes(&self) -> &[u8] {
        match self {
            FileBytes::Mapped(m) => &m[..],
            FileBytes::Owned(v) => &v[..],
        }
    }
}

/// An opened HDF5 file.
pub struct H5File {
    path: PathBuf,
    bytes: FileBytes,
    superblock: Superblock,
}

impl H5File {
    /// Open `path`, either mapping it or reading it fully.
    pub fn open(path: &Path, use_mmap: bool) -> Result<Self> {
        let meta = fs::metadata(path).map_err(|e| Error::io(path, e))?;
        if !meta.is_file() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let bytes = if use_mmap {
            let file = fs::File::open(path).map_err(|e| Error::io(path, e))?;
            // SAFETY: read-only mapping. Files are treated as immutable while
            // a handle is open; concurrent truncation by another process is
            // outside what this crate can guard against.
            let map = unsafe { Mmap::map(&file) }.map_err(|e| Error::io(path, e))?;
            FileBytes::Mapped(map)
        } else {
            FileBytes::Owned(fs::read(path).map_err(|e| Error::io(path, e))?)
        };
        Self::from_parts(path.to_path_buf(), bytes)
    }

    /// Wrap an in-memory image. `path` is only used for diagnostics.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Result<Self> {
        Self::from_parts(path.into(), FileBytes::Owned(bytes))
    }

    fn from_parts(path: PathBuf, bytes: FileBytes) -> Result<Self> {
        let data = bytes.as_bytes();
        let sig = signature::find_signature(data)?;
        let superblock = Superblock::parse(data, sig)?;
        if superblock.base_address as usize > data.len() {
            return Err(FormatError::UnexpectedEof {
                expected: superblock.base_address as usize,
                available: data.len(),
            }
            .into());
        }
        Ok(Self {
            path,
            bytes,
            superblock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn superblock(&self) -> &Superblock {
        &self.superblock
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self.bytes, FileBytes::Mapped(_))
    }

    /// File image starting at the base address all other addresses use.
    fn data(&self) -> &[u8] {
        &self.bytes.as_bytes()[self.superblock.base_address as usize..]
    }

    /// Find `name` on the object at `location`.
    pub fn attribute(&self, location: &str, name: &str) -> Result<AttributeMessage> {
        let sb = &self.superblock;
        let data = self.data();
        let addr = group::resolve_path(data, sb, location)?;
        let header = ObjectHeader::parse(data, addr as usize, sb.offset_size, sb.length_size)?;
        attribute::find_attribute(&header, name, sb.offset_size, sb.length_size)?.ok_or_else(
            || Error::AttributeNotFound {
                location: location.to_string(),
                name: name.to_string(),
            },
        )
    }

    /// Like [`H5File::attribute`] but requires exactly one element.
    pub fn scalar_attribute(&self, location: &str, name: &str) -> Result<AttributeMessage> {
        let attr = self.attribute(location, name)?;
        let elements = attr.dataspace.num_elements();
        if attr.dataspace.kind == DataspaceKind::Null || elements == 0 {
            return Err(Error::NoData(name.to_string()));
        }
        if elements > 1 {
            return Err(Error::NotScalar {
                name: name.to_string(),
                elements,
            });
        }
        Ok(attr)
    }

    pub fn read_int(&self, location: &str, name: &str) -> Result<i64> {
        let attr = self.scalar_attribute(location, name)?;
        Ok(data_read::read_scalar_i64(&attr)?)
    }

    pub fn read_float(&self, location: &str, name: &str) -> Result<f64> {
        let attr = self.scalar_attribute(location, name)?;
        Ok(data_read::read_scalar_f64(&attr)?)
    }

    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn read_string(&self, location: &str, name: &str) -> Result<String> {
        let attr = self.scalar_attribute(location, name)?;
        let sb = &self.superblock;
        let bytes =
            data_read::read_string_bytes(self.data(), &attr, sb.offset_size, sb.length_size)?;
        Ok(String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
    }
}

impl std::fmt::Debug for H5File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("H5File")
            .field("path", &self.path)
            .field("size", &self.bytes.as_bytes().len())
            .field("mapped", &self.is_mapped())
            .field("superblock_version", &self.superblock.version)
            .finish()
    }
}

/// Backend reading files with the in-tree format parser.
#[derive(Debug, Clone)]
pub struct NativeBackend {
    config: StoreConfig,
}

impl NativeBackend {
    /// Build a backend, checking that the data directory exists.
    pub fn initialize(config: &StoreConfig) -> Result<Self> {
        let dir = &config.data_dir;
        match fs::metadata(dir) {
            Ok(meta) if meta.is_dir() => {}
            _ => return Err(Error::DataDir(dir.clone())),
        }
        tracing::info!(
            data_dir = %dir.display(),
            use_mmap = config.use_mmap,
            "native attribute backend ready"
        );
        Ok(Self {
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Relative paths are taken inside the data directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config.data_dir.join(path)
        }
    }
}

impl AttributeBackend for NativeBackend {
    type Handle = H5File;

    fn name(&self) -> &'static str {
        "native"
    }

    fn open(&self, path: &Path) -> Result<H5File> {
        H5File::open(&self.resolve(path), self.config.use_mmap)
    }

    fn read_int(&self, handle: &H5File, location: &str, name: &str) -> Result<i64> {
        handle.read_int(location, name)
    }

    fn read_float(&self, handle: &H5File, location: &str, name: &str) -> Result<f64> {
        handle.read_float(location, name)
    }

    fn read_string(&self, handle: &H5File, location: &str, name: &str) -> Result<String> {
        handle.read_string(location, name)
    }

    fn close(&self, handle: H5File) -> Result<()> {
        drop(handle);
        Ok(())
    }

    fn supports_concurrent_handles(&self) -> bool {
        !self.config.serialize_globally
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use h5attr_format::file_writer::{AttrValue, FileWriter, GroupLayout};

    use crate::status::StatusCode;

    fn sample(layout: GroupLayout) -> Vec<u8> {
        let mut w = FileWriter::with_layout(layout);
        w.root()
            .set_attr("IonMode", AttrValue::String("positive".into()))
            .set_attr("NbrSamples", AttrValue::I32(0))
            .set_attr("Big", AttrValue::I64(1 << 40))
            .set_attr("Nothing", AttrValue::Empty)
            .set_attr("Trace", AttrValue::F64Array(vec![1.0, 2.0]));
        w.root()
            .create_group("FullSpectra")
            .set_attr("SampleInterval", AttrValue::F64(0.5));
        w.root()
            .create_dataset("Data", 1.0)
            .set_attr("Units", AttrValue::VlString("mV".into()));
        w.finish()
    }

    fn status_of<T: std::fmt::Debug>(r: Result<T>) -> StatusCode {
        r.expect_err("expected failure").status()
    }

    #[test]
    fn reads_each_kind() {
        for layout in [GroupLayout::Compact, GroupLayout::SymbolTable] {
            let f = H5File::from_bytes("mem.h5", sample(layout)).unwrap();
            assert_eq!(f.read_string("/", "IonMode").unwrap(), "positive");
            assert_eq!(f.read_int("/", "NbrSamples").unwrap(), 0);
            assert_eq!(f.read_float("/FullSpectra", "SampleInterval").unwrap(), 0.5);
            assert_eq!(f.read_string("/Data", "Units").unwrap(), "mV");
        }
    }

    #[test]
    fn lookup_failures_map_to_status() {
        let f = H5File::from_bytes("mem.h5", sample(GroupLayout::Compact)).unwrap();
        assert_eq!(status_of(f.read_int("/", "Missing")), StatusCode::InvalidParameter);
        assert_eq!(status_of(f.read_int("/Nowhere", "X")), StatusCode::InvalidParameter);
        assert_eq!(status_of(f.read_int("/Data/Deeper", "X")), StatusCode::InvalidParameter);
        assert_eq!(status_of(f.read_int("/", "IonMode")), StatusCode::InvalidValue);
        assert_eq!(status_of(f.read_string("/", "NbrSamples")), StatusCode::InvalidValue);
        assert_eq!(status_of(f.read_float("/", "Nothing")), StatusCode::NoData);
        assert_eq!(status_of(f.read_float("/", "Trace")), StatusCode::InvalidValue);
    }

    #[test]
    fn backend_reports_wide_integers_unchanged() {
        let f = H5File::from_bytes("mem.h5", sample(GroupLayout::Compact)).unwrap();
        assert_eq!(f.read_int("/", "Big").unwrap(), 1 << 40);
    }

    #[test]
    fn garbage_is_a_format_error() {
        let err = H5File::from_bytes("junk.h5", vec![0u8; 2048]).unwrap_err();
        assert!(matches!(err, Error::Format(FormatError::SignatureNotFound)));
        assert_eq!(err.status(), StatusCode::Error);
    }

    #[test]
    fn open_maps_or_buffers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.h5");
        fs::write(&path, sample(GroupLayout::Compact)).unwrap();

        let mapped = H5File::open(&path, true).unwrap();
        assert!(mapped.is_mapped());
        let owned = H5File::open(&path, false).unwrap();
        assert!(!owned.is_mapped());
        assert_eq!(
            mapped.read_string("/", "IonMode").unwrap(),
            owned.read_string("/", "IonMode").unwrap()
        );

        let missing = H5File::open(&dir.path().join("missing.h5"), true).unwrap_err();
        assert_eq!(missing.status(), StatusCode::FileNotFound);
        let directory = H5File::open(dir.path(), true).unwrap_err();
        assert_eq!(directory.status(), StatusCode::FileNotFound);
    }

    #[test]
    fn initialize_checks_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let backend = NativeBackend::initialize(&StoreConfig::with_data_dir(dir.path())).unwrap();
        assert_eq!(backend.resolve(Path::new("a.h5")), dir.path().join("a.h5"));
        assert_eq!(backend.resolve(Path::new("/abs/b.h5")), PathBuf::from("/abs/b.h5"));

        let gone = dir.path().join("gone");
        let err = NativeBackend::initialize(&StoreConfig::with_data_dir(&gone)).unwrap_err();
        assert!(matches!(err, Error::DataDir(p) if p == gone));
    }

    #[test]
    fn serialize_globally_disables_concurrency() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = StoreConfig::with_data_dir(dir.path());
        assert!(NativeBackend::initialize(&cfg).unwrap().supports_concurrent_handles());
        cfg.serialize_globally = true;
        assert!(!NativeBackend::initialize(&cfg).unwrap().supports_concurrent_handles());
    }
}
