//! Random-access storage for atom rewriting.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

/// Random-access byte storage underneath the rewriter.
///
/// One storage value wraps one exclusively-owned handle; no other writer may
/// touch the same bytes while a rewrite is in flight.
pub trait Storage {
    /// Current total length in bytes.
    fn len(&mut self) -> io::Result<u64>;

    /// Fill `buf` from the given offset.
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()>;

    /// Write all of `data` at the given offset, extending the storage if it
    /// ends past the current length.
    fn write_all_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()>;

    /// Truncate (or zero-extend) to exactly `len` bytes.
    fn set_len(&mut self, len: u64) -> io::Result<()>;
}

impl Storage for File {
    fn len(&mut self) -> io::Result<u64> {
        self.seek(SeekFrom::End(0))
    }

    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.read_exact(buf)
    }

    fn write_all_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.write_all(data)
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }
}

/// In-memory storage, used by tests and by callers assembling a file before
/// writing it out.
impl Storage for Cursor<Vec<u8>> {
    fn len(&mut self) -> io::Result<u64> {
        Ok(self.get_ref().len() as u64)
    }

    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let bytes = self.get_ref();
        let start = offset as usize;
        let end = start
            .checked_add(buf.len())
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        if end > bytes.len() {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
        }
        buf.copy_from_slice(&bytes[start..end]);
        Ok(())
    }

    fn write_all_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()> {
        let bytes = self.get_mut();
        let start = offset as usize;
        let end = start + data.len();
        if end > bytes.len() {
            bytes.resize(end, 0);
        }
        bytes[start..end].copy_from_slice(data);
        Ok(())
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        self.get_mut().resize(len as usize, 0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_storage_roundtrip() {
        let mut storage = Cursor::new(vec![0u8; 8]);
        storage.write_all_at(4, &[1, 2, 3, 4]).unwrap();
        let mut buf = [0u8; 4];
        storage.read_exact_at(4, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(Storage::len(&mut storage).unwrap(), 8);
    }

    #[test]
    fn test_cursor_storage_extends_on_write() {
        let mut storage = Cursor::new(vec![0u8; 4]);
        storage.write_all_at(10, &[9]).unwrap();
        assert_eq!(Storage::len(&mut storage).unwrap(), 11);
        // the gap is zero-filled
        let mut buf = [0xFFu8; 6];
        storage.read_exact_at(4, &mut buf).unwrap();
        assert_eq!(buf, [0; 6]);
    }

    #[test]
    fn test_cursor_storage_truncate() {
        let mut storage = Cursor::new(vec![7u8; 16]);
        storage.set_len(4).unwrap();
        assert_eq!(Storage::len(&mut storage).unwrap(), 4);
        let mut buf = [0u8; 4];
        assert!(storage.read_exact_at(2, &mut buf).is_err());
    }

    #[test]
    fn test_file_storage() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(&[0u8; 16]).unwrap();
        Storage::write_all_at(&mut file, 8, &[5, 6, 7]).unwrap();
        let mut buf = [0u8; 3];
        Storage::read_exact_at(&mut file, 8, &mut buf).unwrap();
        assert_eq!(buf, [5, 6, 7]);
        Storage::set_len(&mut file, 8).unwrap();
        assert_eq!(Storage::len(&mut file).unwrap(), 8);
    }
}
