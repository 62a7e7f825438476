//! Sequential atom scanning.

use super::{Atom, AtomType};
use crate::error::{Error, Result};
use std::io::{Read, Seek, SeekFrom};

/// Maximum payload the scanner will load into memory (64 MB), to avoid OOM
/// on malformed files.
const MAX_ATOM_DATA_SIZE: u64 = 64 * 1024 * 1024;

/// Scans the atom sequence of a movie file.
///
/// Scanning is best-effort: a truncated or corrupt tail stops the walk and
/// the atoms found so far are returned. Only payload reads report hard
/// errors.
pub struct AtomScanner<R> {
    reader: R,
    len: u64,
}

impl<R: Read + Seek> AtomScanner<R> {
    /// Create a scanner over a seekable source.
    pub fn new(mut reader: R) -> Self {
        let len = reader.seek(SeekFrom::End(0)).unwrap_or(0);
        let _ = reader.seek(SeekFrom::Start(0));
        Self { reader, len }
    }

    /// Total length of the source in bytes.
    pub fn source_len(&self) -> u64 {
        self.len
    }

    /// Scan the top-level atom sequence.
    pub fn scan(&mut self) -> Vec<Atom> {
        let len = self.len;
        self.scan_range(0, len)
    }

    /// Scan the atoms within `[start, end)`, e.g. the children of a
    /// container atom.
    pub fn scan_range(&mut self, start: u64, end: u64) -> Vec<Atom> {
        let mut atoms = Vec::new();
        let mut offset = start;

        // Fewer than 8 bytes left cannot hold a header; that is a truncated
        // tail, not a hard failure.
        while offset + 8 <= end {
            if self.reader.seek(SeekFrom::Start(offset)).is_err() {
                break;
            }

            let mut header = [0u8; 8];
            if self.reader.read_exact(&mut header).is_err() {
                #[cfg(feature = "tracing")]
                tracing::warn!(offset, "atom header read failed, stopping scan");
                break;
            }

            let size_field =
                u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as u64;
            let atom_type = AtomType::from_bytes([header[4], header[5], header[6], header[7]]);

            let (size, size_was_zero, header_size) = if size_field == 1 {
                // 64-bit extended size follows the type code
                if offset + 16 > end {
                    break;
                }
                let mut ext = [0u8; 8];
                if self.reader.read_exact(&mut ext).is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(offset, "extended size read failed, stopping scan");
                    break;
                }
                (u64::from_be_bytes(ext), false, 16u64)
            } else if size_field == 0 {
                // Atom extends to the end of the scanned range
                (end - offset, true, 8u64)
            } else {
                (size_field, false, 8u64)
            };

            if size < header_size {
                #[cfg(feature = "tracing")]
                tracing::warn!(offset, size, "atom smaller than its header, stopping scan");
                break;
            }

            atoms.push(Atom {
                atom_type,
                offset,
                size,
                size_was_zero,
                data_offset: offset + header_size,
                data_size: size - header_size,
            });

            offset += size;
        }

        atoms
    }

    /// Find the first top-level atom of the given type.
    pub fn find(&mut self, atom_type: AtomType) -> Option<Atom> {
        self.scan().into_iter().find(|a| a.atom_type == atom_type)
    }

    /// Read an atom's payload, rejecting oversized atoms.
    pub fn read_payload(&mut self, atom: &Atom) -> Result<Vec<u8>> {
        if atom.data_size > MAX_ATOM_DATA_SIZE {
            return Err(Error::invalid_atom(format!(
                "atom {} payload size {} exceeds maximum {}",
                atom.atom_type, atom.data_size, MAX_ATOM_DATA_SIZE
            )));
        }
        self.reader.seek(SeekFrom::Start(atom.data_offset))?;
        let mut data = vec![0u8; atom.data_size as usize];
        self.reader.read_exact(&mut data)?;
        Ok(data)
    }

    /// Read an atom's full bytes, header included.
    pub fn read_atom_bytes(&mut self, atom: &Atom) -> Result<Vec<u8>> {
        if atom.size > MAX_ATOM_DATA_SIZE {
            return Err(Error::invalid_atom(format!(
                "atom {} size {} exceeds maximum {}",
                atom.atom_type, atom.size, MAX_ATOM_DATA_SIZE
            )));
        }
        self.reader.seek(SeekFrom::Start(atom.offset))?;
        let mut data = vec![0u8; atom.size as usize];
        self.reader.read_exact(&mut data)?;
        Ok(data)
    }

    /// Consume the scanner and return the source.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn atom_bytes(atom_type: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&((payload.len() as u32 + 8).to_be_bytes()));
        bytes.extend_from_slice(atom_type);
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn test_scan_plain_sequence() {
        let mut file = Vec::new();
        file.extend_from_slice(&atom_bytes(b"ftyp", &[0u8; 8]));
        file.extend_from_slice(&atom_bytes(b"moov", &[0u8; 100]));
        file.extend_from_slice(&atom_bytes(b"mdat", &[0u8; 32]));

        let mut scanner = AtomScanner::new(Cursor::new(file));
        let atoms = scanner.scan();

        assert_eq!(atoms.len(), 3);
        assert_eq!(atoms[0].atom_type, AtomType::FTYP);
        assert_eq!(atoms[1].atom_type, AtomType::MOOV);
        assert_eq!(atoms[1].offset, 16);
        assert_eq!(atoms[1].size, 108);
        assert_eq!(atoms[1].data_offset, 24);
        assert_eq!(atoms[1].data_size, 100);
        assert_eq!(atoms[2].atom_type, AtomType::MDAT);
    }

    #[test]
    fn test_scan_zero_size_runs_to_end() {
        let mut file = atom_bytes(b"ftyp", &[0u8; 8]);
        let mdat_offset = file.len() as u64;
        // size field 0: runs to end of file
        file.extend_from_slice(&0u32.to_be_bytes());
        file.extend_from_slice(b"mdat");
        file.extend_from_slice(&[0xAA; 40]);
        let total = file.len() as u64;

        let mut scanner = AtomScanner::new(Cursor::new(file));
        let atoms = scanner.scan();

        assert_eq!(atoms.len(), 2);
        let mdat = &atoms[1];
        assert!(mdat.size_was_zero);
        assert_eq!(mdat.size, total - mdat_offset);
        assert_eq!(mdat.data_size, mdat.size - 8);
    }

    #[test]
    fn test_scan_extended_size() {
        let mut file = Vec::new();
        file.extend_from_slice(&1u32.to_be_bytes());
        file.extend_from_slice(b"mdat");
        file.extend_from_slice(&(16u64 + 24).to_be_bytes());
        file.extend_from_slice(&[0x55; 24]);

        let mut scanner = AtomScanner::new(Cursor::new(file));
        let atoms = scanner.scan();

        assert_eq!(atoms.len(), 1);
        assert_eq!(atoms[0].size, 40);
        assert!(!atoms[0].size_was_zero);
        assert_eq!(atoms[0].header_size(), 16);
        assert_eq!(atoms[0].data_size, 40 - 16);
    }

    #[test]
    fn test_scan_truncated_tail_returns_partial() {
        let mut file = atom_bytes(b"ftyp", &[0u8; 8]);
        file.extend_from_slice(&atom_bytes(b"free", &[0u8; 4]));
        // 5 stray bytes: not enough for another header
        file.extend_from_slice(&[1, 2, 3, 4, 5]);

        let mut scanner = AtomScanner::new(Cursor::new(file));
        let atoms = scanner.scan();
        assert_eq!(atoms.len(), 2);
    }

    #[test]
    fn test_scan_corrupt_size_stops() {
        let mut file = atom_bytes(b"ftyp", &[0u8; 8]);
        // size 4 is smaller than a header
        file.extend_from_slice(&4u32.to_be_bytes());
        file.extend_from_slice(b"junk");
        file.extend_from_slice(&[0u8; 64]);

        let mut scanner = AtomScanner::new(Cursor::new(file));
        let atoms = scanner.scan();
        assert_eq!(atoms.len(), 1);
        assert_eq!(atoms[0].atom_type, AtomType::FTYP);
    }

    #[test]
    fn test_roundtrip_copy_reproduces_source() {
        let mut file = Vec::new();
        file.extend_from_slice(&atom_bytes(b"ftyp", &[7u8; 12]));
        file.extend_from_slice(&atom_bytes(b"moov", &[9u8; 60]));
        file.extend_from_slice(&atom_bytes(b"mdat", &[3u8; 25]));

        let mut scanner = AtomScanner::new(Cursor::new(file.clone()));
        let atoms = scanner.scan();
        let mut copy = Vec::new();
        for atom in &atoms {
            copy.extend_from_slice(&scanner.read_atom_bytes(atom).unwrap());
        }
        assert_eq!(copy, file);
    }

    #[test]
    fn test_find_by_type() {
        let mut file = atom_bytes(b"ftyp", &[0u8; 8]);
        file.extend_from_slice(&atom_bytes(b"moov", &[0u8; 16]));

        let mut scanner = AtomScanner::new(Cursor::new(file));
        assert!(scanner.find(AtomType::MOOV).is_some());
        assert!(scanner.find(AtomType::MDAT).is_none());
    }

    #[test]
    fn test_read_payload() {
        let file = atom_bytes(b"free", &[0xAB; 10]);
        let mut scanner = AtomScanner::new(Cursor::new(file));
        let atoms = scanner.scan();
        let payload = scanner.read_payload(&atoms[0]).unwrap();
        assert_eq!(payload, vec![0xAB; 10]);
    }

    #[test]
    fn test_scan_range_children() {
        // parent atom holding two children
        let child_a = atom_bytes(b"mvhd", &[0u8; 20]);
        let child_b = atom_bytes(b"trak", &[0u8; 12]);
        let mut payload = Vec::new();
        payload.extend_from_slice(&child_a);
        payload.extend_from_slice(&child_b);
        let file = atom_bytes(b"moov", &payload);

        let mut scanner = AtomScanner::new(Cursor::new(file));
        let atoms = scanner.scan();
        assert_eq!(atoms.len(), 1);
        let moov = &atoms[0];
        let children = scanner.scan_range(moov.data_offset, moov.end());
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].atom_type, AtomType::MVHD);
        assert_eq!(children[1].atom_type, AtomType::TRAK);
    }
}
