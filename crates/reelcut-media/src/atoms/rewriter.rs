//! In-place replacement of a top-level atom.

use super::{Atom, AtomScanner, AtomType, Storage};
use crate::error::{Error, Result};
use bytes::{BufMut, BytesMut};
use std::io::{Read, Seek};

/// Replaces one uniquely-typed top-level atom with new bytes of a possibly
/// different size, leaving every other atom readable.
///
/// The replacement bytes are a complete serialized atom, header included.
/// Multi-step sequences are ordered so that a failure partway leaves the
/// file scannable: the trailing implicit size is patched before the old
/// target is renamed, and the rename happens before the replacement is
/// appended.
pub struct AtomRewriter<S> {
    storage: S,
}

impl<S: Storage + Read + Seek> AtomRewriter<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Consume the rewriter and return the storage.
    pub fn into_inner(self) -> S {
        self.storage
    }

    /// Replace the first top-level atom of type `target` with `new_atom`.
    pub fn replace(&mut self, target: AtomType, new_atom: &[u8]) -> Result<()> {
        validate_replacement(new_atom)?;

        let atoms = AtomScanner::new(&mut self.storage).scan();
        let index = atoms
            .iter()
            .position(|a| a.atom_type == target)
            .ok_or(Error::AtomNotFound(target))?;
        let new_size = new_atom.len() as u64;

        if index == atoms.len() - 1 {
            // The target is the last atom: overwrite in place. Smaller means
            // the file shrinks; larger just grows past the old end.
            let atom = &atoms[index];
            self.storage.write_all_at(atom.offset, new_atom)?;
            if new_size < atom.size {
                self.storage.set_len(atom.offset + new_size)?;
            }
            return Ok(());
        }

        if new_size <= atoms[index].size {
            self.replace_in_place(&atoms[index], new_atom)
        } else {
            self.relocate_to_end(&atoms, index, new_atom)
        }
    }

    /// The replacement fits in the old allocation; cover whatever is left
    /// with padding.
    fn replace_in_place(&mut self, atom: &Atom, new_atom: &[u8]) -> Result<()> {
        let new_size = new_atom.len() as u64;
        let leftover = atom.size - new_size;

        if leftover > 0 && leftover < 8 {
            // Too small to be a padding atom: the replacement itself grows
            // by the remainder. Reject the (pathological) case where the
            // grown size no longer fits the 32-bit size field.
            let padded = new_size + leftover;
            let extended = u32::from_be_bytes([new_atom[0], new_atom[1], new_atom[2], new_atom[3]])
                == 1;
            if !extended && padded > u32::MAX as u64 {
                return Err(Error::SizeOverflow {
                    atom: atom.atom_type,
                    size: padded,
                });
            }
            self.storage.write_all_at(atom.offset, new_atom)?;
            if extended {
                self.storage
                    .write_all_at(atom.offset + 8, &padded.to_be_bytes())?;
            } else {
                self.storage
                    .write_all_at(atom.offset, &(padded as u32).to_be_bytes())?;
            }
            // zero the slack so no stale bytes linger
            let zeros = [0u8; 7];
            self.storage
                .write_all_at(atom.offset + new_size, &zeros[..leftover as usize])?;
            return Ok(());
        }

        self.storage.write_all_at(atom.offset, new_atom)?;
        if leftover >= 8 {
            #[cfg(feature = "tracing")]
            tracing::debug!(leftover, "covering remainder with a free atom");
            self.write_free_atom(atom.offset + new_size, leftover)?;
        }
        Ok(())
    }

    /// The replacement is bigger than the old allocation and the target is
    /// not last, so it cannot be resized in place: hide the old atom and
    /// append the replacement at end of file.
    fn relocate_to_end(&mut self, atoms: &[Atom], index: usize, new_atom: &[u8]) -> Result<()> {
        let target = &atoms[index];
        let last = &atoms[atoms.len() - 1];

        // The last atom's implicit to-EOF size becomes wrong the moment new
        // data is appended after it; make it explicit first.
        if last.size_was_zero {
            if last.size <= u32::MAX as u64 {
                self.storage
                    .write_all_at(last.offset, &(last.size as u32).to_be_bytes())?;
            } else {
                // Needs a 16-byte header. The only place for it is a `wide`
                // placeholder directly in front of the atom; absorbing it
                // moves the header back by the placeholder's own bytes.
                let prev = &atoms[atoms.len() - 2];
                if prev.atom_type != AtomType::WIDE {
                    return Err(Error::SizeOverflow {
                        atom: last.atom_type,
                        size: last.size,
                    });
                }
                let mut header = BytesMut::with_capacity(16);
                header.put_u32(1);
                header.put_slice(&last.atom_type.0);
                header.put_u64(last.size + prev.size);
                self.storage.write_all_at(prev.offset, &header)?;
            }
            #[cfg(feature = "tracing")]
            tracing::debug!(atom = %last.atom_type, "patched implicit trailing size");
        }

        // Hide the old target so readers skip it, then append the
        // replacement.
        self.storage
            .write_all_at(target.offset + 4, &target.atom_type.hidden().0)?;
        #[cfg(feature = "tracing")]
        tracing::info!(
            atom = %target.atom_type,
            "renamed undersized atom and appending replacement at end of file"
        );
        let end = self.storage.len()?;
        self.storage.write_all_at(end, new_atom)?;
        Ok(())
    }

    /// Write a `free` padding atom covering `size` bytes at `offset`.
    fn write_free_atom(&mut self, offset: u64, size: u64) -> Result<()> {
        let mut header = BytesMut::with_capacity(16);
        if size > u32::MAX as u64 {
            header.put_u32(1);
            header.put_slice(&AtomType::FREE.0);
            header.put_u64(size);
            self.storage.write_all_at(offset, &header)?;
            // Zeroing gigabytes of slack is pointless; leave a note for
            // anyone hexdumping the file instead.
            let note: &[u8] = b"free space left over from a header rewrite; contents are meaningless";
            if size - 16 >= note.len() as u64 {
                self.storage.write_all_at(offset + 16, note)?;
            }
        } else {
            header.put_u32(size as u32);
            header.put_slice(&AtomType::FREE.0);
            self.storage.write_all_at(offset, &header)?;
            let zeros = [0u8; 4096];
            let mut remaining = size - 8;
            let mut pos = offset + 8;
            while remaining > 0 {
                let n = remaining.min(zeros.len() as u64);
                self.storage.write_all_at(pos, &zeros[..n as usize])?;
                pos += n;
                remaining -= n;
            }
        }
        Ok(())
    }
}

/// A usable replacement atom carries an explicit size that matches its byte
/// length.
fn validate_replacement(new_atom: &[u8]) -> Result<()> {
    if new_atom.len() < 8 {
        return Err(Error::invalid_atom("replacement shorter than an atom header"));
    }
    let size_field = u32::from_be_bytes([new_atom[0], new_atom[1], new_atom[2], new_atom[3]]);
    let declared = match size_field {
        0 => {
            return Err(Error::invalid_atom(
                "replacement atom must carry an explicit size",
            ))
        }
        1 => {
            if new_atom.len() < 16 {
                return Err(Error::invalid_atom(
                    "replacement too short for an extended size field",
                ));
            }
            u64::from_be_bytes([
                new_atom[8],
                new_atom[9],
                new_atom[10],
                new_atom[11],
                new_atom[12],
                new_atom[13],
                new_atom[14],
                new_atom[15],
            ])
        }
        s => s as u64,
    };
    if declared != new_atom.len() as u64 {
        return Err(Error::invalid_atom(format!(
            "replacement declares size {} but is {} bytes",
            declared,
            new_atom.len()
        )));
    }
    Ok(())
}
