//! End-to-end header rewriting against a real file.

use reelcut_media::{AtomRewriter, AtomScanner, AtomType};
use std::fs::OpenOptions;
use std::io::Write;

fn atom(atom_type: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&((payload.len() as u32 + 8).to_be_bytes()));
    bytes.extend_from_slice(atom_type);
    bytes.extend_from_slice(payload);
    bytes
}

#[test]
fn rewrite_header_in_real_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("movie.mov");

    // ftyp + moov + mdat, moov in the middle
    let mut contents = atom(b"ftyp", &[0u8; 12]);
    contents.extend_from_slice(&atom(b"moov", &[1u8; 92]));
    contents.extend_from_slice(&atom(b"mdat", &[7u8; 256]));
    std::fs::write(&path, &contents).unwrap();

    // shrink the header: the remainder becomes a free atom
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&path)
        .unwrap();
    let mut rewriter = AtomRewriter::new(file);
    rewriter
        .replace(AtomType::MOOV, &atom(b"moov", &[2u8; 32]))
        .unwrap();
    drop(rewriter);

    let file = std::fs::File::open(&path).unwrap();
    let mut scanner = AtomScanner::new(file);
    let atoms = scanner.scan();
    let types: Vec<&str> = atoms.iter().map(|a| a.atom_type.as_str()).collect();
    assert_eq!(types, vec!["ftyp", "moov", "free", "mdat"]);
    assert_eq!(atoms[1].size, 40);
    assert_eq!(atoms[2].size, 60);
    // mdat did not move
    assert_eq!(atoms[3].offset, 20 + 100);
    assert_eq!(atoms[3].data_size, 256);

    // now grow it: the old header is hidden and the new one appended
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&path)
        .unwrap();
    let mut rewriter = AtomRewriter::new(file);
    rewriter
        .replace(AtomType::MOOV, &atom(b"moov", &[3u8; 400]))
        .unwrap();
    drop(rewriter);

    let file = std::fs::File::open(&path).unwrap();
    let mut scanner = AtomScanner::new(file);
    let atoms = scanner.scan();
    let types: Vec<&str> = atoms.iter().map(|a| a.atom_type.as_str()).collect();
    assert_eq!(types, vec!["ftyp", "hoov", "free", "mdat", "moov"]);
    let new_moov = atoms.last().unwrap();
    assert_eq!(new_moov.size, 408);

    // the mdat payload survived both rewrites untouched
    let payload = scanner.read_payload(&atoms[3]).unwrap();
    assert_eq!(payload, vec![7u8; 256]);
}

#[test]
fn failed_rewrite_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("movie.mov");

    let contents = atom(b"ftyp", &[0u8; 12]);
    std::fs::write(&path, &contents).unwrap();

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&path)
        .unwrap();
    let mut rewriter = AtomRewriter::new(file);
    // no moov in this file
    assert!(rewriter
        .replace(AtomType::MOOV, &atom(b"moov", &[1u8; 8]))
        .is_err());
    drop(rewriter);

    assert_eq!(std::fs::read(&path).unwrap(), contents);
}

#[test]
fn rewrite_with_implicit_size_trailer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("movie.mov");

    let mut contents = atom(b"moov", &[1u8; 24]);
    // trailing mdat written with size 0 (runs to end of file)
    let mdat_start = contents.len() as u64;
    contents.extend_from_slice(&0u32.to_be_bytes());
    contents.extend_from_slice(b"mdat");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(&contents).unwrap();
    file.write_all(&[9u8; 128]).unwrap();
    drop(file);

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&path)
        .unwrap();
    let mut rewriter = AtomRewriter::new(file);
    rewriter
        .replace(AtomType::MOOV, &atom(b"moov", &[2u8; 200]))
        .unwrap();
    drop(rewriter);

    let file = std::fs::File::open(&path).unwrap();
    let mut scanner = AtomScanner::new(file);
    let atoms = scanner.scan();
    let types: Vec<&str> = atoms.iter().map(|a| a.atom_type.as_str()).collect();
    assert_eq!(types, vec!["hoov", "mdat", "moov"]);
    // the mdat carries an explicit size now, covering exactly its old span
    let mdat = &atoms[1];
    assert!(!mdat.size_was_zero);
    assert_eq!(mdat.offset, mdat_start);
    assert_eq!(mdat.size, 8 + 128);
}
