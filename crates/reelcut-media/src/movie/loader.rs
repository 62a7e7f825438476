//! Building the in-memory movie model from a container file.
//!
//! Only the children of `moov` that feed the editing engine are walked:
//! `mvhd` for the movie clock, and per `trak` the header, media timing,
//! handler, sample timing/chunking tables, and the edit list.

use super::Movie;
use crate::atoms::{Atom, AtomScanner, AtomType};
use crate::error::{Error, Result};
use crate::time::{RationalTime, TimeRange};
use crate::track::{SampleTableBuilder, Segment, SegmentMap, Track};
use reelcut_common::MediaKind;
use std::io::{Read, Seek};

/// The classic default movie timescale, used until `mvhd` says otherwise.
const DEFAULT_TIMESCALE: i32 = 600;

/// An edit list entry as stored in the container.
struct EditEntry {
    /// Duration on the movie clock.
    segment_duration: u64,
    /// Start in media time, or negative for an empty edit.
    media_time: i64,
    /// 16.16 fixed-point playback rate.
    media_rate: u32,
}

const UNIT_RATE: u32 = 0x0001_0000;

pub(super) fn parse_movie<R: Read + Seek>(reader: R) -> Result<Movie> {
    let mut scanner = AtomScanner::new(reader);
    let top_level = scanner.scan();
    let moov = top_level
        .iter()
        .find(|a| a.atom_type == AtomType::MOOV)
        .ok_or(Error::AtomNotFound(AtomType::MOOV))?;

    let children = scanner.scan_range(moov.data_offset, moov.end());

    // The movie header comes first: edit list durations are expressed on
    // the movie clock.
    let mut timescale = DEFAULT_TIMESCALE;
    let mut duration = 0u64;
    for child in &children {
        if child.atom_type == AtomType::MVHD {
            let data = scanner.read_payload(child)?;
            (timescale, duration) = parse_mvhd(&data)?;
        }
    }

    let mut tracks = Vec::new();
    for child in &children {
        if child.atom_type == AtomType::TRAK {
            match parse_trak(&mut scanner, child, timescale) {
                Ok(track) => tracks.push(track),
                Err(_error) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(%_error, "skipping unreadable track");
                }
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(timescale, tracks = tracks.len(), "loaded movie");

    Ok(Movie {
        timescale,
        duration: RationalTime::new(duration as i64, timescale),
        tracks,
    })
}

/// Movie header: `(timescale, duration)`.
fn parse_mvhd(data: &[u8]) -> Result<(i32, u64)> {
    let (timescale, duration) = parse_versioned_header(data)
        .ok_or_else(|| Error::invalid_atom("movie header too short"))?;
    if timescale == 0 || timescale > i32::MAX as u32 {
        return Err(Error::invalid_atom(format!(
            "unusable movie timescale {timescale}"
        )));
    }
    Ok((timescale as i32, duration))
}

/// `mvhd` and `mdhd` share their layout: version, creation/modification
/// times (32- or 64-bit), then timescale and duration.
fn parse_versioned_header(data: &[u8]) -> Option<(u32, u64)> {
    let version = *data.first()?;
    if version == 0 {
        if data.len() < 20 {
            return None;
        }
        let timescale = u32::from_be_bytes([data[12], data[13], data[14], data[15]]);
        let duration = u32::from_be_bytes([data[16], data[17], data[18], data[19]]) as u64;
        Some((timescale, duration))
    } else {
        if data.len() < 32 {
            return None;
        }
        let timescale = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
        let duration = u64::from_be_bytes([
            data[24], data[25], data[26], data[27], data[28], data[29], data[30], data[31],
        ]);
        Some((timescale, duration))
    }
}

fn parse_trak<R: Read + Seek>(
    scanner: &mut AtomScanner<R>,
    trak: &Atom,
    movie_timescale: i32,
) -> Result<Track> {
    let children = scanner.scan_range(trak.data_offset, trak.end());

    let mut track = Track::new(0, MediaKind::Unknown, DEFAULT_TIMESCALE);
    let mut edit_list: Option<Vec<EditEntry>> = None;

    for child in &children {
        match child.atom_type {
            AtomType::TKHD => {
                let data = scanner.read_payload(child)?;
                if let Some(id) = parse_tkhd(&data) {
                    track.id = id;
                }
            }
            AtomType::EDTS => {
                let grandchildren = scanner.scan_range(child.data_offset, child.end());
                if let Some(elst) = grandchildren
                    .iter()
                    .find(|a| a.atom_type == AtomType::ELST)
                {
                    let data = scanner.read_payload(elst)?;
                    edit_list = Some(parse_elst(&data)?);
                }
            }
            AtomType::MDIA => {
                parse_mdia(scanner, child, &mut track)?;
            }
            _ => {}
        }
    }

    track.segments = match edit_list {
        Some(entries) => segments_from_edit_list(&entries, movie_timescale, track.timescale)?,
        // No edit list: track time is media time over the whole media.
        None => {
            let media_duration = if track.duration > 0 {
                track.duration
            } else {
                track.sample_table.total_duration()
            };
            if media_duration == 0 {
                SegmentMap::default()
            } else {
                SegmentMap::identity(TimeRange::new(
                    RationalTime::ZERO,
                    RationalTime::new(media_duration as i64, track.timescale),
                ))
            }
        }
    };

    Ok(track)
}

/// Track header: the track ID.
fn parse_tkhd(data: &[u8]) -> Option<u32> {
    let version = *data.first()?;
    if version == 0 {
        if data.len() < 16 {
            return None;
        }
        Some(u32::from_be_bytes([data[12], data[13], data[14], data[15]]))
    } else {
        if data.len() < 24 {
            return None;
        }
        Some(u32::from_be_bytes([data[20], data[21], data[22], data[23]]))
    }
}

fn parse_mdia<R: Read + Seek>(
    scanner: &mut AtomScanner<R>,
    mdia: &Atom,
    track: &mut Track,
) -> Result<()> {
    let children = scanner.scan_range(mdia.data_offset, mdia.end());

    for child in &children {
        match child.atom_type {
            AtomType::MDHD => {
                let data = scanner.read_payload(child)?;
                if let Some((timescale, duration)) = parse_versioned_header(&data) {
                    if timescale == 0 || timescale > i32::MAX as u32 {
                        return Err(Error::invalid_atom(format!(
                            "unusable media timescale {timescale}"
                        )));
                    }
                    track.timescale = timescale as i32;
                    track.duration = duration;
                }
            }
            AtomType::HDLR => {
                let data = scanner.read_payload(child)?;
                if data.len() >= 12 {
                    track.kind =
                        media_kind_from_handler([data[8], data[9], data[10], data[11]]);
                }
            }
            AtomType::MINF => {
                let grandchildren = scanner.scan_range(child.data_offset, child.end());
                for grandchild in &grandchildren {
                    if grandchild.atom_type == AtomType::STBL {
                        parse_stbl(scanner, grandchild, track)?;
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn media_kind_from_handler(handler: [u8; 4]) -> MediaKind {
    match &handler {
        b"vide" => MediaKind::Video,
        b"soun" => MediaKind::Audio,
        b"tmcd" => MediaKind::Timecode,
        b"text" | b"sbtl" | b"subt" => MediaKind::Text,
        b"meta" => MediaKind::Metadata,
        _ => MediaKind::Unknown,
    }
}

fn parse_stbl<R: Read + Seek>(
    scanner: &mut AtomScanner<R>,
    stbl: &Atom,
    track: &mut Track,
) -> Result<()> {
    let children = scanner.scan_range(stbl.data_offset, stbl.end());

    let mut builder = SampleTableBuilder::new();
    for child in &children {
        match child.atom_type {
            AtomType::STTS => {
                let data = scanner.read_payload(child)?;
                builder.set_time_to_sample(parse_stts(&data));
            }
            AtomType::STSC => {
                let data = scanner.read_payload(child)?;
                builder.set_sample_to_chunk(parse_stsc(&data));
            }
            _ => {}
        }
    }
    track.sample_table = builder.build();
    Ok(())
}

/// Time-to-sample runs: `(sample count, per-sample duration)`.
fn parse_stts(data: &[u8]) -> Vec<(u32, u32)> {
    if data.len() < 8 {
        return Vec::new();
    }
    let entry_count = u32::from_be_bytes([data[4], data[5], data[6], data[7]]) as usize;
    let mut runs = Vec::with_capacity(entry_count);
    for i in 0..entry_count {
        let offset = 8 + i * 8;
        if offset + 8 > data.len() {
            break;
        }
        let count = u32::from_be_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ]);
        let duration = u32::from_be_bytes([
            data[offset + 4],
            data[offset + 5],
            data[offset + 6],
            data[offset + 7],
        ]);
        runs.push((count, duration));
    }
    runs
}

/// Sample-to-chunk runs: `(first chunk, samples per chunk)`.
fn parse_stsc(data: &[u8]) -> Vec<(u32, u32)> {
    if data.len() < 8 {
        return Vec::new();
    }
    let entry_count = u32::from_be_bytes([data[4], data[5], data[6], data[7]]) as usize;
    let mut runs = Vec::with_capacity(entry_count);
    for i in 0..entry_count {
        let offset = 8 + i * 12;
        if offset + 12 > data.len() {
            break;
        }
        let first_chunk = u32::from_be_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ]);
        let samples_per_chunk = u32::from_be_bytes([
            data[offset + 4],
            data[offset + 5],
            data[offset + 6],
            data[offset + 7],
        ]);
        runs.push((first_chunk, samples_per_chunk));
    }
    runs
}

/// Edit list entries, both layout versions.
fn parse_elst(data: &[u8]) -> Result<Vec<EditEntry>> {
    if data.len() < 8 {
        return Err(Error::invalid_atom("edit list too short"));
    }
    let version = data[0];
    let entry_count = u32::from_be_bytes([data[4], data[5], data[6], data[7]]) as usize;
    let entry_size = if version == 0 { 12 } else { 20 };
    let mut entries = Vec::with_capacity(entry_count);
    for i in 0..entry_count {
        let offset = 8 + i * entry_size;
        if offset + entry_size > data.len() {
            break;
        }
        let entry = if version == 0 {
            EditEntry {
                segment_duration: u32::from_be_bytes([
                    data[offset],
                    data[offset + 1],
                    data[offset + 2],
                    data[offset + 3],
                ]) as u64,
                media_time: i32::from_be_bytes([
                    data[offset + 4],
                    data[offset + 5],
                    data[offset + 6],
                    data[offset + 7],
                ]) as i64,
                media_rate: u32::from_be_bytes([
                    data[offset + 8],
                    data[offset + 9],
                    data[offset + 10],
                    data[offset + 11],
                ]),
            }
        } else {
            EditEntry {
                segment_duration: u64::from_be_bytes([
                    data[offset],
                    data[offset + 1],
                    data[offset + 2],
                    data[offset + 3],
                    data[offset + 4],
                    data[offset + 5],
                    data[offset + 6],
                    data[offset + 7],
                ]),
                media_time: i64::from_be_bytes([
                    data[offset + 8],
                    data[offset + 9],
                    data[offset + 10],
                    data[offset + 11],
                    data[offset + 12],
                    data[offset + 13],
                    data[offset + 14],
                    data[offset + 15],
                ]),
                media_rate: u32::from_be_bytes([
                    data[offset + 16],
                    data[offset + 17],
                    data[offset + 18],
                    data[offset + 19],
                ]),
            }
        };
        entries.push(entry);
    }
    Ok(entries)
}

/// Turn an edit list into the track's segment map. Edit durations run on
/// the movie clock; media times run on the track's own media clock. The
/// exact rational time type carries both without unifying timescales.
fn segments_from_edit_list(
    entries: &[EditEntry],
    movie_timescale: i32,
    media_timescale: i32,
) -> Result<SegmentMap> {
    let mut segments = Vec::with_capacity(entries.len());
    let mut track_start = 0i64;
    for entry in entries {
        let track_range = TimeRange::new(
            RationalTime::new(track_start, movie_timescale),
            RationalTime::new(entry.segment_duration as i64, movie_timescale),
        );
        if entry.media_time < 0 {
            segments.push(Segment::gap(track_range));
        } else {
            if entry.media_rate != UNIT_RATE {
                return Err(Error::unsupported(format!(
                    "edit rate {:#010x}",
                    entry.media_rate
                )));
            }
            let media_range = TimeRange::new(
                RationalTime::new(entry.media_time, media_timescale),
                RationalTime::new(entry.segment_duration as i64, movie_timescale),
            );
            segments.push(Segment::new(media_range, track_range));
        }
        track_start += entry.segment_duration as i64;
    }
    SegmentMap::new(segments)
}
