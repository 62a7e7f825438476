//! Media sample tables.
//!
//! A sample table describes how a track's media samples are timed and how
//! they are grouped into storage chunks:
//! - time-to-sample runs: `(sample count, per-sample duration)`
//! - sample-to-chunk runs: `(first chunk, samples per chunk)`, 1-based as
//!   in the container format
//!
//! Building the table resolves, per sample, its decode time, duration, and
//! chunk coordinates, and per chunk whether every sample in it has the same
//! duration (which is what makes bulk chunk stepping possible).

/// A resolved sample with the information cursors need.
#[derive(Debug, Clone, Copy)]
pub struct SampleEntry {
    /// Sample index (0-based).
    pub index: u32,
    /// Decode timestamp in media timescale ticks.
    pub dts: u64,
    /// Duration in media timescale ticks.
    pub duration: u32,
    /// Storage chunk holding this sample (0-based).
    pub chunk: u32,
    /// Position of this sample within its chunk (0-based).
    pub index_in_chunk: u32,
}

/// Per-chunk grouping information.
#[derive(Debug, Clone, Copy)]
pub struct ChunkEntry {
    /// Number of samples stored in the chunk.
    pub sample_count: u32,
    /// Whether every sample in the chunk has the same duration.
    pub uniform_durations: bool,
}

/// Sample table containing resolved sample information.
#[derive(Debug, Clone, Default)]
pub struct SampleTable {
    /// Sample count.
    pub sample_count: u32,
    /// All resolved samples, in decode order.
    pub samples: Vec<SampleEntry>,
    /// All chunks, in storage order.
    pub chunks: Vec<ChunkEntry>,
}

impl SampleTable {
    /// Create a new sample table builder.
    pub fn builder() -> SampleTableBuilder {
        SampleTableBuilder::new()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get sample by index.
    pub fn get(&self, index: u32) -> Option<&SampleEntry> {
        self.samples.get(index as usize)
    }

    /// Get chunk by index.
    pub fn chunk(&self, index: u32) -> Option<&ChunkEntry> {
        self.chunks.get(index as usize)
    }

    /// The index of the sample whose `[dts, dts + duration)` span contains
    /// the given tick count, clamped into the table at either end.
    pub fn sample_containing(&self, ticks: i64) -> Option<u32> {
        if self.samples.is_empty() {
            return None;
        }
        let count = self
            .samples
            .partition_point(|s| (s.dts as i64) <= ticks) as u32;
        Some(count.saturating_sub(1))
    }

    /// Total timed duration in media timescale ticks.
    pub fn total_duration(&self) -> u64 {
        self.samples
            .last()
            .map(|s| s.dts + s.duration as u64)
            .unwrap_or(0)
    }
}

/// Builder for constructing a sample table from raw timing and chunking
/// runs.
pub struct SampleTableBuilder {
    // (sample_count, duration) runs
    time_to_sample: Vec<(u32, u32)>,
    // (first_chunk, samples_per_chunk) runs; first_chunk is 1-based
    sample_to_chunk: Vec<(u32, u32)>,
}

impl SampleTableBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            time_to_sample: Vec::new(),
            sample_to_chunk: Vec::new(),
        }
    }

    /// Set time-to-sample runs: `(sample count, per-sample duration)`.
    pub fn set_time_to_sample(&mut self, runs: Vec<(u32, u32)>) {
        self.time_to_sample = runs;
    }

    /// Set sample-to-chunk runs: `(first chunk, samples per chunk)` with
    /// 1-based chunk numbers. The last run repeats until the samples are
    /// exhausted.
    pub fn set_sample_to_chunk(&mut self, runs: Vec<(u32, u32)>) {
        self.sample_to_chunk = runs;
    }

    /// Build the sample table by resolving all sample information.
    pub fn build(self) -> SampleTable {
        let sample_count: u32 = self
            .time_to_sample
            .iter()
            .map(|(count, _)| *count)
            .sum();
        if sample_count == 0 {
            return SampleTable::default();
        }

        // Resolve timestamps and durations.
        let mut samples = Vec::with_capacity(sample_count as usize);
        let mut dts = 0u64;
        let mut index = 0u32;
        for (count, duration) in &self.time_to_sample {
            for _ in 0..*count {
                samples.push(SampleEntry {
                    index,
                    dts,
                    duration: *duration,
                    chunk: 0,
                    index_in_chunk: 0,
                });
                dts += *duration as u64;
                index += 1;
            }
        }

        // Resolve chunk membership.
        let runs: Vec<(u32, u32)> = if self.sample_to_chunk.is_empty() {
            // no chunking information: everything in one chunk
            vec![(1, sample_count)]
        } else {
            self.sample_to_chunk
        };

        let mut chunks = Vec::new();
        let mut assigned = 0u32;
        for (i, &(first_chunk, samples_per_chunk)) in runs.iter().enumerate() {
            if samples_per_chunk == 0 {
                continue;
            }
            let next_first = runs.get(i + 1).map(|r| r.0).unwrap_or(u32::MAX);
            let mut chunk = first_chunk.max(1);
            while chunk < next_first && assigned < sample_count {
                let in_chunk = samples_per_chunk.min(sample_count - assigned);
                let mut uniform = true;
                let first_duration = samples[assigned as usize].duration;
                for k in 0..in_chunk {
                    let sample = &mut samples[(assigned + k) as usize];
                    sample.chunk = chunks.len() as u32;
                    sample.index_in_chunk = k;
                    if sample.duration != first_duration {
                        uniform = false;
                    }
                }
                chunks.push(ChunkEntry {
                    sample_count: in_chunk,
                    uniform_durations: uniform,
                });
                assigned += in_chunk;
                chunk += 1;
            }
            if assigned == sample_count {
                break;
            }
        }

        // Malformed chunk runs that cover nothing: sweep the remainder into
        // one final chunk.
        if assigned < sample_count {
            let in_chunk = sample_count - assigned;
            let first_duration = samples[assigned as usize].duration;
            let mut uniform = true;
            for k in 0..in_chunk {
                let sample = &mut samples[(assigned + k) as usize];
                sample.chunk = chunks.len() as u32;
                sample.index_in_chunk = k;
                if sample.duration != first_duration {
                    uniform = false;
                }
            }
            chunks.push(ChunkEntry {
                sample_count: in_chunk,
                uniform_durations: uniform,
            });
        }

        SampleTable {
            sample_count,
            samples,
            chunks,
        }
    }
}

impl Default for SampleTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}
