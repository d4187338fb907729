//! Mux session: interleaves N stream sources into one segment.
//!
//! The scheduler loop, per iteration:
//! 1. Refill every unfinished stream whose queue is empty.
//! 2. If an unfinished stream still has nothing queued, the global minimum is
//!    unknown: go back to 1.
//! 3. Pop the queue head with the smallest timestamp (ties: lowest track
//!    number) and write it.
//!
//! With two-pass enabled, multi-pass capable video sources first run an
//! analysis pass whose output is discarded, then everything is muxed again.

use std::fs::File;
use std::io::{self, BufWriter};
use std::mem;
use std::path::Path;

use tracing::{debug, info, trace, warn};
use wm_common::MuxConfig;

use crate::error::{MuxError, MuxResult};
use crate::progress::{ProgressRange, ProgressSink};
use crate::queue::FrameQueue;
use crate::segment::{SegmentSummary, SegmentWriter};
use crate::sink::{ByteSink, IoSink};
use crate::source::{EncodePass, StreamSource, TrackConfig};
use crate::track::MAX_TRACK_NUMBER;

/// Totals for a finished session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MuxSummary {
    pub segment: SegmentSummary,
    /// Frames pulled from sources during the output pass.
    pub frames_in: u64,
    /// Frames written as blocks.
    pub frames_out: u64,
    /// Whether an analysis pass ran first.
    pub two_pass: bool,
}

/// Result of [`MuxSession::run`]: the sink holding the finished segment.
#[derive(Debug)]
pub struct MuxReport<S> {
    pub sink: S,
    pub summary: MuxSummary,
}

/// Scheduler bookkeeping for one source.
struct StreamState {
    track: u8,
    source: Box<dyn StreamSource>,
    queue: FrameQueue,
    frames_in: u64,
    frames_out: u64,
    end_of_stream: bool,
    complete: bool,
    /// Takes part in the current pass.
    active: bool,
    two_pass: bool,
    /// Keep `SourcePull::stats`; only set during the analysis pass.
    collecting_stats: bool,
    /// Rate-control statistics from the analysis pass.
    stats: Vec<u8>,
    last_timestamp: Option<u64>,
}

impl StreamState {
    fn new(track: u8, source: Box<dyn StreamSource>) -> Self {
        Self {
            track,
            source,
            queue: FrameQueue::new(),
            frames_in: 0,
            frames_out: 0,
            end_of_stream: false,
            complete: false,
            active: true,
            two_pass: false,
            collecting_stats: false,
            stats: Vec::new(),
            last_timestamp: None,
        }
    }

    fn pending(&self) -> bool {
        self.active && !self.complete
    }

    fn source_error(&self, source: wm_common::SourceError) -> MuxError {
        MuxError::Source {
            track: self.track,
            source,
        }
    }

    fn refill(&mut self) -> MuxResult<()> {
        let pull = self
            .source
            .pull_more()
            .map_err(|e| self.source_error(e))?;
        if self.collecting_stats {
            self.append_stats(&pull.stats)?;
        }
        let pulled = pull.frames.len();
        self.frames_in += pulled as u64;
        self.queue.extend(pull.frames);
        if pull.end_of_stream {
            self.end_of_stream = true;
        }
        trace!(
            track = self.track,
            pulled,
            queued_bytes = self.queue.queued_bytes(),
            end_of_stream = self.end_of_stream,
            "stream refilled"
        );
        self.check_complete();
        Ok(())
    }

    fn append_stats(&mut self, stats: &[u8]) -> MuxResult<()> {
        if stats.is_empty() {
            return Ok(());
        }
        self.reserve_stats(stats.len())?;
        self.stats.extend_from_slice(stats);
        Ok(())
    }

    fn reserve_stats(&mut self, additional: usize) -> MuxResult<()> {
        self.stats.try_reserve(additional).map_err(|e| {
            MuxError::ResourceExhausted(format!(
                "track {}: cannot grow rate-control statistics past {} bytes: {e}",
                self.track,
                self.stats.len()
            ))
        })
    }

    fn check_complete(&mut self) {
        if self.end_of_stream && self.queue.is_empty() && !self.complete {
            self.complete = true;
            debug!(
                track = self.track,
                frames_in = self.frames_in,
                frames_out = self.frames_out,
                "stream complete"
            );
        }
    }

    /// Forget pass state so the stream can be muxed again from the start.
    fn reset(&mut self) {
        self.queue.clear();
        self.frames_in = 0;
        self.frames_out = 0;
        self.end_of_stream = false;
        self.complete = false;
        self.last_timestamp = None;
    }
}

/// Multiplexes registered stream sources into a WebM segment.
pub struct MuxSession<S: ByteSink> {
    sink: S,
    config: MuxConfig,
    streams: Vec<StreamState>,
    progress: Option<Box<dyn ProgressSink>>,
}

impl MuxSession<IoSink<BufWriter<File>>> {
    /// Session writing to a new file at `path`.
    pub fn create_file(path: impl AsRef<Path>, config: MuxConfig) -> MuxResult<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            MuxError::IoError(io::Error::new(
                e.kind(),
                format!("Failed to create output file {}: {e}", path.display()),
            ))
        })?;
        Self::new(IoSink::new(BufWriter::new(file))?, config)
    }
}

impl<S: ByteSink> MuxSession<S> {
    pub fn new(sink: S, config: MuxConfig) -> MuxResult<Self> {
        config.validate()?;
        Ok(Self {
            sink,
            config,
            streams: Vec::new(),
            progress: None,
        })
    }

    /// Register a source. Returns its track number (1-based, in
    /// registration order).
    pub fn add_stream(&mut self, source: Box<dyn StreamSource>) -> MuxResult<u8> {
        let track = u8::try_from(self.streams.len() + 1)
            .ok()
            .filter(|t| *t <= MAX_TRACK_NUMBER)
            .ok_or_else(|| {
                MuxError::TrackError(format!("at most {MAX_TRACK_NUMBER} streams per segment"))
            })?;

        if let TrackConfig::Video(video) = source.track() {
            if video.resolution.is_empty() {
                return Err(MuxError::TrackError(format!(
                    "track {track}: video resolution {} has no pixels",
                    video.resolution
                )));
            }
        }

        info!(
            track,
            kind = source.track().kind_name(),
            codec = source.track().codec_id(),
            duration_s = source.estimated_duration(),
            "stream added"
        );
        self.streams.push(StreamState::new(track, source));
        Ok(track)
    }

    pub fn set_progress(&mut self, progress: impl ProgressSink + 'static) {
        self.progress = Some(Box::new(progress));
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Mux every stream to completion and finalize the segment.
    pub fn run(mut self) -> MuxResult<MuxReport<S>> {
        let mut progress = self.progress.take();
        let result = self.mux(&mut progress);
        if let Some(sink) = progress.as_mut() {
            sink.on_finished(result.as_ref().map(|r| &r.summary));
        }
        if let Err(e) = &result {
            warn!(error = %e, "mux failed");
        }
        result
    }

    fn mux(mut self, progress: &mut Option<Box<dyn ProgressSink>>) -> MuxResult<MuxReport<S>> {
        if self.streams.is_empty() {
            return Err(MuxError::TrackError("no streams to mux".into()));
        }

        let duration_s = self
            .streams
            .iter()
            .map(|s| s.source.estimated_duration())
            .fold(0.0f64, f64::max);

        let two_pass = self.config.two_pass && self.mark_two_pass_streams();
        if let Some(sink) = progress.as_mut() {
            sink.on_started();
        }

        let output_range = if two_pass {
            self.run_analysis_pass(duration_s, progress)?;
            ProgressRange::SECOND_HALF
        } else {
            ProgressRange::FULL
        };

        for stream in &mut self.streams {
            stream.active = true;
            if !stream.two_pass {
                stream
                    .source
                    .begin_pass(&EncodePass::Single)
                    .map_err(|e| stream.source_error(e))?;
            }
        }

        let tracks: Vec<&TrackConfig> = self.streams.iter().map(|s| s.source.track()).collect();
        let mut segment = SegmentWriter::begin(self.sink, &self.config, &tracks, duration_s)?;

        info!(streams = self.streams.len(), "output pass started");
        schedule(
            &mut self.streams,
            Some(&mut segment),
            output_range,
            duration_s,
            progress,
        )?;

        let frames_in = self.streams.iter().map(|s| s.frames_in).sum();
        let frames_out = self.streams.iter().map(|s| s.frames_out).sum();
        let (sink, segment) = segment.finalize()?;
        if let Some(sink) = progress.as_mut() {
            sink.on_progress(1.0);
        }

        info!(
            frames_in,
            frames_out,
            bytes = segment.bytes_written,
            two_pass,
            "mux complete"
        );
        Ok(MuxReport {
            sink,
            summary: MuxSummary {
                segment,
                frames_in,
                frames_out,
                two_pass,
            },
        })
    }

    /// Flag video sources that can run two passes. Returns whether any can.
    fn mark_two_pass_streams(&mut self) -> bool {
        let mut any = false;
        for stream in &mut self.streams {
            stream.two_pass =
                stream.source.track().is_video() && stream.source.supports_multi_pass();
            any |= stream.two_pass;
        }
        if !any {
            info!("two-pass requested but no video source supports it");
        }
        any
    }

    /// First pass over the two-pass streams: collect statistics, write
    /// nothing, then rewind each source and hand it its statistics.
    fn run_analysis_pass(
        &mut self,
        duration_s: f64,
        progress: &mut Option<Box<dyn ProgressSink>>,
    ) -> MuxResult<()> {
        for stream in &mut self.streams {
            stream.active = stream.two_pass;
            stream.collecting_stats = stream.two_pass;
            if stream.two_pass {
                stream
                    .source
                    .begin_pass(&EncodePass::Analyze)
                    .map_err(|e| stream.source_error(e))?;
            }
        }

        info!(
            streams = self.streams.iter().filter(|s| s.two_pass).count(),
            "analysis pass started"
        );
        schedule::<S>(
            &mut self.streams,
            None,
            ProgressRange::FIRST_HALF,
            duration_s,
            progress,
        )?;

        for stream in self.streams.iter_mut().filter(|s| s.two_pass) {
            loop {
                let tail = stream
                    .source
                    .flush_pass()
                    .map_err(|e| stream.source_error(e))?;
                if tail.is_empty() {
                    break;
                }
                stream.append_stats(&tail)?;
            }
            info!(
                track = stream.track,
                frames = stream.frames_out,
                stats_bytes = stream.stats.len(),
                "analysis pass finished"
            );

            stream
                .source
                .reset_to_start()
                .map_err(|e| stream.source_error(e))?;
            stream.reset();
            stream.collecting_stats = false;
            let stats = mem::take(&mut stream.stats);
            stream
                .source
                .begin_pass(&EncodePass::Final { stats })
                .map_err(|e| stream.source_error(e))?;
        }
        Ok(())
    }
}

/// Run the scheduler loop over the active streams until all are complete.
/// Frames are written to `output` when present and dropped otherwise.
fn schedule<S: ByteSink>(
    streams: &mut [StreamState],
    mut output: Option<&mut SegmentWriter<S>>,
    range: ProgressRange,
    duration_s: f64,
    progress: &mut Option<Box<dyn ProgressSink>>,
) -> MuxResult<()> {
    loop {
        for stream in streams.iter_mut() {
            if stream.pending() && stream.queue.is_empty() {
                stream.refill()?;
            }
        }

        if streams
            .iter()
            .any(|s| s.pending() && s.queue.is_empty())
        {
            continue;
        }

        let next = streams
            .iter()
            .enumerate()
            .filter(|(_, s)| s.pending())
            .filter_map(|(i, s)| s.queue.head_timestamp().map(|ts| (ts, i)))
            .min();
        let Some((_, index)) = next else {
            return Ok(());
        };

        let stream = &mut streams[index];
        let Some(frame) = stream.queue.pop() else {
            continue;
        };
        stream.frames_out += 1;

        if let Some(last) = stream.last_timestamp {
            if frame.timestamp_ms < last {
                warn!(
                    track = stream.track,
                    timestamp_ms = frame.timestamp_ms,
                    previous_ms = last,
                    "source produced out-of-order timestamp"
                );
            }
        }
        stream.last_timestamp = Some(frame.timestamp_ms);

        if let Some(segment) = output.as_deref_mut() {
            segment.write_frame(stream.track, &frame)?;
        }
        stream.check_complete();

        if let Some(fraction) = range.fraction(frame.timestamp_ms, duration_s) {
            if let Some(sink) = progress.as_mut() {
                sink.on_progress(fraction);
            }
        }
    }
}
