//! Tracks element: one TrackEntry per registered stream.

use rand::Rng;

use crate::ebml::{ClosedElement, EbmlWriter};
use crate::elements as id;
use crate::error::{MuxError, MuxResult};
use crate::sink::ByteSink;
use crate::source::TrackConfig;

/// Highest track number a SimpleBlock's one-byte track field can carry.
pub const MAX_TRACK_NUMBER: u8 = 127;

/// Random non-zero track UID.
pub fn new_track_uid() -> u64 {
    let mut rng = rand::thread_rng();
    rng.gen_range(1..=u64::MAX)
}

/// Write `Tracks`. Track numbers are 1-based in slice order.
pub fn write_tracks<S: ByteSink>(
    w: &mut EbmlWriter<S>,
    tracks: &[&TrackConfig],
) -> MuxResult<ClosedElement> {
    let tracks_el = w.start_element(id::TRACKS)?;
    for (i, track) in tracks.iter().enumerate() {
        let number = u8::try_from(i + 1)
            .ok()
            .filter(|n| *n <= MAX_TRACK_NUMBER)
            .ok_or_else(|| {
                MuxError::TrackError(format!(
                    "at most {MAX_TRACK_NUMBER} tracks are supported, got {}",
                    tracks.len()
                ))
            })?;
        write_track_entry(w, number, new_track_uid(), track)?;
    }
    w.end_element(tracks_el)
}

/// Write a single `TrackEntry`.
pub fn write_track_entry<S: ByteSink>(
    w: &mut EbmlWriter<S>,
    number: u8,
    uid: u64,
    track: &TrackConfig,
) -> MuxResult<()> {
    if number == 0 || number > MAX_TRACK_NUMBER {
        return Err(MuxError::TrackError(format!(
            "track number {number} out of range 1..={MAX_TRACK_NUMBER}"
        )));
    }
    if uid == 0 {
        return Err(MuxError::TrackError("track UID must be non-zero".into()));
    }

    let entry = w.start_element(id::TRACK_ENTRY)?;
    w.write_uint(id::TRACK_NUMBER, u64::from(number))?;
    w.write_uint(id::TRACK_UID, uid)?;

    match track {
        TrackConfig::Video(video) => {
            w.write_uint(id::TRACK_TYPE, id::TRACK_TYPE_VIDEO)?;
            w.write_uint(id::FLAG_LACING, 0)?;
            w.write_string(id::CODEC_ID, video.codec.codec_id())?;
            w.write_string(id::CODEC_NAME, video.codec.display_name())?;
            if let Some(private) = video.codec_private.as_deref().filter(|p| !p.is_empty()) {
                w.write_binary(id::CODEC_PRIVATE, private)?;
            }

            let video_el = w.start_element(id::VIDEO)?;
            w.write_uint(id::PIXEL_WIDTH, u64::from(video.resolution.width))?;
            w.write_uint(id::PIXEL_HEIGHT, u64::from(video.resolution.height))?;
            w.write_float(id::FRAME_RATE, video.frame_rate.as_f64())?;
            w.end_element(video_el)?;
        }
        TrackConfig::Audio(audio) => {
            w.write_uint(id::TRACK_TYPE, id::TRACK_TYPE_AUDIO)?;
            w.write_uint(id::FLAG_LACING, 0)?;
            w.write_string(id::CODEC_ID, audio.codec.codec_id())?;
            w.write_string(id::CODEC_NAME, audio.codec.display_name())?;
            if !audio.codec_private.is_empty() {
                w.write_binary(id::CODEC_PRIVATE, &audio.codec_private)?;
            }

            let audio_el = w.start_element(id::AUDIO)?;
            w.write_float(id::SAMPLING_FREQUENCY, audio.sample_rate)?;
            w.write_uint(id::CHANNELS, u64::from(audio.channels))?;
            w.end_element(audio_el)?;
        }
    }

    w.end_element(entry)?;
    Ok(())
}

/// Build Vorbis CodecPrivate from the three header packets.
///
/// Layout: packet count minus one (`2`), Xiph-laced sizes of the
/// identification and comment headers, then all three headers back to back.
pub fn xiph_codec_private(identification: &[u8], comment: &[u8], setup: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        1 + identification.len() / 255
            + comment.len() / 255
            + 2
            + identification.len()
            + comment.len()
            + setup.len(),
    );
    out.push(0x02);
    push_xiph_size(&mut out, identification.len());
    push_xiph_size(&mut out, comment.len());
    out.extend_from_slice(identification);
    out.extend_from_slice(comment);
    out.extend_from_slice(setup);
    out
}

/// Xiph lacing: one 255 byte per full 255, then the remainder.
fn push_xiph_size(out: &mut Vec<u8>, size: usize) {
    out.extend(std::iter::repeat(0xFF).take(size / 255));
    out.push((size % 255) as u8);
}
