//! Audio duration probing

use std::fs::File;
use std::path::Path;

use hound::WavReader;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::error::PlaybackError;

/// Length of an audio file in seconds
///
/// WAV headers are read with hound; other containers go through symphonia's
/// probe and use the track's frame count.
pub fn probe_duration<P: AsRef<Path>>(path: P) -> Result<f64, PlaybackError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PlaybackError::FileNotFound(path.display().to_string()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    let duration = if extension.as_deref() == Some("wav") {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        reader.duration() as f64 / spec.sample_rate as f64
    } else {
        probe_with_symphonia(path)?
    };

    debug!("Probed {}: {:.3}s", path.display(), duration);
    Ok(duration)
}

fn probe_with_symphonia(path: &Path) -> Result<f64, PlaybackError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| PlaybackError::UnsupportedFormat(format!("{}: {}", path.display(), e)))?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| PlaybackError::Decode("No audio track found".to_string()))?;

    let params = &track.codec_params;
    let frames = params
        .n_frames
        .ok_or_else(|| PlaybackError::Decode("Track does not report its length".to_string()))?;

    if let Some(time_base) = params.time_base {
        let time = time_base.calc_time(frames);
        return Ok(time.seconds as f64 + time.frac);
    }

    let sample_rate = params
        .sample_rate
        .ok_or_else(|| PlaybackError::Decode("Track does not report a sample rate".to_string()))?;
    Ok(frames as f64 / sample_rate as f64)
}
