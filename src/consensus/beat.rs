use crate::consensus::datum::DigestEntry;
use crate::consensus::peers::Peer;
use bytes::Bytes;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Leader keep-alive. `digest` is `None` for a beat-only beat, which receivers use purely to
/// extend followership without diffing data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Beat {
    pub(crate) peer: Peer,
    pub(crate) digest: Option<Vec<DigestEntry>>,
}

/// A beat as it travels on the wire.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct EncodedBeat {
    pub(crate) payload: Bytes,
    pub(crate) compressed: bool,
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum BeatCodecError {
    #[error("Beat serialization failed")]
    Serde(#[from] serde_json::Error),
    #[error("Beat compression failed")]
    Io(#[from] std::io::Error),
}

/// JSON encode, then gzip if the JSON exceeds `compress_threshold` bytes.
pub(crate) fn encode(beat: &Beat, compress_threshold: usize) -> Result<EncodedBeat, BeatCodecError> {
    let json = serde_json::to_vec(beat)?;
    if json.len() <= compress_threshold {
        return Ok(EncodedBeat {
            payload: Bytes::from(json),
            compressed: false,
        });
    }

    let mut encoder = GzEncoder::new(Vec::with_capacity(json.len() / 4), Compression::default());
    encoder.write_all(&json)?;
    let gzipped = encoder.finish()?;

    Ok(EncodedBeat {
        payload: Bytes::from(gzipped),
        compressed: true,
    })
}

pub(crate) fn decode(encoded: &EncodedBeat) -> Result<Beat, BeatCodecError> {
    if !encoded.compressed {
        return Ok(serde_json::from_slice(&encoded.payload)?);
    }

    let mut json = Vec::new();
    GzDecoder::new(encoded.payload.as_ref()).read_to_end(&mut json)?;
    Ok(serde_json::from_slice(&json)?)
}
