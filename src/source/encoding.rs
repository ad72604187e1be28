// src/source/encoding.rs

use anyhow::{anyhow, Context, Result};
use encoding_rs::{DecoderResult, Encoding, EUC_KR, UTF_8};
use std::{fmt, fs::File, io::Read, path::Path};
use tracing::{debug, instrument};

/// Bytes read from the start of the file for each probe.
const PROBE_BYTES: usize = 8 * 1024;

/// Text encodings a ledger export may arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    /// Windows code page 949; encoding_rs's EUC-KR is the same superset.
    Cp949,
    /// UTF-8 with a leading byte-order mark removed.
    Utf8Sig,
    Utf8,
}

/// Probe order; the first entry is also the fallback.
pub const PROBE_ORDER: [SourceEncoding; 3] = [
    SourceEncoding::Cp949,
    SourceEncoding::Utf8Sig,
    SourceEncoding::Utf8,
];

impl SourceEncoding {
    fn encoding(self) -> &'static Encoding {
        match self {
            SourceEncoding::Cp949 => EUC_KR,
            SourceEncoding::Utf8Sig | SourceEncoding::Utf8 => UTF_8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SourceEncoding::Cp949 => "cp949",
            SourceEncoding::Utf8Sig => "utf-8-sig",
            SourceEncoding::Utf8 => "utf-8",
        }
    }

    /// Strictly decode a sample. A multi-byte sequence cut off at the end of
    /// the sample is not counted as an error.
    fn accepts_sample(self, sample: &[u8]) -> bool {
        let mut decoder = match self {
            SourceEncoding::Utf8Sig => self.encoding().new_decoder_with_bom_removal(),
            _ => self.encoding().new_decoder_without_bom_handling(),
        };
        let Some(capacity) = decoder.max_utf8_buffer_length_without_replacement(sample.len())
        else {
            return false;
        };
        let mut out = String::with_capacity(capacity);
        let (result, _read) = decoder.decode_to_string_without_replacement(sample, &mut out, false);
        matches!(result, DecoderResult::InputEmpty)
    }

    /// Strictly decode a whole file's bytes.
    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        let bytes = match self {
            SourceEncoding::Utf8Sig => bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes),
            _ => bytes,
        };
        self.encoding()
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned())
            .ok_or_else(|| anyhow!("input is not valid {}", self.name()))
    }
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pick the first encoding in [`PROBE_ORDER`] that decodes the start of the
/// file. Never fails: an unreadable file or an undecodable sample falls back
/// to cp949.
#[instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn detect_encoding<P: AsRef<Path>>(path: P) -> SourceEncoding {
    let sample = match read_sample(path.as_ref()) {
        Ok(sample) => sample,
        Err(e) => {
            debug!(error = %e, "probe read failed");
            return PROBE_ORDER[0];
        }
    };

    PROBE_ORDER
        .into_iter()
        .find(|enc| {
            let ok = enc.accepts_sample(&sample);
            debug!(encoding = enc.name(), ok, "probe");
            ok
        })
        .unwrap_or(PROBE_ORDER[0])
}

fn read_sample(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut sample = Vec::with_capacity(PROBE_BYTES);
    file.take(PROBE_BYTES as u64)
        .read_to_end(&mut sample)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(sample)
}

/// Read and decode the whole file with `encoding`.
pub fn read_to_string<P: AsRef<Path>>(path: P, encoding: SourceEncoding) -> Result<String> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    encoding
        .decode(&bytes)
        .with_context(|| format!("decoding {}", path.display()))
}
