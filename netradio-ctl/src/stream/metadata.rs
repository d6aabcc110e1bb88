//! ICY (Icecast/Shoutcast) inline metadata
//!
//! With `Icy-MetaData: 1` the server interleaves a metadata block after every
//! `icy-metaint` audio bytes: one length byte (blocks of 16 bytes), then the
//! null-padded text `StreamTitle='Artist - Title';StreamUrl='...';`.
//!
//! [`extract_stream_title`] is the pure parser. [`IcyDemuxer`] splits a
//! chunked byte stream into audio and metadata blocks across arbitrary chunk
//! boundaries.

const TITLE_KEY: &str = "StreamTitle='";

/// Outcome of parsing one metadata interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metadata {
    /// A non-empty title was embedded
    Title(String),
    /// Empty block, no `StreamTitle`, or an empty title. Normal for many streams.
    Absent,
}

/// Parse a raw metadata block (null padding included).
///
/// Malformed input never fails: invalid UTF-8 is replaced, a missing
/// terminator takes the rest of the block, control characters are dropped.
pub fn extract_stream_title(raw_block: &[u8]) -> Metadata {
    let end = raw_block
        .iter()
        .rposition(|&b| b != 0)
        .map(|p| p + 1)
        .unwrap_or(0);
    if end == 0 {
        return Metadata::Absent;
    }

    let text = String::from_utf8_lossy(&raw_block[..end]);
    let Some(start) = text.find(TITLE_KEY) else {
        return Metadata::Absent;
    };
    let rest = &text[start + TITLE_KEY.len()..];

    // Titles may contain apostrophes; only `';` closes the field
    let value = match rest.find("';") {
        Some(stop) => &rest[..stop],
        None => rest.strip_suffix('\'').unwrap_or(rest),
    };

    let title: String = value.chars().filter(|c| !c.is_control()).collect();
    let title = title.trim();
    if title.is_empty() {
        Metadata::Absent
    } else {
        Metadata::Title(title.to_string())
    }
}

/// Demuxed content of one received chunk
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Demuxed {
    pub audio: Vec<u8>,
    /// Titles completed within this chunk, in stream order
    pub titles: Vec<String>,
}

#[derive(Debug)]
enum DemuxState {
    Audio { remaining: usize },
    Length,
    Block { buf: Vec<u8>, remaining: usize },
}

/// Incremental splitter for an ICY stream with a fixed metadata interval
#[derive(Debug)]
pub struct IcyDemuxer {
    metaint: Option<usize>,
    state: DemuxState,
}

impl IcyDemuxer {
    /// `metaint` of `None` (or 0) means the server sends no metadata and every
    /// byte is audio.
    pub fn new(metaint: Option<usize>) -> Self {
        let metaint = metaint.filter(|&m| m > 0);
        Self {
            metaint,
            state: DemuxState::Audio {
                remaining: metaint.unwrap_or(0),
            },
        }
    }

    pub fn metaint(&self) -> Option<usize> {
        self.metaint
    }

    pub fn feed(&mut self, mut chunk: &[u8]) -> Demuxed {
        let mut out = Demuxed::default();
        let Some(metaint) = self.metaint else {
            out.audio.extend_from_slice(chunk);
            return out;
        };

        while !chunk.is_empty() {
            match &mut self.state {
                DemuxState::Audio { remaining } => {
                    let n = (*remaining).min(chunk.len());
                    out.audio.extend_from_slice(&chunk[..n]);
                    chunk = &chunk[n..];
                    *remaining -= n;
                    if *remaining == 0 {
                        self.state = DemuxState::Length;
                    }
                }
                DemuxState::Length => {
                    let len = chunk[0] as usize * 16;
                    chunk = &chunk[1..];
                    self.state = if len == 0 {
                        DemuxState::Audio { remaining: metaint }
                    } else {
                        DemuxState::Block {
                            buf: Vec::with_capacity(len),
                            remaining: len,
                        }
                    };
                }
                DemuxState::Block { buf, remaining } => {
                    let n = (*remaining).min(chunk.len());
                    buf.extend_from_slice(&chunk[..n]);
                    chunk = &chunk[n..];
                    *remaining -= n;
                    if *remaining == 0 {
                        if let Metadata::Title(title) = extract_stream_title(buf) {
                            out.titles.push(title);
                        }
                        self.state = DemuxState::Audio { remaining: metaint };
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encode a metadata block the way a server would
    fn block(text: &str) -> Vec<u8> {
        let len = text.len().div_ceil(16);
        let mut out = vec![len as u8];
        out.extend_from_slice(text.as_bytes());
        out.resize(1 + len * 16, 0);
        out
    }

    #[test]
    fn test_extract_title() {
        let raw = b"StreamTitle='Pink Floyd - Time';StreamUrl='';\0\0\0";
        assert_eq!(
            extract_stream_title(raw),
            Metadata::Title("Pink Floyd - Time".to_string())
        );
    }

    #[test]
    fn test_extract_title_with_apostrophe() {
        let raw = b"StreamTitle='Guns N' Roses - Don't Cry';";
        assert_eq!(
            extract_stream_title(raw),
            Metadata::Title("Guns N' Roses - Don't Cry".to_string())
        );
    }

    #[test]
    fn test_extract_absent() {
        assert_eq!(extract_stream_title(&[0; 32]), Metadata::Absent);
        assert_eq!(extract_stream_title(b""), Metadata::Absent);
        assert_eq!(extract_stream_title(b"StreamUrl='x';"), Metadata::Absent);
        assert_eq!(extract_stream_title(b"StreamTitle='   ';"), Metadata::Absent);
    }

    #[test]
    fn test_extract_malformed() {
        // Unterminated
        assert_eq!(
            extract_stream_title(b"StreamTitle='Live Show'\0\0"),
            Metadata::Title("Live Show".to_string())
        );
        // Invalid UTF-8 and control bytes
        assert_eq!(
            extract_stream_title(b"StreamTitle='Caf\xe9\x07 Jazz';"),
            Metadata::Title("Caf\u{fffd} Jazz".to_string())
        );
    }

    #[test]
    fn test_demux_without_metaint_passes_through() {
        let mut demux = IcyDemuxer::new(None);
        let out = demux.feed(b"abcdef");
        assert_eq!(out.audio, b"abcdef");
        assert!(out.titles.is_empty());

        assert_eq!(IcyDemuxer::new(Some(0)).metaint(), None);
    }

    #[test]
    fn test_demux_single_chunk() {
        let mut stream = b"aaaa".to_vec();
        stream.extend(block("StreamTitle='One';"));
        stream.extend(b"bbbb");
        stream.push(0); // empty block
        stream.extend(b"cc");

        let out = IcyDemuxer::new(Some(4)).feed(&stream);

        assert_eq!(out.audio, b"aaaabbbbcc");
        assert_eq!(out.titles, vec!["One".to_string()]);
    }

    #[test]
    fn test_demux_across_chunk_boundaries() {
        let mut stream = b"aaaa".to_vec();
        stream.extend(block("StreamTitle='Artist - Song';"));
        stream.extend(b"bbbb");
        stream.extend(block("StreamTitle='Next';"));

        // Feed one byte at a time
        let mut demux = IcyDemuxer::new(Some(4));
        let mut audio = Vec::new();
        let mut titles = Vec::new();
        for byte in &stream {
            let out = demux.feed(std::slice::from_ref(byte));
            audio.extend(out.audio);
            titles.extend(out.titles);
        }

        assert_eq!(audio, b"aaaabbbb");
        assert_eq!(titles, vec!["Artist - Song".to_string(), "Next".to_string()]);
    }
}
