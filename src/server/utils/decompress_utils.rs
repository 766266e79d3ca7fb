use std::io::Read;

use flate2::read::{GzDecoder, ZlibDecoder};

/// encodings the fetcher advertises upstream, anything else is passed through as is
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContentEncoding {
    Zstd,
    Gzip,
    Deflate,
    None,
}

impl ContentEncoding {
    pub fn from_header(content_encoding: Option<&str>) -> Self {
        match content_encoding.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("zstd") => Self::Zstd,
            Some("gzip") | Some("x-gzip") => Self::Gzip,
            Some("deflate") => Self::Deflate,
            _ => Self::None,
        }
    }

    /// decodes at most `limit + 1` bytes so a tiny compressed body can't balloon past the limit,
    /// the caller checks the length afterwards
    pub fn decode(&self, data: Vec<u8>, limit: usize) -> Result<Vec<u8>, std::io::Error> {
        let cap = limit as u64 + 1;
        let mut out = Vec::new();

        match self {
            Self::Zstd => {
                zstd::stream::read::Decoder::new(&data[..])?
                    .take(cap)
                    .read_to_end(&mut out)?;
            }
            Self::Gzip => {
                GzDecoder::new(&data[..]).take(cap).read_to_end(&mut out)?;
            }
            // http "deflate" is zlib wrapped
            Self::Deflate => {
                ZlibDecoder::new(&data[..]).take(cap).read_to_end(&mut out)?;
            }
            Self::None => return Ok(data),
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::{Compression, write::GzEncoder};

    use super::*;

    #[test]
    fn picks_encoding_from_header() {
        assert_eq!(ContentEncoding::from_header(Some("gzip")), ContentEncoding::Gzip);
        assert_eq!(ContentEncoding::from_header(Some(" ZSTD ")), ContentEncoding::Zstd);
        assert_eq!(ContentEncoding::from_header(Some("br")), ContentEncoding::None);
        assert_eq!(ContentEncoding::from_header(None), ContentEncoding::None);
    }

    #[test]
    fn decodes_gzip_body() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"<html>hello</html>").unwrap();
        let compressed = encoder.finish().unwrap();

        let decoded = ContentEncoding::Gzip.decode(compressed, 1024).unwrap();
        assert_eq!(decoded, b"<html>hello</html>");
    }

    #[test]
    fn stops_decoding_past_the_limit() {
        let body = vec![b'a'; 4096];
        let compressed = zstd::encode_all(&body[..], 3).unwrap();

        let decoded = ContentEncoding::Zstd.decode(compressed, 100).unwrap();
        assert_eq!(decoded.len(), 101);
    }
}
