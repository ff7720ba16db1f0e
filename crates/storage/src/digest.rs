//! Content hashing.
//!
//! Dedup identity is the digest of a file's bytes. Remote targets only ever
//! report digests in the algorithms they support, so the local side has to
//! hash with whatever the target's index was built with.

use crate::error::{ErrorKind, Result};
use serde::{Deserialize, Serialize};
use sha2::Digest as _;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

const READ_BUFFER_SIZE: usize = 64 * 1024;
const SHORT_DIGEST_LENGTH: usize = 8;

/// A supported content hash algorithm.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashType {
    /// MD5, the lowest common denominator for WebDAV-style remotes.
    Md5,
    /// SHA-256
    Sha256,
    /// BLAKE3, the fastest option for local and rclone-local targets.
    #[default]
    Blake3,
}
impl HashType {
    /// Name of the algorithm as understood by `rclone --hash-type` and as used
    /// for the keys of `rclone lsjson --hash` output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }

    /// Length of a hex-encoded digest of this type.
    pub fn hex_len(&self) -> usize {
        match self {
            Self::Md5 => 32,
            Self::Sha256 | Self::Blake3 => 64,
        }
    }
}
impl Display for HashType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
impl FromStr for HashType {
    type Err = crate::error::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Self::Md5,
            "sha256" | "sha-256" => Self::Sha256,
            "blake3" => Self::Blake3,
            _ => exn::bail!(ErrorKind::UnsupportedHash(s.to_string())),
        })
    }
}

/// A lowercase, hex-encoded content digest.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(String);
impl Digest {
    /// Accepts a hex digest as reported by a remote. Case is normalized;
    /// anything that isn't hex is rejected.
    pub fn from_hex(hex: impl AsRef<str>) -> Result<Self> {
        let hex = hex.as_ref().trim();
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            exn::bail!(ErrorKind::InvalidResponse(format!("not a hex digest: {hex:?}")));
        }
        Ok(Self(hex.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First few hex digits, enough to tell two files apart in a filename.
    pub fn short(&self) -> &str {
        &self.0[..SHORT_DIGEST_LENGTH.min(self.0.len())]
    }
}
impl Display for Digest {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Incremental hasher over any [`HashType`].
pub struct Hasher(State);

enum State {
    Md5(md5::Context),
    Sha256(sha2::Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl Hasher {
    pub fn new(hash_type: HashType) -> Self {
        Self(match hash_type {
            HashType::Md5 => State::Md5(md5::Context::new()),
            HashType::Sha256 => State::Sha256(sha2::Sha256::new()),
            HashType::Blake3 => State::Blake3(Box::new(blake3::Hasher::new())),
        })
    }

    pub fn update(&mut self, data: &[u8]) {
        match &mut self.0 {
            State::Md5(ctx) => ctx.consume(data),
            State::Sha256(hasher) => hasher.update(data),
            State::Blake3(hasher) => {
                hasher.update(data);
            },
        }
    }

    pub fn finalize(self) -> Digest {
        Digest(match self.0 {
            State::Md5(ctx) => format!("{:x}", ctx.compute()),
            State::Sha256(hasher) => hex::encode(hasher.finalize()),
            State::Blake3(hasher) => hasher.finalize().to_hex().to_string(),
        })
    }
}

/// Digest of an in-memory buffer.
pub fn hash_bytes(hash_type: HashType, data: &[u8]) -> Digest {
    let mut hasher = Hasher::new(hash_type);
    hasher.update(data);
    hasher.finalize()
}

/// Digest of a local file, streamed in chunks on the blocking thread pool.
///
/// Returns [`NotFound`](ErrorKind::NotFound) or
/// [`PermissionDenied`](ErrorKind::PermissionDenied) when the file can't be
/// opened; any other read failure is [`Io`](ErrorKind::Io).
#[instrument(skip_all, fields(path = %path.as_ref().display(), hash = %hash_type))]
pub async fn hash_file(path: impl AsRef<Path>, hash_type: HashType) -> Result<Digest> {
    let path = path.as_ref().to_path_buf();
    tokio::task::spawn_blocking(move || hash_file_sync(&path, hash_type))
        .await
        .map_err(|e| ErrorKind::Io(std::io::Error::other(e)))?
}

fn hash_file_sync(path: &Path, hash_type: HashType) -> Result<Digest> {
    let mut file = std::fs::File::open(path).map_err(|e| ErrorKind::from_io(e, path))?;
    let mut hasher = Hasher::new(hash_type);
    let mut buffer = vec![0; READ_BUFFER_SIZE];
    loop {
        let read = file.read(&mut buffer).map_err(ErrorKind::Io)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[rstest]
    #[case(HashType::Md5, "900150983cd24fb0d6963f7d28e17f72")]
    #[case(HashType::Sha256, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")]
    #[case(HashType::Blake3, "6437b3ac38465133ffb63b75273a8db548c558465d79db03fd359c6cd5bd9d85")]
    fn test_known_digests(#[case] hash_type: HashType, #[case] expected: &str) {
        let digest = hash_bytes(hash_type, b"abc");
        assert_eq!(digest.as_str(), expected);
        assert_eq!(digest.as_str().len(), hash_type.hex_len());
    }

    #[rstest]
    #[case("md5", HashType::Md5)]
    #[case("MD5", HashType::Md5)]
    #[case("sha256", HashType::Sha256)]
    #[case("SHA-256", HashType::Sha256)]
    #[case(" blake3 ", HashType::Blake3)]
    fn test_hash_type_from_str(#[case] input: &str, #[case] expected: HashType) {
        assert_eq!(input.parse::<HashType>().unwrap(), expected);
    }

    #[test]
    fn test_hash_type_unknown() {
        let err = "crc32".parse::<HashType>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedHash(s) if s == "crc32"));
    }

    #[test]
    fn test_digest_from_hex() {
        let digest = Digest::from_hex("900150983CD24FB0D6963F7D28E17F72").unwrap();
        assert_eq!(digest.as_str(), "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(digest.short(), "90015098");
        assert!(Digest::from_hex("").is_err());
        assert!(Digest::from_hex("not-hex").is_err());
    }

    #[test]
    fn test_chunked_matches_single_shot() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let mut hasher = Hasher::new(HashType::Md5);
        for chunk in data.chunks(4096) {
            hasher.update(chunk);
        }
        assert_eq!(hasher.finalize(), hash_bytes(HashType::Md5, &data));
    }

    #[tokio::test]
    async fn test_hash_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();
        let digest = hash_file(file.path(), HashType::Md5).await.unwrap();
        assert_eq!(digest.as_str(), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[tokio::test]
    async fn test_hash_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = hash_file(dir.path().join("DSC00001.JPG"), HashType::Blake3).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }
}
