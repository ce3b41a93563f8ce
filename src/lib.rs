pub mod huffman;
pub mod container;

type DYNERR = Box<dyn std::error::Error>;

/// Codec Errors
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("empty frequency map")]
    InvalidInput,
    #[error("symbol missing from code table")]
    Encoding,
    #[error("malformed or truncated payload")]
    Decoding,
    #[error("file format mismatch")]
    FileFormatMismatch
}

/// Options controlling compression
pub struct Options {
    /// whether to include the magic header
    pub header: bool,
    /// starting position in the input file
    pub in_offset: u64,
    /// starting position in the output file
    pub out_offset: u64
}

pub const STD_OPTIONS: Options = Options {
    header: true,
    in_offset: 0,
    out_offset: 0
};
