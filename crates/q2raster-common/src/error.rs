use thiserror::Error;

/// Failure modes for decoding an MD2 model or a PCX skin.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unsupported MD2 file: magic/version mismatch")]
    UnsupportedMd2,

    #[error("truncated MD2 file: read past end of buffer")]
    TruncatedMd2,

    #[error("unsupported PCX file: header fields outside the decodable subset")]
    UnsupportedPcx,

    #[error("truncated PCX file: RLE stream exhausted before expected pixel count")]
    TruncatedPcx,

    #[error("face references vertex or texcoord index {index} outside table of size {len}")]
    IndexOutOfRange { index: usize, len: usize },
}
