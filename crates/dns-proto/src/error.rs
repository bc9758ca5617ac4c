use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DnsError {
    #[error("Message truncated at offset {offset}: needed {needed} more bytes")]
    Truncated { offset: usize, needed: usize },
    #[error("Label too long: {0} bytes")]
    LabelTooLong(usize),
    #[error("Empty label in name: {0:?}")]
    EmptyLabel(String),
    #[error("Name too long: {0} bytes")]
    NameTooLong(usize),
    #[error("Compressed name at offset {0} not supported")]
    CompressionNotSupported(usize),
    #[error("Label is not valid UTF-8")]
    InvalidLabel,
    #[error("Too many records in section: {0}")]
    TooManyRecords(usize),
    #[error("Record data too long: {0} bytes")]
    RecordDataTooLong(usize),
}
