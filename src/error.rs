use thiserror::Error;

/// Failures reported by the checked accessors.
///
/// The unchecked fast paths never produce these; they treat the same
/// situations as caller bugs.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("variant holds no alternative")]
    Valueless,

    #[error("variant holds alternative {active}, not {requested}")]
    WrongAlternative { requested: usize, active: usize },

    #[error("handle is empty")]
    Empty,

    #[error("observed object has already been destroyed")]
    Expired,

    #[error("failed to allocate {size} bytes aligned to {align}")]
    OutOfMemory { size: usize, align: usize },
}
