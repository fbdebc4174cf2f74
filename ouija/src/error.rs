use std::io;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong outside of stepping. Stepping, decoding and reading memory have no
/// failure modes.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum Error {
    #[display("I/O error: {_0}")]
    Io(io::Error),
    #[display("invalid config: {_0}")]
    ParseConfig(toml::de::Error),
    #[display("could not serialize config: {_0}")]
    WriteConfig(toml::ser::Error),
    /// The thread owning the debugger has exited.
    #[from(ignore)]
    #[display("debugger session has closed")]
    SessionClosed,
}
