use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq, Clone)]
/// Fatal error types for the **xtal-repl** library.
///
/// Non-fatal conditions (no match found, an ambiguous replacement map, a
/// degenerate alignment) are not represented here: they are reported through
/// `log::warn!` and the call still returns a value, per the library's error
/// handling design.
pub enum XtalError {
    #[error("invalid replacement scheme: {0}")]
    InvalidScheme(String),
    #[error("fractional displacement outside [-2, 2] during PBC adjustment: {0}")]
    GeometricPrecondition(String),
}
