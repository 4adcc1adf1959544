use std::fmt;

/// Recoverable renderer failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GfxError {
    /// No contiguous vertex range of the requested size is free.
    OutOfVertexSpace { requested: usize },
    /// No contiguous index range of the requested size is free.
    OutOfIndexSpace { requested: usize },
    /// Every texture-array layer is in use.
    OutOfTextureSpace,
    /// Handle does not refer to a live resource.
    InvalidHandle { kind: &'static str, hnd: u32 },
    /// Upload length does not match what the destination holds.
    SizeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    /// Settings cannot be satisfied by the device.
    InvalidSettings(String),
}

impl fmt::Display for GfxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GfxError::OutOfVertexSpace { requested } => {
                write!(f, "out of contiguous vertex space ({requested} vertices requested)")
            }
            GfxError::OutOfIndexSpace { requested } => {
                write!(f, "out of contiguous index space ({requested} indices requested)")
            }
            GfxError::OutOfTextureSpace => write!(f, "out of texture layers"),
            GfxError::InvalidHandle { kind, hnd } => write!(f, "invalid {kind} handle {hnd}"),
            GfxError::SizeMismatch { what, expected, got } => {
                write!(f, "{what}: expected {expected}, got {got}")
            }
            GfxError::InvalidSettings(msg) => write!(f, "invalid gfx settings: {msg}"),
        }
    }
}

impl std::error::Error for GfxError {}

pub type Result<T> = std::result::Result<T, GfxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_resource() {
        let e = GfxError::InvalidHandle { kind: "mesh", hnd: 4 };
        assert_eq!(e.to_string(), "invalid mesh handle 4");

        let e = GfxError::SizeMismatch { what: "texture texels", expected: 16, got: 9 };
        assert_eq!(e.to_string(), "texture texels: expected 16, got 9");
    }

    #[test]
    fn converts_into_anyhow() {
        let e: anyhow::Error = GfxError::OutOfTextureSpace.into();
        assert_eq!(format!("{e}"), "out of texture layers");
    }
}
