//! Alignment and framing helpers shared by parsers and builders.

use crate::error::{OscError, Result};

/// Literal that opens every bundle (`#bundle` plus NUL).
pub const BUNDLE_ID: &[u8; 8] = b"#bundle\0";

/// Bundle header: identifier + 64-bit timestamp.
pub const BUNDLE_HEADER_LEN: usize = BUNDLE_ID.len() + 8;

/// Round `offset` up to the next multiple of 4.
#[inline]
pub const fn align4(offset: usize) -> usize {
    (offset + 3) & !3
}

/// [`align4`] that reports overflow instead of wrapping.
pub(crate) fn checked_align4(offset: usize) -> Option<usize> {
    offset.checked_add(3).map(|n| n & !3)
}

/// Index of the first NUL byte at or after `from`.
pub(crate) fn find_nul(bytes: &[u8], from: usize) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|&b| b == 0)
        .map(|i| from + i)
}

/// Borrow `len` bytes at `offset`, or fail with a malformed-packet error
/// naming `what`.
pub(crate) fn slice_at<'a>(bytes: &'a [u8], offset: usize, len: usize, what: &str) -> Result<&'a [u8]> {
    offset
        .checked_add(len)
        .and_then(|end| bytes.get(offset..end))
        .ok_or_else(|| {
            OscError::malformed(format!(
                "{what} needs {len} bytes at offset {offset}, packet is {} bytes",
                bytes.len()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align4_rounds_up_only_when_needed() {
        assert_eq!(align4(0), 0);
        assert_eq!(align4(1), 4);
        assert_eq!(align4(4), 4);
        assert_eq!(align4(13), 16);
        assert_eq!(align4(14), 16);
        assert_eq!(align4(16), 16);
    }

    #[test]
    fn checked_align4_reports_overflow() {
        assert_eq!(checked_align4(13), Some(16));
        assert_eq!(checked_align4(usize::MAX - 3), Some(usize::MAX - 3));
        assert_eq!(checked_align4(usize::MAX - 2), None);
    }

    #[test]
    fn find_nul_respects_start() {
        let b = b"/a\0\0,i\0\0";
        assert_eq!(find_nul(b, 0), Some(2));
        assert_eq!(find_nul(b, 4), Some(6));
        assert_eq!(find_nul(b"abc", 0), None);
        assert_eq!(find_nul(b"abc", 9), None);
    }

    #[test]
    fn slice_at_rejects_overflowing_ranges() {
        let b = [0u8; 8];
        assert!(slice_at(&b, 4, 4, "x").is_ok());
        assert!(slice_at(&b, 5, 4, "x").is_err());
        assert!(slice_at(&b, usize::MAX, 2, "x").is_err());
    }
}
