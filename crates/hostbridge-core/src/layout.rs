//! `#[repr(C)]` layout computation for flat structs.

/// Incrementally computes C-compatible field offsets.
///
/// Each field is placed at the next offset aligned to its own alignment;
/// the final size is rounded up to the largest field alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutBuilder {
    offset: u32,
    align: u32,
}

impl Default for LayoutBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self { offset: 0, align: 1 }
    }

    /// Place a field and return its offset.
    pub fn push(&mut self, size: u32, align: u32) -> u32 {
        let align = align.max(1);
        let offset = align_to(self.offset, align);
        self.offset = offset + size;
        self.align = self.align.max(align);
        offset
    }

    /// Final `(size, align)` of the struct.
    pub fn finish(self) -> (u32, u32) {
        (align_to(self.offset, self.align), self.align)
    }
}

/// Round `offset` up to a multiple of `align` (`align` must be non-zero).
pub const fn align_to(offset: u32, align: u32) -> u32 {
    offset.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_floats() {
        let mut b = LayoutBuilder::new();
        assert_eq!(b.push(4, 4), 0);
        assert_eq!(b.push(4, 4), 4);
        assert_eq!(b.push(4, 4), 8);
        assert_eq!(b.finish(), (12, 4));
    }

    #[test]
    fn padding_between_and_after() {
        let mut b = LayoutBuilder::new();
        assert_eq!(b.push(1, 1), 0);
        assert_eq!(b.push(8, 8), 8);
        assert_eq!(b.push(2, 2), 16);
        assert_eq!(b.finish(), (24, 8));
    }

    #[test]
    fn empty_struct() {
        assert_eq!(LayoutBuilder::new().finish(), (0, 1));
    }
}
