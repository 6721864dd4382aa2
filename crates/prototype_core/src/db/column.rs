//! # State Columns
//!
//! Pre-allocated, fixed-stride byte storage for a single state.
//!
//! - Row 0 is a sentinel and always zero; live rows start at 1
//! - Backed by 8-byte words so typed views of up to 8-byte alignment are sound
//! - Typed access goes through `bytemuck` casts, no raw pointer arithmetic

use std::ops::Range;

/// Fixed-capacity column of equally sized rows.
pub(crate) struct Column {
    /// Backing words. Never reallocated after creation.
    words: Box<[u64]>,
    /// Row stride in bytes.
    elem_size: usize,
    /// Total row count, sentinel included.
    rows: usize,
}

impl Column {
    /// Strictest element alignment a column can serve.
    pub(crate) const ALIGN: usize = std::mem::align_of::<u64>();

    /// Creates a zeroed column of `rows` rows, each `elem_size` bytes wide.
    #[must_use]
    pub(crate) fn new(elem_size: usize, rows: usize) -> Self {
        let len = elem_size * rows;
        let words = vec![0u64; len.div_ceil(8)].into_boxed_slice();
        Self {
            words,
            elem_size,
            rows,
        }
    }

    /// Row stride in bytes.
    #[inline]
    #[must_use]
    pub(crate) const fn elem_size(&self) -> usize {
        self.elem_size
    }

    /// The whole column as bytes.
    #[inline]
    #[must_use]
    pub(crate) fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<u64, u8>(&self.words)[..self.elem_size * self.rows]
    }

    #[inline]
    fn bytes_mut(&mut self) -> &mut [u8] {
        let len = self.elem_size * self.rows;
        &mut bytemuck::cast_slice_mut::<u64, u8>(&mut self.words)[..len]
    }

    #[inline]
    fn span(&self, rows: Range<usize>) -> Range<usize> {
        debug_assert!(rows.end <= self.rows, "row range out of bounds");
        rows.start * self.elem_size..rows.end * self.elem_size
    }

    /// Bytes of a single row.
    #[inline]
    #[must_use]
    pub(crate) fn row(&self, idx: usize) -> &[u8] {
        self.rows(idx..idx + 1)
    }

    /// Mutable bytes of a single row.
    #[inline]
    pub(crate) fn row_mut(&mut self, idx: usize) -> &mut [u8] {
        self.rows_mut(idx..idx + 1)
    }

    /// Bytes of a contiguous row range.
    #[inline]
    #[must_use]
    pub(crate) fn rows(&self, rows: Range<usize>) -> &[u8] {
        let span = self.span(rows);
        &self.bytes()[span]
    }

    /// Mutable bytes of a contiguous row range.
    #[inline]
    pub(crate) fn rows_mut(&mut self, rows: Range<usize>) -> &mut [u8] {
        let span = self.span(rows);
        &mut self.bytes_mut()[span]
    }

    /// Copies row `from` over row `to`.
    #[inline]
    pub(crate) fn copy_row(&mut self, from: usize, to: usize) {
        let src = self.span(from..from + 1);
        let dst = to * self.elem_size;
        self.bytes_mut().copy_within(src, dst);
    }

    /// Resets a row to all zero bytes.
    #[inline]
    pub(crate) fn zero_row(&mut self, idx: usize) {
        self.row_mut(idx).fill(0);
    }

    /// Row index of a byte address inside this column, if it lies on a row boundary.
    #[must_use]
    pub(crate) fn row_of_addr(&self, addr: usize) -> Option<usize> {
        let base = self.bytes().as_ptr() as usize;
        let offset = addr.checked_sub(base)?;
        if offset % self.elem_size != 0 {
            return None;
        }
        let idx = offset / self.elem_size;
        (idx < self.rows).then_some(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_starts_zeroed() {
        let column = Column::new(12, 5);
        assert_eq!(column.bytes().len(), 60);
        assert!(column.bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_copy_and_zero_row() {
        let mut column = Column::new(4, 4);
        column.row_mut(3).copy_from_slice(&[1, 2, 3, 4]);

        column.copy_row(3, 1);
        column.zero_row(3);

        assert_eq!(column.row(1), &[1, 2, 3, 4]);
        assert_eq!(column.row(3), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_typed_view_is_aligned() {
        let column = Column::new(16, 8);
        let view: &[u64] = bytemuck::cast_slice(column.rows(1..8));
        assert_eq!(view.len(), 14);
    }

    #[test]
    fn test_row_of_addr() {
        let column = Column::new(8, 4);
        let base = column.bytes().as_ptr() as usize;
        assert_eq!(column.row_of_addr(base + 16), Some(2));
        assert_eq!(column.row_of_addr(base + 17), None);
        assert_eq!(column.row_of_addr(base + 32), None);
        assert_eq!(column.row_of_addr(base.wrapping_sub(8)), None);
    }
}
