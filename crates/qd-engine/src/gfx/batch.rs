use std::ops::Range;

use super::mesh::MeshHandle;
use super::store::MeshInst;

/// Instances of one mesh collected during a pass.
#[derive(Debug)]
struct MeshBatch {
    hnd: MeshHandle,
    insts: Vec<MeshInst>,
}

/// A run of instances assigned to one store row.
#[derive(Debug, PartialEq)]
pub(super) struct RowChunk<'a> {
    pub row: u32,
    pub hnd: MeshHandle,
    pub insts: &'a [MeshInst],
}

/// Per-mesh instance batches, sorted by handle.
///
/// Batches stay allocated across passes; only their instances are cleared.
#[derive(Debug, Default)]
pub(super) struct Batches {
    batches: Vec<MeshBatch>,
}

impl Batches {
    pub fn push(&mut self, hnd: MeshHandle, inst: MeshInst) {
        match self.batches.binary_search_by_key(&hnd, |b| b.hnd) {
            Ok(i) => self.batches[i].insts.push(inst),
            Err(i) => self.batches.insert(i, MeshBatch { hnd, insts: vec![inst] }),
        }
    }

    /// Drops batches whose mesh no longer exists.
    pub fn retain_live(&mut self, mut live: impl FnMut(MeshHandle) -> bool) {
        self.batches.retain(|b| live(b.hnd));
    }

    /// Splits batches into chunks of at most `per_row` instances, one row each.
    ///
    /// Rows are taken in order from `rows`. Returns the chunks that fit and the
    /// count of instances that did not.
    pub fn plan(&self, per_row: usize, rows: Range<u32>) -> (Vec<RowChunk<'_>>, usize) {
        let mut chunks = Vec::new();
        let mut dropped = 0;
        let mut row = rows.start;

        for batch in &self.batches {
            for insts in batch.insts.chunks(per_row.max(1)) {
                if row < rows.end {
                    chunks.push(RowChunk { row, hnd: batch.hnd, insts });
                    row += 1;
                } else {
                    dropped += insts.len();
                }
            }
        }
        (chunks, dropped)
    }

    pub fn clear(&mut self) {
        for batch in &mut self.batches {
            batch.insts.clear();
        }
    }

    /// Instances currently queued across all batches.
    pub fn len(&self) -> usize {
        self.batches.iter().map(|b| b.insts.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec4};

    use super::*;

    fn inst(layer: u32) -> MeshInst {
        MeshInst::new(Mat4::IDENTITY, Vec4::ONE, layer)
    }

    #[test]
    fn batches_sort_by_handle() {
        let mut b = Batches::default();
        b.push(MeshHandle(3), inst(0));
        b.push(MeshHandle(1), inst(1));
        b.push(MeshHandle(3), inst(2));
        b.push(MeshHandle(2), inst(3));

        let (chunks, dropped) = b.plan(16, 0..8);
        assert_eq!(dropped, 0);
        let order: Vec<u32> = chunks.iter().map(|c| c.hnd.0).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(chunks[2].insts, &[inst(0), inst(2)]);
    }

    #[test]
    fn large_batches_span_rows() {
        let mut b = Batches::default();
        for i in 0..7 {
            b.push(MeshHandle(0), inst(i));
        }
        b.push(MeshHandle(1), inst(100));

        let (chunks, _) = b.plan(3, 0..8);
        let shape: Vec<(u32, u32, usize)> =
            chunks.iter().map(|c| (c.row, c.hnd.0, c.insts.len())).collect();
        assert_eq!(shape, vec![(0, 0, 3), (1, 0, 3), (2, 0, 1), (3, 1, 1)]);
    }

    #[test]
    fn rows_beyond_capacity_are_dropped() {
        let mut b = Batches::default();
        for i in 0..10 {
            b.push(MeshHandle(0), inst(i));
        }
        let (chunks, dropped) = b.plan(4, 0..2);
        assert_eq!(chunks.len(), 2);
        assert_eq!(dropped, 2);
    }

    #[test]
    fn rows_start_after_earlier_passes() {
        let mut b = Batches::default();
        for i in 0..5 {
            b.push(MeshHandle(0), inst(i));
        }
        let (chunks, dropped) = b.plan(2, 3..8);
        let rows: Vec<u32> = chunks.iter().map(|c| c.row).collect();
        assert_eq!(rows, vec![3, 4, 5]);
        assert_eq!(dropped, 0);

        let (chunks, dropped) = b.plan(2, 7..8);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].row, 7);
        assert_eq!(dropped, 3);
    }

    #[test]
    fn exhausted_rows_drop_everything() {
        let mut b = Batches::default();
        b.push(MeshHandle(0), inst(0));
        let (chunks, dropped) = b.plan(2, 4..4);
        assert!(chunks.is_empty());
        assert_eq!(dropped, 1);
    }

    #[test]
    fn clear_keeps_batches_but_not_instances() {
        let mut b = Batches::default();
        b.push(MeshHandle(5), inst(0));
        b.clear();
        assert_eq!(b.len(), 0);
        assert!(b.plan(4, 0..4).0.is_empty());

        b.push(MeshHandle(5), inst(1));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn dead_meshes_are_pruned() {
        let mut b = Batches::default();
        b.push(MeshHandle(0), inst(0));
        b.push(MeshHandle(1), inst(0));
        b.retain_live(|h| h != MeshHandle(0));
        let (chunks, _) = b.plan(4, 0..4);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].hnd, MeshHandle(1));
    }
}
