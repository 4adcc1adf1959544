use std::ops::Range;

/// Binary buddy allocator over `0..capacity` elements.
///
/// Every allocation is rounded up to a power of two no smaller than the minimum
/// block. Freed blocks merge with their buddy whenever the buddy is also free.
#[derive(Debug, Clone)]
pub struct BuddyAlloc {
    min_order: u32,
    max_order: u32,
    // free_lists[order] holds start offsets of free blocks of size 2^order.
    free_lists: Vec<Vec<usize>>,
}

impl BuddyAlloc {
    /// Creates an allocator spanning `size` elements (rounded up to a power of two).
    pub fn new(size: usize, min_block: usize) -> Self {
        let max_order = size.max(1).next_power_of_two().trailing_zeros();
        let min_order = min_block
            .max(1)
            .next_power_of_two()
            .trailing_zeros()
            .min(max_order);

        let mut free_lists = vec![Vec::new(); max_order as usize + 1];
        free_lists[max_order as usize].push(0);

        Self {
            min_order,
            max_order,
            free_lists,
        }
    }

    /// Total span in elements.
    #[inline]
    pub fn capacity(&self) -> usize {
        1 << self.max_order
    }

    /// Block size actually reserved for a request of `len` elements.
    #[inline]
    pub fn block_size(&self, len: usize) -> usize {
        1 << self.order_for(len)
    }

    fn order_for(&self, len: usize) -> u32 {
        len.max(1)
            .next_power_of_two()
            .trailing_zeros()
            .max(self.min_order)
    }

    /// Reserves a block holding at least `len` elements.
    ///
    /// The returned range covers the whole block, which may exceed `len`.
    pub fn alloc(&mut self, len: usize) -> Option<Range<usize>> {
        let order = self.order_for(len);
        if order > self.max_order {
            return None;
        }

        let found = (order..=self.max_order)
            .find(|&o| !self.free_lists[o as usize].is_empty())?;
        let offset = self.free_lists[found as usize].pop()?;

        // Split down to the requested order, keeping the low half each time.
        for split in (order..found).rev() {
            self.free_lists[split as usize].push(offset + (1 << split));
        }

        Some(offset..offset + (1 << order))
    }

    /// Returns a block previously handed out by [`alloc`](Self::alloc).
    pub fn free(&mut self, block: Range<usize>) {
        let mut order = self.order_for(block.len());
        let mut offset = block.start;

        while order < self.max_order {
            let buddy = offset ^ (1 << order);
            let list = &mut self.free_lists[order as usize];
            let Some(pos) = list.iter().position(|&o| o == buddy) else { break };
            list.swap_remove(pos);
            offset = offset.min(buddy);
            order += 1;
        }

        self.free_lists[order as usize].push(offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_up_to_min_block() {
        let mut a = BuddyAlloc::new(1024, 16);
        let r = a.alloc(3).unwrap();
        assert_eq!(r.len(), 16);
        assert_eq!(a.block_size(3), 16);
        assert_eq!(a.block_size(17), 32);
    }

    #[test]
    fn capacity_is_power_of_two() {
        assert_eq!(BuddyAlloc::new(1000, 1).capacity(), 1024);
        assert_eq!(BuddyAlloc::new(0, 1).capacity(), 1);
    }

    #[test]
    fn allocations_do_not_overlap() {
        let mut a = BuddyAlloc::new(256, 8);
        let mut ranges: Vec<Range<usize>> = (0..10).map(|i| a.alloc(5 + i).unwrap()).collect();
        ranges.sort_by_key(|r| r.start);
        for pair in ranges.windows(2) {
            assert!(pair[0].end <= pair[1].start, "{:?} overlaps {:?}", pair[0], pair[1]);
        }
        assert!(ranges.iter().all(|r| r.end <= 256));
    }

    #[test]
    fn exhausts_and_reports_none() {
        let mut a = BuddyAlloc::new(64, 16);
        for _ in 0..4 {
            assert!(a.alloc(16).is_some());
        }
        assert!(a.alloc(1).is_none());
    }

    #[test]
    fn oversized_request_fails() {
        let mut a = BuddyAlloc::new(64, 1);
        assert!(a.alloc(65).is_none());
        assert_eq!(a.alloc(64), Some(0..64));
    }

    #[test]
    fn free_merges_buddies_back_to_full_span() {
        let mut a = BuddyAlloc::new(128, 16);
        let blocks: Vec<_> = (0..8).map(|_| a.alloc(16).unwrap()).collect();
        assert!(a.alloc(16).is_none());

        for b in blocks {
            a.free(b);
        }

        // Fully merged: the whole span is available again.
        assert_eq!(a.alloc(128), Some(0..128));
    }

    #[test]
    fn partial_free_allows_reuse() {
        let mut a = BuddyAlloc::new(64, 16);
        let x = a.alloc(16).unwrap();
        let _y = a.alloc(16).unwrap();
        let _z = a.alloc(32).unwrap();
        assert!(a.alloc(16).is_none());

        a.free(x.clone());
        assert_eq!(a.alloc(16), Some(x));
    }
}
