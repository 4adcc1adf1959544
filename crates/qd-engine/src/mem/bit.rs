/// Fixed-capacity single-slot allocator backed by a bitmap.
///
/// Recently freed slots are handed out first.
#[derive(Debug, Clone)]
pub struct BitAlloc {
    words: Vec<u64>,
    capacity: usize,
    used: usize,
    free_list: Vec<usize>,
}

impl BitAlloc {
    const BITS: usize = u64::BITS as usize;

    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(Self::BITS)],
            capacity,
            used: 0,
            free_list: Vec::new(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of allocated slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.used
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    #[inline]
    pub fn is_set(&self, idx: usize) -> bool {
        idx < self.capacity && self.words[idx / Self::BITS] & (1 << (idx % Self::BITS)) != 0
    }

    /// Reserves a free slot, or `None` when all `capacity` slots are taken.
    pub fn alloc(&mut self) -> Option<usize> {
        let idx = match self.free_list.pop() {
            Some(idx) => idx,
            None => self.first_clear()?,
        };
        self.words[idx / Self::BITS] |= 1 << (idx % Self::BITS);
        self.used += 1;
        Some(idx)
    }

    /// Releases `idx`. Releasing a slot that is not allocated is a no-op.
    pub fn free(&mut self, idx: usize) {
        if !self.is_set(idx) {
            return;
        }
        self.words[idx / Self::BITS] &= !(1 << (idx % Self::BITS));
        self.used -= 1;
        self.free_list.push(idx);
    }

    fn first_clear(&self) -> Option<usize> {
        self.words
            .iter()
            .enumerate()
            .find(|(_, w)| **w != u64::MAX)
            .map(|(i, w)| i * Self::BITS + w.trailing_ones() as usize)
            .filter(|&idx| idx < self.capacity)
    }
}
