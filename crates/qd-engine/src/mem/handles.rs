/// Slot tracker handing out stable `usize` handles.
///
/// Freed slots are reused before the backing `Vec` grows.
#[derive(Debug)]
pub struct Handles<T> {
    items: Vec<Option<T>>,
    free_list: Vec<usize>,
}

impl<T> Handles<T> {
    #[inline]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Stores `item` and returns its handle.
    pub fn track(&mut self, item: T) -> usize {
        if let Some(idx) = self.free_list.pop() {
            self.items[idx] = Some(item);
            idx
        } else {
            self.items.push(Some(item));
            self.items.len() - 1
        }
    }

    /// Releases a handle, returning the item it held.
    ///
    /// Returns `None` for unknown or already released handles.
    pub fn untrack(&mut self, idx: usize) -> Option<T> {
        let item = self.items.get_mut(idx)?.take()?;
        self.free_list.push(idx);
        Some(item)
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.items.get(idx).and_then(Option::as_ref)
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.items.len() - self.free_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Handles<T> {
    fn default() -> Self {
        Self::new()
    }
}
