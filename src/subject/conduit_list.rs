use smallvec::SmallVec;

/// The conduits of one producer, in registration order.
///
/// Each conduit is stored under a slot number handed out by
/// [`reserve_slot`](ConduitList::reserve_slot), so a conduit can learn its
/// slot before it is built and later remove itself by it.
///
/// Inline storage covers the common case of one or two subscribers.
pub(crate) struct ConduitList<C> {
  next_slot: usize,
  items: SmallVec<[(usize, C); 2]>,
}

pub(crate) type Snapshot<C> = SmallVec<[C; 2]>;

impl<C> Default for ConduitList<C> {
  fn default() -> Self { Self { next_slot: 0, items: SmallVec::new() } }
}

impl<C> ConduitList<C> {
  #[inline]
  pub(crate) fn reserve_slot(&mut self) -> usize {
    let slot = self.next_slot;
    self.next_slot += 1;
    slot
  }

  /// Append under a slot obtained from `reserve_slot`.
  #[inline]
  pub(crate) fn insert(&mut self, slot: usize, conduit: C) { self.items.push((slot, conduit)); }

  pub(crate) fn remove(&mut self, slot: usize) -> Option<C> {
    self
      .items
      .iter()
      .position(|(s, _)| *s == slot)
      .map(|pos| self.items.remove(pos).1)
  }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.items.len() }

  #[inline]
  pub(crate) fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Remove every conduit, leaving the list empty.
  pub(crate) fn take(&mut self) -> Snapshot<C> { self.items.drain(..).map(|(_, c)| c).collect() }
}

impl<C: Clone> ConduitList<C> {
  /// Copy of the current conduits, to iterate without holding the owner's
  /// lock.
  pub(crate) fn snapshot(&self) -> Snapshot<C> {
    self.items.iter().map(|(_, c)| c.clone()).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxcombine_macro::test]
  fn keeps_registration_order() {
    let mut list = ConduitList::default();
    for name in ["a", "b", "c"] {
      let slot = list.reserve_slot();
      list.insert(slot, name);
    }
    assert_eq!(list.snapshot().as_slice(), ["a", "b", "c"]);
  }

  #[rxcombine_macro::test]
  fn removes_by_slot() {
    let mut list = ConduitList::default();
    let a = list.reserve_slot();
    let b = list.reserve_slot();
    list.insert(a, 'a');
    list.insert(b, 'b');
    assert_eq!(list.remove(a), Some('a'));
    assert_eq!(list.remove(a), None);
    assert_eq!(list.len(), 1);
    assert_eq!(list.snapshot().as_slice(), ['b']);
  }

  #[rxcombine_macro::test]
  fn slots_are_never_reused() {
    let mut list = ConduitList::default();
    let a = list.reserve_slot();
    list.insert(a, ());
    list.remove(a);
    assert_ne!(list.reserve_slot(), a);
  }

  #[rxcombine_macro::test]
  fn take_empties_the_list() {
    let mut list = ConduitList::default();
    let slot = list.reserve_slot();
    list.insert(slot, 1);
    assert_eq!(list.take().into_vec(), vec![1]);
    assert!(list.is_empty());
  }
}
