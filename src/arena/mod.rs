//! Growable slot arena with id recycling.
//!
//! Both the trie and the automaton address their nodes (and their word-id
//! table) through integer handles into an [`Arena`]. Released handles go
//! onto a LIFO free stack and are handed back out before the arena grows,
//! so slot memory is reused and ids stay dense.

use crate::error::Error;

/// Sentinel id meaning "no node" (root parent, non-terminal value, ...).
pub const INVALID_ID: u32 = u32::MAX;

#[derive(Debug, Clone)]
enum Slot<T> {
    Occupied(T),
    Vacant,
}

/// Indexed storage with a LIFO free list.
///
/// Accessing a vacant (released) slot fails with
/// [`Error::InvalidHandle`]; an id past the end of the arena fails with
/// [`Error::OutOfRange`]. The two are deliberately distinct so callers
/// can tell a stale handle from garbage.
#[derive(Debug, Clone, Default)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Arena<T> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Arena {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Store `value`, returning its id.
    ///
    /// The most recently released id is reused first; once the free
    /// stack drains, ids continue from the high-water mark.
    pub fn allocate(&mut self, value: T) -> u32 {
        self.live += 1;
        match self.free.pop() {
            Some(id) => {
                self.slots[id as usize] = Slot::Occupied(value);
                id
            }
            None => {
                self.slots.push(Slot::Occupied(value));
                (self.slots.len() - 1) as u32
            }
        }
    }

    /// Release `id` back to the free stack, returning its content.
    pub fn release(&mut self, id: u32) -> Result<T, Error> {
        let len = self.slots.len();
        let slot = self.slots.get_mut(id as usize).ok_or(Error::OutOfRange {
            index: id as usize,
            len,
        })?;
        match std::mem::replace(slot, Slot::Vacant) {
            Slot::Occupied(value) => {
                self.free.push(id);
                self.live -= 1;
                Ok(value)
            }
            Slot::Vacant => Err(Error::InvalidHandle(id)),
        }
    }

    /// Borrow the entry at `id`.
    pub fn get(&self, id: u32) -> Result<&T, Error> {
        match self.slots.get(id as usize) {
            Some(Slot::Occupied(value)) => Ok(value),
            Some(Slot::Vacant) => Err(Error::InvalidHandle(id)),
            None => Err(Error::OutOfRange {
                index: id as usize,
                len: self.slots.len(),
            }),
        }
    }

    /// Mutably borrow the entry at `id`.
    pub fn get_mut(&mut self, id: u32) -> Result<&mut T, Error> {
        let len = self.slots.len();
        match self.slots.get_mut(id as usize) {
            Some(Slot::Occupied(value)) => Ok(value),
            Some(Slot::Vacant) => Err(Error::InvalidHandle(id)),
            None => Err(Error::OutOfRange {
                index: id as usize,
                len,
            }),
        }
    }

    /// Total number of slots, vacant ones included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn live(&self) -> usize {
        self.live
    }

    /// True when no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// The free stack, bottom first. The next allocation pops the back.
    pub fn free_list(&self) -> &[u32] {
        &self.free
    }

    /// Iterate over all slots in id order; vacant slots yield `None`.
    pub fn slots(&self) -> impl Iterator<Item = Option<&T>> {
        self.slots.iter().map(|slot| match slot {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant => None,
        })
    }

    /// Rebuild an arena from decoded slots and a free stack.
    pub(crate) fn from_parts(slots: Vec<Option<T>>, free: Vec<u32>) -> Self {
        let live = slots.iter().filter(|s| s.is_some()).count();
        Arena {
            slots: slots
                .into_iter()
                .map(|s| match s {
                    Some(value) => Slot::Occupied(value),
                    None => Slot::Vacant,
                })
                .collect(),
            free,
            live,
        }
    }
}

impl<T> std::ops::Index<u32> for Arena<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `id` is out of range or vacant. Internal callers index
    /// only with ids they just allocated or walked to.
    fn index(&self, id: u32) -> &T {
        match &self.slots[id as usize] {
            Slot::Occupied(value) => value,
            Slot::Vacant => panic!("arena id {id} is vacant"),
        }
    }
}

impl<T> std::ops::IndexMut<u32> for Arena<T> {
    fn index_mut(&mut self, id: u32) -> &mut T {
        match &mut self.slots[id as usize] {
            Slot::Occupied(value) => value,
            Slot::Vacant => panic!("arena id {id} is vacant"),
        }
    }
}
