use std::fmt;
use std::ops::{Index, IndexMut};

/// Identifies a node slot in a [`NodeArena`].
///
/// Slot indices are reused once a node is freed; the generation makes a stale id from before the
/// reuse fail lookups instead of silently naming the new occupant.
// We use u32s here under the assumption there simply won't be that many nodes in one tree, and
// so that links stay small inside the node records.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// A place to store owned node records that can be accessed by [`NodeId`], with holes being
/// re-used. Maintains a separate free list. A poor man's slot map, really, but designed to
/// allocate and access fast.
pub struct NodeArena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    size: usize,
}

impl<T> NodeArena<T> {
    pub fn new() -> Self {
        Self {
            slots: vec![],
            free_list: Vec::with_capacity(16),
            size: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Default::default(),
            size: 0,
        }
    }

    /// Store a new value. The closure receives the id the value will live under, so records
    /// that need to refer to themselves (e.g. an empty circular list) can be built in one go.
    pub fn add<F: FnOnce(NodeId) -> T>(&mut self, f: F) -> NodeId {
        let id = match self.free_list.pop() {
            None => {
                let id = NodeId {
                    index: self.slots.len() as u32,
                    generation: 0,
                };
                self.slots.push(Slot {
                    generation: 0,
                    value: Some(f(id)),
                });
                id
            }
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                let id = NodeId {
                    index,
                    generation: slot.generation,
                };
                slot.value = Some(f(id));
                id
            }
        };
        self.size += 1;
        id
    }

    /// Take the value out of its slot and release the slot for reuse. Returns `None` if the id is
    /// stale or was never handed out.
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
        self.size -= 1;
        Some(value)
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&T> {
        let slot = self.slots.get(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_mut()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Iterate over all live values, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.value.as_ref().map(|v| {
                (
                    NodeId {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    v,
                )
            })
        })
    }

    /// Iterate mutably over all live values, in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut T)> + '_ {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let generation = slot.generation;
            slot.value.as_mut().map(|v| {
                (
                    NodeId {
                        index: i as u32,
                        generation,
                    },
                    v,
                )
            })
        })
    }
}

impl<T> Index<NodeId> for NodeArena<T> {
    type Output = T;

    #[inline]
    fn index(&self, id: NodeId) -> &Self::Output {
        match self.get(id) {
            Some(v) => v,
            None => panic!("node {id:?} is not live in this arena"),
        }
    }
}

impl<T> IndexMut<NodeId> for NodeArena<T> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        match self.get_mut(id) {
            Some(v) => v,
            None => panic!("node {id:?} is not live in this arena"),
        }
    }
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
