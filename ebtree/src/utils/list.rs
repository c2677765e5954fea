//! Circular doubly-linked chains threaded through arena records.
//!
//! A record alone in its chain points at itself both ways. Since links are arena ids, getting
//! from a link back to its element is the identity.

use crate::utils::arena::{NodeArena, NodeId};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChainLinks {
    pub next: NodeId,
    pub prev: NodeId,
}

impl ChainLinks {
    /// Links of a record that is alone in its chain.
    #[inline]
    pub fn alone(id: NodeId) -> Self {
        Self { next: id, prev: id }
    }
}

pub trait Chained {
    fn chain(&self) -> &ChainLinks;
    fn chain_mut(&mut self) -> &mut ChainLinks;
}

/// Make `id` a chain of its own.
#[inline]
pub fn init<T: Chained>(arena: &mut NodeArena<T>, id: NodeId) {
    *arena[id].chain_mut() = ChainLinks::alone(id);
}

/// Add `el` at the tail of the chain headed by `head`, i.e. just before `head`.
pub fn append<T: Chained>(arena: &mut NodeArena<T>, head: NodeId, el: NodeId) {
    let tail = arena[head].chain().prev;
    *arena[el].chain_mut() = ChainLinks {
        next: head,
        prev: tail,
    };
    arena[tail].chain_mut().next = el;
    arena[head].chain_mut().prev = el;
}

/// Remove `el` from whatever chain it is in, leaving it alone.
pub fn unlink<T: Chained>(arena: &mut NodeArena<T>, el: NodeId) {
    let ChainLinks { next, prev } = *arena[el].chain();
    arena[prev].chain_mut().next = next;
    arena[next].chain_mut().prev = prev;
    init(arena, el);
}

#[inline]
pub fn is_alone<T: Chained>(arena: &NodeArena<T>, id: NodeId) -> bool {
    arena[id].chain().next == id
}

#[cfg(test)]
mod tests {
    use crate::utils::arena::{NodeArena, NodeId};
    use crate::utils::list::{append, init, is_alone, unlink, ChainLinks, Chained};

    struct Rec {
        links: ChainLinks,
        tag: u32,
    }

    impl Chained for Rec {
        fn chain(&self) -> &ChainLinks {
            &self.links
        }
        fn chain_mut(&mut self) -> &mut ChainLinks {
            &mut self.links
        }
    }

    fn rec(arena: &mut NodeArena<Rec>, tag: u32) -> NodeId {
        arena.add(|id| Rec {
            links: ChainLinks::alone(id),
            tag,
        })
    }

    fn walk(arena: &NodeArena<Rec>, head: NodeId) -> Vec<u32> {
        let mut out = vec![arena[head].tag];
        let mut cur = arena[head].links.next;
        while cur != head {
            out.push(arena[cur].tag);
            cur = arena[cur].links.next;
        }
        out
    }

    #[test]
    fn test_append_keeps_order() {
        let mut arena = NodeArena::new();
        let head = rec(&mut arena, 0);
        assert!(is_alone(&arena, head));
        for tag in 1..4 {
            let el = rec(&mut arena, tag);
            append(&mut arena, head, el);
        }
        assert!(!is_alone(&arena, head));
        assert_eq!(walk(&arena, head), vec![0, 1, 2, 3]);
        // Backwards from the head reaches the tail first.
        let tail = arena[head].links.prev;
        assert_eq!(arena[tail].tag, 3);
    }

    #[test]
    fn test_unlink_middle_and_head() {
        let mut arena = NodeArena::new();
        let head = rec(&mut arena, 0);
        let a = rec(&mut arena, 1);
        let b = rec(&mut arena, 2);
        append(&mut arena, head, a);
        append(&mut arena, head, b);

        unlink(&mut arena, a);
        assert!(is_alone(&arena, a));
        assert_eq!(walk(&arena, head), vec![0, 2]);

        unlink(&mut arena, head);
        assert!(is_alone(&arena, head));
        assert!(is_alone(&arena, b));

        init(&mut arena, b);
        assert_eq!(walk(&arena, b), vec![2]);
    }
}
