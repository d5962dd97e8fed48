use std::num::NonZeroU32;
use std::marker::PhantomData;
use std::hash::{Hash, Hasher};
use std::ops::{Index, IndexMut};
use std::fmt::{Debug, Formatter};

/// Typed index into an [`IdArena`]. `Option<Id<T>>` is the same size as `Id<T>`.
pub struct Id<T> {
    idx: NonZeroU32,
    _ty: PhantomData<T>
}

// #[derive] bug means we have to impl these manually because of PhantomData
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.idx == other.idx
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.idx.hash(state)
    }
}

impl<T> Debug for Id<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.idx.fmt(f)
    }
}

impl<T> Id<T> {
    fn idx(&self) -> usize {
        self.idx.get() as usize - 1
    }
}

/// Append-only storage. Items are never removed, so every `Id` handed out stays valid for the
/// lifetime of the arena.
pub struct IdArena<T> {
    items: Vec<T>,
}

impl<T> Default for IdArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IdArena<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
        }
    }

    pub fn insert(&mut self, item: T) -> Id<T> {
        self.items.push(item);
        let idx = NonZeroU32::new(self.items.len() as u32)
            .expect("arena length overflowed u32");
        Id {
            idx,
            _ty: PhantomData
        }
    }

    pub fn get(&self, id: Id<T>) -> &T {
        &self.items[id.idx()]
    }

    pub fn get_mut(&mut self, id: Id<T>) -> &mut T {
        &mut self.items[id.idx()]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T> Index<Id<T>> for IdArena<T> {
    type Output = T;

    fn index(&self, index: Id<T>) -> &Self::Output {
        self.get(index)
    }
}

impl<T> IndexMut<Id<T>> for IdArena<T> {
    fn index_mut(&mut self, index: Id<T>) -> &mut Self::Output {
        self.get_mut(index)
    }
}
