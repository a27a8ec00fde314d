use std::collections::HashMap;
use std::hash::Hash;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 同一性を判定するキーを持つ要素。
/// OrderedSet はこのキーで重複を判定する。
pub trait Keyed {
    type Key: Eq + Hash + Clone + std::fmt::Debug;

    fn key(&self) -> Self::Key;
}

/// 挿入順を保持する集合。
///
/// 要素はキーで一意。`index_of` はキー→位置の副インデックスで O(1)。
/// `get_mut` / `IndexMut` 経由の変更で要素のキーを変えてはならない。
#[derive(Debug, Clone)]
pub struct OrderedSet<T: Keyed> {
    items: Vec<T>,
    positions: HashMap<T::Key, usize>,
}

impl<T: Keyed> Default for OrderedSet<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<T: Keyed> OrderedSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 末尾に追加する。同じキーの要素が既にあれば何もせず false。
    pub fn append(&mut self, item: T) -> bool {
        let key = item.key();
        if self.positions.contains_key(&key) {
            return false;
        }
        self.positions.insert(key, self.items.len());
        self.items.push(item);
        true
    }

    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.index_of_key(&item.key())
    }

    pub fn index_of_key(&self, key: &T::Key) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.index_of(item).is_some()
    }

    /// 同じキーの要素を取り除いて返す。後続の位置は1つずつ詰まる。
    pub fn remove(&mut self, item: &T) -> Option<T> {
        self.remove_key(&item.key())
    }

    pub fn remove_key(&mut self, key: &T::Key) -> Option<T> {
        let index = self.positions.remove(key)?;
        let removed = self.items.remove(index);
        for shifted in &self.items[index..] {
            if let Some(pos) = self.positions.get_mut(&shifted.key()) {
                *pos -= 1;
            }
        }
        Some(removed)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T: Keyed> Index<usize> for OrderedSet<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<T: Keyed> IndexMut<usize> for OrderedSet<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.items[index]
    }
}

impl<'a, T: Keyed> IntoIterator for &'a OrderedSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// キーが重複する要素は最初の1つだけ残る。
impl<T: Keyed> FromIterator<T> for OrderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for item in iter {
            set.append(item);
        }
        set
    }
}

impl<T: Keyed + PartialEq> PartialEq for OrderedSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

// 永続化形式は単純な配列。副インデックスは読み込み時に再構築する。
impl<T: Keyed + Serialize> Serialize for OrderedSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.items)
    }
}

impl<'de, T: Keyed + Deserialize<'de>> Deserialize<'de> for OrderedSet<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        Ok(items.into_iter().collect())
    }
}
