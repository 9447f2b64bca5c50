use std::{cmp::Ordering, fmt::Debug};

use crate::{
    storage::index::{Entries, OrderedIndex},
    types::{
        DEFAULT_BTREE_ORDER,
        error::{DatabaseError, Result},
    },
};

/// In-memory B-tree of order `m`: every node holds at most `m - 1` items and
/// every internal node holds exactly one more child than items.
#[derive(Debug, Clone)]
pub struct BTree<K, V> {
    order: usize,
    root: Option<Node<K, V>>,
    len: usize,
}

#[derive(Debug, Clone)]
struct Node<K, V> {
    items: Vec<(K, V)>,
    children: Vec<Node<K, V>>,
}

enum Insertion<K, V> {
    Replaced,
    Inserted,
    Split((K, V), Node<K, V>),
}

impl<K, V> Node<K, V> {
    fn leaf(items: Vec<(K, V)>) -> Self {
        Self {
            items,
            children: Vec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl<K: Ord, V> Node<K, V> {
    fn search(&self, key: &K) -> std::result::Result<usize, usize> {
        self.items.binary_search_by(|(k, _)| k.cmp(key))
    }

    /// Splits an overfull node at its middle item. `self` keeps the left half.
    fn split(&mut self) -> ((K, V), Node<K, V>) {
        let mid = self.items.len() / 2;
        let right_items = self.items.split_off(mid + 1);
        let right_children = if self.is_leaf() {
            Vec::new()
        } else {
            self.children.split_off(mid + 1)
        };
        // split_off left exactly mid + 1 items behind
        let middle = self.items.remove(mid);
        (
            middle,
            Node {
                items: right_items,
                children: right_children,
            },
        )
    }
}

impl<K: Ord, V> Default for BTree<K, V> {
    fn default() -> Self {
        Self {
            order: DEFAULT_BTREE_ORDER,
            root: None,
            len: 0,
        }
    }
}

impl<K: Ord, V> BTree<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(order: usize) -> Result<Self> {
        if order < 3 {
            return Err(DatabaseError::InvalidConfig {
                reason: format!("B-tree order must be at least 3, got {}", order),
            });
        }
        Ok(Self {
            order,
            root: None,
            len: 0,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn min_items(&self) -> usize {
        (self.order - 1) / 2
    }

    /// Number of levels, 0 for an empty tree.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut node = self.root.as_ref();
        while let Some(n) = node {
            height += 1;
            node = n.children.first();
        }
        height
    }

    pub fn insert(&mut self, key: K, value: V) {
        let order = self.order;
        let Some(root) = self.root.as_mut() else {
            self.root = Some(Node::leaf(vec![(key, value)]));
            self.len = 1;
            return;
        };

        match Self::insert_into(root, key, value, order) {
            Insertion::Replaced => {}
            Insertion::Inserted => self.len += 1,
            Insertion::Split(middle, right) => {
                self.len += 1;
                if let Some(left) = self.root.take() {
                    self.root = Some(Node {
                        items: vec![middle],
                        children: vec![left, right],
                    });
                }
            }
        }
    }

    fn insert_into(node: &mut Node<K, V>, key: K, value: V, order: usize) -> Insertion<K, V> {
        match node.search(&key) {
            Ok(i) => {
                node.items[i].1 = value;
                Insertion::Replaced
            }
            Err(i) => {
                if node.is_leaf() {
                    node.items.insert(i, (key, value));
                } else {
                    match Self::insert_into(&mut node.children[i], key, value, order) {
                        Insertion::Split(middle, right) => {
                            node.items.insert(i, middle);
                            node.children.insert(i + 1, right);
                        }
                        done => return done,
                    }
                }

                if node.items.len() >= order {
                    let (middle, right) = node.split();
                    Insertion::Split(middle, right)
                } else {
                    Insertion::Inserted
                }
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let mut node = self.root.as_ref()?;
        loop {
            match node.search(key) {
                Ok(i) => return Some(&node.items[i].1),
                Err(i) => node = node.children.get(i)?,
            }
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Removes `key`, returning its value. An absent key leaves the tree untouched.
    pub fn remove(&mut self, key: &K) -> Result<Option<V>> {
        let min = self.min_items();
        let Some(root) = self.root.as_mut() else {
            return Ok(None);
        };

        let Some((_, value)) = Self::remove_from(root, key, min)? else {
            return Ok(None);
        };
        self.len -= 1;

        if root.items.is_empty() {
            self.root = if root.is_leaf() {
                None
            } else {
                root.children.pop()
            };
        }
        Ok(Some(value))
    }

    fn remove_from(node: &mut Node<K, V>, key: &K, min: usize) -> Result<Option<(K, V)>> {
        match node.search(key) {
            Ok(i) if node.is_leaf() => Ok(Some(node.items.remove(i))),
            Ok(i) => {
                let predecessor = Self::remove_max(&mut node.children[i], min)?;
                let removed = std::mem::replace(&mut node.items[i], predecessor);
                Self::fix_child(node, i, min);
                Ok(Some(removed))
            }
            Err(_) if node.is_leaf() => Ok(None),
            Err(i) => {
                let Some(removed) = Self::remove_from(&mut node.children[i], key, min)? else {
                    return Ok(None);
                };
                Self::fix_child(node, i, min);
                Ok(Some(removed))
            }
        }
    }

    fn remove_max(node: &mut Node<K, V>, min: usize) -> Result<(K, V)> {
        if node.is_leaf() {
            return node.items.pop().ok_or_else(|| DatabaseError::CorruptedIndex {
                reason: "empty non-root node".to_string(),
            });
        }
        let last = node.children.len() - 1;
        let item = Self::remove_max(&mut node.children[last], min)?;
        Self::fix_child(node, last, min);
        Ok(item)
    }

    /// Restores the minimum fill of `node.children[i]` by rotating an item in
    /// from a sibling, or merging with one when neither can spare an item.
    fn fix_child(node: &mut Node<K, V>, i: usize, min: usize) {
        if node.children[i].items.len() >= min {
            return;
        }

        if i > 0 && node.children[i - 1].items.len() > min {
            Self::rotate_right(node, i);
        } else if i + 1 < node.children.len() && node.children[i + 1].items.len() > min {
            Self::rotate_left(node, i);
        } else if i > 0 {
            Self::merge(node, i - 1);
        } else {
            Self::merge(node, i);
        }
    }

    /// Moves the last item of the left sibling up and the separator down into `children[i]`.
    fn rotate_right(node: &mut Node<K, V>, i: usize) {
        let (left, right) = node.children.split_at_mut(i);
        let sibling = &mut left[i - 1];
        let child = &mut right[0];

        if let Some(borrowed) = sibling.items.pop() {
            let separator = std::mem::replace(&mut node.items[i - 1], borrowed);
            child.items.insert(0, separator);
        }
        if let Some(grandchild) = sibling.children.pop() {
            child.children.insert(0, grandchild);
        }
    }

    /// Moves the first item of the right sibling up and the separator down into `children[i]`.
    fn rotate_left(node: &mut Node<K, V>, i: usize) {
        let (left, right) = node.children.split_at_mut(i + 1);
        let child = &mut left[i];
        let sibling = &mut right[0];

        let borrowed = sibling.items.remove(0);
        let separator = std::mem::replace(&mut node.items[i], borrowed);
        child.items.push(separator);
        if !sibling.is_leaf() {
            child.children.push(sibling.children.remove(0));
        }
    }

    /// Folds `children[i + 1]` and the separator between them into `children[i]`.
    fn merge(node: &mut Node<K, V>, i: usize) {
        let right = node.children.remove(i + 1);
        let separator = node.items.remove(i);
        let left = &mut node.children[i];
        left.items.push(separator);
        left.items.extend(right.items);
        left.children.extend(right.children);
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter {
            stack: Vec::new(),
            remaining: self.len,
        };
        if let Some(root) = &self.root {
            iter.descend(root);
        }
        iter
    }

    /// Checks every structural invariant and reports the first violation.
    pub fn verify(&self) -> Result<()>
    where
        K: Debug,
    {
        let Some(root) = &self.root else {
            return if self.len == 0 {
                Ok(())
            } else {
                Err(corrupted(format!("empty tree claims {} entries", self.len)))
            };
        };

        let mut leaf_depth = None;
        let count = self.verify_node(root, None, None, 0, true, &mut leaf_depth)?;
        if count != self.len {
            return Err(corrupted(format!(
                "tree holds {} entries but claims {}",
                count, self.len
            )));
        }
        Ok(())
    }

    fn verify_node(
        &self,
        node: &Node<K, V>,
        lower: Option<&K>,
        upper: Option<&K>,
        depth: usize,
        is_root: bool,
        leaf_depth: &mut Option<usize>,
    ) -> Result<usize>
    where
        K: Debug,
    {
        let len = node.items.len();
        if len >= self.order {
            return Err(corrupted(format!("node holds {} items at order {}", len, self.order)));
        }
        if len == 0 || (!is_root && len < self.min_items()) {
            return Err(corrupted(format!("node underflow with {} items", len)));
        }
        for pair in node.items.windows(2) {
            if pair[0].0.cmp(&pair[1].0) != Ordering::Less {
                return Err(corrupted(format!("keys out of order: {:?}", pair[1].0)));
            }
        }
        for (key, _) in &node.items {
            if lower.is_some_and(|l| key <= l) || upper.is_some_and(|u| key >= u) {
                return Err(corrupted(format!("key {:?} outside its subtree bounds", key)));
            }
        }

        if node.is_leaf() {
            match leaf_depth {
                Some(expected) if *expected != depth => {
                    return Err(corrupted(format!(
                        "leaf at depth {} but another at depth {}",
                        depth, expected
                    )));
                }
                _ => *leaf_depth = Some(depth),
            }
            return Ok(len);
        }

        if node.children.len() != len + 1 {
            return Err(corrupted(format!(
                "internal node with {} items has {} children",
                len,
                node.children.len()
            )));
        }
        let mut count = len;
        for (i, child) in node.children.iter().enumerate() {
            let lo = if i == 0 { lower } else { Some(&node.items[i - 1].0) };
            let hi = if i == len { upper } else { Some(&node.items[i].0) };
            count += self.verify_node(child, lo, hi, depth + 1, false, leaf_depth)?;
        }
        Ok(count)
    }
}

fn corrupted(reason: String) -> DatabaseError {
    DatabaseError::CorruptedIndex { reason }
}

/// In-order iterator over a [`BTree`].
pub struct Iter<'a, K, V> {
    stack: Vec<(&'a Node<K, V>, usize)>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn descend(&mut self, mut node: &'a Node<K, V>) {
        loop {
            self.stack.push((node, 0));
            match node.children.first() {
                Some(child) => node = child,
                None => break,
            }
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, index) = {
                let top = self.stack.last_mut()?;
                let current = (top.0, top.1);
                top.1 += 1;
                current
            };

            if index < node.items.len() {
                if let Some(child) = node.children.get(index + 1) {
                    self.descend(child);
                }
                self.remaining = self.remaining.saturating_sub(1);
                let (key, value) = &node.items[index];
                return Some((key, value));
            }
            self.stack.pop();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a BTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> OrderedIndex<K, V> for BTree<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    fn insert(&mut self, key: K, value: V) -> Result<()> {
        BTree::insert(self, key, value);
        Ok(())
    }

    fn get(&self, key: &K) -> Result<V> {
        BTree::get(self, key).cloned().ok_or(DatabaseError::KeyNotFound)
    }

    fn contains(&self, key: &K) -> Result<bool> {
        Ok(self.contains_key(key))
    }

    fn delete(&mut self, key: &K) -> Result<()> {
        self.remove(key)?.map(|_| ()).ok_or(DatabaseError::KeyNotFound)
    }

    fn entries(&self) -> Entries<'_, K, V> {
        Box::new(self.iter().map(|(k, v)| Ok((k.clone(), v.clone()))))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.len)
    }
}
