use std::{cmp::Ordering, io::Read};

use tracing::{debug, trace};

use crate::{
    config::StoreConfig,
    storage::{
        index::{Entries, OrderedIndex},
        pager::Pager,
        schema::Columns,
    },
    types::{
        NODE_HEADER_SIZE, NULL_PTR, NodePtr, POINTER_SIZE,
        codec::{BinaryRead, BinaryWrite},
        error::{DatabaseError, Result},
        row::{Key, Record},
        value::{Value, ValueType},
    },
};

// Field offsets inside a node frame
const PARENT_OFFSET: u64 = 4;

/// Order and node page size for rows of `row_size` bytes.
///
/// The order is chosen so a full node (`order - 1` items) fits `page_size`.
/// Below `minimum_order` the order is pinned to the minimum and the page size
/// grown to fit it.
pub fn derive_order(row_size: usize, config: &StoreConfig) -> (usize, usize) {
    let item_size = row_size + POINTER_SIZE;
    let order = config.page_size.saturating_sub(NODE_HEADER_SIZE) / item_size + 1;
    if order < config.minimum_order {
        let page_size = NODE_HEADER_SIZE + (config.minimum_order - 1) * item_size;
        (config.minimum_order, page_size)
    } else {
        (order, config.page_size)
    }
}

/// A decoded node frame.
///
/// On disk a frame is `[capacity][parent][item count][leftmost child]`
/// followed by each item's key and record values and the child pointer to its
/// right, then zero padding up to `capacity` bytes. Leaves store 0 in every
/// child slot.
#[derive(Debug, Clone)]
struct PagedNode {
    offset: NodePtr,
    capacity: u32,
    parent: NodePtr,
    items: Vec<(Key, Record)>,
    children: Vec<NodePtr>,
}

impl PagedNode {
    fn new(parent: NodePtr, items: Vec<(Key, Record)>, children: Vec<NodePtr>) -> Self {
        Self {
            offset: NULL_PTR,
            capacity: 0,
            parent,
            items,
            children,
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn search(&self, key: &Key) -> std::result::Result<usize, usize> {
        self.items.binary_search_by(|(k, _)| k.cmp(key))
    }
}

/// B-tree over the node region of a database file.
///
/// Links between nodes are file offsets. The table's root pointer lives in its
/// descriptor at `root_slot` and is rewritten whenever the root moves. Nothing
/// is cached: every access reads or writes the file.
#[derive(Debug)]
pub struct PagedBTree<'p> {
    pager: &'p Pager,
    key_types: Vec<ValueType>,
    record_types: Vec<ValueType>,
    root_slot: u64,
    order: usize,
    page_size: usize,
}

impl<'p> PagedBTree<'p> {
    pub fn new(pager: &'p Pager, columns: &Columns, root_slot: u64, config: &StoreConfig) -> Self {
        let (order, page_size) =
            derive_order(columns.estimated_row_size(config.text_size_hint), config);
        Self {
            pager,
            key_types: columns.key_types(),
            record_types: columns.record_types(),
            root_slot,
            order,
            page_size,
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn root(&self) -> Result<NodePtr> {
        self.pager.read_uint_at(self.root_slot)
    }

    fn set_root(&self, root: NodePtr) -> Result<()> {
        self.pager.write_uint_at(self.root_slot, root)
    }

    fn set_parent(&self, node: NodePtr, parent: NodePtr) -> Result<()> {
        self.pager.write_uint_at(node as u64 + PARENT_OFFSET, parent)
    }

    fn read_node(&self, offset: NodePtr) -> Result<PagedNode> {
        trace!(offset, "reading node");
        let mut reader = self.pager.reader_at(offset as u64)?;
        let capacity = reader.read_uint()?;
        let parent = reader.read_uint()?;
        let count = reader.read_uint()? as usize;
        let leftmost = reader.read_uint()?;

        if count == 0 || count >= self.order {
            return Err(DatabaseError::CorruptedIndex {
                reason: format!("node at {} holds {} items at order {}", offset, count, self.order),
            });
        }

        let mut items = Vec::with_capacity(count);
        let mut pointers = Vec::with_capacity(count);
        for _ in 0..count {
            let key = self.read_values(&mut reader, &self.key_types)?;
            let record = self.read_values(&mut reader, &self.record_types)?;
            items.push((key, record));
            pointers.push(reader.read_uint()?);
        }

        let children = if leftmost == NULL_PTR {
            Vec::new()
        } else {
            let mut children = Vec::with_capacity(count + 1);
            children.push(leftmost);
            children.extend(pointers);
            children
        };

        Ok(PagedNode {
            offset,
            capacity,
            parent,
            items,
            children,
        })
    }

    fn read_values<R: Read>(&self, reader: &mut R, types: &[ValueType]) -> Result<Vec<Value>> {
        types.iter().map(|t| reader.read_value(*t)).collect()
    }

    /// Node record without the leading capacity field.
    fn encode(&self, node: &PagedNode) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.page_size);
        buf.write_uint(node.parent)?;
        buf.write_uint(node.items.len() as u32)?;
        buf.write_uint(node.children.first().copied().unwrap_or(NULL_PTR))?;
        for (i, (key, record)) in node.items.iter().enumerate() {
            for value in key.iter().chain(record) {
                buf.write_value(value)?;
            }
            buf.write_uint(node.children.get(i + 1).copied().unwrap_or(NULL_PTR))?;
        }
        Ok(buf)
    }

    fn frame(capacity: u32, record: &[u8]) -> Result<Vec<u8>> {
        let mut frame = Vec::with_capacity(capacity as usize);
        frame.write_uint(capacity)?;
        frame.extend_from_slice(record);
        frame.fill(capacity as usize - frame.len())?;
        Ok(frame)
    }

    /// Appends a new frame for `node` at the end of the file.
    fn allocate(&self, node: &mut PagedNode) -> Result<NodePtr> {
        let record = self.encode(node)?;
        let needed = POINTER_SIZE + record.len();
        let capacity = u32::try_from(needed.max(self.page_size)).map_err(|_| {
            DatabaseError::SerializationError {
                details: format!("node of {} bytes does not fit a frame", needed),
            }
        })?;

        let offset = self.pager.next_node_ptr()?;
        let written = self.pager.append(&Self::frame(capacity, &record)?)?;
        if written != offset as u64 {
            return Err(DatabaseError::CorruptedDatabase {
                reason: format!("node allocated at {} but written at {}", offset, written),
            });
        }

        debug!(offset, capacity, "allocated node");
        node.offset = offset;
        node.capacity = capacity;
        Ok(offset)
    }

    /// Writes `node` back into its frame, relocating it when it outgrew the frame.
    fn write_node(&self, node: &mut PagedNode) -> Result<()> {
        let record = self.encode(node)?;
        if POINTER_SIZE + record.len() <= node.capacity as usize {
            trace!(offset = node.offset, "writing node");
            return self
                .pager
                .write_at(node.offset as u64, &Self::frame(node.capacity, &record)?);
        }

        let old = node.offset;
        let new = self.allocate(node)?;
        debug!(from = old, to = new, "relocated node");

        for child in &node.children {
            self.set_parent(*child, new)?;
        }
        if node.parent == NULL_PTR {
            self.set_root(new)
        } else {
            let mut parent = self.read_node(node.parent)?;
            let slot = Self::child_position(&parent, old)?;
            parent.children[slot] = new;
            self.write_node(&mut parent)
        }
    }

    fn child_position(parent: &PagedNode, child: NodePtr) -> Result<usize> {
        parent
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or_else(|| DatabaseError::CorruptedIndex {
                reason: format!(
                    "node at {} is not a child of its parent at {}",
                    child, parent.offset
                ),
            })
    }

    pub fn insert(&self, key: Key, record: Record) -> Result<()> {
        let root = self.root()?;
        if root == NULL_PTR {
            let mut node = PagedNode::new(NULL_PTR, vec![(key, record)], Vec::new());
            let offset = self.allocate(&mut node)?;
            return self.set_root(offset);
        }

        let mut node = self.read_node(root)?;
        loop {
            match node.search(&key) {
                Ok(i) => {
                    node.items[i].1 = record;
                    return self.write_node(&mut node);
                }
                Err(i) if node.is_leaf() => {
                    node.items.insert(i, (key, record));
                    break;
                }
                Err(i) => node = self.read_node(node.children[i])?,
            }
        }

        self.settle(node)
    }

    /// Writes a node that just gained an item, splitting upward while nodes overflow.
    fn settle(&self, mut node: PagedNode) -> Result<()> {
        loop {
            if node.items.len() < self.order {
                return self.write_node(&mut node);
            }

            let mid = node.items.len() / 2;
            let right_items = node.items.split_off(mid + 1);
            let right_children = if node.is_leaf() {
                Vec::new()
            } else {
                node.children.split_off(mid + 1)
            };
            let Some(middle) = node.items.pop() else {
                return Err(DatabaseError::CorruptedIndex {
                    reason: "split of an empty node".to_string(),
                });
            };

            let mut right = PagedNode::new(node.parent, right_items, right_children);
            let right_offset = self.allocate(&mut right)?;
            for child in &right.children {
                self.set_parent(*child, right_offset)?;
            }
            self.write_node(&mut node)?;

            if node.parent == NULL_PTR {
                let mut root =
                    PagedNode::new(NULL_PTR, vec![middle], vec![node.offset, right_offset]);
                let root_offset = self.allocate(&mut root)?;
                self.set_parent(node.offset, root_offset)?;
                self.set_parent(right_offset, root_offset)?;
                debug!(root = root_offset, "root split");
                return self.set_root(root_offset);
            }

            let mut parent = self.read_node(node.parent)?;
            let slot = Self::child_position(&parent, node.offset)?;
            parent.items.insert(slot, middle);
            parent.children.insert(slot + 1, right_offset);
            node = parent;
        }
    }

    pub fn get(&self, key: &Key) -> Result<Record> {
        let mut offset = self.root()?;
        while offset != NULL_PTR {
            let node = self.read_node(offset)?;
            match node.search(key) {
                Ok(i) => return Ok(node.items[i].1.clone()),
                Err(i) => offset = node.children.get(i).copied().unwrap_or(NULL_PTR),
            }
        }
        Err(DatabaseError::KeyNotFound)
    }

    pub fn iter(&self) -> PagedIter<'_, 'p> {
        PagedIter {
            tree: self,
            stack: Vec::new(),
            started: false,
            done: false,
        }
    }

    /// Checks key order, item bounds, parent pointers and leaf depth.
    pub fn verify(&self) -> Result<()> {
        let root = self.root()?;
        if root == NULL_PTR {
            return Ok(());
        }
        let mut leaf_depth = None;
        self.verify_node(root, NULL_PTR, None, None, 0, &mut leaf_depth)?;
        Ok(())
    }

    fn verify_node(
        &self,
        offset: NodePtr,
        parent: NodePtr,
        lower: Option<&Key>,
        upper: Option<&Key>,
        depth: usize,
        leaf_depth: &mut Option<usize>,
    ) -> Result<usize> {
        let corrupted = |reason: String| DatabaseError::CorruptedIndex { reason };
        let node = self.read_node(offset)?;

        if node.parent != parent {
            return Err(corrupted(format!(
                "node at {} points to parent {} instead of {}",
                offset, node.parent, parent
            )));
        }
        if parent != NULL_PTR && node.items.len() < (self.order - 1) / 2 {
            return Err(corrupted(format!(
                "node at {} underflows with {} items",
                offset,
                node.items.len()
            )));
        }
        for pair in node.items.windows(2) {
            if pair[0].0.cmp(&pair[1].0) != Ordering::Less {
                return Err(corrupted(format!("keys out of order in node at {}", offset)));
            }
        }
        for (key, _) in &node.items {
            if lower.is_some_and(|l| key <= l) || upper.is_some_and(|u| key >= u) {
                return Err(corrupted(format!(
                    "key outside its subtree bounds in node at {}",
                    offset
                )));
            }
        }

        let len = node.items.len();
        if node.is_leaf() {
            match leaf_depth {
                Some(expected) if *expected != depth => {
                    return Err(corrupted(format!(
                        "leaf at {} has depth {} instead of {}",
                        offset, depth, expected
                    )));
                }
                _ => *leaf_depth = Some(depth),
            }
            return Ok(len);
        }

        if node.children.iter().any(|c| *c == NULL_PTR) {
            return Err(corrupted(format!("internal node at {} has a null child", offset)));
        }
        let mut count = len;
        for (i, child) in node.children.iter().enumerate() {
            let lo = if i == 0 { lower } else { Some(&node.items[i - 1].0) };
            let hi = if i == len { upper } else { Some(&node.items[i].0) };
            count += self.verify_node(*child, offset, lo, hi, depth + 1, leaf_depth)?;
        }
        Ok(count)
    }
}

/// In-order traversal that re-reads nodes from the file as it goes.
pub struct PagedIter<'t, 'p> {
    tree: &'t PagedBTree<'p>,
    stack: Vec<(PagedNode, usize)>,
    started: bool,
    done: bool,
}

impl PagedIter<'_, '_> {
    fn descend(&mut self, mut offset: NodePtr) -> Result<()> {
        loop {
            let node = self.tree.read_node(offset)?;
            let leftmost = node.children.first().copied();
            self.stack.push((node, 0));
            match leftmost {
                Some(child) => offset = child,
                None => return Ok(()),
            }
        }
    }

    fn advance(&mut self) -> Result<Option<(Key, Record)>> {
        if !self.started {
            self.started = true;
            let root = self.tree.root()?;
            if root != NULL_PTR {
                self.descend(root)?;
            }
        }

        while let Some((node, index)) = self.stack.last_mut() {
            let current = *index;
            *index += 1;
            if current < node.items.len() {
                let item = std::mem::take(&mut node.items[current]);
                if let Some(child) = node.children.get(current + 1).copied() {
                    self.descend(child)?;
                }
                return Ok(Some(item));
            }
            self.stack.pop();
        }
        Ok(None)
    }
}

impl Iterator for PagedIter<'_, '_> {
    type Item = Result<(Key, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl OrderedIndex<Key, Record> for PagedBTree<'_> {
    fn insert(&mut self, key: Key, value: Record) -> Result<()> {
        PagedBTree::insert(self, key, value)
    }

    fn get(&self, key: &Key) -> Result<Record> {
        PagedBTree::get(self, key)
    }

    fn delete(&mut self, _key: &Key) -> Result<()> {
        Err(DatabaseError::UnsupportedOperation {
            operation: "delete on a persistent table".to_string(),
        })
    }

    fn entries(&self) -> Entries<'_, Key, Record> {
        Box::new(self.iter())
    }

    fn len(&self) -> Result<usize> {
        self.iter().try_fold(0, |count, entry| entry.map(|_| count + 1))
    }

    fn supports_delete(&self) -> bool {
        false
    }
}
