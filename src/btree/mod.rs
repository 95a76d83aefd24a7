//! Generic on-disk B+-tree, keyed by `i64`, over a [`Record`] value type.
//!
//! Two logical spaces share one [`Pager`]: the *key file* holds [`KeyPage`]s
//! forming the tree itself, and the *value file* holds an append-only
//! packed vector of records. A leaf cell's child field is not a page
//! number — it is the row index of the record in the value file.

pub mod page;

use page::{KeyPage, ORDER};

use crate::error::{GraphError, Result};
use crate::pager::{PageKind, Pager, PAGE_SIZE};
use crate::record::Record;

/// How many records fit in one value page, leaving one slot of headroom.
fn capacity_per_page<R: Record>() -> usize {
    (PAGE_SIZE - 4) / R::SIZE - 1
}

/// A generic B+-tree engine over records of type `R`, backed by a [`Pager`].
pub struct BPlusTree<R: Record> {
    pager: Pager,
    _marker: std::marker::PhantomData<R>,
}

impl<R: Record> BPlusTree<R> {
    pub fn new(pager: Pager) -> Self {
        Self {
            pager,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn pager_mut(&mut self) -> &mut Pager {
        &mut self.pager
    }

    pub fn close(self) -> Result<()> {
        self.pager.close()
    }

    fn read_key_page(&mut self, page_num: u32) -> Result<KeyPage> {
        let bytes = self.pager.get_page(PageKind::Key, page_num)?;
        Ok(KeyPage::decode(bytes))
    }

    fn write_key_page(&mut self, page_num: u32, page: &KeyPage) -> Result<()> {
        let mut buf = vec![0u8; PAGE_SIZE];
        page.encode(&mut buf);
        let dest = self.pager.get_page_mut(PageKind::Key, page_num)?;
        dest.copy_from_slice(&buf);
        Ok(())
    }

    fn read_value(&mut self, row: u32) -> Result<R> {
        let cap = capacity_per_page::<R>() as u32;
        let page_num = row / cap;
        let offset = (row % cap) as usize;
        let bytes = self.pager.get_page(PageKind::Value, page_num)?;
        let off = 4 + offset * R::SIZE;
        Ok(R::deserialize(&bytes[off..off + R::SIZE]))
    }

    fn write_value(&mut self, row: u32, record: &R) -> Result<()> {
        let cap = capacity_per_page::<R>() as u32;
        let page_num = row / cap;
        let offset = (row % cap) as usize;
        let bytes = self.pager.get_page_mut(PageKind::Value, page_num)?;
        let off = 4 + offset * R::SIZE;
        record.serialize(&mut bytes[off..off + R::SIZE]);
        Ok(())
    }

    /// Appends `record` to the value file and returns its new global row
    /// index, allocating a fresh value page when the current last one is
    /// full.
    fn append_value(&mut self, record: &R) -> Result<u32> {
        let cap = capacity_per_page::<R>() as u32;
        let row = self.pager.num_entries();
        let page_num = row / cap;
        let offset = (row % cap) as usize;
        if page_num >= self.pager.num_value_pages() {
            self.pager.append_page(PageKind::Value)?;
        }
        let bytes = self.pager.get_page_mut(PageKind::Value, page_num)?;
        let off = 4 + offset * R::SIZE;
        record.serialize(&mut bytes[off..off + R::SIZE]);
        let size = (offset + 1) as u32;
        bytes[0..4].copy_from_slice(&size.to_le_bytes());
        self.pager.set_num_entries(row + 1);
        Ok(row)
    }

    /// Descends from the root, returning the leaf page number and the path
    /// of internal ancestor page numbers visited (root-first).
    fn descend(&mut self, key: i64) -> Result<(u32, Vec<u32>)> {
        let mut page_num = self.pager.key_root();
        let mut path = Vec::new();
        loop {
            let page = self.read_key_page(page_num)?;
            if page.is_internal {
                path.push(page_num);
                page_num = page.child_for(key);
            } else {
                return Ok((page_num, path));
            }
        }
    }

    /// Inserts `record` under `key`, overwriting the stored record if `key`
    /// is already present.
    pub fn insert(&mut self, key: i64, record: R) -> Result<()> {
        if self.pager.num_key_pages() == 0 {
            let row = self.append_value(&record)?;
            let mut leaf = KeyPage::new_leaf(true);
            leaf.upsert(key, row);
            let page_num = self.pager.append_page(PageKind::Key)?;
            self.write_key_page(page_num, &leaf)?;
            self.pager.set_key_root(page_num);
            return Ok(());
        }

        let (leaf_num, path) = self.descend(key)?;
        let mut leaf = self.read_key_page(leaf_num)?;
        let i = leaf.lower_bound(key);
        if i < leaf.cells.len() && leaf.cells[i].0 == key {
            let row = leaf.cells[i].1;
            self.write_value(row, &record)?;
            return Ok(());
        }

        let row = self.append_value(&record)?;
        leaf.upsert(key, row);
        self.write_key_page(leaf_num, &leaf)?;

        if leaf.is_full() {
            self.split_and_propagate(leaf_num, leaf, path)?;
        }
        Ok(())
    }

    fn split_and_propagate(&mut self, mut page_num: u32, mut page: KeyPage, mut path: Vec<u32>) -> Result<()> {
        loop {
            let (right, separator) = if page.is_internal {
                page.split_internal()
            } else {
                page.split_leaf()
            };
            self.write_key_page(page_num, &page)?;
            let right_num = self.pager.append_page(PageKind::Key)?;
            self.write_key_page(right_num, &right)?;

            match path.pop() {
                Some(parent_num) => {
                    let mut parent = self.read_key_page(parent_num)?;
                    parent.upsert(separator, right_num);
                    self.write_key_page(parent_num, &parent)?;
                    if parent.is_full() {
                        page_num = parent_num;
                        page = parent;
                        continue;
                    }
                    return Ok(());
                }
                None => {
                    page.is_root = false;
                    self.write_key_page(page_num, &page)?;
                    let new_root_num = self.pager.append_page(PageKind::Key)?;
                    let mut new_root = KeyPage::new_internal(true, page_num);
                    new_root.cells.push((separator, right_num));
                    self.write_key_page(new_root_num, &new_root)?;
                    self.pager.set_key_root(new_root_num);
                    return Ok(());
                }
            }
        }
    }

    /// Looks up `key`. Returns `R::default()` (id `-1`) if the tree is
    /// empty or the key is absent — never an error.
    pub fn find(&mut self, key: i64) -> Result<R> {
        if self.pager.num_key_pages() == 0 {
            return Ok(R::default());
        }
        let (leaf_num, _) = self.descend(key)?;
        let leaf = self.read_key_page(leaf_num)?;
        let i = leaf.lower_bound(key);
        if i < leaf.cells.len() && leaf.cells[i].0 == key {
            self.read_value(leaf.cells[i].1)
        } else {
            Ok(R::default())
        }
    }

    /// Linear scan over the value file for the first record whose
    /// name/title field matches `query`. Returns `-1` if none match.
    pub fn find_id_by_name(&mut self, query: &R) -> Result<i64> {
        for row in 0..self.pager.num_entries() {
            let record = self.read_value(row)?;
            if record.matches_query(query) {
                return Ok(record.id());
            }
        }
        Ok(crate::record::NOT_FOUND_ID)
    }

    pub fn len(&self) -> u32 {
        self.pager.num_entries()
    }

    pub fn is_empty(&self) -> bool {
        self.pager.num_entries() == 0
    }
}

/// Sanity check on a decoded page reached through normal traversal; used by
/// callers that want to fail loudly on structural corruption rather than
/// silently misroute. Not invoked on the hot insert/find paths.
pub fn assert_not_corrupt(page_num: u32, page: &KeyPage) -> Result<()> {
    if page.cells.len() > ORDER {
        return Err(GraphError::Corruption(format!(
            "key page {page_num} holds {} cells, exceeding order {ORDER}",
            page.cells.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenMode;
    use crate::record::TestRecord;
    use rand::seq::SliceRandom;
    use rand::thread_rng;
    use tempfile::tempdir;

    fn open_tree(dir: &std::path::Path) -> BPlusTree<TestRecord> {
        let pager = Pager::open(
            dir.join("keys.db"),
            dir.join("values.db"),
            dir.join("meta.txt"),
            OpenMode::CreateNew,
        )
        .unwrap();
        BPlusTree::new(pager)
    }

    #[test]
    fn insert_then_find_single_record() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());
        tree.insert(42, TestRecord::new(7, "hello", 1)).unwrap();
        let found = tree.find(42).unwrap();
        assert_eq!(found.id, 1);
        assert_eq!(found.str_field, "hello");
    }

    #[test]
    fn find_missing_key_returns_default() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());
        let found = tree.find(99).unwrap();
        assert_eq!(found.id, crate::record::NOT_FOUND_ID);
    }

    #[test]
    fn find_in_empty_store_returns_default() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());
        let found = tree.find(1).unwrap();
        assert_eq!(found.id, crate::record::NOT_FOUND_ID);
    }

    #[test]
    fn insert_overwrites_existing_key() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());
        tree.insert(1, TestRecord::new(1, "first", 10)).unwrap();
        tree.insert(1, TestRecord::new(2, "second", 20)).unwrap();
        let found = tree.find(1).unwrap();
        assert_eq!(found.id, 20);
        assert_eq!(found.str_field, "second");
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn find_id_by_name_linear_scan() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());
        tree.insert(1, TestRecord::new(1, "alpha", 100)).unwrap();
        tree.insert(2, TestRecord::new(2, "beta", 200)).unwrap();
        let id = tree.find_id_by_name(&TestRecord::query(2)).unwrap();
        assert_eq!(id, 200);
        let missing = tree.find_id_by_name(&TestRecord::query(99)).unwrap();
        assert_eq!(missing, crate::record::NOT_FOUND_ID);
    }

    #[test]
    fn insert_enough_keys_to_force_leaf_and_root_splits() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());
        let n = (ORDER as i64) * 3;
        for k in 0..n {
            tree.insert(k, TestRecord::new(k as i32, format!("rec{k}"), k))
                .unwrap();
        }
        assert!(tree.pager().num_key_pages() > 1);
        for k in 0..n {
            let found = tree.find(k).unwrap();
            assert_eq!(found.id, k, "key {k} should resolve to its own record");
        }
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempdir().unwrap();
        {
            let mut tree = open_tree(dir.path());
            for k in 0..500i64 {
                tree.insert(k, TestRecord::new(k as i32, format!("v{k}"), k))
                    .unwrap();
            }
            tree.close().unwrap();
        }
        let pager = Pager::open(
            dir.path().join("keys.db"),
            dir.path().join("values.db"),
            dir.path().join("meta.txt"),
            OpenMode::ReadWrite,
        )
        .unwrap();
        let mut tree = BPlusTree::<TestRecord>::new(pager);
        for k in 0..500i64 {
            assert_eq!(tree.find(k).unwrap().id, k);
        }
    }

    #[test]
    fn random_order_insert_and_lookup() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());
        let mut keys: Vec<i64> = (0..2000).collect();
        keys.shuffle(&mut thread_rng());
        for &k in &keys {
            tree.insert(k, TestRecord::new(k as i32, format!("k{k}"), k))
                .unwrap();
        }
        for &k in &keys {
            assert_eq!(tree.find(k).unwrap().id, k);
        }
    }
}
