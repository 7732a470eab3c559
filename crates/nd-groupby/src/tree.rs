//! Nested partition of rows by their key tuple.

use std::collections::HashMap;

use nd_types::Scalar;

/// Hashable identity of one key value. Every missing value maps to the same
/// group.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum GroupKeyRef<'a> {
    Missing,
    Bool(bool),
    Int64(i64),
    FloatBits(u64),
    Utf8(&'a str),
}

impl<'a> GroupKeyRef<'a> {
    fn from_scalar(key: &'a Scalar) -> Self {
        match key {
            key if key.is_missing() => Self::Missing,
            Scalar::Bool(v) => Self::Bool(*v),
            Scalar::Int64(v) => Self::Int64(*v),
            // -0.0 and 0.0 share a group
            Scalar::Float64(v) => Self::FloatBits((v + 0.0).to_bits()),
            Scalar::Utf8(v) => Self::Utf8(v.as_str()),
            Scalar::Null(_) => Self::Missing,
        }
    }
}

/// Distinct values of one key column in first-seen order.
struct Level<'a> {
    values: Vec<Scalar>,
    slots: HashMap<GroupKeyRef<'a>, usize>,
}

impl<'a> Level<'a> {
    fn scan(column: &'a [Scalar]) -> Self {
        let mut values = Vec::new();
        let mut slots = HashMap::new();
        for value in column {
            slots.entry(GroupKeyRef::from_scalar(value)).or_insert_with(|| {
                values.push(value.clone());
                values.len() - 1
            });
        }
        Self { values, slots }
    }

    fn slot(&self, value: &'a Scalar) -> Option<usize> {
        self.slots.get(&GroupKeyRef::from_scalar(value)).copied()
    }
}

/// Rows partitioned by key tuple, one tree level per key column.
///
/// Branch children and leaves keep the order in which their keys were first
/// seen. A tree over zero key columns is a single leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKeyTree<T> {
    Leaf(T),
    Branch(Vec<(Scalar, GroupKeyTree<T>)>),
}

impl GroupKeyTree<Vec<usize>> {
    /// Partition row positions `0..n_rows` by `key_columns`, outermost first.
    ///
    /// Every combination of distinct key values gets a leaf up front; rows are
    /// then appended in one pass and combinations no row reached are pruned.
    #[must_use]
    pub fn partition(key_columns: &[&[Scalar]], n_rows: usize) -> Self {
        let levels: Vec<Level<'_>> = key_columns.iter().map(|column| Level::scan(column)).collect();
        let mut tree = Self::preallocate(&levels);
        let allocated = tree.leaf_count();

        for row in 0..n_rows {
            let path: Option<Vec<usize>> = levels
                .iter()
                .zip(key_columns)
                .map(|(level, column)| level.slot(&column[row]))
                .collect();
            if let Some(path) = path {
                tree.insert(&path, row);
            }
        }

        let tree = tree
            .prune(&|rows: &Vec<usize>| rows.is_empty())
            .unwrap_or(Self::Branch(Vec::new()));
        log::debug!(
            "partitioned {n_rows} rows over {} key columns: {allocated} leaves allocated, {} kept",
            key_columns.len(),
            tree.leaf_count()
        );
        tree
    }

    fn preallocate(levels: &[Level<'_>]) -> Self {
        match levels.split_first() {
            None => Self::Leaf(Vec::new()),
            Some((level, rest)) => Self::Branch(
                level
                    .values
                    .iter()
                    .map(|value| (value.clone(), Self::preallocate(rest)))
                    .collect(),
            ),
        }
    }

    fn insert(&mut self, path: &[usize], row: usize) {
        match (self, path.split_first()) {
            (Self::Branch(children), Some((&slot, rest))) => {
                if let Some((_, child)) = children.get_mut(slot) {
                    child.insert(rest, row);
                }
            }
            (Self::Leaf(rows), None) => rows.push(row),
            _ => {}
        }
    }
}

impl GroupKeyTree<Vec<Vec<Scalar>>> {
    /// Depth-first reconstruction: each leaf row is prefixed with its key path.
    #[must_use]
    pub fn flatten(self) -> Vec<Vec<Scalar>> {
        let mut out = Vec::new();
        self.flatten_into(&mut Vec::new(), &mut out);
        out
    }

    fn flatten_into(self, path: &mut Vec<Scalar>, out: &mut Vec<Vec<Scalar>>) {
        match self {
            Self::Leaf(rows) => {
                for row in rows {
                    out.push(path.iter().cloned().chain(row).collect());
                }
            }
            Self::Branch(children) => {
                for (key, child) in children {
                    path.push(key);
                    child.flatten_into(path, out);
                    path.pop();
                }
            }
        }
    }
}

impl<T> GroupKeyTree<T> {
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Branch(children) => children.iter().map(|(_, child)| child.leaf_count()).sum(),
        }
    }

    /// Leaves with their key paths, depth first.
    #[must_use]
    pub fn leaves(&self) -> Vec<(Vec<Scalar>, &T)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut Vec::new(), &mut out);
        out
    }

    fn collect_leaves<'t>(&'t self, path: &mut Vec<Scalar>, out: &mut Vec<(Vec<Scalar>, &'t T)>) {
        match self {
            Self::Leaf(value) => out.push((path.clone(), value)),
            Self::Branch(children) => {
                for (key, child) in children {
                    path.push(key.clone());
                    child.collect_leaves(path, out);
                    path.pop();
                }
            }
        }
    }

    /// The leaf reached by `key`, matching missing values to the missing group.
    #[must_use]
    pub fn find(&self, key: &[Scalar]) -> Option<&T> {
        match (self, key.split_first()) {
            (Self::Leaf(value), None) => Some(value),
            (Self::Branch(children), Some((head, rest))) => {
                let wanted = GroupKeyRef::from_scalar(head);
                children
                    .iter()
                    .find(|(candidate, _)| GroupKeyRef::from_scalar(candidate) == wanted)
                    .and_then(|(_, child)| child.find(rest))
            }
            _ => None,
        }
    }

    /// Same shape with every leaf replaced by `f(key_path, leaf)`.
    pub fn try_map<U, E>(
        &self,
        f: &mut impl FnMut(&[Scalar], &T) -> Result<U, E>,
    ) -> Result<GroupKeyTree<U>, E> {
        self.try_map_with_path(&mut Vec::new(), f)
    }

    fn try_map_with_path<U, E>(
        &self,
        path: &mut Vec<Scalar>,
        f: &mut impl FnMut(&[Scalar], &T) -> Result<U, E>,
    ) -> Result<GroupKeyTree<U>, E> {
        match self {
            Self::Leaf(value) => Ok(GroupKeyTree::Leaf(f(path, value)?)),
            Self::Branch(children) => {
                let mut mapped = Vec::with_capacity(children.len());
                for (key, child) in children {
                    path.push(key.clone());
                    let result = child.try_map_with_path(path, f);
                    path.pop();
                    mapped.push((key.clone(), result?));
                }
                Ok(GroupKeyTree::Branch(mapped))
            }
        }
    }

    /// Drop leaves matching `is_empty` and any branch left without children.
    fn prune(self, is_empty: &impl Fn(&T) -> bool) -> Option<Self> {
        match self {
            Self::Leaf(value) => {
                if is_empty(&value) {
                    None
                } else {
                    Some(Self::Leaf(value))
                }
            }
            Self::Branch(children) => {
                let kept: Vec<_> = children
                    .into_iter()
                    .filter_map(|(key, child)| child.prune(is_empty).map(|child| (key, child)))
                    .collect();
                if kept.is_empty() {
                    None
                } else {
                    Some(Self::Branch(kept))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use nd_types::{NullKind, Scalar};

    use super::GroupKeyTree;

    fn strings(values: &[&str]) -> Vec<Scalar> {
        values.iter().copied().map(Scalar::from).collect()
    }

    #[test]
    fn leaves_follow_first_seen_order() {
        let keys = strings(&["b", "a", "b", "c"]);
        let tree = GroupKeyTree::partition(&[keys.as_slice()], keys.len());
        let leaves = tree.leaves();
        let paths: Vec<&Scalar> = leaves.iter().map(|(path, _)| &path[0]).collect();
        assert_eq!(paths, vec![&keys[0], &keys[1], &keys[3]]);
        assert_eq!(leaves[0].1, &vec![0, 2]);
    }

    #[test]
    fn unmatched_combinations_are_pruned() {
        let outer = strings(&["a", "b"]);
        let inner = strings(&["x", "y"]);
        let tree = GroupKeyTree::partition(&[outer.as_slice(), inner.as_slice()], 2);
        assert_eq!(tree.leaf_count(), 2);
        assert!(tree.leaves().iter().all(|(_, rows)| !rows.is_empty()));
        assert_eq!(tree.find(&strings(&["a", "y"])), None);
        assert_eq!(tree.find(&strings(&["b", "y"])), Some(&vec![1]));
    }

    #[test]
    fn missing_keys_share_a_group() {
        let keys = vec![
            Scalar::Int64(1),
            Scalar::Null(NullKind::Null),
            Scalar::nan(),
            Scalar::Int64(1),
        ];
        let tree = GroupKeyTree::partition(&[keys.as_slice()], keys.len());
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.find(&[Scalar::nan()]), Some(&vec![1, 2]));
    }

    #[test]
    fn zero_keys_make_one_leaf_unless_empty() {
        let tree = GroupKeyTree::partition(&[], 3);
        assert_eq!(tree, GroupKeyTree::Leaf(vec![0, 1, 2]));
        let tree = GroupKeyTree::partition(&[], 0);
        assert_eq!(tree.leaf_count(), 0);
    }

    #[test]
    fn flatten_prefixes_key_paths() {
        let tree = GroupKeyTree::Branch(vec![
            (
                Scalar::Int64(1),
                GroupKeyTree::Leaf(vec![vec![Scalar::Int64(10)], vec![Scalar::Int64(11)]]),
            ),
            (Scalar::Int64(2), GroupKeyTree::Leaf(vec![vec![Scalar::Int64(20)]])),
        ]);
        assert_eq!(
            tree.flatten(),
            vec![
                vec![Scalar::Int64(1), Scalar::Int64(10)],
                vec![Scalar::Int64(1), Scalar::Int64(11)],
                vec![Scalar::Int64(2), Scalar::Int64(20)],
            ]
        );
    }
}
