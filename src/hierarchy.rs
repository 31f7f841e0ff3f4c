use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Deserialize;

use crate::error::AtlasError;
use crate::vol::{MaskVol, Vol};

/// Separator used in ancestor-qualified path names. Every path starts with it,
/// so the root's path is `|<root name>` and its parent path is the empty string.
pub const PATH_SEP: char = '|';

/// Colors brighter than 75% of full white get scaled back down.
const DARKEN_LIMIT: f32 = 255.0 * 3.0 * 0.75;

// Ontology documents
// -----------------------------------------------------------------------------

/// One node of the recursive AIBS region ontology.
#[derive(Debug, Clone, Deserialize)]
pub struct OntologyNode {
    pub id: u32,
    pub name: String,
    pub acronym: String,
    pub color_hex_triplet: String,
    /// Absent in leaf nodes.
    pub children: Option<Vec<OntologyNode>>,
}

#[derive(Debug, Clone, Deserialize)]
struct OntologyDoc {
    msg: Vec<OntologyNode>,
}

/// One entry of the alternate flat ontology format, one region per line.
#[derive(Debug, Clone, Deserialize)]
pub struct FlatRegion {
    pub id: u32,
    pub name: String,
    pub full_name: String,
    pub is_leaf: bool,
    pub color: [f32; 3],
    pub parent: u32,
}

pub fn hex_to_rgb(value: &str) -> Result<[f32; 3], AtlasError> {
    let digits = value.trim_start_matches('#');
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(AtlasError::BadColor(value.to_string()));
    }
    let ch = |i: usize| -> f32 {
        u8::from_str_radix(&digits[i..i + 2], 16).unwrap_or(0) as f32
    };
    Ok([ch(0), ch(2), ch(4)])
}

fn darken_color(rgb: [f32; 3]) -> [f32; 3] {
    let sum: f32 = rgb.iter().sum();
    if sum > DARKEN_LIMIT {
        let k = DARKEN_LIMIT / sum;
        [rgb[0] * k, rgb[1] * k, rgb[2] * k]
    } else {
        rgb
    }
}

// Index
// -----------------------------------------------------------------------------

/// Read-only lookup structures over a region ontology. Built once, then shared
/// by reference; there is no writer after construction.
#[derive(Debug, Default, Clone)]
pub struct HierarchyIndex {
    name_by_id: HashMap<u32, String>,
    path_by_id: HashMap<u32, String>,
    id_by_name: HashMap<String, u32>,
    id_by_path: HashMap<String, u32>,
    parent_path_by_path: HashMap<String, String>,
    parent_name_by_name: HashMap<String, String>,
    path_by_name: HashMap<String, String>,
    name_by_path: HashMap<String, String>,
    acronym_by_id: HashMap<u32, String>,
    color_by_id: HashMap<u32, [f32; 3]>,
    leaf_by_path: HashMap<String, bool>,
    /// Path names in registration (preorder) order; drives search result order.
    paths: Vec<String>,
}

impl HierarchyIndex {
    /// Parse an AIBS hierarchy document (`{"msg": [root, ...]}`) and index it.
    pub fn from_json_str(json_text: &str, darken: bool) -> Result<Self, AtlasError> {
        let doc: OntologyDoc = serde_json::from_str(json_text)?;
        let root = doc
            .msg
            .first()
            .ok_or_else(|| AtlasError::UnknownRegion("empty ontology document".to_string()))?;
        Self::from_root_node(root, darken)
    }

    /// Index an already-parsed ontology tree.
    ///
    /// Preorder traversal with an explicit stack; recursion depth is not
    /// bounded by the ontology shape.
    pub fn from_root_node(root: &OntologyNode, darken: bool) -> Result<Self, AtlasError> {
        let mut index = Self::default();

        struct Item<'a> {
            node: &'a OntologyNode,
            parent_path: String,
            parent_name: String,
        }

        let mut stack = vec![Item {
            node: root,
            parent_path: String::new(),
            parent_name: String::new(),
        }];

        while let Some(item) = stack.pop() {
            let node = item.node;
            let path = format!("{}{}{}", item.parent_path, PATH_SEP, node.name);

            let is_leaf = match &node.children {
                Some(children) => children.is_empty(),
                None => {
                    tracing::debug!(region = %node.name, "node has no children entry; treating as leaf");
                    true
                }
            };

            let color = darken_or_keep(hex_to_rgb(&node.color_hex_triplet)?, darken);
            index.register(
                node.id,
                &node.name,
                &path,
                &item.parent_path,
                &item.parent_name,
                &node.acronym,
                color,
                is_leaf,
            );

            if let Some(children) = &node.children {
                // Reverse push keeps document order on a pop-based walk.
                for child in children.iter().rev() {
                    stack.push(Item {
                        node: child,
                        parent_path: path.clone(),
                        parent_name: node.name.clone(),
                    });
                }
            }
        }

        Ok(index)
    }

    /// Index the flat ontology format. Entries must list parents before
    /// children (the file is written in traversal order).
    pub fn from_flat(entries: &[FlatRegion]) -> Result<Self, AtlasError> {
        let mut index = Self::default();
        for entry in entries {
            // The parent path is the full name minus its last segment.
            let parent_path = match entry.full_name.rfind(PATH_SEP) {
                Some(0) | None => String::new(),
                Some(pos) => entry.full_name[..pos].to_string(),
            };
            let parent_name = if parent_path.is_empty() {
                String::new()
            } else {
                index
                    .name_by_id
                    .get(&entry.parent)
                    .cloned()
                    .ok_or_else(|| {
                        AtlasError::UnknownRegion(format!("parent id {} of {}", entry.parent, entry.name))
                    })?
            };
            index.register(
                entry.id,
                &entry.name,
                &entry.full_name,
                &parent_path,
                &parent_name,
                "",
                entry.color,
                entry.is_leaf,
            );
        }
        Ok(index)
    }

    #[allow(clippy::too_many_arguments)]
    fn register(
        &mut self,
        id: u32,
        name: &str,
        path: &str,
        parent_path: &str,
        parent_name: &str,
        acronym: &str,
        color: [f32; 3],
        is_leaf: bool,
    ) {
        self.name_by_id.insert(id, name.to_string());
        self.path_by_id.insert(id, path.to_string());
        self.id_by_name.insert(name.to_string(), id);
        self.id_by_path.insert(path.to_string(), id);
        self.parent_path_by_path.insert(path.to_string(), parent_path.to_string());
        self.parent_name_by_name.insert(name.to_string(), parent_name.to_string());
        self.path_by_name.insert(name.to_string(), path.to_string());
        self.name_by_path.insert(path.to_string(), name.to_string());
        self.acronym_by_id.insert(id, acronym.to_string());
        self.color_by_id.insert(id, color);
        self.leaf_by_path.insert(path.to_string(), is_leaf);
        self.paths.push(path.to_string());
    }

    // Lookups
    // -------------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Registered path names in traversal order.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn id_of_path(&self, path: &str) -> Option<u32> {
        self.id_by_path.get(path).copied()
    }

    pub fn id_of_name(&self, name: &str) -> Option<u32> {
        self.id_by_name.get(name).copied()
    }

    pub fn path_of_id(&self, id: u32) -> Option<&str> {
        self.path_by_id.get(&id).map(String::as_str)
    }

    pub fn path_of_name(&self, name: &str) -> Option<&str> {
        self.path_by_name.get(name).map(String::as_str)
    }

    pub fn name_of_id(&self, id: u32) -> Option<&str> {
        self.name_by_id.get(&id).map(String::as_str)
    }

    pub fn parent_path(&self, path: &str) -> Option<&str> {
        self.parent_path_by_path.get(path).map(String::as_str)
    }

    pub fn parent_name(&self, name: &str) -> Option<&str> {
        self.parent_name_by_name.get(name).map(String::as_str)
    }

    pub fn is_leaf(&self, path: &str) -> bool {
        self.leaf_by_path.get(path).copied().unwrap_or(false)
    }

    pub fn color_of_id(&self, id: u32) -> Option<[f32; 3]> {
        self.color_by_id.get(&id).copied()
    }

    pub fn acronym_of_id(&self, id: u32) -> Option<&str> {
        self.acronym_by_id.get(&id).map(String::as_str)
    }

    // Queries
    // -------------------------------------------------------------------------

    /// Region ids present in `annotation` whose path contains `top_region_name`,
    /// plus every ancestor of each match up to and including the top region
    /// (the walk stops at the top region's parent).
    pub fn find_unique_regions(
        &self,
        annotation: &Vol<u32>,
        top_region_name: &str,
    ) -> Result<BTreeSet<u32>, AtlasError> {
        let top_path = self
            .path_by_name
            .get(top_region_name)
            .ok_or_else(|| AtlasError::UnknownRegion(top_region_name.to_string()))?;
        let above_top = self
            .parent_path_by_path
            .get(top_path)
            .cloned()
            .unwrap_or_default();

        let mut labels: BTreeSet<u32> = BTreeSet::new();
        for &id in &annotation.arr {
            if id != 0 {
                labels.insert(id);
            }
        }

        let mut uniques: BTreeSet<u32> = BTreeSet::new();
        for id in labels {
            let Some(path) = self.path_by_id.get(&id) else {
                tracing::warn!(id, "annotation label missing from the ontology");
                continue;
            };
            if !path.contains(top_region_name) {
                continue;
            }
            uniques.insert(id);

            let mut parent = self.parent_path_by_path.get(path).cloned().unwrap_or_default();
            while parent != above_top && !parent.is_empty() {
                let Some(&parent_id) = self.id_by_path.get(&parent) else {
                    break;
                };
                if !uniques.insert(parent_id) {
                    break;
                }
                parent = self
                    .parent_path_by_path
                    .get(&parent)
                    .cloned()
                    .unwrap_or_default();
            }
        }

        Ok(uniques)
    }

    /// For every ancestor region, the sorted unique ids of its subtree
    /// (leaves plus any intermediate ids present in `uniques`), and for each
    /// id in `uniques` its maximum distance from a leaf.
    pub fn find_children(
        &self,
        uniques: &BTreeSet<u32>,
    ) -> (BTreeMap<String, Vec<u32>>, HashMap<u32, u32>) {
        let mut children: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        let mut depth: HashMap<u32, u32> = uniques.iter().map(|&id| (id, 0)).collect();

        for path in &self.paths {
            if !self.is_leaf(path) {
                continue;
            }
            let leaf_id = self.id_by_path[path.as_str()];

            let mut climbed = 0u32;
            let mut subtree_ids = vec![leaf_id];
            let mut parent = self.parent_path_by_path.get(path).cloned().unwrap_or_default();
            while !parent.is_empty() {
                children
                    .entry(parent.clone())
                    .or_default()
                    .extend_from_slice(&subtree_ids);
                climbed += 1;
                if let Some(&parent_id) = self.id_by_path.get(&parent) {
                    if uniques.contains(&parent_id) {
                        subtree_ids.push(parent_id);
                        let d = depth.entry(parent_id).or_insert(0);
                        *d = (*d).max(climbed);
                    }
                }
                parent = self
                    .parent_path_by_path
                    .get(&parent)
                    .cloned()
                    .unwrap_or_default();
            }
        }

        for ids in children.values_mut() {
            ids.sort_unstable();
            ids.dedup();
        }
        (children, depth)
    }

    /// 0/255 mask of voxels labeled with the region at `path` or any region
    /// in its subtree. For a leaf this is a plain equality mask.
    pub fn filter_region(
        &self,
        annotation: &Vol<u32>,
        path: &str,
        children: &BTreeMap<String, Vec<u32>>,
    ) -> Result<MaskVol, AtlasError> {
        let id = self
            .id_of_path(path)
            .ok_or_else(|| AtlasError::UnknownRegion(path.to_string()))?;

        let mut wanted: HashSet<u32> = HashSet::new();
        wanted.insert(id);
        if !self.is_leaf(path) {
            if let Some(ids) = children.get(path) {
                wanted.extend(ids.iter().copied());
            }
        }

        let mut mask = MaskVol::new(annotation.dims);
        for (dst, label) in mask.arr.iter_mut().zip(&annotation.arr) {
            if wanted.contains(label) {
                *dst = 255;
            }
        }
        Ok(mask)
    }

    /// Ids of regions whose path contains every keyword, case-insensitive,
    /// in registration order. No match yields an empty list, not an error.
    pub fn search_by_keywords(&self, keywords: &[&str], leaf_only: bool) -> Vec<u32> {
        let lowered: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        let mut ids = Vec::new();
        for path in &self.paths {
            if leaf_only && !self.is_leaf(path) {
                continue;
            }
            let path_lower = path.to_lowercase();
            if lowered.iter().all(|k| path_lower.contains(k)) {
                ids.push(self.id_by_path[path.as_str()]);
            }
        }
        ids
    }
}

fn darken_or_keep(rgb: [f32; 3], darken: bool) -> [f32; 3] {
    if darken { darken_color(rgb) } else { rgb }
}

// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{stub_ontology_json, TOP_REGION};

    fn index() -> HierarchyIndex {
        HierarchyIndex::from_json_str(stub_ontology_json(), true).expect("stub ontology parses")
    }

    #[test]
    fn parent_paths_are_strict_prefixes() {
        let index = index();
        assert!(index.len() > 5);
        for path in index.paths() {
            let parent = index.parent_path(path).unwrap();
            if parent.is_empty() {
                // Root.
                assert_eq!(path, &format!("|{TOP_REGION}"));
                continue;
            }
            assert!(path.starts_with(parent) && path.len() > parent.len());
        }
    }

    #[test]
    fn leaf_flags_match_children() {
        let index = index();
        let mol_path = index.path_of_name("Lingula (I), molecular layer").unwrap();
        assert!(index.is_leaf(mol_path));
        let lin_path = index.path_of_name("Lingula (I)").unwrap();
        assert!(!index.is_leaf(lin_path));
        assert!(!index.is_leaf(index.path_of_name(TOP_REGION).unwrap()));
    }

    #[test]
    fn paths_and_ids_are_mutual_inverses() {
        let index = index();
        for path in index.paths() {
            let id = index.id_of_path(path).unwrap();
            assert_eq!(index.path_of_id(id), Some(path.as_str()));
        }
    }

    #[test]
    fn bright_colors_are_darkened() {
        let index = index();
        // FFFC91 sums over the 75% white limit, so it must come back scaled.
        let color = index
            .color_of_id(index.id_of_name("Lingula (I)").unwrap())
            .unwrap();
        let sum: f32 = color.iter().sum();
        assert!((sum - DARKEN_LIMIT).abs() < 0.01, "sum was {sum}");

        let undarkened = HierarchyIndex::from_json_str(stub_ontology_json(), false).unwrap();
        let raw = undarkened
            .color_of_id(undarkened.id_of_name("Lingula (I)").unwrap())
            .unwrap();
        assert_eq!(raw, [255.0, 252.0, 145.0]);
    }

    #[test]
    fn bad_color_is_fatal() {
        let err = hex_to_rgb("GGHHII").unwrap_err();
        assert!(matches!(err, AtlasError::BadColor(_)));
    }

    #[test]
    fn missing_required_field_is_fatal() {
        let json = r#"{"msg": [{"id": 1, "name": "x", "acronym": "x"}]}"#;
        let err = HierarchyIndex::from_json_str(json, true).unwrap_err();
        assert!(matches!(err, AtlasError::Ontology(_)));
    }

    #[test]
    fn find_unique_regions_adds_ancestor_closure() {
        let index = index();
        let mol_id = index.id_of_name("Lingula (I), molecular layer").unwrap();

        let mut vol = Vol::<u32>::new([2, 2, 2]);
        vol[[0, 0, 0]] = mol_id;

        let uniques = index.find_unique_regions(&vol, TOP_REGION).unwrap();
        let expect: Vec<u32> = [
            "Lingula (I), molecular layer",
            "Lingula (I)",
            "Cerebellar cortex",
            "Cerebellum",
            TOP_REGION,
        ]
        .iter()
        .map(|n| index.id_of_name(n).unwrap())
        .collect();
        for id in &expect {
            assert!(uniques.contains(id), "missing {id}");
        }
        // The walk stops at the top region's parent, so the top region is the
        // last ancestor included.
        assert_eq!(uniques.len(), expect.len());
    }

    #[test]
    fn find_unique_regions_skips_labels_outside_top_region() {
        let index = index();
        let mut vol = Vol::<u32>::new([2, 2, 2]);
        vol[[0, 0, 0]] = 999_999; // not in the ontology
        let uniques = index.find_unique_regions(&vol, TOP_REGION).unwrap();
        assert!(uniques.is_empty());
    }

    #[test]
    fn find_children_collects_subtrees_and_depths() {
        let index = index();
        let mol_id = index.id_of_name("Lingula (I), molecular layer").unwrap();
        let gr_id = index.id_of_name("Lingula (I), granular layer").unwrap();
        let lin_id = index.id_of_name("Lingula (I)").unwrap();
        let cbx_id = index.id_of_name("Cerebellar cortex").unwrap();

        let uniques: BTreeSet<u32> = [mol_id, lin_id, cbx_id].into_iter().collect();
        let (children, depth) = index.find_children(&uniques);

        let lin_path = index.path_of_name("Lingula (I)").unwrap();
        assert_eq!(children[lin_path], {
            let mut v = vec![mol_id, gr_id];
            v.sort_unstable();
            v
        });

        // Non-leaf uniques appear inside their ancestors' lists.
        let cbx_path = index.path_of_name("Cerebellar cortex").unwrap();
        assert!(children[cbx_path].contains(&lin_id));
        assert!(children[cbx_path].contains(&mol_id));

        assert_eq!(depth[&mol_id], 0);
        assert_eq!(depth[&lin_id], 1);
        assert_eq!(depth[&cbx_id], 2);
    }

    #[test]
    fn filter_region_covers_subtree() {
        let index = index();
        let lin_id = index.id_of_name("Lingula (I)").unwrap();
        let mol_id = index.id_of_name("Lingula (I), molecular layer").unwrap();
        let fl_id = index.id_of_name("Flocculus, molecular layer").unwrap();

        let mut vol = Vol::<u32>::new([3, 1, 1]);
        vol[[0, 0, 0]] = lin_id;
        vol[[1, 0, 0]] = mol_id;
        vol[[2, 0, 0]] = fl_id;

        let uniques = index.find_unique_regions(&vol, TOP_REGION).unwrap();
        let (children, _) = index.find_children(&uniques);
        let lin_path = index.path_of_name("Lingula (I)").unwrap();
        let mask = index.filter_region(&vol, lin_path, &children).unwrap();
        assert_eq!(mask.arr, vec![255, 255, 0]);

        // Leaf region: plain equality.
        let mol_path = index.path_of_name("Lingula (I), molecular layer").unwrap();
        let mask = index.filter_region(&vol, mol_path, &children).unwrap();
        assert_eq!(mask.arr, vec![0, 255, 0]);
    }

    #[test]
    fn keyword_search_requires_all_keywords() {
        let index = index();
        let ids = index.search_by_keywords(&["cerebellar cortex", "MOLECULAR"], true);
        let expect: Vec<u32> = ["Lingula (I), molecular layer", "Flocculus, molecular layer"]
            .iter()
            .map(|n| index.id_of_name(n).unwrap())
            .collect();
        assert_eq!(ids, expect);

        assert!(index.search_by_keywords(&["no such region"], false).is_empty());

        // leaf_only=false also returns mid regions.
        let all = index.search_by_keywords(&["cerebellar cortex"], false);
        assert!(all.contains(&index.id_of_name("Cerebellar cortex").unwrap()));
    }

    #[test]
    fn flat_format_parses_and_derives_parent_paths() {
        let entries = vec![
            FlatRegion {
                id: 1,
                name: "Root".to_string(),
                full_name: "|Root".to_string(),
                is_leaf: false,
                color: [10.0, 20.0, 30.0],
                parent: 0,
            },
            FlatRegion {
                id: 2,
                name: "Child".to_string(),
                full_name: "|Root|Child".to_string(),
                is_leaf: true,
                color: [1.0, 2.0, 3.0],
                parent: 1,
            },
        ];
        let index = HierarchyIndex::from_flat(&entries).unwrap();
        assert_eq!(index.parent_path("|Root|Child"), Some("|Root"));
        assert_eq!(index.parent_path("|Root"), Some(""));
        assert_eq!(index.parent_name("Child"), Some("Root"));
        assert!(index.is_leaf("|Root|Child"));
        assert_eq!(index.color_of_id(2), Some([1.0, 2.0, 3.0]));
    }
}
