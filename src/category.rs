use std::collections::HashMap;

use crate::error::AtlasError;
use crate::hierarchy::{HierarchyIndex, PATH_SEP};
use crate::vol::Vol;

/// The closed set of paint classes a voxel is projected into for editing.
/// Codes match the reduced-volume convention: -1 for unlisted nonzero labels,
/// 0..=5 for the named classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum Category {
    /// Nonzero label not covered by any configured id list.
    Unassigned = -1,
    #[default]
    Outside = 0,
    Fiber = 1,
    /// Never paintable; set at projection time only.
    Protected = 2,
    Molecular = 3,
    Granular = 4,
    /// Outside voxel that differs from the committed baseline, so edits stay
    /// visible across sessions.
    Corrected = 5,
}

impl Category {
    pub fn code(self) -> i8 {
        self as i8
    }

    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            -1 => Some(Category::Unassigned),
            0 => Some(Category::Outside),
            1 => Some(Category::Fiber),
            2 => Some(Category::Protected),
            3 => Some(Category::Molecular),
            4 => Some(Category::Granular),
            5 => Some(Category::Corrected),
            _ => None,
        }
    }

    /// Additive display tint over the grayscale base; `None` renders plain.
    pub fn tint(self) -> Option<[u8; 3]> {
        match self {
            Category::Molecular => Some([0, 77, 0]),
            Category::Granular => Some([77, 0, 0]),
            Category::Fiber => Some([0, 0, 77]),
            Category::Outside => Some([0, 0, 0]),
            Category::Protected => Some([77, 0, 77]),
            Category::Corrected => Some([77, 77, 0]),
            Category::Unassigned => None,
        }
    }
}

/// Full-resolution region ids backing each paintable category for one edit
/// session. Immutable during the session; protection may be narrowed before
/// the session starts (see [`session_category_ids`]).
#[derive(Debug, Clone, Default)]
pub struct CategoryIds {
    pub outside: Vec<u32>,
    pub fiber: Vec<u32>,
    pub protected: Vec<u32>,
    pub molecular: Vec<u32>,
    pub granular: Vec<u32>,
}

impl CategoryIds {
    pub fn ids_for(&self, cat: Category) -> &[u32] {
        match cat {
            Category::Outside => &self.outside,
            Category::Fiber => &self.fiber,
            Category::Protected => &self.protected,
            Category::Molecular => &self.molecular,
            Category::Granular => &self.granular,
            Category::Corrected | Category::Unassigned => &[],
        }
    }

    /// Projection table. Insertion order resolves overlapping ids: later
    /// categories win, ending with the paintable pair.
    pub fn category_by_id(&self) -> HashMap<u32, Category> {
        let mut map = HashMap::new();
        for cat in [
            Category::Outside,
            Category::Fiber,
            Category::Protected,
            Category::Molecular,
            Category::Granular,
        ] {
            for &id in self.ids_for(cat) {
                map.insert(id, cat);
            }
        }
        map
    }

    /// The full-resolution id written into the annotation at commit for a
    /// voxel of this category. Categories backed by several ids commit to
    /// their first registered id; everything else commits to 0.
    pub fn commit_id(&self, cat: Category) -> u32 {
        match cat {
            Category::Molecular => self.molecular.first().copied().unwrap_or(0),
            Category::Granular => self.granular.first().copied().unwrap_or(0),
            Category::Fiber => self.fiber.first().copied().unwrap_or(0),
            _ => 0,
        }
    }
}

/// Build the category → region-ids mapping for one correction session.
///
/// Mirrors the interactive setup flow: collect protected subtrees by name,
/// pair the chosen molecular layer with its granular sibling (same parent,
/// `", granular layer"` suffix), gather the fiber tract leaves by keyword,
/// then lift protection on the subtree being corrected.
pub fn session_category_ids(
    index: &HierarchyIndex,
    annotation: &Vol<u32>,
    molecular_id: u32,
    protected_regions: &[&str],
    top_region: &str,
) -> Result<CategoryIds, AtlasError> {
    let uniques = index.find_unique_regions(annotation, top_region)?;
    let (children, _) = index.find_children(&uniques);

    let mut protected: Vec<u32> = Vec::new();
    for name in protected_regions {
        let path = index
            .path_of_name(name)
            .ok_or_else(|| AtlasError::UnknownRegion((*name).to_string()))?;
        if let Some(ids) = children.get(path) {
            protected.extend_from_slice(ids);
        }
    }

    let mol_path = index
        .path_of_id(molecular_id)
        .ok_or_else(|| AtlasError::UnknownRegion(format!("id {molecular_id}")))?;
    let parent_path = index
        .parent_path(mol_path)
        .ok_or_else(|| AtlasError::UnknownRegion(mol_path.to_string()))?
        .to_string();
    let parent_last = parent_path
        .rsplit(PATH_SEP)
        .next()
        .unwrap_or_default()
        .to_string();
    let granular_path = format!("{parent_path}{PATH_SEP}{parent_last}, granular layer");
    let granular_id = index
        .id_of_path(&granular_path)
        .ok_or_else(|| AtlasError::UnknownRegion(granular_path.clone()))?;

    let fiber = index.search_by_keywords(&["cerebellum related fiber tracts"], true);

    // Lift protection on the region being corrected.
    if let Some(lifted) = children.get(parent_path.as_str()) {
        protected.retain(|id| !lifted.contains(id));
    }
    protected.sort_unstable();
    protected.dedup();

    Ok(CategoryIds {
        outside: vec![0],
        fiber,
        protected,
        molecular: vec![molecular_id],
        granular: vec![granular_id],
    })
}

// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{stub_ontology_json, TOP_REGION};

    #[test]
    fn codes_round_trip() {
        for cat in [
            Category::Unassigned,
            Category::Outside,
            Category::Fiber,
            Category::Protected,
            Category::Molecular,
            Category::Granular,
            Category::Corrected,
        ] {
            assert_eq!(Category::from_code(cat.code()), Some(cat));
        }
        assert_eq!(Category::from_code(6), None);
    }

    #[test]
    fn later_categories_win_overlapping_ids() {
        let ids = CategoryIds {
            outside: vec![0],
            fiber: vec![7],
            protected: vec![7, 8],
            molecular: vec![8],
            granular: vec![],
        };
        let map = ids.category_by_id();
        assert_eq!(map[&7], Category::Protected);
        assert_eq!(map[&8], Category::Molecular);
        assert_eq!(map[&0], Category::Outside);
    }

    #[test]
    fn commit_ids_use_first_registered_id() {
        let ids = CategoryIds {
            fiber: vec![30, 31, 32],
            molecular: vec![10],
            granular: vec![20],
            ..Default::default()
        };
        assert_eq!(ids.commit_id(Category::Molecular), 10);
        assert_eq!(ids.commit_id(Category::Granular), 20);
        assert_eq!(ids.commit_id(Category::Fiber), 30);
        assert_eq!(ids.commit_id(Category::Outside), 0);
        assert_eq!(ids.commit_id(Category::Corrected), 0);
        assert_eq!(ids.commit_id(Category::Unassigned), 0);
    }

    #[test]
    fn session_ids_pair_layers_and_lift_protection() {
        let index = HierarchyIndex::from_json_str(stub_ontology_json(), true).unwrap();
        let lin_mol = index.id_of_name("Lingula (I), molecular layer").unwrap();
        let lin_gr = index.id_of_name("Lingula (I), granular layer").unwrap();
        let fl_mol = index.id_of_name("Flocculus, molecular layer").unwrap();
        let fl_gr = index.id_of_name("Flocculus, granular layer").unwrap();
        let fib = index.id_of_name("arbor vitae").unwrap();

        let mut vol = Vol::<u32>::new([4, 1, 1]);
        vol[[0, 0, 0]] = lin_mol;
        vol[[1, 0, 0]] = fl_mol;
        vol[[2, 0, 0]] = fl_gr;
        vol[[3, 0, 0]] = fib;

        let ids = session_category_ids(
            &index,
            &vol,
            lin_mol,
            &["Lingula (I)", "Flocculus"],
            TOP_REGION,
        )
        .unwrap();

        assert_eq!(ids.molecular, vec![lin_mol]);
        assert_eq!(ids.granular, vec![lin_gr]);
        assert_eq!(ids.fiber, vec![fib]);
        assert_eq!(ids.outside, vec![0]);
        // Lingula's protection is lifted because it is the region under
        // correction; Flocculus stays protected.
        assert!(ids.protected.contains(&fl_mol));
        assert!(ids.protected.contains(&fl_gr));
        assert!(!ids.protected.contains(&lin_mol));
        assert!(!ids.protected.contains(&lin_gr));
    }

    #[test]
    fn session_ids_reject_unknown_protected_region() {
        let index = HierarchyIndex::from_json_str(stub_ontology_json(), true).unwrap();
        let lin_mol = index.id_of_name("Lingula (I), molecular layer").unwrap();
        let vol = Vol::<u32>::new([1, 1, 1]);
        let err = session_category_ids(&index, &vol, lin_mol, &["Nonexistent"], TOP_REGION);
        assert!(matches!(err, Err(AtlasError::UnknownRegion(_))));
    }
}
