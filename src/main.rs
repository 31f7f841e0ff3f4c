use ratlas::category::{session_category_ids, Category};
use ratlas::editor::AnnotationEditor;
use ratlas::hierarchy::HierarchyIndex;
use ratlas::vol::{Axis, Vol};

const TOP_REGION: &str = "Basic cell groups and regions";

// A miniature hierarchy document in the AIBS `{"msg": [root]}` wire shape,
// enough to run the whole correction flow end to end.
const ONTOLOGY_JSON: &str = r#"
    {
      "msg": [
        {
          "id": 8, "name": "Basic cell groups and regions", "acronym": "grey",
          "color_hex_triplet": "BFDAE3",
          "children": [
            {
              "id": 512, "name": "Cerebellum", "acronym": "CB",
              "color_hex_triplet": "F0F080",
              "children": [
                {
                  "id": 528, "name": "Cerebellar cortex", "acronym": "CBX",
                  "color_hex_triplet": "F0F080",
                  "children": [
                    {
                      "id": 912, "name": "Lingula (I)", "acronym": "LING",
                      "color_hex_triplet": "FFFC91",
                      "children": [
                        {
                          "id": 10707, "name": "Lingula (I), molecular layer",
                          "acronym": "LINGmo", "color_hex_triplet": "FFFC91"
                        },
                        {
                          "id": 10706, "name": "Lingula (I), granular layer",
                          "acronym": "LINGgr", "color_hex_triplet": "ECE754"
                        }
                      ]
                    },
                    {
                      "id": 1049, "name": "Flocculus", "acronym": "FL",
                      "color_hex_triplet": "FFFC91",
                      "children": [
                        {
                          "id": 10690, "name": "Flocculus, molecular layer",
                          "acronym": "FLmo", "color_hex_triplet": "FFFC91"
                        },
                        {
                          "id": 10691, "name": "Flocculus, granular layer",
                          "acronym": "FLgr", "color_hex_triplet": "ECE754"
                        }
                      ]
                    }
                  ]
                },
                {
                  "id": 1000, "name": "cerebellum related fiber tracts",
                  "acronym": "cbf", "color_hex_triplet": "CCCCCC",
                  "children": [
                    {
                      "id": 728, "name": "arbor vitae", "acronym": "arb",
                      "color_hex_triplet": "CCCCCC"
                    }
                  ]
                }
              ]
            }
          ]
        }
      ]
    }
"#;

/// Synthetic annotation: a Lingula molecular/granular slab pair, a protected
/// Flocculus block, and an arbor vitae fiber band.
fn synthetic_annotation() -> Vol<u32> {
    let mut ann = Vol::<u32>::new([40, 40, 40]);
    for x in 10..20 {
        for y in 10..20 {
            for z in 10..14 {
                ann[[x, y, z]] = 10707;
            }
            for z in 14..18 {
                ann[[x, y, z]] = 10706;
            }
        }
        for y in 20..24 {
            for z in 10..18 {
                ann[[x, y, z]] = 728;
            }
        }
    }
    for x in 25..30 {
        for y in 10..15 {
            for z in 10..15 {
                ann[[x, y, z]] = 10690;
            }
        }
    }
    ann
}

fn synthetic_nissl(dims: [usize; 3]) -> Vol<f32> {
    let mut nissl = Vol::<f32>::new(dims);
    for x in 0..dims[0] {
        for y in 0..dims[1] {
            for z in 0..dims[2] {
                nissl[[x, y, z]] = 1.0 + ((y + z) % 7) as f32;
            }
        }
    }
    nissl
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let index = HierarchyIndex::from_json_str(ONTOLOGY_JSON, true)
        .expect("Failed to parse ontology JSON");
    println!("indexed {} regions", index.len());

    let annotation = synthetic_annotation();
    let original = annotation.clone();
    let nissl = synthetic_nissl(annotation.dims);

    let uniques = index
        .find_unique_regions(&annotation, TOP_REGION)
        .expect("top region must exist");
    for &id in &uniques {
        println!("  present: {} ({id})", index.name_of_id(id).unwrap_or("?"));
    }

    let (_, depth) = index.find_children(&uniques);
    for &id in &uniques {
        println!("  depth {}: {}", depth[&id], index.name_of_id(id).unwrap_or("?"));
    }

    let fiber_hits = index.search_by_keywords(&["fiber tracts"], true);
    println!("fiber tract leaves: {fiber_hits:?}");

    let lingula_molecular = index
        .id_of_name("Lingula (I), molecular layer")
        .expect("ontology has the Lingula molecular layer");
    let ids = session_category_ids(&index, &annotation, lingula_molecular, &["Flocculus"], TOP_REGION)
        .expect("Failed to build category ids");
    println!(
        "session ids: mol {:?}, gl {:?}, fib {:?}, protected {:?}",
        ids.molecular, ids.granular, ids.fiber, ids.protected
    );

    let mut editor = AnnotationEditor::new(annotation, nissl, ids, Axis::Coronal, None)
        .expect("Failed to start the edit session");
    println!(
        "view bounds {:?}..{:?}, slice {}",
        editor.view().bounds.lo,
        editor.view().bounds.hi,
        editor.slice_pos()
    );

    // A granular stroke across the molecular band, then a fill we change our
    // mind about.
    editor.paint((10, 10), (10, 19), Category::Granular);
    editor.fill((12, 15), Category::Fiber);
    editor.revert_stroke();
    editor.paint((11, 10), (13, 12), Category::Outside);
    editor.change_slice(editor.slice_pos() as i64 + 1);
    editor.paint((11, 10), (13, 12), Category::Outside);
    editor.commit();

    #[cfg(feature = "im-io")]
    editor
        .save_slice_png("slice.png")
        .expect("Failed to write slice.png");

    let merged = editor.into_annotation();
    let changed = merged
        .arr
        .iter()
        .zip(&original.arr)
        .filter(|(a, b)| a != b)
        .count();
    println!("commit changed {changed} voxels");
}
