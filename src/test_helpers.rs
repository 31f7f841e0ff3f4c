//! Shared fixtures for the unit tests: a miniature region ontology covering
//! the cases the real AIBS document exercises (layered leaf pairs, a fiber
//! tract branch, bright colors, leaf nodes with no `children` key).

pub const TOP_REGION: &str = "Basic cell groups and regions";

/// A cut-down hierarchy document in the `{"msg": [root]}` wire shape.
///
/// Layout (ids in parentheses):
/// ```text
/// Basic cell groups and regions (8)
///   Cerebellum (512)
///     Cerebellar cortex (528)
///       Lingula (I) (912)
///         Lingula (I), molecular layer (10707)
///         Lingula (I), granular layer (10706)
///       Flocculus (1049)
///         Flocculus, molecular layer (10690)
///         Flocculus, granular layer (10691)
///     cerebellum related fiber tracts (1000)
///       arbor vitae (728)
/// ```
pub fn stub_ontology_json() -> &'static str {
    r##"{
  "msg": [
    {
      "id": 8,
      "name": "Basic cell groups and regions",
      "acronym": "grey",
      "color_hex_triplet": "BFDAE3",
      "children": [
        {
          "id": 512,
          "name": "Cerebellum",
          "acronym": "CB",
          "color_hex_triplet": "F0F080",
          "children": [
            {
              "id": 528,
              "name": "Cerebellar cortex",
              "acronym": "CBX",
              "color_hex_triplet": "F0F080",
              "children": [
                {
                  "id": 912,
                  "name": "Lingula (I)",
                  "acronym": "LING",
                  "color_hex_triplet": "FFFC91",
                  "children": [
                    {
                      "id": 10707,
                      "name": "Lingula (I), molecular layer",
                      "acronym": "LINGmo",
                      "color_hex_triplet": "FFFC91"
                    },
                    {
                      "id": 10706,
                      "name": "Lingula (I), granular layer",
                      "acronym": "LINGgr",
                      "color_hex_triplet": "ECE754"
                    }
                  ]
                },
                {
                  "id": 1049,
                  "name": "Flocculus",
                  "acronym": "FL",
                  "color_hex_triplet": "FFFC91",
                  "children": [
                    {
                      "id": 10690,
                      "name": "Flocculus, molecular layer",
                      "acronym": "FLmo",
                      "color_hex_triplet": "FFFC91"
                    },
                    {
                      "id": 10691,
                      "name": "Flocculus, granular layer",
                      "acronym": "FLgr",
                      "color_hex_triplet": "ECE754"
                    }
                  ]
                }
              ]
            },
            {
              "id": 1000,
              "name": "cerebellum related fiber tracts",
              "acronym": "cbf",
              "color_hex_triplet": "CCCCCC",
              "children": [
                {
                  "id": 728,
                  "name": "arbor vitae",
                  "acronym": "arb",
                  "color_hex_triplet": "CCCCCC"
                }
              ]
            }
          ]
        }
      ]
    }
  ]
}"##
}
