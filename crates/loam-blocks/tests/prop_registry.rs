use loam_blocks::{AIR, BlockId, BlockRegistry};
use proptest::prelude::*;

#[derive(Clone, Debug)]
struct Def {
    translucent: bool,
    billboard: bool,
    casts_shadow: bool,
    emission: u8,
    tile: u16,
}

fn defs() -> impl Strategy<Value = Vec<Def>> {
    prop::collection::vec(
        (any::<bool>(), any::<bool>(), any::<bool>(), 0u8..32, 0u16..256).prop_map(
            |(translucent, billboard, casts_shadow, emission, tile)| Def {
                translucent,
                billboard,
                casts_shadow,
                emission,
                tile,
            },
        ),
        0..24,
    )
}

fn to_toml(defs: &[Def]) -> String {
    let mut text = String::new();
    for (i, d) in defs.iter().enumerate() {
        text.push_str(&format!(
            "[[blocks]]\nname = \"b{i}\"\ntranslucent = {}\nbillboard = {}\ncasts_shadow = {}\nemission = {}\ntextures = {}\n\n",
            d.translucent, d.billboard, d.casts_shadow, d.emission, d.tile
        ));
    }
    text
}

proptest! {
    #[test]
    fn names_map_to_dense_ids_in_config_order(defs in defs()) {
        let reg = BlockRegistry::from_toml_str(&to_toml(&defs)).unwrap();
        prop_assert_eq!(reg.blocks.len(), defs.len() + 1);
        prop_assert_eq!(reg.id_by_name("air"), Some(AIR));
        for i in 0..defs.len() {
            let id = reg.id_by_name(&format!("b{i}"));
            prop_assert_eq!(id, Some((i + 1) as BlockId));
        }
    }

    #[test]
    fn flag_predicates_mirror_the_config(defs in defs()) {
        let reg = BlockRegistry::from_toml_str(&to_toml(&defs)).unwrap();
        for (i, d) in defs.iter().enumerate() {
            let id = (i + 1) as BlockId;
            prop_assert_eq!(reg.is_translucent(id), d.translucent);
            prop_assert_eq!(reg.is_billboard(id), d.billboard);
            prop_assert_eq!(reg.casts_shadow(id), d.casts_shadow);
            // Emission is clamped into the light range on load.
            prop_assert_eq!(reg.emission(id), d.emission.min(15));
            prop_assert_eq!(reg.get(id).unwrap().textures, [d.tile; 6]);
        }
    }
}
