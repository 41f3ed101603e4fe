use std::collections::HashMap;
use std::error::Error;

use crate::config::BlocksConfig;
use crate::types::{AIR, BlockId, BlockType};

/// Id-indexed table of block types plus a name lookup. Id 0 is always
/// air; configs that omit it get it injected.
#[derive(Default, Clone, Debug)]
pub struct BlockRegistry {
    pub blocks: Vec<BlockType>,
    pub by_name: HashMap<String, BlockId>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            blocks: Vec::new(),
            by_name: HashMap::new(),
        };
        reg.push(air_type());
        reg
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&BlockType> {
        self.blocks.get(id as usize)
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    #[inline]
    pub fn is_translucent(&self, id: BlockId) -> bool {
        self.get(id).map(|ty| ty.translucent).unwrap_or(false)
    }

    #[inline]
    pub fn is_billboard(&self, id: BlockId) -> bool {
        self.get(id).map(|ty| ty.billboard).unwrap_or(false)
    }

    #[inline]
    pub fn casts_shadow(&self, id: BlockId) -> bool {
        self.get(id).map(|ty| ty.casts_shadow).unwrap_or(false)
    }

    #[inline]
    pub fn emission(&self, id: BlockId) -> u8 {
        self.get(id).map(|ty| ty.emission).unwrap_or(0)
    }

    fn push(&mut self, ty: BlockType) -> BlockId {
        let id = self.blocks.len() as BlockId;
        self.by_name.insert(ty.name.clone(), id);
        self.blocks.push(ty);
        id
    }

    pub fn from_config(cfg: &BlocksConfig) -> Result<Self, Box<dyn Error>> {
        let mut reg = Self::new();
        for def in &cfg.blocks {
            if def.name == "air" {
                continue;
            }
            let ty = BlockType {
                name: def.name.clone(),
                translucent: def.translucent.unwrap_or(false),
                billboard: def.billboard.unwrap_or(false),
                tessellates: def.tessellates.unwrap_or(true),
                casts_shadow: def.casts_shadow.unwrap_or(true),
                emission: def.emission.unwrap_or(0).min(15),
                textures: def
                    .textures
                    .as_ref()
                    .map(|t| t.resolve())
                    .unwrap_or([0; 6]),
                tint: def.tint.unwrap_or([255, 255, 255, 255]),
            };
            let assigned = reg.push(ty);
            if let Some(want) = def.id {
                if want != assigned {
                    return Err(format!(
                        "block '{}' wants id {} but lands at {} (ids must be dense and in order)",
                        def.name, want, assigned
                    )
                    .into());
                }
            }
        }
        Ok(reg)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: BlocksConfig = toml::from_str(text)?;
        Self::from_config(&cfg)
    }
}

fn air_type() -> BlockType {
    BlockType {
        name: "air".into(),
        translucent: true,
        billboard: false,
        tessellates: false,
        casts_shadow: false,
        emission: 0,
        textures: [0; 6],
        tint: [255, 255, 255, 255],
    }
}
