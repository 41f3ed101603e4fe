//! Serde mirror of the on-disk block config (TOML).

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct BlocksConfig {
    pub blocks: Vec<BlockDef>,
}

/// One `[[blocks]]` table. Every field except `name` has a default so
/// configs only spell out what differs from a plain opaque cube.
#[derive(Clone, Debug, Deserialize)]
pub struct BlockDef {
    pub name: String,
    /// Explicit id; defaults to the definition's position in the list.
    pub id: Option<u8>,
    pub translucent: Option<bool>,
    pub billboard: Option<bool>,
    pub tessellates: Option<bool>,
    pub casts_shadow: Option<bool>,
    pub emission: Option<u8>,
    /// Either one tile for all faces or six tiles in face order.
    pub textures: Option<TextureDef>,
    pub tint: Option<[u8; 4]>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum TextureDef {
    All(u16),
    PerFace([u16; 6]),
}

impl TextureDef {
    pub fn resolve(&self) -> [u16; 6] {
        match *self {
            TextureDef::All(t) => [t; 6],
            TextureDef::PerFace(t) => t,
        }
    }
}
