use std::collections::HashMap;

use crate::block::Block;
use crate::sprite::SpriteId;

/// An ordered block sequence. The first block, if a Hat kind, declares the
/// triggering event; a script without one is inert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
  pub blocks: Vec<Block>,
}

impl Script {
  pub fn new(blocks: Vec<Block>) -> Script {
    Script { blocks }
  }

  pub fn hat(&self) -> Option<&Block> {
    self.blocks.first().filter(|block| block.kind.is_hat())
  }
}

/// Per-actor script lists, read-only from the runtime's perspective.
#[derive(Debug, Default)]
pub struct ScriptStore {
  scripts: HashMap<SpriteId, Vec<Script>>,
}

impl ScriptStore {
  pub fn new() -> ScriptStore {
    ScriptStore::default()
  }

  pub fn add(&mut self, sprite: SpriteId, script: Script) {
    self.scripts.entry(sprite).or_default().push(script);
  }

  /// Scripts in declaration order; actors without scripts get an empty slice.
  pub fn scripts(&self, sprite: SpriteId) -> &[Script] {
    self.scripts.get(&sprite).map(Vec::as_slice).unwrap_or(&[])
  }
}
