use std::collections::HashSet;

use crate::sprite::{Sprite, SpriteId};

pub const STAGE_WIDTH: f64 = 480.0;
pub const STAGE_HEIGHT: f64 = 360.0;

/// Key and mouse state captured between ticks. The runtime only reads it, so
/// every block evaluated within one tick observes the same world view.
#[derive(Debug, Default)]
pub struct InputSnapshot {
  pub keys: HashSet<String>,
  pub mouse_x: f64,
  pub mouse_y: f64,
  pub mouse_down: bool,
}

impl InputSnapshot {
  pub fn press(&mut self, key: &str) {
    self.keys.insert(key.to_lowercase());
  }

  pub fn release(&mut self, key: &str) {
    self.keys.remove(&key.to_lowercase());
  }

  /// Accepts the palette's key names ("space", "left arrow", ..., "any").
  pub fn key_pressed(&self, key: &str) -> bool {
    match key {
      "any" => !self.keys.is_empty(),
      "space" => self.keys.contains("space") || self.keys.contains(" "),
      "left arrow" => self.keys.contains("arrowleft"),
      "right arrow" => self.keys.contains("arrowright"),
      "up arrow" => self.keys.contains("arrowup"),
      "down arrow" => self.keys.contains("arrowdown"),
      other => self.keys.contains(&other.to_lowercase()),
    }
  }
}

/// Owns the actor list and the input snapshot. 480x360 logical stage with a
/// centered origin.
#[derive(Debug, Default)]
pub struct Stage {
  sprites: Vec<Sprite>,
  next_id: u32,
  pub input: InputSnapshot,
}

impl Stage {
  pub fn new() -> Stage {
    Stage::default()
  }

  pub fn add_sprite(&mut self, name: &str) -> SpriteId {
    let id = SpriteId(self.next_id);
    self.next_id += 1;
    self.sprites.push(Sprite::new(id, name));
    id
  }

  /// Copies position, heading, size and visibility from the prototype; the
  /// clone runs the prototype's scripts but owns none itself.
  pub fn add_clone(&mut self, prototype: SpriteId) -> Option<SpriteId> {
    let proto = self.get(prototype)?;
    let mut clone = Sprite::new(SpriteId(self.next_id), &format!("{}_clone", proto.name));
    clone.x = proto.x;
    clone.y = proto.y;
    clone.direction = proto.direction;
    clone.size = proto.size;
    clone.visible = proto.visible;
    clone.costume_count = proto.costume_count;
    clone.script_owner = proto.script_owner;
    clone.is_clone = true;
    self.next_id += 1;
    let id = clone.id;
    self.sprites.push(clone);
    Some(id)
  }

  pub fn get(&self, id: SpriteId) -> Option<&Sprite> {
    self.sprites.iter().find(|sprite| sprite.id == id)
  }

  pub fn get_mut(&mut self, id: SpriteId) -> Option<&mut Sprite> {
    self.sprites.iter_mut().find(|sprite| sprite.id == id)
  }

  pub fn remove(&mut self, id: SpriteId) -> bool {
    let before = self.sprites.len();
    self.sprites.retain(|sprite| sprite.id != id);
    self.sprites.len() != before
  }

  /// Sprites in declaration order.
  pub fn sprites(&self) -> &[Sprite] {
    &self.sprites
  }

  /// Overlap query for touching conditions: "mouse-pointer", "edge", or the
  /// name of another sprite. Unknown targets and missing sprites are false.
  pub fn touching(&self, id: SpriteId, target: &str) -> bool {
    let Some(sprite) = self.get(id) else {
      return false;
    };
    let radius = sprite.radius();
    match target {
      "mouse-pointer" => {
        (sprite.x - self.input.mouse_x).abs() < radius
          && (sprite.y - self.input.mouse_y).abs() < radius
      }
      "edge" => {
        sprite.x + radius > STAGE_WIDTH / 2.0
          || sprite.x - radius < -STAGE_WIDTH / 2.0
          || sprite.y + radius > STAGE_HEIGHT / 2.0
          || sprite.y - radius < -STAGE_HEIGHT / 2.0
      }
      name => self.sprites.iter().any(|other| {
        other.id != id
          && other.name == name
          && (sprite.x - other.x).abs() < radius + other.radius()
          && (sprite.y - other.y).abs() < radius + other.radius()
      }),
    }
  }

  /// Drops pending presentation state (speech bubbles). Cannot fail.
  pub fn clear_transient_state(&mut self) {
    for sprite in &mut self.sprites {
      sprite.bubble = None;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn key_names_normalize() {
    let mut input = InputSnapshot::default();
    input.press("ArrowLeft");
    assert!(input.key_pressed("left arrow"));
    assert!(input.key_pressed("any"));
    assert!(!input.key_pressed("space"));
    input.press(" ");
    assert!(input.key_pressed("space"));
  }

  #[test]
  fn clones_copy_state_but_not_script_ownership() {
    let mut stage = Stage::new();
    let proto = stage.add_sprite("Cat");
    {
      let sprite = stage.get_mut(proto).unwrap();
      sprite.x = 12.0;
      sprite.direction = 45.0;
      sprite.visible = false;
    }
    let clone = stage.add_clone(proto).unwrap();
    let first = stage.add_clone(clone).unwrap();
    let sprite = stage.get(clone).unwrap();
    assert_eq!(sprite.x, 12.0);
    assert_eq!(sprite.direction, 45.0);
    assert!(!sprite.visible);
    assert!(sprite.is_clone);
    assert_eq!(sprite.script_owner, proto);
    // clone of a clone still resolves to the root prototype
    assert_eq!(stage.get(first).unwrap().script_owner, proto);
  }

  #[test]
  fn touching_edge_and_sprites() {
    let mut stage = Stage::new();
    let a = stage.add_sprite("A");
    let b = stage.add_sprite("B");
    assert!(!stage.touching(a, "edge"));
    stage.get_mut(a).unwrap().x = 235.0;
    assert!(stage.touching(a, "edge"));
    stage.get_mut(a).unwrap().x = 10.0;
    stage.get_mut(b).unwrap().x = 20.0;
    assert!(stage.touching(a, "B"));
    stage.get_mut(b).unwrap().x = 200.0;
    assert!(!stage.touching(a, "B"));
  }

  #[test]
  fn remove_reports_whether_anything_was_removed() {
    let mut stage = Stage::new();
    let id = stage.add_sprite("A");
    assert!(stage.remove(id));
    assert!(!stage.remove(id));
  }
}
