use std::collections::HashMap;
use std::fmt;

use crate::block::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteId(pub u32);

impl fmt::Display for SpriteId {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "sprite#{}", self.0)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStyle {
  AllAround,
  LeftRight,
  DontRotate,
}

impl RotationStyle {
  pub fn from_name(name: &str) -> Option<RotationStyle> {
    match name {
      "all around" => Some(RotationStyle::AllAround),
      "left-right" => Some(RotationStyle::LeftRight),
      "don't rotate" => Some(RotationStyle::DontRotate),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleKind {
  Say,
  Think,
}

/// The fixed graphic effect set. Writes to any other name are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects {
  pub color: f64,
  pub fisheye: f64,
  pub whirl: f64,
  pub pixelate: f64,
  pub brightness: f64,
  pub ghost: f64,
}

impl Effects {
  pub fn by_name_mut(&mut self, name: &str) -> Option<&mut f64> {
    match name {
      "color" => Some(&mut self.color),
      "fisheye" => Some(&mut self.fisheye),
      "whirl" => Some(&mut self.whirl),
      "pixelate" => Some(&mut self.pixelate),
      "brightness" => Some(&mut self.brightness),
      "ghost" => Some(&mut self.ghost),
      _ => None,
    }
  }

  pub fn clear(&mut self) {
    *self = Effects::default();
  }
}

/// A stage actor. The stage owns the actor list; the runtime reads and
/// mutates actor fields through it.
#[derive(Debug, Clone)]
pub struct Sprite {
  pub id: SpriteId,
  pub name: String,
  /// Scripts are never copied onto clones; clones resolve their scripts
  /// through the prototype's id, so clones of clones chain to the root.
  pub script_owner: SpriteId,
  pub is_clone: bool,
  pub x: f64,
  pub y: f64,
  /// Heading in degrees, 90 points right.
  pub direction: f64,
  /// Percent of natural size.
  pub size: f64,
  pub visible: bool,
  pub draggable: bool,
  pub rotation_style: RotationStyle,
  pub current_costume: usize,
  pub costume_count: usize,
  pub effects: Effects,
  pub variables: HashMap<String, Value>,
  pub bubble: Option<(BubbleKind, String)>,
}

impl Sprite {
  pub fn new(id: SpriteId, name: &str) -> Sprite {
    Sprite {
      id,
      name: name.to_string(),
      script_owner: id,
      is_clone: false,
      x: 0.0,
      y: 0.0,
      direction: 90.0,
      size: 100.0,
      visible: true,
      draggable: false,
      rotation_style: RotationStyle::AllAround,
      current_costume: 0,
      costume_count: 1,
      effects: Effects::default(),
      variables: HashMap::new(),
      bubble: None,
    }
  }

  /// Half-extent of the sprite's bounding box, scaled with size.
  pub fn radius(&self) -> f64 {
    self.size / 100.0 * 24.0
  }

  pub fn say(&mut self, text: String) {
    self.bubble = Some((BubbleKind::Say, text));
  }

  pub fn think(&mut self, text: String) {
    self.bubble = Some((BubbleKind::Think, text));
  }
}
