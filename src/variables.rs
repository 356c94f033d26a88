use std::collections::HashMap;

use crate::block::Value;
use crate::sprite::Sprite;

// Scoping contract: the actor-local map always wins on read, the global map
// is a read fallback only, and writes always target the local map.

pub fn get(sprite: &Sprite, globals: &HashMap<String, Value>, name: &str) -> Value {
  sprite
    .variables
    .get(name)
    .or_else(|| globals.get(name))
    .cloned()
    .unwrap_or(Value::Number(0.0))
}

pub fn set(sprite: &mut Sprite, name: &str, value: Value) {
  sprite.variables.insert(name.to_string(), value);
}

pub fn change(
  sprite: &mut Sprite,
  globals: &HashMap<String, Value>,
  name: &str,
  delta: f64,
) {
  let current = get(sprite, globals, name).to_f64();
  set(sprite, name, Value::Number(current + delta));
}
