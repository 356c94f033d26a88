use crate::block::Value;
use crate::sprite::SpriteId;
use crate::stage::Stage;

/// Boolean expression tree attached to conditional blocks. Every node owns
/// its children outright; there are no shared or back references.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
  Greater { left: Value, right: Value },
  Less { left: Value, right: Value },
  Equals { left: Value, right: Value },
  Contains { text: Value, pattern: Value },
  Touching { target: String },
  KeyPressed { key: String },
  MouseDown,
  And(Box<Condition>, Box<Condition>),
  Or(Box<Condition>, Box<Condition>),
  Not(Box<Condition>),
  Unknown,
}

impl Condition {
  pub fn and(self, other: Condition) -> Condition {
    Condition::And(Box::new(self), Box::new(other))
  }

  pub fn or(self, other: Condition) -> Condition {
    Condition::Or(Box::new(self), Box::new(other))
  }

  pub fn not(self) -> Condition {
    Condition::Not(Box::new(self))
  }
}

/// Pure and non-suspending. A missing sprite or an unknown kind is `false`.
pub fn evaluate(condition: &Condition, stage: &Stage, sprite: SpriteId) -> bool {
  match condition {
    Condition::Greater { left, right } => left.to_f64() > right.to_f64(),
    Condition::Less { left, right } => left.to_f64() < right.to_f64(),
    // Equality is textual: the left operand is coerced to a number first, so
    // "5" = "5.0" holds while "apple" = "apple" does not.
    Condition::Equals { left, right } => {
      Value::Number(left.to_f64()).to_string() == right.to_string()
    }
    Condition::Contains { text, pattern } => text
      .to_string()
      .to_lowercase()
      .contains(&pattern.to_string().to_lowercase()),
    Condition::Touching { target } => stage.touching(sprite, target),
    Condition::KeyPressed { key } => stage.input.key_pressed(key),
    Condition::MouseDown => stage.input.mouse_down,
    // Both operands are always evaluated, even when the first one already
    // decides the result.
    Condition::And(a, b) => {
      let a = evaluate(a, stage, sprite);
      let b = evaluate(b, stage, sprite);
      a && b
    }
    Condition::Or(a, b) => {
      let a = evaluate(a, stage, sprite);
      let b = evaluate(b, stage, sprite);
      a || b
    }
    Condition::Not(inner) => !evaluate(inner, stage, sprite),
    Condition::Unknown => false,
  }
}
