use std::collections::BTreeMap;
use std::fmt;

use crate::condition::Condition;

/// A literal slot value: number, string or color.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Number(f64),
  String(String),
  Color([u8; 3]),
}

impl Value {
  pub fn to_f64(&self) -> f64 {
    match self {
      Value::Number(number) => *number,
      Value::String(string) => string.parse::<f64>().unwrap_or(0.0),
      Value::Color(_) => 0.0,
    }
  }

  /// Numbers that parse from text stay numbers, everything else stays text.
  pub fn from_literal(raw: Value) -> Value {
    match raw {
      Value::String(string) => match string.parse::<f64>() {
        Ok(number) => Value::Number(number),
        Err(_) => Value::String(string),
      },
      other => other,
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Value::Number(number) => {
        if number.fract() == 0.0 && number.is_finite() && number.abs() < 1e15 {
          write!(f, "{}", *number as i64)
        } else {
          write!(f, "{number}")
        }
      }
      Value::String(string) => write!(f, "{string}"),
      Value::Color([r, g, b]) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
    }
  }
}

impl From<f64> for Value {
  fn from(number: f64) -> Value {
    Value::Number(number)
  }
}

impl From<&str> for Value {
  fn from(string: &str) -> Value {
    Value::String(string.to_string())
  }
}

impl From<String> for Value {
  fn from(string: String) -> Value {
    Value::String(string)
  }
}

/// The fixed block vocabulary. Kinds the runtime does not know about land in
/// `Unknown` and execute as a no-op.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
  // motion
  MoveSteps,
  TurnRight,
  TurnLeft,
  GoToXy,
  GoToTarget,
  GlideSecsToXy,
  PointInDirection,
  PointTowards,
  ChangeX,
  SetX,
  ChangeY,
  SetY,
  IfOnEdgeBounce,
  SetRotationStyle,
  // looks
  Say,
  SayForSecs,
  Think,
  ThinkForSecs,
  SwitchCostume,
  NextCostume,
  ChangeSize,
  SetSize,
  SetEffect,
  ChangeEffect,
  ClearEffects,
  Show,
  Hide,
  // events
  WhenFlagClicked,
  WhenKeyPressed,
  WhenSpriteClicked,
  WhenBackdropSwitches,
  WhenGreaterThan,
  WhenMessageReceived,
  WhenCloneStarts,
  Broadcast,
  BroadcastAndWait,
  // control
  WaitSecs,
  Repeat,
  Forever,
  If,
  IfElse,
  WaitUntil,
  RepeatUntil,
  Stop,
  CreateClone,
  DeleteClone,
  // sensing
  AskAndWait,
  ResetTimer,
  SetDragMode,
  // variables
  SetVariable,
  ChangeVariable,
  ShowVariable,
  HideVariable,
  Unknown(String),
}

impl BlockKind {
  /// Hat kinds only act as triggers at the head of a script.
  pub fn is_hat(&self) -> bool {
    matches!(
      self,
      BlockKind::WhenFlagClicked
        | BlockKind::WhenKeyPressed
        | BlockKind::WhenSpriteClicked
        | BlockKind::WhenBackdropSwitches
        | BlockKind::WhenGreaterThan
        | BlockKind::WhenMessageReceived
        | BlockKind::WhenCloneStarts
    )
  }
}

/// One node of a script: a kind, its literal inputs keyed by slot index, and
/// for c-blocks the inner (and else) body plus an optional condition tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
  pub kind: BlockKind,
  pub inputs: BTreeMap<u32, Value>,
  pub body: Vec<Block>,
  pub else_body: Vec<Block>,
  pub condition: Option<Condition>,
}

impl Block {
  pub fn new(kind: BlockKind) -> Block {
    Block {
      kind,
      inputs: BTreeMap::new(),
      body: Vec::new(),
      else_body: Vec::new(),
      condition: None,
    }
  }

  pub fn input(mut self, slot: u32, value: impl Into<Value>) -> Block {
    self.inputs.insert(slot, value.into());
    self
  }

  pub fn body(mut self, blocks: Vec<Block>) -> Block {
    self.body = blocks;
    self
  }

  pub fn else_body(mut self, blocks: Vec<Block>) -> Block {
    self.else_body = blocks;
    self
  }

  pub fn condition(mut self, condition: Condition) -> Block {
    self.condition = Some(condition);
    self
  }

  /// Missing slots fall back to the kind's default; unparseable text is 0.
  pub fn num_input(&self, slot: u32, default: f64) -> f64 {
    self.inputs.get(&slot).map(Value::to_f64).unwrap_or(default)
  }

  pub fn str_input(&self, slot: u32, default: &str) -> String {
    match self.inputs.get(&slot) {
      Some(value) => value.to_string(),
      None => default.to_string(),
    }
  }

  pub fn raw_input(&self, slot: u32) -> Option<&Value> {
    self.inputs.get(&slot)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn numeric_coercion() {
    assert_eq!(Value::Number(2.5).to_f64(), 2.5);
    assert_eq!(Value::String("42".into()).to_f64(), 42.0);
    assert_eq!(Value::String("apple".into()).to_f64(), 0.0);
    assert_eq!(Value::Color([255, 0, 0]).to_f64(), 0.0);
  }

  #[test]
  fn display_renders_whole_numbers_without_fraction() {
    assert_eq!(Value::Number(5.0).to_string(), "5");
    assert_eq!(Value::Number(5.5).to_string(), "5.5");
    assert_eq!(Value::Number(-3.0).to_string(), "-3");
    assert_eq!(Value::Color([0, 255, 15]).to_string(), "#00ff0f");
  }

  #[test]
  fn from_literal_keeps_numeric_strings_numeric() {
    assert_eq!(Value::from_literal(Value::String("7".into())), Value::Number(7.0));
    assert_eq!(
      Value::from_literal(Value::String("seven".into())),
      Value::String("seven".into())
    );
  }

  #[test]
  fn input_defaults_apply_only_when_absent() {
    let block = Block::new(BlockKind::MoveSteps).input(0, "junk");
    assert_eq!(block.num_input(0, 10.0), 0.0);
    assert_eq!(block.num_input(1, 10.0), 10.0);
  }

  #[test]
  fn hats_are_recognized() {
    assert!(BlockKind::WhenMessageReceived.is_hat());
    assert!(!BlockKind::Broadcast.is_hat());
    assert!(!BlockKind::Unknown("when_custom".into()).is_hat());
  }
}
