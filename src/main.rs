use std::time::Duration;

use blockscript::{Block, BlockKind, Event, Runtime, Script, ScriptStore, Stage};

fn main() {
  pretty_env_logger::init();

  let mut stage = Stage::new();
  let cat = stage.add_sprite("Cat");
  let bird = stage.add_sprite("Bird");

  let mut store = ScriptStore::new();
  store.add(
    cat,
    Script::new(vec![
      Block::new(BlockKind::WhenFlagClicked),
      Block::new(BlockKind::Say).input(0, "chasing!"),
      Block::new(BlockKind::Repeat).input(0, 20.0).body(vec![
        Block::new(BlockKind::MoveSteps).input(0, 5.0),
        Block::new(BlockKind::IfOnEdgeBounce),
      ]),
      Block::new(BlockKind::Broadcast).input(0, "caught"),
    ]),
  );
  store.add(
    bird,
    Script::new(vec![
      Block::new(BlockKind::WhenMessageReceived).input(0, "caught"),
      Block::new(BlockKind::SayForSecs).input(0, "oh no").input(1, 1.0),
      Block::new(BlockKind::Hide),
    ]),
  );

  let mut runtime = Runtime::new();
  runtime.start(&mut stage, &store);

  let frame_rate = 30;
  while runtime.is_running() && runtime.live_threads() > 0 {
    runtime.tick(&mut stage, &store);
    std::thread::sleep(Duration::new(0, 1_000_000_000u32 / frame_rate));
  }

  // a click on the bird would be forwarded by the embedder like this
  runtime.trigger_event(&Event::SpriteClicked(bird), &stage, &store);

  for sprite in stage.sprites() {
    log::info!(
      "{} finished at ({:.1}, {:.1}) visible={}",
      sprite.name,
      sprite.x,
      sprite.y,
      sprite.visible
    );
  }
}
