//! Example: Basic usage of Strand

use std::cell::RefCell;
use std::rc::Rc;

use strand::{Environment, NodeId, Page, PlayerRegistry};

fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut page = Page::new();
    let stage = page.create_element("div");
    page.element_mut(stage).unwrap().set_attr("id", "stage");
    page.append_child(NodeId::ROOT, stage);

    let env = Rc::new(RefCell::new(Environment::full()));
    let mut players = PlayerRegistry::new(env);

    let player = players.acquire(&mut page, "stage").unwrap();
    player.borrow_mut().load(&mut page, "clip.mp4");
    player.borrow_mut().play();

    let player = player.borrow();
    println!("Strand v{} initialized", strand::VERSION);
    println!(
        "player {:?} is {:?} on renderer {:?}",
        player.id(),
        player.state(),
        player.current_renderer()
    );
}
