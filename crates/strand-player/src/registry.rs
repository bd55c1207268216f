//! Player instance registry
//!
//! An explicit host-owned table of live players. Acquisition is
//! find-or-create keyed by the player id; asking twice for the same id
//! hands back the same instance. Ids are fixed at creation, generated
//! when the caller supplies none.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use strand_backend::{RendererRegistry, SharedEnvironment};
use strand_page::{NodeId, Page};

use crate::player::Player;
use crate::PlayerError;

/// Declarative construction options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerOptions {
    /// Id of the page element to bind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
    /// Renderer names to narrow the candidate set to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renderers: Option<Vec<String>>,
}

/// What `acquire` should look up or create
#[derive(Debug, Clone)]
pub enum PlayerTarget {
    /// Create with a generated id
    None,
    /// Find-or-create by id; the id doubles as an element id
    Id(String),
    /// Bind to a specific page node
    Node(NodeId),
    /// Create from declarative options
    Options(PlayerOptions),
}

impl From<&str> for PlayerTarget {
    fn from(id: &str) -> Self {
        PlayerTarget::Id(id.to_string())
    }
}

impl From<NodeId> for PlayerTarget {
    fn from(node: NodeId) -> Self {
        PlayerTarget::Node(node)
    }
}

impl From<PlayerOptions> for PlayerTarget {
    fn from(options: PlayerOptions) -> Self {
        PlayerTarget::Options(options)
    }
}

/// The live-player table
pub struct PlayerRegistry {
    env: SharedEnvironment,
    players: Vec<Rc<RefCell<Player>>>,
    counter: u64,
}

impl PlayerRegistry {
    pub fn new(env: SharedEnvironment) -> Self {
        Self {
            env,
            players: Vec::new(),
            counter: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Look up a live player by id; first match wins
    pub fn find(&self, id: &str) -> Option<Rc<RefCell<Player>>> {
        self.players
            .iter()
            .find(|p| p.borrow().id() == id)
            .cloned()
    }

    /// Find-or-create a player
    ///
    /// An empty or absent id always creates a fresh instance with a
    /// generated id, so anonymous acquisitions never collide.
    pub fn acquire(
        &mut self,
        page: &mut Page,
        target: impl Into<PlayerTarget>,
    ) -> Result<Rc<RefCell<Player>>, PlayerError> {
        let (id_hint, node, options) = match target.into() {
            PlayerTarget::None => (None, None, None),
            PlayerTarget::Id(id) => {
                let node = page.get_element_by_id(&id);
                let hint = (!id.is_empty()).then_some(id);
                (hint, node, None)
            }
            PlayerTarget::Node(node) => {
                let hint = page
                    .element(node)
                    .ok()
                    .and_then(|e| e.attr("id"))
                    .filter(|id| !id.is_empty())
                    .map(str::to_string);
                (hint, Some(node), None)
            }
            PlayerTarget::Options(options) => {
                let hint = options.element.clone().filter(|id| !id.is_empty());
                let node = hint.as_deref().and_then(|id| page.get_element_by_id(id));
                (hint, node, Some(options))
            }
        };

        if let Some(id) = &id_hint {
            if let Some(existing) = self.find(id) {
                tracing::debug!(player = %id, "existing player reused");
                return Ok(existing);
            }
        }

        let id = id_hint.unwrap_or_else(|| {
            self.counter += 1;
            format!("strand_player_{}", self.counter)
        });
        tracing::info!(player = %id, "player created");

        let mut player = Player::new(id, RendererRegistry::detect(&self.env));
        if let Some(node) = node {
            player.bind_element(page, node)?;
        }
        if let Some(options) = options {
            if let Some(names) = &options.renderers {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                player.set_candidates(&names)?;
            }
            if let Some(w) = options.width {
                player.set(page, "width", w.into())?;
            }
            if let Some(h) = options.height {
                player.set(page, "height", h.into())?;
            }
            if let Some(v) = options.volume {
                player.set(page, "volume", v.into())?;
            }
            if let Some(m) = options.muted {
                player.set(page, "muted", m.into())?;
            }
            if let Some(src) = &options.src {
                player.load(page, src.as_str());
            }
        }

        let shared = Rc::new(RefCell::new(player));
        self.players.push(shared.clone());
        Ok(shared)
    }

    /// Destroy a player and drop it from the table
    pub fn release(&mut self, page: &mut Page, id: &str) -> bool {
        let Some(idx) = self.players.iter().position(|p| p.borrow().id() == id) else {
            return false;
        };
        let player = self.players.remove(idx);
        player.borrow_mut().destroy(page);
        true
    }

    /// Destroy every player
    pub fn clear(&mut self, page: &mut Page) {
        for player in self.players.drain(..) {
            player.borrow_mut().destroy(page);
        }
    }
}
