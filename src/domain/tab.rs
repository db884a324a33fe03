/// Tabs, their routes, and the path → tab derivation table.

/// A navigable destination of the main layout.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Tab {
    Play,
    Rewards,
    Character,
    Collections,
    Shop,
}

pub const ALL_TABS: [Tab; 5] = [Tab::Play, Tab::Rewards, Tab::Character, Tab::Collections, Tab::Shop];

impl Tab {
    /// Identifier stored in `GameState::active_tab`.
    pub fn id(self) -> &'static str {
        match self {
            Tab::Play => "play",
            Tab::Rewards => "rewards",
            Tab::Character => "character",
            Tab::Collections => "collections",
            Tab::Shop => "shop",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Tab::Play => "/overworld",
            Tab::Rewards => "/rewards",
            Tab::Character => "/character",
            Tab::Collections => "/collections",
            Tab::Shop => "/shop",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::Play => "Play",
            Tab::Rewards => "Rewards",
            Tab::Character => "Character",
            Tab::Collections => "Collections",
            Tab::Shop => "Shop",
        }
    }

    pub fn from_id(id: &str) -> Option<Tab> {
        ALL_TABS.iter().copied().find(|t| t.id() == id)
    }
}

// ── Route table ──

const ROUTES: &[(&str, Tab)] = &[
    ("/overworld", Tab::Play),
    ("/world", Tab::Play),
    ("/rewards", Tab::Rewards),
    ("/character", Tab::Character),
    ("/collections", Tab::Collections),
    ("/shop", Tab::Shop),
];

/// `path` starts with `prefix` on a segment boundary.
fn prefix_matches(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with(['/', '?', '#']),
        None => false,
    }
}

/// Longest-prefix match against the route table. Root and anything
/// unmatched fall back to `Play`.
pub fn tab_for_path(path: &str) -> Tab {
    ROUTES.iter()
        .filter(|(prefix, _)| prefix_matches(path, prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|&(_, tab)| tab)
        .unwrap_or(Tab::Play)
}

/// Path of the detail page for one world.
pub fn world_path(world_id: &str) -> String {
    format!("/world/{}", world_id)
}

/// World id of a `/world/<id>` path.
pub fn world_from_path(path: &str) -> Option<&str> {
    let rest = path.strip_prefix("/world/")?;
    let id = rest.split(['/', '?', '#']).next()?;
    if id.is_empty() { None } else { Some(id) }
}
