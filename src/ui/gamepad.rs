/// Gamepad input tracker using gilrs.
///
/// Button mapping comes from the [gamepad] table in config.toml.
/// Default mapping:
///   D-pad / Left Stick    →  Up / Down
///   Start                 →  Open / close the escape menu
///   Select                →  Back
///   A                     →  Confirm
///   Y / B / X / L1 / R1   →  Play / Rewards / Character / Collections / Shop
///                            (direct jump, menu open or closed)

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::tab::Tab;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    L2,      // LeftTrigger2
    R2,      // RightTrigger2
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// What a pad press means to the app.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PadAction {
    Menu,
    Back,
    Confirm,
    Up,
    Down,
    Go(Tab),
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    menu: Vec<Btn>,
    back: Vec<Btn>,
    confirm: Vec<Btn>,
    tabs: Vec<(Tab, Vec<Btn>)>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            menu:    vec![Btn::Start],
            back:    vec![Btn::Select],
            confirm: vec![Btn::A],
            tabs: vec![
                (Tab::Play, vec![Btn::Y]),
                (Tab::Rewards, vec![Btn::B]),
                (Tab::Character, vec![Btn::X]),
                (Tab::Collections, vec![Btn::L1]),
                (Tab::Shop, vec![Btn::R1]),
            ],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    // All tracked buttons (indexed by Btn)
    buttons: [BtnState; 10],

    dpad_up: BtnState,
    dpad_down: BtnState,

    stick_up: BtnState,
    stick_down: BtnState,
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(e) => {
                    log::warn!("gamepad support unavailable: {}", e);
                    (None, false)
                }
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); 10],
            dpad_up: BtnState::default(),
            dpad_down: BtnState::default(),
            stick_up: BtnState::default(),
            stick_down: BtnState::default(),
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. An empty or unparseable list keeps
    /// the default for that action.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        fn apply(slot: &mut Vec<Btn>, names: &[String]) {
            let parsed = parse_list(names);
            if !parsed.is_empty() { *slot = parsed; }
        }

        let map = &mut self.action_map;
        apply(&mut map.menu, &cfg.menu);
        apply(&mut map.back, &cfg.back);
        apply(&mut map.confirm, &cfg.confirm);
        for (tab, btns) in &mut map.tabs {
            let names = match tab {
                Tab::Play => &cfg.play,
                Tab::Rewards => &cfg.rewards,
                Tab::Character => &cfg.character,
                Tab::Collections => &cfg.collections,
                Tab::Shop => &cfg.shop,
            };
            apply(btns, names);
        }
    }

    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    if axis == Axis::LeftStickY {
                        self.stick_y = value;
                    }
                }
                EventType::Connected => {
                    log::info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    log::info!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        let prev_up = self.stick_up.held;
        let prev_down = self.stick_down.held;
        self.stick_up.held = self.stick_y > STICK_DEADZONE;
        self.stick_down.held = self.stick_y < -STICK_DEADZONE;
        if self.stick_up.held && !prev_up { self.stick_up.just_pressed = true; }
        if self.stick_down.held && !prev_down { self.stick_down.just_pressed = true; }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool, just_pressed: bool) {
        // D-pad handled separately (not in Btn enum)
        match gilrs_btn {
            Button::DPadUp   => { self.dpad_up.held = held; if just_pressed { self.dpad_up.just_pressed = true; } return; }
            Button::DPadDown => { self.dpad_down.held = held; if just_pressed { self.dpad_down.just_pressed = true; } return; }
            _ => {}
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.press(btn, held, just_pressed);
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn press(&mut self, btn: Btn, held: bool, just_pressed: bool) {
        let idx = btn_index(btn);
        self.buttons[idx].held = held;
        if just_pressed {
            self.buttons[idx].just_pressed = true;
        }
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    /// Edge-triggered actions for this frame, menu first.
    pub fn actions(&self) -> Vec<PadAction> {
        let map = &self.action_map;
        let mut out = Vec::new();
        if self.any_just_pressed(&map.menu) { out.push(PadAction::Menu); }
        if self.any_just_pressed(&map.back) { out.push(PadAction::Back); }
        if self.any_just_pressed(&map.confirm) { out.push(PadAction::Confirm); }
        if self.dpad_up.just_pressed || self.stick_up.just_pressed { out.push(PadAction::Up); }
        if self.dpad_down.just_pressed || self.stick_down.just_pressed { out.push(PadAction::Down); }
        for (tab, btns) in &map.tabs {
            if self.any_just_pressed(btns) {
                out.push(PadAction::Go(*tab));
            }
        }
        out
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for b in &mut self.buttons { b.just_pressed = false; }
        self.dpad_up.just_pressed = false;
        self.dpad_down.just_pressed = false;
        self.stick_up.just_pressed = false;
        self.stick_down.just_pressed = false;
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for b in &mut self.buttons { *b = BtnState::default(); }
        self.dpad_up = BtnState::default();
        self.dpad_down = BtnState::default();
        self.stick_up = BtnState::default();
        self.stick_down = BtnState::default();
        self.stick_y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad() -> GamepadState {
        // Construct without touching gilrs so tests run headless.
        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: None,
            buttons: [BtnState::default(); 10],
            dpad_up: BtnState::default(),
            dpad_down: BtnState::default(),
            stick_up: BtnState::default(),
            stick_down: BtnState::default(),
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected: false,
        }
    }

    #[test]
    fn button_names_parse() {
        assert_eq!(Btn::from_name("start"), Some(Btn::Start));
        assert_eq!(Btn::from_name("LB"), Some(Btn::L1));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn default_mapping() {
        let mut p = pad();
        p.press(Btn::Start, true, true);
        p.press(Btn::B, true, true);
        assert_eq!(p.actions(), vec![PadAction::Menu, PadAction::Go(Tab::Rewards)]);

        p.clear_just_pressed();
        assert!(p.actions().is_empty());
    }

    #[test]
    fn config_overrides_only_valid_lists() {
        let mut p = pad();
        let cfg = GamepadConfig {
            menu: vec!["Select".into()],
            back: vec!["nonsense".into()],
            confirm: vec![],
            play: vec![],
            rewards: vec![],
            character: vec![],
            collections: vec![],
            shop: vec!["R2".into()],
        };
        p.load_button_config(&cfg);

        p.press(Btn::Select, true, true);
        p.press(Btn::R2, true, true);
        // Select now opens the menu and still means back.
        assert_eq!(p.actions(), vec![PadAction::Menu, PadAction::Back, PadAction::Go(Tab::Shop)]);
    }
}
