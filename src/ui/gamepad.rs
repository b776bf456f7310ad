/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping (face buttons laid out like the option grid):
///   Y / X / B / A         →  Option 1 / 2 / 3 / 4
///   D-pad / Left Stick    →  Move cursor up / down
///   Start                 →  Confirm cursor choice
///   Select                →  Quit
///   R1                    →  Restart
///   L1                    →  Toggle theme

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.5;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    L2,
    R2,
    Start,
    Select,
}

const BTN_COUNT: usize = 10;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.trim().to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "L2" | "LT" => Some(Btn::L2),
            "R2" | "RT" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2 => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Action-to-button mapping (loaded from config).
#[derive(Debug, PartialEq)]
struct ActionMap {
    options: [Vec<Btn>; 4],
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    restart: Vec<Btn>,
    theme: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            options: [vec![Btn::Y], vec![Btn::X], vec![Btn::B], vec![Btn::A]],
            confirm: vec![Btn::Start],
            cancel: vec![Btn::Select],
            restart: vec![Btn::R1],
            theme: vec![Btn::L1],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Edge flags, cleared at the start of every `update()`.
    just_pressed: [bool; BTN_COUNT],
    up_pressed: bool,
    down_pressed: bool,

    // Stick position and its digital direction last frame
    stick_y: f32,
    stick_dir: i8,

    action_map: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                tracing::warn!("gamepad support unavailable: {e}");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            just_pressed: [false; BTN_COUNT],
            up_pressed: false,
            down_pressed: false,
            stick_y: 0.0,
            stick_dir: 0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Lists that name no known button
    /// keep their default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String], slot: &mut Vec<Btn>) {
            let parsed: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if !parsed.is_empty() {
                *slot = parsed;
            }
        }
        let map = &mut self.action_map;
        for (names, slot) in cfg.options.iter().zip(map.options.iter_mut()) {
            parse_list(names, slot);
        }
        parse_list(&cfg.confirm, &mut map.confirm);
        parse_list(&cfg.cancel, &mut map.cancel);
        parse_list(&cfg.restart, &mut map.restart);
        parse_list(&cfg.theme, &mut map.theme);
    }

    pub fn update(&mut self) {
        self.just_pressed = [false; BTN_COUNT];
        self.up_pressed = false;
        self.down_pressed = false;

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
                    self.press(btn);
                }
                EventType::AxisChanged(Axis::LeftStickY, value, _) => {
                    self.connected = true;
                    self.stick_y = value;
                }
                EventType::Connected => self.connected = true,
                EventType::Disconnected => {
                    self.connected = false;
                    self.stick_y = 0.0;
                    self.stick_dir = 0;
                }
                _ => {}
            }
        }

        // Stick counts once per push past the deadzone
        let dir = if self.stick_y > STICK_DEADZONE {
            1
        } else if self.stick_y < -STICK_DEADZONE {
            -1
        } else {
            0
        };
        if dir != self.stick_dir {
            match dir {
                1 => self.up_pressed = true,
                -1 => self.down_pressed = true,
                _ => {}
            }
            self.stick_dir = dir;
        }
    }

    #[cfg(feature = "gamepad")]
    fn press(&mut self, gilrs_btn: Button) {
        match gilrs_btn {
            Button::DPadUp => self.up_pressed = true,
            Button::DPadDown => self.down_pressed = true,
            other => {
                if let Some(btn) = Btn::from_gilrs(other) {
                    self.just_pressed[btn as usize] = true;
                }
            }
        }
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.just_pressed[b as usize])
    }

    /// Option slot whose button went down this frame.
    pub fn option_pressed(&self) -> Option<usize> {
        self.action_map
            .options
            .iter()
            .position(|btns| self.any_just_pressed(btns))
    }
    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }
    pub fn restart_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.restart)
    }
    pub fn theme_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.theme)
    }

    pub fn up_pressed(&self) -> bool {
        self.up_pressed
    }
    pub fn down_pressed(&self) -> bool {
        self.down_pressed
    }
}
