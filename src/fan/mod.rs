// src/fan/mod.rs
//! Live fan state and the RPC seam used to read and change it.

mod controller;

pub use controller::{FanController, status_lines};

use std::fmt;

use crate::error::Result;

// --- Data Structures ---

/// Operation modes in the order the mode button cycles through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationMode {
    Normal,
    Nature,
}

impl OperationMode {
    pub const ALL: [OperationMode; 2] = [OperationMode::Normal, OperationMode::Nature];

    pub fn name(self) -> &'static str {
        match self {
            OperationMode::Normal => "normal",
            OperationMode::Nature => "nature",
        }
    }

    /// The mode after this one, wrapping from the last back to the first.
    pub fn next(self) -> OperationMode {
        let index = Self::ALL.iter().position(|mode| *mode == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Left,
    Right,
}

impl MoveDirection {
    pub fn name(self) -> &'static str {
        match self {
            MoveDirection::Left => "left",
            MoveDirection::Right => "right",
        }
    }
}

/// Fan models with a known set of oscillation angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanModel {
    P9,
    P10,
    P11,
    P15,
    P18,
    P33,
}

impl FanModel {
    pub const DEFAULT: FanModel = FanModel::P10;

    pub fn from_id(id: &str) -> Option<FanModel> {
        match id {
            "dmaker.fan.p9" => Some(FanModel::P9),
            "dmaker.fan.p10" => Some(FanModel::P10),
            "dmaker.fan.p11" => Some(FanModel::P11),
            "dmaker.fan.p15" => Some(FanModel::P15),
            "dmaker.fan.p18" => Some(FanModel::P18),
            "dmaker.fan.p33" => Some(FanModel::P33),
            _ => None,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            FanModel::P9 => "dmaker.fan.p9",
            FanModel::P10 => "dmaker.fan.p10",
            FanModel::P11 => "dmaker.fan.p11",
            FanModel::P15 => "dmaker.fan.p15",
            FanModel::P18 => "dmaker.fan.p18",
            FanModel::P33 => "dmaker.fan.p33",
        }
    }

    /// Supported oscillation angles in degrees, ascending.
    pub fn supported_angles(self) -> &'static [u16] {
        match self {
            FanModel::P9 => &[30, 60, 90, 120, 150],
            FanModel::P10 | FanModel::P11 | FanModel::P15 | FanModel::P18 | FanModel::P33 => {
                &[30, 60, 90, 120, 140]
            }
        }
    }
}

pub const MIN_SPEED: u8 = 1;
pub const MAX_SPEED: u8 = 100;

/// Snapshot of everything the fan reports about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanStatus {
    pub power: bool,
    pub mode: OperationMode,
    pub speed: u8,
    pub oscillate: bool,
    pub angle: u16,
    pub led: bool,
    pub buzzer: bool,
    pub child_lock: bool,
    /// Minutes until the fan switches itself off, if a timer is set.
    pub delay_off_countdown: Option<u32>,
}

impl Default for FanStatus {
    fn default() -> Self {
        Self {
            power: false,
            mode: OperationMode::Normal,
            speed: 35,
            oscillate: false,
            angle: 90,
            led: true,
            buzzer: false,
            child_lock: false,
            delay_off_countdown: None,
        }
    }
}

// --- RPC Seam ---

/// A connected fan. Every call is a blocking round trip to the device.
pub trait FanDevice {
    fn model(&self) -> FanModel;
    fn status(&self) -> Result<FanStatus>;
    fn set_power(&mut self, on: bool) -> Result<()>;
    fn set_buzzer(&mut self, on: bool) -> Result<()>;
    fn set_child_lock(&mut self, on: bool) -> Result<()>;
    fn set_led(&mut self, on: bool) -> Result<()>;
    fn set_oscillate(&mut self, on: bool) -> Result<()>;
    fn set_speed(&mut self, speed: u8) -> Result<()>;
    fn set_angle(&mut self, angle: u16) -> Result<()>;
    fn set_mode(&mut self, mode: OperationMode) -> Result<()>;
    /// Nudges the fan head once in `direction`.
    fn set_rotate(&mut self, direction: MoveDirection) -> Result<()>;
}

/// Opens control sessions to fans on the local network.
pub trait FanConnector {
    type Device: FanDevice;

    fn connect(&self, address: &str, token: &str, model: Option<&str>) -> Result<Self::Device>;
}

// --- Guard Outcomes ---

/// Why a guarded operation left the fan untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    PowerOff,
    MinimumReached,
    MaximumReached,
    OscillationOn,
    OscillationOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Refused(Refusal),
}
