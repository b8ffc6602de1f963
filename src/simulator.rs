// src/simulator.rs
//! In-process stand-ins for the cloud account service and the fan RPC endpoint.
//!
//! The real protocols live outside this crate. The simulator answers the same
//! trait calls with realistic data so the whole login, selection and control
//! flow can run without an account or a fan on the network.

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use toml::Value;

use crate::{
    auth::{CloudAuth, CloudSession},
    config::{ConfigDocument, SIMULATOR_SECTION},
    devices::DeviceRecord,
    error::{FanPadError, Result},
    fan::{
        FanConnector, FanDevice, FanModel, FanStatus, MAX_SPEED, MIN_SPEED, MoveDirection,
        OperationMode,
    },
};

// --- Config ---

/// The `[simulator]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulatorConfig {
    /// When both are set only this account is accepted.
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub devices: Vec<DeviceRecord>,
}

impl SimulatorConfig {
    pub fn from_document(doc: &ConfigDocument) -> Result<Self> {
        let Some(section) = doc.section(SIMULATOR_SECTION) else {
            return Ok(Self::default());
        };
        Value::Table(section.clone())
            .try_into::<SimulatorConfig>()
            .map_err(|e| FanPadError::Config(format!("[{}]: {}", SIMULATOR_SECTION, e)))
    }

    /// Configured devices, or a small built-in household when none are listed.
    pub fn devices_or_default(&self) -> Vec<DeviceRecord> {
        if self.devices.is_empty() {
            default_devices()
        } else {
            self.devices.clone()
        }
    }
}

fn default_devices() -> Vec<DeviceRecord> {
    let device = |name: &str, online: bool, ip: &str, token: &str, model: FanModel, did: &str| {
        let mut extra = Map::new();
        extra.insert("did".to_string(), JsonValue::from(did));
        extra.insert("ssid".to_string(), JsonValue::from("home"));
        DeviceRecord {
            name: name.to_string(),
            is_online: online,
            local_ip: ip.to_string(),
            token: token.to_string(),
            model: Some(model.id().to_string()),
            extra,
        }
    };
    vec![
        device(
            "Living room fan",
            true,
            "192.168.1.50",
            "5c3f1e0b9a7d4c2e8f6a1b3d5e7f9a0c",
            FanModel::P10,
            "341582214",
        ),
        device(
            "Bedroom fan",
            true,
            "192.168.1.51",
            "0a9f7e5d3b1a8c6e4f2d0b9a7c5e3f1d",
            FanModel::P9,
            "341582215",
        ),
        device(
            "Garage fan",
            false,
            "192.168.1.52",
            "1d3f5e7c9a0b2d4f6e8a1c3e5f7b9d0a",
            FanModel::P33,
            "341582216",
        ),
    ]
}

// --- Cloud ---

pub struct SimulatedCloud {
    config: SimulatorConfig,
}

impl SimulatedCloud {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    /// One line telling the user that logins do not reach MiCloud.
    pub fn backend_notice(&self) -> String {
        let accepted = match (&self.config.username, &self.config.password) {
            (Some(username), Some(_)) => format!("only the [simulator] account '{}'", username),
            _ => "any non-empty username and password".to_string(),
        };
        format!(
            "Simulated cloud backend active: credentials are not sent to MiCloud, {} is accepted.",
            accepted
        )
    }
}

impl CloudAuth for SimulatedCloud {
    fn authenticate(&self, username: &str, password: &str) -> Result<Box<dyn CloudSession>> {
        if username.is_empty() || password.is_empty() {
            return Err(FanPadError::AccessDenied);
        }
        if let (Some(expected_user), Some(expected_pass)) =
            (&self.config.username, &self.config.password)
        {
            if username != expected_user.as_str() || password != expected_pass.as_str() {
                return Err(FanPadError::AccessDenied);
            }
        }
        Ok(Box::new(SimulatedSession {
            devices: self.config.devices_or_default(),
        }))
    }
}

struct SimulatedSession {
    devices: Vec<DeviceRecord>,
}

impl CloudSession for SimulatedSession {
    fn list_devices(&self) -> Result<Vec<DeviceRecord>> {
        Ok(self.devices.clone())
    }
}

// --- Fan ---

/// A fan whose live state is kept in memory.
#[derive(Debug, Clone)]
pub struct SimulatedFan {
    model: FanModel,
    state: FanStatus,
    reachable: bool,
    writes: usize,
    rotations: Vec<MoveDirection>,
}

impl SimulatedFan {
    pub fn new(model: FanModel) -> Self {
        Self::with_status(model, FanStatus::default())
    }

    pub fn with_status(model: FanModel, state: FanStatus) -> Self {
        Self {
            model,
            state,
            reachable: true,
            writes: 0,
            rotations: Vec::new(),
        }
    }

    pub fn state(&self) -> &FanStatus {
        &self.state
    }

    /// Number of successful setter calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn rotations(&self) -> &[MoveDirection] {
        &self.rotations
    }

    /// An unreachable fan fails every call with a transport error.
    pub fn set_reachable(&mut self, reachable: bool) {
        self.reachable = reachable;
    }

    fn ensure_reachable(&self) -> Result<()> {
        if self.reachable {
            Ok(())
        } else {
            Err(FanPadError::Transport(
                "device did not respond within the protocol timeout".to_string(),
            ))
        }
    }

    fn write(&mut self, apply: impl FnOnce(&mut FanStatus)) -> Result<()> {
        self.ensure_reachable()?;
        apply(&mut self.state);
        self.writes += 1;
        Ok(())
    }
}

impl FanDevice for SimulatedFan {
    fn model(&self) -> FanModel {
        self.model
    }

    fn status(&self) -> Result<FanStatus> {
        self.ensure_reachable()?;
        Ok(self.state.clone())
    }

    fn set_power(&mut self, on: bool) -> Result<()> {
        self.write(|state| state.power = on)
    }

    fn set_buzzer(&mut self, on: bool) -> Result<()> {
        self.write(|state| state.buzzer = on)
    }

    fn set_child_lock(&mut self, on: bool) -> Result<()> {
        self.write(|state| state.child_lock = on)
    }

    fn set_led(&mut self, on: bool) -> Result<()> {
        self.write(|state| state.led = on)
    }

    fn set_oscillate(&mut self, on: bool) -> Result<()> {
        self.write(|state| state.oscillate = on)
    }

    fn set_speed(&mut self, speed: u8) -> Result<()> {
        if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
            return Err(FanPadError::InvalidInput(format!(
                "speed {} is outside {}..={}",
                speed, MIN_SPEED, MAX_SPEED
            )));
        }
        self.write(|state| state.speed = speed)
    }

    fn set_angle(&mut self, angle: u16) -> Result<()> {
        if !self.model.supported_angles().contains(&angle) {
            return Err(FanPadError::InvalidInput(format!(
                "angle {} is not supported by {}",
                angle,
                self.model.id()
            )));
        }
        self.write(|state| state.angle = angle)
    }

    fn set_mode(&mut self, mode: OperationMode) -> Result<()> {
        self.write(|state| state.mode = mode)
    }

    fn set_rotate(&mut self, direction: MoveDirection) -> Result<()> {
        self.ensure_reachable()?;
        self.rotations.push(direction);
        self.writes += 1;
        Ok(())
    }
}

/// Hands out a fresh [`SimulatedFan`] for every address it is asked to connect to.
#[derive(Debug, Default)]
pub struct SimulatedConnector;

impl FanConnector for SimulatedConnector {
    type Device = SimulatedFan;

    fn connect(&self, address: &str, token: &str, model: Option<&str>) -> Result<SimulatedFan> {
        if address.is_empty() {
            return Err(FanPadError::Transport(
                "device has no local address".to_string(),
            ));
        }
        if token.is_empty() {
            return Err(FanPadError::Transport(format!(
                "no access token for device at {}",
                address
            )));
        }

        let model = match model.map(|id| (id, FanModel::from_id(id))) {
            Some((_, Some(model))) => model,
            Some((id, None)) => {
                tracing::warn!(model = id, fallback = FanModel::DEFAULT.id(), "unknown fan model");
                FanModel::DEFAULT
            }
            None => FanModel::DEFAULT,
        };
        tracing::info!(address, model = model.id(), "connected to simulated fan");
        Ok(SimulatedFan::new(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_account_accepts_any_non_empty_credentials() {
        let cloud = SimulatedCloud::new(SimulatorConfig::default());
        let session = cloud.authenticate("someone", "anything").unwrap();
        assert_eq!(session.list_devices().unwrap().len(), 3);
        assert!(matches!(
            cloud.authenticate("someone", ""),
            Err(FanPadError::AccessDenied)
        ));
    }

    #[test]
    fn notice_names_the_accepted_account() {
        let open = SimulatedCloud::new(SimulatorConfig::default());
        assert!(open.backend_notice().contains("any non-empty username and password"));

        let locked = SimulatedCloud::new(SimulatorConfig {
            username: Some("alice".into()),
            password: Some("s3cret".into()),
            devices: Vec::new(),
        });
        let notice = locked.backend_notice();
        assert!(notice.starts_with("Simulated cloud backend active"));
        assert!(notice.contains("'alice'"));
        assert!(!notice.contains("s3cret"));
    }

    #[test]
    fn configured_account_rejects_other_credentials() {
        let cloud = SimulatedCloud::new(SimulatorConfig {
            username: Some("alice".into()),
            password: Some("s3cret".into()),
            devices: Vec::new(),
        });
        assert!(cloud.authenticate("alice", "s3cret").is_ok());
        assert!(matches!(
            cloud.authenticate("alice", "wrong"),
            Err(FanPadError::AccessDenied)
        ));
    }

    #[test]
    fn unreachable_fan_reports_transport_error() {
        let mut fan = SimulatedFan::new(FanModel::P10);
        fan.set_reachable(false);
        assert!(matches!(fan.status(), Err(FanPadError::Transport(_))));
        assert!(matches!(fan.set_power(true), Err(FanPadError::Transport(_))));
        assert_eq!(fan.writes(), 0);
    }

    #[test]
    fn fan_rejects_unsupported_angle() {
        let mut fan = SimulatedFan::new(FanModel::P10);
        assert!(fan.set_angle(150).is_err());
        assert!(fan.set_angle(140).is_ok());
        assert_eq!(fan.state().angle, 140);
    }

    #[test]
    fn connector_falls_back_to_default_model() {
        let connector = SimulatedConnector;
        let fan = connector
            .connect("192.168.1.50", "abc", Some("zhimi.fan.za4"))
            .unwrap();
        assert_eq!(fan.model(), FanModel::DEFAULT);
        let fan = connector
            .connect("192.168.1.51", "abc", Some("dmaker.fan.p9"))
            .unwrap();
        assert_eq!(fan.model(), FanModel::P9);
        assert!(connector.connect("", "abc", None).is_err());
    }
}
