// src/fan/controller.rs
use super::{
    FanDevice, FanStatus, MAX_SPEED, MIN_SPEED, MoveDirection, Outcome, Refusal,
};
use crate::{
    error::Result,
    output::{Reporter, Tone, on_off},
};

/// Guarded commands against one fan.
///
/// Each command reads the live status right before deciding, so state is never
/// cached between calls. A command whose precondition does not hold prints why
/// and returns [`Outcome::Refused`]; only device transport failures are `Err`.
pub struct FanController<D, R> {
    device: D,
    reporter: R,
}

impl<D: FanDevice, R: Reporter> FanController<D, R> {
    pub fn new(device: D, reporter: R) -> Self {
        Self { device, reporter }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut R {
        &mut self.reporter
    }

    // --- Power Gate ---

    /// Runs `op` with the current status only if the fan is powered on.
    fn with_power<F>(&mut self, action: &str, op: F) -> Result<Outcome>
    where
        F: FnOnce(&mut Self, FanStatus) -> Result<Outcome>,
    {
        let status = self.device.status()?;
        if !status.power {
            self.reporter.failure(&format!(
                "Action '{}' requires power to be ON. Power is OFF.",
                action
            ));
            return Ok(Outcome::Refused(Refusal::PowerOff));
        }
        op(self, status)
    }

    // --- Ungated Toggles ---

    pub fn toggle_power(&mut self) -> Result<Outcome> {
        let status = self.device.status()?;
        self.device.set_power(!status.power)?;
        let now = self.device.status()?;
        tracing::debug!(power = now.power, "toggled power");
        self.reporter
            .success(&format!("Power: {}", on_off(now.power)));
        Ok(Outcome::Applied)
    }

    pub fn toggle_buzzer(&mut self) -> Result<Outcome> {
        let status = self.device.status()?;
        self.device.set_buzzer(!status.buzzer)?;
        let now = self.device.status()?;
        tracing::debug!(buzzer = now.buzzer, "toggled buzzer");
        self.reporter
            .success(&format!("Buzzer: {}", on_off(now.buzzer)));
        Ok(Outcome::Applied)
    }

    pub fn toggle_child_lock(&mut self) -> Result<Outcome> {
        let status = self.device.status()?;
        self.device.set_child_lock(!status.child_lock)?;
        let now = self.device.status()?;
        tracing::debug!(child_lock = now.child_lock, "toggled child lock");
        self.reporter
            .success(&format!("Child lock: {}", on_off(now.child_lock)));
        Ok(Outcome::Applied)
    }

    // --- Gated Toggles ---

    pub fn toggle_led(&mut self) -> Result<Outcome> {
        self.with_power("toggle LED indicators", |this, status| {
            this.device.set_led(!status.led)?;
            let now = this.device.status()?;
            this.reporter
                .success(&format!("LED indicators: {}", on_off(now.led)));
            Ok(Outcome::Applied)
        })
    }

    pub fn toggle_oscillation(&mut self) -> Result<Outcome> {
        self.with_power("toggle oscillation", |this, status| {
            this.device.set_oscillate(!status.oscillate)?;
            let now = this.device.status()?;
            tracing::debug!(oscillate = now.oscillate, "toggled oscillation");
            this.reporter
                .success(&format!("Oscillation: {}", on_off(now.oscillate)));
            Ok(Outcome::Applied)
        })
    }

    pub fn toggle_mode(&mut self) -> Result<Outcome> {
        self.with_power("toggle mode", |this, status| {
            this.device.set_mode(status.mode.next())?;
            let now = this.device.status()?;
            tracing::debug!(from = %status.mode, to = %now.mode, "switched mode");
            this.reporter.success(&format!(
                "Previous mode: {} --> Switched to: {}",
                status.mode.name().to_uppercase(),
                now.mode.name().to_uppercase()
            ));
            Ok(Outcome::Applied)
        })
    }

    // --- Speed ---

    pub fn increase_speed(&mut self) -> Result<Outcome> {
        self.with_power("increase speed", |this, status| {
            if status.speed >= MAX_SPEED {
                this.reporter.notice(&format!(
                    "Maximum speed reached. Current speed: {}",
                    status.speed
                ));
                return Ok(Outcome::Refused(Refusal::MaximumReached));
            }
            let target = (status.speed + 1).clamp(MIN_SPEED, MAX_SPEED);
            this.device.set_speed(target)?;
            let now = this.device.status()?;
            this.reporter.success(&format!(
                "Speed increased. Current speed: {}",
                now.speed
            ));
            Ok(Outcome::Applied)
        })
    }

    pub fn decrease_speed(&mut self) -> Result<Outcome> {
        self.with_power("decrease speed", |this, status| {
            if status.speed <= MIN_SPEED {
                this.reporter.notice(&format!(
                    "Minimum speed reached. Current speed: {}",
                    status.speed
                ));
                return Ok(Outcome::Refused(Refusal::MinimumReached));
            }
            let target = (status.speed - 1).clamp(MIN_SPEED, MAX_SPEED);
            this.device.set_speed(target)?;
            let now = this.device.status()?;
            this.reporter.success(&format!(
                "Speed decreased. Current speed: {}",
                now.speed
            ));
            Ok(Outcome::Applied)
        })
    }

    // --- Rotation ---

    pub fn rotate_left(&mut self) -> Result<Outcome> {
        self.rotate(MoveDirection::Left)
    }

    pub fn rotate_right(&mut self) -> Result<Outcome> {
        self.rotate(MoveDirection::Right)
    }

    fn rotate(&mut self, direction: MoveDirection) -> Result<Outcome> {
        let action = format!("rotate {}", direction.name());
        self.with_power(&action, |this, status| {
            if status.oscillate {
                this.reporter.failure("Cannot rotate while oscillation is ON");
                return Ok(Outcome::Refused(Refusal::OscillationOn));
            }
            this.device.set_rotate(direction)?;
            this.reporter
                .success(&format!("Rotated to the {}.", direction.name()));
            Ok(Outcome::Applied)
        })
    }

    // --- Angle ---

    pub fn increase_angle(&mut self) -> Result<Outcome> {
        self.with_power("increase angle", |this, status| {
            if !status.oscillate {
                this.reporter
                    .failure("Cannot adjust the angle while oscillation is OFF");
                return Ok(Outcome::Refused(Refusal::OscillationOff));
            }
            let angles = this.device.model().supported_angles();
            match angles.iter().copied().find(|angle| *angle > status.angle) {
                Some(target) => {
                    this.device.set_angle(target)?;
                    this.reporter.success(&format!(
                        "Angle increased. Current angle: {}",
                        target
                    ));
                    Ok(Outcome::Applied)
                }
                None => {
                    this.reporter.notice(&format!(
                        "Maximum angle reached. Current angle: {}",
                        status.angle
                    ));
                    Ok(Outcome::Refused(Refusal::MaximumReached))
                }
            }
        })
    }

    pub fn decrease_angle(&mut self) -> Result<Outcome> {
        self.with_power("decrease angle", |this, status| {
            if !status.oscillate {
                this.reporter
                    .failure("Cannot adjust the angle while oscillation is OFF");
                return Ok(Outcome::Refused(Refusal::OscillationOff));
            }
            let angles = this.device.model().supported_angles();
            match angles.iter().rev().copied().find(|angle| *angle < status.angle) {
                Some(target) => {
                    this.device.set_angle(target)?;
                    this.reporter.success(&format!(
                        "Angle decreased. Current angle: {}",
                        target
                    ));
                    Ok(Outcome::Applied)
                }
                None => {
                    this.reporter.notice(&format!(
                        "Minimum angle reached. Current angle: {}",
                        status.angle
                    ));
                    Ok(Outcome::Refused(Refusal::MinimumReached))
                }
            }
        })
    }

    // --- Status ---

    pub fn print_status(&mut self) -> Result<FanStatus> {
        let status = self.device.status()?;
        self.reporter.emit(Tone::Heading, "\nDevice status");
        for line in status_lines(&status) {
            self.reporter.success(&line);
        }
        Ok(status)
    }
}

/// The status block, one field per line.
pub fn status_lines(status: &FanStatus) -> Vec<String> {
    let countdown = match status.delay_off_countdown {
        Some(minutes) if minutes > 0 => minutes.to_string(),
        _ => "UNSET".to_string(),
    };
    vec![
        format!("Power: {}", on_off(status.power)),
        format!("Operation mode: {}", status.mode.name().to_uppercase()),
        format!("Speed: {}", status.speed),
        format!("Oscillation: {}", on_off(status.oscillate)),
        format!("Angle: {}", status.angle),
        format!("LED: {}", on_off(status.led)),
        format!("Buzzer: {}", on_off(status.buzzer)),
        format!("Child lock: {}", on_off(status.child_lock)),
        format!("Power-off time (minutes): {}", countdown),
    ]
}
