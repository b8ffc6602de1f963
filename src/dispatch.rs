// src/dispatch.rs
//! The polling loop that turns input events into fan commands.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use crate::{
    error::Result,
    fan::{FanController, FanDevice},
    input::{InputEvent, InputSource},
    output::{Reporter, Tone},
};

/// Fixed sleep between polls; input is not event driven.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

const ROTATE_AXIS: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleBuzzer,
    ToggleChildLock,
    ToggleMode,
    ToggleLed,
    RotateLeft,
    RotateRight,
    PrintStatus,
    TogglePower,
    Exit,
    ToggleOscillation,
    DecreaseAngle,
    IncreaseAngle,
    IncreaseSpeed,
    DecreaseSpeed,
}

/// The button and axis bindings.
pub fn command_for(event: InputEvent) -> Option<Command> {
    match event {
        InputEvent::ButtonDown(button) => match button {
            0 => Some(Command::ToggleBuzzer),      // A
            1 => Some(Command::ToggleChildLock),   // B
            2 => Some(Command::ToggleMode),        // X
            3 => Some(Command::ToggleLed),         // Y
            4 => Some(Command::RotateLeft),        // LB
            5 => Some(Command::RotateRight),       // RB
            6 => Some(Command::PrintStatus),       // BACK
            7 => Some(Command::TogglePower),       // START
            8 => Some(Command::Exit),              // HOME
            10 => Some(Command::ToggleOscillation), // right stick press
            11 => Some(Command::DecreaseAngle),    // d-pad left
            12 => Some(Command::IncreaseAngle),    // d-pad right
            13 => Some(Command::IncreaseSpeed),    // d-pad up
            14 => Some(Command::DecreaseSpeed),    // d-pad down
            _ => None,
        },
        InputEvent::AxisMotion { axis, value } if axis == ROTATE_AXIS => {
            if value <= -1.0 {
                Some(Command::RotateLeft)
            } else if value >= 1.0 {
                Some(Command::RotateRight)
            } else {
                None
            }
        }
        InputEvent::AxisMotion { .. } => None,
    }
}

// --- Loop ---

/// Polls one input source and drives one fan until told to stop.
pub struct Dispatcher<'a, I: ?Sized, D, R> {
    input: &'a mut I,
    controller: &'a mut FanController<D, R>,
    running: Arc<AtomicBool>,
    debug: bool,
    connected: bool,
    poll_interval: Duration,
}

impl<'a, I, D, R> Dispatcher<'a, I, D, R>
where
    I: InputSource + ?Sized,
    D: FanDevice,
    R: Reporter,
{
    pub fn new(
        input: &'a mut I,
        controller: &'a mut FanController<D, R>,
        running: Arc<AtomicBool>,
        debug: bool,
    ) -> Self {
        Self {
            input,
            controller,
            running,
            debug,
            connected: false,
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Runs until the exit button is pressed or the running flag is cleared.
    ///
    /// Device transport errors end the loop and are returned.
    pub fn run(&mut self) -> Result<()> {
        if self.input.device_count() > 0 {
            self.attach();
        } else {
            self.controller
                .reporter_mut()
                .failure(" => No gamepad connected.");
        }

        while self.running.load(Ordering::SeqCst) {
            self.tick()?;
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            thread::sleep(self.poll_interval);
        }

        if self.connected {
            self.input.close();
            self.connected = false;
        }
        tracing::info!("dispatch loop stopped");
        Ok(())
    }

    /// One poll: hot-plug check, then the queued events.
    pub fn tick(&mut self) -> Result<()> {
        let count = self.input.device_count();

        if count == 0 && self.connected {
            self.controller
                .reporter_mut()
                .failure(" => Gamepad disconnected.");
            tracing::info!("input device detached");
            self.input.close();
            self.connected = false;
        }

        if count > 0 && !self.connected {
            // Events queued before the device was opened are not delivered.
            self.attach();
        } else if self.connected {
            for event in self.input.poll()? {
                self.handle(event)?;
                if !self.running.load(Ordering::SeqCst) {
                    break;
                }
            }
        }
        Ok(())
    }

    fn attach(&mut self) {
        match self.input.open(0) {
            Ok(name) => {
                tracing::info!(device = %name, "input device attached");
                self.controller
                    .reporter_mut()
                    .success(&format!(" => Gamepad initialized: {}", name));
                self.connected = true;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to open input device");
                self.controller
                    .reporter_mut()
                    .failure(" => No gamepad connected.");
            }
        }
    }

    fn handle(&mut self, event: InputEvent) -> Result<()> {
        if self.debug {
            let echo = match event {
                InputEvent::ButtonDown(button) => format!(" => Gamepad button: {}", button),
                InputEvent::AxisMotion { axis, value } => {
                    format!(" => Gamepad axis {} moved to {:.2}", axis, value)
                }
            };
            self.controller.reporter_mut().emit(Tone::Debug, &echo);
        }

        let Some(command) = command_for(event) else {
            return Ok(());
        };
        tracing::debug!(?command, "dispatching");

        match command {
            Command::Exit => {
                self.controller.reporter_mut().success("Exiting...");
                self.running.store(false, Ordering::SeqCst);
            }
            Command::PrintStatus => {
                self.controller.print_status()?;
            }
            Command::ToggleBuzzer => {
                self.controller.toggle_buzzer()?;
            }
            Command::ToggleChildLock => {
                self.controller.toggle_child_lock()?;
            }
            Command::ToggleMode => {
                self.controller.toggle_mode()?;
            }
            Command::ToggleLed => {
                self.controller.toggle_led()?;
            }
            Command::RotateLeft => {
                self.controller.rotate_left()?;
            }
            Command::RotateRight => {
                self.controller.rotate_right()?;
            }
            Command::TogglePower => {
                self.controller.toggle_power()?;
            }
            Command::ToggleOscillation => {
                self.controller.toggle_oscillation()?;
            }
            Command::DecreaseAngle => {
                self.controller.decrease_angle()?;
            }
            Command::IncreaseAngle => {
                self.controller.increase_angle()?;
            }
            Command::IncreaseSpeed => {
                self.controller.increase_speed()?;
            }
            Command::DecreaseSpeed => {
                self.controller.decrease_speed()?;
            }
        }
        Ok(())
    }
}
