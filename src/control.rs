//! ==============================================================================
//! control.rs - manual override dispatcher and washer cycle timer
//! ==============================================================================
//!
//! purpose:
//!     translates operator intents ("lights on", "start washer") into backend
//!     control commands, applies the optimistic panel update on success, and
//!     runs the fixed-length pressure washer cycle host-side.
//!
//! the update is optimistic: the panel flips as soon as the backend accepts
//!     the command, and the next successful poll reconciles it (last poll
//!     wins). a failed command leaves the panel untouched and bubbles the
//!     backend's error text up to the operator; there is no retry.
//!
//! ==============================================================================

use crate::backend::{BackendClient, BackendError};
use crate::domain::{ConsoleState, ControlCommand, Device, ForcedMode, SwitchState};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// logical actuator as named by the UI
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Target {
    Light,
    Fan,
    PressureWasher,
}

impl Target {
    /// the single UI fan maps to the backend's positive-pressure line
    fn device(self) -> Device {
        match self {
            Target::Light => Device::Light,
            Target::Fan => Device::FanPositive,
            Target::PressureWasher => Device::PressureWasher,
        }
    }
}

/// build the wire command for a target/state pair
///
/// only a washer start carries a cycle timer; everything else is a plain
/// forced on/off.
pub fn build_command(target: Target, state: SwitchState, cycle_seconds: u32) -> ControlCommand {
    let mode = match state {
        SwitchState::On => ForcedMode::ForceOn,
        SwitchState::Off => ForcedMode::ForceOff,
    };
    let timer_duration = match (target, state) {
        (Target::PressureWasher, SwitchState::On) => Some(cycle_seconds),
        _ => None,
    };
    ControlCommand {
        device: target.device(),
        mode,
        timer_duration,
    }
}

/// pressure washer cycle: Idle, or Running with seconds remaining
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WasherCycle {
    Idle,
    Running { remaining: u32 },
}

/// outcome of one 1-second tick of the washer cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// nothing to do (idle, or still counting down)
    Ticked,
    /// cycle hit zero; caller must issue the FORCE_OFF stop command
    Expired,
}

impl WasherCycle {
    pub fn start(&mut self, cycle_seconds: u32) {
        *self = WasherCycle::Running { remaining: cycle_seconds };
    }

    /// manual stop: straight to idle, the stop command goes through the
    /// dispatcher like any other command
    pub fn stop(&mut self) {
        *self = WasherCycle::Idle;
    }

    pub fn remaining(&self) -> u32 {
        match self {
            WasherCycle::Idle => 0,
            WasherCycle::Running { remaining } => *remaining,
        }
    }

    /// advance the cycle by one second
    ///
    /// reaching zero transitions to Idle and reports exactly one Expired so
    /// the caller issues exactly one stop command per natural expiry.
    pub fn tick(&mut self) -> TickOutcome {
        match self {
            WasherCycle::Idle => TickOutcome::Ticked,
            WasherCycle::Running { remaining } => {
                if *remaining <= 1 {
                    *self = WasherCycle::Idle;
                    TickOutcome::Expired
                } else {
                    *remaining -= 1;
                    TickOutcome::Ticked
                }
            }
        }
    }
}

/// dispatches operator overrides and owns the washer cycle
pub struct Dispatcher {
    client: BackendClient,
    state: Arc<RwLock<ConsoleState>>,
    cycle: RwLock<WasherCycle>,
    cycle_seconds: u32,
}

impl Dispatcher {
    pub fn new(client: BackendClient, state: Arc<RwLock<ConsoleState>>, cycle_seconds: u32) -> Self {
        Self {
            client,
            state,
            cycle: RwLock::new(WasherCycle::Idle),
            cycle_seconds,
        }
    }

    /// send one override command and, on success, apply the optimistic update
    pub async fn dispatch(&self, target: Target, desired: SwitchState) -> Result<serde_json::Value, BackendError> {
        let command = build_command(target, desired, self.cycle_seconds);
        tracing::info!(?target, ?desired, "sending control command");

        let ack = self.client.send_control(&command).await.map_err(|e| {
            tracing::error!(?target, "control command failed: {e}");
            e
        })?;

        // optimistic update; the next poll reconciles it
        let mut state = self.state.write().await;
        match target {
            Target::Light => state.actuators.lights = desired,
            Target::Fan => state.actuators.fan = desired,
            Target::PressureWasher => {
                let mut cycle = self.cycle.write().await;
                match desired {
                    SwitchState::On => {
                        cycle.start(self.cycle_seconds);
                        state.actuators.washer_running = true;
                        state.actuators.washer_remaining = self.cycle_seconds;
                    }
                    SwitchState::Off => {
                        cycle.stop();
                        state.actuators.washer_running = false;
                        state.actuators.washer_remaining = self.cycle_seconds;
                    }
                }
            }
        }
        Ok(ack)
    }

    /// advance the washer cycle by one second; called from the 1s ticker
    ///
    /// natural expiry issues the same FORCE_OFF the STOP button would. a
    /// manual stop racing this tick can double-issue the stop; the backend
    /// treats it as idempotent.
    pub async fn tick_washer(&self) {
        // cycle lock is released before the state lock is taken; dispatch
        // acquires them in the opposite order
        let (outcome, remaining) = {
            let mut cycle = self.cycle.write().await;
            let outcome = cycle.tick();
            (outcome, cycle.remaining())
        };

        let adopt_remote_start = {
            let mut state = self.state.write().await;
            match outcome {
                TickOutcome::Ticked if state.actuators.washer_running => {
                    // remaining 0 while the panel says running means the
                    // washer was started behind our back (backend-side
                    // command, or a console restart mid-cycle); adopt it
                    // by running a fresh local cycle
                    if remaining == 0 {
                        true
                    } else {
                        state.actuators.washer_remaining = remaining;
                        false
                    }
                }
                TickOutcome::Expired => {
                    // panel stops immediately; remaining resets for the next cycle
                    state.actuators.washer_running = false;
                    state.actuators.washer_remaining = self.cycle_seconds;
                    false
                }
                _ => false,
            }
        };

        if adopt_remote_start {
            let remaining = {
                let mut cycle = self.cycle.write().await;
                if *cycle == WasherCycle::Idle {
                    cycle.start(self.cycle_seconds);
                }
                cycle.remaining()
            };
            self.state.write().await.actuators.washer_remaining = remaining;
        }

        if outcome == TickOutcome::Expired {
            tracing::info!("washer cycle complete, issuing stop");
            if let Err(e) = self.dispatch(Target::PressureWasher, SwitchState::Off).await {
                // the cycle is already idle locally; the operator can retry
                tracing::error!("washer auto-stop failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_target_maps_to_positive_line() {
        let cmd = build_command(Target::Fan, SwitchState::On, 45);
        assert_eq!(cmd.device, Device::FanPositive);
        assert_eq!(cmd.mode, ForcedMode::ForceOn);
        assert_eq!(cmd.timer_duration, None);
    }

    #[test]
    fn only_a_washer_start_carries_the_timer() {
        let start = build_command(Target::PressureWasher, SwitchState::On, 45);
        assert_eq!(start.timer_duration, Some(45));

        let stop = build_command(Target::PressureWasher, SwitchState::Off, 45);
        assert_eq!(stop.mode, ForcedMode::ForceOff);
        assert_eq!(stop.timer_duration, None);

        let light = build_command(Target::Light, SwitchState::On, 45);
        assert_eq!(light.timer_duration, None);
    }

    #[test]
    fn full_cycle_expires_exactly_once() {
        let mut cycle = WasherCycle::Idle;
        cycle.start(45);

        let mut expiries = 0;
        for _ in 0..45 {
            if cycle.tick() == TickOutcome::Expired {
                expiries += 1;
            }
        }
        assert_eq!(expiries, 1);
        assert_eq!(cycle, WasherCycle::Idle);

        // idle ticks stay quiet
        assert_eq!(cycle.tick(), TickOutcome::Ticked);
    }

    #[test]
    fn countdown_decrements_per_tick() {
        let mut cycle = WasherCycle::Idle;
        cycle.start(45);
        assert_eq!(cycle.remaining(), 45);
        cycle.tick();
        assert_eq!(cycle.remaining(), 44);
        cycle.tick();
        assert_eq!(cycle.remaining(), 43);
    }

    #[tokio::test]
    async fn remote_washer_start_adopts_a_full_cycle() {
        let state = Arc::new(RwLock::new(ConsoleState::default()));
        let dispatcher = Dispatcher::new(
            BackendClient::new("http://127.0.0.1:9"),
            state.clone(),
            45,
        );

        // a poll reconciled the washer on without a local start
        state.write().await.actuators.washer_running = true;

        dispatcher.tick_washer().await;
        assert_eq!(state.read().await.actuators.washer_remaining, 45);

        dispatcher.tick_washer().await;
        assert_eq!(state.read().await.actuators.washer_remaining, 44);
        assert!(state.read().await.actuators.washer_running);
    }

    #[test]
    fn manual_stop_goes_straight_to_idle() {
        let mut cycle = WasherCycle::Idle;
        cycle.start(45);
        cycle.tick();
        cycle.stop();
        assert_eq!(cycle, WasherCycle::Idle);
        assert_eq!(cycle.tick(), TickOutcome::Ticked);
    }
}
