//! Fixed-time traffic light attached to an intersection approach

use serde::{Deserialize, Serialize};
use std::fmt;

/// The phase a traffic light is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightPhase {
    Red,
    Green,
    Amber,
}

impl fmt::Display for LightPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LightPhase::Red => "red",
            LightPhase::Green => "green",
            LightPhase::Amber => "amber",
        };
        f.write_str(name)
    }
}

/// A cyclic light: phases are visited in order and wrap around
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficLight {
    cycle: Vec<(LightPhase, f64)>,
    current: usize,
    /// Seconds spent in the current phase, always below its duration
    elapsed: f64,
}

impl TrafficLight {
    /// Build a light from `(phase, duration)` pairs, starting in the first phase.
    ///
    /// Returns the reason as a string when the cycle is empty or a duration is
    /// not a positive finite number; callers wrap it with the road name.
    pub fn new(cycle: Vec<(LightPhase, f64)>) -> Result<Self, String> {
        if cycle.is_empty() {
            return Err("cycle has no phases".to_string());
        }
        if let Some((phase, duration)) = cycle
            .iter()
            .find(|(_, duration)| !(duration.is_finite() && *duration > 0.0))
        {
            return Err(format!("{} phase has invalid duration {}", phase, duration));
        }

        Ok(Self {
            cycle,
            current: 0,
            elapsed: 0.0,
        })
    }

    /// Red, green, amber with equal durations, starting on red
    pub fn uniform(duration: f64) -> Result<Self, String> {
        Self::new(vec![
            (LightPhase::Red, duration),
            (LightPhase::Green, duration),
            (LightPhase::Amber, duration),
        ])
    }

    pub fn phase(&self) -> LightPhase {
        self.cycle[self.current].0
    }

    pub fn is_green(&self) -> bool {
        self.phase() == LightPhase::Green
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn cycle(&self) -> &[(LightPhase, f64)] {
        &self.cycle
    }

    fn current_duration(&self) -> f64 {
        self.cycle[self.current].1
    }

    /// Advance the light by `dt` seconds.
    ///
    /// Whole cycles are dropped first since they return to the same phase.
    /// The remaining phase boundaries are crossed one at a time, so a step
    /// longer than a phase lands on the same phase as many small steps.
    pub fn tick(&mut self, dt: f64) {
        self.elapsed += dt;
        let total = self.cycle_total();
        if self.elapsed >= total {
            self.elapsed %= total;
        }
        while self.elapsed >= self.current_duration() {
            self.elapsed -= self.current_duration();
            self.current = (self.current + 1) % self.cycle.len();
        }
    }

    /// Seconds until the next phase change
    pub fn time_to_next_change(&self) -> f64 {
        self.current_duration() - self.elapsed
    }

    /// Length of one full cycle in seconds
    pub fn cycle_total(&self) -> f64 {
        self.cycle.iter().map(|(_, duration)| duration).sum()
    }

    /// Describe a broken timing state, if any
    pub fn invariant_violation(&self) -> Option<String> {
        if !(0.0..self.current_duration()).contains(&self.elapsed) {
            return Some(format!(
                "light elapsed {} outside current {} phase of {} s",
                self.elapsed,
                self.phase(),
                self.current_duration()
            ));
        }
        if self.elapsed >= self.cycle_total() {
            return Some(format!(
                "light elapsed {} exceeds cycle of {} s",
                self.elapsed,
                self.cycle_total()
            ));
        }
        None
    }
}
