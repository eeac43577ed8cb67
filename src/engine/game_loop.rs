/// Frame clock that drives a physics world
///
/// Each frame hands the world one variable-length step: the loop measures
/// the frame, caps stalls at `MAX_FRAME_MS`, calls `World::update` and then
/// `World::post_update` so owners follow their bodies. Pausing the loop
/// pauses the world with it.
use std::time::{Duration, Instant};

use crate::engine::physics::{GameObjects, World};

/// Longest frame handed to the world, in milliseconds
pub const MAX_FRAME_MS: f32 = 100.0;

/// Weight of the newest frame in the smoothed frame time
const FRAME_SMOOTHING: f32 = 0.1;

/// Timing for one frame, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Simulated time since the loop started
    pub time_ms: f32,
    /// Length of this frame after capping
    pub delta_ms: f32,
}

pub struct GameLoop {
    /// Wall-clock mark for `begin_frame`, reset on resume
    last_instant: Instant,
    time_ms: f32,
    paused: bool,
    frames: u64,
    steps: u64,
    /// Exponentially smoothed frame length, 0 until the first frame
    smoothed_frame_ms: f32,
}

impl GameLoop {
    pub fn new() -> Self {
        Self {
            last_instant: Instant::now(),
            time_ms: 0.0,
            paused: false,
            frames: 0,
            steps: 0,
            smoothed_frame_ms: 0.0,
        }
    }

    /// Measure the frame from the wall clock. `None` while paused.
    pub fn begin_frame(&mut self) -> Option<FrameTime> {
        let now = Instant::now();
        let frame = now.duration_since(self.last_instant);
        self.last_instant = now;
        self.advance(frame)
    }

    /// Account for a frame of a given length, for headless runs and tests
    pub fn advance(&mut self, frame: Duration) -> Option<FrameTime> {
        let frame_ms = frame.as_secs_f32() * 1000.0;
        self.frames += 1;
        self.smoothed_frame_ms = if self.frames == 1 {
            frame_ms
        } else {
            self.smoothed_frame_ms + (frame_ms - self.smoothed_frame_ms) * FRAME_SMOOTHING
        };

        if self.paused {
            return None;
        }

        let delta_ms = frame_ms.min(MAX_FRAME_MS);
        if delta_ms < frame_ms {
            log::debug!("Frame of {:.1}ms capped to {:.1}ms", frame_ms, delta_ms);
        }
        self.time_ms += delta_ms;
        self.steps += 1;

        Some(FrameTime {
            time_ms: self.time_ms,
            delta_ms,
        })
    }

    /// Advance by `frame` and step `world` through it. Returns whether the
    /// world was stepped.
    pub fn run_frame(
        &mut self,
        frame: Duration,
        world: &mut World,
        objects: &mut dyn GameObjects,
    ) -> bool {
        let Some(time) = self.advance(frame) else {
            return false;
        };
        world.update(time.time_ms, time.delta_ms);
        world.post_update(objects);
        true
    }

    /// Frames per second over the smoothed frame time
    pub fn fps(&self) -> f32 {
        if self.smoothed_frame_ms > 0.0 {
            1000.0 / self.smoothed_frame_ms
        } else {
            0.0
        }
    }

    /// Simulated milliseconds handed to the world so far
    pub fn time_ms(&self) -> f32 {
        self.time_ms
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Frames that produced a world step
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Stop handing out time and pause the world
    pub fn pause(&mut self, world: &mut World) {
        self.paused = true;
        world.pause();
    }

    /// Resume both. Time spent paused is not handed to the world.
    pub fn resume(&mut self, world: &mut World) {
        self.paused = false;
        self.last_instant = Instant::now();
        world.resume();
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new()
    }
}
