use std::time::Instant;

use kiss3d::event::{Action, Event, Key, WindowEvent};

use crate::model::scheduler::StopHandle;

// Key config, all in one place
const KEY_STOP: Key = Key::Q;

pub struct Controller {
    stop: StopHandle,
    // Latest cursor position not yet picked against, in framebuffer pixels
    pending_pointer: Option<(f64, f64)>,
    fps_counter: FpsCounter,
}

pub struct FpsCounter {
    instant: Instant,
    counter: usize,
    window_size_millis: usize,
    previous_fps: f64,
}

impl FpsCounter {
    pub fn new(window_size_millis: usize) -> Self {
        FpsCounter {
            instant: Instant::now(),
            counter: 0,
            previous_fps: 0.0,
            window_size_millis,
        }
    }

    pub fn reset(&mut self) {
        self.instant = Instant::now();
        self.counter = 0;
    }

    pub fn value(&self) -> f64 {
        self.previous_fps
    }

    pub fn increment(&mut self) {
        self.counter += 1;

        let elapsed = self.instant.elapsed();
        if elapsed.as_millis() > self.window_size_millis as u128 {
            self.previous_fps = (1000 * self.counter) as f64 / elapsed.as_millis() as f64;
            self.reset();
        }
    }
}

impl Controller {
    pub fn new(stop: StopHandle) -> Self {
        Controller {
            stop,
            pending_pointer: None,
            fps_counter: FpsCounter::new(1000),
        }
    }

    pub fn process_event(&mut self, event: Event) {
        match event.value {
            WindowEvent::Key(KEY_STOP, Action::Press, _) => {
                log::info!("Stop requested from keyboard");
                self.stop.stop();
            }
            // Several moves can arrive in one frame; only the last one matters
            WindowEvent::CursorPos(x, y, _) => self.pending_pointer = Some((x, y)),
            _ => {}
        }
    }

    pub fn take_pointer(&mut self) -> Option<(f64, f64)> {
        self.pending_pointer.take()
    }

    pub fn fps(&self) -> f64 {
        self.fps_counter.value()
    }

    pub fn increment_frame_counter(&mut self) {
        self.fps_counter.increment()
    }
}
