use std::io;
use std::time::Duration;

use crossterm::event::{Event, MouseEventKind};

use crate::drivers::InputDriver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    Continue,
    Quit,
}

/// Single-threaded loop that owns input polling and hands events to one
/// handler.
///
/// The handler is called with `None` once per iteration before input is
/// read (the place to draw and run after-layout work), then with
/// `Some(event)` for each queued event. Runs of consecutive drag events
/// are collapsed into the newest one since only the latest pointer
/// position matters for the next frame; presses and releases are always
/// delivered, so a release still sees the true final position.
pub struct EventLoop<D> {
    driver: D,
    poll_interval: Duration,
    coalesce_drags: bool,
}

impl<D: InputDriver> EventLoop<D> {
    pub fn new(driver: D, poll_interval: Duration) -> Self {
        Self {
            driver,
            poll_interval,
            coalesce_drags: true,
        }
    }

    pub fn with_drag_coalescing(mut self, enabled: bool) -> Self {
        self.coalesce_drags = enabled;
        self
    }

    pub fn driver(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn run<F>(&mut self, mut handler: F) -> io::Result<()>
    where
        F: FnMut(&mut D, Option<Event>) -> io::Result<ControlFlow>,
    {
        loop {
            if let ControlFlow::Quit = handler(&mut self.driver, None)? {
                return Ok(());
            }
            if !self.driver.poll(self.poll_interval)? {
                continue;
            }
            // Drain everything that is already queued so the frame after a
            // burst reflects all of it.
            let mut held: Option<Event> = None;
            loop {
                let mut event = match held.take() {
                    Some(event) => event,
                    None => self.driver.read()?,
                };
                while self.coalesce_drags
                    && is_drag(&event)
                    && self.driver.poll(Duration::ZERO)?
                {
                    let next = self.driver.read()?;
                    if is_drag(&next) {
                        event = next;
                    } else {
                        held = Some(next);
                        break;
                    }
                }
                if let ControlFlow::Quit = handler(&mut self.driver, Some(event))? {
                    return Ok(());
                }
                if held.is_none() && !self.driver.poll(Duration::ZERO)? {
                    break;
                }
            }
        }
    }
}

fn is_drag(event: &Event) -> bool {
    matches!(
        event,
        Event::Mouse(mouse) if matches!(mouse.kind, MouseEventKind::Drag(_))
    )
}
