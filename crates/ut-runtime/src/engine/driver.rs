use std::collections::VecDeque;

use ut_core::{InputEvent, InputSink, Key, MouseButton, RunSpeed, ScenarioId, UiTestError};

use super::locator::ElementRef;
use super::options::EngineOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Clone)]
struct ScheduledEvent {
    seq: u64,
    due_frame: u64,
    owner: Option<ScenarioId>,
    event: InputEvent,
}

#[derive(Debug)]
pub struct InteractionDriver {
    speed: RunSpeed,
    event_delay_frames: u64,
    mouse_steps: u32,
    frame: u64,
    pending: VecDeque<ScheduledEvent>,
    next_seq: u64,
    delivered_seq: u64,
    last_due_frame: Option<u64>,
    mouse: (f32, f32),
    delivered_mouse: (f32, f32),
    owner: Option<ScenarioId>,
}

impl Default for InteractionDriver {
    fn default() -> Self {
        Self::new(&EngineOptions::default())
    }
}

impl InteractionDriver {
    pub fn new(options: &EngineOptions) -> Self {
        Self {
            speed: options.run_speed,
            event_delay_frames: options.cinematic_event_delay_frames.max(1),
            mouse_steps: options.cinematic_mouse_steps,
            frame: 0,
            pending: VecDeque::new(),
            next_seq: 0,
            delivered_seq: 0,
            last_due_frame: None,
            mouse: (0.0, 0.0),
            delivered_mouse: (0.0, 0.0),
            owner: None,
        }
    }

    pub fn speed(&self) -> RunSpeed {
        self.speed
    }

    pub fn set_mouse_position(&mut self, x: f32, y: f32) {
        self.mouse = (x, y);
        self.delivered_mouse = (x, y);
    }

    pub fn mouse_position(&self) -> (f32, f32) {
        self.mouse
    }

    pub fn begin_frame(&mut self, frame: u64) {
        self.frame = frame;
    }

    pub fn set_owner(&mut self, owner: Option<ScenarioId>) {
        self.owner = owner;
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_complete(&self, ticket: Ticket) -> bool {
        self.delivered_seq >= ticket.0
    }

    pub fn click(&mut self, element: &ElementRef) -> Result<Ticket, UiTestError> {
        self.check_fresh(element)?;
        let mut events = self.move_to(element);
        events.extend(press(MouseButton::Left));
        Ok(self.schedule(events))
    }

    pub fn double_click(&mut self, element: &ElementRef) -> Result<Ticket, UiTestError> {
        self.check_fresh(element)?;
        let mut events = self.move_to(element);
        events.extend(press(MouseButton::Left));
        events.extend(press(MouseButton::Left));
        Ok(self.schedule(events))
    }

    pub fn hover(&mut self, element: &ElementRef) -> Result<Ticket, UiTestError> {
        self.check_fresh(element)?;
        let events = self.move_to(element);
        Ok(self.schedule(events))
    }

    pub fn type_text(&mut self, element: &ElementRef, text: &str) -> Result<Ticket, UiTestError> {
        self.check_fresh(element)?;
        let mut events = self.move_to(element);
        events.extend(press(MouseButton::Left));
        events.extend(text.chars().map(|ch| InputEvent::Char { ch }));
        Ok(self.schedule(events))
    }

    pub fn navigate(&mut self, element: &ElementRef) -> Result<Ticket, UiTestError> {
        self.check_fresh(element)?;
        Ok(self.schedule(vec![InputEvent::NavFocus { node: element.id }]))
    }

    pub fn key_press(&mut self, key: Key) -> Ticket {
        self.schedule(vec![InputEvent::KeyDown { key }, InputEvent::KeyUp { key }])
    }

    pub fn flush(&mut self, frame: u64, sink: &mut dyn InputSink) -> usize {
        let mut delivered = 0usize;
        while let Some(next) = self.pending.front() {
            if next.due_frame > frame {
                break;
            }
            let Some(scheduled) = self.pending.pop_front() else {
                break;
            };
            self.delivered_seq = scheduled.seq;
            if let InputEvent::MouseMove { x, y } = scheduled.event {
                self.delivered_mouse = (x, y);
            }
            sink.push(scheduled.event);
            delivered += 1;
        }
        delivered
    }

    pub fn cancel_pending(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        self.last_due_frame = None;
        self.mouse = self.delivered_mouse;
        dropped
    }

    pub fn cancel_for(&mut self, id: &ScenarioId) -> usize {
        let before = self.pending.len();
        self.pending
            .retain(|scheduled| scheduled.owner.as_ref() != Some(id));
        self.last_due_frame = self.pending.back().map(|scheduled| scheduled.due_frame);
        self.mouse = self
            .pending
            .iter()
            .rev()
            .find_map(|scheduled| match scheduled.event {
                InputEvent::MouseMove { x, y } => Some((x, y)),
                _ => None,
            })
            .unwrap_or(self.delivered_mouse);
        before - self.pending.len()
    }

    fn check_fresh(&self, element: &ElementRef) -> Result<(), UiTestError> {
        if element.frame != self.frame {
            return Err(UiTestError::StaleElementRef {
                resolved_frame: element.frame,
                current_frame: self.frame,
            });
        }
        Ok(())
    }

    fn move_to(&mut self, element: &ElementRef) -> Vec<InputEvent> {
        let (target_x, target_y) = element.rect.center();
        let (start_x, start_y) = self.mouse;
        self.mouse = (target_x, target_y);

        let steps = match self.speed {
            RunSpeed::Fast => 1,
            RunSpeed::Cinematic => self.mouse_steps.max(1),
        };
        (1..=steps)
            .map(|step| {
                let t = step as f32 / steps as f32;
                InputEvent::MouseMove {
                    x: start_x + (target_x - start_x) * t,
                    y: start_y + (target_y - start_y) * t,
                }
            })
            .collect()
    }

    /// Assigns due frames. Fast mode delivers one event per frame; cinematic
    /// mode glides the pointer one step per frame and pauses
    /// `event_delay_frames` before every other event.
    fn schedule(&mut self, events: Vec<InputEvent>) -> Ticket {
        for event in events {
            let gap = match (self.speed, &event) {
                (RunSpeed::Fast, _) | (RunSpeed::Cinematic, InputEvent::MouseMove { .. }) => 1,
                (RunSpeed::Cinematic, _) => self.event_delay_frames,
            };
            let due_frame = match self.last_due_frame {
                Some(last) if !self.pending.is_empty() => (last + gap).max(self.frame),
                _ => self.frame,
            };
            self.last_due_frame = Some(due_frame);
            self.next_seq += 1;
            self.pending.push_back(ScheduledEvent {
                seq: self.next_seq,
                due_frame,
                owner: self.owner.clone(),
                event,
            });
        }
        Ticket(self.next_seq)
    }
}

fn press(button: MouseButton) -> [InputEvent; 2] {
    [
        InputEvent::MouseDown { button },
        InputEvent::MouseUp { button },
    ]
}
