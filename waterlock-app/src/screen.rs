//! Presentation model of the Water Lock screen.
//!
//! Statistics are placeholders; only the clock and the icon position change.

use chrono::NaiveTime;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub label: &'static str,
    pub value: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatRow {
    pub left: Stat,
    pub right: Stat,
}

const DURATION_AND_DISTANCE: StatRow = StatRow {
    left: Stat {
        label: "Duration",
        value: "00:00",
    },
    right: Stat {
        label: "Distance",
        value: "0.00",
    },
};

const PACE_AND_CALORIES: StatRow = StatRow {
    left: Stat {
        label: "Avg. pace",
        value: "--'--\"",
    },
    right: Stat {
        label: "Calories",
        value: "0",
    },
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Tap,
    Drag { dx: f32, dy: f32 },
}

/// What the shell has to do after a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    SendWaterLock,
    IconMoved { x: i32, y: i32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenModel {
    clock: String,
    rows: [StatRow; 2],
    readout: &'static str,
    offset_x: f32,
    offset_y: f32,
}

impl ScreenModel {
    pub fn new(now: NaiveTime) -> Self {
        Self {
            clock: format_clock(now),
            rows: [DURATION_AND_DISTANCE, PACE_AND_CALORIES],
            readout: "--",
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    pub fn set_clock(&mut self, now: NaiveTime) {
        self.clock = format_clock(now);
    }

    pub fn clock(&self) -> &str {
        &self.clock
    }

    pub fn rows(&self) -> &[StatRow; 2] {
        &self.rows
    }

    /// Icon offset from its top-end anchor, rounded to whole pixels.
    pub fn icon_offset(&self) -> (i32, i32) {
        (self.offset_x.round() as i32, self.offset_y.round() as i32)
    }

    /// Dragging only moves the icon; tapping it asks for the command to be sent.
    pub fn apply(&mut self, gesture: Gesture) -> GestureOutcome {
        match gesture {
            Gesture::Tap => GestureOutcome::SendWaterLock,
            Gesture::Drag { dx, dy } => {
                self.offset_x += dx;
                self.offset_y += dy;
                let (x, y) = self.icon_offset();
                GestureOutcome::IconMoved { x, y }
            }
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "  @ {}", self.clock);
        for row in &self.rows {
            let _ = writeln!(out, "  {:<12}{:<12}", row.left.label, row.right.label);
            let _ = writeln!(out, " ( {:<10}| {:<9})", row.left.value, row.right.value);
        }
        let _ = writeln!(out, "  {}", self.readout);
        let (x, y) = self.icon_offset();
        let _ = write!(out, "  [water lock icon at {x:+}, {y:+}]");
        out
    }
}

fn format_clock(now: NaiveTime) -> String {
    now.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> ScreenModel {
        ScreenModel::new(NaiveTime::from_hms_opt(13, 25, 40).unwrap())
    }

    #[test]
    fn clock_shows_hours_and_minutes() {
        let mut screen = screen();
        assert_eq!(screen.clock(), "13:25");
        screen.set_clock(NaiveTime::from_hms_opt(7, 5, 0).unwrap());
        assert_eq!(screen.clock(), "07:05");
    }

    #[test]
    fn drag_accumulates_and_rounds_offset() {
        let mut screen = screen();
        assert_eq!(
            screen.apply(Gesture::Drag { dx: 10.4, dy: -3.0 }),
            GestureOutcome::IconMoved { x: 10, y: -3 }
        );
        assert_eq!(
            screen.apply(Gesture::Drag { dx: 0.2, dy: -0.6 }),
            GestureOutcome::IconMoved { x: 11, y: -4 }
        );
    }

    #[test]
    fn tap_requests_the_command_and_leaves_the_icon_in_place() {
        let mut screen = screen();
        screen.apply(Gesture::Drag { dx: 5.0, dy: 5.0 });
        assert_eq!(screen.apply(Gesture::Tap), GestureOutcome::SendWaterLock);
        assert_eq!(screen.icon_offset(), (5, 5));
    }

    #[test]
    fn render_contains_placeholder_statistics() {
        let rendered = screen().render();
        for text in ["13:25", "Duration", "0.00", "Avg. pace", "--'--\"", "Calories"] {
            assert!(rendered.contains(text), "missing {text}");
        }
        assert!(rendered.ends_with("[water lock icon at +0, +0]"));
    }
}
