//! Game message log and presentation events.

use serde::{Deserialize, Serialize};
use util::StrExt;

use crate::prelude::*;

/// Suffix that marks the last message of a turn.
pub const TURN_MARKER: &str = "_";

/// Things that happened during the last commit that a display layer may want
/// to animate.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Event {
    /// A projectile flew between the locations.
    Shot { from: Location, to: Location },

    /// Entity took damage.
    Hurt(Entity),

    /// An attack missed the entity.
    Miss(Entity),

    /// Something died at the location.
    Death(Location),
}

/// Message history of a game.
///
/// Messages emitted during a turn go into a buffer that is folded into the
/// history when the turn completes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Log {
    history: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    buffer: Vec<String>,
    #[serde(skip)]
    events: Vec<Event>,
}

impl Log {
    pub fn new(player_name: &str) -> Self {
        Log {
            history: vec![format!("Welcome to the Dungeon, {player_name}")],
            ..Default::default()
        }
    }

    pub(crate) fn push(&mut self, msg: impl Into<String>) {
        self.buffer.push(msg.into());
    }

    pub(crate) fn push_event(&mut self, event: Event) {
        self.events.push(event);
    }

    pub(crate) fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Move buffered messages into history.
    ///
    /// Repeats of a message are merged into one entry with an " xN" count.
    /// The last message in history gets the turn marker.
    pub(crate) fn flush(&mut self) {
        let mut counts: IndexMap<String, usize> = Default::default();
        for msg in self.buffer.drain(..) {
            *counts.entry(msg).or_default() += 1;
        }
        for (msg, n) in counts {
            if n > 1 {
                self.history.push(format!("{msg} x{n}"));
            } else {
                self.history.push(msg);
            }
        }

        if let Some(last) = self.history.last_mut() {
            if !last.ends_with(TURN_MARKER) {
                last.push_str(TURN_MARKER);
            }
        }
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Messages of the current turn that haven't been flushed yet.
    pub fn pending(&self) -> &[String] {
        &self.buffer
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn last_messages(&self, n: usize) -> &[String] {
        &self.history[self.history.len().saturating_sub(n)..]
    }

    /// Last `n` display lines when messages are wrapped to `width` columns.
    pub fn last_lines(&self, n: usize, width: usize) -> Vec<&str> {
        if width == 0 {
            return Vec::new();
        }
        let mut ret: Vec<&str> = self
            .last_messages(n)
            .iter()
            .flat_map(|m| m.lines_of(width))
            .collect();
        ret.drain(..ret.len().saturating_sub(n));
        ret
    }
}

/// Append a formatted message to the game log of a runtime.
#[macro_export]
macro_rules! msg {
    ($r:expr, $($arg:tt)*) => {{
        // Format first, the arguments may borrow the runtime.
        let __txt = format!($($arg)*);
        $crate::Runtime::push_msg(
            ::std::convert::AsMut::<$crate::Runtime>::as_mut($r),
            __txt,
        )
    }};
}

impl Runtime {
    pub(crate) fn push_msg(&mut self, msg: String) {
        self.log.push(msg);
    }

    pub(crate) fn push_event(&mut self, event: Event) {
        self.log.push_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_repeats() {
        let mut log = Log::new("Tester");
        log.push("a hit b");
        log.push("b hit a");
        log.push("a hit b");
        log.push("a hit b");
        log.flush();
        assert_eq!(
            log.history(),
            &["Welcome to the Dungeon, Tester", "a hit b x3", "b hit a_"]
        );
        assert!(log.pending().is_empty());
    }

    #[test]
    fn marker_is_not_doubled() {
        let mut log = Log::new("Tester");
        log.flush();
        log.flush();
        assert_eq!(log.history(), &["Welcome to the Dungeon, Tester_"]);
    }

    #[test]
    fn tail_queries() {
        let mut log = Log::new("X");
        log.push("one two three four five six");
        log.flush();
        log.push("seven");
        log.flush();
        assert_eq!(log.last_messages(1), &["seven_"]);
        assert_eq!(log.last_messages(10).len(), 3);
        assert_eq!(
            log.last_lines(3, 10),
            vec!["three four", "five six_", "seven_"]
        );
        assert!(log.last_lines(3, 0).is_empty());
    }
}
