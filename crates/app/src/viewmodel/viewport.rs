//! Scroll position of the message log
//!
//! The terminal shows a window of rendered lines. Arrivals only move that
//! window when the reader was already at (or near) the end; otherwise the
//! position is kept and an unseen counter grows.

use crate::engine::SyncEvent;

/// Scroll geometry, in the same unit for all three fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollMetrics {
    pub scroll_height: i64,
    pub scroll_top: i64,
    pub client_height: i64,
}

/// True when the visible area ends within `threshold` of the content end
pub fn is_near_bottom(metrics: &ScrollMetrics, threshold: i64) -> bool {
    metrics.scroll_height - metrics.scroll_top - metrics.client_height < threshold
}

/// How the view should react to a sync event
///
/// Ordered by strength, so a batch of events reacts with its `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScrollDirective {
    /// Leave the reader where they are
    Stay,
    /// Follow to the end (own send, or arrival while at the end)
    Smooth,
    /// Go to the end immediately (initial load)
    Jump,
}

/// Decide the scroll reaction, measured before the new content is laid out
pub fn directive_for(event: &SyncEvent, before: &ScrollMetrics, threshold: i64) -> ScrollDirective {
    match event {
        SyncEvent::Loaded { .. } => ScrollDirective::Jump,
        SyncEvent::Sent(_) => ScrollDirective::Smooth,
        SyncEvent::NewMessages { .. } if is_near_bottom(before, threshold) => {
            ScrollDirective::Smooth
        }
        _ => ScrollDirective::Stay,
    }
}

/// Line-based viewport over the rendered log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    height: usize,
    content: usize,
    top: usize,
    unseen: usize,
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        Self {
            height: height.max(1),
            content: 0,
            top: 0,
            unseen: 0,
        }
    }

    pub fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            scroll_height: self.content as i64,
            scroll_top: self.top as i64,
            client_height: self.height as i64,
        }
    }

    /// First visible line
    #[cfg(test)]
    pub fn top(&self) -> usize {
        self.top
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Messages that arrived below the visible area
    pub fn unseen(&self) -> usize {
        self.unseen
    }

    fn max_top(&self) -> usize {
        self.content.saturating_sub(self.height)
    }

    pub fn at_bottom(&self) -> bool {
        self.top >= self.max_top()
    }

    /// Lay out new content and apply the directive
    pub fn update(&mut self, content: usize, directive: ScrollDirective, arrived: usize) {
        self.content = content;
        match directive {
            ScrollDirective::Jump | ScrollDirective::Smooth => self.scroll_to_bottom(),
            ScrollDirective::Stay => {
                self.top = self.top.min(self.max_top());
                if !self.at_bottom() {
                    self.unseen += arrived;
                }
            }
        }
    }

    /// Re-layout without new arrivals (resize, name change)
    pub fn relayout(&mut self, content: usize) {
        let follow = self.at_bottom();
        self.content = content;
        if follow {
            self.scroll_to_bottom();
        } else {
            self.top = self.top.min(self.max_top());
        }
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.top = self.top.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.top = (self.top + lines).min(self.max_top());
        if self.at_bottom() {
            self.unseen = 0;
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.top = self.max_top();
        self.unseen = 0;
    }

    /// Range of lines currently visible
    pub fn visible(&self) -> std::ops::Range<usize> {
        let end = (self.top + self.height).min(self.content);
        self.top.min(end)..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parley_core::Message;

    #[test]
    fn test_near_bottom() {
        let near = ScrollMetrics {
            scroll_height: 1000,
            scroll_top: 950,
            client_height: 100,
        };
        assert!(is_near_bottom(&near, 100));

        let far = ScrollMetrics {
            scroll_height: 1000,
            scroll_top: 100,
            client_height: 100,
        };
        assert!(!is_near_bottom(&far, 100));
    }

    #[test]
    fn test_near_bottom_custom_threshold() {
        let metrics = ScrollMetrics {
            scroll_height: 1000,
            scroll_top: 800,
            client_height: 100,
        };
        assert!(is_near_bottom(&metrics, 200));
        assert!(!is_near_bottom(&metrics, 50));
    }

    #[test]
    fn test_directives() {
        let at_end = ScrollMetrics {
            scroll_height: 50,
            scroll_top: 30,
            client_height: 20,
        };
        let scrolled_up = ScrollMetrics {
            scroll_height: 50,
            scroll_top: 0,
            client_height: 20,
        };
        let sent = SyncEvent::Sent(Message::new("1", "hi", "me", Utc::now()));
        let arrived = SyncEvent::NewMessages { count: 1 };

        assert_eq!(
            directive_for(&SyncEvent::Loaded { count: 3 }, &scrolled_up, 3),
            ScrollDirective::Jump
        );
        assert_eq!(directive_for(&sent, &scrolled_up, 3), ScrollDirective::Smooth);
        assert_eq!(directive_for(&arrived, &at_end, 3), ScrollDirective::Smooth);
        assert_eq!(directive_for(&arrived, &scrolled_up, 3), ScrollDirective::Stay);
        assert_eq!(
            directive_for(&SyncEvent::PollHealth { failing: true }, &at_end, 3),
            ScrollDirective::Stay
        );
    }

    #[test]
    fn test_directive_strength() {
        assert!(ScrollDirective::Jump > ScrollDirective::Smooth);
        assert!(ScrollDirective::Smooth > ScrollDirective::Stay);
    }

    #[test]
    fn test_viewport_follows_when_at_bottom() {
        let mut viewport = Viewport::new(10);
        viewport.update(25, ScrollDirective::Jump, 0);
        assert_eq!(viewport.visible(), 15..25);

        let directive = directive_for(
            &SyncEvent::NewMessages { count: 1 },
            &viewport.metrics(),
            3,
        );
        viewport.update(28, directive, 1);
        assert_eq!(viewport.visible(), 18..28);
        assert_eq!(viewport.unseen(), 0);
    }

    #[test]
    fn test_viewport_keeps_reader_position() {
        let mut viewport = Viewport::new(10);
        viewport.update(40, ScrollDirective::Jump, 0);
        viewport.scroll_up(20);
        assert_eq!(viewport.top(), 10);

        let directive = directive_for(
            &SyncEvent::NewMessages { count: 2 },
            &viewport.metrics(),
            3,
        );
        assert_eq!(directive, ScrollDirective::Stay);
        viewport.update(46, directive, 2);

        assert_eq!(viewport.top(), 10);
        assert_eq!(viewport.unseen(), 2);

        viewport.scroll_down(100);
        assert!(viewport.at_bottom());
        assert_eq!(viewport.unseen(), 0);
    }

    #[test]
    fn test_short_content() {
        let mut viewport = Viewport::new(10);
        viewport.update(4, ScrollDirective::Jump, 0);
        assert_eq!(viewport.visible(), 0..4);
        assert!(viewport.at_bottom());
        viewport.scroll_up(3);
        assert_eq!(viewport.top(), 0);
    }
}
