/// CSS class carried by the menu panel while it is closed.
pub const HIDDEN_CLASS: &str = "hidden";

/// Open/closed state of the overflow menu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverflowMenu {
    open: bool,
}

impl OverflowMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Trigger button action. Returns the new open state.
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    /// Handles a click somewhere on the page. Only a click that hit neither
    /// the panel nor its trigger closes an open menu. Returns whether the
    /// state changed.
    pub fn dismiss(&mut self, inside_menu: bool, on_trigger: bool) -> bool {
        if inside_menu || on_trigger || !self.open {
            return false;
        }
        self.open = false;
        true
    }

    /// Value for the panel's `aria-hidden` attribute.
    pub fn aria_hidden(&self) -> &'static str {
        if self.open {
            "false"
        } else {
            "true"
        }
    }
}
