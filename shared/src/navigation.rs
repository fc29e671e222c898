use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    #[default]
    Home,
    Products,
    Ingredients,
}

impl Screen {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Products => "products",
            Self::Ingredients => "ingredients",
        }
    }

    /// Header title; the root screen has none.
    #[must_use]
    pub const fn title(self) -> Option<&'static str> {
        match self {
            Self::Home => None,
            Self::Products => Some("Productos"),
            Self::Ingredients => Some("Ingredientes"),
        }
    }
}

/// What a navigation event did to the stack. `Popped` lists the removed
/// screens, top first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Pushed(Screen),
    Popped(Vec<Screen>),
    Unchanged,
}

/// Screen stack rooted at [`Screen::Home`]. The root is never popped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    stack: Vec<Screen>,
}

impl Default for Navigation {
    fn default() -> Self {
        Self {
            stack: vec![Screen::Home],
        }
    }
}

impl Navigation {
    #[must_use]
    pub fn current(&self) -> Screen {
        self.stack.last().copied().unwrap_or_default()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    #[must_use]
    pub fn can_go_back(&self) -> bool {
        self.stack.len() > 1
    }

    /// Opens `screen`. A screen already on the stack is not stacked twice:
    /// everything above it is popped instead, so each screen appears at most
    /// once and `Home` stays at the bottom.
    pub fn push(&mut self, screen: Screen) -> Transition {
        if self.current() == screen {
            return Transition::Unchanged;
        }
        if let Some(index) = self.stack.iter().position(|s| *s == screen) {
            let mut popped = self.stack.split_off(index + 1);
            popped.reverse();
            return Transition::Popped(popped);
        }
        self.stack.push(screen);
        Transition::Pushed(screen)
    }

    pub fn pop(&mut self) -> Transition {
        if !self.can_go_back() {
            return Transition::Unchanged;
        }
        match self.stack.pop() {
            Some(screen) => Transition::Popped(vec![screen]),
            None => Transition::Unchanged,
        }
    }
}
