use crate::config::ApiConfig;
use crate::ingredients::IngredientsScreen;
use crate::navigation::{Navigation, Screen};
use crate::products::{ProductsDraft, ProductsScreen};

/// Identifies one visit to a screen. Every mount gets a fresh id.
pub type MountId = u64;

/// Everything the core knows. Screen state lives only while the screen is
/// on the navigation stack.
#[derive(Debug, Default)]
pub struct Model {
    pub config: ApiConfig,
    pub navigation: Navigation,
    pub ingredients: Option<IngredientsScreen>,
    pub products: Option<ProductsScreen>,
    /// Last saved or restored form, used to seed the Products screen.
    pub saved_draft: Option<ProductsDraft>,
    last_mount: MountId,
}

impl Model {
    #[must_use]
    pub fn current_screen(&self) -> Screen {
        self.navigation.current()
    }

    /// Builds the state for a screen that was just pushed.
    pub fn mount(&mut self, screen: Screen) {
        self.last_mount += 1;
        let mount_id = self.last_mount;
        match screen {
            Screen::Home => {}
            Screen::Products => {
                let draft = self.saved_draft.clone().unwrap_or_default();
                self.products = Some(ProductsScreen {
                    mount_id,
                    ..ProductsScreen::from_draft(draft)
                });
            }
            Screen::Ingredients => {
                self.ingredients = Some(IngredientsScreen::new(mount_id));
            }
        }
    }

    /// Drops the state of a screen that was just popped.
    pub fn unmount(&mut self, screen: Screen) {
        match screen {
            Screen::Home => {}
            Screen::Products => self.products = None,
            Screen::Ingredients => self.ingredients = None,
        }
    }
}
