use crux_core::testing::AppTester;

use shared::view::ScreenView;
use shared::{App, Effect, Event, Model, Screen};

#[test]
fn home_to_products_and_back() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let view = app.view(&model);
    assert!(matches!(view.screen, ScreenView::Home(_)));
    assert!(!view.can_go_back);

    let update = app.update(Event::Navigate(Screen::Products), &mut model);
    assert!(update.effects.iter().any(Effect::is_render));
    let view = app.view(&model);
    assert_eq!(view.title.as_deref(), Some("Productos"));
    assert!(view.can_go_back);
    assert!(matches!(view.screen, ScreenView::Products(_)));

    app.update(Event::NavigateBack, &mut model);
    assert_eq!(model.current_screen(), Screen::Home);
    assert!(model.products.is_none());

    // The root is never popped.
    app.update(Event::NavigateBack, &mut model);
    assert_eq!(model.current_screen(), Screen::Home);
    assert_eq!(model.navigation.depth(), 1);
}

#[test]
fn products_edits_are_dropped_when_leaving() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(Event::Navigate(Screen::Products), &mut model);
    app.update(Event::AddProductRow, &mut model);
    assert_eq!(model.products.as_ref().unwrap().rows.len(), 2);

    app.update(Event::NavigateBack, &mut model);
    app.update(Event::Navigate(Screen::Products), &mut model);
    assert_eq!(model.products.as_ref().unwrap().rows.len(), 1);
}

#[test]
fn screen_events_without_the_screen_are_ignored() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::UploadPressed, &mut model);
    assert!(update.effects.iter().all(|e| !e.is_camera()));
    app.update(Event::AddProductRow, &mut model);
    app.update(Event::DismissAlert, &mut model);

    assert!(model.ingredients.is_none());
    assert!(model.products.is_none());
    assert_eq!(model.current_screen(), Screen::Home);
}

#[test]
fn configure_switches_backend_and_rejects_garbage() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(
        Event::Configure {
            api_base_url: "https://api.example.com/v1".into(),
        },
        &mut model,
    );
    assert_eq!(model.config.base_url(), "https://api.example.com/v1/");

    app.update(
        Event::Configure {
            api_base_url: "ftp://nope".into(),
        },
        &mut model,
    );
    assert_eq!(model.config.base_url(), "https://api.example.com/v1/");
}

#[test]
fn opening_a_screen_already_on_the_stack_returns_to_it() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(Event::Navigate(Screen::Products), &mut model);
    app.update(Event::AddProductRow, &mut model);
    app.update(Event::Navigate(Screen::Ingredients), &mut model);
    assert_eq!(model.navigation.depth(), 3);

    app.update(Event::Navigate(Screen::Products), &mut model);
    assert_eq!(model.current_screen(), Screen::Products);
    assert_eq!(model.navigation.depth(), 2);
    assert!(model.ingredients.is_none());
    assert_eq!(model.products.as_ref().unwrap().rows.len(), 2);

    app.update(Event::AddProductRow, &mut model);
    assert_eq!(model.products.as_ref().unwrap().rows.len(), 3);

    app.update(Event::NavigateBack, &mut model);
    assert_eq!(model.current_screen(), Screen::Home);
    assert!(!app.view(&model).can_go_back);
}

#[test]
fn navigating_home_unwinds_the_whole_stack() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(Event::Navigate(Screen::Products), &mut model);
    app.update(Event::Navigate(Screen::Ingredients), &mut model);
    app.update(Event::Navigate(Screen::Home), &mut model);

    assert_eq!(model.current_screen(), Screen::Home);
    assert_eq!(model.navigation.depth(), 1);
    assert!(model.products.is_none());
    assert!(model.ingredients.is_none());
}
