use tracing::{debug, info, warn};

use crate::api::{self, CompareResponse};
use crate::capabilities::{AcquireConfig, Capabilities, ImageSource};
use crate::config::ApiConfig;
use crate::error::{AppError, AppResult, ErrorKind};
use crate::event::Event;
use crate::image_processing::{prepare_for_upload, ProcessingConfig};
use crate::ingredients::{Command, IngredientsScreen, UploadOutcome};
use crate::model::{Model, MountId};
use crate::navigation::{Screen, Transition};
use crate::persistence;
use crate::products::{ProductsDraft, ProductsScreen};
use crate::view::ViewModel;
use crate::DRAFT_STORAGE_KEY;

#[derive(Default)]
pub struct App;

impl App {
    fn run(command: Command, mount: MountId, model: &mut Model, caps: &Capabilities) {
        match command {
            Command::CheckPermission(kind) => {
                caps.camera.check_permission(kind, move |result| Event::PermissionChecked {
                    mount,
                    kind,
                    result: Box::new(result),
                });
            }
            Command::RequestPermission(kind) => {
                caps.camera.request_permission(kind, move |result| Event::PermissionResolved {
                    mount,
                    kind,
                    result: Box::new(result),
                });
            }
            Command::Acquire(source) => {
                caps.camera
                    .acquire(source, AcquireConfig::default(), move |result| Event::ImageAcquired {
                        mount,
                        source,
                        result: Box::new(result),
                    });
            }
            Command::Upload(image) => {
                let prepared = match prepare_for_upload(image.data(), &ProcessingConfig::default()) {
                    Ok(prepared) => prepared,
                    Err(e) => {
                        Self::finish_upload(model, mount, UploadOutcome::Failure(e.into()));
                        return;
                    }
                };
                if let Err(e) = api::send_upload(&caps.http, &model.config, mount, &prepared) {
                    Self::finish_upload(model, mount, UploadOutcome::Failure(e));
                }
            }
            Command::OpenSettings => caps.camera.open_settings(),
        }
    }

    fn check_permissions(model: &mut Model, caps: &Capabilities) {
        let Some(mount) = model.ingredients.as_ref().map(|s| s.mount_id) else {
            return;
        };
        for command in IngredientsScreen::permission_checks() {
            Self::run(command, mount, model, caps);
        }
    }

    /// Applies a user action to the mounted Ingredients screen.
    fn ingredients_step(
        model: &mut Model,
        caps: &Capabilities,
        step: impl FnOnce(&mut IngredientsScreen) -> Option<Command>,
    ) {
        Self::ingredients_update(model, caps, None, step);
    }

    /// Applies a capability reply, but only to the mount that asked for it.
    fn ingredients_reply(
        model: &mut Model,
        caps: &Capabilities,
        mount: MountId,
        step: impl FnOnce(&mut IngredientsScreen) -> Option<Command>,
    ) {
        Self::ingredients_update(model, caps, Some(mount), step);
    }

    fn ingredients_update(
        model: &mut Model,
        caps: &Capabilities,
        reply_to: Option<MountId>,
        step: impl FnOnce(&mut IngredientsScreen) -> Option<Command>,
    ) {
        let Some(screen) = model.ingredients.as_mut() else {
            debug!("ingredients screen not mounted, event dropped");
            return;
        };
        if let Some(mount) = reply_to.filter(|m| *m != screen.mount_id) {
            debug!(mount, current = screen.mount_id, "reply for a previous ingredients screen dropped");
            return;
        }
        let mount = screen.mount_id;
        if let Some(command) = step(screen) {
            Self::run(command, mount, model, caps);
        }
    }

    fn products_step(model: &mut Model, step: impl FnOnce(&mut ProductsScreen)) {
        match model.products.as_mut() {
            Some(screen) => step(screen),
            None => debug!("products screen not mounted, event dropped"),
        }
    }

    fn finish_upload(model: &mut Model, mount: MountId, outcome: UploadOutcome) {
        let Some(screen) = model.ingredients.as_mut() else {
            debug!("upload finished after the screen was closed");
            return;
        };
        if screen.mount_id != mount {
            debug!(mount, current = screen.mount_id, "upload for a previous ingredients screen dropped");
            return;
        }
        let succeeded = matches!(outcome, UploadOutcome::Success(_));
        if screen.upload_finished(outcome) && succeeded {
            info!("classification received");
        }
    }

    fn finish_comparison(model: &mut Model, mount: MountId, result: AppResult<CompareResponse>) {
        let Some(screen) = model.products.as_mut() else {
            debug!("comparison finished after the screen was closed");
            return;
        };
        if screen.mount_id != mount {
            debug!(mount, current = screen.mount_id, "comparison for a previous products screen dropped");
            return;
        }
        if screen.compare_finished(result) && screen.comparison.is_some() {
            info!("comparison received");
        }
    }

    fn submit_comparison(model: &mut Model, caps: &Capabilities) {
        let Some(screen) = model.products.as_mut() else {
            debug!("products screen not mounted, event dropped");
            return;
        };
        let Some(request) = screen.submit() else {
            return;
        };

        let mount = screen.mount_id;
        let draft = screen.draft();
        Self::save_draft(&draft, caps);
        model.saved_draft = Some(draft);

        if let Err(e) = api::send_compare(&caps.http, &model.config, mount, &request) {
            Self::finish_comparison(model, mount, Err(e));
        }
    }

    fn save_draft(draft: &ProductsDraft, caps: &Capabilities) {
        match persistence::encode_draft(draft) {
            Ok(bytes) => caps
                .kv
                .set(DRAFT_STORAGE_KEY.to_string(), bytes, Event::DraftSaved),
            Err(e) => warn!(error = %e, "draft not saved"),
        }
    }

    fn restore_draft(model: &mut Model, draft: ProductsDraft) {
        if let Some(screen) = model.products.as_mut() {
            if screen.draft() == ProductsDraft::default() && !screen.comparing() {
                *screen = ProductsScreen {
                    mount_id: screen.mount_id,
                    ..ProductsScreen::from_draft(draft.clone())
                };
            }
        }
        model.saved_draft = Some(draft);
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        let event_name = event.name();
        debug!(
            event = event_name,
            user = event.is_user_initiated(),
            screen = model.current_screen().name(),
            "update"
        );

        match event {
            Event::AppStarted => {
                caps.kv.get(DRAFT_STORAGE_KEY.to_string(), Event::DraftLoaded);
            }

            Event::AppForegrounded => {
                Self::check_permissions(model, caps);
            }

            Event::Configure { api_base_url } => match ApiConfig::new(&api_base_url) {
                Ok(config) => {
                    info!(base_url = config.base_url(), "api configured");
                    model.config = config;
                }
                Err(e) => warn!(error = %e, "configuration rejected, keeping previous"),
            },

            Event::Navigate(screen) => match model.navigation.push(screen) {
                Transition::Pushed(pushed) => {
                    model.mount(pushed);
                    if pushed == Screen::Ingredients {
                        Self::check_permissions(model, caps);
                    }
                }
                Transition::Popped(popped) => {
                    debug!(screen = screen.name(), popped = popped.len(), "returned to open screen");
                    for screen in popped {
                        model.unmount(screen);
                    }
                }
                Transition::Unchanged => debug!(screen = screen.name(), "navigation ignored"),
            },

            Event::NavigateBack => match model.navigation.pop() {
                Transition::Popped(popped) => {
                    for screen in popped {
                        model.unmount(screen);
                    }
                }
                _ => debug!("already at root"),
            },

            Event::UploadPressed => {
                Self::ingredients_step(model, caps, |s| s.trigger(ImageSource::Library));
            }
            Event::CameraPressed => {
                Self::ingredients_step(model, caps, |s| s.trigger(ImageSource::Camera));
            }
            Event::ModalConfirmed => Self::ingredients_step(model, caps, IngredientsScreen::confirm),
            Event::ModalCancelled => Self::ingredients_step(model, caps, |s| {
                s.cancel();
                None
            }),

            Event::PermissionChecked {
                mount,
                kind,
                result,
            } => Self::ingredients_reply(model, caps, mount, |s| {
                s.permission_checked(kind, *result);
                None
            }),
            Event::PermissionResolved {
                mount,
                kind,
                result,
            } => Self::ingredients_reply(model, caps, mount, |s| {
                s.permission_resolved(kind, *result)
            }),
            Event::ImageAcquired {
                mount,
                source,
                result,
            } => Self::ingredients_reply(model, caps, mount, |s| s.image_acquired(source, *result)),
            Event::UploadResponse { mount, result } => {
                Self::finish_upload(model, mount, api::upload_outcome(*result));
            }

            Event::AddProductRow => Self::products_step(model, ProductsScreen::add_row),
            Event::RemoveProductRow => Self::products_step(model, ProductsScreen::remove_row),
            Event::ProductFieldChanged {
                index,
                field,
                value,
            } => Self::products_step(model, |s| s.set_field(index, field, value)),
            Event::UnitSelected { unit } => Self::products_step(model, |s| s.select_unit(unit)),
            Event::CompareRequested => Self::submit_comparison(model, caps),
            Event::CompareResponse { mount, result } => {
                let result = match *result {
                    Ok(mut response) => response.take_body().ok_or_else(|| {
                        AppError::new(ErrorKind::Deserialization, "Comparison response was empty")
                    }),
                    Err(e) => Err(AppError::from_http_error(&e)),
                };
                Self::finish_comparison(model, mount, result);
            }
            Event::DismissAlert => Self::products_step(model, ProductsScreen::dismiss_alert),

            Event::DraftLoaded(result) => match result {
                Ok(value) => {
                    if let Some(draft) = persistence::restore(value.as_deref()) {
                        Self::restore_draft(model, draft);
                    }
                }
                Err(e) => warn!(error = %e, "draft could not be read"),
            },
            Event::DraftSaved(result) => match result {
                Ok(_) => debug!("draft saved"),
                Err(e) => warn!(error = %e, "draft could not be saved"),
            },
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::new(model)
    }
}
