//! View model projection. Everything here is derived from [`Model`]; the
//! shell renders it verbatim.

use serde::{Deserialize, Serialize};

use crate::ingredients::{IngredientsScreen, Modal};
use crate::model::Model;
use crate::navigation::Screen;
use crate::permissions::PermissionKind;
use crate::products::{chart_uri, OptionSummary, ProductField, ProductsScreen, UnitType};

pub const CONFIRM_LABEL: &str = "Aceptar";
pub const CANCEL_LABEL: &str = "Cancelar";
pub const UPLOAD_LABEL: &str = "Subir imagen";
pub const CAMERA_LABEL: &str = "Tomar imagen";
pub const COMPARE_LABEL: &str = "Comparar Productos";
pub const RISKY_INGREDIENTS_HEADING: &str = "Ingredientes riesgosos detectados:";
pub const RISK_SCORE_LABEL: &str = "Puntuación de riesgo";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub title: Option<String>,
    pub can_go_back: bool,
    pub screen: ScreenView,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum ScreenView {
    Home(HomeView),
    Products(ProductsView),
    Ingredients(IngredientsView),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HomeEntry {
    pub label: String,
    pub target: Screen,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HomeView {
    pub entries: Vec<HomeEntry>,
}

impl HomeView {
    fn new() -> Self {
        let entries = [Screen::Products, Screen::Ingredients]
            .into_iter()
            .filter_map(|target| {
                target.title().map(|label| HomeEntry {
                    label: label.to_string(),
                    target,
                })
            })
            .collect();
        Self { entries }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldView {
    pub field: ProductField,
    pub label: String,
    pub placeholder: String,
    pub value: String,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductRowView {
    pub fields: Vec<FieldView>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnitOption {
    pub code: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComparisonSection {
    pub title: String,
    pub chart_uri: String,
    pub summary: Option<OptionSummary>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertView {
    pub title: String,
    pub body: String,
    pub confirm_label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductsView {
    pub rows: Vec<ProductRowView>,
    pub can_remove_row: bool,
    pub unit_options: Vec<UnitOption>,
    pub unit_error: Option<String>,
    pub loading: bool,
    pub submit_label: String,
    pub submit_enabled: bool,
    pub sections: Vec<ComparisonSection>,
    pub alert: Option<AlertView>,
}

const fn field_copy(field: ProductField) -> (&'static str, &'static str) {
    match field {
        ProductField::Name => ("Nombre", "Ingresa el nombre del producto"),
        ProductField::UnitsPerPackage => ("Unidades", "Ingresa las unidades por paquete"),
        ProductField::PackagePrice => ("Precio", "Ingresa el precio del paquete"),
        ProductField::QuantityPerUnit => ("Cantidad por unidad", "Ingresa la cantidad por unidad"),
    }
}

impl ProductsView {
    fn new(screen: &ProductsScreen) -> Self {
        let rows = screen
            .rows
            .iter()
            .map(|row| ProductRowView {
                fields: ProductField::ALL
                    .into_iter()
                    .map(|field| {
                        let (label, placeholder) = field_copy(field);
                        FieldView {
                            field,
                            label: label.to_string(),
                            placeholder: placeholder.to_string(),
                            value: row.value(field).to_string(),
                            error: row.errors.get(field).map(str::to_string),
                        }
                    })
                    .collect(),
            })
            .collect();

        let unit_options = UnitType::ALL
            .into_iter()
            .map(|unit| UnitOption {
                code: unit.code().to_string(),
                label: unit.label().to_string(),
                selected: screen.unit == Some(unit),
            })
            .collect();

        let mut sections = Vec::new();
        if let Some(comparison) = &screen.comparison {
            let response = &comparison.response;
            let charts = [
                ("Opción más barata", &response.plot1, response.cheapest_option.as_ref()),
                ("Opción más conveniente", &response.plot2, response.convenient_option.as_ref()),
                ("Comparación de opciones", &response.plot3, None),
            ];
            for (title, plot, option) in charts {
                if let Some(plot) = plot {
                    sections.push(ComparisonSection {
                        title: title.to_string(),
                        chart_uri: chart_uri(plot),
                        summary: option.map(|o| OptionSummary::new(o, comparison.unit)),
                    });
                }
            }
        }

        Self {
            rows,
            can_remove_row: screen.rows.len() > 1,
            unit_options,
            unit_error: screen.unit_error.clone(),
            loading: screen.comparing(),
            submit_label: COMPARE_LABEL.to_string(),
            submit_enabled: !screen.comparing(),
            sections,
            alert: screen.alert.as_ref().map(|alert| AlertView {
                title: alert.title.clone(),
                body: alert.body.clone(),
                confirm_label: CONFIRM_LABEL.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResultView {
    pub heading: String,
    pub risky_ingredients: Vec<String>,
    pub score_label: String,
    pub normalized_risk: f64,
    pub risk_color: String,
    pub classification_message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ModalView {
    pub title: String,
    pub body: String,
    pub result: Option<ResultView>,
    pub confirm_label: String,
    pub cancel_label: Option<String>,
}

impl From<&Modal> for ModalView {
    fn from(modal: &Modal) -> Self {
        let result = modal
            .result
            .as_ref()
            .filter(|r| !r.risky_ingredients.is_empty())
            .map(|r| ResultView {
                heading: RISKY_INGREDIENTS_HEADING.to_string(),
                risky_ingredients: r.risky_ingredients.clone(),
                score_label: RISK_SCORE_LABEL.to_string(),
                normalized_risk: r.normalized_risk,
                risk_color: r.risk_color().as_str().to_string(),
                classification_message: r.classification_message.clone(),
            });
        Self {
            title: modal.title.clone(),
            body: modal.body.clone(),
            result,
            confirm_label: CONFIRM_LABEL.to_string(),
            cancel_label: modal.show_cancel.then(|| CANCEL_LABEL.to_string()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IngredientsView {
    pub upload_label: String,
    pub camera_label: String,
    pub triggers_enabled: bool,
    pub loading: bool,
    pub media_library_granted: bool,
    pub camera_granted: bool,
    pub modal: Option<ModalView>,
}

impl IngredientsView {
    fn new(screen: &IngredientsScreen) -> Self {
        Self {
            upload_label: UPLOAD_LABEL.to_string(),
            camera_label: CAMERA_LABEL.to_string(),
            triggers_enabled: screen.can_trigger(),
            loading: screen.loading(),
            media_library_granted: screen.permissions.is_granted(PermissionKind::MediaLibrary),
            camera_granted: screen.permissions.is_granted(PermissionKind::Camera),
            modal: screen.modal.as_ref().map(ModalView::from),
        }
    }
}

impl ViewModel {
    #[must_use]
    pub fn new(model: &Model) -> Self {
        let current = model.current_screen();
        let screen = match current {
            Screen::Home => ScreenView::Home(HomeView::new()),
            Screen::Products => match &model.products {
                Some(products) => ScreenView::Products(ProductsView::new(products)),
                None => ScreenView::Products(ProductsView::new(&ProductsScreen::default())),
            },
            Screen::Ingredients => match &model.ingredients {
                Some(ingredients) => ScreenView::Ingredients(IngredientsView::new(ingredients)),
                None => ScreenView::Ingredients(IngredientsView::new(&IngredientsScreen::default())),
            },
        };

        Self {
            title: current.title().map(str::to_string),
            can_go_back: model.navigation.can_go_back(),
            screen,
        }
    }
}
