//! Products screen: a growable list of product rows, a shared unit
//! selection, validation into a [`CompareRequest`] and the comparison result.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::{CompareRequest, CompareResponse, ProductPayload, PurchaseOption};
use crate::error::AppError;
use crate::model::MountId;

pub const COMPARE_FAILED_TITLE: &str = "Error";
pub const COMPARE_FAILED_BODY: &str = "Ocurrió un error al comparar los productos";
pub const UNIT_REQUIRED: &str = "La unidad es requerida";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Length,
    Mass,
    Volume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitType {
    #[serde(rename = "mt")]
    Meters,
    #[serde(rename = "cm")]
    Centimeters,
    #[serde(rename = "kg")]
    Kilograms,
    #[serde(rename = "g")]
    Grams,
    #[serde(rename = "ml")]
    Milliliters,
    #[serde(rename = "l")]
    Liters,
}

impl UnitType {
    pub const ALL: [Self; 6] = [
        Self::Meters,
        Self::Centimeters,
        Self::Kilograms,
        Self::Grams,
        Self::Milliliters,
        Self::Liters,
    ];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Meters => "mt",
            Self::Centimeters => "cm",
            Self::Kilograms => "kg",
            Self::Grams => "g",
            Self::Milliliters => "ml",
            Self::Liters => "l",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Meters => "Metros",
            Self::Centimeters => "Centímetros",
            Self::Kilograms => "Kilogramos",
            Self::Grams => "Gramos",
            Self::Milliliters => "Mililitros",
            Self::Liters => "Litros",
        }
    }

    #[must_use]
    pub const fn dimension(self) -> Dimension {
        match self {
            Self::Meters | Self::Centimeters => Dimension::Length,
            Self::Kilograms | Self::Grams => Dimension::Mass,
            Self::Milliliters | Self::Liters => Dimension::Volume,
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|unit| unit.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductField {
    Name,
    UnitsPerPackage,
    PackagePrice,
    QuantityPerUnit,
}

impl ProductField {
    pub const ALL: [Self; 4] = [
        Self::Name,
        Self::UnitsPerPackage,
        Self::PackagePrice,
        Self::QuantityPerUnit,
    ];

    const fn required_message(self) -> &'static str {
        match self {
            Self::Name => "El nombre es requerido",
            Self::UnitsPerPackage => "Las unidades por paquete son requeridas",
            Self::PackagePrice => "El precio del paquete es requerido",
            Self::QuantityPerUnit => "La cantidad por unidad es requerida",
        }
    }

    const fn invalid_message(self) -> &'static str {
        match self {
            Self::Name => "El nombre es requerido",
            Self::UnitsPerPackage => "Las unidades por paquete deben ser un número entero positivo",
            Self::PackagePrice => "El precio del paquete debe ser un número positivo",
            Self::QuantityPerUnit => "La cantidad por unidad debe ser un número positivo",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub name: Option<String>,
    pub units_per_package: Option<String>,
    pub package_price: Option<String>,
    pub quantity_per_unit: Option<String>,
}

impl FieldErrors {
    #[must_use]
    pub fn get(&self, field: ProductField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        ProductField::ALL.iter().all(|f| self.get(*f).is_none())
    }

    fn set(&mut self, field: ProductField, message: &str) {
        *self.slot_mut(field) = Some(message.to_string());
    }

    fn clear(&mut self, field: ProductField) {
        *self.slot_mut(field) = None;
    }

    const fn slot(&self, field: ProductField) -> &Option<String> {
        match field {
            ProductField::Name => &self.name,
            ProductField::UnitsPerPackage => &self.units_per_package,
            ProductField::PackagePrice => &self.package_price,
            ProductField::QuantityPerUnit => &self.quantity_per_unit,
        }
    }

    fn slot_mut(&mut self, field: ProductField) -> &mut Option<String> {
        match field {
            ProductField::Name => &mut self.name,
            ProductField::UnitsPerPackage => &mut self.units_per_package,
            ProductField::PackagePrice => &mut self.package_price,
            ProductField::QuantityPerUnit => &mut self.quantity_per_unit,
        }
    }
}

/// One row exactly as typed. Errors are view state and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub units_per_package: String,
    pub package_price: String,
    pub quantity_per_unit: String,
    #[serde(skip)]
    pub errors: FieldErrors,
}

impl ProductDraft {
    #[must_use]
    pub fn value(&self, field: ProductField) -> &str {
        match field {
            ProductField::Name => &self.name,
            ProductField::UnitsPerPackage => &self.units_per_package,
            ProductField::PackagePrice => &self.package_price,
            ProductField::QuantityPerUnit => &self.quantity_per_unit,
        }
    }

    fn value_mut(&mut self, field: ProductField) -> &mut String {
        match field {
            ProductField::Name => &mut self.name,
            ProductField::UnitsPerPackage => &mut self.units_per_package,
            ProductField::PackagePrice => &mut self.package_price,
            ProductField::QuantityPerUnit => &mut self.quantity_per_unit,
        }
    }

    fn validate(&mut self) -> Option<ProductPayload> {
        self.errors = FieldErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            self.errors.set(ProductField::Name, ProductField::Name.required_message());
        }

        let units = self.parse_field(ProductField::UnitsPerPackage, |raw| {
            raw.parse::<u32>().ok().filter(|units| *units > 0)
        });
        let price = self.parse_field(ProductField::PackagePrice, parse_positive_decimal);
        let quantity = self.parse_field(ProductField::QuantityPerUnit, parse_positive_decimal);

        if !self.errors.is_empty() {
            return None;
        }

        Some(ProductPayload {
            name: self.name.trim().to_string(),
            package_price: price?,
            units_per_package: units?,
            quantity_per_unit: quantity?,
        })
    }

    fn parse_field<T>(&mut self, field: ProductField, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
        let raw = self.value(field).trim();
        if raw.is_empty() {
            self.errors.set(field, field.required_message());
            return None;
        }
        let parsed = parse(raw);
        if parsed.is_none() {
            self.errors.set(field, field.invalid_message());
        }
        parsed
    }
}

/// Accepts `2.5` and `2,5`.
fn parse_positive_decimal(raw: &str) -> Option<f64> {
    raw.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}

/// The rows and unit that survive app restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductsDraft {
    pub rows: Vec<ProductDraft>,
    pub unit: Option<UnitType>,
}

impl Default for ProductsDraft {
    fn default() -> Self {
        Self {
            rows: vec![ProductDraft::default()],
            unit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub response: CompareResponse,
    pub unit: UnitType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductsScreen {
    pub mount_id: MountId,
    pub rows: Vec<ProductDraft>,
    pub unit: Option<UnitType>,
    pub unit_error: Option<String>,
    /// Unit of the comparison in flight, if any. Results are labelled with
    /// it even when the selection changes before the response arrives.
    pub in_flight: Option<UnitType>,
    pub comparison: Option<Comparison>,
    pub alert: Option<Alert>,
}

impl Default for ProductsScreen {
    fn default() -> Self {
        Self::from_draft(ProductsDraft::default())
    }
}

impl ProductsScreen {
    #[must_use]
    pub fn from_draft(draft: ProductsDraft) -> Self {
        let mut rows = draft.rows;
        if rows.is_empty() {
            rows.push(ProductDraft::default());
        }
        Self {
            mount_id: 0,
            rows,
            unit: draft.unit,
            unit_error: None,
            in_flight: None,
            comparison: None,
            alert: None,
        }
    }

    #[must_use]
    pub fn draft(&self) -> ProductsDraft {
        ProductsDraft {
            rows: self
                .rows
                .iter()
                .map(|row| ProductDraft {
                    errors: FieldErrors::default(),
                    ..row.clone()
                })
                .collect(),
            unit: self.unit,
        }
    }

    pub fn add_row(&mut self) {
        self.rows.push(ProductDraft::default());
    }

    /// Drops the last row; the form never goes below one row.
    pub fn remove_row(&mut self) {
        if self.rows.len() > 1 {
            self.rows.pop();
        }
    }

    pub fn set_field(&mut self, index: usize, field: ProductField, value: String) {
        let Some(row) = self.rows.get_mut(index) else {
            warn!(index, rows = self.rows.len(), "edit for a row that does not exist");
            return;
        };
        *row.value_mut(field) = value;
        row.errors.clear(field);
    }

    pub fn select_unit(&mut self, unit: UnitType) {
        self.unit = Some(unit);
        self.unit_error = None;
    }

    /// Validates every row, recording per-field messages. Returns the request
    /// only when the whole form is valid.
    pub fn validate(&mut self) -> Option<CompareRequest> {
        let products: Vec<Option<ProductPayload>> =
            self.rows.iter_mut().map(ProductDraft::validate).collect();

        self.unit_error = match self.unit {
            Some(_) => None,
            None => Some(UNIT_REQUIRED.to_string()),
        };

        let products: Option<Vec<ProductPayload>> = products.into_iter().collect();
        let request = CompareRequest {
            products: products?,
            unit_type: self.unit?,
        };
        Some(request)
    }

    #[must_use]
    pub fn comparing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// "Comparar Productos". No-op while a comparison is in flight.
    pub fn submit(&mut self) -> Option<CompareRequest> {
        if let Some(unit) = self.in_flight {
            debug!(unit = unit.code(), "comparison already in flight");
            return None;
        }
        let request = self.validate()?;
        self.in_flight = Some(request.unit_type);
        Some(request)
    }

    /// Returns `false` when no comparison was in flight.
    pub fn compare_finished(&mut self, result: Result<CompareResponse, AppError>) -> bool {
        let Some(unit) = self.in_flight.take() else {
            warn!("late comparison response ignored");
            return false;
        };
        match result {
            Ok(response) => {
                self.comparison = Some(Comparison { response, unit });
            }
            Err(e) => {
                warn!(error = %e, "comparison failed");
                self.alert = Some(Alert {
                    title: COMPARE_FAILED_TITLE.to_string(),
                    body: COMPARE_FAILED_BODY.to_string(),
                });
            }
        }
        true
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }
}

/// Display strings for one purchase option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSummary {
    pub cost_per_unit: String,
    pub products: String,
    pub total_cost: String,
    pub total_units: String,
}

impl OptionSummary {
    #[must_use]
    pub fn new(option: &PurchaseOption, unit: UnitType) -> Self {
        Self {
            cost_per_unit: format!("Costo por {}: ${:.4}", unit.label(), option.cost_per_unit),
            products: format!("Producto: {}", option.products.join(", ")),
            total_cost: format!("Costo total: ${:.2}", option.total_cost),
            total_units: format!("{} totales: {}", unit.label(), option.total_units),
        }
    }
}

#[must_use]
pub fn chart_uri(base64_png: &str) -> String {
    format!("data:image/png;base64,{base64_png}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    fn filled_row(name: &str) -> ProductDraft {
        ProductDraft {
            name: name.into(),
            units_per_package: "4".into(),
            package_price: "2,50".into(),
            quantity_per_unit: "0.5".into(),
            errors: FieldErrors::default(),
        }
    }

    #[test]
    fn starts_with_one_empty_row() {
        let screen = ProductsScreen::default();
        assert_eq!(screen.rows, vec![ProductDraft::default()]);
        assert_eq!(screen.unit, None);
    }

    #[test]
    fn remove_never_drops_last_row() {
        let mut screen = ProductsScreen::default();
        screen.add_row();
        screen.add_row();
        assert_eq!(screen.rows.len(), 3);

        screen.remove_row();
        screen.remove_row();
        screen.remove_row();
        assert_eq!(screen.rows.len(), 1);
    }

    #[test]
    fn remove_drops_the_last_row() {
        let mut screen = ProductsScreen::default();
        screen.set_field(0, ProductField::Name, "Arroz".into());
        screen.add_row();
        screen.set_field(1, ProductField::Name, "Pasta".into());
        screen.remove_row();
        assert_eq!(screen.rows[0].name, "Arroz");
    }

    #[test]
    fn required_messages() {
        let mut screen = ProductsScreen::default();
        assert_eq!(screen.validate(), None);

        let errors = &screen.rows[0].errors;
        assert_eq!(errors.get(ProductField::Name), Some("El nombre es requerido"));
        assert_eq!(
            errors.get(ProductField::UnitsPerPackage),
            Some("Las unidades por paquete son requeridas")
        );
        assert_eq!(
            errors.get(ProductField::PackagePrice),
            Some("El precio del paquete es requerido")
        );
        assert_eq!(
            errors.get(ProductField::QuantityPerUnit),
            Some("La cantidad por unidad es requerida")
        );
        assert_eq!(screen.unit_error.as_deref(), Some("La unidad es requerida"));
    }

    #[test]
    fn editing_clears_only_that_fields_error() {
        let mut screen = ProductsScreen::default();
        screen.validate();
        screen.set_field(0, ProductField::Name, "Leche".into());

        let errors = &screen.rows[0].errors;
        assert_eq!(errors.get(ProductField::Name), None);
        assert!(errors.get(ProductField::PackagePrice).is_some());
    }

    #[test]
    fn out_of_range_edit_is_ignored() {
        let mut screen = ProductsScreen::default();
        let before = screen.clone();
        screen.set_field(5, ProductField::Name, "x".into());
        assert_eq!(screen, before);
    }

    #[test]
    fn numeric_validation() {
        let mut screen = ProductsScreen::default();
        screen.select_unit(UnitType::Liters);
        screen.rows[0] = ProductDraft {
            units_per_package: "2.5".into(),
            package_price: "-1".into(),
            quantity_per_unit: "abc".into(),
            ..filled_row("Agua")
        };

        assert_eq!(screen.validate(), None);
        let errors = &screen.rows[0].errors;
        assert_eq!(
            errors.get(ProductField::UnitsPerPackage),
            Some("Las unidades por paquete deben ser un número entero positivo")
        );
        assert!(errors.get(ProductField::PackagePrice).is_some());
        assert!(errors.get(ProductField::QuantityPerUnit).is_some());
        assert_eq!(errors.get(ProductField::Name), None);
    }

    #[test]
    fn valid_form_builds_request() {
        let mut screen = ProductsScreen::default();
        screen.rows = vec![filled_row(" Arroz "), filled_row("Pasta")];
        screen.select_unit(UnitType::Kilograms);

        let request = screen.validate().unwrap();
        assert_eq!(request.unit_type, UnitType::Kilograms);
        assert_eq!(request.products.len(), 2);
        assert_eq!(request.products[0].name, "Arroz");
        assert_eq!(request.products[0].units_per_package, 4);
        assert!((request.products[0].package_price - 2.5).abs() < f64::EPSILON);
        assert!(screen.rows.iter().all(|r| r.errors.is_empty()));
    }

    #[test]
    fn submit_is_noop_while_in_flight() {
        let mut screen = ProductsScreen::default();
        screen.rows = vec![filled_row("Arroz")];
        screen.select_unit(UnitType::Grams);

        assert!(screen.submit().is_some());
        assert!(screen.comparing());
        assert!(screen.submit().is_none());
    }

    #[test]
    fn failure_shows_alert_until_dismissed() {
        let mut screen = ProductsScreen::default();
        screen.rows = vec![filled_row("Arroz")];
        screen.select_unit(UnitType::Grams);
        screen.submit();

        assert!(screen.compare_finished(Err(AppError::new(ErrorKind::Server, "boom"))));
        assert!(!screen.comparing());
        let alert = screen.alert.clone().unwrap();
        assert_eq!(alert.title, "Error");
        assert_eq!(alert.body, "Ocurrió un error al comparar los productos");

        screen.dismiss_alert();
        assert_eq!(screen.alert, None);
    }

    #[test]
    fn success_replaces_previous_comparison() {
        let mut screen = ProductsScreen::default();
        screen.rows = vec![filled_row("Arroz")];
        screen.select_unit(UnitType::Grams);

        screen.submit();
        screen.compare_finished(Ok(CompareResponse {
            plot1: Some("a".into()),
            ..CompareResponse::default()
        }));
        screen.submit();
        screen.compare_finished(Ok(CompareResponse::default()));

        assert_eq!(screen.comparison.as_ref().unwrap().response, CompareResponse::default());
        assert!(!screen.compare_finished(Ok(CompareResponse::default())));
    }

    #[test]
    fn results_keep_the_submitted_unit() {
        let mut screen = ProductsScreen::default();
        screen.rows = vec![filled_row("Leche")];
        screen.select_unit(UnitType::Liters);
        screen.submit();

        screen.select_unit(UnitType::Milliliters);
        assert_eq!(screen.in_flight, Some(UnitType::Liters));
        assert!(screen.compare_finished(Ok(CompareResponse::default())));

        assert_eq!(screen.comparison.as_ref().unwrap().unit, UnitType::Liters);
        assert_eq!(screen.unit, Some(UnitType::Milliliters));
        assert_eq!(screen.in_flight, None);
    }

    #[test]
    fn draft_strips_errors() {
        let mut screen = ProductsScreen::default();
        screen.validate();
        let draft = screen.draft();
        assert!(draft.rows[0].errors.is_empty());
        assert_eq!(ProductsScreen::from_draft(draft).rows.len(), 1);
    }

    #[test]
    fn empty_draft_still_has_one_row() {
        let screen = ProductsScreen::from_draft(ProductsDraft {
            rows: vec![],
            unit: Some(UnitType::Meters),
        });
        assert_eq!(screen.rows.len(), 1);
        assert_eq!(screen.unit, Some(UnitType::Meters));
    }

    #[test]
    fn units_and_labels() {
        assert_eq!(UnitType::from_code("ml"), Some(UnitType::Milliliters));
        assert_eq!(UnitType::from_code("oz"), None);
        assert_eq!(UnitType::Centimeters.label(), "Centímetros");
        assert_eq!(UnitType::Grams.dimension(), Dimension::Mass);
        assert_eq!(UnitType::Liters.dimension(), Dimension::Volume);
        assert_eq!(serde_json::to_string(&UnitType::Meters).unwrap(), "\"mt\"");
    }

    #[test]
    fn option_summary_formatting() {
        let option = PurchaseOption {
            cost_per_unit: 0.625,
            products: vec!["Arroz".into(), "Pasta".into()],
            total_cost: 5.0,
            total_units: 8.0,
        };
        let summary = OptionSummary::new(&option, UnitType::Kilograms);
        assert_eq!(summary.cost_per_unit, "Costo por Kilogramos: $0.6250");
        assert_eq!(summary.products, "Producto: Arroz, Pasta");
        assert_eq!(summary.total_cost, "Costo total: $5.00");
        assert_eq!(summary.total_units, "Kilogramos totales: 8");
        assert_eq!(chart_uri("iVBOR"), "data:image/png;base64,iVBOR");
    }

    #[derive(Debug, Clone)]
    enum RowOp {
        Add,
        Remove,
    }

    proptest! {
        #[test]
        fn row_count_never_drops_below_one(ops in prop::collection::vec(
            prop_oneof![Just(RowOp::Add), Just(RowOp::Remove)], 0..40
        )) {
            let mut screen = ProductsScreen::default();
            let mut expected = 1usize;
            for op in ops {
                match op {
                    RowOp::Add => { screen.add_row(); expected += 1; }
                    RowOp::Remove => { screen.remove_row(); expected = expected.saturating_sub(1).max(1); }
                }
                prop_assert!(!screen.rows.is_empty());
            }
            prop_assert_eq!(screen.rows.len(), expected);
        }
    }
}
