//! # Document Model
//!
//! Normalizes raw item, personnel, organization and custody input into the
//! flat record the renderer consumes, and computes every derived field:
//! totals, the generated document number, formatted amounts and dates, and
//! the two signature blocks.
//!
//! ```text
//! SlipInput ──normalize──▶ DocumentRequest ──bundle──▶ DocumentBundle
//!  (raw)                   (typed, defaulted)          (+ formatted strings)
//! ```
//!
//! The builder never fails on missing optional fields; it prints `"N/A"`.
//! It fails only when quantity or unit cost cannot be read as a
//! non-negative number.

pub mod input;

use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlipError};
use crate::format::FormatLocale;
pub use input::{CustodyMetadata, InventoryRecord, OrganizationRecord, PersonnelRecord, Scalar, SlipInput};

/// Printed wherever an optional field was left blank.
pub const NOT_AVAILABLE: &str = "N/A";

/// Caption under every signature line.
pub const SIGNATURE_CAPTION: &str = "Signature over Printed Name";

/// Closing rule of the recipient block, dated by hand.
pub const DATE_RULE: &str = "____________________";

/// The one item whose custody is transferred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub quantity: u32,
    pub unit: String,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub description: String,
    pub code: String,
    pub useful_life: String,
}

/// A signatory: who issues or who receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub name: String,
    pub position: String,
}

/// The normalized request for one render. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequest {
    pub entity_name: String,
    pub fund_cluster: String,
    pub document_number: String,
    pub line_item: LineItem,
    pub recipient: Party,
    pub issuer: Party,
    pub transfer_date: NaiveDate,
}

/// The request plus every derived presentation string.
///
/// This is also what a callback target receives instead of a rendered file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentBundle {
    pub request: DocumentRequest,
    /// True when the document number was generated rather than supplied.
    pub document_number_generated: bool,
    /// Render timestamp the document number and PDF dates derive from.
    pub issued_at: NaiveDateTime,
    pub unit_cost_text: String,
    pub total_cost_text: String,
    pub transfer_date_text: String,
    /// Multi-line "Received from" block.
    pub issuer_block: String,
    /// Multi-line "Received by" block.
    pub recipient_block: String,
}

impl DocumentBundle {
    /// Cells of the item table's single body row, in column order.
    pub fn item_row(&self) -> Vec<String> {
        let item = &self.request.line_item;
        vec![
            item.quantity.to_string(),
            item.unit.clone(),
            self.unit_cost_text.clone(),
            self.total_cost_text.clone(),
            item.description.clone(),
            item.code.clone(),
            item.useful_life.clone(),
        ]
    }
}

/// Per-render inputs that would otherwise be ambient: the clock and the
/// random source behind generated document numbers.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub timestamp: NaiveDateTime,
    rng: StdRng,
}

impl RenderContext {
    /// Local wall-clock time and an entropy-seeded generator.
    pub fn now() -> Self {
        Self {
            timestamp: Local::now().naive_local(),
            rng: StdRng::from_entropy(),
        }
    }

    /// A fully reproducible context.
    pub fn seeded(timestamp: NaiveDateTime, seed: u64) -> Self {
        Self {
            timestamp,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn next_serial(&mut self) -> u16 {
        self.rng.gen_range(0..=999)
    }
}

/// Builds [`DocumentRequest`]s and [`DocumentBundle`]s.
#[derive(Debug, Clone)]
pub struct DocumentModelBuilder {
    locale: FormatLocale,
    prefix: String,
}

impl DocumentModelBuilder {
    pub fn new(locale: FormatLocale, prefix: &str) -> Self {
        Self {
            locale,
            prefix: prefix.to_string(),
        }
    }

    pub fn locale(&self) -> &FormatLocale {
        &self.locale
    }

    /// Normalize and format in one step.
    pub fn build(&self, input: &SlipInput, ctx: &mut RenderContext) -> Result<DocumentBundle> {
        let supplied_number = non_blank(input.custody.document_number.as_deref()).is_some();
        let request = self.normalize(input, ctx)?;
        let bundle = self.bundle(request, !supplied_number, ctx.timestamp);
        log::debug!(
            "built bundle for document {} (item {})",
            bundle.request.document_number,
            bundle.request.line_item.code
        );
        Ok(bundle)
    }

    /// Coerce and default the raw input into a typed request.
    pub fn normalize(&self, input: &SlipInput, ctx: &mut RenderContext) -> Result<DocumentRequest> {
        let item = &input.item;

        let quantity = coerce_quantity(item.quantity.as_ref())?;
        let unit_cost = coerce_amount("unitPrice", item.unit_price.as_ref())?.unwrap_or(Decimal::ZERO);
        let computed_total = || {
            unit_cost
                .checked_mul(Decimal::from(quantity))
                .ok_or_else(|| SlipError::InvalidLineItem {
                    field: "unitPrice",
                    value: format!("{} x {} exceeds the representable range", unit_cost, quantity),
                })
        };
        let total_cost = match coerce_amount("totalCost", item.total_cost.as_ref()) {
            Ok(Some(total)) => total,
            Ok(None) => computed_total()?,
            Err(e) => {
                log::warn!("ignoring untrustworthy total ({}); using quantity x unit cost", e);
                computed_total()?
            }
        };

        let description = match (non_blank(item.name.as_deref()), non_blank(item.description.as_deref())) {
            (Some(name), Some(desc)) if name != desc => format!("{} - {}", name, desc),
            (Some(name), _) => name.to_string(),
            (None, Some(desc)) => desc.to_string(),
            (None, None) => NOT_AVAILABLE.to_string(),
        };

        let custody = &input.custody;
        let document_number = match non_blank(custody.document_number.as_deref()) {
            Some(number) => number.to_string(),
            None => self.generate_document_number(ctx),
        };

        let recipient = custody
            .received_by
            .as_ref()
            .filter(|p| non_blank(p.name.as_deref()).is_some())
            .or(input.assignee.as_ref());

        Ok(DocumentRequest {
            entity_name: or_na(input.entity.as_ref().and_then(|e| e.name.as_deref())),
            fund_cluster: or_na(custody.fund_cluster.as_deref()),
            document_number,
            line_item: LineItem {
                quantity,
                unit: or_na(item.unit.as_deref()),
                unit_cost,
                total_cost,
                description,
                code: or_na(item.code.as_deref()),
                useful_life: or_na(custody.estimated_useful_life.as_deref()),
            },
            recipient: party(recipient),
            issuer: party(custody.received_from.as_ref()),
            transfer_date: custody.transfer_date.unwrap_or_else(|| ctx.timestamp.date()),
        })
    }

    /// Attach the formatted strings and signature blocks to a request.
    pub fn bundle(
        &self,
        request: DocumentRequest,
        document_number_generated: bool,
        issued_at: NaiveDateTime,
    ) -> DocumentBundle {
        let transfer_date_text = self.locale.format_date(request.transfer_date);
        let issuer_block = signature_block("Received from:", &request.issuer, &transfer_date_text);
        let recipient_block = signature_block("Received by:", &request.recipient, DATE_RULE);

        DocumentBundle {
            unit_cost_text: self.locale.format_currency(request.line_item.unit_cost),
            total_cost_text: self.locale.format_currency(request.line_item.total_cost),
            transfer_date_text,
            issuer_block,
            recipient_block,
            document_number_generated,
            issued_at,
            request,
        }
    }

    /// `PREFIX-YYYY-MM-RRR` from the render timestamp and the context's
    /// random source.
    ///
    /// No uniqueness check is made against numbers issued before: two slips
    /// generated in the same month collide with probability 1/1000.
    pub fn generate_document_number(&self, ctx: &mut RenderContext) -> String {
        let serial = ctx.next_serial();
        let number = format!(
            "{}-{:04}-{:02}-{:03}",
            self.prefix,
            ctx.timestamp.year(),
            ctx.timestamp.month(),
            serial
        );
        log::debug!("generated document number {} (not collision-checked)", number);
        number
    }
}

/// Label, name, caption, parenthesized position and a closing line, each
/// separated by a blank line.
fn signature_block(label: &str, party: &Party, closing: &str) -> String {
    let position = format!("({})", party.position);
    [
        label,
        "",
        party.name.as_str(),
        "",
        SIGNATURE_CAPTION,
        "",
        position.as_str(),
        "",
        closing,
    ]
    .join("\n")
}

fn party(record: Option<&PersonnelRecord>) -> Party {
    Party {
        name: or_na(record.and_then(|p| p.name.as_deref())),
        position: or_na(record.and_then(|p| p.position.as_deref())),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn or_na(value: Option<&str>) -> String {
    non_blank(value).unwrap_or(NOT_AVAILABLE).to_string()
}

/// `Ok(None)` for absent or blank values.
fn coerce_amount(field: &'static str, value: Option<&Scalar>) -> Result<Option<Decimal>> {
    let text = match value.map(Scalar::as_text) {
        Some(t) if !t.is_empty() => t,
        _ => return Ok(None),
    };
    let invalid = || SlipError::InvalidLineItem {
        field,
        value: text.clone(),
    };

    let cleaned = text.replace(',', "");
    let amount = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|_| invalid())?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(invalid());
    }
    Ok(Some(amount.normalize()))
}

/// Whole, non-negative quantity. Absent, blank and zero all mean 1.
fn coerce_quantity(value: Option<&Scalar>) -> Result<u32> {
    let amount = match coerce_amount("quantity", value)? {
        Some(a) => a,
        None => return Ok(1),
    };
    let invalid = || SlipError::InvalidLineItem {
        field: "quantity",
        value: amount.to_string(),
    };
    if !amount.fract().is_zero() {
        return Err(invalid());
    }
    let quantity = amount.to_u32().ok_or_else(invalid)?;
    Ok(quantity.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn timestamp(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(9, 30, 0).unwrap())
    }

    fn builder() -> DocumentModelBuilder {
        DocumentModelBuilder::new(FormatLocale::default(), "ICS")
    }

    fn item(quantity: Option<Scalar>, unit_price: Option<Scalar>, total: Option<Scalar>) -> SlipInput {
        SlipInput {
            item: InventoryRecord {
                code: Some("LAP-001".to_string()),
                name: Some("Laptop".to_string()),
                quantity,
                unit: Some("unit".to_string()),
                unit_price,
                total_cost: total,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn ctx() -> RenderContext {
        RenderContext::seeded(timestamp(2025, 3, 15), 7)
    }

    #[test]
    fn test_total_cost_derived() {
        let req = builder()
            .normalize(&item(Some(3u32.into()), Some("150.00".into()), None), &mut ctx())
            .unwrap();
        assert_eq!(req.line_item.total_cost, Decimal::from_str("450.00").unwrap());
    }

    #[test]
    fn test_explicit_total_preserved_even_if_inconsistent() {
        let req = builder()
            .normalize(
                &item(Some(3u32.into()), Some("150.00".into()), Some("999.99".into())),
                &mut ctx(),
            )
            .unwrap();
        assert_eq!(req.line_item.total_cost, Decimal::from_str("999.99").unwrap());
    }

    #[test]
    fn test_garbage_total_is_recomputed() {
        let req = builder()
            .normalize(&item(Some(2u32.into()), Some("10".into()), Some("n/a".into())), &mut ctx())
            .unwrap();
        assert_eq!(req.line_item.total_cost, Decimal::from(20));
    }

    #[test]
    fn test_total_overflow_is_an_error() {
        let max = "79228162514264337593543950335";
        let err = builder()
            .normalize(&item(Some(2u32.into()), Some(max.into()), None), &mut ctx())
            .unwrap_err();
        assert!(matches!(err, SlipError::InvalidLineItem { field: "unitPrice", .. }));

        // A supplied total means the product is never needed.
        let req = builder()
            .normalize(&item(Some(2u32.into()), Some(max.into()), Some("100".into())), &mut ctx())
            .unwrap();
        assert_eq!(req.line_item.total_cost, Decimal::from(100));
    }

    #[test]
    fn test_quantity_defaults_to_one() {
        let absent = builder().normalize(&item(None, Some("5".into()), None), &mut ctx()).unwrap();
        assert_eq!(absent.line_item.quantity, 1);
        let zero = builder()
            .normalize(&item(Some(0u32.into()), Some("5".into()), None), &mut ctx())
            .unwrap();
        assert_eq!(zero.line_item.quantity, 1);
        assert_eq!(zero.line_item.total_cost, Decimal::from(5));
    }

    #[test]
    fn test_non_numeric_quantity_names_field() {
        let err = builder()
            .normalize(&item(Some("three".into()), Some("5".into()), None), &mut ctx())
            .unwrap_err();
        assert!(matches!(err, SlipError::InvalidLineItem { field: "quantity", .. }));
    }

    #[test]
    fn test_negative_unit_price_rejected() {
        let err = builder()
            .normalize(&item(Some(1u32.into()), Some("-5".into()), None), &mut ctx())
            .unwrap_err();
        assert!(matches!(err, SlipError::InvalidLineItem { field: "unitPrice", .. }));
    }

    #[test]
    fn test_fractional_quantity_rejected() {
        let err = builder()
            .normalize(&item(Some("2.5".into()), Some("5".into()), None), &mut ctx())
            .unwrap_err();
        assert!(matches!(err, SlipError::InvalidLineItem { field: "quantity", .. }));
    }

    #[test]
    fn test_grouped_amount_accepted() {
        let req = builder()
            .normalize(&item(Some(1u32.into()), Some("1,234.50".into()), None), &mut ctx())
            .unwrap();
        assert_eq!(req.line_item.unit_cost, Decimal::from_str("1234.5").unwrap());
    }

    #[test]
    fn test_missing_optional_fields_become_na() {
        let req = builder().normalize(&SlipInput::default(), &mut ctx()).unwrap();
        assert_eq!(req.entity_name, NOT_AVAILABLE);
        assert_eq!(req.fund_cluster, NOT_AVAILABLE);
        assert_eq!(req.line_item.description, NOT_AVAILABLE);
        assert_eq!(req.recipient.name, NOT_AVAILABLE);
        assert_eq!(req.issuer.position, NOT_AVAILABLE);
        assert_eq!(req.transfer_date, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
    }

    #[test]
    fn test_document_number_format() {
        let number = builder().generate_document_number(&mut ctx());
        assert!(number.starts_with("ICS-2025-03-"), "got {}", number);
        let serial = &number["ICS-2025-03-".len()..];
        assert_eq!(serial.len(), 3);
        assert!(serial.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_document_number_deterministic_for_seed() {
        let a = builder().generate_document_number(&mut ctx());
        let b = builder().generate_document_number(&mut ctx());
        assert_eq!(a, b);
    }

    #[test]
    fn test_supplied_document_number_kept() {
        let mut input = item(Some(1u32.into()), Some("1".into()), None);
        input.custody.document_number = Some("  ICS-2024-12-001 ".to_string());
        let bundle = builder().build(&input, &mut ctx()).unwrap();
        assert_eq!(bundle.request.document_number, "ICS-2024-12-001");
        assert!(!bundle.document_number_generated);
    }

    #[test]
    fn test_received_by_overrides_assignee() {
        let mut input = item(Some(1u32.into()), Some("1".into()), None);
        input.assignee = Some(PersonnelRecord::new("Ana Cruz", "Teacher I"));
        let req = builder().normalize(&input, &mut ctx()).unwrap();
        assert_eq!(req.recipient.name, "Ana Cruz");

        input.custody.received_by = Some(PersonnelRecord::new("Ben Reyes", "Principal"));
        let req = builder().normalize(&input, &mut ctx()).unwrap();
        assert_eq!(req.recipient.name, "Ben Reyes");
        assert_eq!(req.recipient.position, "Principal");
    }

    #[test]
    fn test_signature_blocks() {
        let mut input = item(Some(1u32.into()), Some("1".into()), None);
        input.custody.received_from = Some(PersonnelRecord::new("Carla Santos", "Supply Officer"));
        input.custody.transfer_date = NaiveDate::from_ymd_opt(2025, 3, 15);
        let bundle = builder().build(&input, &mut ctx()).unwrap();

        let issuer: Vec<&str> = bundle.issuer_block.lines().collect();
        assert_eq!(
            issuer,
            vec![
                "Received from:",
                "",
                "Carla Santos",
                "",
                SIGNATURE_CAPTION,
                "",
                "(Supply Officer)",
                "",
                "March 15, 2025",
            ]
        );
        assert!(bundle.recipient_block.starts_with("Received by:\n\nN/A\n"));
        assert!(bundle.recipient_block.ends_with(DATE_RULE));
    }

    #[test]
    fn test_amounts_formatted_once_for_all_blocks() {
        let bundle = builder()
            .build(&item(Some(3u32.into()), Some("150".into()), None), &mut ctx())
            .unwrap();
        assert_eq!(bundle.unit_cost_text, "\u{20B1}150.00");
        assert_eq!(bundle.total_cost_text, "\u{20B1}450.00");
        let row = bundle.item_row();
        assert_eq!(row[2], bundle.unit_cost_text);
        assert_eq!(row[3], bundle.total_cost_text);
    }
}
