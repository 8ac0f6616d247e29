//! Checkout form validation.
//!
//! [`validate`] is a pure function of the billing fields, the payment method
//! and the card fields. [`CheckoutFormState`] wraps it with the editing
//! behaviour a form needs: revalidation on every change and "touched"
//! tracking so that defects are only shown once a field was visited or a
//! submission was attempted.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use super::order::{Billing, PaymentMethod};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .expect("email pattern is valid")
});
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]+$").expect("phone pattern is valid"));
static POSTAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("postal code pattern is valid"));
static EXPIRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[1-9]|1[0-2])/[0-9]{2}$").expect("expiry pattern is valid"));

const MAX_EMAIL_LEN: usize = 254;
const MAX_EMAIL_LOCAL_LEN: usize = 64;

struct TestInstrument {
    number: &'static str,
    expiry: &'static str,
    cvv: &'static str,
}

/// The only cards checkout accepts. There is no payment integration.
const TEST_INSTRUMENTS: &[TestInstrument] = &[
    // Visa
    TestInstrument {
        number: "4111111111111111",
        expiry: "12/28",
        cvv: "123",
    },
    // Mastercard
    TestInstrument {
        number: "5555555555554444",
        expiry: "12/28",
        cvv: "123",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Name,
    Email,
    Phone,
    Address,
    City,
    PostalCode,
    Country,
    CardNumber,
    CardHolder,
    CardExpiry,
    CardCvv,
}

impl Field {
    pub const BILLING: [Field; 7] = [
        Field::Name,
        Field::Email,
        Field::Phone,
        Field::Address,
        Field::City,
        Field::PostalCode,
        Field::Country,
    ];
    pub const CARD: [Field; 4] = [
        Field::CardNumber,
        Field::CardHolder,
        Field::CardExpiry,
        Field::CardCvv,
    ];

    pub fn is_card(self) -> bool {
        Field::CARD.contains(&self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefect {
    Required,
    InvalidEmail,
    InvalidPhone,
    InvalidPostalCode,
}

/// Form-level card problems, reported one at a time in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardDefect {
    CardIncomplete,
    InvalidExpFormat,
    InvalidCard,
}

/// Card input. Lives only for the duration of checkout; an order keeps at
/// most [`CardCredential::last4`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CardCredential {
    pub number: String,
    pub holder_name: String,
    pub expiry: String,
    pub cvv: String,
}

impl std::fmt::Debug for CardCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardCredential")
            .field("last4", &self.last4())
            .field("holder_name", &self.holder_name)
            .finish_non_exhaustive()
    }
}

impl CardCredential {
    fn normalized_number(&self) -> String {
        self.number.chars().filter(|c| !c.is_whitespace()).collect()
    }

    pub fn last4(&self) -> Option<String> {
        let digits = self.normalized_number();
        let count = digits.chars().count();
        (count >= 4).then(|| digits.chars().skip(count - 4).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutForm {
    pub billing: Billing,
    pub payment_method: PaymentMethod,
    pub card: CardCredential,
}

impl Default for CheckoutForm {
    fn default() -> Self {
        Self {
            billing: Billing::default(),
            payment_method: PaymentMethod::Card,
            card: CardCredential::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutReport {
    pub fields: BTreeMap<Field, FieldDefect>,
    pub card: Option<CardDefect>,
}

impl CheckoutReport {
    pub fn is_valid(&self) -> bool {
        self.fields.is_empty() && self.card.is_none()
    }

    pub fn field(&self, field: Field) -> Option<FieldDefect> {
        self.fields.get(&field).copied()
    }
}

/// Which checks apply to billing fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingRules {
    /// Every field required, plus email, phone and postal code formats.
    Checkout,
    /// Every field required, plus email format.
    Admin,
}

pub fn billing_defects(billing: &Billing, rules: BillingRules) -> BTreeMap<Field, FieldDefect> {
    let values = [
        (Field::Name, &billing.name),
        (Field::Email, &billing.email),
        (Field::Phone, &billing.phone),
        (Field::Address, &billing.address),
        (Field::City, &billing.city),
        (Field::PostalCode, &billing.postal_code),
        (Field::Country, &billing.country),
    ];

    let mut defects = BTreeMap::new();
    for (field, value) in values {
        let value = value.trim();
        let defect = if value.is_empty() {
            Some(FieldDefect::Required)
        } else {
            match (field, rules) {
                (Field::Email, _) if !is_email(value) => Some(FieldDefect::InvalidEmail),
                (Field::Phone, BillingRules::Checkout) if !PHONE.is_match(value) => {
                    Some(FieldDefect::InvalidPhone)
                }
                (Field::PostalCode, BillingRules::Checkout) if !POSTAL_CODE.is_match(value) => {
                    Some(FieldDefect::InvalidPostalCode)
                }
                _ => None,
            }
        };
        if let Some(defect) = defect {
            defects.insert(field, defect);
        }
    }
    defects
}

pub(crate) fn is_email(value: &str) -> bool {
    let local_len = value.split('@').next().map_or(0, str::len);
    value.len() <= MAX_EMAIL_LEN && local_len <= MAX_EMAIL_LOCAL_LEN && EMAIL.is_match(value)
}

pub fn card_defect(card: &CardCredential) -> Option<CardDefect> {
    let number = card.normalized_number();
    let holder = card.holder_name.trim();
    let expiry = card.expiry.trim();
    let cvv = card.cvv.trim();

    if number.is_empty() || holder.is_empty() || expiry.is_empty() || cvv.is_empty() {
        return Some(CardDefect::CardIncomplete);
    }
    if !EXPIRY.is_match(expiry) {
        return Some(CardDefect::InvalidExpFormat);
    }
    let allowed = TEST_INSTRUMENTS
        .iter()
        .any(|t| t.number == number && t.expiry == expiry && t.cvv == cvv);
    (!allowed).then_some(CardDefect::InvalidCard)
}

pub fn validate(form: &CheckoutForm) -> CheckoutReport {
    CheckoutReport {
        fields: billing_defects(&form.billing, BillingRules::Checkout),
        card: match form.payment_method {
            PaymentMethod::Card => card_defect(&form.card),
            PaymentMethod::CashOnDelivery | PaymentMethod::PayPal => None,
        },
    }
}

/// A checkout form being edited.
#[derive(Debug, Clone)]
pub struct CheckoutFormState {
    form: CheckoutForm,
    report: CheckoutReport,
    touched: BTreeSet<Field>,
}

impl Default for CheckoutFormState {
    fn default() -> Self {
        Self::new(CheckoutForm::default())
    }
}

impl CheckoutFormState {
    pub fn new(form: CheckoutForm) -> Self {
        let report = validate(&form);
        Self {
            form,
            report,
            touched: BTreeSet::new(),
        }
    }

    pub fn form(&self) -> &CheckoutForm {
        &self.form
    }

    pub fn report(&self) -> &CheckoutReport {
        &self.report
    }

    pub fn is_valid(&self) -> bool {
        self.report.is_valid()
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        let slot = match field {
            Field::Name => &mut self.form.billing.name,
            Field::Email => &mut self.form.billing.email,
            Field::Phone => &mut self.form.billing.phone,
            Field::Address => &mut self.form.billing.address,
            Field::City => &mut self.form.billing.city,
            Field::PostalCode => &mut self.form.billing.postal_code,
            Field::Country => &mut self.form.billing.country,
            Field::CardNumber => &mut self.form.card.number,
            Field::CardHolder => &mut self.form.card.holder_name,
            Field::CardExpiry => &mut self.form.card.expiry,
            Field::CardCvv => &mut self.form.card.cvv,
        };
        *slot = value;
        self.touched.insert(field);
        self.report = validate(&self.form);
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.form.payment_method = method;
        self.report = validate(&self.form);
    }

    pub fn touch(&mut self, field: Field) {
        self.touched.insert(field);
    }

    pub fn is_touched(&self, field: Field) -> bool {
        self.touched.contains(&field)
    }

    pub fn mark_all_touched(&mut self) {
        self.touched.extend(Field::BILLING);
        self.touched.extend(Field::CARD);
    }

    /// Field defects the user should currently see.
    pub fn visible_defects(&self) -> Vec<(Field, FieldDefect)> {
        self.report
            .fields
            .iter()
            .filter(|(f, _)| self.touched.contains(f))
            .map(|(f, d)| (*f, *d))
            .collect()
    }

    /// The card defect, once any card field has been visited.
    pub fn visible_card_defect(&self) -> Option<CardDefect> {
        let visited = Field::CARD.iter().any(|f| self.touched.contains(f));
        self.report.card.filter(|_| visited)
    }

    /// Returns the form when it is valid. Otherwise every field is marked as
    /// touched so that all defects surface together.
    pub fn attempt_submit(&mut self) -> Result<&CheckoutForm, CheckoutReport> {
        if self.report.is_valid() {
            return Ok(&self.form);
        }
        self.mark_all_touched();
        Err(self.report.clone())
    }
}
