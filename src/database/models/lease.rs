use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle state of one lease version. Within a chain, at most one member is
/// `active` or `close` (the current version); all superseded ancestors are
/// `modified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaseStatus {
    Active,
    Close,
    Modified,
}

impl LeaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaseStatus::Active => "active",
            LeaseStatus::Close => "close",
            LeaseStatus::Modified => "modified",
        }
    }

    /// Whether this version is the current representative of its chain.
    pub fn is_current(&self) -> bool {
        matches!(self, LeaseStatus::Active | LeaseStatus::Close)
    }
}

impl FromStr for LeaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(LeaseStatus::Active),
            "close" => Ok(LeaseStatus::Close),
            "modified" => Ok(LeaseStatus::Modified),
            other => Err(format!("unknown lease status: {}", other)),
        }
    }
}

impl std::fmt::Display for LeaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Stored as TEXT; map through the string representation.
impl sqlx::Type<sqlx::Postgres> for LeaseStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <&str as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <&str as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl sqlx::Encode<'_, sqlx::Postgres> for LeaseStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as sqlx::Encode<'_, sqlx::Postgres>>::encode(self.as_str(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for LeaseStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
        s.parse::<LeaseStatus>().map_err(Into::into)
    }
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// How often rent falls due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    Monthly,
    Quarterly,
    HalfYearly,
    Yearly,
}

impl PaymentFrequency {
    pub fn months(&self) -> u32 {
        match self {
            PaymentFrequency::Monthly => 1,
            PaymentFrequency::Quarterly => 3,
            PaymentFrequency::HalfYearly => 6,
            PaymentFrequency::Yearly => 12,
        }
    }
}

/// Percentage escalation applied to systematic rent from a given date onward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystematicEscalation {
    pub effective_from: NaiveDate,
    pub frequency: PaymentFrequency,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystematicRent {
    pub rent_amount: Decimal,
    pub rent_payment_frequency: PaymentFrequency,
    pub rent_payment_day: u8,
    #[serde(default)]
    pub escalations: Vec<SystematicEscalation>,
}

/// One absolute-amount installment of an adhoc rent schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdhocInstallment {
    pub date_range: DateRange,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdhocRent {
    pub rent_payment_day: u8,
    pub installments: Vec<AdhocInstallment>,
}

/// Rent payload shape, tagged by payment type. Systematic rent carries a base
/// amount plus percentage escalations; adhoc rent is a list of absolute
/// installments. Fields required by one shape are simply absent from the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rentPaymentType", rename_all = "camelCase")]
pub enum RentTerms {
    Systematic(SystematicRent),
    Adhoc(AdhocRent),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountingRate {
    pub date_range: DateRange,
    pub rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentFreePeriod {
    pub date_range: DateRange,
    pub percentage: Decimal,
}

/// Derived financial snapshot at the cut-off date. Present exactly when
/// `cut_off_date` is set; always recomputed by the versioning engine, never
/// taken from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutOffSnapshot {
    pub rent_at_cut_off: Decimal,
    pub escalations_applied: u32,
    pub periods_elapsed: u32,
}

/// Financial detail block of a lease version, stored as one JSONB document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseTerms {
    pub nature_of_lease: String,
    pub lease_period: DateRange,
    pub locking_period: DateRange,
    pub lease_working_period: DateRange,
    pub rent: RentTerms,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_deposit: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discounting_rates: Vec<DiscountingRate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rent_free_periods: Vec<RentFreePeriod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut_off_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut_off_snapshot: Option<CutOffSnapshot>,
}

/// One version of a lease agreement. Versions form a chain rooted at
/// `original_lease_id`, linked backwards through `previous_version_id`.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lease {
    pub id: Uuid,
    pub original_lease_id: Option<Uuid>,
    pub previous_version_id: Option<Uuid>,
    pub version_number: i32,
    pub status: LeaseStatus,
    pub agreement_code: String,
    pub lessor_name: String,
    pub created_by: Option<Uuid>,
    pub terms: sqlx::types::Json<LeaseTerms>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lease_closure_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lease {
    /// Root key of this version's chain: `original_lease_id`, falling back to
    /// the row's own id during the brief window before backfill.
    pub fn chain_key(&self) -> Uuid {
        self.original_lease_id.unwrap_or(self.id)
    }
}

/// Payload for one lease in a bulk create request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLease {
    pub agreement_code: String,
    pub lessor_name: String,
    #[serde(flatten)]
    pub terms: LeaseTerms,
}

/// Partial payload for modify and field-patch operations. Absent fields carry
/// forward from the existing version.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeasePatch {
    pub agreement_code: Option<String>,
    pub lessor_name: Option<String>,
    pub status: Option<LeaseStatus>,
    pub lease_closure_date: Option<NaiveDate>,
    pub remarks: Option<String>,
    #[serde(flatten)]
    pub terms: LeaseTermsPatch,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseTermsPatch {
    pub nature_of_lease: Option<String>,
    pub lease_period: Option<DateRange>,
    pub locking_period: Option<DateRange>,
    pub lease_working_period: Option<DateRange>,
    pub rent: Option<RentTerms>,
    pub security_deposit: Option<Decimal>,
    pub discounting_rates: Option<Vec<DiscountingRate>>,
    pub rent_free_periods: Option<Vec<RentFreePeriod>>,
    pub cut_off_date: Option<NaiveDate>,
}

impl LeaseTermsPatch {
    /// Overlay present fields onto existing terms.
    pub fn apply(&self, terms: &mut LeaseTerms) {
        if let Some(v) = &self.nature_of_lease {
            terms.nature_of_lease = v.clone();
        }
        if let Some(v) = self.lease_period {
            terms.lease_period = v;
        }
        if let Some(v) = self.locking_period {
            terms.locking_period = v;
        }
        if let Some(v) = self.lease_working_period {
            terms.lease_working_period = v;
        }
        if let Some(v) = &self.rent {
            terms.rent = v.clone();
        }
        if let Some(v) = self.security_deposit {
            terms.security_deposit = Some(v);
        }
        if let Some(v) = &self.discounting_rates {
            terms.discounting_rates = v.clone();
        }
        if let Some(v) = &self.rent_free_periods {
            terms.rent_free_periods = v.clone();
        }
        if let Some(v) = self.cut_off_date {
            terms.cut_off_date = Some(v);
        }
    }
}

/// One lease chain as returned by the grouped read: the current version plus
/// its superseded ancestors.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseChain {
    pub active_lease: Lease,
    pub previous_versions: Vec<Lease>,
}

/// Representative systematic-rent terms for unit tests.
#[cfg(test)]
pub(crate) fn sample_terms() -> LeaseTerms {
    let range = |sy, sm, sd, ey, em, ed| DateRange {
        start: NaiveDate::from_ymd_opt(sy, sm, sd).unwrap(),
        end: NaiveDate::from_ymd_opt(ey, em, ed).unwrap(),
    };
    LeaseTerms {
        nature_of_lease: "office".to_string(),
        lease_period: range(2024, 4, 1, 2029, 3, 31),
        locking_period: range(2024, 4, 1, 2026, 3, 31),
        lease_working_period: range(2024, 4, 1, 2029, 3, 31),
        rent: RentTerms::Systematic(SystematicRent {
            rent_amount: Decimal::from(2000),
            rent_payment_frequency: PaymentFrequency::Monthly,
            rent_payment_day: 5,
            escalations: vec![],
        }),
        security_deposit: None,
        discounting_rates: vec![],
        rent_free_periods: vec![],
        cut_off_date: None,
        cut_off_snapshot: None,
    }
}
