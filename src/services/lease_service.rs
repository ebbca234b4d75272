use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::lease::{
    CreateLease, CutOffSnapshot, Lease, LeaseChain, LeasePatch, LeaseStatus, LeaseTerms, RentTerms,
};

/// Upper-bound on a single bulk create request.
const MAX_BULK_CREATE: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum LeaseError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Database(sqlx::Error),
    #[error(transparent)]
    Manager(#[from] DatabaseError),
}

impl From<sqlx::Error> for LeaseError {
    fn from(err: sqlx::Error) -> Self {
        // Surface partial-unique-index violations as conflicts; an agreement
        // code may repeat across historical versions but not among current ones.
        if let Some(db_err) = err.as_database_error() {
            if db_err.code().as_deref() == Some("23505") {
                return LeaseError::Conflict(format!(
                    "Duplicate entry detected: {}",
                    db_err.message()
                ));
            }
        }
        LeaseError::Database(err)
    }
}

/// Outcome of a delete, reporting the compensating reactivation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub deleted: Lease,
    pub reactivated_previous_version: bool,
}

/// Lease versioning engine: creates, supersedes and reactivates lease version
/// chains, and derives the cut-off financial snapshot.
pub struct LeaseService {
    pool: PgPool,
}

impl LeaseService {
    pub async fn new() -> Result<Self, LeaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Bulk create. Every payload starts a fresh chain: version 1, status
    /// active, `original_lease_id` backfilled to the generated id afterwards.
    ///
    /// The insert and the backfill are two separate statements, not one
    /// transaction; a crash in between leaves rows with a NULL chain root.
    /// Readers tolerate this by falling back to the row id as the chain key.
    pub async fn create_bulk(
        &self,
        payload: Value,
        created_by: Option<Uuid>,
    ) -> Result<Vec<Lease>, LeaseError> {
        let items = match payload {
            Value::Array(items) if !items.is_empty() => items,
            Value::Array(_) => {
                return Err(LeaseError::InvalidInput(
                    "Invalid lease data provided".to_string(),
                ))
            }
            _ => {
                return Err(LeaseError::InvalidInput(
                    "Invalid lease data provided".to_string(),
                ))
            }
        };
        if items.len() > MAX_BULK_CREATE {
            return Err(LeaseError::InvalidInput(format!(
                "Bulk create limited to {} leases per request",
                MAX_BULK_CREATE
            )));
        }

        let payloads: Vec<CreateLease> = serde_json::from_value(Value::Array(items))
            .map_err(|e| LeaseError::InvalidInput(format!("Invalid lease data provided: {}", e)))?;

        let mut created = Vec::with_capacity(payloads.len());
        for mut item in payloads {
            item.terms.cut_off_snapshot = compute_cut_off_snapshot(&item.terms);

            let lease = sqlx::query_as::<_, Lease>(
                r#"
                INSERT INTO leases (version_number, status, agreement_code, lessor_name, created_by, terms)
                VALUES (1, $1, $2, $3, $4, $5)
                RETURNING *
                "#,
            )
            .bind(LeaseStatus::Active)
            .bind(&item.agreement_code)
            .bind(&item.lessor_name)
            .bind(created_by)
            .bind(sqlx::types::Json(&item.terms))
            .fetch_one(&self.pool)
            .await?;

            created.push(lease);
        }

        // Follow-up backfill: each new chain is rooted at its own first version
        let ids: Vec<Uuid> = created.iter().map(|l| l.id).collect();
        sqlx::query("UPDATE leases SET original_lease_id = id, updated_at = now() WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&self.pool)
            .await?;

        for lease in &mut created {
            lease.original_lease_id = Some(lease.id);
        }

        Ok(created)
    }

    /// The core state transition: supersede an existing version and create its
    /// successor. Both writes happen in one transaction so no reader ever sees
    /// two active versions of a chain or an orphaned modified row.
    pub async fn modify(&self, id: Uuid, payload: Value) -> Result<Lease, LeaseError> {
        if !payload.is_object() {
            return Err(LeaseError::InvalidInput(
                "Modification payload must be an object".to_string(),
            ));
        }
        let patch: LeasePatch = serde_json::from_value(payload)
            .map_err(|e| LeaseError::InvalidInput(format!("Invalid modification payload: {}", e)))?;

        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Lease>("SELECT * FROM leases WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| LeaseError::NotFound("Lease not found".to_string()))?;

        sqlx::query("UPDATE leases SET status = $1, updated_at = now() WHERE id = $2")
            .bind(LeaseStatus::Modified)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let next = build_next_version(&existing, &patch);
        let new_version = sqlx::query_as::<_, Lease>(
            r#"
            INSERT INTO leases
                (original_lease_id, previous_version_id, version_number, status,
                 agreement_code, lessor_name, created_by, terms)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(next.original_lease_id)
        .bind(next.previous_version_id)
        .bind(next.version_number)
        .bind(LeaseStatus::Active)
        .bind(&next.agreement_code)
        .bind(&next.lessor_name)
        .bind(existing.created_by)
        .bind(sqlx::types::Json(&next.terms))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(new_version)
    }

    /// Direct field patch without versioning. Reopening a closed lease
    /// (status close -> active) clears the closure metadata regardless of the
    /// patch contents.
    pub async fn update(&self, id: Uuid, payload: Value) -> Result<Lease, LeaseError> {
        if !payload.is_object() {
            return Err(LeaseError::InvalidInput(
                "Update payload must be an object".to_string(),
            ));
        }
        let patch: LeasePatch = serde_json::from_value(payload)
            .map_err(|e| LeaseError::InvalidInput(format!("Invalid update payload: {}", e)))?;

        let existing = self.find_by_id(id).await?;

        let mut terms = existing.terms.0.clone();
        patch.terms.apply(&mut terms);
        terms.cut_off_snapshot = compute_cut_off_snapshot(&terms);

        let (status, closure_date, remarks) = resolve_closure_fields(&existing, &patch);

        let updated = sqlx::query_as::<_, Lease>(
            r#"
            UPDATE leases
            SET agreement_code = $2, lessor_name = $3, status = $4, terms = $5,
                lease_closure_date = $6, remarks = $7, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.agreement_code.as_deref().unwrap_or(&existing.agreement_code))
        .bind(patch.lessor_name.as_deref().unwrap_or(&existing.lessor_name))
        .bind(status)
        .bind(sqlx::types::Json(&terms))
        .bind(closure_date)
        .bind(remarks)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Delete a version. Removing the current version of a chain reactivates
    /// its predecessor, restoring the prior version as current.
    ///
    /// Runs in one transaction with the delete ordered first: the partial
    /// unique index over current versions rejects the reactivated predecessor
    /// while the row being deleted still holds the same agreement code.
    pub async fn delete(&self, id: Uuid) -> Result<DeleteOutcome, LeaseError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Lease>("SELECT * FROM leases WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| LeaseError::NotFound("Lease not found".to_string()))?;

        sqlx::query("DELETE FROM leases WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let mut reactivated = false;
        if let Some(prev_id) = reactivation_target(&existing) {
            let result = sqlx::query("UPDATE leases SET status = $1, updated_at = now() WHERE id = $2")
                .bind(LeaseStatus::Active)
                .bind(prev_id)
                .execute(&mut *tx)
                .await?;
            reactivated = result.rows_affected() > 0;
        }

        tx.commit().await?;

        Ok(DeleteOutcome {
            deleted: existing,
            reactivated_previous_version: reactivated,
        })
    }

    /// Grouped read: all of an owner's leases, one record per version chain.
    pub async fn list_grouped(&self, owner: Uuid) -> Result<Vec<LeaseChain>, LeaseError> {
        let leases = sqlx::query_as::<_, Lease>(
            "SELECT * FROM leases WHERE created_by = $1 ORDER BY created_at, version_number",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_chains(leases))
    }

    /// Grouped read filtered to chains whose first version had already started
    /// working before the given window end.
    pub async fn list_movement(
        &self,
        owner: Uuid,
        window_end: NaiveDate,
    ) -> Result<Vec<LeaseChain>, LeaseError> {
        let chains = self.list_grouped(owner).await?;
        Ok(chains
            .into_iter()
            .filter(|chain| chain_started_before(chain, window_end))
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Lease, LeaseError> {
        sqlx::query_as::<_, Lease>("SELECT * FROM leases WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| LeaseError::NotFound("Lease not found".to_string()))
    }
}

/// Fields of the successor version created by a modification.
struct NextVersion {
    original_lease_id: Uuid,
    previous_version_id: Uuid,
    version_number: i32,
    agreement_code: String,
    lessor_name: String,
    terms: LeaseTerms,
}

/// Successor = existing fields overridden by the patch, with lineage fields
/// rewritten: chain root carried forward (or seeded from the existing id on
/// the first modification), predecessor pointer set, version incremented.
fn build_next_version(existing: &Lease, patch: &LeasePatch) -> NextVersion {
    let mut terms = existing.terms.0.clone();
    patch.terms.apply(&mut terms);
    terms.cut_off_snapshot = compute_cut_off_snapshot(&terms);

    NextVersion {
        original_lease_id: existing.original_lease_id.unwrap_or(existing.id),
        previous_version_id: existing.id,
        version_number: existing.version_number + 1,
        agreement_code: patch
            .agreement_code
            .clone()
            .unwrap_or_else(|| existing.agreement_code.clone()),
        lessor_name: patch
            .lessor_name
            .clone()
            .unwrap_or_else(|| existing.lessor_name.clone()),
        terms,
    }
}

/// Which version a delete restores to current, if any: always the deleted
/// row's direct predecessor, regardless of the deleted row's own status.
fn reactivation_target(deleted: &Lease) -> Option<Uuid> {
    deleted.previous_version_id
}

/// Status and closure metadata after a field patch. Reopening (close ->
/// active) unsets `lease_closure_date` and `remarks` even when the patch
/// carries values for them.
fn resolve_closure_fields(
    existing: &Lease,
    patch: &LeasePatch,
) -> (LeaseStatus, Option<NaiveDate>, Option<String>) {
    let status = patch.status.unwrap_or(existing.status);

    if existing.status == LeaseStatus::Close && status == LeaseStatus::Active {
        return (status, None, None);
    }

    (
        status,
        patch.lease_closure_date.or(existing.lease_closure_date),
        patch.remarks.clone().or_else(|| existing.remarks.clone()),
    )
}

/// Derive the financial snapshot at the cut-off date, or None when no cut-off
/// date is set. Systematic rent: count rent periods begun since the working
/// period start and compound every escalation effective on or before the
/// cut-off. Adhoc rent: sum the installments whose range has started.
pub fn compute_cut_off_snapshot(terms: &LeaseTerms) -> Option<CutOffSnapshot> {
    let cut_off = terms.cut_off_date?;

    let snapshot = match &terms.rent {
        RentTerms::Systematic(rent) => {
            let start = terms.lease_working_period.start;
            let periods_elapsed = if cut_off < start {
                0
            } else {
                (months_between(start, cut_off) / rent.rent_payment_frequency.months() as i32)
                    as u32
                    + 1
            };

            let mut rent_at_cut_off = rent.rent_amount;
            let mut escalations_applied = 0u32;
            for escalation in &rent.escalations {
                if escalation.effective_from <= cut_off {
                    rent_at_cut_off *= Decimal::ONE + escalation.percentage / Decimal::from(100);
                    escalations_applied += 1;
                }
            }

            CutOffSnapshot {
                rent_at_cut_off,
                escalations_applied,
                periods_elapsed,
            }
        }
        RentTerms::Adhoc(rent) => {
            let started: Vec<_> = rent
                .installments
                .iter()
                .filter(|i| i.date_range.start <= cut_off)
                .collect();

            CutOffSnapshot {
                rent_at_cut_off: started.iter().map(|i| i.amount).sum(),
                escalations_applied: 0,
                periods_elapsed: started.len() as u32,
            }
        }
    };

    Some(snapshot)
}

/// Whole calendar months from `start` to `end` (end >= start).
fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let mut months =
        (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32);
    if end.day() < start.day() {
        months -= 1;
    }
    months
}

/// Group leases by chain root. Within each group the active/close member is
/// the representative; a chain with no current member (all superseded) gets
/// its highest-numbered version synthesized as representative.
pub fn group_chains(leases: Vec<Lease>) -> Vec<LeaseChain> {
    let mut order: Vec<Uuid> = Vec::new();
    let mut groups: HashMap<Uuid, Vec<Lease>> = HashMap::new();

    for lease in leases {
        let key = lease.chain_key();
        if !groups.contains_key(&key) {
            order.push(key);
        }
        groups.entry(key).or_default().push(lease);
    }

    let mut chains = Vec::with_capacity(order.len());
    for key in order {
        let Some(mut members) = groups.remove(&key) else {
            continue;
        };

        let rep_idx = members
            .iter()
            .position(|l| l.status.is_current())
            .unwrap_or_else(|| {
                members
                    .iter()
                    .enumerate()
                    .max_by_key(|(_, l)| l.version_number)
                    .map(|(i, _)| i)
                    .unwrap_or(0)
            });

        let active_lease = members.remove(rep_idx);
        members.sort_by_key(|l| std::cmp::Reverse(l.version_number));

        chains.push(LeaseChain {
            active_lease,
            previous_versions: members,
        });
    }

    chains
}

/// Movement-window predicate: the chain's version 1 began its working period
/// before the window end. When deletes have removed version 1, the lowest
/// surviving version deliberately stands in as the chain's start of record.
/// Independent of the chain's current status.
pub fn chain_started_before(chain: &LeaseChain, window_end: NaiveDate) -> bool {
    let first = chain
        .previous_versions
        .iter()
        .chain(std::iter::once(&chain.active_lease))
        .min_by_key(|l| l.version_number);

    match first {
        Some(lease) => lease.terms.0.lease_working_period.start < window_end,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::lease::{
        sample_terms, AdhocInstallment, AdhocRent, DateRange, PaymentFrequency,
        SystematicEscalation, SystematicRent,
    };
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn lease(
        id: Uuid,
        original: Option<Uuid>,
        previous: Option<Uuid>,
        version: i32,
        status: LeaseStatus,
    ) -> Lease {
        Lease {
            id,
            original_lease_id: original,
            previous_version_id: previous,
            version_number: version,
            status,
            agreement_code: "AGR-001".to_string(),
            lessor_name: "Acme Estates".to_string(),
            created_by: None,
            terms: sqlx::types::Json(sample_terms()),
            lease_closure_date: None,
            remarks: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn next_version_links_lineage_and_increments() {
        let root = Uuid::new_v4();
        let existing = lease(root, Some(root), None, 1, LeaseStatus::Active);
        let patch = LeasePatch::default();

        let next = build_next_version(&existing, &patch);

        assert_eq!(next.original_lease_id, root);
        assert_eq!(next.previous_version_id, root);
        assert_eq!(next.version_number, 2);
        assert_eq!(next.agreement_code, "AGR-001");
    }

    #[test]
    fn next_version_seeds_chain_root_on_first_modification() {
        // Backfill not yet applied: original_lease_id still NULL
        let id = Uuid::new_v4();
        let existing = lease(id, None, None, 1, LeaseStatus::Active);

        let next = build_next_version(&existing, &LeasePatch::default());

        assert_eq!(next.original_lease_id, id);
    }

    #[test]
    fn next_version_applies_patch_overrides() {
        let id = Uuid::new_v4();
        let existing = lease(id, Some(id), None, 3, LeaseStatus::Active);
        let patch: LeasePatch = serde_json::from_value(serde_json::json!({
            "lessorName": "New Lessor Ltd",
            "natureOfLease": "retail"
        }))
        .unwrap();

        let next = build_next_version(&existing, &patch);

        assert_eq!(next.version_number, 4);
        assert_eq!(next.lessor_name, "New Lessor Ltd");
        assert_eq!(next.terms.nature_of_lease, "retail");
        // Unspecified fields carry forward
        assert_eq!(next.agreement_code, "AGR-001");
    }

    #[test]
    fn delete_reactivates_the_direct_predecessor() {
        let root = Uuid::new_v4();
        let v2 = lease(Uuid::new_v4(), Some(root), Some(root), 2, LeaseStatus::Active);

        assert_eq!(reactivation_target(&v2), Some(root));

        // First version of a chain: nothing to restore
        let v1 = lease(root, Some(root), None, 1, LeaseStatus::Active);
        assert_eq!(reactivation_target(&v1), None);

        // The deleted row's own status does not matter
        let superseded = lease(Uuid::new_v4(), Some(root), Some(root), 2, LeaseStatus::Modified);
        assert_eq!(reactivation_target(&superseded), Some(root));
    }

    #[test]
    fn reopening_clears_closure_metadata() {
        let id = Uuid::new_v4();
        let mut existing = lease(id, Some(id), None, 1, LeaseStatus::Close);
        existing.lease_closure_date = Some(date(2025, 1, 31));
        existing.remarks = Some("early exit".to_string());

        // Patch tries to smuggle closure fields back in
        let patch: LeasePatch = serde_json::from_value(serde_json::json!({
            "status": "active",
            "leaseClosureDate": "2025-02-28",
            "remarks": "should be dropped"
        }))
        .unwrap();

        let (status, closure_date, remarks) = resolve_closure_fields(&existing, &patch);

        assert_eq!(status, LeaseStatus::Active);
        assert_eq!(closure_date, None);
        assert_eq!(remarks, None);
    }

    #[test]
    fn closing_keeps_closure_metadata() {
        let id = Uuid::new_v4();
        let existing = lease(id, Some(id), None, 1, LeaseStatus::Active);
        let patch: LeasePatch = serde_json::from_value(serde_json::json!({
            "status": "close",
            "leaseClosureDate": "2025-06-30",
            "remarks": "tenant vacated"
        }))
        .unwrap();

        let (status, closure_date, remarks) = resolve_closure_fields(&existing, &patch);

        assert_eq!(status, LeaseStatus::Close);
        assert_eq!(closure_date, Some(date(2025, 6, 30)));
        assert_eq!(remarks.as_deref(), Some("tenant vacated"));
    }

    #[test]
    fn grouping_picks_current_member_as_representative() {
        let root = Uuid::new_v4();
        let v2_id = Uuid::new_v4();
        let v1 = lease(root, Some(root), None, 1, LeaseStatus::Modified);
        let v2 = lease(v2_id, Some(root), Some(root), 2, LeaseStatus::Active);

        let chains = group_chains(vec![v1, v2]);

        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].active_lease.id, v2_id);
        assert_eq!(chains[0].previous_versions.len(), 1);
        assert_eq!(chains[0].previous_versions[0].id, root);
    }

    #[test]
    fn grouping_synthesizes_representative_for_depleted_chain() {
        // No active/close member: highest version number stands in
        let root = Uuid::new_v4();
        let v3_id = Uuid::new_v4();
        let v1 = lease(root, Some(root), None, 1, LeaseStatus::Modified);
        let v3 = lease(v3_id, Some(root), None, 3, LeaseStatus::Modified);
        let v2 = lease(Uuid::new_v4(), Some(root), Some(root), 2, LeaseStatus::Modified);

        let chains = group_chains(vec![v1, v3, v2]);

        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].active_lease.id, v3_id);
        assert_eq!(chains[0].previous_versions.len(), 2);
        // Previous versions in descending version order
        assert_eq!(chains[0].previous_versions[0].version_number, 2);
    }

    #[test]
    fn grouping_falls_back_to_row_id_before_backfill() {
        let a = lease(Uuid::new_v4(), None, None, 1, LeaseStatus::Active);
        let b = lease(Uuid::new_v4(), None, None, 1, LeaseStatus::Active);

        let chains = group_chains(vec![a, b]);

        assert_eq!(chains.len(), 2);
    }

    #[test]
    fn at_most_one_current_member_per_grouped_chain() {
        let root = Uuid::new_v4();
        let v1 = lease(root, Some(root), None, 1, LeaseStatus::Modified);
        let v2 = lease(Uuid::new_v4(), Some(root), Some(root), 2, LeaseStatus::Active);

        let chains = group_chains(vec![v1, v2]);

        for chain in &chains {
            let current = chain
                .previous_versions
                .iter()
                .filter(|l| l.status.is_current())
                .count();
            assert_eq!(current, 0);
            assert!(chain.active_lease.status.is_current());
        }
    }

    #[test]
    fn movement_window_uses_first_version_start() {
        let root = Uuid::new_v4();
        let mut v1 = lease(root, Some(root), None, 1, LeaseStatus::Modified);
        v1.terms.0.lease_working_period = DateRange {
            start: date(2024, 4, 1),
            end: date(2029, 3, 31),
        };
        let mut v2 = lease(Uuid::new_v4(), Some(root), Some(root), 2, LeaseStatus::Active);
        // Later version moved the working period; the filter must ignore it
        v2.terms.0.lease_working_period = DateRange {
            start: date(2026, 4, 1),
            end: date(2029, 3, 31),
        };

        let chains = group_chains(vec![v1, v2]);

        assert!(chain_started_before(&chains[0], date(2025, 1, 1)));
        assert!(!chain_started_before(&chains[0], date(2024, 4, 1)));
    }

    #[test]
    fn snapshot_absent_without_cut_off_date() {
        let terms = sample_terms();
        assert!(compute_cut_off_snapshot(&terms).is_none());
    }

    #[test]
    fn snapshot_compounds_systematic_escalations() {
        let mut terms = sample_terms();
        terms.lease_working_period = DateRange {
            start: date(2024, 1, 1),
            end: date(2029, 12, 31),
        };
        terms.rent = RentTerms::Systematic(SystematicRent {
            rent_amount: Decimal::from(1000),
            rent_payment_frequency: PaymentFrequency::Monthly,
            rent_payment_day: 1,
            escalations: vec![
                SystematicEscalation {
                    effective_from: date(2025, 1, 1),
                    frequency: PaymentFrequency::Yearly,
                    percentage: Decimal::from(10),
                },
                SystematicEscalation {
                    effective_from: date(2026, 1, 1),
                    frequency: PaymentFrequency::Yearly,
                    percentage: Decimal::from(10),
                },
            ],
        });
        terms.cut_off_date = Some(date(2025, 6, 30));

        let snapshot = compute_cut_off_snapshot(&terms).unwrap();

        // Only the 2025 escalation applies: 1000 * 1.10
        assert_eq!(snapshot.escalations_applied, 1);
        assert_eq!(snapshot.rent_at_cut_off, Decimal::from(1100));
        // Jan 2024 through Jun 2025: months 0..=17 -> 18 monthly periods begun
        assert_eq!(snapshot.periods_elapsed, 18);
    }

    #[test]
    fn snapshot_before_working_period_has_no_periods() {
        let mut terms = sample_terms();
        terms.lease_working_period = DateRange {
            start: date(2025, 1, 1),
            end: date(2029, 12, 31),
        };
        terms.cut_off_date = Some(date(2024, 6, 1));

        let snapshot = compute_cut_off_snapshot(&terms).unwrap();
        assert_eq!(snapshot.periods_elapsed, 0);
    }

    #[test]
    fn snapshot_sums_started_adhoc_installments() {
        let mut terms = sample_terms();
        terms.rent = RentTerms::Adhoc(AdhocRent {
            rent_payment_day: 1,
            installments: vec![
                AdhocInstallment {
                    date_range: DateRange {
                        start: date(2024, 1, 1),
                        end: date(2024, 6, 30),
                    },
                    amount: Decimal::from(5000),
                },
                AdhocInstallment {
                    date_range: DateRange {
                        start: date(2024, 7, 1),
                        end: date(2024, 12, 31),
                    },
                    amount: Decimal::from(7000),
                },
                AdhocInstallment {
                    date_range: DateRange {
                        start: date(2025, 1, 1),
                        end: date(2025, 6, 30),
                    },
                    amount: Decimal::from(9000),
                },
            ],
        });
        terms.cut_off_date = Some(date(2024, 8, 15));

        let snapshot = compute_cut_off_snapshot(&terms).unwrap();

        assert_eq!(snapshot.rent_at_cut_off, Decimal::from(12000));
        assert_eq!(snapshot.periods_elapsed, 2);
        assert_eq!(snapshot.escalations_applied, 0);
    }

    #[test]
    fn months_between_handles_partial_months() {
        assert_eq!(months_between(date(2024, 1, 15), date(2024, 3, 14)), 1);
        assert_eq!(months_between(date(2024, 1, 15), date(2024, 3, 15)), 2);
        assert_eq!(months_between(date(2024, 1, 1), date(2024, 1, 20)), 0);
    }
}
