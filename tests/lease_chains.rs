//! Chain-level behavior of the lease versioning engine, exercised through the
//! public API with in-memory data.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use leasehold_api::database::models::lease::{
    DateRange, Lease, LeaseStatus, LeaseTerms, PaymentFrequency, RentTerms, SystematicEscalation,
    SystematicRent,
};
use leasehold_api::services::lease_service::{chain_started_before, compute_cut_off_snapshot, group_chains};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn terms(working_start: NaiveDate) -> LeaseTerms {
    LeaseTerms {
        nature_of_lease: "office".to_string(),
        lease_period: DateRange {
            start: working_start,
            end: date(2030, 12, 31),
        },
        locking_period: DateRange {
            start: working_start,
            end: date(2026, 12, 31),
        },
        lease_working_period: DateRange {
            start: working_start,
            end: date(2030, 12, 31),
        },
        rent: RentTerms::Systematic(SystematicRent {
            rent_amount: Decimal::from(5000),
            rent_payment_frequency: PaymentFrequency::Monthly,
            rent_payment_day: 1,
            escalations: vec![],
        }),
        security_deposit: None,
        discounting_rates: vec![],
        rent_free_periods: vec![],
        cut_off_date: None,
        cut_off_snapshot: None,
    }
}

fn version(
    id: Uuid,
    chain_root: Uuid,
    previous: Option<Uuid>,
    number: i32,
    status: LeaseStatus,
    working_start: NaiveDate,
) -> Lease {
    Lease {
        id,
        original_lease_id: Some(chain_root),
        previous_version_id: previous,
        version_number: number,
        status,
        agreement_code: format!("AGR-{}", chain_root.simple()),
        lessor_name: "Acme Estates".to_string(),
        created_by: None,
        terms: sqlx::types::Json(terms(working_start)),
        lease_closure_date: None,
        remarks: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn mixed_ownership_of_chains_groups_cleanly() {
    let root_a = Uuid::new_v4();
    let root_b = Uuid::new_v4();
    let a2 = Uuid::new_v4();

    let leases = vec![
        version(root_a, root_a, None, 1, LeaseStatus::Modified, date(2023, 1, 1)),
        version(a2, root_a, Some(root_a), 2, LeaseStatus::Close, date(2023, 1, 1)),
        version(root_b, root_b, None, 1, LeaseStatus::Active, date(2025, 6, 1)),
    ];

    let chains = group_chains(leases);
    assert_eq!(chains.len(), 2);

    // Chain A: closed v2 is still the current representative
    let chain_a = chains
        .iter()
        .find(|c| c.active_lease.chain_key() == root_a)
        .unwrap();
    assert_eq!(chain_a.active_lease.id, a2);
    assert_eq!(chain_a.active_lease.status, LeaseStatus::Close);
    assert_eq!(chain_a.previous_versions.len(), 1);

    // Invariant: at most one current member per chain
    for chain in &chains {
        assert!(chain
            .previous_versions
            .iter()
            .all(|l| !l.status.is_current()));
    }
}

#[test]
fn movement_window_selects_chains_by_first_version_start() -> anyhow::Result<()> {
    let root_a = Uuid::new_v4();
    let root_b = Uuid::new_v4();

    let chains = group_chains(vec![
        version(root_a, root_a, None, 1, LeaseStatus::Active, date(2023, 1, 1)),
        version(root_b, root_b, None, 1, LeaseStatus::Active, date(2026, 1, 1)),
    ]);

    let window_end = date(2024, 6, 30);
    let started: Vec<_> = chains
        .iter()
        .filter(|c| chain_started_before(c, window_end))
        .collect();

    assert_eq!(started.len(), 1);
    assert_eq!(started[0].active_lease.chain_key(), root_a);
    Ok(())
}

#[test]
fn deleting_the_current_version_leaves_the_predecessor_active() {
    // v1 was superseded by v2; both carry the same agreement code and lessor,
    // as modification does by default.
    let root = Uuid::new_v4();
    let v2_id = Uuid::new_v4();
    let v1 = version(root, root, None, 1, LeaseStatus::Modified, date(2023, 1, 1));
    let v2 = version(v2_id, root, Some(root), 2, LeaseStatus::Active, date(2023, 1, 1));
    assert_eq!(v1.agreement_code, v2.agreement_code);

    // Deleting v2 removes the row, then restores its direct predecessor.
    let mut survivors = vec![v1, v2];
    let deleted = survivors.remove(1);
    if let Some(prev_id) = deleted.previous_version_id {
        for lease in &mut survivors {
            if lease.id == prev_id {
                lease.status = LeaseStatus::Active;
            }
        }
    }

    let chains = group_chains(survivors);
    assert_eq!(chains.len(), 1);
    assert_eq!(chains[0].active_lease.id, root);
    assert_eq!(chains[0].active_lease.status, LeaseStatus::Active);
    assert!(chains[0].previous_versions.is_empty());
}

#[test]
fn cut_off_snapshot_respects_escalation_effective_dates() {
    let mut t = terms(date(2024, 1, 1));
    if let RentTerms::Systematic(rent) = &mut t.rent {
        rent.escalations = vec![SystematicEscalation {
            effective_from: date(2026, 1, 1),
            frequency: PaymentFrequency::Yearly,
            percentage: Decimal::from(8),
        }];
    }
    t.cut_off_date = Some(date(2025, 12, 31));

    let snapshot = compute_cut_off_snapshot(&t).unwrap();

    // The escalation has not yet taken effect at the cut-off
    assert_eq!(snapshot.escalations_applied, 0);
    assert_eq!(snapshot.rent_at_cut_off, Decimal::from(5000));
}
