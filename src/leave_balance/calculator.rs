use crate::leave_balance::period::PeriodFilter;
use crate::model::leave_policy::{Allocation, BalanceMap, LeaveBalanceEntry, LeavePolicy};
use crate::model::leave_request::{LeaveRequest, LeaveType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{AsRefStr, EnumString};
use utoipa::ToSchema;

/// How a stored balance snapshot combines with locally computed balances.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SnapshotMode {
    /// The snapshot wins for the types it contains; tracked types it omits
    /// are computed from requests.
    #[default]
    PerType,
    /// A non-empty snapshot is the whole answer, narrowed to tracked types.
    Exclusive,
}

/// Everything one balance computation looks at. Inputs that have not been
/// loaded yet are passed as empty values, never skipped.
#[derive(Debug, Clone, Copy)]
pub struct BalanceInputs<'a> {
    pub policy: &'a LeavePolicy,
    pub allocation: Option<&'a Allocation>,
    pub requests: &'a [LeaveRequest],
    pub snapshot: Option<&'a BalanceMap>,
    pub period: PeriodFilter,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct BalanceSummary {
    #[schema(example = 28)]
    pub total_allocated: u64,
    #[schema(example = 3)]
    pub total_used: u64,
    /// Sum of the per-type remainders, each already clamped at zero.
    #[schema(example = 25)]
    pub total_remaining: u64,
}

impl BalanceSummary {
    pub fn from_balances(balances: &BalanceMap) -> Self {
        balances
            .values()
            .fold(BalanceSummary::default(), |acc, entry| BalanceSummary {
                total_allocated: acc.total_allocated + u64::from(entry.total),
                total_used: acc.total_used + u64::from(entry.used),
                total_remaining: acc.total_remaining + u64::from(entry.remaining),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BalanceReport {
    #[schema(value_type = Object, example = json!({"kind": "year", "year": 2026}))]
    pub period: PeriodFilter,
    #[schema(value_type = Object, example = json!({
        "annual": {"total": 10, "used": 3, "remaining": 7},
        "sick": {"total": 8, "used": 0, "remaining": 8},
        "casual": {"total": 10, "used": 0, "remaining": 10}
    }))]
    pub balances: BalanceMap,
    pub summary: BalanceSummary,
}

/// Turns policy, allocation, requests and an optional stored snapshot into
/// per-type balances. Pure: no I/O, no state between calls.
#[derive(Debug, Copy, Clone, Default)]
pub struct BalanceCalculator {
    mode: SnapshotMode,
}

impl BalanceCalculator {
    pub fn new(mode: SnapshotMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> SnapshotMode {
        self.mode
    }

    pub fn compute(&self, inputs: &BalanceInputs<'_>) -> BalanceMap {
        let snapshot = inputs.snapshot.filter(|s| !s.is_empty());

        if let (Some(snapshot), SnapshotMode::Exclusive) = (snapshot, self.mode) {
            return snapshot
                .iter()
                .filter(|(leave_type, _)| leave_type.is_tracked())
                .map(|(leave_type, entry)| (*leave_type, *entry))
                .collect();
        }

        let used = used_days(inputs.requests, &inputs.period);

        LeaveType::TRACKED
            .iter()
            .map(|&leave_type| {
                let stored = snapshot.and_then(|s| s.get(&leave_type).copied());
                let entry = stored.unwrap_or_else(|| {
                    LeaveBalanceEntry::new(
                        quota_for(leave_type, inputs.policy, inputs.allocation),
                        used.get(&leave_type).copied().unwrap_or(0),
                    )
                });
                (leave_type, entry)
            })
            .collect()
    }

    pub fn report(&self, inputs: &BalanceInputs<'_>) -> BalanceReport {
        let balances = self.compute(inputs);
        BalanceReport {
            period: inputs.period,
            summary: BalanceSummary::from_balances(&balances),
            balances,
        }
    }
}

/// Allocation beats policy beats the built-in fallback.
pub fn quota_for(leave_type: LeaveType, policy: &LeavePolicy, allocation: Option<&Allocation>) -> u32 {
    allocation
        .and_then(|a| a.get(leave_type))
        .or_else(|| policy.get(leave_type))
        .unwrap_or_else(|| leave_type.fallback_quota())
}

/// Approved, tracked days per type whose start date falls inside `period`.
/// Requests with an unknown type or an unreadable start date are skipped.
pub fn used_days(requests: &[LeaveRequest], period: &PeriodFilter) -> BTreeMap<LeaveType, u32> {
    let mut used = BTreeMap::new();

    for request in requests {
        let Some(leave_type) = request.kind().filter(|t| t.is_tracked()) else {
            continue;
        };
        if !request.is_approved() {
            continue;
        }
        let Some(start) = request.start_date else {
            continue;
        };
        if !period.contains(start) {
            continue;
        }

        let days = used.entry(leave_type).or_insert(0u32);
        *days = days.saturating_add(request.days_counted());
    }

    used
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn request(leave_type: &str, status: &str, start: Option<NaiveDate>, days: Option<i64>) -> LeaveRequest {
        LeaveRequest {
            id: 1,
            employee_id: 42,
            leave_type: leave_type.to_string(),
            start_date: start,
            end_date: start,
            total_days: days,
            status: status.to_string(),
            reason: None,
            review_comments: None,
            created_at: None,
        }
    }

    fn standard_policy() -> LeavePolicy {
        [
            (LeaveType::Annual, 10),
            (LeaveType::Sick, 8),
            (LeaveType::Casual, 10),
        ]
        .into_iter()
        .collect()
    }

    fn this_year() -> PeriodFilter {
        PeriodFilter::Year { year: 2026 }
    }

    fn inputs<'a>(
        policy: &'a LeavePolicy,
        requests: &'a [LeaveRequest],
        snapshot: Option<&'a BalanceMap>,
        period: PeriodFilter,
    ) -> BalanceInputs<'a> {
        BalanceInputs {
            policy,
            allocation: None,
            requests,
            snapshot,
            period,
        }
    }

    #[test]
    fn approved_annual_request_reduces_annual_only() {
        let policy = standard_policy();
        let requests = vec![request("annual", "approved", Some(d(2026, 2, 3)), Some(3))];

        let balances = BalanceCalculator::default().compute(&inputs(&policy, &requests, None, this_year()));

        assert_eq!(balances.len(), 3);
        assert_eq!(balances[&LeaveType::Annual], LeaveBalanceEntry { total: 10, used: 3, remaining: 7 });
        assert_eq!(balances[&LeaveType::Sick], LeaveBalanceEntry { total: 8, used: 0, remaining: 8 });
        assert_eq!(balances[&LeaveType::Casual], LeaveBalanceEntry { total: 10, used: 0, remaining: 10 });
    }

    #[test]
    fn untracked_types_never_appear() {
        let policy: LeavePolicy = [(LeaveType::Maternity, 90), (LeaveType::Annual, 10)]
            .into_iter()
            .collect();
        let requests = vec![request("maternity", "approved", Some(d(2026, 4, 1)), Some(90))];
        let snapshot: BalanceMap = [(LeaveType::Paternity, LeaveBalanceEntry::new(14, 0))]
            .into_iter()
            .collect();

        let balances =
            BalanceCalculator::default().compute(&inputs(&policy, &requests, Some(&snapshot), this_year()));

        assert!(balances.keys().all(|t| t.is_tracked()));
        assert!(balances.values().all(|e| e.used == 0));
    }

    #[test]
    fn overuse_clamps_remaining_at_zero() {
        let policy: LeavePolicy = [(LeaveType::Annual, 5)].into_iter().collect();
        let requests = vec![request("annual", "approved", Some(d(2026, 7, 1)), Some(8))];

        let balances = BalanceCalculator::default().compute(&inputs(&policy, &requests, None, this_year()));

        assert_eq!(balances[&LeaveType::Annual], LeaveBalanceEntry { total: 5, used: 8, remaining: 0 });
    }

    #[test]
    fn missing_policy_entries_use_fallback_quotas() {
        let policy = LeavePolicy::default();
        let balances = BalanceCalculator::default().compute(&inputs(&policy, &[], None, this_year()));

        assert_eq!(balances[&LeaveType::Annual].total, 10);
        assert_eq!(balances[&LeaveType::Sick].total, 8);
        assert_eq!(balances[&LeaveType::Casual].total, 10);
    }

    #[test]
    fn allocation_overrides_policy() {
        let policy = standard_policy();
        let allocation: Allocation = [(LeaveType::Sick, 12)].into_iter().collect();
        let requests = vec![request("sick", "approved", Some(d(2026, 1, 9)), Some(2))];

        let balances = BalanceCalculator::default().compute(&BalanceInputs {
            policy: &policy,
            allocation: Some(&allocation),
            requests: &requests,
            snapshot: None,
            period: this_year(),
        });

        assert_eq!(balances[&LeaveType::Sick], LeaveBalanceEntry { total: 12, used: 2, remaining: 10 });
        assert_eq!(balances[&LeaveType::Annual].total, 10);
    }

    #[test]
    fn only_approved_requests_in_period_count() {
        let policy = standard_policy();
        let requests = vec![
            request("casual", "pending", Some(d(2026, 3, 1)), Some(2)),
            request("casual", "rejected", Some(d(2026, 3, 1)), Some(2)),
            request("casual", "approved", Some(d(2025, 12, 30)), Some(2)),
            request("CASUAL", "Approved", Some(d(2026, 5, 5)), None),
            request("casual", "approved", None, Some(4)),
            request("holiday", "approved", Some(d(2026, 5, 5)), Some(4)),
        ];

        let balances = BalanceCalculator::default().compute(&inputs(&policy, &requests, None, this_year()));

        assert_eq!(balances[&LeaveType::Casual].used, 1);
    }

    #[test]
    fn date_range_governs_over_year() {
        let policy = standard_policy();
        let requests = vec![
            request("casual", "approved", Some(d(2024, 2, 15)), Some(3)),
            request("casual", "approved", Some(d(2024, 4, 1)), Some(2)),
        ];
        let period = PeriodFilter::resolve(Some(2030), Some(d(2024, 3, 1)), None, d(2026, 10, 16));

        let balances = BalanceCalculator::default().compute(&inputs(&policy, &requests, None, period));

        assert_eq!(balances[&LeaveType::Casual].used, 2);
    }

    #[test]
    fn snapshot_values_are_taken_verbatim() {
        let policy = standard_policy();
        let requests = vec![request("annual", "approved", Some(d(2026, 2, 3)), Some(9))];
        let snapshot: BalanceMap = [
            (LeaveType::Annual, LeaveBalanceEntry { total: 12, used: 2, remaining: 10 }),
            (LeaveType::Maternity, LeaveBalanceEntry { total: 90, used: 0, remaining: 90 }),
        ]
        .into_iter()
        .collect();

        for mode in [SnapshotMode::PerType, SnapshotMode::Exclusive] {
            let balances = BalanceCalculator::new(mode)
                .compute(&inputs(&policy, &requests, Some(&snapshot), this_year()));
            assert_eq!(
                balances[&LeaveType::Annual],
                LeaveBalanceEntry { total: 12, used: 2, remaining: 10 }
            );
            assert!(!balances.contains_key(&LeaveType::Maternity));
        }
    }

    #[test]
    fn per_type_mode_fills_types_the_snapshot_omits() {
        let policy = standard_policy();
        let requests = vec![request("sick", "approved", Some(d(2026, 6, 1)), Some(2))];
        let snapshot: BalanceMap = [(LeaveType::Annual, LeaveBalanceEntry::new(12, 2))]
            .into_iter()
            .collect();

        let balances = BalanceCalculator::new(SnapshotMode::PerType)
            .compute(&inputs(&policy, &requests, Some(&snapshot), this_year()));

        assert_eq!(balances.len(), 3);
        assert_eq!(balances[&LeaveType::Sick], LeaveBalanceEntry { total: 8, used: 2, remaining: 6 });
        assert_eq!(balances[&LeaveType::Casual], LeaveBalanceEntry::new(10, 0));
    }

    #[test]
    fn exclusive_mode_does_not_backfill() {
        let policy = standard_policy();
        let snapshot: BalanceMap = [
            (LeaveType::Annual, LeaveBalanceEntry::new(12, 2)),
            (LeaveType::Maternity, LeaveBalanceEntry::new(90, 0)),
        ]
        .into_iter()
        .collect();

        let balances = BalanceCalculator::new(SnapshotMode::Exclusive)
            .compute(&inputs(&policy, &[], Some(&snapshot), this_year()));

        assert_eq!(balances.keys().copied().collect::<Vec<_>>(), vec![LeaveType::Annual]);
    }

    #[test]
    fn empty_snapshot_falls_back_to_computation() {
        let policy = standard_policy();
        let snapshot = BalanceMap::new();

        let balances = BalanceCalculator::new(SnapshotMode::Exclusive)
            .compute(&inputs(&policy, &[], Some(&snapshot), this_year()));

        assert_eq!(balances.len(), 3);
    }

    #[test]
    fn repeated_calls_agree() {
        let policy = standard_policy();
        let requests = vec![
            request("annual", "approved", Some(d(2026, 2, 3)), Some(3)),
            request("sick", "approved", Some(d(2026, 2, 9)), Some(1)),
        ];
        let calculator = BalanceCalculator::default();
        let input = inputs(&policy, &requests, None, this_year());

        assert_eq!(calculator.report(&input), calculator.report(&input));
    }

    #[test]
    fn summary_adds_clamped_remainders() {
        let policy: LeavePolicy = [
            (LeaveType::Annual, 5),
            (LeaveType::Sick, 8),
            (LeaveType::Casual, 10),
        ]
        .into_iter()
        .collect();
        let requests = vec![
            request("annual", "approved", Some(d(2026, 2, 3)), Some(8)),
            request("sick", "approved", Some(d(2026, 2, 9)), Some(2)),
        ];

        let report = BalanceCalculator::default().report(&inputs(&policy, &requests, None, this_year()));

        assert_eq!(
            report.summary,
            BalanceSummary {
                total_allocated: 23,
                total_used: 10,
                total_remaining: 16,
            }
        );
    }

    #[test]
    fn snapshot_mode_parses_from_config_strings() {
        use std::str::FromStr;
        assert_eq!(SnapshotMode::from_str("per_type").unwrap(), SnapshotMode::PerType);
        assert_eq!(SnapshotMode::from_str("EXCLUSIVE").unwrap(), SnapshotMode::Exclusive);
        assert!(SnapshotMode::from_str("merge").is_err());
    }
}
