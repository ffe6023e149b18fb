use crate::model::leave_request::LeaveType;
use serde::{Deserialize, Deserializer, Serialize, de};
use std::collections::BTreeMap;
use std::str::FromStr;
use utoipa::ToSchema;

/// Days granted per leave type for one year. Keys are read the same way as a
/// request's leave type: case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Quotas(BTreeMap<LeaveType, u32>);

/// Company-wide quotas.
pub type LeavePolicy = Quotas;

/// Per-employee quotas overriding the company policy.
pub type Allocation = Quotas;

impl Quotas {
    pub fn get(&self, leave_type: LeaveType) -> Option<u32> {
        self.0.get(&leave_type).copied()
    }

    pub fn set(&mut self, leave_type: LeaveType, days: u32) {
        self.0.insert(leave_type, days);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LeaveType, u32)> + '_ {
        self.0.iter().map(|(t, d)| (*t, *d))
    }
}

impl FromIterator<(LeaveType, u32)> for Quotas {
    fn from_iter<I: IntoIterator<Item = (LeaveType, u32)>>(iter: I) -> Self {
        Quotas(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for Quotas {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        BTreeMap::<String, u32>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, days)| {
                LeaveType::from_str(key.trim())
                    .map(|leave_type| (leave_type, days))
                    .map_err(|_| <D::Error as de::Error>::custom(format!("unknown leave type: {key}")))
            })
            .collect()
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeaveBalanceEntry {
    #[schema(example = 10)]
    pub total: u32,
    #[schema(example = 3)]
    pub used: u32,
    #[schema(example = 7)]
    pub remaining: u32,
}

impl LeaveBalanceEntry {
    pub fn new(total: u32, used: u32) -> Self {
        Self {
            total,
            used,
            remaining: total.saturating_sub(used),
        }
    }
}

pub type BalanceMap = BTreeMap<LeaveType, LeaveBalanceEntry>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_never_goes_negative() {
        assert_eq!(LeaveBalanceEntry::new(5, 8).remaining, 0);
        assert_eq!(LeaveBalanceEntry::new(10, 3).remaining, 7);
    }

    #[test]
    fn quotas_deserialize_from_lowercase_keys() {
        let quotas: Quotas = serde_json::from_str(r#"{"annual": 12, "sick": 6}"#).unwrap();
        assert_eq!(quotas.get(LeaveType::Annual), Some(12));
        assert_eq!(quotas.get(LeaveType::Casual), None);
    }

    #[test]
    fn quota_keys_ignore_case() {
        let quotas: Quotas = serde_json::from_str(r#"{"Annual": 12, "SICK": 3}"#).unwrap();
        assert_eq!(quotas.get(LeaveType::Annual), Some(12));
        assert_eq!(quotas.get(LeaveType::Sick), Some(3));
        assert_eq!(serde_json::to_value(&quotas).unwrap(), serde_json::json!({"annual": 12, "sick": 3}));
    }

    #[test]
    fn unknown_quota_key_is_rejected() {
        let err = serde_json::from_str::<Quotas>(r#"{"sabbatical": 30}"#).unwrap_err();
        assert!(err.to_string().contains("sabbatical"));
    }

    #[test]
    fn negative_quota_is_rejected() {
        assert!(serde_json::from_str::<Quotas>(r#"{"annual": -1}"#).is_err());
    }
}
