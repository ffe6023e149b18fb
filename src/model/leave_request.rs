use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;
use strum_macros::{AsRefStr, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaveType {
    Annual,
    Sick,
    Casual,
    Maternity,
    Paternity,
    Emergency,
}

impl LeaveType {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }

    /// Leave types that count toward balances. Everything else is recorded
    /// but never shows up in a balance.
    pub const TRACKED: [LeaveType; 3] = [LeaveType::Annual, LeaveType::Sick, LeaveType::Casual];

    pub fn is_tracked(self) -> bool {
        Self::TRACKED.contains(&self)
    }

    /// Quota used when neither the employee allocation nor the company policy
    /// names this type.
    pub fn fallback_quota(self) -> u32 {
        match self {
            LeaveType::Annual => 10,
            LeaveType::Sick => 8,
            LeaveType::Casual => 10,
            LeaveType::Maternity | LeaveType::Paternity | LeaveType::Emergency => 0,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }
}

/// A leave request as stored and as exchanged over the API.
///
/// `start_date`, `end_date` and `total_days` are read leniently: a value that
/// cannot be interpreted is kept as `None` rather than failing the whole
/// payload, and the balance calculator treats it accordingly.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "annual", value_type = String)]
    pub leave_type: String,
    #[serde(default, deserialize_with = "lenient_date")]
    #[schema(example = "2026-01-01", format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    #[schema(example = "2026-01-03", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_days")]
    #[schema(example = 3)]
    pub total_days: Option<i64>,
    #[schema(example = "pending", value_type = String)]
    pub status: String,
    #[schema(example = "Family trip")]
    pub reason: Option<String>,
    pub review_comments: Option<String>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = Option<String>)]
    pub created_at: Option<DateTime<Utc>>,
}

impl LeaveRequest {
    pub fn status(&self) -> Option<LeaveStatus> {
        LeaveStatus::from_str(self.status.trim()).ok()
    }

    pub fn is_approved(&self) -> bool {
        self.status() == Some(LeaveStatus::Approved)
    }

    /// Parsed leave type, if it is one we know about.
    pub fn kind(&self) -> Option<LeaveType> {
        LeaveType::from_str(self.leave_type.trim()).ok()
    }

    /// Days this request consumes. Missing or non-positive counts as one day.
    pub fn days_counted(&self) -> u32 {
        match self.total_days {
            Some(days) if days > 0 => u32::try_from(days).unwrap_or(u32::MAX),
            _ => 1,
        }
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => parse_date(&s),
        _ => None,
    })
}

fn lenient_days<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn leave_type_parses_case_insensitively() {
        assert_eq!(LeaveType::from_str("ANNUAL").unwrap(), LeaveType::Annual);
        assert_eq!(LeaveType::from_str("Sick").unwrap(), LeaveType::Sick);
        assert!(LeaveType::from_str("sabbatical").is_err());
        assert_eq!(LeaveType::Casual.as_str(), "casual");
    }

    #[test]
    fn only_three_types_are_tracked() {
        assert!(LeaveType::Annual.is_tracked());
        assert!(LeaveType::Casual.is_tracked());
        assert!(!LeaveType::Maternity.is_tracked());
        assert!(!LeaveType::Emergency.is_tracked());
        assert_eq!(LeaveType::Sick.fallback_quota(), 8);
    }

    #[test]
    fn malformed_fields_are_kept_as_none() {
        let req: LeaveRequest = serde_json::from_value(json!({
            "id": 7,
            "employee_id": 3,
            "leave_type": "Annual",
            "start_date": "not a date",
            "end_date": "2024-05-02T00:00:00Z",
            "total_days": "lots",
            "status": "APPROVED",
            "reason": null,
            "review_comments": null,
            "created_at": null
        }))
        .unwrap();

        assert_eq!(req.start_date, None);
        assert_eq!(req.end_date, NaiveDate::from_ymd_opt(2024, 5, 2));
        assert_eq!(req.total_days, None);
        assert_eq!(req.days_counted(), 1);
        assert!(req.is_approved());
        assert_eq!(req.kind(), Some(LeaveType::Annual));
    }

    #[test]
    fn non_positive_days_count_as_one() {
        let mut req: LeaveRequest = serde_json::from_value(json!({
            "id": 1,
            "employee_id": 1,
            "leave_type": "sick",
            "status": "approved",
            "total_days": -4
        }))
        .unwrap();
        assert_eq!(req.days_counted(), 1);

        req.total_days = Some(0);
        assert_eq!(req.days_counted(), 1);

        req.total_days = Some(5);
        assert_eq!(req.days_counted(), 5);
    }
}
