use crate::error::ApiError;
use crate::leave_balance::calculator::{BalanceCalculator, BalanceInputs, BalanceReport};
use crate::model::leave_policy::Allocation;
use crate::model::leave_request::LeaveType;
use serde::Serialize;
use utoipa::ToSchema;

/// Where committed allocations go.
pub trait AllocationStore {
    async fn save_allocation(&self, employee_id: u64, allocation: &Allocation) -> Result<(), ApiError>;
}

/// Committed balances next to the balances an edit would produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BalancePreview {
    pub saved: BalanceReport,
    pub draft: BalanceReport,
}

impl BalancePreview {
    pub fn compute(
        calculator: &BalanceCalculator,
        inputs: &BalanceInputs<'_>,
        saved: Option<&Allocation>,
        draft: &Allocation,
    ) -> Self {
        Self {
            saved: calculator.report(&BalanceInputs {
                allocation: saved,
                ..*inputs
            }),
            draft: calculator.report(&BalanceInputs {
                allocation: Some(draft),
                ..*inputs
            }),
        }
    }
}

/// Edit session over one employee's allocation.
///
/// `saved` only moves forward after the store acknowledges a save; `draft`
/// is a separate value so a cancelled or failed edit never leaks into the
/// committed totals.
#[derive(Debug, Clone)]
pub struct AllocationEditor {
    employee_id: u64,
    saved: Option<Allocation>,
    draft: Allocation,
    editing: bool,
}

impl AllocationEditor {
    pub fn new(employee_id: u64) -> Self {
        Self {
            employee_id,
            saved: None,
            draft: Allocation::default(),
            editing: false,
        }
    }

    pub fn employee_id(&self) -> u64 {
        self.employee_id
    }

    /// Seeds the committed allocation from the server. Only the first call
    /// has an effect; returns whether it did.
    pub fn load(&mut self, server: Allocation) -> bool {
        if self.saved.is_some() {
            return false;
        }
        self.draft = server.clone();
        self.saved = Some(server);
        true
    }

    pub fn saved(&self) -> Option<&Allocation> {
        self.saved.as_ref()
    }

    pub fn draft(&self) -> &Allocation {
        &self.draft
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn begin_edit(&mut self) {
        self.draft = self.saved.clone().unwrap_or_default();
        self.editing = true;
    }

    pub fn set_quota(&mut self, leave_type: LeaveType, days: u32) -> Result<(), ApiError> {
        if !self.editing {
            return Err(ApiError::BadRequest("Not in edit mode".into()));
        }
        self.draft.set(leave_type, days);
        Ok(())
    }

    /// Replaces the whole draft, e.g. with quotas submitted in one request.
    pub fn replace_draft(&mut self, allocation: Allocation) -> Result<(), ApiError> {
        if !self.editing {
            return Err(ApiError::BadRequest("Not in edit mode".into()));
        }
        self.draft = allocation;
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.draft = self.saved.clone().unwrap_or_default();
        self.editing = false;
    }

    pub async fn save<S: AllocationStore>(&mut self, store: &S) -> Result<(), ApiError> {
        if !self.editing {
            return Err(ApiError::BadRequest("Not in edit mode".into()));
        }

        store.save_allocation(self.employee_id, &self.draft).await?;

        self.saved = Some(self.draft.clone());
        self.editing = false;
        Ok(())
    }

    pub fn preview(&self, calculator: &BalanceCalculator, inputs: &BalanceInputs<'_>) -> BalancePreview {
        BalancePreview::compute(calculator, inputs, self.saved.as_ref(), &self.draft)
    }
}
