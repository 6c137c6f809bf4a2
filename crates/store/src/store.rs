//! In-memory entity store.
//!
//! Every mutation goes through `EntityStore` and returns the persisted
//! record. Creation assigns ids; callers never choose them, except for
//! uploaded documents whose blob key already embeds the id.

use chrono::Utc;
use grantwise_core::budget::{BudgetError, BudgetPatch, BudgetTree, NewBudget};
use grantwise_core::document::{Document, DocumentPatch, NewDocument, NewTemplate, Template, TemplatePatch};
use grantwise_core::grant::{
    AimSpendBreakdown, Grant, GrantPatch, GrantService, NewGrant, NewTask, Task, aim_breakdown,
};
use grantwise_core::payment::{
    NewPaymentRequest, PaymentAction, PaymentError, PaymentRequest, PaymentStatus,
    PaymentWorkflow,
};
use grantwise_core::storage::StoredBlob;
use grantwise_shared::types::{
    AimId, BudgetId, DocumentId, GrantId, PaymentRequestId, TaskId, TemplateId,
};
use tracing::{info, warn};

use crate::collection::Collection;
use crate::error::StoreError;
use crate::snapshot::Snapshot;

/// What went away with a deleted grant.
#[derive(Debug, Clone)]
pub struct GrantRemoval {
    /// The deleted grant.
    pub grant: Grant,
    /// Budgets deleted with it.
    pub budgets: Vec<BudgetId>,
    /// Documents deleted with it; their blobs still need removing.
    pub documents: Vec<Document>,
    /// Payment requests deleted with it.
    pub payment_requests: usize,
    /// Tasks deleted with it.
    pub tasks: usize,
}

/// All entities held by the application.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    grants: Collection<Grant>,
    budgets: Collection<BudgetTree>,
    documents: Collection<Document>,
    tasks: Collection<Task>,
    payment_requests: Collection<PaymentRequest>,
    templates: Collection<Template>,
}

impl EntityStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Grants
    // ------------------------------------------------------------------

    /// Grants in creation order.
    pub fn grants(&self) -> impl Iterator<Item = &Grant> {
        self.grants.iter()
    }

    /// Number of grants.
    pub fn grant_count(&self) -> usize {
        self.grants.len()
    }

    /// Looks up a grant.
    pub fn grant(&self, id: GrantId) -> Result<&Grant, StoreError> {
        self.grants.get(id).ok_or(StoreError::GrantNotFound(id))
    }

    /// Creates a grant.
    pub fn add_grant(&mut self, input: NewGrant) -> Result<&Grant, StoreError> {
        let grant = GrantService::build(input)?;
        info!(grant_id = %grant.id, title = %grant.title, "Grant created");
        Ok(self.grants.push(grant))
    }

    /// Patches a grant.
    pub fn update_grant(&mut self, id: GrantId, patch: GrantPatch) -> Result<&Grant, StoreError> {
        let grant = self.grants.get_mut(id).ok_or(StoreError::GrantNotFound(id))?;
        GrantService::apply_patch(grant, patch)?;
        info!(grant_id = %id, "Grant updated");
        Ok(grant)
    }

    /// Deletes a grant with its budgets, documents, payment requests and tasks.
    pub fn delete_grant(&mut self, id: GrantId) -> Result<GrantRemoval, StoreError> {
        let grant = self.grants.remove(id).ok_or(StoreError::GrantNotFound(id))?;

        let budgets: Vec<BudgetId> = self
            .budgets
            .drain_where(|b| b.grant_id() == id)
            .iter()
            .map(BudgetTree::id)
            .collect();
        let documents = self.documents.drain_where(|d| d.grant_id == Some(id));
        for document in &documents {
            self.detach_receipt(document.id);
        }
        let payment_requests = self.payment_requests.drain_where(|p| p.grant_id == id).len();
        let tasks = self.tasks.drain_where(|t| t.grant_id == Some(id)).len();

        info!(
            grant_id = %id,
            budgets = budgets.len(),
            documents = documents.len(),
            payment_requests,
            tasks,
            "Grant deleted"
        );
        Ok(GrantRemoval {
            grant,
            budgets,
            documents,
            payment_requests,
            tasks,
        })
    }

    /// Actual spend of an aim across the grant's budgets, distributed over
    /// its sub-aims.
    pub fn aim_spend(&self, grant_id: GrantId, aim_id: AimId) -> Result<AimSpendBreakdown, StoreError> {
        let grant = self.grant(grant_id)?;
        let aim = grant
            .aim(aim_id)
            .ok_or(StoreError::AimNotFound { grant_id, aim_id })?;
        Ok(aim_breakdown(aim, self.budgets_of(grant_id)))
    }

    // ------------------------------------------------------------------
    // Budgets
    // ------------------------------------------------------------------

    /// Budgets in creation order.
    pub fn budgets(&self) -> impl Iterator<Item = &BudgetTree> {
        self.budgets.iter()
    }

    /// Budgets of one grant.
    pub fn budgets_of(&self, grant_id: GrantId) -> impl Iterator<Item = &BudgetTree> {
        self.budgets.iter().filter(move |b| b.grant_id() == grant_id)
    }

    /// Looks up a budget.
    pub fn budget(&self, id: BudgetId) -> Result<&BudgetTree, StoreError> {
        self.budgets.get(id).ok_or(StoreError::BudgetNotFound(id))
    }

    /// Mutable access for category, mini-pool and expense edits.
    pub fn budget_mut(&mut self, id: BudgetId) -> Result<&mut BudgetTree, StoreError> {
        self.budgets.get_mut(id).ok_or(StoreError::BudgetNotFound(id))
    }

    /// Creates an empty budget for an existing grant.
    pub fn add_budget(&mut self, input: NewBudget) -> Result<&BudgetTree, StoreError> {
        self.grant(input.grant_id)?;
        let tree = BudgetTree::new(input)?;
        self.insert_budget(tree)
    }

    /// Stores a budget built elsewhere (e.g. by an import).
    pub fn insert_budget(&mut self, tree: BudgetTree) -> Result<&BudgetTree, StoreError> {
        let grant_id = tree.grant_id();
        self.grant(grant_id)?;
        let existing = self.budgets_of(grant_id).count();
        if existing > 0 {
            warn!(grant_id = %grant_id, existing, "Grant already has a budget; adding another");
        }
        info!(budget_id = %tree.id(), grant_id = %grant_id, total = %tree.total_budget(), "Budget created");
        Ok(self.budgets.push(tree))
    }

    /// Replaces the category tree and/or fiscal year. The total budget never changes.
    pub fn update_budget(&mut self, id: BudgetId, patch: BudgetPatch) -> Result<&BudgetTree, StoreError> {
        self.budget(id)?;
        if let Some(categories) = &patch.categories
            && let Some(taken) = self
                .budgets
                .iter()
                .filter(|b| b.id() != id)
                .find_map(|b| b.shared_node_id(categories))
        {
            return Err(BudgetError::IdInUse(taken).into());
        }
        let tree = self.budget_mut(id)?;
        if let Some(categories) = patch.categories {
            tree.replace_categories(categories)?;
        }
        if let Some(fiscal_year) = patch.fiscal_year {
            tree.set_fiscal_year(&fiscal_year);
        }
        info!(budget_id = %id, "Budget updated");
        Ok(tree)
    }

    /// Deletes a budget.
    pub fn delete_budget(&mut self, id: BudgetId) -> Result<BudgetTree, StoreError> {
        let tree = self.budgets.remove(id).ok_or(StoreError::BudgetNotFound(id))?;
        info!(budget_id = %id, "Budget deleted");
        Ok(tree)
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    /// Documents in upload order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    /// Looks up a document.
    pub fn document(&self, id: DocumentId) -> Result<&Document, StoreError> {
        self.documents.get(id).ok_or(StoreError::DocumentNotFound(id))
    }

    /// Registers a metadata-only document.
    pub fn add_document(&mut self, input: NewDocument) -> Result<&Document, StoreError> {
        self.add_uploaded_document(DocumentId::new(), input, None)
    }

    /// Registers a document whose blob was already written under `id`.
    pub fn add_uploaded_document(
        &mut self,
        id: DocumentId,
        input: NewDocument,
        blob: Option<StoredBlob>,
    ) -> Result<&Document, StoreError> {
        if input.name.trim().is_empty() {
            return Err(StoreError::MissingField("name"));
        }
        if let Some(grant_id) = input.grant_id {
            self.grant(grant_id)?;
        }
        if self.documents.contains(id) {
            return Err(StoreError::DuplicateDocument(id));
        }
        let document = input.into_document(id, blob);
        info!(document_id = %id, size_bytes = document.size_bytes, "Document added");
        Ok(self.documents.push(document))
    }

    /// Patches a document's metadata.
    pub fn update_document(&mut self, id: DocumentId, patch: DocumentPatch) -> Result<&Document, StoreError> {
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(StoreError::MissingField("name"));
        }
        let document = self
            .documents
            .get_mut(id)
            .ok_or(StoreError::DocumentNotFound(id))?;
        document.apply(patch);
        Ok(document)
    }

    /// Deletes a document and drops it from every expense's receipts.
    pub fn delete_document(&mut self, id: DocumentId) -> Result<Document, StoreError> {
        let document = self
            .documents
            .remove(id)
            .ok_or(StoreError::DocumentNotFound(id))?;
        let detached = self.detach_receipt(id);
        info!(document_id = %id, detached, "Document deleted");
        Ok(document)
    }

    fn detach_receipt(&mut self, id: DocumentId) -> usize {
        self.budgets
            .iter_mut()
            .map(|tree| tree.detach_receipt(id))
            .sum()
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    /// Tasks, optionally limited to one grant.
    pub fn tasks(&self, grant_id: Option<GrantId>) -> impl Iterator<Item = &Task> {
        self.tasks
            .iter()
            .filter(move |t| grant_id.is_none_or(|g| t.grant_id == Some(g)))
    }

    /// Looks up a task.
    pub fn task(&self, id: TaskId) -> Result<&Task, StoreError> {
        self.tasks.get(id).ok_or(StoreError::TaskNotFound(id))
    }

    /// Creates a task.
    pub fn add_task(&mut self, input: NewTask) -> Result<&Task, StoreError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(StoreError::MissingField("title"));
        }
        if let Some(grant_id) = input.grant_id {
            let grant = self.grant(grant_id)?;
            if let Some(aim_id) = input.aim_id
                && grant.aim(aim_id).is_none()
            {
                return Err(StoreError::AimNotFound { grant_id, aim_id });
            }
        }
        let task = Task {
            id: TaskId::new(),
            title: title.to_string(),
            grant_id: input.grant_id,
            aim_id: input.aim_id,
            status: input.status,
            assignee: input.assignee.filter(|a| !a.trim().is_empty()),
            due_date: input.due_date,
        };
        Ok(self.tasks.push(task))
    }

    // ------------------------------------------------------------------
    // Payment requests
    // ------------------------------------------------------------------

    /// Payment requests filtered by grant and status.
    pub fn payment_requests(
        &self,
        grant_id: Option<GrantId>,
        status: Option<PaymentStatus>,
    ) -> impl Iterator<Item = &PaymentRequest> {
        self.payment_requests.iter().filter(move |p| {
            grant_id.is_none_or(|g| p.grant_id == g) && status.is_none_or(|s| p.status == s)
        })
    }

    /// Looks up a payment request.
    pub fn payment_request(&self, id: PaymentRequestId) -> Result<&PaymentRequest, StoreError> {
        self.payment_requests
            .get(id)
            .ok_or(StoreError::PaymentRequestNotFound(id))
    }

    /// Files a new payment request against a grant's budget.
    pub fn add_payment_request(&mut self, input: NewPaymentRequest) -> Result<&PaymentRequest, StoreError> {
        self.grant(input.grant_id)?;
        let budget = self.budget(input.budget_id)?;
        if budget.grant_id() != input.grant_id {
            return Err(StoreError::BudgetNotInGrant {
                budget_id: input.budget_id,
                grant_id: input.grant_id,
            });
        }
        if let Some(category_id) = input.category_id
            && budget.category(category_id).is_none()
        {
            return Err(BudgetError::CategoryNotFound(category_id).into());
        }
        if let Some(mini_pool_id) = input.mini_pool_id {
            let in_category = budget
                .mini_pool(mini_pool_id)
                .is_some_and(|m| input.category_id.is_none_or(|c| m.category_id == c));
            if !in_category {
                return Err(StoreError::MiniPoolNotInBudget {
                    budget_id: input.budget_id,
                    mini_pool_id,
                });
            }
        }

        let request = PaymentWorkflow::create(input)?;
        info!(payment_request_id = %request.id, amount = %request.amount, "Payment request created");
        Ok(self.payment_requests.push(request))
    }

    /// Records a workflow action on a request.
    ///
    /// Paying a request that names a mini-pool also records a spent expense
    /// there and links it on the request. If the expense cannot be written
    /// the request stays approved.
    pub fn update_payment_request(
        &mut self,
        id: PaymentRequestId,
        action: PaymentAction,
    ) -> Result<&PaymentRequest, StoreError> {
        let current = self.payment_request(id)?;
        let to = action.new_status();
        if !PaymentWorkflow::is_valid_transition(current.status, to) {
            return Err(PaymentError::InvalidTransition {
                from: current.status,
                to,
            }
            .into());
        }

        let mut updated = current.clone();
        updated.record(action);

        if to == PaymentStatus::Paid
            && let Some((mini_pool_id, expense)) = PaymentWorkflow::paid_expense(&updated)
        {
            let tree = self.budget_mut(updated.budget_id)?;
            let expense_id = tree.add_expense(mini_pool_id, expense)?;
            updated.expense_id = Some(expense_id);
            info!(payment_request_id = %id, expense_id = %expense_id, "Payment recorded as expense");
        }

        info!(payment_request_id = %id, status = %to, "Payment request updated");
        let slot = self
            .payment_requests
            .get_mut(id)
            .ok_or(StoreError::PaymentRequestNotFound(id))?;
        *slot = updated;
        Ok(slot)
    }

    // ------------------------------------------------------------------
    // Templates
    // ------------------------------------------------------------------

    /// Templates in creation order.
    pub fn templates(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    /// Looks up a template.
    pub fn template(&self, id: TemplateId) -> Result<&Template, StoreError> {
        self.templates.get(id).ok_or(StoreError::TemplateNotFound(id))
    }

    /// Creates a template.
    pub fn add_template(&mut self, input: NewTemplate) -> Result<&Template, StoreError> {
        if input.name.trim().is_empty() {
            return Err(StoreError::MissingField("name"));
        }
        Ok(self.templates.push(input.into_template()))
    }

    /// Patches a template.
    pub fn update_template(&mut self, id: TemplateId, patch: TemplatePatch) -> Result<&Template, StoreError> {
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(StoreError::MissingField("name"));
        }
        let template = self
            .templates
            .get_mut(id)
            .ok_or(StoreError::TemplateNotFound(id))?;
        template.apply(patch);
        Ok(template)
    }

    /// Deletes a template.
    pub fn delete_template(&mut self, id: TemplateId) -> Result<Template, StoreError> {
        self.templates
            .remove(id)
            .ok_or(StoreError::TemplateNotFound(id))
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Renders every collection in its persisted shape.
    #[must_use]
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            saved_at: Some(Utc::now()),
            grants: self.grants.iter().cloned().collect(),
            budgets: self.budgets.iter().map(BudgetTree::to_budget).collect(),
            documents: self.documents.iter().cloned().collect(),
            tasks: self.tasks.iter().cloned().collect(),
            payment_requests: self.payment_requests.iter().cloned().collect(),
            templates: self.templates.iter().cloned().collect(),
        }
    }

    /// Rebuilds the store from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            grants: Collection::from_vec(snapshot.grants),
            budgets: Collection::from_vec(
                snapshot.budgets.into_iter().map(BudgetTree::from).collect(),
            ),
            documents: Collection::from_vec(snapshot.documents),
            tasks: Collection::from_vec(snapshot.tasks),
            payment_requests: Collection::from_vec(snapshot.payment_requests),
            templates: Collection::from_vec(snapshot.templates),
        }
    }
}
