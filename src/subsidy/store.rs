use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{LauncherError, Result};
use crate::subsidy::backend::{
    ApplicationQuery, Assessment, CompleteAssessment, CriteriaQuery, SubsidyBackend,
};
use crate::subsidy::{
    fallback_id, now_timestamp, SubsidyCriterion, SubsidyResult, SubsidyStoreState,
};

/// Local mirror of the caller's saved subsidy results and current selection.
///
/// Reads (`list`, `load_*_selection`) fail soft and keep the previous state.
/// Writes (`save`, `delete`, `set_global_selection`) fail loud and leave the
/// state untouched. Every state change replaces the whole snapshot, so
/// overlapping writes are last-write-wins.
pub struct SubsidyStore {
    backend: Arc<dyn SubsidyBackend>,
    state: watch::Sender<SubsidyStoreState>,
}

impl SubsidyStore {
    pub fn new(backend: Arc<dyn SubsidyBackend>) -> Self {
        let (state, _) = watch::channel(SubsidyStoreState::default());
        Self { backend, state }
    }

    pub fn state(&self) -> SubsidyStoreState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubsidyStoreState> {
        self.state.subscribe()
    }

    pub fn saved_outputs(&self) -> Vec<SubsidyResult> {
        self.state.borrow().saved_outputs.clone()
    }

    pub fn selected_output(&self) -> Option<SubsidyResult> {
        self.state.borrow().selected_output.clone()
    }

    pub fn find(&self, id: &str) -> Option<SubsidyResult> {
        self.state
            .borrow()
            .saved_outputs
            .iter()
            .find(|o| o.has_id(id))
            .cloned()
    }

    /// Refresh the mirror from the backend. On failure the mirror is kept and
    /// an empty list is returned.
    pub async fn list(&self) -> Vec<SubsidyResult> {
        match self.refresh().await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("Failed to load saved subsidy results: {}", e);
                Vec::new()
            }
        }
    }

    /// Like [`list`](Self::list), but the backend error is returned. The
    /// mirror is kept on failure.
    pub async fn refresh(&self) -> Result<Vec<SubsidyResult>> {
        self.state.send_modify(|s| s.is_loading = true);

        let items = match self.backend.list().await {
            Ok(items) => items,
            Err(e) => {
                self.state.send_modify(|s| s.is_loading = false);
                return Err(e);
            }
        };

        let (persisted, drafts): (Vec<_>, Vec<_>) =
            items.into_iter().partition(SubsidyResult::is_persisted);
        if !drafts.is_empty() {
            tracing::warn!("Ignoring {} listed results without an id", drafts.len());
        }

        tracing::debug!("Loaded {} saved subsidy results", persisted.len());
        self.state.send_modify(|s| {
            s.saved_outputs = persisted.clone();
            s.is_loading = false;
        });
        Ok(persisted)
    }

    /// Persist a draft and append it to the mirror
    pub async fn save(&self, draft: SubsidyResult) -> Result<SubsidyResult> {
        let fallback = draft.saved_id.clone().unwrap_or_else(fallback_id);
        let mut output = SubsidyResult {
            timestamp: draft.timestamp.clone().or_else(|| Some(now_timestamp())),
            ..draft
        };

        let ack = self.backend.save(&output).await?;

        output.saved_id = Some(match ack.id {
            Some(id) => id,
            None => {
                tracing::warn!("Backend did not return an id, keeping {}", fallback);
                fallback
            }
        });

        tracing::info!("Saved subsidy result {}", output.label());
        let saved = output.clone();
        self.state.send_modify(|s| s.saved_outputs.push(saved));
        Ok(output)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.backend.delete(id).await?;

        tracing::info!("Deleted subsidy result {}", id);
        self.state.send_modify(|s| remove_from_state(s, id));
        Ok(())
    }

    /// Delete every known result one by one, then reset the local state no
    /// matter how many deletes failed. Returns the ids whose delete failed;
    /// those still exist on the backend.
    pub async fn clear_all(&self) -> Vec<String> {
        let ids: Vec<String> = self
            .state
            .borrow()
            .saved_outputs
            .iter()
            .filter_map(|o| o.saved_id.clone())
            .collect();

        let mut failed = Vec::new();
        for id in ids {
            if let Err(e) = self.backend.delete(&id).await {
                tracing::warn!("Failed to delete subsidy result {}: {}", id, e);
                failed.push(id);
            }
        }

        self.state.send_replace(SubsidyStoreState::default());
        failed
    }

    /// Set the local selection. With `persist`, the backend is told about it in
    /// the background; the returned handle can be awaited but need not be.
    pub fn select(&self, output: Option<SubsidyResult>, persist: bool) -> Option<JoinHandle<()>> {
        let persisted_id = output.as_ref().and_then(|o| o.saved_id.clone());
        self.state.send_modify(|s| s.selected_output = output);

        if !persist {
            return None;
        }

        let Some(id) = persisted_id else {
            tracing::debug!("Selection has no id yet, not persisting it");
            return None;
        };

        let backend = Arc::clone(&self.backend);
        Some(tokio::spawn(async move {
            match backend.select(&id).await {
                Ok(()) => tracing::debug!("Persisted selection {}", id),
                Err(e) => tracing::warn!("Failed to persist selection {}: {}", id, e),
            }
        }))
    }

    pub fn clear_selection(&self) {
        self.select(None, false);
    }

    /// Restore the caller's last persisted selection, if any
    pub async fn load_last_selection(&self) -> Option<SubsidyResult> {
        let envelope = match self.backend.last_selection().await {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("Failed to load last selection: {}", e);
                return None;
            }
        };
        self.adopt_selection(envelope.into_selection(), "last")
    }

    /// Restore the organisation-wide selection, if any
    pub async fn load_global_selection(&self) -> Option<SubsidyResult> {
        let envelope = match self.backend.global_selection().await {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("Failed to load global selection: {}", e);
                return None;
            }
        };
        self.adopt_selection(envelope.into_selection(), "global")
    }

    fn adopt_selection(&self, selection: Option<SubsidyResult>, kind: &str) -> Option<SubsidyResult> {
        match selection {
            Some(selection) => {
                tracing::debug!("Using {} selection {}", kind, selection.label());
                let adopted = selection.clone();
                self.state.send_modify(|s| s.selected_output = Some(adopted));
                Some(selection)
            }
            None => {
                tracing::debug!("No {} selection found", kind);
                None
            }
        }
    }

    /// Make a persisted result the organisation-wide default
    pub async fn set_global_selection(&self, output: &SubsidyResult) -> Result<()> {
        let id = output.saved_id.as_deref().ok_or(LauncherError::NotPersisted)?;
        self.backend.set_global_selection(id).await?;
        tracing::info!("Global selection set to {}", id);
        Ok(())
    }

    /// Ask the backend to extract criteria from a regulation text. The result
    /// is a draft; nothing is stored.
    pub async fn extract_criteria(
        &self,
        regulation_text: &str,
        model: Option<&str>,
    ) -> Result<SubsidyResult> {
        if regulation_text.trim().is_empty() {
            return Err(LauncherError::InvalidInput(
                "regulation text must not be empty".to_string(),
            ));
        }

        let query = CriteriaQuery {
            user_input: regulation_text,
            model,
        };
        let mut draft = self.backend.extract_criteria(&query).await?;
        draft.saved_id = None;
        Ok(draft)
    }

    /// Score an application against the criteria of the current selection
    pub async fn assess(&self, application_text: &str, model: Option<&str>) -> Result<Assessment> {
        let criteria = self.assessment_criteria(application_text)?;
        let query = ApplicationQuery {
            application_text,
            criteria: &criteria,
            model,
        };

        let assessment = self.backend.assess(&query).await?;
        tracing::info!(
            "Assessed application against {} criteria",
            assessment.assessment.len()
        );
        Ok(assessment)
    }

    /// Scores plus the applicant summary and the final report, in one call
    pub async fn complete_assessment(
        &self,
        application_text: &str,
        model: Option<&str>,
    ) -> Result<CompleteAssessment> {
        let criteria = self.assessment_criteria(application_text)?;
        let query = ApplicationQuery {
            application_text,
            criteria: &criteria,
            model,
        };

        let complete = self.backend.complete_assessment(&query).await?;
        tracing::info!("Complete assessment: {}", complete.report.verdict);
        Ok(complete)
    }

    fn assessment_criteria(&self, application_text: &str) -> Result<Vec<SubsidyCriterion>> {
        if application_text.trim().is_empty() {
            return Err(LauncherError::InvalidInput(
                "application text must not be empty".to_string(),
            ));
        }

        let selected = self.selected_output().ok_or(LauncherError::NoSelection)?;
        if selected.criteria.is_empty() {
            return Err(LauncherError::InvalidInput(format!(
                "selection '{}' has no criteria",
                selected.label()
            )));
        }
        Ok(selected.criteria)
    }
}

fn remove_from_state(state: &mut SubsidyStoreState, id: &str) {
    state.saved_outputs.retain(|o| !o.has_id(id));
    if state
        .selected_output
        .as_ref()
        .is_some_and(|selected| selected.has_id(id))
    {
        state.selected_output = None;
    }
}
