use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::subsidy::{SubsidyCriterion, SubsidyResult};

/// Acknowledgement of `POST /api/subsidies/save`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveAck {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of the per-user and organisation-wide selection lookups
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectionEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default, alias = "has_global_selection")]
    pub has_selection: bool,
    #[serde(default)]
    pub selection: Option<SubsidyResult>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SelectionEnvelope {
    /// The selection, if the backend reported one
    pub fn into_selection(self) -> Option<SubsidyResult> {
        if self.success && self.has_selection {
            self.selection
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CriteriaQuery<'a> {
    pub user_input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CriteriaReply {
    #[serde(default)]
    pub criteria: Vec<SubsidyCriterion>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl From<CriteriaReply> for SubsidyResult {
    fn from(reply: CriteriaReply) -> Self {
        SubsidyResult {
            criteria: reply.criteria,
            summary: reply.summary,
            ..SubsidyResult::default()
        }
    }
}

/// Body of `POST /api/subsidies/assess` and `/complete_assessment`
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationQuery<'a> {
    pub application_text: &'a str,
    pub criteria: &'a [SubsidyCriterion],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
}

/// Score of one criterion. The backend accepts either form from the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Number(i64),
    Text(String),
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Number(n) => write!(f, "{}", n),
            Score::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentItem {
    #[serde(rename = "Criterium")]
    pub criterion: String,
    #[serde(rename = "Score")]
    pub score: Score,
    #[serde(rename = "Toelichting")]
    pub explanation: String,
}

/// Per-criterion scores keyed by the criterion number (`"1"`, `"2"`, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    #[serde(default)]
    pub assessment: BTreeMap<String, AssessmentItem>,
}

impl Assessment {
    /// Items in criterion order; numeric keys sort numerically, others last
    pub fn items(&self) -> Vec<(&str, &AssessmentItem)> {
        let mut items: Vec<_> = self
            .assessment
            .iter()
            .map(|(key, item)| (key.as_str(), item))
            .collect();
        items.sort_by_key(|(key, _)| (key.parse::<u64>().unwrap_or(u64::MAX), key.to_string()));
        items
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSummary {
    #[serde(rename = "Aanvrager", default)]
    pub applicant: String,
    #[serde(rename = "Datum_aanvraag", default)]
    pub application_date: String,
    #[serde(rename = "Datum_evenement", default)]
    pub event_date: String,
    #[serde(rename = "Bedrag", default)]
    pub amount: String,
    #[serde(rename = "Samenvatting", default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    #[serde(rename = "Samenvatting", default)]
    pub summary: String,
    #[serde(rename = "Eindoordeel", default)]
    pub verdict: String,
    #[serde(rename = "Bedrag", default)]
    pub amount: String,
}

/// Reply of `POST /api/subsidies/complete_assessment`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteAssessment {
    #[serde(default)]
    pub assessment: BTreeMap<String, AssessmentItem>,
    pub summary: ApplicationSummary,
    pub report: AssessmentReport,
}

impl CompleteAssessment {
    pub fn scores(&self) -> Assessment {
        Assessment {
            assessment: self.assessment.clone(),
        }
    }
}

/// Remote persistence for subsidy results. One method per endpoint; no
/// method retries.
#[async_trait]
pub trait SubsidyBackend: Send + Sync {
    /// `GET /api/subsidies/list`
    async fn list(&self) -> Result<Vec<SubsidyResult>>;

    /// `POST /api/subsidies/save`; the body never carries `savedId`
    async fn save(&self, draft: &SubsidyResult) -> Result<SaveAck>;

    /// `DELETE /api/subsidies/{id}`
    async fn delete(&self, id: &str) -> Result<()>;

    /// `POST /api/subsidies/select/{id}`
    async fn select(&self, id: &str) -> Result<()>;

    /// `GET /api/subsidies/selection`
    async fn last_selection(&self) -> Result<SelectionEnvelope>;

    /// `GET /api/subsidies/global`
    async fn global_selection(&self) -> Result<SelectionEnvelope>;

    /// `POST /api/subsidies/global/set/{id}`
    async fn set_global_selection(&self, id: &str) -> Result<()>;

    /// `POST /api/subsidies/query`: extract criteria from a regulation text
    async fn extract_criteria(&self, query: &CriteriaQuery<'_>) -> Result<SubsidyResult>;

    /// `POST /api/subsidies/assess`: score an application per criterion
    async fn assess(&self, query: &ApplicationQuery<'_>) -> Result<Assessment>;

    /// `POST /api/subsidies/complete_assessment`: scores, summary and report
    async fn complete_assessment(&self, query: &ApplicationQuery<'_>) -> Result<CompleteAssessment>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_envelope_accepts_both_flags() {
        let personal: SelectionEnvelope = serde_json::from_str(
            r#"{"success": true, "has_selection": true,
                "selection": {"criteria": [], "savedId": "1"}}"#,
        )
        .unwrap();
        assert!(personal.into_selection().is_some());

        let global: SelectionEnvelope = serde_json::from_str(
            r#"{"success": true, "has_global_selection": true,
                "selection": {"criteria": [], "savedId": "2"},
                "set_by_user_name": "Beheerder"}"#,
        )
        .unwrap();
        assert!(global.into_selection().unwrap().has_id("2"));
    }

    #[test]
    fn test_selection_envelope_without_selection() {
        let none: SelectionEnvelope = serde_json::from_str(
            r#"{"success": true, "has_selection": false, "message": "Geen huidige selectie gevonden"}"#,
        )
        .unwrap();
        assert!(none.into_selection().is_none());

        let failed: SelectionEnvelope = serde_json::from_str(
            r#"{"success": false, "has_selection": true, "selection": {"criteria": []}}"#,
        )
        .unwrap();
        assert!(failed.into_selection().is_none());
    }

    #[test]
    fn test_criteria_query_omits_missing_model() {
        let query = CriteriaQuery {
            user_input: "Regeling",
            model: None,
        };
        let json = serde_json::to_string(&query).unwrap();
        assert_eq!(json, r#"{"user_input":"Regeling"}"#);
    }

    #[test]
    fn test_assessment_accepts_text_and_numeric_scores() {
        let parsed: Assessment = serde_json::from_str(
            r#"{"assessment": {
                "10": {"Criterium": "Begroting", "Score": 4, "Toelichting": "Onvolledig"},
                "2": {"Criterium": "Partners", "Score": "8", "Toelichting": "Drie partners"},
                "1": {"Criterium": "Doel", "Score": "n.v.t.", "Toelichting": "-"}
            }}"#,
        )
        .unwrap();

        let keys: Vec<&str> = parsed.items().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["1", "2", "10"]);
        assert_eq!(parsed.assessment["10"].score.to_string(), "4");
        assert_eq!(parsed.assessment["2"].score, Score::Text("8".to_string()));
        assert_eq!(parsed.assessment["1"].criterion, "Doel");
    }

    #[test]
    fn test_complete_assessment_shape() {
        let parsed: CompleteAssessment = serde_json::from_str(
            r#"{
                "assessment": {"1": {"Criterium": "Doel", "Score": "7", "Toelichting": "Past"}},
                "summary": {"Aanvrager": "Stichting Buurt", "Datum_aanvraag": "2024-03-01",
                            "Datum_evenement": "2024-06-01", "Bedrag": "5000",
                            "Samenvatting": "Buurtfeest"},
                "report": {"Samenvatting": "Voldoet grotendeels", "Eindoordeel": "Toekennen",
                           "Bedrag": "4500"}
            }"#,
        )
        .unwrap();

        assert_eq!(parsed.summary.applicant, "Stichting Buurt");
        assert_eq!(parsed.report.verdict, "Toekennen");
        assert_eq!(parsed.scores().items().len(), 1);
    }

    #[test]
    fn test_application_query_wire_names() {
        let criteria = vec![SubsidyCriterion {
            id: 1,
            text: "Doel".to_string(),
        }];
        let query = ApplicationQuery {
            application_text: "Aanvraag",
            criteria: &criteria,
            model: Some("gpt-4o"),
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["application_text"], "Aanvraag");
        assert_eq!(json["criteria"][0]["text"], "Doel");
        assert_eq!(json["model"], "gpt-4o");
    }
}
