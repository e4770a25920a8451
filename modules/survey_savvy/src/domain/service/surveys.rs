use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::db_err;
use crate::contract::model::{
    Comment, NewSurvey, Report, Survey, SurveyPatch, SurveyUpdate, UpdateOutcome, Voter,
};
use crate::domain::error::DomainError;
use crate::domain::repo::SurveysRepository;

const DEFAULT_STATUS: &str = "pending";

#[derive(Clone)]
pub struct SurveyService {
    repo: Arc<dyn SurveysRepository>,
}

impl SurveyService {
    pub fn new(repo: Arc<dyn SurveysRepository>) -> Self {
        Self { repo }
    }

    #[instrument(name = "survey_savvy.service.list_surveys", skip(self))]
    pub async fn list_surveys(&self) -> Result<Vec<Survey>, DomainError> {
        debug!("Listing surveys");
        let surveys = self.repo.list_all().await.map_err(db_err)?;
        debug!("Listed {} surveys", surveys.len());
        Ok(surveys)
    }

    #[instrument(
        name = "survey_savvy.service.create_survey",
        skip_all,
        fields(creator = ?new_survey.creator_email)
    )]
    pub async fn create_survey(&self, new_survey: NewSurvey) -> Result<Uuid, DomainError> {
        info!("Creating survey");
        let survey = Survey {
            id: Uuid::new_v4(),
            title: new_survey.title,
            description: new_survey.description,
            category: new_survey.category,
            deadline: new_survey.deadline,
            creator_name: new_survey.creator_name,
            creator_email: new_survey.creator_email,
            status: new_survey
                .status
                .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            feedback: new_survey.feedback,
            vote_yes: new_survey.vote_yes.unwrap_or(0),
            vote_no: new_survey.vote_no.unwrap_or(0),
            likes: new_survey.likes.unwrap_or(0),
            dislikes: new_survey.dislikes.unwrap_or(0),
            voters: new_survey.voters,
            comments: new_survey.comments,
            reports: new_survey.reports,
            attributes: new_survey.attributes,
            created_at: Utc::now(),
        };
        let id = survey.id;
        self.repo.insert(survey).await.map_err(db_err)?;
        info!("Successfully created survey with id={}", id);
        Ok(id)
    }

    #[instrument(
        name = "survey_savvy.service.update_survey",
        skip(self, id, patch),
        fields(survey_id = %id)
    )]
    pub async fn update_survey(
        &self,
        id: Uuid,
        patch: SurveyPatch,
    ) -> Result<UpdateOutcome, DomainError> {
        info!("Updating survey");
        let update = plan_update(patch);
        debug!(appends = update.has_appends(), "Resolved survey update");
        let outcome = self.repo.apply_update(id, update).await.map_err(db_err)?;
        debug!(
            matched = outcome.matched,
            modified = outcome.modified,
            "Survey update applied"
        );
        Ok(outcome)
    }
}

/// Decide which assignments and appends a sparse patch produces.
///
/// Every present field applies on its own, falsy values included. A report
/// needs both `reason` and `reportedBy`; a comment needs `commentText`
/// (`userId` is optional); a voter needs all four voter fields.
pub fn plan_update(patch: SurveyPatch) -> SurveyUpdate {
    let report = match (patch.reason, patch.reported_by) {
        (Some(reason), Some(reported_by)) => Some(Report {
            reason,
            reported_by,
        }),
        _ => None,
    };

    let comment = patch.comment_text.map(|text| Comment {
        text,
        user_id: patch.user_id,
    });

    let voter = match (patch.voter_name, patch.voter_email, patch.voted, patch.date) {
        (Some(voter_name), Some(voter_email), Some(voted), Some(date)) => Some(Voter {
            voter_email,
            voter_name,
            voted,
            date,
        }),
        _ => None,
    };

    SurveyUpdate {
        status: patch.status,
        feedback: patch.feedback,
        vote_yes: patch.vote_yes,
        vote_no: patch.vote_no,
        likes: patch.likes,
        dislikes: patch.dislikes,
        report,
        comment,
        voter,
    }
}
