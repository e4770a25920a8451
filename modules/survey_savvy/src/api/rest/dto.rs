use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::contract::model::{
    Account, Comment, Identity, NewAccount, NewPayment, NewSurvey, Payment, Report, Survey,
    SurveyPatch, UpdateOutcome, Voter,
};

/// Keys the server owns; callers cannot smuggle them in through attributes.
const RESERVED_KEYS: [&str; 2] = ["_id", "createdAt"];

fn strip_reserved(mut attributes: Map<String, Value>) -> Map<String, Value> {
    for key in RESERVED_KEYS {
        attributes.remove(key);
    }
    attributes
}

/// REST DTO for issuing a token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenReq {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDto {
    pub token: String,
}

/// REST DTO for account representation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// REST DTO for creating an account. Any `role` field sent by the client is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountReq {
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDto {
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetRoleReq {
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterDto {
    pub voter_email: String,
    pub voter_name: String,
    pub voted: String,
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub text: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDto {
    pub reason: String,
    pub reported_by: String,
}

/// REST DTO for survey representation; unknown stored fields are flattened back in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub deadline: Option<String>,
    pub creator_name: Option<String>,
    pub creator_email: Option<String>,
    pub status: String,
    pub feedback: Option<String>,
    pub vote_yes: i64,
    pub vote_no: i64,
    pub likes: i64,
    pub dislikes: i64,
    pub voters: Vec<VoterDto>,
    pub comments: Vec<CommentDto>,
    pub reports: Vec<ReportDto>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// REST DTO for creating a survey
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSurveyReq {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub deadline: Option<String>,
    pub creator_name: Option<String>,
    pub creator_email: Option<String>,
    pub status: Option<String>,
    pub feedback: Option<String>,
    pub vote_yes: Option<i64>,
    pub vote_no: Option<i64>,
    pub likes: Option<i64>,
    pub dislikes: Option<i64>,
    #[serde(default)]
    pub voters: Vec<VoterDto>,
    #[serde(default)]
    pub comments: Vec<CommentDto>,
    #[serde(default)]
    pub reports: Vec<ReportDto>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// REST DTO for a sparse survey update. Absent and `null` fields are untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyPatchReq {
    pub status: Option<String>,
    pub feedback: Option<String>,
    pub vote_yes: Option<i64>,
    pub vote_no: Option<i64>,
    pub likes: Option<i64>,
    pub dislikes: Option<i64>,
    pub reason: Option<String>,
    pub reported_by: Option<String>,
    pub comment_text: Option<String>,
    pub user_id: Option<String>,
    pub voter_name: Option<String>,
    pub voter_email: Option<String>,
    pub voted: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentReq {
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSecretDto {
    pub client_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: Option<String>,
    pub price: Option<f64>,
    pub transaction_id: Option<String>,
    pub date: Option<String>,
    pub survey_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// REST DTO for recording a payment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentReq {
    pub email: Option<String>,
    pub price: Option<f64>,
    pub transaction_id: Option<String>,
    pub date: Option<String>,
    pub survey_id: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResultDto {
    pub acknowledged: bool,
    pub inserted_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl InsertResultDto {
    pub fn inserted(id: Uuid) -> Self {
        Self {
            acknowledged: true,
            inserted_id: Some(id),
            message: None,
        }
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            acknowledged: true,
            inserted_id: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResultDto {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<Uuid>,
    pub upserted_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResultDto {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl From<TokenReq> for Identity {
    fn from(req: TokenReq) -> Self {
        Self {
            email: req.email,
            name: req.name,
        }
    }
}

impl From<Account> for AccountDto {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            email: a.email,
            name: a.name,
            image: a.image,
            role: a.role.to_string(),
            created_at: a.created_at,
        }
    }
}

impl From<CreateAccountReq> for NewAccount {
    fn from(req: CreateAccountReq) -> Self {
        Self {
            email: req.email,
            name: req.name,
            image: req.image,
        }
    }
}

impl From<Voter> for VoterDto {
    fn from(v: Voter) -> Self {
        Self {
            voter_email: v.voter_email,
            voter_name: v.voter_name,
            voted: v.voted,
            date: v.date,
        }
    }
}

impl From<VoterDto> for Voter {
    fn from(v: VoterDto) -> Self {
        Self {
            voter_email: v.voter_email,
            voter_name: v.voter_name,
            voted: v.voted,
            date: v.date,
        }
    }
}

impl From<Comment> for CommentDto {
    fn from(c: Comment) -> Self {
        Self {
            text: c.text,
            user_id: c.user_id,
        }
    }
}

impl From<CommentDto> for Comment {
    fn from(c: CommentDto) -> Self {
        Self {
            text: c.text,
            user_id: c.user_id,
        }
    }
}

impl From<Report> for ReportDto {
    fn from(r: Report) -> Self {
        Self {
            reason: r.reason,
            reported_by: r.reported_by,
        }
    }
}

impl From<ReportDto> for Report {
    fn from(r: ReportDto) -> Self {
        Self {
            reason: r.reason,
            reported_by: r.reported_by,
        }
    }
}

impl From<Survey> for SurveyDto {
    fn from(s: Survey) -> Self {
        Self {
            id: s.id,
            title: s.title,
            description: s.description,
            category: s.category,
            deadline: s.deadline,
            creator_name: s.creator_name,
            creator_email: s.creator_email,
            status: s.status,
            feedback: s.feedback,
            vote_yes: s.vote_yes,
            vote_no: s.vote_no,
            likes: s.likes,
            dislikes: s.dislikes,
            voters: s.voters.into_iter().map(Into::into).collect(),
            comments: s.comments.into_iter().map(Into::into).collect(),
            reports: s.reports.into_iter().map(Into::into).collect(),
            created_at: s.created_at,
            attributes: s.attributes,
        }
    }
}

impl From<CreateSurveyReq> for NewSurvey {
    fn from(req: CreateSurveyReq) -> Self {
        Self {
            title: req.title,
            description: req.description,
            category: req.category,
            deadline: req.deadline,
            creator_name: req.creator_name,
            creator_email: req.creator_email,
            status: req.status,
            feedback: req.feedback,
            vote_yes: req.vote_yes,
            vote_no: req.vote_no,
            likes: req.likes,
            dislikes: req.dislikes,
            voters: req.voters.into_iter().map(Into::into).collect(),
            comments: req.comments.into_iter().map(Into::into).collect(),
            reports: req.reports.into_iter().map(Into::into).collect(),
            attributes: strip_reserved(req.attributes),
        }
    }
}

impl From<SurveyPatchReq> for SurveyPatch {
    fn from(req: SurveyPatchReq) -> Self {
        Self {
            status: req.status,
            feedback: req.feedback,
            vote_yes: req.vote_yes,
            vote_no: req.vote_no,
            likes: req.likes,
            dislikes: req.dislikes,
            reason: req.reason,
            reported_by: req.reported_by,
            comment_text: req.comment_text,
            user_id: req.user_id,
            voter_name: req.voter_name,
            voter_email: req.voter_email,
            voted: req.voted,
            date: req.date,
        }
    }
}

impl From<Payment> for PaymentDto {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id,
            email: p.email,
            price: p.price,
            transaction_id: p.transaction_id,
            date: p.date,
            survey_id: p.survey_id,
            created_at: p.created_at,
            attributes: p.attributes,
        }
    }
}

impl From<CreatePaymentReq> for NewPayment {
    fn from(req: CreatePaymentReq) -> Self {
        Self {
            email: req.email,
            price: req.price,
            transaction_id: req.transaction_id,
            date: req.date,
            survey_id: req.survey_id,
            attributes: strip_reserved(req.attributes),
        }
    }
}

impl From<UpdateOutcome> for UpdateResultDto {
    fn from(o: UpdateOutcome) -> Self {
        Self {
            acknowledged: true,
            matched_count: o.matched,
            modified_count: o.modified,
            upserted_id: None,
            upserted_count: 0,
        }
    }
}

impl DeleteResultDto {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_survey_keeps_unknown_fields_but_drops_reserved_ones() {
        let req: CreateSurveyReq = serde_json::from_value(json!({
            "title": "Lunch",
            "voteYes": 2,
            "_id": "spoofed",
            "createdAt": "yesterday",
            "options": ["pizza", "salad"],
            "comments": [{ "text": "hi", "userId": null }]
        }))
        .unwrap();

        let draft = NewSurvey::from(req);
        assert_eq!(draft.title.as_deref(), Some("Lunch"));
        assert_eq!(draft.vote_yes, Some(2));
        assert_eq!(draft.comments.len(), 1);
        assert_eq!(draft.attributes.len(), 1);
        assert_eq!(draft.attributes["options"], json!(["pizza", "salad"]));
    }

    #[test]
    fn patch_distinguishes_absent_null_and_falsy() {
        let req: SurveyPatchReq = serde_json::from_value(json!({
            "likes": 0,
            "feedback": "",
            "status": null
        }))
        .unwrap();
        let patch = SurveyPatch::from(req);
        assert_eq!(patch.likes, Some(0));
        assert_eq!(patch.feedback.as_deref(), Some(""));
        assert_eq!(patch.status, None);
        assert_eq!(patch.vote_yes, None);
    }

    #[test]
    fn insert_result_wire_shape() {
        let skipped = serde_json::to_value(InsertResultDto::skipped("user already exists")).unwrap();
        assert_eq!(
            skipped,
            json!({ "acknowledged": true, "insertedId": null, "message": "user already exists" })
        );

        let id = Uuid::new_v4();
        let inserted = serde_json::to_value(InsertResultDto::inserted(id)).unwrap();
        assert_eq!(
            inserted,
            json!({ "acknowledged": true, "insertedId": id.to_string() })
        );
    }

    #[test]
    fn update_result_wire_shape() {
        let v = serde_json::to_value(UpdateResultDto::from(UpdateOutcome::matched(true))).unwrap();
        assert_eq!(
            v,
            json!({
                "acknowledged": true,
                "matchedCount": 1,
                "modifiedCount": 1,
                "upsertedId": null,
                "upsertedCount": 0
            })
        );
    }

    #[test]
    fn survey_dto_flattens_attributes_and_uses_mongo_style_id() {
        let mut attributes = Map::new();
        attributes.insert("options".into(), json!(["a", "b"]));
        let survey = Survey {
            id: Uuid::new_v4(),
            title: Some("t".into()),
            description: None,
            category: None,
            deadline: None,
            creator_name: None,
            creator_email: None,
            status: "pending".into(),
            feedback: None,
            vote_yes: 0,
            vote_no: 0,
            likes: 0,
            dislikes: 0,
            voters: vec![],
            comments: vec![Comment {
                text: "nice".into(),
                user_id: Some("u1".into()),
            }],
            reports: vec![],
            attributes,
            created_at: Utc::now(),
        };
        let id = survey.id;

        let v = serde_json::to_value(SurveyDto::from(survey)).unwrap();
        assert_eq!(v["_id"], json!(id.to_string()));
        assert_eq!(v["options"], json!(["a", "b"]));
        assert_eq!(v["comments"], json!([{ "text": "nice", "userId": "u1" }]));
        assert_eq!(v["voteYes"], json!(0));
        assert!(v.get("attributes").is_none());
    }
}
