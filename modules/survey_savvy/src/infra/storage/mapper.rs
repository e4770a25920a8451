use serde_json::{Map, Value};
use uuid::Uuid;

use crate::contract::model::{Account, Comment, Payment, Report, Survey, Voter};
use crate::infra::storage::entity::{account, comment, payment, report, survey, voter};

/// Convert a database entity to a contract model
pub fn account_to_contract(entity: account::Model) -> Account {
    Account {
        id: entity.id,
        email: entity.email,
        name: entity.name,
        image: entity.image,
        // rows are only written through `Role::as_str`
        role: entity.role.parse().unwrap_or_default(),
        created_at: entity.created_at,
    }
}

pub fn survey_to_contract(
    entity: survey::Model,
    voters: Vec<Voter>,
    comments: Vec<Comment>,
    reports: Vec<Report>,
) -> Survey {
    Survey {
        id: entity.id,
        title: entity.title,
        description: entity.description,
        category: entity.category,
        deadline: entity.deadline,
        creator_name: entity.creator_name,
        creator_email: entity.creator_email,
        status: entity.status,
        feedback: entity.feedback,
        vote_yes: entity.vote_yes,
        vote_no: entity.vote_no,
        likes: entity.likes,
        dislikes: entity.dislikes,
        voters,
        comments,
        reports,
        attributes: into_object(entity.attributes),
        created_at: entity.created_at,
    }
}

pub fn voter_to_contract(entity: voter::Model) -> (Uuid, Voter) {
    (
        entity.survey_id,
        Voter {
            voter_email: entity.voter_email,
            voter_name: entity.voter_name,
            voted: entity.voted,
            date: entity.date,
        },
    )
}

pub fn comment_to_contract(entity: comment::Model) -> (Uuid, Comment) {
    (
        entity.survey_id,
        Comment {
            text: entity.text,
            user_id: entity.user_id,
        },
    )
}

pub fn report_to_contract(entity: report::Model) -> (Uuid, Report) {
    (
        entity.survey_id,
        Report {
            reason: entity.reason,
            reported_by: entity.reported_by,
        },
    )
}

pub fn payment_to_contract(entity: payment::Model) -> Payment {
    Payment {
        id: entity.id,
        email: entity.email,
        price: entity.price,
        transaction_id: entity.transaction_id,
        date: entity.date,
        survey_id: entity.survey_id,
        attributes: into_object(entity.attributes),
        created_at: entity.created_at,
    }
}

fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
