//! SeaORM-backed repository implementations for the domain ports.
//!
//! Each struct is generic over `C: ConnectionTrait`, so it can be built from
//! a `DatabaseConnection` or from a transaction. The surveys repository also
//! needs `TransactionTrait` because one update spans several tables.

use std::collections::HashMap;

use anyhow::Context;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde_json::Value;
use uuid::Uuid;

use crate::contract::model::{
    Account, Comment, Payment, Report, Role, Survey, SurveyUpdate, UpdateOutcome, Voter,
};
use crate::domain::repo::{AccountsRepository, PaymentsRepository, SurveysRepository};
use crate::infra::storage::entity::{account, comment, payment, report, survey, voter};
use crate::infra::storage::mapper;

/// Accounts repository.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmAccountsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmAccountsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> AccountsRepository for SeaOrmAccountsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn list_all(&self) -> anyhow::Result<Vec<Account>> {
        let rows = account::Entity::find()
            .order_by_asc(account::Column::CreatedAt)
            .order_by_asc(account::Column::Id)
            .all(&self.conn)
            .await
            .context("list accounts failed")?;
        Ok(rows.into_iter().map(mapper::account_to_contract).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Account>> {
        let found = account::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find account by id failed")?;
        Ok(found.map(mapper::account_to_contract))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Account>> {
        let found = account::Entity::find()
            .filter(account::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("find account by email failed")?;
        Ok(found.map(mapper::account_to_contract))
    }

    async fn insert(&self, a: Account) -> anyhow::Result<()> {
        let m = account::ActiveModel {
            id: Set(a.id),
            email: Set(a.email),
            name: Set(a.name),
            image: Set(a.image),
            role: Set(a.role.as_str().to_string()),
            created_at: Set(a.created_at),
        };
        account::Entity::insert(m)
            .exec(&self.conn)
            .await
            .context("insert account failed")?;
        Ok(())
    }

    async fn update_role(&self, id: Uuid, role: Role) -> anyhow::Result<bool> {
        let res = account::Entity::update_many()
            .col_expr(account::Column::Role, Expr::value(role.as_str()))
            .filter(account::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("update account role failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = account::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("delete account failed")?;
        Ok(res.rows_affected > 0)
    }
}

/// Surveys repository over `surveys` and its three child tables.
pub struct SeaOrmSurveysRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmSurveysRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> SurveysRepository for SeaOrmSurveysRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn list_all(&self) -> anyhow::Result<Vec<Survey>> {
        let txn = self.conn.begin().await.context("begin failed")?;

        let rows = survey::Entity::find()
            .order_by_asc(survey::Column::CreatedAt)
            .order_by_asc(survey::Column::Id)
            .all(&txn)
            .await
            .context("list surveys failed")?;

        let mut voters: HashMap<Uuid, Vec<Voter>> = HashMap::new();
        for row in voter::Entity::find()
            .order_by_asc(voter::Column::Id)
            .all(&txn)
            .await
            .context("list survey voters failed")?
        {
            let (survey_id, v) = mapper::voter_to_contract(row);
            voters.entry(survey_id).or_default().push(v);
        }

        let mut comments: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for row in comment::Entity::find()
            .order_by_asc(comment::Column::Id)
            .all(&txn)
            .await
            .context("list survey comments failed")?
        {
            let (survey_id, c) = mapper::comment_to_contract(row);
            comments.entry(survey_id).or_default().push(c);
        }

        let mut reports: HashMap<Uuid, Vec<Report>> = HashMap::new();
        for row in report::Entity::find()
            .order_by_asc(report::Column::Id)
            .all(&txn)
            .await
            .context("list survey reports failed")?
        {
            let (survey_id, r) = mapper::report_to_contract(row);
            reports.entry(survey_id).or_default().push(r);
        }

        txn.commit().await.context("commit failed")?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                mapper::survey_to_contract(
                    row,
                    voters.remove(&id).unwrap_or_default(),
                    comments.remove(&id).unwrap_or_default(),
                    reports.remove(&id).unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn insert(&self, s: Survey) -> anyhow::Result<()> {
        let txn = self.conn.begin().await.context("begin failed")?;

        let m = survey::ActiveModel {
            id: Set(s.id),
            title: Set(s.title),
            description: Set(s.description),
            category: Set(s.category),
            deadline: Set(s.deadline),
            creator_name: Set(s.creator_name),
            creator_email: Set(s.creator_email),
            status: Set(s.status),
            feedback: Set(s.feedback),
            vote_yes: Set(s.vote_yes),
            vote_no: Set(s.vote_no),
            likes: Set(s.likes),
            dislikes: Set(s.dislikes),
            attributes: Set(Value::Object(s.attributes)),
            created_at: Set(s.created_at),
        };
        survey::Entity::insert(m)
            .exec(&txn)
            .await
            .context("insert survey failed")?;

        for v in s.voters {
            append_voter(&txn, s.id, v).await?;
        }
        for c in s.comments {
            append_comment(&txn, s.id, c).await?;
        }
        for r in s.reports {
            append_report(&txn, s.id, r).await?;
        }

        txn.commit().await.context("commit failed")?;
        Ok(())
    }

    async fn apply_update(&self, id: Uuid, update: SurveyUpdate) -> anyhow::Result<UpdateOutcome> {
        let txn = self.conn.begin().await.context("begin failed")?;

        // Write before reading: on SQLite a deferred read-then-write upgrade
        // fails with SQLITE_BUSY under contention instead of waiting.
        let locked = survey::Entity::update_many()
            .col_expr(survey::Column::Id, Expr::col(survey::Column::Id).into())
            .filter(survey::Column::Id.eq(id))
            .exec(&txn)
            .await
            .context("lock survey failed")?;
        if locked.rows_affected == 0 {
            return Ok(UpdateOutcome::unmatched());
        }

        let Some(current) = survey::Entity::find_by_id(id)
            .one(&txn)
            .await
            .context("find survey failed")?
        else {
            // dropping the transaction rolls it back
            return Ok(UpdateOutcome::unmatched());
        };

        let mut am: survey::ActiveModel = current.clone().into();
        let mut changed = false;

        if let Some(status) = update.status {
            if status != current.status {
                am.status = Set(status);
                changed = true;
            }
        }
        if let Some(feedback) = update.feedback {
            if current.feedback.as_deref() != Some(feedback.as_str()) {
                am.feedback = Set(Some(feedback));
                changed = true;
            }
        }
        changed |= assign_counter(&mut am.vote_yes, current.vote_yes, update.vote_yes);
        changed |= assign_counter(&mut am.vote_no, current.vote_no, update.vote_no);
        changed |= assign_counter(&mut am.likes, current.likes, update.likes);
        changed |= assign_counter(&mut am.dislikes, current.dislikes, update.dislikes);

        if changed {
            survey::Entity::update(am)
                .exec(&txn)
                .await
                .context("update survey failed")?;
        }

        let mut appended = false;
        if let Some(r) = update.report {
            append_report(&txn, id, r).await?;
            appended = true;
        }
        if let Some(c) = update.comment {
            append_comment(&txn, id, c).await?;
            appended = true;
        }
        if let Some(v) = update.voter {
            append_voter(&txn, id, v).await?;
            appended = true;
        }

        txn.commit().await.context("commit failed")?;
        Ok(UpdateOutcome::matched(changed || appended))
    }
}

fn assign_counter(slot: &mut ActiveValue<i64>, current: i64, next: Option<i64>) -> bool {
    match next {
        Some(value) if value != current => {
            *slot = Set(value);
            true
        }
        _ => false,
    }
}

async fn append_voter<C: ConnectionTrait>(conn: &C, survey_id: Uuid, v: Voter) -> anyhow::Result<()> {
    let m = voter::ActiveModel {
        id: NotSet,
        survey_id: Set(survey_id),
        voter_email: Set(v.voter_email),
        voter_name: Set(v.voter_name),
        voted: Set(v.voted),
        date: Set(v.date),
    };
    voter::Entity::insert(m)
        .exec(conn)
        .await
        .context("append voter failed")?;
    Ok(())
}

async fn append_comment<C: ConnectionTrait>(
    conn: &C,
    survey_id: Uuid,
    c: Comment,
) -> anyhow::Result<()> {
    let m = comment::ActiveModel {
        id: NotSet,
        survey_id: Set(survey_id),
        text: Set(c.text),
        user_id: Set(c.user_id),
    };
    comment::Entity::insert(m)
        .exec(conn)
        .await
        .context("append comment failed")?;
    Ok(())
}

async fn append_report<C: ConnectionTrait>(
    conn: &C,
    survey_id: Uuid,
    r: Report,
) -> anyhow::Result<()> {
    let m = report::ActiveModel {
        id: NotSet,
        survey_id: Set(survey_id),
        reason: Set(r.reason),
        reported_by: Set(r.reported_by),
    };
    report::Entity::insert(m)
        .exec(conn)
        .await
        .context("append report failed")?;
    Ok(())
}

/// Payments repository; rows are never updated or deleted.
pub struct SeaOrmPaymentsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmPaymentsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> PaymentsRepository for SeaOrmPaymentsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn list_all(&self) -> anyhow::Result<Vec<Payment>> {
        let rows = payment::Entity::find()
            .order_by_asc(payment::Column::CreatedAt)
            .order_by_asc(payment::Column::Id)
            .all(&self.conn)
            .await
            .context("list payments failed")?;
        Ok(rows.into_iter().map(mapper::payment_to_contract).collect())
    }

    async fn insert(&self, p: Payment) -> anyhow::Result<()> {
        let m = payment::ActiveModel {
            id: Set(p.id),
            email: Set(p.email),
            price: Set(p.price),
            transaction_id: Set(p.transaction_id),
            date: Set(p.date),
            survey_id: Set(p.survey_id),
            attributes: Set(Value::Object(p.attributes)),
            created_at: Set(p.created_at),
        };
        payment::Entity::insert(m)
            .exec(&self.conn)
            .await
            .context("insert payment failed")?;
        Ok(())
    }
}
