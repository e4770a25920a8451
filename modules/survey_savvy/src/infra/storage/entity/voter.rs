use sea_orm::entity::prelude::*;
use uuid::Uuid;

/// One recorded vote. Rows are only ever inserted; `id` order is append order.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "survey_voters")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub survey_id: Uuid,
    pub voter_email: String,
    pub voter_name: String,
    pub voted: String,
    pub date: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::survey::Entity",
        from = "Column::SurveyId",
        to = "super::survey::Column::Id"
    )]
    Survey,
}

impl Related<super::survey::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Survey.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
