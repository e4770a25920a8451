use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::Name).string())
                    .col(ColumnDef::new(Users::Image).string())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string()
                            .not_null()
                            .default("default"),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Surveys::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Surveys::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Surveys::Title).string())
                    .col(ColumnDef::new(Surveys::Description).text())
                    .col(ColumnDef::new(Surveys::Category).string())
                    .col(ColumnDef::new(Surveys::Deadline).string())
                    .col(ColumnDef::new(Surveys::CreatorName).string())
                    .col(ColumnDef::new(Surveys::CreatorEmail).string())
                    .col(
                        ColumnDef::new(Surveys::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Surveys::Feedback).text())
                    .col(counter(Surveys::VoteYes))
                    .col(counter(Surveys::VoteNo))
                    .col(counter(Surveys::Likes))
                    .col(counter(Surveys::Dislikes))
                    .col(ColumnDef::new(Surveys::Attributes).json().not_null())
                    .col(
                        ColumnDef::new(Surveys::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_surveys_created_at")
                    .table(Surveys::Table)
                    .col(Surveys::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SurveyVoters::Table)
                    .if_not_exists()
                    .col(serial_id(SurveyVoters::Id))
                    .col(ColumnDef::new(SurveyVoters::SurveyId).uuid().not_null())
                    .col(ColumnDef::new(SurveyVoters::VoterEmail).string().not_null())
                    .col(ColumnDef::new(SurveyVoters::VoterName).string().not_null())
                    .col(ColumnDef::new(SurveyVoters::Voted).string().not_null())
                    .col(ColumnDef::new(SurveyVoters::Date).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_survey_voters_survey")
                            .from(SurveyVoters::Table, SurveyVoters::SurveyId)
                            .to(Surveys::Table, Surveys::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SurveyComments::Table)
                    .if_not_exists()
                    .col(serial_id(SurveyComments::Id))
                    .col(ColumnDef::new(SurveyComments::SurveyId).uuid().not_null())
                    .col(ColumnDef::new(SurveyComments::Text).text().not_null())
                    .col(ColumnDef::new(SurveyComments::UserId).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_survey_comments_survey")
                            .from(SurveyComments::Table, SurveyComments::SurveyId)
                            .to(Surveys::Table, Surveys::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SurveyReports::Table)
                    .if_not_exists()
                    .col(serial_id(SurveyReports::Id))
                    .col(ColumnDef::new(SurveyReports::SurveyId).uuid().not_null())
                    .col(ColumnDef::new(SurveyReports::Reason).text().not_null())
                    .col(ColumnDef::new(SurveyReports::ReportedBy).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_survey_reports_survey")
                            .from(SurveyReports::Table, SurveyReports::SurveyId)
                            .to(Surveys::Table, Surveys::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_survey_voters_survey_id")
                    .table(SurveyVoters::Table)
                    .col(SurveyVoters::SurveyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_survey_comments_survey_id")
                    .table(SurveyComments::Table)
                    .col(SurveyComments::SurveyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_survey_reports_survey_id")
                    .table(SurveyReports::Table)
                    .col(SurveyReports::SurveyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Payments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Payments::Email).string())
                    .col(ColumnDef::new(Payments::Price).double())
                    .col(ColumnDef::new(Payments::TransactionId).string())
                    .col(ColumnDef::new(Payments::Date).string())
                    .col(ColumnDef::new(Payments::SurveyId).string())
                    .col(ColumnDef::new(Payments::Attributes).json().not_null())
                    .col(
                        ColumnDef::new(Payments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SurveyReports::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SurveyComments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SurveyVoters::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Surveys::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

fn counter<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .big_integer()
        .not_null()
        .default(0)
        .to_owned()
}

fn serial_id<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Name,
    Image,
    Role,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Surveys {
    Table,
    Id,
    Title,
    Description,
    Category,
    Deadline,
    CreatorName,
    CreatorEmail,
    Status,
    Feedback,
    VoteYes,
    VoteNo,
    Likes,
    Dislikes,
    Attributes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SurveyVoters {
    Table,
    Id,
    SurveyId,
    VoterEmail,
    VoterName,
    Voted,
    Date,
}

#[derive(DeriveIden)]
enum SurveyComments {
    Table,
    Id,
    SurveyId,
    Text,
    UserId,
}

#[derive(DeriveIden)]
enum SurveyReports {
    Table,
    Id,
    SurveyId,
    Reason,
    ReportedBy,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    Email,
    Price,
    TransactionId,
    Date,
    SurveyId,
    Attributes,
    CreatedAt,
}
