pub mod model;

pub use model::{
    Account, AccountCreation, Comment, Identity, NewAccount, NewPayment, NewSurvey, Payment,
    Report, Role, Survey, SurveyPatch, SurveyUpdate, UpdateOutcome, Voter,
};
