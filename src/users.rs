use crate::data_service::DataService;
use crate::models::{DeletionMessage, DeletionOutcome, UserId};
use rocket::{delete, http::Status, serde::json::Json, State};

pub type UserService = DataService;

#[delete("/<id>")]
pub async fn delete_user(
    service: &State<UserService>,
    id: i64,
) -> (Status, Json<DeletionMessage>) {
    match service.remove_user(UserId(id)).await {
        Ok(outcome) => {
            let status = match outcome {
                DeletionOutcome::Deleted => Status::Ok,
                DeletionOutcome::NotDeleted => Status::NotFound,
                DeletionOutcome::Failed(_) => Status::InternalServerError,
            };
            (status, Json(outcome.into()))
        }
        Err(e) => {
            log::error!("Delete request for user {id} rejected: {e}");
            (
                Status::ServiceUnavailable,
                Json(DeletionMessage {
                    message: "Database unavailable".to_string(),
                }),
            )
        }
    }
}
